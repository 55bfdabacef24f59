use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Platform API error: {0}")]
    Platform(#[from] PlatformApiError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Result store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("No connections found for {user}")]
    EmptyNetwork { user: String },

    #[error("Scan failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

impl CoreError {
    /// Transport-class failures abort the current scan unit and are
    /// retried from the top of the scan, unlike per-connection
    /// failures which only drop a row.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            CoreError::Network(_)
                | CoreError::Platform(PlatformApiError::RequestTimeout)
                | CoreError::Platform(PlatformApiError::ServerError { .. })
        )
    }

    /// Rate-limit responses are flow control, not failures: the
    /// current scan unit restarts after the server-specified delay
    /// instead of treating the affected row as lost.
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            CoreError::Platform(PlatformApiError::RateLimitExceeded { .. })
        )
    }
}

#[derive(Error, Debug, Clone)]
pub enum PlatformApiError {
    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Invalid bearer token")]
    InvalidToken,

    #[error("User or resource not found: {resource}")]
    UserNotFound { resource: String },

    #[error("Forbidden access to resource: {resource}")]
    Forbidden { resource: String },

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },
}

#[derive(Error, Debug, Clone)]
pub enum ClassifierError {
    #[error("Authentication failed for classification API")]
    AuthenticationFailed,

    #[error("Classification API error: {message}")]
    Api { message: String },

    #[error("Category missing from classifier response: {category}")]
    MissingCategory { category: String },

    #[error("Invalid classifier response: {details}")]
    InvalidResponse { details: String },

    #[error("Classifier server error: {status_code}")]
    ServerError { status_code: u16 },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No stored results for {user}")]
    NotFound { user: String },

    #[error("Corrupt result file {path}: {details}")]
    Corrupt { path: String, details: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}
