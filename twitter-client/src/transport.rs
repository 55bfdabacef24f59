use async_trait::async_trait;
use polinet_core::{CoreError, PlatformApiError};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, warn};

const PLATFORM_API_BASE: &str = "https://api.twitter.com";

/// The request/response contract with the platform: issue a GET with
/// query parameters, receive decoded JSON or an error. Tests supply an
/// in-memory implementation.
#[async_trait]
pub trait PlatformTransport: Send + Sync {
    async fn get_json(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<serde_json::Value, CoreError>;
}

#[derive(Debug)]
pub struct HttpTransport {
    http_client: Client,
    bearer_token: String,
    base_url: String,
}

impl HttpTransport {
    pub fn new(bearer_token: &str) -> Self {
        Self::with_base_url(bearer_token, PLATFORM_API_BASE)
    }

    pub fn with_base_url(bearer_token: &str, base_url: &str) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            bearer_token: bearer_token.to_string(),
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl PlatformTransport for HttpTransport {
    async fn get_json(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<serde_json::Value, CoreError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making platform API request: GET {}", path);

        let response = match self
            .http_client
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .query(query)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Network error for GET {}: {}", path, e);
                if e.is_timeout() {
                    return Err(PlatformApiError::RequestTimeout.into());
                }
                return Err(CoreError::Network(e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            error!("Request failed with status {} for {}", status, path);

            if status.as_u16() == 429 {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                warn!("Rate limited by platform, retry after {} seconds", retry_after);
                return Err(PlatformApiError::RateLimitExceeded { retry_after }.into());
            } else if status.as_u16() == 401 {
                return Err(PlatformApiError::InvalidToken.into());
            } else if status.as_u16() == 403 {
                return Err(PlatformApiError::Forbidden {
                    resource: path.to_string(),
                }
                .into());
            } else if status.as_u16() == 404 {
                return Err(PlatformApiError::UserNotFound {
                    resource: path.to_string(),
                }
                .into());
            } else if status.is_server_error() {
                return Err(PlatformApiError::ServerError {
                    status_code: status.as_u16(),
                }
                .into());
            }
            return Err(PlatformApiError::InvalidResponse {
                details: format!("Unexpected status {status} for {path}"),
            }
            .into());
        }

        let value = response.json::<serde_json::Value>().await.map_err(|e| {
            error!("Failed to decode response body for {}: {}", path, e);
            PlatformApiError::InvalidResponse {
                details: format!("Undecodable JSON body for {path}"),
            }
        })?;

        Ok(value)
    }
}
