use crate::error::{ConfigError, CoreError};
use crate::types::AggregationMode;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// API keys for the social platform and the classification service.
/// Loaded once at startup and passed read-only into the components
/// that need network access.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub platform_bearer_token: String,
    pub classifier_api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// How many recent posts to request per user.
    #[serde(default = "default_post_limit")]
    pub post_limit: usize,

    /// Directory holding the per-seed CSV result pairs.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub aggregation: AggregationMode,
}

fn default_post_limit() -> usize {
    200
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("tweet_data")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            post_limit: default_post_limit(),
            data_dir: default_data_dir(),
            aggregation: AggregationMode::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub credentials: Credentials,
    #[serde(default)]
    pub settings: Settings,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, CoreError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.settings.post_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "settings.post_limit".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [credentials]
        platform_bearer_token = "token-123"
        classifier_api_key = "key-456"

        [settings]
        post_limit = 50
        data_dir = "scan_data"
        aggregation = "per-post-mean"
    "#;

    #[test]
    fn parses_full_config() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.credentials.platform_bearer_token, "token-123");
        assert_eq!(config.settings.post_limit, 50);
        assert_eq!(config.settings.data_dir, PathBuf::from("scan_data"));
        assert_eq!(config.settings.aggregation, AggregationMode::PerPostMean);
    }

    #[test]
    fn settings_default_when_absent() {
        let config: Config = toml::from_str(
            r#"
            [credentials]
            platform_bearer_token = "t"
            classifier_api_key = "k"
            "#,
        )
        .unwrap();
        assert_eq!(config.settings.post_limit, 200);
        assert_eq!(config.settings.data_dir, PathBuf::from("tweet_data"));
        assert_eq!(config.settings.aggregation, AggregationMode::Corpus);
    }

    #[test]
    fn zero_post_limit_rejected() {
        let config: Config = toml::from_str(
            r#"
            [credentials]
            platform_bearer_token = "t"
            classifier_api_key = "k"

            [settings]
            post_limit = 0
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
