use async_trait::async_trait;
use polinet_core::{Category, ClassifierError, CoreError, Credentials, ScoreVector};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

const CLASSIFIER_API_BASE: &str = "https://apiv2.indico.io";

/// Scores text against the political-affiliation categories.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn score_text(&self, text: &str) -> Result<ScoreVector, CoreError>;

    /// Scores one concatenated document instead of one call per post:
    /// a deliberate cost/latency tradeoff.
    async fn score_corpus(&self, texts: &[String]) -> Result<ScoreVector, CoreError> {
        self.score_text(&texts.join(" ")).await
    }
}

/// HTTP client for the political classification API. The API key is
/// explicit constructor state, never ambient configuration.
#[derive(Debug)]
pub struct PoliticalApiClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl PoliticalApiClient {
    pub fn new(credentials: &Credentials) -> Self {
        Self::with_base_url(&credentials.classifier_api_key, CLASSIFIER_API_BASE)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClassifierResponse {
    results: Option<serde_json::Map<String, serde_json::Value>>,
    error: Option<String>,
}

/// Validates a raw classifier body: every category label must be
/// present with a numeric score.
pub fn parse_scores(value: serde_json::Value) -> Result<ScoreVector, CoreError> {
    let response: ClassifierResponse = serde_json::from_value(value).map_err(|e| {
        ClassifierError::InvalidResponse {
            details: format!("Classifier body: {e}"),
        }
    })?;

    if let Some(message) = response.error {
        return Err(ClassifierError::Api { message }.into());
    }

    let results = response.results.ok_or_else(|| ClassifierError::InvalidResponse {
        details: "Missing `results` object".to_string(),
    })?;

    let mut scores = BTreeMap::new();
    for category in Category::ALL {
        let score = results
            .get(category.as_str())
            .and_then(|v| v.as_f64())
            .ok_or_else(|| ClassifierError::MissingCategory {
                category: category.as_str().to_string(),
            })?;
        scores.insert(category, score);
    }
    Ok(ScoreVector::new(scores))
}

#[async_trait]
impl Classifier for PoliticalApiClient {
    async fn score_text(&self, text: &str) -> Result<ScoreVector, CoreError> {
        let url = format!("{}/political", self.base_url);
        debug!(chars = text.len(), "Submitting document for classification");

        let response = self
            .http_client
            .post(&url)
            .header("X-ApiKey", &self.api_key)
            .json(&serde_json::json!({ "data": text }))
            .send()
            .await
            .map_err(CoreError::Network)?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ClassifierError::AuthenticationFailed.into());
        }
        if status.is_server_error() {
            return Err(ClassifierError::ServerError {
                status_code: status.as_u16(),
            }
            .into());
        }
        if !status.is_success() {
            return Err(ClassifierError::InvalidResponse {
                details: format!("Unexpected status {status}"),
            }
            .into());
        }

        let value = response.json::<serde_json::Value>().await.map_err(|e| {
            ClassifierError::InvalidResponse {
                details: format!("Undecodable classifier body: {e}"),
            }
        })?;
        parse_scores(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn parses_complete_result() {
        let scores = parse_scores(json!({
            "results": {
                "Conservative": 0.12,
                "Green": 0.08,
                "Liberal": 0.55,
                "Libertarian": 0.25
            }
        }))
        .unwrap();

        assert!((scores.get(Category::Liberal) - 0.55).abs() < 1e-9);
        let categories: Vec<Category> = scores.categories().collect();
        assert_eq!(categories, Category::ALL.to_vec());
    }

    #[test]
    fn missing_category_is_rejected() {
        let err = parse_scores(json!({
            "results": {
                "Conservative": 0.12,
                "Green": 0.08,
                "Liberal": 0.55
            }
        }))
        .unwrap_err();

        match err {
            CoreError::Classifier(ClassifierError::MissingCategory { category }) => {
                assert_eq!(category, "Libertarian");
            }
            other => panic!("expected MissingCategory, got {other}"),
        }
    }

    #[test]
    fn non_numeric_score_is_rejected() {
        let err = parse_scores(json!({
            "results": {
                "Conservative": "high",
                "Green": 0.1,
                "Liberal": 0.1,
                "Libertarian": 0.1
            }
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Classifier(ClassifierError::MissingCategory { .. })
        ));
    }

    #[test]
    fn error_body_is_surfaced() {
        let err = parse_scores(json!({ "error": "daily quota exceeded" })).unwrap_err();
        match err {
            CoreError::Classifier(ClassifierError::Api { message }) => {
                assert_eq!(message, "daily quota exceeded");
            }
            other => panic!("expected Api error, got {other}"),
        }
    }

    #[test]
    fn body_without_results_is_invalid() {
        let err = parse_scores(json!({ "status": "ok" })).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Classifier(ClassifierError::InvalidResponse { .. })
        ));
    }

    struct RecordingClassifier {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Classifier for RecordingClassifier {
        async fn score_text(&self, text: &str) -> Result<ScoreVector, CoreError> {
            self.seen.lock().unwrap().push(text.to_string());
            let scores = Category::ALL.iter().map(|&c| (c, 0.25)).collect();
            Ok(ScoreVector::new(scores))
        }
    }

    #[tokio::test]
    async fn corpus_joins_with_single_space() {
        let classifier = RecordingClassifier {
            seen: Mutex::new(Vec::new()),
        };

        let texts = vec![
            "first post".to_string(),
            "second post".to_string(),
            "third".to_string(),
        ];
        classifier.score_corpus(&texts).await.unwrap();

        let seen = classifier.seen.lock().unwrap();
        assert_eq!(seen.as_slice(), ["first post second post third"]);
    }
}
