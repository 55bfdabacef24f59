use crate::rate_limit::{self, Service};
use crate::transport::PlatformTransport;
use polinet_core::{CoreError, PlatformApiError, Post};
use serde::Deserialize;
use tracing::{debug, warn};

const USER_TIMELINE_ENDPOINT: &str = "/1.1/statuses/user_timeline.json";

#[derive(Debug, Deserialize)]
struct TimelineStatus {
    id_str: String,
    text: String,
}

/// Timeline payloads are resolved once at this boundary: the platform
/// returns a JSON array of statuses, or an object describing why the
/// timeline is unavailable (protected or suspended account).
#[derive(Debug, PartialEq)]
pub enum TimelinePayload {
    Statuses(Vec<Post>),
    Unavailable(String),
}

pub fn parse_timeline_payload(value: serde_json::Value) -> Result<TimelinePayload, CoreError> {
    match value {
        serde_json::Value::Array(items) => {
            let mut posts = Vec::with_capacity(items.len());
            for item in items {
                let status: TimelineStatus = serde_json::from_value(item).map_err(|e| {
                    PlatformApiError::InvalidResponse {
                        details: format!("Timeline status entry: {e}"),
                    }
                })?;
                posts.push(Post {
                    id: status.id_str,
                    text: status.text,
                });
            }
            Ok(TimelinePayload::Statuses(posts))
        }
        serde_json::Value::Object(map) => {
            let reason = map
                .get("error")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .or_else(|| {
                    map.get("errors")
                        .and_then(|v| v.as_array())
                        .and_then(|errors| errors.first())
                        .and_then(|e| e.get("message"))
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| "Unexpected object payload".to_string());
            Ok(TimelinePayload::Unavailable(reason))
        }
        other => Err(PlatformApiError::InvalidResponse {
            details: format!("Timeline payload is neither array nor object: {other}"),
        }
        .into()),
    }
}

/// Most-recent-first posts for `user`, truncated to `max_count`.
/// An unavailable timeline yields an empty vec: missing data for one
/// user must not abort a network scan.
pub async fn fetch_recent_posts(
    transport: &dyn PlatformTransport,
    user: &str,
    max_count: usize,
) -> Result<Vec<Post>, CoreError> {
    rate_limit::ensure_quota(transport, Service::Statuses).await?;

    let value = transport
        .get_json(
            USER_TIMELINE_ENDPOINT,
            &[
                ("screen_name".to_string(), user.to_string()),
                ("count".to_string(), max_count.to_string()),
            ],
        )
        .await?;

    match parse_timeline_payload(value)? {
        TimelinePayload::Statuses(mut posts) => {
            posts.truncate(max_count);
            debug!(user, count = posts.len(), "Fetched timeline");
            Ok(posts)
        }
        TimelinePayload::Unavailable(reason) => {
            warn!(user, reason = %reason, "Timeline unavailable, treating as empty");
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct FakeTransport;

    #[async_trait]
    impl PlatformTransport for FakeTransport {
        async fn get_json(
            &self,
            path: &str,
            query: &[(String, String)],
        ) -> Result<serde_json::Value, CoreError> {
            if path.contains("rate_limit_status") {
                return Ok(json!({
                    "resources": {
                        "statuses": {
                            "/statuses/user_timeline": { "remaining": 100, "reset": 0 }
                        }
                    }
                }));
            }
            let count: usize = query
                .iter()
                .find(|(k, _)| k == "count")
                .map(|(_, v)| v.parse().unwrap())
                .unwrap();
            // Platform may return more entries than asked for
            let statuses: Vec<serde_json::Value> = (0..count + 3)
                .map(|i| json!({ "id_str": i.to_string(), "text": format!("post {i}") }))
                .collect();
            Ok(json!(statuses))
        }
    }

    #[test]
    fn array_payload_becomes_statuses() {
        let payload = json!([
            { "id_str": "1", "text": "first" },
            { "id_str": "2", "text": "second" }
        ]);
        let parsed = parse_timeline_payload(payload).unwrap();
        match parsed {
            TimelinePayload::Statuses(posts) => {
                assert_eq!(posts.len(), 2);
                assert_eq!(posts[0].text, "first");
                assert_eq!(posts[1].id, "2");
            }
            other => panic!("expected statuses, got {other:?}"),
        }
    }

    #[test]
    fn error_object_becomes_unavailable() {
        let payload = json!({
            "errors": [{ "code": 179, "message": "Not authorized." }]
        });
        assert_eq!(
            parse_timeline_payload(payload).unwrap(),
            TimelinePayload::Unavailable("Not authorized.".to_string())
        );

        let payload = json!({ "error": "Suspended account." });
        assert_eq!(
            parse_timeline_payload(payload).unwrap(),
            TimelinePayload::Unavailable("Suspended account.".to_string())
        );
    }

    #[test]
    fn scalar_payload_is_invalid() {
        let err = parse_timeline_payload(json!("nope")).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Platform(PlatformApiError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn malformed_status_entry_is_invalid() {
        let err = parse_timeline_payload(json!([{ "id_str": "1" }])).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Platform(PlatformApiError::InvalidResponse { .. })
        ));
    }

    #[tokio::test]
    async fn fetch_truncates_to_max_count() {
        let posts = fetch_recent_posts(&FakeTransport, "alice", 5).await.unwrap();
        assert_eq!(posts.len(), 5);
        // Platform order preserved
        assert_eq!(posts[0].id, "0");
        assert_eq!(posts[4].id, "4");
    }
}
