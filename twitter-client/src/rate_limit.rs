use crate::transport::PlatformTransport;
use polinet_core::{CoreError, PlatformApiError};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::sleep;
use tracing::{debug, info};

const RATE_LIMIT_STATUS_ENDPOINT: &str = "/1.1/application/rate_limit_status.json";

/// The rate-limited resource families this pipeline spends quota on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Statuses,
    Friends,
}

impl Service {
    /// Resource family name used in the status query.
    pub fn family(&self) -> &'static str {
        match self {
            Service::Statuses => "statuses",
            Service::Friends => "friends",
        }
    }

    /// Window key within the family for the endpoint we call.
    pub fn window_key(&self) -> &'static str {
        match self {
            Service::Statuses => "/statuses/user_timeline",
            Service::Friends => "/friends/list",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.family())
    }
}

/// Remaining quota for one window. Fetched fresh before each
/// quota-limited call and used for a single wait decision, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RateLimitStatus {
    pub remaining: u32,
    /// Epoch seconds at which the window resets.
    pub reset: i64,
}

#[derive(Debug, Deserialize)]
struct StatusPayload {
    resources: HashMap<String, HashMap<String, RateLimitStatus>>,
}

/// Queries remaining quota for `service`. Transport failures propagate
/// without local retry.
pub async fn fetch_status(
    transport: &dyn PlatformTransport,
    service: Service,
) -> Result<RateLimitStatus, CoreError> {
    let value = transport
        .get_json(
            RATE_LIMIT_STATUS_ENDPOINT,
            &[("resources".to_string(), service.family().to_string())],
        )
        .await?;

    let payload: StatusPayload = serde_json::from_value(value).map_err(|e| {
        PlatformApiError::InvalidResponse {
            details: format!("Rate limit status payload: {e}"),
        }
    })?;

    payload
        .resources
        .get(service.family())
        .and_then(|family| family.get(service.window_key()))
        .copied()
        .ok_or_else(|| {
            PlatformApiError::InvalidResponse {
                details: format!(
                    "Missing {} window in rate limit status",
                    service.window_key()
                ),
            }
            .into()
        })
}

/// Wait until one second past the documented reset instant.
pub fn wait_duration(reset: i64, now: i64) -> Duration {
    let delta = reset + 1 - now;
    if delta <= 0 {
        Duration::ZERO
    } else {
        Duration::from_secs(delta as u64)
    }
}

fn now_epoch() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Blocks until the service's window has quota. The subsequent request
/// proceeds without re-checking mid-call.
pub async fn ensure_quota(
    transport: &dyn PlatformTransport,
    service: Service,
) -> Result<(), CoreError> {
    let status = fetch_status(transport, service).await?;
    if status.remaining > 0 {
        debug!(service = %service, remaining = status.remaining, "Quota available");
        return Ok(());
    }

    let wait = wait_duration(status.reset, now_epoch());
    info!(
        service = %service,
        wait_secs = wait.as_secs(),
        "Rate limit window exhausted, sleeping until reset"
    );
    sleep(wait).await;
    Ok(())
}
