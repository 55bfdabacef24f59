pub mod connections;
pub mod rate_limit;
pub mod retry;
pub mod timeline;
pub mod transport;

use polinet_core::{CoreError, Credentials, Post};
use rate_limit::{RateLimitStatus, Service};
use std::sync::Arc;
use transport::{HttpTransport, PlatformTransport};

/// Client for the platform's rate-limited read endpoints. Every
/// quota-spending call checks the relevant rate-limit window first and
/// blocks until it has quota.
#[derive(Clone)]
pub struct TwitterClient {
    transport: Arc<dyn PlatformTransport>,
}

impl TwitterClient {
    pub fn new(credentials: &Credentials) -> Self {
        Self {
            transport: Arc::new(HttpTransport::new(&credentials.platform_bearer_token)),
        }
    }

    /// Substitute transport, used by tests and non-production setups.
    pub fn with_transport(transport: Arc<dyn PlatformTransport>) -> Self {
        Self { transport }
    }

    pub async fn rate_limit_status(&self, service: Service) -> Result<RateLimitStatus, CoreError> {
        rate_limit::fetch_status(self.transport.as_ref(), service).await
    }

    /// Blocks until `service` has remaining quota.
    pub async fn ensure_quota(&self, service: Service) -> Result<(), CoreError> {
        rate_limit::ensure_quota(self.transport.as_ref(), service).await
    }

    /// Most-recent posts for `user`, truncated to `max_count`.
    pub async fn recent_posts(&self, user: &str, max_count: usize) -> Result<Vec<Post>, CoreError> {
        timeline::fetch_recent_posts(self.transport.as_ref(), user, max_count).await
    }

    /// Deduplicated connection identifiers for `user`.
    pub async fn connections(&self, user: &str) -> Result<Vec<String>, CoreError> {
        connections::fetch_connections(self.transport.as_ref(), user).await
    }
}
