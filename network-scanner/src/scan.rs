use crate::aggregate;
use crate::store::ResultStore;
use classifier_client::Classifier;
use polinet_core::{AggregationMode, CoreError, NetworkResultTable, Settings, UserScoreRow};
use std::sync::Arc;
use tracing::{info, warn};
use twitter_client::rate_limit::Service;
use twitter_client::retry::{with_retry, RetryConfig};
use twitter_client::TwitterClient;

/// One completed scan: the seed's own row plus the connection table.
/// This pair is exactly what the visualization step consumes.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub self_row: UserScoreRow,
    pub network: NetworkResultTable,
    pub from_cache: bool,
}

/// Orchestrates a full scan for one seed user: the seed's own
/// aggregate row, then fetch+score+aggregate for every connection,
/// sequentially (the quota model leaves nothing to parallelize).
pub struct NetworkScanner {
    platform: TwitterClient,
    classifier: Arc<dyn Classifier>,
    store: ResultStore,
    post_limit: usize,
    mode: AggregationMode,
    retry: RetryConfig,
}

impl NetworkScanner {
    pub fn new(
        platform: TwitterClient,
        classifier: Arc<dyn Classifier>,
        store: ResultStore,
        settings: &Settings,
    ) -> Self {
        Self {
            platform,
            classifier,
            store,
            post_limit: settings.post_limit,
            mode: settings.aggregation,
            retry: RetryConfig::scan(),
        }
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Full scan for one seed, resuming from the store when both
    /// result files already exist (zero network calls in that case).
    pub async fn run(&self, seed: &str) -> Result<ScanOutcome, CoreError> {
        if self.store.has_result(seed) {
            match self.store.load(seed) {
                Ok((self_row, network)) => {
                    info!(seed, rows = network.len(), "Loaded stored results, skipping scan");
                    return Ok(ScanOutcome {
                        self_row,
                        network,
                        from_cache: true,
                    });
                }
                Err(e) => warn!(seed, error = %e, "Stored results unreadable, rescanning"),
            }
        }

        let (self_row, network) =
            with_retry("network scan", &self.retry, || self.scan_once(seed)).await?;
        self.store.save(seed, &self_row, &network)?;

        Ok(ScanOutcome {
            self_row,
            network,
            from_cache: false,
        })
    }

    /// Pre-emptive rate-limit check, used between consecutive seeds so
    /// a fresh scan does not burst into a drained quota window.
    pub async fn presleep(&self) -> Result<(), CoreError> {
        self.platform.ensure_quota(Service::Statuses).await?;
        self.platform.ensure_quota(Service::Friends).await
    }

    async fn scan_once(&self, seed: &str) -> Result<(UserScoreRow, NetworkResultTable), CoreError> {
        let posts = self.platform.recent_posts(seed, self.post_limit).await?;
        // The seed row is always a corpus aggregate; the configured
        // mode governs connection rows only.
        let self_row = aggregate::aggregate_user(
            seed,
            &posts,
            self.classifier.as_ref(),
            AggregationMode::Corpus,
        )
        .await?
        .ok_or_else(|| CoreError::InvalidInput {
            message: format!("No posts available for seed user {seed}"),
        })?;

        let connections = self.platform.connections(seed).await?;
        if connections.is_empty() {
            return Err(CoreError::EmptyNetwork {
                user: seed.to_string(),
            });
        }

        let total = connections.len();
        info!(seed, total, "Scanning network connections");

        let mut rows = Vec::new();
        for (index, connection) in connections.iter().enumerate() {
            match self.connection_row(connection).await {
                Ok(Some(row)) => rows.push(row),
                Ok(None) => info!(connection = %connection, "No posts for connection, dropping row"),
                // Transport failures and rate-limit responses abort the
                // scan; the retry wrapper restarts it from the top
                // (after the server-specified delay for rate limits).
                Err(e) if e.is_transport() || e.is_rate_limited() => return Err(e),
                Err(e) => {
                    warn!(connection = %connection, error = %e, "Connection failed, dropping row")
                }
            }
            info!(seed, completed = index + 1, total, "Scan progress");
        }

        Ok((self_row, NetworkResultTable::from_rows(rows)))
    }

    async fn connection_row(&self, connection: &str) -> Result<Option<UserScoreRow>, CoreError> {
        let posts = self.platform.recent_posts(connection, self.post_limit).await?;
        aggregate::aggregate_user(connection, &posts, self.classifier.as_ref(), self.mode).await
    }
}
