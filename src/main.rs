use anyhow::Result;
use clap::Parser;
use classifier_client::PoliticalApiClient;
use network_scanner::{NetworkScanner, ResultStore};
use polinet_core::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use twitter_client::TwitterClient;

#[derive(Parser, Debug)]
#[command(author, version, about = "Scan a user's network for political alignment")]
struct Args {
    /// Users whose networks you want to analyze
    #[arg(required = true)]
    users: Vec<String>,

    /// Path to the credentials and settings file
    #[arg(long, default_value = "polinet.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "polinet=info,network_scanner=info,twitter_client=info".into()),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(&args.config)?;

    let platform = TwitterClient::new(&config.credentials);
    let classifier = Arc::new(PoliticalApiClient::new(&config.credentials));
    let store = ResultStore::new(config.settings.data_dir.clone());
    let scanner = NetworkScanner::new(platform, classifier, store, &config.settings);

    tracing::info!(seeds = args.users.len(), "Starting polinet");

    let mut failed = 0usize;
    for (i, user) in args.users.iter().enumerate() {
        if i != 0 {
            // Don't burst into a window a previous scan may have drained
            scanner.presleep().await?;
        }
        match scanner.run(user).await {
            Ok(outcome) => tracing::info!(
                user = %user,
                rows = outcome.network.len(),
                from_cache = outcome.from_cache,
                "Scan complete"
            ),
            Err(e) => {
                failed += 1;
                tracing::error!(user = %user, error = %e, "Scan failed");
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} scans failed", args.users.len());
    }
    Ok(())
}
