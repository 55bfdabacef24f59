use crate::rate_limit::{self, Service};
use crate::transport::PlatformTransport;
use polinet_core::{CoreError, PlatformApiError};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::debug;

const FRIENDS_LIST_ENDPOINT: &str = "/1.1/friends/list.json";

/// Fixed page cap for one connection listing request.
pub const FRIENDS_PAGE_SIZE: usize = 150;

#[derive(Debug, Deserialize)]
struct FriendsPayload {
    users: Vec<FriendUser>,
}

#[derive(Debug, Deserialize)]
struct FriendUser {
    screen_name: String,
}

/// Connection identifiers for `user`: deduplicated, platform order,
/// one page capped at [`FRIENDS_PAGE_SIZE`]. The empty-network policy
/// belongs to the caller, not to this fetcher.
pub async fn fetch_connections(
    transport: &dyn PlatformTransport,
    user: &str,
) -> Result<Vec<String>, CoreError> {
    rate_limit::ensure_quota(transport, Service::Friends).await?;

    let value = transport
        .get_json(
            FRIENDS_LIST_ENDPOINT,
            &[
                ("screen_name".to_string(), user.to_string()),
                ("count".to_string(), FRIENDS_PAGE_SIZE.to_string()),
            ],
        )
        .await?;

    let payload: FriendsPayload = serde_json::from_value(value).map_err(|e| {
        PlatformApiError::InvalidResponse {
            details: format!("Friends list payload: {e}"),
        }
    })?;

    let mut seen = HashSet::new();
    let connections: Vec<String> = payload
        .users
        .into_iter()
        .map(|u| u.screen_name)
        .filter(|name| seen.insert(name.clone()))
        .collect();

    debug!(user, count = connections.len(), "Fetched connections");
    Ok(connections)
}
