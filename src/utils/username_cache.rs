use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

use crate::db;

/// true  => username is TAKEN
/// false => username is AVAILABLE (usually we store only taken)
pub static USERNAME_CACHE: Lazy<Cache<String, bool>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000)
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

/// Mark a single username as taken
pub async fn mark_taken(username: &str) {
    USERNAME_CACHE.insert(username.to_lowercase(), true).await;
}

/// Check if username is taken
pub async fn is_taken(username: &str) -> bool {
    USERNAME_CACHE
        .get(&username.to_lowercase())
        .await
        .unwrap_or(false)
}

/// Batch mark usernames as taken
async fn batch_mark(usernames: &[String]) {
    let futures: Vec<_> = usernames
        .iter()
        .map(|u| USERNAME_CACHE.insert(u.to_lowercase(), true))
        .collect();

    futures::future::join_all(futures).await;
}

/// Cache first, database on a miss. A hit never goes to the database.
pub async fn is_username_available(pool: &MySqlPool, username: &str) -> Result<bool, sqlx::Error> {
    if is_taken(username).await {
        return Ok(false);
    }

    let exists = db::users::username_exists(pool, username).await?;
    if exists {
        mark_taken(username).await;
    }
    Ok(!exists)
}

/// Load only RECENT usernames into in-memory cache (batched)
pub async fn warmup_username_cache(
    pool: &MySqlPool,
    days: u32,
    batch_size: usize,
) -> Result<(), sqlx::Error> {
    let usernames = db::users::recent_usernames(pool, days).await?;

    for batch in usernames.chunks(batch_size.max(1)) {
        batch_mark(batch).await;
    }

    tracing::info!(
        count = usernames.len(),
        days,
        "Username cache warmup complete"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mark_taken_is_case_insensitive() {
        mark_taken("Cache.Test.User").await;
        assert!(is_taken("cache.test.user").await);
        assert!(!is_taken("cache.test.other").await);
    }
}
