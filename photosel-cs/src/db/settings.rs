//! Settings persistence
//!
//! Simple key/value settings table; tunables default in code when unset.

use crate::models::selection::DEFAULT_EXTRACT_LIMIT;
use sqlx::SqlitePool;
use photosel_common::Result;

const DEFAULT_EXTRACT_LIMIT_KEY: &str = "curation.default_extract_limit";
const CLASSIFIER_ENDPOINT_KEY: &str = "curation.classifier_endpoint";
const STORAGE_ENDPOINT_KEY: &str = "curation.storage_endpoint";

/// Get a raw setting value
pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;
    Ok(value)
}

/// Set a raw setting value (insert or replace)
pub async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value) VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

/// Upper bound for the initial extraction count (default 6)
pub async fn default_extract_limit(pool: &SqlitePool) -> Result<usize> {
    let limit = get_setting(pool, DEFAULT_EXTRACT_LIMIT_KEY)
        .await?
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(DEFAULT_EXTRACT_LIMIT);
    Ok(limit.max(1))
}

/// Classifier endpoint override stored in the database (highest priority)
pub async fn get_classifier_endpoint(pool: &SqlitePool) -> Result<Option<String>> {
    get_setting(pool, CLASSIFIER_ENDPOINT_KEY).await
}

/// Storage endpoint override stored in the database (highest priority)
pub async fn get_storage_endpoint(pool: &SqlitePool) -> Result<Option<String>> {
    get_setting(pool, STORAGE_ENDPOINT_KEY).await
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn stored_extract_limit_is_honored() {
        let pool = test_pool().await;
        set_setting(&pool, DEFAULT_EXTRACT_LIMIT_KEY, "3").await.unwrap();
        assert_eq!(default_extract_limit(&pool).await.unwrap(), 3);

        // Upsert replaces the earlier value
        set_setting(&pool, DEFAULT_EXTRACT_LIMIT_KEY, "9").await.unwrap();
        assert_eq!(default_extract_limit(&pool).await.unwrap(), 9);
    }

    #[tokio::test]
    async fn unparseable_or_missing_limit_falls_back() {
        let pool = test_pool().await;
        // Unset: built-in default
        assert_eq!(default_extract_limit(&pool).await.unwrap(), DEFAULT_EXTRACT_LIMIT);

        // Non-numeric: built-in default
        set_setting(&pool, DEFAULT_EXTRACT_LIMIT_KEY, "plenty").await.unwrap();
        assert_eq!(default_extract_limit(&pool).await.unwrap(), DEFAULT_EXTRACT_LIMIT);
    }

    #[tokio::test]
    async fn zero_limit_is_floored_at_one() {
        let pool = test_pool().await;
        set_setting(&pool, DEFAULT_EXTRACT_LIMIT_KEY, "0").await.unwrap();
        assert_eq!(default_extract_limit(&pool).await.unwrap(), 1);
    }
}
