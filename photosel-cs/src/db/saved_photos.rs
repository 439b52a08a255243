//! Saved-photo ledger
//!
//! One row per labeled photo successfully stored by a save operation.
//! Lets an operator audit what a session actually exported, independent of
//! the in-memory session lifetime.

use crate::models::analysis::PhotoRecord;
use photosel_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Record one successful save
pub async fn record_saved(
    pool: &SqlitePool,
    session_id: Uuid,
    record: &PhotoRecord,
    object_name: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO saved_photos (
            object_name, session_id, photo_id, photo_url,
            emotion, confidence, saved_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(object_name) DO NOTHING
        "#,
    )
    .bind(object_name)
    .bind(session_id.to_string())
    .bind(record.id as i64)
    .bind(record.photo.as_str())
    .bind(record.emotion.label())
    .bind(record.confidence as i64)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Number of photos saved for a session
pub async fn count_saved(pool: &SqlitePool, session_id: Uuid) -> Result<usize> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM saved_photos WHERE session_id = ?")
            .bind(session_id.to_string())
            .fetch_one(pool)
            .await?;
    Ok(count as usize)
}
