//! Database access for photosel-cs
//!
//! **[PSC-DB-010]** SQLite holds the service's ambient state only: tunable
//! settings and the saved-photo ledger. Curation sessions themselves live
//! in memory (durable multi-session persistence is out of scope).

pub mod saved_photos;
pub mod settings;

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Initialize photosel-cs specific tables
///
/// Creates settings and saved_photos tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS saved_photos (
            object_name TEXT PRIMARY KEY,
            session_id TEXT NOT NULL,
            photo_id INTEGER NOT NULL,
            photo_url TEXT NOT NULL,
            emotion TEXT NOT NULL,
            confidence INTEGER NOT NULL,
            saved_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (settings, saved_photos)");

    Ok(())
}
