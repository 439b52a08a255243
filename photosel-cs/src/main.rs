//! photosel-cs - Photo Curation Service
//!
//! **Module Identity:**
//! - Name: photosel-cs (Curation Service)
//! - Port: 5741
//!
//! **[PSC-OV-010]** Classifies uploaded photo batches and drives the
//! review/extraction workflow over HTTP REST + SSE.

use anyhow::Result;
use photosel_cs::services::{HttpClassifier, StorageClient};
use photosel_cs::AppState;
use photosel_common::events::EventBus;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting photosel-cs (Curation Service)");
    info!("Port: 5741");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Resolve root folder (CLI not used; env -> TOML -> OS default)
    let root_folder = photosel_common::config::resolve_root_folder(
        None,
        "PHOTOSEL_ROOT_FOLDER",
        Some("root_folder"),
    )?;
    std::fs::create_dir_all(&root_folder)?;

    // Open or create database
    let db_path = root_folder.join("photosel.db");
    info!("Database: {}", db_path.display());
    let db_pool = photosel_cs::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    // Resolve collaborator endpoints (Database -> ENV -> TOML -> default)
    let toml_config = photosel_cs::config::load_toml_config();
    let classifier_endpoint =
        photosel_cs::config::resolve_classifier_endpoint(&db_pool, &toml_config).await?;
    let storage_endpoint =
        photosel_cs::config::resolve_storage_endpoint(&db_pool, &toml_config).await?;

    let classifier = HttpClassifier::new(classifier_endpoint)
        .map_err(|e| anyhow::anyhow!("Failed to create classifier client: {}", e))?;
    let storage = StorageClient::new(storage_endpoint)
        .map_err(|e| anyhow::anyhow!("Failed to create storage client: {}", e))?;
    info!("Classifier endpoint: {}", classifier.endpoint());
    info!("Storage endpoint: {}", storage.base_url());

    // Create event bus for SSE broadcasting **[PSC-MS-010]**
    let event_bus = EventBus::new(100);
    info!("Event bus initialized");

    // Create application state
    let state = AppState::new(db_pool, event_bus, classifier, storage);

    // Build router
    let app = photosel_cs::build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind("127.0.0.1:5741").await?;
    info!("Listening on http://127.0.0.1:5741");
    info!("Health check: http://127.0.0.1:5741/health");

    axum::serve(listener, app).await?;

    Ok(())
}
