//! photosel-cs - Photo Curation Service
//!
//! **Module Identity:**
//! - Name: photosel-cs (Curation Service)
//! - Port: 5741
//!
//! **[PSC-OV-010]** Turns an uploaded photo batch into a classified,
//! user-filterable result set and a final curated extraction, driving the
//! IDLE → ANALYZING → REVIEWING ⇄ EXTRACTED workflow.
//!
//! **[PSC-MS-010]** Integrates with clients via HTTP REST + SSE

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use crate::models::session::CurationSession;
use crate::services::{HttpClassifier, StorageClient};
use axum::Router;
use chrono::{DateTime, Utc};
use photosel_common::events::EventBus;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Shared in-memory curation session map
///
/// Sessions are process-local; durable multi-session persistence is out of
/// scope. Guards are short-lived and never held across collaborator calls.
pub type SharedSessions = Arc<RwLock<HashMap<Uuid, CurationSession>>>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (settings, saved-photo ledger)
    pub db: SqlitePool,
    /// Event bus for SSE broadcasting **[PSC-MS-010]**
    pub event_bus: EventBus,
    /// In-memory curation sessions
    pub sessions: SharedSessions,
    /// Cancellation tokens for active analysis tasks
    pub cancellation_tokens: Arc<RwLock<HashMap<Uuid, CancellationToken>>>,
    /// Classifier collaborator
    pub classifier: Arc<HttpClassifier>,
    /// Blob-store collaborator
    pub storage: Arc<StorageClient>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        event_bus: EventBus,
        classifier: HttpClassifier,
        storage: StorageClient,
    ) -> Self {
        Self {
            db,
            event_bus,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            cancellation_tokens: Arc::new(RwLock::new(HashMap::new())),
            classifier: Arc::new(classifier),
            storage: Arc::new(storage),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;
    use tower_http::trace::TraceLayer;

    Router::new()
        .merge(api::curation_routes())
        .merge(api::upload_routes())
        .route("/events", get(api::event_stream))
        .route("/curation/events", get(api::curation_event_stream))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
