//! Curation workflow API endpoints
//!
//! **[PSC-API-010]** REST surface for the curation session lifecycle:
//! start, status, cancel, review, selection edits, extraction, choose-again
//! and save. Every endpoint that moves the workflow goes through the
//! guarded session methods, so illegal transitions surface as 409 Conflict
//! rather than silently rewriting state.

use crate::error::{ApiError, ApiResult};
use crate::models::analysis::{PhotoRecord, PhotoRef};
use crate::models::session::{AnalysisProgress, CurationSession, WorkflowState};
use crate::services::{CurationOrchestrator, SaveScope};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use photosel_common::events::{CurationEvent, EmotionCountData, EmotionType};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Build curation workflow routes
pub fn curation_routes() -> Router<AppState> {
    Router::new()
        .route("/curation/start", post(start_curation))
        .route("/curation/status/:session_id", get(get_status))
        .route("/curation/cancel/:session_id", post(cancel_curation))
        .route("/curation/review/:session_id", get(get_review))
        .route("/curation/:session_id/toggle", post(toggle_emotion))
        .route("/curation/:session_id/extract-count", post(set_extract_count))
        .route("/curation/:session_id/extract", post(perform_extraction))
        .route("/curation/:session_id/extraction", get(get_extraction))
        .route("/curation/:session_id/review", post(choose_again))
        .route("/curation/:session_id/save", post(save_photos))
        .route("/curation/active", get(list_active))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for POST /curation/start
#[derive(Debug, Deserialize)]
pub struct StartCurationRequest {
    /// Uploaded photo locators, in upload order
    pub photos: Vec<String>,
}

/// Response for POST /curation/start
#[derive(Debug, Serialize)]
pub struct StartCurationResponse {
    pub session_id: Uuid,
    pub state: WorkflowState,
    pub total_photos: usize,
    pub message: String,
}

/// Response for GET /curation/status/{id}
#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: Uuid,
    pub state: WorkflowState,
    pub progress: AnalysisProgress,
    pub error: Option<String>,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub ended_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Selection view embedded in review responses
#[derive(Debug, Serialize)]
pub struct SelectionView {
    pub active_emotions: Vec<EmotionType>,
    pub extract_count: usize,
    pub max_extractable: usize,
}

/// Response for GET /curation/review/{id}
#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub session_id: Uuid,
    pub state: WorkflowState,
    pub total: usize,
    pub summaries: Vec<EmotionCountData>,
    pub records: Vec<PhotoRecord>,
    pub selection: SelectionView,
}

/// Request body for POST /curation/{id}/toggle
#[derive(Debug, Deserialize)]
pub struct ToggleEmotionRequest {
    pub emotion: EmotionType,
}

/// Request body for POST /curation/{id}/extract-count
#[derive(Debug, Deserialize)]
pub struct ExtractCountRequest {
    pub count: usize,
}

/// Response for extraction endpoints
#[derive(Debug, Serialize)]
pub struct ExtractionResponse {
    pub session_id: Uuid,
    pub state: WorkflowState,
    pub records: Vec<PhotoRecord>,
    pub active_emotions: Vec<EmotionType>,
}

/// Request body for POST /curation/{id}/save
#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    /// Which photos to save; defaults to the extraction snapshot
    #[serde(default = "default_save_scope")]
    pub scope: SaveScope,
}

fn default_save_scope() -> SaveScope {
    SaveScope::Selected
}

/// Response for POST /curation/{id}/save
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub session_id: Uuid,
    pub scope: SaveScope,
    pub succeeded: usize,
    pub failed: usize,
}

/// One entry in GET /curation/active
#[derive(Debug, Serialize)]
pub struct ActiveSessionEntry {
    pub session_id: Uuid,
    pub state: WorkflowState,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

/// Generic state-change acknowledgement
#[derive(Debug, Serialize)]
pub struct SessionStateResponse {
    pub session_id: Uuid,
    pub state: WorkflowState,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /curation/start - Begin analyzing an uploaded photo batch
///
/// **[PSC-WF-020]** An empty batch never enters ANALYZING: the session is
/// created, marked terminal in IDLE, and the response carries the
/// "nothing to analyze" message. A non-empty batch transitions to
/// ANALYZING and classification runs in a background task.
async fn start_curation(
    State(state): State<AppState>,
    Json(request): Json<StartCurationRequest>,
) -> ApiResult<(StatusCode, Json<StartCurationResponse>)> {
    let photos: Vec<PhotoRef> = request.photos.into_iter().map(PhotoRef).collect();
    let total = photos.len();

    let mut session = CurationSession::new();
    let session_id = session.session_id;

    if photos.is_empty() {
        session.complete_with_empty_batch()?;
        let message = session.progress.current_operation.clone();
        state.sessions.write().await.insert(session_id, session);

        tracing::info!(session_id = %session_id, "Empty batch, session remains idle");
        return Ok((
            StatusCode::OK,
            Json(StartCurationResponse {
                session_id,
                state: WorkflowState::Idle,
                total_photos: 0,
                message,
            }),
        ));
    }

    session.begin_analysis(total)?;

    // Single-writer discipline: one batch analyzes at a time. The scan and
    // the insert share one write guard so two concurrent starts cannot both
    // pass the scan.
    {
        let mut sessions = state.sessions.write().await;
        if let Some(running) = sessions
            .values()
            .find(|s| s.state == WorkflowState::Analyzing)
        {
            return Err(ApiError::Conflict(format!(
                "A curation session is already analyzing: {}",
                running.session_id
            )));
        }
        sessions.insert(session_id, session);
    }

    let cancel_token = CancellationToken::new();
    state
        .cancellation_tokens
        .write()
        .await
        .insert(session_id, cancel_token.clone());

    // Run analysis in a background task
    let task_state = state.clone();
    tokio::spawn(async move {
        let orchestrator = CurationOrchestrator::new(
            task_state.db.clone(),
            task_state.event_bus.clone(),
            task_state.sessions.clone(),
        );

        if let Err(e) = orchestrator
            .execute_analysis(
                session_id,
                photos,
                task_state.classifier.as_ref(),
                cancel_token,
            )
            .await
        {
            orchestrator.handle_failure(session_id, &e).await;
            *task_state.last_error.write().await = Some(e.to_string());
        }

        task_state.cancellation_tokens.write().await.remove(&session_id);
    });

    tracing::info!(
        session_id = %session_id,
        total_photos = total,
        "Curation session started"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(StartCurationResponse {
            session_id,
            state: WorkflowState::Analyzing,
            total_photos: total,
            message: format!("Analyzing {} photos...", total),
        }),
    ))
}

/// GET /curation/status/{id} - Poll session state and progress
async fn get_status(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<SessionStatusResponse>> {
    let sessions = state.sessions.read().await;
    let session = sessions
        .get(&session_id)
        .ok_or_else(|| session_not_found(session_id))?;

    Ok(Json(SessionStatusResponse {
        session_id: session.session_id,
        state: session.state,
        progress: session.progress.clone(),
        error: session.error.clone(),
        started_at: session.started_at,
        ended_at: session.ended_at,
    }))
}

/// POST /curation/cancel/{id} - Cancel a running analysis
///
/// The session transitions to CANCELLED immediately; the background task
/// observes the token at its next per-photo check and winds down without
/// producing a result.
async fn cancel_curation(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<SessionStateResponse>> {
    {
        let mut sessions = state.sessions.write().await;
        let session = sessions
            .get_mut(&session_id)
            .ok_or_else(|| session_not_found(session_id))?;
        session.cancel()?;
    }

    if let Some(token) = state.cancellation_tokens.read().await.get(&session_id) {
        token.cancel();
    }

    state
        .event_bus
        .emit_lossy(CurationEvent::CurationSessionCancelled {
            session_id,
            timestamp: chrono::Utc::now(),
        });

    tracing::info!(session_id = %session_id, "Curation session cancelled");
    Ok(Json(SessionStateResponse {
        session_id,
        state: WorkflowState::Cancelled,
    }))
}

/// GET /curation/review/{id} - Full review view
///
/// Available from REVIEWING onward (the analysis result is immutable once
/// present, so EXTRACTED sessions can still read it).
async fn get_review(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<ReviewResponse>> {
    let sessions = state.sessions.read().await;
    let session = sessions
        .get(&session_id)
        .ok_or_else(|| session_not_found(session_id))?;

    let (analysis, selection) = match (&session.analysis, &session.selection) {
        (Some(analysis), Some(selection)) => (analysis, selection),
        _ => {
            return Err(ApiError::Conflict(format!(
                "No analysis result available in state {:?}",
                session.state
            )))
        }
    };

    Ok(Json(ReviewResponse {
        session_id: session.session_id,
        state: session.state,
        total: analysis.total,
        summaries: analysis.summaries.iter().map(|s| s.to_event_data()).collect(),
        records: analysis.records.clone(),
        selection: SelectionView {
            active_emotions: selection.active_emotions.iter().copied().collect(),
            extract_count: selection.extract_count,
            max_extractable: selection.max_extractable(analysis),
        },
    }))
}

/// POST /curation/{id}/toggle - Flip one emotion class in the active set
async fn toggle_emotion(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<ToggleEmotionRequest>,
) -> ApiResult<Json<SelectionView>> {
    let view = {
        let mut sessions = state.sessions.write().await;
        let session = sessions
            .get_mut(&session_id)
            .ok_or_else(|| session_not_found(session_id))?;
        session.toggle_emotion(request.emotion)?;
        selection_view(session)?
    };

    emit_selection_changed(&state, session_id, &view);
    Ok(Json(view))
}

/// POST /curation/{id}/extract-count - Set the desired extraction count
///
/// The stored value is clamped into `[1, max_extractable]`; the response
/// reports what was actually stored.
async fn set_extract_count(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<ExtractCountRequest>,
) -> ApiResult<Json<SelectionView>> {
    let view = {
        let mut sessions = state.sessions.write().await;
        let session = sessions
            .get_mut(&session_id)
            .ok_or_else(|| session_not_found(session_id))?;
        session.set_extract_count(request.count)?;
        selection_view(session)?
    };

    emit_selection_changed(&state, session_id, &view);
    Ok(Json(view))
}

/// POST /curation/{id}/extract - Freeze an extraction snapshot
///
/// **[PSC-WF-040]** Rejected with 400 when no emotion class is active;
/// rejected with 409 outside REVIEWING.
async fn perform_extraction(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<ExtractionResponse>> {
    let response = {
        let mut sessions = state.sessions.write().await;
        let session = sessions
            .get_mut(&session_id)
            .ok_or_else(|| session_not_found(session_id))?;
        session.perform_extraction()?;

        let extraction = session.extraction.as_ref().ok_or_else(|| {
            ApiError::Internal("Extracted session is missing its snapshot".to_string())
        })?;
        ExtractionResponse {
            session_id,
            state: session.state,
            records: extraction.records.clone(),
            active_emotions: extraction.active_emotions.clone(),
        }
    };

    state.event_bus.emit_lossy(CurationEvent::ExtractionReady {
        session_id,
        count: response.records.len(),
        timestamp: chrono::Utc::now(),
    });

    tracing::info!(
        session_id = %session_id,
        count = response.records.len(),
        "Extraction snapshot frozen"
    );
    Ok(Json(response))
}

/// GET /curation/{id}/extraction - Read the frozen snapshot
async fn get_extraction(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<ExtractionResponse>> {
    let sessions = state.sessions.read().await;
    let session = sessions
        .get(&session_id)
        .ok_or_else(|| session_not_found(session_id))?;

    let extraction = session.extraction.as_ref().ok_or_else(|| {
        ApiError::Conflict(format!(
            "No extraction snapshot in state {:?}",
            session.state
        ))
    })?;

    Ok(Json(ExtractionResponse {
        session_id: session.session_id,
        state: session.state,
        records: extraction.records.clone(),
        active_emotions: extraction.active_emotions.clone(),
    }))
}

/// POST /curation/{id}/review - "Choose again": back to REVIEWING
///
/// Discards the snapshot; the selection state survives untouched.
async fn choose_again(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<SessionStateResponse>> {
    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&session_id)
        .ok_or_else(|| session_not_found(session_id))?;
    session.choose_again()?;

    tracing::info!(session_id = %session_id, "Session returned to review");
    Ok(Json(SessionStateResponse {
        session_id,
        state: session.state,
    }))
}

/// POST /curation/{id}/save - Store labeled photos to the blob store
///
/// **[PSC-INT-020]** `scope=selected` saves the frozen snapshot (requires
/// EXTRACTED); `scope=all` saves every analyzed record (REVIEWING or
/// EXTRACTED). Per-photo failures are counted, never collapsed into a
/// whole-batch error.
async fn save_photos(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SaveRequest>,
) -> ApiResult<Json<SaveResponse>> {
    // Snapshot the records to save, then release the lock for the
    // storage round-trips
    let records: Vec<PhotoRecord> = {
        let sessions = state.sessions.read().await;
        let session = sessions
            .get(&session_id)
            .ok_or_else(|| session_not_found(session_id))?;

        match request.scope {
            SaveScope::Selected => {
                let extraction = session.extraction.as_ref().ok_or_else(|| {
                    ApiError::Conflict(format!(
                        "No extraction snapshot to save in state {:?}",
                        session.state
                    ))
                })?;
                extraction.records.clone()
            }
            SaveScope::All => {
                let analysis = session.analysis.as_ref().ok_or_else(|| {
                    ApiError::Conflict(format!(
                        "No analysis result to save in state {:?}",
                        session.state
                    ))
                })?;
                analysis.records.clone()
            }
        }
    };

    let (report, stored) = state.storage.save_records(&records, request.scope).await;

    // Ledger rows for audit; a ledger write failure does not undo the save
    for (record, object_name) in &stored {
        if let Err(e) =
            crate::db::saved_photos::record_saved(&state.db, session_id, record, object_name).await
        {
            tracing::warn!(
                session_id = %session_id,
                object_name = %object_name,
                error = %e,
                "Failed to record saved photo in ledger"
            );
        }
    }

    state.event_bus.emit_lossy(CurationEvent::SaveCompleted {
        session_id,
        succeeded: report.succeeded,
        failed: report.failed,
        timestamp: chrono::Utc::now(),
    });

    tracing::info!(
        session_id = %session_id,
        succeeded = report.succeeded,
        failed = report.failed,
        "Save completed"
    );

    Ok(Json(SaveResponse {
        session_id,
        scope: request.scope,
        succeeded: report.succeeded,
        failed: report.failed,
    }))
}

/// GET /curation/active - List non-terminal sessions
async fn list_active(
    State(state): State<AppState>,
) -> Json<Vec<ActiveSessionEntry>> {
    let sessions = state.sessions.read().await;
    let mut active: Vec<ActiveSessionEntry> = sessions
        .values()
        .filter(|s| !s.is_terminal())
        .map(|s| ActiveSessionEntry {
            session_id: s.session_id,
            state: s.state,
            started_at: s.started_at,
        })
        .collect();
    active.sort_by_key(|entry| entry.started_at);
    Json(active)
}

// ============================================================================
// Helpers
// ============================================================================

fn session_not_found(session_id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Curation session not found: {}", session_id))
}

fn selection_view(session: &CurationSession) -> ApiResult<SelectionView> {
    match (&session.analysis, &session.selection) {
        (Some(analysis), Some(selection)) => Ok(SelectionView {
            active_emotions: selection.active_emotions.iter().copied().collect(),
            extract_count: selection.extract_count,
            max_extractable: selection.max_extractable(analysis),
        }),
        _ => Err(ApiError::Internal(
            "Reviewing session is missing selection state".to_string(),
        )),
    }
}

fn emit_selection_changed(state: &AppState, session_id: Uuid, view: &SelectionView) {
    state.event_bus.emit_lossy(CurationEvent::SelectionChanged {
        session_id,
        active_emotions: view.active_emotions.clone(),
        extract_count: view.extract_count,
        max_extractable: view.max_extractable,
        timestamp: chrono::Utc::now(),
    });
}
