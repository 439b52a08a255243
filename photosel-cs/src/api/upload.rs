//! Photo upload API endpoint
//!
//! **[PSC-INT-020]** Accepts a batch of base64 photo payloads, forwards
//! them to the blob store, and returns one stable locator per photo in the
//! original order. The locators are what `POST /curation/start` consumes.

use crate::error::{ApiError, ApiResult};
use crate::services::UploadPayload;
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

/// Build upload routes
pub fn upload_routes() -> Router<AppState> {
    Router::new().route("/photos/upload", post(upload_photos))
}

/// Request body for POST /photos/upload
#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub photos: Vec<UploadPayload>,
}

/// Response for POST /photos/upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// One locator per uploaded photo, in request order
    pub photos: Vec<String>,
}

/// POST /photos/upload - Upload a photo batch to the blob store
async fn upload_photos(
    State(state): State<AppState>,
    Json(request): Json<UploadRequest>,
) -> ApiResult<Json<UploadResponse>> {
    if request.photos.is_empty() {
        return Err(ApiError::BadRequest(
            "Upload batch contains no photos".to_string(),
        ));
    }

    let count = request.photos.len();
    let refs = state
        .storage
        .upload_batch(request.photos)
        .await
        .map_err(|e| match e {
            crate::services::StorageError::InvalidPayload(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        })?;

    tracing::info!(count = count, "Photo batch uploaded");
    Ok(Json(UploadResponse {
        photos: refs.into_iter().map(|r| r.0).collect(),
    }))
}
