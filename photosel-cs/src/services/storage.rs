//! Blob storage collaborator
//!
//! **[PSC-INT-020]** Upload and persistence client for the object store.
//! The core only relies on two properties: upload preserves batch order,
//! and each returned locator is independently retrievable. Saving labeled
//! photos reports partial failure as counts; it never claims full success
//! when some stores failed.

use crate::models::analysis::{PhotoRecord, PhotoRef};
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = "PhotoSelect/0.1.0 (photosel-cs)";
const STORAGE_TIMEOUT_SECS: u64 = 30;

/// Storage client errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Storage API error {0}: {1}")]
    Api(u16, String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

/// One raw photo payload for upload
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadPayload {
    /// Original file name, used only to keep the extension
    pub file_name: Option<String>,
    /// Base64-encoded photo bytes
    pub data_base64: String,
}

/// Which photos a save operation covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveScope {
    /// The frozen extraction snapshot
    Selected,
    /// Every record in the analysis result
    All,
}

impl SaveScope {
    /// Object name for one saved record
    ///
    /// Mirrors the export naming scheme: `selected-{ts}-{id}.jpg` and
    /// `all-{ts}-{id}-{emotion}.jpg`.
    pub fn object_name(self, record: &PhotoRecord, timestamp_ms: i64) -> String {
        match self {
            SaveScope::Selected => format!("selected-{}-{}.jpg", timestamp_ms, record.id),
            SaveScope::All => format!(
                "all-{}-{}-{}.jpg",
                timestamp_ms, record.id, record.emotion
            ),
        }
    }
}

/// Result of a save run: partial failure is visible, not swallowed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// HTTP client for the blob store
#[derive(Debug, Clone)]
pub struct StorageClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl StorageClient {
    pub fn new(base_url: String) -> Result<Self, StorageError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(STORAGE_TIMEOUT_SECS))
            .build()
            .map_err(|e| StorageError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload a batch of raw payloads, preserving order
    ///
    /// Returns one stable locator per payload. Object names are
    /// content-addressed (SHA-256 prefix) so re-uploads of identical bytes
    /// land on the same object.
    pub async fn upload_batch(
        &self,
        payloads: Vec<UploadPayload>,
    ) -> Result<Vec<PhotoRef>, StorageError> {
        let mut refs = Vec::with_capacity(payloads.len());

        for payload in payloads {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(payload.data_base64.as_bytes())
                .map_err(|e| StorageError::InvalidPayload(e.to_string()))?;

            let extension = payload
                .file_name
                .as_deref()
                .and_then(|name| name.rsplit_once('.'))
                .map(|(_, ext)| ext.to_ascii_lowercase())
                .unwrap_or_else(|| "jpg".to_string());

            let digest = Sha256::digest(&bytes);
            let object_name = format!("upload-{:x}.{}", digest, extension);

            let photo_ref = self.store(&object_name, bytes).await?;
            refs.push(photo_ref);
        }

        Ok(refs)
    }

    /// Store one object, returning its retrievable locator
    pub async fn store(&self, object_name: &str, bytes: Vec<u8>) -> Result<PhotoRef, StorageError> {
        let url = format!("{}/photos/{}", self.base_url, object_name);

        let response = self
            .http_client
            .put(&url)
            .body(bytes)
            .send()
            .await
            .map_err(|e| StorageError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Api(status.as_u16(), body));
        }

        Ok(PhotoRef(url))
    }

    /// Fetch the bytes behind a photo locator
    pub async fn fetch(&self, photo: &PhotoRef) -> Result<Vec<u8>, StorageError> {
        let response = self
            .http_client
            .get(photo.as_str())
            .send()
            .await
            .map_err(|e| StorageError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Api(status.as_u16(), body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StorageError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// Save labeled photos: fetch each record's bytes, store them under the
    /// scope's naming scheme, and count per-photo outcomes
    ///
    /// A failed fetch or store is counted and logged, never fatal for the
    /// rest of the batch.
    pub async fn save_records(
        &self,
        records: &[PhotoRecord],
        scope: SaveScope,
    ) -> (SaveReport, Vec<(PhotoRecord, String)>) {
        let timestamp_ms = chrono::Utc::now().timestamp_millis();
        let mut report = SaveReport {
            succeeded: 0,
            failed: 0,
        };
        let mut stored = Vec::new();

        for record in records {
            let object_name = scope.object_name(record, timestamp_ms);

            let outcome = match self.fetch(&record.photo).await {
                Ok(bytes) => self.store(&object_name, bytes).await.map(|_| ()),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(()) => {
                    report.succeeded += 1;
                    stored.push((record.clone(), object_name));
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        photo_id = record.id,
                        photo = %record.photo,
                        error = %e,
                        "Failed to save labeled photo"
                    );
                }
            }
        }

        (report, stored)
    }
}
