//! Emotion classifier collaborator
//!
//! **[PSC-INT-010]** The classifier is an external service: one photo
//! locator in, one `(emotion, confidence)` verdict out. Its internal
//! algorithm is opaque to this service. Per-call failures (including
//! timeouts) are the caller's business; the batch analyzer degrades them
//! to the unclassified bucket.

use crate::models::analysis::{Classification, PhotoRef};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = "PhotoSelect/0.1.0 (photosel-cs)";
/// Per-photo timeout; a slow classifier degrades to `other`, it does not
/// block the rest of the batch
const CLASSIFY_TIMEOUT_SECS: u64 = 20;

/// Classifier call errors
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Classifier API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// One photo in, one verdict out
///
/// Implementations must be usable from the background analysis task.
pub trait Classifier: Send + Sync {
    fn classify(
        &self,
        photo: &PhotoRef,
    ) -> impl Future<Output = Result<Classification, ClassifierError>> + Send;
}

/// Request body sent to the classifier service
#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    photo_url: &'a str,
}

/// Response body from the classifier service
#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    emotion: photosel_common::events::EmotionType,
    confidence: u8,
}

/// HTTP adapter for the classifier collaborator
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpClassifier {
    pub fn new(endpoint: String) -> Result<Self, ClassifierError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(CLASSIFY_TIMEOUT_SECS))
            .build()
            .map_err(|e| ClassifierError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Classifier for HttpClassifier {
    async fn classify(&self, photo: &PhotoRef) -> Result<Classification, ClassifierError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&ClassifyRequest {
                photo_url: photo.as_str(),
            })
            .send()
            .await
            .map_err(|e| ClassifierError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Api(status.as_u16(), body));
        }

        let verdict: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Parse(e.to_string()))?;

        Ok(Classification {
            emotion: verdict.emotion,
            confidence: verdict.confidence,
        }
        .normalized())
    }
}
