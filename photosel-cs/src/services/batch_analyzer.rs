//! Batch analyzer
//!
//! **[PSC-AN-020]** Drives the classifier over an ordered photo batch,
//! one photo at a time in input order. Each completed photo triggers
//! exactly one progress callback with the cumulative count, so the
//! reported progress is monotonic and matches true progress. A failing
//! classifier call degrades that photo to the unclassified bucket instead
//! of aborting the batch.

use crate::models::analysis::{AnalysisResult, Classification, PhotoRef};
use crate::services::classifier::Classifier;
use tokio_util::sync::CancellationToken;

/// Outcome of one analysis run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    /// All photos processed; result is complete
    Completed(AnalysisResult),
    /// Cancelled mid-batch; no partial result is produced
    Cancelled,
}

/// Analyze an ordered photo batch
///
/// Contract:
/// - `on_progress(completed, total)` fires exactly once per completed
///   photo, in order, with `completed` running from 1 to `total`.
/// - An empty batch returns an empty result without touching the
///   classifier or the progress callback.
/// - Cancellation stops further classifier calls and progress callbacks;
///   `Cancelled` carries no partial data.
pub async fn analyze<C: Classifier>(
    photos: Vec<PhotoRef>,
    classifier: &C,
    mut on_progress: impl FnMut(usize, usize),
    cancel_token: &CancellationToken,
) -> AnalysisOutcome {
    if photos.is_empty() {
        return AnalysisOutcome::Completed(AnalysisResult::empty());
    }

    let total = photos.len();
    let mut classified: Vec<(PhotoRef, Classification)> = Vec::with_capacity(total);

    for (index, photo) in photos.into_iter().enumerate() {
        if cancel_token.is_cancelled() {
            tracing::info!(
                completed = index,
                total = total,
                "Batch analysis cancelled"
            );
            return AnalysisOutcome::Cancelled;
        }

        let verdict = match classifier.classify(&photo).await {
            Ok(verdict) => verdict,
            Err(e) => {
                // Classification failure degrades to the unclassified
                // bucket; one bad photo cannot block the remaining batch
                tracing::warn!(
                    photo = %photo,
                    error = %e,
                    "Classification failed, degrading to unclassified"
                );
                Classification::unclassified()
            }
        };

        classified.push((photo, verdict));
        on_progress(index + 1, total);
    }

    AnalysisOutcome::Completed(AnalysisResult::build(classified))
}
