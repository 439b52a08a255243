//! Analysis result model
//!
//! **[PSC-AN-010]** A completed analysis is an immutable value: per-photo
//! records plus per-class counts derived from them. Records keep their
//! upload-order ids; only the `records` view is sorted by confidence.

use photosel_common::events::{EmotionCountData, EmotionType};
use serde::{Deserialize, Serialize};

/// Opaque locator for one uploaded photo
///
/// Created by the upload step; stable for the lifetime of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoRef(pub String);

impl PhotoRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PhotoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One classifier verdict: label plus confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub emotion: EmotionType,
    /// Classifier-reported certainty, 0-100
    pub confidence: u8,
}

impl Classification {
    /// The degraded verdict used when classification fails or times out
    pub fn unclassified() -> Self {
        Self {
            emotion: EmotionType::Other,
            confidence: 0,
        }
    }

    /// Normalize a raw classifier verdict
    ///
    /// The unclassified bucket always carries confidence 0; any other
    /// confidence is capped at 100.
    pub fn normalized(self) -> Self {
        if self.emotion.is_unclassified() {
            Self::unclassified()
        } else {
            Self {
                emotion: self.emotion,
                confidence: self.confidence.min(100),
            }
        }
    }
}

/// One analyzed photo
///
/// Created exactly once per photo during analysis; immutable thereafter.
/// `id` is the 1-based upload ordinal, never re-ordered by confidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: u32,
    pub photo: PhotoRef,
    pub emotion: EmotionType,
    pub confidence: u8,
}

/// Per-class occurrence count; classes with zero photos never appear
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionSummary {
    pub emotion: EmotionType,
    pub count: usize,
}

impl EmotionSummary {
    pub fn to_event_data(&self) -> EmotionCountData {
        EmotionCountData {
            emotion: self.emotion,
            count: self.count,
        }
    }
}

/// Immutable result of one analysis run
///
/// Invariants (verified by tests, held by construction):
/// - `total == records.len()`
/// - `total == summaries.iter().map(|s| s.count).sum()`
/// - `records` is sorted by confidence descending, ties by id ascending
/// - `summaries` follows the canonical `EmotionType::ALL` order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub total: usize,
    pub summaries: Vec<EmotionSummary>,
    pub records: Vec<PhotoRecord>,
}

impl AnalysisResult {
    /// Build a result from per-photo verdicts in upload order
    ///
    /// Ids are assigned sequentially from 1 in input order before the
    /// confidence sort, so ties preserve upload order.
    pub fn build(classified: Vec<(PhotoRef, Classification)>) -> Self {
        let mut records: Vec<PhotoRecord> = classified
            .into_iter()
            .enumerate()
            .map(|(index, (photo, verdict))| {
                let verdict = verdict.normalized();
                PhotoRecord {
                    id: (index + 1) as u32,
                    photo,
                    emotion: verdict.emotion,
                    confidence: verdict.confidence,
                }
            })
            .collect();

        let summaries: Vec<EmotionSummary> = EmotionType::ALL
            .iter()
            .filter_map(|&emotion| {
                let count = records.iter().filter(|r| r.emotion == emotion).count();
                (count > 0).then_some(EmotionSummary { emotion, count })
            })
            .collect();

        let total = records.len();
        // Stable sort: equal confidences keep ascending-id (upload) order
        records.sort_by(|a, b| b.confidence.cmp(&a.confidence));

        Self {
            total,
            summaries,
            records,
        }
    }

    /// An empty result ("no data available", not a completed analysis)
    pub fn empty() -> Self {
        Self {
            total: 0,
            summaries: Vec::new(),
            records: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Emotion classes present in this result, canonical order
    pub fn detected_emotions(&self) -> impl Iterator<Item = EmotionType> + '_ {
        self.summaries.iter().map(|s| s.emotion)
    }
}
