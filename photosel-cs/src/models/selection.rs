//! Selection model
//!
//! **[PSC-SEL-010]** Mutable review-stage state over an immutable
//! `AnalysisResult`: the set of active classes and the desired extraction
//! count. Derived views are recomputed on every call; nothing here is
//! cached because the active set can change between reads.

use crate::models::analysis::{AnalysisResult, PhotoRecord};
use photosel_common::events::EmotionType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Default upper bound for the initial extraction count
pub const DEFAULT_EXTRACT_LIMIT: usize = 6;

/// Review-stage selection state
///
/// Owned exclusively by the Reviewing/Extracted session; single-writer
/// discipline is assumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    /// Classes currently included in filtering (deterministic order)
    pub active_emotions: BTreeSet<EmotionType>,
    /// Desired extraction count, always in `[1, max_extractable]`
    pub extract_count: usize,
}

impl SelectionState {
    /// Initialize from a fresh analysis result
    ///
    /// Activates every detected class except the unclassified sentinel and
    /// caps the initial count at `default_limit` (floored at 1).
    pub fn initialize(result: &AnalysisResult, default_limit: usize) -> Self {
        let active_emotions: BTreeSet<EmotionType> = result
            .detected_emotions()
            .filter(|e| !e.is_unclassified())
            .collect();

        let mut state = Self {
            active_emotions,
            extract_count: 1,
        };
        state.extract_count = state.clamp_count(default_limit.max(1), result);
        state
    }

    /// Flip membership of a class in the active set
    ///
    /// The unclassified bucket may be toggled like any other class, letting
    /// the user opt into unclassified photos. The extraction count is
    /// re-clamped against the new bound.
    pub fn toggle_emotion(&mut self, emotion: EmotionType, result: &AnalysisResult) {
        if !self.active_emotions.remove(&emotion) {
            self.active_emotions.insert(emotion);
        }
        self.extract_count = self.clamp_count(self.extract_count, result);
    }

    /// Set the desired extraction count, clamped into `[1, max_extractable]`
    ///
    /// An out-of-range value is never stored.
    pub fn set_extract_count(&mut self, count: usize, result: &AnalysisResult) {
        self.extract_count = self.clamp_count(count, result);
    }

    /// Count of records whose class is currently active
    ///
    /// Pure derivation over the analysis result; recomputed on every call.
    pub fn max_extractable(&self, result: &AnalysisResult) -> usize {
        result
            .records
            .iter()
            .filter(|r| self.active_emotions.contains(&r.emotion))
            .count()
    }

    /// Records filtered to the active classes, confidence-descending
    /// (order inherited from `AnalysisResult.records`)
    pub fn filtered_records<'a>(&self, result: &'a AnalysisResult) -> Vec<&'a PhotoRecord> {
        result
            .records
            .iter()
            .filter(|r| self.active_emotions.contains(&r.emotion))
            .collect()
    }

    /// Whether an extraction may be performed from this state
    ///
    /// Extraction with zero active classes is prevented at the workflow
    /// transition guard; this is the predicate behind that guard.
    pub fn can_extract(&self, result: &AnalysisResult) -> bool {
        !self.active_emotions.is_empty() && self.max_extractable(result) > 0
    }

    /// Clamp a requested count into `[1, max_extractable]`
    ///
    /// When nothing matches the active set the floor of 1 still applies;
    /// extraction itself is disabled separately via `can_extract`.
    fn clamp_count(&self, count: usize, result: &AnalysisResult) -> usize {
        count.clamp(1, self.max_extractable(result).max(1))
    }
}
