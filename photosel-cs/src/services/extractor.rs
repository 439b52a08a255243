//! Extractor
//!
//! Pure top-N extraction over an analysis result and a selection state.
//! Safe to call repeatedly; inputs are never mutated.

use crate::models::analysis::{AnalysisResult, PhotoRecord};
use crate::models::selection::SelectionState;

/// Top-N records for the current selection
///
/// Filtered to the active classes, confidence-descending, truncated to
/// `extract_count`. If the count exceeds the filtered list (the selection
/// model's clamp normally prevents this), all available records are
/// returned rather than padding or failing.
pub fn extract(result: &AnalysisResult, selection: &SelectionState) -> Vec<PhotoRecord> {
    selection
        .filtered_records(result)
        .into_iter()
        .take(selection.extract_count)
        .cloned()
        .collect()
}
