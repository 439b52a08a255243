//! Curation workflow type definitions
//!
//! Supporting types shared between the Curation Service and its event
//! consumers. The emotion vocabulary is a closed enum rather than an open
//! string so unrecognized labels are rejected at the serde boundary.

use serde::{Deserialize, Serialize};

/// Classification bucket assigned to a photo
///
/// `Other` is the distinguished "unclassified" sentinel: it always carries
/// confidence 0 and is never part of the initial active-class selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionType {
    Smile,
    Focus,
    Sad,
    Other,
}

impl EmotionType {
    /// Canonical ordering of the closed emotion set
    ///
    /// Summaries are emitted in this order so output is deterministic
    /// across runs.
    pub const ALL: [EmotionType; 4] = [
        EmotionType::Smile,
        EmotionType::Focus,
        EmotionType::Sad,
        EmotionType::Other,
    ];

    /// Whether this is the unclassified sentinel bucket
    pub fn is_unclassified(self) -> bool {
        self == EmotionType::Other
    }

    /// Stable lowercase label (matches the serde representation)
    pub fn label(self) -> &'static str {
        match self {
            EmotionType::Smile => "smile",
            EmotionType::Focus => "focus",
            EmotionType::Sad => "sad",
            EmotionType::Other => "other",
        }
    }
}

impl std::fmt::Display for EmotionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-class count data for SSE events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionCountData {
    pub emotion: EmotionType,
    pub count: usize,
}
