//! Data models for photosel-cs

pub mod analysis;
pub mod selection;
pub mod session;

pub use analysis::{AnalysisResult, Classification, EmotionSummary, PhotoRecord, PhotoRef};
pub use selection::{SelectionState, DEFAULT_EXTRACT_LIMIT};
pub use session::{
    AnalysisProgress, CurationSession, ExtractionResult, StateTransition, WorkflowState,
};
