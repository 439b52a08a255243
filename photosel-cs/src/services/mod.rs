//! Service layer for photosel-cs

pub mod batch_analyzer;
pub mod classifier;
pub mod extractor;
pub mod storage;
pub mod workflow;

pub use batch_analyzer::{analyze, AnalysisOutcome};
pub use classifier::{Classifier, ClassifierError, HttpClassifier};
pub use storage::{SaveReport, SaveScope, StorageClient, StorageError, UploadPayload};
pub use workflow::CurationOrchestrator;
