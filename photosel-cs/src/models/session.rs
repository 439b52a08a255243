//! Curation workflow state machine
//!
//! **[PSC-WF-010]** A curation session progresses through
//! IDLE → ANALYZING → REVIEWING ⇄ EXTRACTED, with CANCELLED and FAILED as
//! terminal side exits. Unlike free-form state fields, every transition
//! here is a guarded method: illegal transitions return
//! `Error::InvalidState` instead of silently rewriting the state. The
//! ANALYZING → REVIEWING transition is one-shot by construction (a second
//! completion attempt finds the session already in REVIEWING and fails).

use crate::models::analysis::{AnalysisResult, PhotoRecord};
use crate::models::selection::SelectionState;
use crate::services::extractor;
use chrono::{DateTime, Utc};
use photosel_common::events::EmotionType;
use photosel_common::{Error, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// **[PSC-WF-010]** Curation workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkflowState {
    /// No analysis data; also the terminal "nothing to analyze" state
    Idle,
    /// Batch classification in progress
    Analyzing,
    /// Post-analysis; selection is mutable
    Reviewing,
    /// Extraction snapshot frozen and shown
    Extracted,
    /// Analysis cancelled by the user
    Cancelled,
    /// Workflow failed with a critical error
    Failed,
}

/// **[PSC-WF-010]** State transition event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub session_id: Uuid,
    pub old_state: WorkflowState,
    pub new_state: WorkflowState,
    pub transitioned_at: DateTime<Utc>,
}

/// Progress tracking for the ANALYZING phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisProgress {
    /// Photos classified so far
    pub completed: usize,
    /// Total photos in the batch
    pub total: usize,
    /// Percentage complete (0.0 - 100.0)
    pub percentage: f64,
    /// Current operation description
    pub current_operation: String,
}

impl Default for AnalysisProgress {
    fn default() -> Self {
        Self {
            completed: 0,
            total: 0,
            percentage: 0.0,
            current_operation: String::from("Waiting for photos..."),
        }
    }
}

/// Frozen extraction snapshot, taken at the REVIEWING → EXTRACTED transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Top-N records, filtered and confidence-descending
    pub records: Vec<PhotoRecord>,
    /// Active classes at snapshot time
    pub active_emotions: Vec<EmotionType>,
}

/// **[PSC-WF-020]** Curation session (in-memory state)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationSession {
    /// Unique session identifier
    pub session_id: Uuid,

    /// Current workflow state
    pub state: WorkflowState,

    /// Progress tracking (meaningful during ANALYZING)
    pub progress: AnalysisProgress,

    /// Analysis result, present from REVIEWING onward
    pub analysis: Option<AnalysisResult>,

    /// Selection state, present from REVIEWING onward
    pub selection: Option<SelectionState>,

    /// Frozen snapshot, present only in EXTRACTED
    pub extraction: Option<ExtractionResult>,

    /// Failure description for FAILED sessions
    pub error: Option<String>,

    /// Session start time
    pub started_at: DateTime<Utc>,

    /// Session end time (if terminal)
    pub ended_at: Option<DateTime<Utc>>,
}

impl CurationSession {
    /// Create a new session in IDLE
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            state: WorkflowState::Idle,
            progress: AnalysisProgress::default(),
            analysis: None,
            selection: None,
            extraction: None,
            error: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// IDLE → ANALYZING: a non-empty batch was received
    pub fn begin_analysis(&mut self, total_photos: usize) -> Result<StateTransition> {
        self.expect_state(WorkflowState::Idle, "begin analysis")?;
        if total_photos == 0 {
            return Err(Error::InvalidInput(
                "Cannot begin analysis with an empty batch".to_string(),
            ));
        }

        self.progress = AnalysisProgress {
            completed: 0,
            total: total_photos,
            percentage: 0.0,
            current_operation: format!("Analyzing {} photos...", total_photos),
        };
        Ok(self.transition_to(WorkflowState::Analyzing))
    }

    /// IDLE → IDLE: an empty batch leaves the session in a terminal
    /// "nothing to analyze" state with a user-visible message
    pub fn complete_with_empty_batch(&mut self) -> Result<()> {
        self.expect_state(WorkflowState::Idle, "finish empty batch")?;
        self.progress.current_operation = String::from("No photos to analyze");
        self.ended_at = Some(Utc::now());
        Ok(())
    }

    /// Record per-photo progress during ANALYZING
    pub fn record_progress(&mut self, completed: usize, total: usize) {
        self.progress.completed = completed;
        self.progress.total = total;
        self.progress.percentage = if total > 0 {
            (completed as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        self.progress.current_operation = format!("Classified {}/{} photos", completed, total);
    }

    /// ANALYZING → REVIEWING: the batch completed
    ///
    /// Initializes the selection state exactly once; a duplicate completion
    /// finds the session in REVIEWING and is rejected.
    pub fn complete_analysis(
        &mut self,
        result: AnalysisResult,
        default_extract_limit: usize,
    ) -> Result<StateTransition> {
        self.expect_state(WorkflowState::Analyzing, "complete analysis")?;

        self.record_progress(result.total, result.total);
        self.progress.current_operation = format!("Analyzed {} photos", result.total);
        self.selection = Some(SelectionState::initialize(&result, default_extract_limit));
        self.analysis = Some(result);
        Ok(self.transition_to(WorkflowState::Reviewing))
    }

    /// REVIEWING → REVIEWING: flip a class in the active set
    pub fn toggle_emotion(&mut self, emotion: EmotionType) -> Result<()> {
        self.expect_state(WorkflowState::Reviewing, "toggle emotion")?;
        let (analysis, selection) = self.review_state_mut()?;
        selection.toggle_emotion(emotion, analysis);
        Ok(())
    }

    /// REVIEWING → REVIEWING: set the desired extraction count (clamped)
    pub fn set_extract_count(&mut self, count: usize) -> Result<()> {
        self.expect_state(WorkflowState::Reviewing, "set extract count")?;
        let (analysis, selection) = self.review_state_mut()?;
        selection.set_extract_count(count, analysis);
        Ok(())
    }

    /// REVIEWING → EXTRACTED: freeze an extraction snapshot
    ///
    /// Guarded: rejected when no class is active.
    pub fn perform_extraction(&mut self) -> Result<StateTransition> {
        self.expect_state(WorkflowState::Reviewing, "extract")?;
        let (analysis, selection) = self.review_state_mut()?;
        if !selection.can_extract(analysis) {
            return Err(Error::InvalidInput(
                "Cannot extract with no active emotion classes".to_string(),
            ));
        }

        let records = extractor::extract(analysis, selection);
        let active_emotions = selection.active_emotions.iter().copied().collect();
        self.extraction = Some(ExtractionResult {
            records,
            active_emotions,
        });
        Ok(self.transition_to(WorkflowState::Extracted))
    }

    /// EXTRACTED → REVIEWING: "choose again"
    ///
    /// Discards the snapshot; the selection state is preserved, not reset.
    pub fn choose_again(&mut self) -> Result<StateTransition> {
        self.expect_state(WorkflowState::Extracted, "choose again")?;
        self.extraction = None;
        Ok(self.transition_to(WorkflowState::Reviewing))
    }

    /// ANALYZING → CANCELLED: external cancel signal
    ///
    /// No partial analysis result is retained.
    pub fn cancel(&mut self) -> Result<StateTransition> {
        self.expect_state(WorkflowState::Analyzing, "cancel")?;
        self.progress.current_operation = String::from("Analysis cancelled by user");
        Ok(self.transition_to(WorkflowState::Cancelled))
    }

    /// Any non-terminal state → FAILED
    pub fn fail(&mut self, error: String) -> StateTransition {
        self.progress.current_operation = format!("Curation failed: {}", error);
        self.error = Some(error);
        self.transition_to(WorkflowState::Failed)
    }

    /// Check if session is terminal (finished)
    pub fn is_terminal(&self) -> bool {
        self.ended_at.is_some()
            || matches!(
                self.state,
                WorkflowState::Cancelled | WorkflowState::Failed
            )
    }

    /// Current extraction bound, derived from the live selection
    pub fn max_extractable(&self) -> usize {
        match (&self.analysis, &self.selection) {
            (Some(analysis), Some(selection)) => selection.max_extractable(analysis),
            _ => 0,
        }
    }

    fn expect_state(&self, expected: WorkflowState, action: &str) -> Result<()> {
        if self.state != expected {
            return Err(Error::InvalidState(format!(
                "Cannot {} in state {:?}",
                action, self.state
            )));
        }
        Ok(())
    }

    fn review_state_mut(&mut self) -> Result<(&AnalysisResult, &mut SelectionState)> {
        match (&self.analysis, &mut self.selection) {
            (Some(analysis), Some(selection)) => Ok((analysis, selection)),
            _ => Err(Error::Internal(
                "Reviewing session is missing analysis data".to_string(),
            )),
        }
    }

    fn transition_to(&mut self, new_state: WorkflowState) -> StateTransition {
        let transition = StateTransition {
            session_id: self.session_id,
            old_state: self.state,
            new_state,
            transitioned_at: Utc::now(),
        };
        self.state = new_state;

        // Set end time for terminal states
        match new_state {
            WorkflowState::Cancelled | WorkflowState::Failed => {
                self.ended_at = Some(Utc::now());
            }
            _ => {}
        }

        transition
    }
}

impl Default for CurationSession {
    fn default() -> Self {
        Self::new()
    }
}
