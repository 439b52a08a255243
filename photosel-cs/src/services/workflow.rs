//! Curation workflow orchestration
//!
//! **[PSC-WF-030]** Runs the background analysis task for one session:
//! drives the batch analyzer, bridges per-photo progress into the session
//! map and the SSE event bus, and performs the ANALYZING → REVIEWING
//! transition (or CANCELLED / FAILED) when the analyzer finishes.

use crate::models::analysis::PhotoRef;
use crate::models::selection::DEFAULT_EXTRACT_LIMIT;
use crate::models::session::WorkflowState;
use crate::services::batch_analyzer::{self, AnalysisOutcome};
use crate::services::classifier::Classifier;
use crate::SharedSessions;
use anyhow::Result;
use photosel_common::events::{CurationEvent, EventBus};
use sqlx::SqlitePool;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Session-level curation orchestrator
pub struct CurationOrchestrator {
    /// Database connection pool (settings, saved-photo ledger)
    db: SqlitePool,
    /// Event bus for SSE broadcasting
    event_bus: EventBus,
    /// Shared in-memory session map
    sessions: SharedSessions,
}

impl CurationOrchestrator {
    pub fn new(db: SqlitePool, event_bus: EventBus, sessions: SharedSessions) -> Self {
        Self {
            db,
            event_bus,
            sessions,
        }
    }

    /// Execute the analysis phase for a session already in ANALYZING
    ///
    /// Per-photo progress flows through an unbounded channel into a
    /// forwarder task, so the analyzer's callback stays synchronous while
    /// session updates and SSE events happen on the async side. The channel
    /// is FIFO, so reported progress keeps the analyzer's ordering.
    pub async fn execute_analysis<C: Classifier>(
        &self,
        session_id: Uuid,
        photos: Vec<PhotoRef>,
        classifier: &C,
        cancel_token: CancellationToken,
    ) -> Result<()> {
        let total = photos.len();
        tracing::info!(
            session_id = %session_id,
            total_photos = total,
            "Starting curation analysis"
        );

        self.event_bus.emit_lossy(CurationEvent::CurationSessionStarted {
            session_id,
            total_photos: total,
            timestamp: chrono::Utc::now(),
        });

        let default_limit = match crate::db::settings::default_extract_limit(&self.db).await {
            Ok(limit) => limit,
            Err(e) => {
                tracing::warn!(
                    session_id = %session_id,
                    error = %e,
                    "Failed to read default extract limit, using built-in default"
                );
                DEFAULT_EXTRACT_LIMIT
            }
        };

        // Bridge sync progress callbacks into session updates + SSE
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<(usize, usize)>();
        let forwarder = {
            let sessions = self.sessions.clone();
            let event_bus = self.event_bus.clone();
            tokio::spawn(async move {
                while let Some((completed, total)) = progress_rx.recv().await {
                    {
                        let mut sessions = sessions.write().await;
                        if let Some(session) = sessions.get_mut(&session_id) {
                            session.record_progress(completed, total);
                        }
                    }
                    event_bus.emit_lossy(CurationEvent::PhotoClassified {
                        session_id,
                        completed,
                        total,
                        timestamp: chrono::Utc::now(),
                    });
                }
            })
        };

        let outcome = batch_analyzer::analyze(
            photos,
            classifier,
            |completed, total| {
                let _ = progress_tx.send((completed, total));
            },
            &cancel_token,
        )
        .await;

        // Closing the channel flushes remaining progress before completion
        drop(progress_tx);
        let _ = forwarder.await;

        match outcome {
            AnalysisOutcome::Cancelled => {
                // The cancel endpoint may have already transitioned the
                // session and emitted the event; only emit when this task
                // performs the transition, so one cancel yields one event.
                let transitioned = {
                    let mut sessions = self.sessions.write().await;
                    match sessions.get_mut(&session_id) {
                        Some(session) if session.state == WorkflowState::Analyzing => {
                            session.cancel().is_ok()
                        }
                        _ => false,
                    }
                };

                if transitioned {
                    self.event_bus
                        .emit_lossy(CurationEvent::CurationSessionCancelled {
                            session_id,
                            timestamp: chrono::Utc::now(),
                        });
                }

                tracing::info!(session_id = %session_id, "Curation analysis cancelled");
                Ok(())
            }
            AnalysisOutcome::Completed(result) => {
                let summaries: Vec<_> =
                    result.summaries.iter().map(|s| s.to_event_data()).collect();
                let result_total = result.total;

                {
                    let mut sessions = self.sessions.write().await;
                    let session = sessions.get_mut(&session_id).ok_or_else(|| {
                        anyhow::anyhow!("Curation session not found: {}", session_id)
                    })?;

                    if let Err(e) = session.complete_analysis(result, default_limit) {
                        // Raced with a cancel; nothing left to do
                        tracing::warn!(
                            session_id = %session_id,
                            error = %e,
                            "Analysis completed but session left ANALYZING"
                        );
                        return Ok(());
                    }
                }

                self.event_bus.emit_lossy(CurationEvent::AnalysisCompleted {
                    session_id,
                    total: result_total,
                    summaries,
                    timestamp: chrono::Utc::now(),
                });

                tracing::info!(
                    session_id = %session_id,
                    total = result_total,
                    "Curation analysis completed, session entering review"
                );
                Ok(())
            }
        }
    }

    /// Handle workflow failure
    ///
    /// Transitions the session to FAILED and broadcasts the failure event.
    pub async fn handle_failure(&self, session_id: Uuid, error: &anyhow::Error) {
        tracing::error!(
            session_id = %session_id,
            error = %error,
            "Curation workflow failed"
        );

        {
            let mut sessions = self.sessions.write().await;
            if let Some(session) = sessions.get_mut(&session_id) {
                session.fail(error.to_string());
            }
        }

        self.event_bus.emit_lossy(CurationEvent::CurationSessionFailed {
            session_id,
            error: error.to_string(),
            timestamp: chrono::Utc::now(),
        });
    }
}
