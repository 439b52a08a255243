//! Batch Analyzer Tests
//! Test File: analyzer_tests.rs
//! Requirements: PSC-AN-010 (Analysis Result), PSC-AN-020 (Batch Analyzer)

use photosel_common::events::EmotionType;
use photosel_cs::models::analysis::{Classification, PhotoRef};
use photosel_cs::services::{analyze, AnalysisOutcome, Classifier, ClassifierError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

fn photo(n: u32) -> PhotoRef {
    PhotoRef(format!("https://store.local/photos/{n}.jpg"))
}

fn verdict(emotion: EmotionType, confidence: u8) -> Classification {
    Classification {
        emotion,
        confidence,
    }
}

/// Classifier test double that replays a scripted verdict sequence
struct ScriptedClassifier {
    verdicts: Mutex<VecDeque<Result<Classification, ClassifierError>>>,
    calls: AtomicUsize,
    /// Cancel this token once the given number of calls completed
    cancel_after: Option<(usize, CancellationToken)>,
}

impl ScriptedClassifier {
    fn new(verdicts: Vec<Result<Classification, ClassifierError>>) -> Self {
        Self {
            verdicts: Mutex::new(verdicts.into()),
            calls: AtomicUsize::new(0),
            cancel_after: None,
        }
    }

    fn cancelling_after(mut self, calls: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((calls, token));
        self
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Classifier for ScriptedClassifier {
    async fn classify(&self, _photo: &PhotoRef) -> Result<Classification, ClassifierError> {
        let calls = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((after, token)) = &self.cancel_after {
            if calls >= *after {
                token.cancel();
            }
        }
        self.verdicts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClassifierError::Network("script exhausted".to_string())))
    }
}

/// TC-AN-001: Mixed batch produces a complete, consistent result
/// **Requirement:** PSC-AN-010 | **Type:** Unit | **Priority:** P0
#[tokio::test]
async fn tc_an_001_mixed_batch_completes() {
    // Given: Four photos with mixed verdicts
    let classifier = ScriptedClassifier::new(vec![
        Ok(verdict(EmotionType::Smile, 90)),
        Ok(verdict(EmotionType::Focus, 75)),
        Ok(verdict(EmotionType::Smile, 60)),
        Ok(verdict(EmotionType::Sad, 40)),
    ]);
    let photos = vec![photo(1), photo(2), photo(3), photo(4)];

    // When: The batch is analyzed
    let outcome = analyze(photos, &classifier, |_, _| {}, &CancellationToken::new()).await;

    // Then: Total matches the batch, summaries sum to total, records sorted
    let AnalysisOutcome::Completed(result) = outcome else {
        panic!("expected a completed analysis");
    };
    assert_eq!(result.total, 4);
    let summed: usize = result.summaries.iter().map(|s| s.count).sum();
    assert_eq!(summed, result.total);
    let confidences: Vec<u8> = result.records.iter().map(|r| r.confidence).collect();
    assert_eq!(confidences, vec![90, 75, 60, 40]);
}

/// TC-AN-002: Progress fires once per photo, monotonic, in order
/// **Requirement:** PSC-AN-020 | **Type:** Unit | **Priority:** P0
#[tokio::test]
async fn tc_an_002_progress_is_monotonic() {
    // Given: Three photos, all succeeding
    let classifier = ScriptedClassifier::new(vec![
        Ok(verdict(EmotionType::Smile, 80)),
        Ok(verdict(EmotionType::Focus, 70)),
        Ok(verdict(EmotionType::Sad, 60)),
    ]);
    let photos = vec![photo(1), photo(2), photo(3)];

    // When: Progress calls are recorded
    let mut progress: Vec<(usize, usize)> = Vec::new();
    let outcome = analyze(
        photos,
        &classifier,
        |completed, total| progress.push((completed, total)),
        &CancellationToken::new(),
    )
    .await;

    // Then: Exactly one callback per photo, cumulative count 1..=3
    assert!(matches!(outcome, AnalysisOutcome::Completed(_)));
    assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
}

/// TC-AN-003: Classification failure degrades, batch continues
/// **Requirement:** PSC-AN-020 | **Type:** Unit | **Priority:** P0
#[tokio::test]
async fn tc_an_003_failure_degrades_to_unclassified() {
    // Given: The middle photo's classification fails
    let classifier = ScriptedClassifier::new(vec![
        Ok(verdict(EmotionType::Smile, 90)),
        Err(ClassifierError::Api(503, "overloaded".to_string())),
        Ok(verdict(EmotionType::Focus, 70)),
    ]);
    let photos = vec![photo(1), photo(2), photo(3)];

    // When: The batch is analyzed
    let outcome = analyze(photos, &classifier, |_, _| {}, &CancellationToken::new()).await;

    // Then: The batch completes; the failed photo is other/0
    let AnalysisOutcome::Completed(result) = outcome else {
        panic!("expected a completed analysis");
    };
    assert_eq!(result.total, 3);
    let degraded = result.records.iter().find(|r| r.id == 2).unwrap();
    assert_eq!(degraded.emotion, EmotionType::Other);
    assert_eq!(degraded.confidence, 0);
    // Remaining photos keep their real verdicts
    assert_eq!(result.records.iter().find(|r| r.id == 3).unwrap().confidence, 70);
}

/// TC-AN-004: Empty batch completes without touching the classifier
/// **Requirement:** PSC-AN-020 | **Type:** Unit | **Priority:** P0
#[tokio::test]
async fn tc_an_004_empty_batch_skips_classifier() {
    // Given: An empty batch
    let classifier = ScriptedClassifier::new(vec![]);

    // When: Analyzed with a progress recorder
    let mut progress_calls = 0;
    let outcome = analyze(
        Vec::new(),
        &classifier,
        |_, _| progress_calls += 1,
        &CancellationToken::new(),
    )
    .await;

    // Then: Empty completed result, zero classifier calls, zero callbacks
    let AnalysisOutcome::Completed(result) = outcome else {
        panic!("expected a completed analysis");
    };
    assert!(result.is_empty());
    assert_eq!(classifier.call_count(), 0);
    assert_eq!(progress_calls, 0);
}

/// TC-AN-005: Mid-batch cancellation stops work, no partial result
/// **Requirement:** PSC-AN-020 | **Type:** Unit | **Priority:** P0
#[tokio::test]
async fn tc_an_005_cancellation_stops_batch() {
    // Given: A token that flips after the second classification
    let token = CancellationToken::new();
    let classifier = ScriptedClassifier::new(vec![
        Ok(verdict(EmotionType::Smile, 90)),
        Ok(verdict(EmotionType::Focus, 80)),
        Ok(verdict(EmotionType::Sad, 70)),
        Ok(verdict(EmotionType::Smile, 60)),
    ])
    .cancelling_after(2, token.clone());
    let photos = vec![photo(1), photo(2), photo(3), photo(4)];

    // When: The batch is analyzed
    let mut progress: Vec<(usize, usize)> = Vec::new();
    let outcome = analyze(
        photos,
        &classifier,
        |completed, total| progress.push((completed, total)),
        &token,
    )
    .await;

    // Then: Cancelled with no partial data; remaining photos untouched
    assert_eq!(outcome, AnalysisOutcome::Cancelled);
    assert_eq!(classifier.call_count(), 2);
    assert_eq!(progress, vec![(1, 4), (2, 4)]);
}

/// TC-AN-006: Pre-cancelled token yields Cancelled before any call
/// **Requirement:** PSC-AN-020 | **Type:** Unit | **Priority:** P1
#[tokio::test]
async fn tc_an_006_pre_cancelled_token() {
    // Given: An already-cancelled token
    let token = CancellationToken::new();
    token.cancel();
    let classifier = ScriptedClassifier::new(vec![Ok(verdict(EmotionType::Smile, 90))]);

    // When: A non-empty batch is analyzed
    let outcome = analyze(vec![photo(1)], &classifier, |_, _| {}, &token).await;

    // Then: Cancelled, classifier never called
    assert_eq!(outcome, AnalysisOutcome::Cancelled);
    assert_eq!(classifier.call_count(), 0);
}

/// TC-AN-007: Equal confidences keep upload order in the sorted view
/// **Requirement:** PSC-AN-010 | **Type:** Unit | **Priority:** P1
#[tokio::test]
async fn tc_an_007_stable_sort_on_ties() {
    // Given: Three photos with equal confidence
    let classifier = ScriptedClassifier::new(vec![
        Ok(verdict(EmotionType::Smile, 70)),
        Ok(verdict(EmotionType::Sad, 70)),
        Ok(verdict(EmotionType::Focus, 70)),
    ]);
    let photos = vec![photo(1), photo(2), photo(3)];

    // When: The batch is analyzed
    let outcome = analyze(photos, &classifier, |_, _| {}, &CancellationToken::new()).await;

    // Then: Ties preserve ascending upload ids
    let AnalysisOutcome::Completed(result) = outcome else {
        panic!("expected a completed analysis");
    };
    let ids: Vec<u32> = result.records.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

/// TC-AN-008: A raw `other` verdict is normalized to confidence 0
/// **Requirement:** PSC-AN-010 | **Type:** Unit | **Priority:** P1
#[tokio::test]
async fn tc_an_008_other_verdict_normalized() {
    // Given: The classifier reports other with a nonzero confidence
    let classifier = ScriptedClassifier::new(vec![Ok(verdict(EmotionType::Other, 85))]);

    // When: The batch is analyzed
    let outcome = analyze(
        vec![photo(1)],
        &classifier,
        |_, _| {},
        &CancellationToken::new(),
    )
    .await;

    // Then: The stored record carries confidence 0
    let AnalysisOutcome::Completed(result) = outcome else {
        panic!("expected a completed analysis");
    };
    assert_eq!(result.records[0].emotion, EmotionType::Other);
    assert_eq!(result.records[0].confidence, 0);
}
