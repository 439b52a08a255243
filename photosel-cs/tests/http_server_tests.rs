//! HTTP Server & Routing Integration Tests
//! Test File: http_server_tests.rs
//! Requirements: PSC-OV-010, PSC-API-010, PSC-WF-020

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use photosel_common::events::{EmotionType, EventBus};
use photosel_cs::models::analysis::{AnalysisResult, Classification, PhotoRef};
use photosel_cs::models::session::CurationSession;
use photosel_cs::services::{HttpClassifier, StorageClient};
use photosel_cs::{build_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

/// Create test app state with an in-memory database
///
/// Collaborator endpoints point at a closed local port; tests that would
/// hit them assert on the service's own behavior, not the collaborators'.
async fn test_app_state() -> AppState {
    let db_pool = sqlx::SqlitePool::connect(":memory:").await.unwrap();
    photosel_cs::db::init_tables(&db_pool).await.unwrap();

    let event_bus = EventBus::new(100);
    let classifier = HttpClassifier::new("http://127.0.0.1:9/classify".to_string()).unwrap();
    let storage = StorageClient::new("http://127.0.0.1:9".to_string()).unwrap();
    AppState::new(db_pool, event_bus, classifier, storage)
}

/// Insert a session already in REVIEWING (4 photos: 2 smile, 1 focus, 1 other)
async fn insert_reviewing_session(state: &AppState) -> Uuid {
    let result = AnalysisResult::build(vec![
        (
            PhotoRef("https://store.local/photos/1.jpg".to_string()),
            Classification {
                emotion: EmotionType::Smile,
                confidence: 90,
            },
        ),
        (
            PhotoRef("https://store.local/photos/2.jpg".to_string()),
            Classification {
                emotion: EmotionType::Focus,
                confidence: 75,
            },
        ),
        (
            PhotoRef("https://store.local/photos/3.jpg".to_string()),
            Classification {
                emotion: EmotionType::Smile,
                confidence: 60,
            },
        ),
        (
            PhotoRef("https://store.local/photos/4.jpg".to_string()),
            Classification {
                emotion: EmotionType::Other,
                confidence: 0,
            },
        ),
    ]);

    let mut session = CurationSession::new();
    session.begin_analysis(4).unwrap();
    session.complete_analysis(result, 6).unwrap();
    let session_id = session.session_id;
    state.sessions.write().await.insert(session_id, session);
    session_id
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// TC-HTTP-001: Health endpoint reports module identity
/// **Requirement:** PSC-OV-010 | **Type:** Integration | **Priority:** P0
#[tokio::test]
async fn tc_http_001_health_endpoint() {
    // Given: Running server
    let state = test_app_state().await;
    let app = build_router(state);

    // When: GET /health
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    // Then: 200 with module identity and zero active sessions
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["module"], "photosel-cs");
    assert_eq!(body["active_sessions"], 0);
}

/// TC-HTTP-002: Unknown session id returns 404 with an error envelope
/// **Requirement:** PSC-API-010 | **Type:** Integration | **Priority:** P0
#[tokio::test]
async fn tc_http_002_unknown_session_is_404() {
    // Given: Running server with no sessions
    let state = test_app_state().await;
    let app = build_router(state);

    // When: GET /curation/status/{random}
    let uri = format!("/curation/status/{}", Uuid::new_v4());
    let response = app
        .oneshot(Request::builder().uri(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    // Then: 404 with the standard error envelope
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

/// TC-HTTP-003: Starting with an empty batch stays IDLE with a message
/// **Requirement:** PSC-WF-020 | **Type:** Integration | **Priority:** P0
#[tokio::test]
async fn tc_http_003_empty_batch_start() {
    // Given: Running server
    let state = test_app_state().await;
    let app = build_router(state.clone());

    // When: POST /curation/start with no photos
    let response = app
        .oneshot(json_request(
            "POST",
            "/curation/start",
            json!({ "photos": [] }),
        ))
        .await
        .unwrap();

    // Then: 200 (not 202), IDLE, the "nothing to analyze" message
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["state"], "IDLE");
    assert_eq!(body["total_photos"], 0);
    assert_eq!(body["message"], "No photos to analyze");

    // Session exists but is terminal
    let session_id: Uuid = body["session_id"].as_str().unwrap().parse().unwrap();
    let sessions = state.sessions.read().await;
    assert!(sessions.get(&session_id).unwrap().is_terminal());
}

/// TC-HTTP-004: Starting with photos is accepted into ANALYZING
/// **Requirement:** PSC-WF-020 | **Type:** Integration | **Priority:** P0
#[tokio::test]
async fn tc_http_004_non_empty_batch_start() {
    // Given: Running server
    let state = test_app_state().await;
    let app = build_router(state);

    // When: POST /curation/start with two photos
    let response = app
        .oneshot(json_request(
            "POST",
            "/curation/start",
            json!({ "photos": ["https://store.local/photos/1.jpg",
                               "https://store.local/photos/2.jpg"] }),
        ))
        .await
        .unwrap();

    // Then: 202 Accepted, session in ANALYZING
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = response_json(response).await;
    assert_eq!(body["state"], "ANALYZING");
    assert_eq!(body["total_photos"], 2);
}

/// TC-HTTP-005: Review view exposes counts, records and selection
/// **Requirement:** PSC-API-010 | **Type:** Integration | **Priority:** P0
#[tokio::test]
async fn tc_http_005_review_view() {
    // Given: A session in REVIEWING
    let state = test_app_state().await;
    let session_id = insert_reviewing_session(&state).await;
    let app = build_router(state);

    // When: GET /curation/review/{id}
    let uri = format!("/curation/review/{}", session_id);
    let response = app
        .oneshot(Request::builder().uri(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    // Then: Totals, per-class counts and initial selection
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["total"], 4);
    assert_eq!(body["records"].as_array().unwrap().len(), 4);
    // other is detected but not active
    let active = body["selection"]["active_emotions"].as_array().unwrap();
    assert!(!active.iter().any(|e| e == "other"));
    assert_eq!(body["selection"]["max_extractable"], 3);
    assert_eq!(body["selection"]["extract_count"], 3);
}

/// TC-HTTP-006: Extract-count requests are clamped server-side
/// **Requirement:** PSC-API-010 | **Type:** Integration | **Priority:** P0
#[tokio::test]
async fn tc_http_006_extract_count_clamped() {
    // Given: A session in REVIEWING with 3 active-class photos
    let state = test_app_state().await;
    let session_id = insert_reviewing_session(&state).await;
    let app = build_router(state);

    // When: POST an out-of-range count
    let uri = format!("/curation/{}/extract-count", session_id);
    let response = app
        .oneshot(json_request("POST", &uri, json!({ "count": 99 })))
        .await
        .unwrap();

    // Then: Stored value is the clamped bound
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["extract_count"], 3);
}

/// TC-HTTP-007: Extraction round-trip (extract, read, choose again)
/// **Requirement:** PSC-API-010 | **Type:** Integration | **Priority:** P0
#[tokio::test]
async fn tc_http_007_extraction_round_trip() {
    // Given: A session in REVIEWING
    let state = test_app_state().await;
    let session_id = insert_reviewing_session(&state).await;
    let app = build_router(state);

    // When: POST /curation/{id}/extract
    let uri = format!("/curation/{}/extract", session_id);
    let response = app
        .clone()
        .oneshot(json_request("POST", &uri, json!({})))
        .await
        .unwrap();

    // Then: 200 with the frozen snapshot
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["state"], "EXTRACTED");
    assert_eq!(body["records"].as_array().unwrap().len(), 3);

    // And: The snapshot is readable
    let uri = format!("/curation/{}/extraction", session_id);
    let response = app
        .clone()
        .oneshot(Request::builder().uri(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // And: Choose-again returns to REVIEWING
    let uri = format!("/curation/{}/review", session_id);
    let response = app
        .oneshot(json_request("POST", &uri, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["state"], "REVIEWING");
}

/// TC-HTTP-008: Extraction with no active classes is a 400
/// **Requirement:** PSC-API-010 | **Type:** Integration | **Priority:** P0
#[tokio::test]
async fn tc_http_008_extract_without_active_classes() {
    // Given: A REVIEWING session with every class toggled off
    let state = test_app_state().await;
    let session_id = insert_reviewing_session(&state).await;
    let app = build_router(state);

    for emotion in ["smile", "focus"] {
        let uri = format!("/curation/{}/toggle", session_id);
        let response = app
            .clone()
            .oneshot(json_request("POST", &uri, json!({ "emotion": emotion })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // When: POST /curation/{id}/extract
    let uri = format!("/curation/{}/extract", session_id);
    let response = app
        .oneshot(json_request("POST", &uri, json!({})))
        .await
        .unwrap();

    // Then: 400 Bad Request, session untouched
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

/// TC-HTTP-009: Cancel outside ANALYZING is a 409 Conflict
/// **Requirement:** PSC-WF-020 | **Type:** Integration | **Priority:** P1
#[tokio::test]
async fn tc_http_009_cancel_reviewing_conflicts() {
    // Given: A session already in REVIEWING
    let state = test_app_state().await;
    let session_id = insert_reviewing_session(&state).await;
    let app = build_router(state);

    // When: POST /curation/cancel/{id}
    let uri = format!("/curation/cancel/{}", session_id);
    let response = app
        .oneshot(json_request("POST", &uri, json!({})))
        .await
        .unwrap();

    // Then: 409 Conflict
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "CONFLICT");
}

/// TC-HTTP-010: Active session list includes non-terminal sessions
/// **Requirement:** PSC-WF-020 | **Type:** Integration | **Priority:** P1
#[tokio::test]
async fn tc_http_010_active_sessions_listed() {
    // Given: One REVIEWING session
    let state = test_app_state().await;
    let session_id = insert_reviewing_session(&state).await;
    let app = build_router(state);

    // When: GET /curation/active
    let response = app
        .oneshot(
            Request::builder()
                .uri("/curation/active")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Then: The session appears with its state
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["session_id"], session_id.to_string());
    assert_eq!(entries[0]["state"], "REVIEWING");
}

/// TC-HTTP-011: SSE routes exist
/// **Requirement:** PSC-API-010 | **Type:** Integration | **Priority:** P1
#[tokio::test]
async fn tc_http_011_sse_routes_exist() {
    // Given: Running server
    let state = test_app_state().await;
    let app = build_router(state);

    // When/Then: Both event streams respond with 200 headers
    for uri in ["/events", "/curation/events"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{} should exist", uri);
    }
}

/// TC-HTTP-012: A second batch cannot start while one is analyzing
/// **Requirement:** PSC-WF-020 | **Type:** Integration | **Priority:** P1
#[tokio::test]
async fn tc_http_012_concurrent_start_conflicts() {
    // Given: A session already in ANALYZING
    let state = test_app_state().await;
    let mut session = CurationSession::new();
    session.begin_analysis(3).unwrap();
    state
        .sessions
        .write()
        .await
        .insert(session.session_id, session);
    let app = build_router(state);

    // When: POST /curation/start for a second batch
    let response = app
        .oneshot(json_request(
            "POST",
            "/curation/start",
            json!({ "photos": ["https://store.local/photos/9.jpg"] }),
        ))
        .await
        .unwrap();

    // Then: 409 Conflict
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

/// TC-HTTP-014: Simultaneous starts admit exactly one batch
/// **Requirement:** PSC-WF-020 | **Type:** Integration | **Priority:** P1
#[tokio::test]
async fn tc_http_014_simultaneous_starts_admit_one() {
    // Given: Two start requests racing against the same state
    let state = test_app_state().await;
    let app = build_router(state);
    let request = |n: u32| {
        json_request(
            "POST",
            "/curation/start",
            json!({ "photos": [format!("https://store.local/photos/{n}.jpg")] }),
        )
    };

    // When: Both are driven concurrently
    let (first, second) = tokio::join!(
        app.clone().oneshot(request(1)),
        app.clone().oneshot(request(2)),
    );
    let statuses = [first.unwrap().status(), second.unwrap().status()];

    // Then: One is accepted, the other conflicts
    assert!(statuses.contains(&StatusCode::ACCEPTED), "{:?}", statuses);
    assert!(statuses.contains(&StatusCode::CONFLICT), "{:?}", statuses);
}

/// TC-HTTP-015: Save without an extraction snapshot is a 409
/// **Requirement:** PSC-API-010 | **Type:** Integration | **Priority:** P1
#[tokio::test]
async fn tc_http_015_save_selected_without_snapshot() {
    // Given: A REVIEWING session (nothing extracted yet)
    let state = test_app_state().await;
    let session_id = insert_reviewing_session(&state).await;
    let app = build_router(state);

    // When: POST /curation/{id}/save with the default selected scope
    let uri = format!("/curation/{}/save", session_id);
    let response = app
        .oneshot(json_request("POST", &uri, json!({})))
        .await
        .unwrap();

    // Then: 409 Conflict; nothing was stored
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "CONFLICT");
}

/// TC-HTTP-016: Save on an unknown session is a 404
/// **Requirement:** PSC-API-010 | **Type:** Integration | **Priority:** P1
#[tokio::test]
async fn tc_http_016_save_unknown_session() {
    // Given: Running server with no sessions
    let state = test_app_state().await;
    let app = build_router(state);

    // When: POST /curation/{random}/save
    let uri = format!("/curation/{}/save", Uuid::new_v4());
    let response = app
        .oneshot(json_request("POST", &uri, json!({ "scope": "all" })))
        .await
        .unwrap();

    // Then: 404 Not Found
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// TC-HTTP-013: Empty upload batch is rejected
/// **Requirement:** PSC-API-010 | **Type:** Integration | **Priority:** P1
#[tokio::test]
async fn tc_http_013_empty_upload_rejected() {
    // Given: Running server
    let state = test_app_state().await;
    let app = build_router(state);

    // When: POST /photos/upload with no photos
    let response = app
        .oneshot(json_request("POST", "/photos/upload", json!({ "photos": [] })))
        .await
        .unwrap();

    // Then: 400 Bad Request
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
