//! Server-Sent Events endpoints
//!
//! `/events` is a heartbeat-only connection-health stream; the curation
//! stream at `/curation/events` forwards every `CurationEvent` from the
//! bus as a named SSE event with a JSON payload.

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, info, warn};

/// GET /events - Heartbeat-only SSE stream for connection monitoring
pub async fn event_stream(
    State(_state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    photosel_common::sse::create_heartbeat_sse_stream("photosel-cs")
}

/// GET /curation/events - Curation event SSE stream
///
/// Subscribes to the event bus and forwards each event. Lagged receivers
/// (bus buffer overflow) skip ahead rather than disconnecting.
pub async fn curation_event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to curation events");

    let mut rx = state.event_bus.subscribe();

    let stream = async_stream::stream! {
        // Send initial connected status
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            tokio::select! {
                result = rx.recv() => {
                    match result {
                        Ok(event) => {
                            match serde_json::to_string(&event) {
                                Ok(json) => {
                                    yield Ok(Event::default()
                                        .event(event.event_type())
                                        .data(json));
                                }
                                Err(e) => {
                                    warn!("Failed to serialize curation event: {}", e);
                                }
                            }
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("SSE client lagged, skipped {} events", skipped);
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                            info!("Event bus closed, ending SSE stream");
                            break;
                        }
                    }
                }
                _ = tokio::time::sleep(Duration::from_secs(15)) => {
                    debug!("SSE: Sending heartbeat");
                    yield Ok(Event::default().comment("heartbeat"));
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
