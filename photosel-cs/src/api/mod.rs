//! HTTP API handlers for photosel-cs

pub mod curation;
pub mod health;
pub mod sse;
pub mod upload;

pub use curation::curation_routes;
pub use health::health_routes;
pub use sse::{curation_event_stream, event_stream};
pub use upload::upload_routes;
