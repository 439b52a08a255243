//! # PhotoSelect Common Library
//!
//! Shared code for the PhotoSelect services including:
//! - Event types (CurationEvent enum) and EventBus
//! - Error types
//! - Configuration loading and root folder resolution
//! - SSE utilities

pub mod config;
pub mod error;
pub mod events;
pub mod sse;

pub use error::{Error, Result};
