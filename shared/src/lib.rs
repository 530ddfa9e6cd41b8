//! Shared types for the front-of-house sync client
//!
//! Data model and wire payloads used by the client library and its tests:
//! menu items, orders, help requests, auth DTOs and stream frames.

pub mod client;
pub mod models;
pub mod stream;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Stream re-exports (for convenient access)
pub use stream::{FrameKind, StreamFrame};
