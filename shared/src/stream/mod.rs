//! Stream frame and topic definitions
//!
//! These types are shared between the client's streaming layer and the
//! in-memory test harness. A frame is the unit the transport moves; the
//! payload is JSON bytes parsed lazily per topic.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod payload;
pub use payload::*;

/// Frame kind on the streaming connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameKind {
    /// Register interest in a topic
    Subscribe = 0,
    /// Drop interest in a topic
    Unsubscribe = 1,
    /// Topic message
    Message = 2,
    /// Keep-alive, exchanged in both directions
    Heartbeat = 3,
}

/// Topic names exposed by the streaming endpoint.
pub mod topic {
    /// All active orders, kitchen-wide.
    pub const KITCHEN_ORDERS: &str = "kitchen-orders";
    /// Staff help-request feed.
    pub const HELP_REQUESTS: &str = "help-requests";
    /// Publish channel for bill notifications.
    pub const NOTIFY_BILL: &str = "notify-bill";

    /// Orders of a single table.
    pub fn table_orders(table_number: &str) -> String {
        format!("orders/{table_number}")
    }

    /// Session termination signal for a table.
    pub fn session_ended(table_number: &str) -> String {
        format!("session-ended/{table_number}")
    }
}

/// One unit on the streaming connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamFrame {
    pub request_id: Uuid,
    pub kind: FrameKind,
    /// Empty for heartbeats.
    pub topic: String,
    /// JSON payload bytes; empty for control frames.
    pub payload: Vec<u8>,
}

impl StreamFrame {
    pub fn new(kind: FrameKind, topic: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            kind,
            topic: topic.into(),
            payload,
        }
    }

    /// Topic message carrying a JSON payload.
    pub fn message<T: Serialize>(
        topic: impl Into<String>,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(
            FrameKind::Message,
            topic,
            serde_json::to_vec(payload)?,
        ))
    }

    /// Subscription request for a topic.
    pub fn subscribe(topic: impl Into<String>) -> Self {
        Self::new(FrameKind::Subscribe, topic, Vec::new())
    }

    /// Unsubscription request for a topic.
    pub fn unsubscribe(topic: impl Into<String>) -> Self {
        Self::new(FrameKind::Unsubscribe, topic, Vec::new())
    }

    /// Keep-alive frame.
    pub fn heartbeat() -> Self {
        Self::new(FrameKind::Heartbeat, "", Vec::new())
    }

    /// Parse the payload as the given type.
    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}
