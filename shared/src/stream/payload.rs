use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{HelpRequest, Order};

/// Explicitly named event types on the stream.
///
/// Create-or-update is implicit: an order payload without an event type (or
/// with an id the receiver has not seen) means upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamEventType {
    Delete,
    SessionStarted,
    SessionEnded,
}

/// Incremental order change on an orders topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStreamEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<StreamEventType>,
    pub order: Order,
}

impl OrderStreamEvent {
    /// Create-or-update event.
    pub fn upsert(order: Order) -> Self {
        Self {
            event_type: None,
            order,
        }
    }

    /// Explicit removal event.
    pub fn delete(order: Order) -> Self {
        Self {
            event_type: Some(StreamEventType::Delete),
            order,
        }
    }

    pub fn is_delete(&self) -> bool {
        self.event_type == Some(StreamEventType::Delete)
    }
}

/// Incremental help-request change on the staff feed.
///
/// Deletions carry only the request id; upserts carry the full request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpRequestStreamEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<StreamEventType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<HelpRequest>,
}

/// Table session lifecycle signal on a `session-ended/{table}` topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStreamEvent {
    pub event_type: StreamEventType,
    pub table_number: String,
}

/// Bill request published to staff on the `notify-bill` channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillNotice {
    pub table_number: String,
    pub requested_at: DateTime<Utc>,
}
