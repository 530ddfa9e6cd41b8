//! Cross-context auth broadcast
//!
//! The browser original uses two named BroadcastChannel instances; here the
//! same contract is a named-topic bus over a tokio broadcast channel.
//! Delivery reaches every context on the bus, including the publisher, so
//! handlers are idempotent. Publishing is best-effort: the storage-change
//! fallback and the next-load re-check still converge without it.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Admin auth topic.
pub const ADMIN_AUTH_CHANNEL: &str = "auth_broadcast_channel";
/// Employee auth topic.
pub const EMPLOYEE_AUTH_CHANNEL: &str = "employee_auth_channel";

/// Auth signal payload, `{"type": "..."}` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthSignal {
    Login,
    Logout,
    EmployeeLogin,
    EmployeeLogout,
}

/// A signal on a named topic.
#[derive(Debug, Clone)]
pub struct TabMessage {
    pub channel: &'static str,
    pub signal: AuthSignal,
}

/// In-process stand-in for cross-tab broadcast channels.
#[derive(Debug, Clone)]
pub struct TabBus {
    tx: broadcast::Sender<TabMessage>,
}

impl TabBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    /// Publish a signal. Returns false when no context is listening.
    pub fn publish(&self, channel: &'static str, signal: AuthSignal) -> bool {
        match self.tx.send(TabMessage { channel, signal }) {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("No subscribers for auth signal: {e}");
                false
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TabMessage> {
        self.tx.subscribe()
    }
}

impl Default for TabBus {
    fn default() -> Self {
        Self::new()
    }
}
