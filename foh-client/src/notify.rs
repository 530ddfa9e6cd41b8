//! User-facing notices with keyed de-duplication
//!
//! The rendering layer subscribes and shows whatever arrives; the sync
//! layer suppresses repeats of the same key within a cooldown window so
//! that, for example, two orders completing at once each still get exactly
//! one toast.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::broadcast;

use shared::util::now_millis;

/// Notice level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A notice shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Notice fan-out with per-key suppression.
#[derive(Debug)]
pub struct Notifier {
    tx: broadcast::Sender<Notice>,
    cooldown_millis: i64,
    /// key -> suppression expiry, millis
    recent: Mutex<HashMap<String, i64>>,
}

impl Notifier {
    pub fn new(cooldown: Duration) -> Self {
        let (tx, _) = broadcast::channel(256);
        Self {
            tx,
            cooldown_millis: cooldown.as_millis() as i64,
            recent: Mutex::new(HashMap::new()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    /// Emit unconditionally.
    pub fn notify(&self, notice: Notice) {
        if let Err(e) = self.tx.send(notice) {
            tracing::debug!("No subscribers for notice: {e}");
        }
    }

    /// Emit unless the same key fired within the cooldown window.
    /// Returns whether the notice went out.
    pub fn notify_once(&self, key: &str, notice: Notice) -> bool {
        let now = now_millis();
        {
            let Ok(mut recent) = self.recent.lock() else {
                return false;
            };
            recent.retain(|_, expires| *expires > now);
            if recent.contains_key(key) {
                return false;
            }
            recent.insert(key.to_string(), now + self.cooldown_millis);
        }
        self.notify(notice);
        true
    }

    /// Clear the suppression set (subsystem teardown).
    pub fn reset(&self) {
        if let Ok(mut recent) = self.recent.lock() {
            recent.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_keys_are_suppressed_within_cooldown() {
        let notifier = Notifier::new(Duration::from_secs(30));
        let mut rx = notifier.subscribe();

        assert!(notifier.notify_once("new-1", Notice::info("New order", "Table 3")));
        assert!(!notifier.notify_once("new-1", Notice::info("New order", "Table 3")));
        // A different key is its own window.
        assert!(notifier.notify_once("new-2", Notice::info("New order", "Table 4")));

        assert_eq!(rx.try_recv().unwrap().message, "Table 3");
        assert_eq!(rx.try_recv().unwrap().message, "Table 4");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn suppression_expires_after_cooldown() {
        let notifier = Notifier::new(Duration::from_millis(10));
        assert!(notifier.notify_once("ready-7", Notice::info("Ready", "Order 7")));
        std::thread::sleep(Duration::from_millis(20));
        assert!(notifier.notify_once("ready-7", Notice::info("Ready", "Order 7")));
    }

    #[test]
    fn reset_clears_the_suppression_set() {
        let notifier = Notifier::new(Duration::from_secs(30));
        assert!(notifier.notify_once("new-1", Notice::info("New order", "")));
        notifier.reset();
        assert!(notifier.notify_once("new-1", Notice::info("New order", "")));
    }
}
