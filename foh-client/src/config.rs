//! Client configuration

use std::time::Duration;

/// Configuration for the front-of-house sync client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL (e.g., "http://localhost:8080")
    pub base_url: String,

    /// Request timeout
    pub http_timeout: Duration,

    /// Fixed delay between stream reconnection attempts
    pub reconnect_delay: Duration,

    /// Heartbeat interval, both directions
    pub heartbeat_interval: Duration,

    /// How long a completed order stays on the active list
    pub completed_grace: Duration,

    /// Suppression window for repeated notifications of the same key
    pub notice_cooldown: Duration,

    /// Delay before re-reading storage after a cross-context login signal,
    /// so the originating context's write lands first
    pub recheck_delay: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http_timeout: Duration::from_secs(30),
            reconnect_delay: Duration::from_millis(5000),
            heartbeat_interval: Duration::from_millis(4000),
            completed_grace: Duration::from_secs(5 * 60),
            notice_cooldown: Duration::from_secs(30),
            recheck_delay: Duration::from_millis(200),
        }
    }

    /// Set the request timeout
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Set the stream reconnect delay
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set the heartbeat interval
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Set the completed-order grace period
    pub fn with_completed_grace(mut self, grace: Duration) -> Self {
        self.completed_grace = grace;
        self
    }

    /// Set the notification suppression window
    pub fn with_notice_cooldown(mut self, cooldown: Duration) -> Self {
        self.notice_cooldown = cooldown;
        self
    }

    /// Set the storage re-check delay
    pub fn with_recheck_delay(mut self, delay: Duration) -> Self {
        self.recheck_delay = delay;
        self
    }

    /// Create an HTTP client from this configuration
    pub fn build_http_client(
        &self,
    ) -> Result<crate::http::NetworkHttpClient, crate::error::ClientError> {
        crate::http::NetworkHttpClient::new(&self.base_url, self.http_timeout)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080")
    }
}
