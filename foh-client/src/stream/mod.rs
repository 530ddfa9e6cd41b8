//! Streaming connection lifecycle
//!
//! One persistent connection per context: a background task reads frames
//! and fans topic messages out to subscribers. On a dead link the client
//! re-dials after a fixed delay and re-establishes every registered
//! subscription; in-memory state held by consumers is never cleared by a
//! disconnect. Heartbeats flow in both directions at a fixed interval.

pub mod transport;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use shared::stream::{FrameKind, StreamFrame};
use transport::{StreamConnector, StreamTransport};

/// Link state, surfaced to the UI as the "reconnecting" indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Reconnecting,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// Streaming client with automatic reconnection.
pub struct StreamClient {
    connector: Arc<dyn StreamConnector>,
    frames_tx: broadcast::Sender<StreamFrame>,
    /// Topics to (re-)establish on every connection.
    topics: Mutex<HashSet<String>>,
    current: Mutex<Option<Arc<dyn StreamTransport>>>,
    conn_tx: watch::Sender<ConnectionState>,
    reconnect_delay: Duration,
    heartbeat_interval: Duration,
    shutdown: CancellationToken,
}

impl StreamClient {
    pub fn new(connector: Arc<dyn StreamConnector>, config: &ClientConfig) -> Arc<Self> {
        let (frames_tx, _) = broadcast::channel(1024);
        let (conn_tx, _) = watch::channel(ConnectionState::Reconnecting);
        Arc::new(Self {
            connector,
            frames_tx,
            topics: Mutex::new(HashSet::new()),
            current: Mutex::new(None),
            conn_tx,
            reconnect_delay: config.reconnect_delay,
            heartbeat_interval: config.heartbeat_interval,
            shutdown: CancellationToken::new(),
        })
    }

    /// Start the connection loop.
    pub fn start(self: &Arc<Self>) {
        let client = Arc::clone(self);
        tokio::spawn(async move { client.run().await });
    }

    /// Receive every topic message this client sees.
    pub fn frames(&self) -> broadcast::Receiver<StreamFrame> {
        self.frames_tx.subscribe()
    }

    /// Link state snapshot plus change subscription.
    pub fn connection(&self) -> watch::Receiver<ConnectionState> {
        self.conn_tx.subscribe()
    }

    /// Register a topic. The subscription survives reconnects; the write
    /// is best-effort because a fresh connection re-establishes it anyway.
    pub async fn subscribe_topic(&self, topic: &str) {
        self.topics.lock().unwrap().insert(topic.to_string());
        if let Some(t) = self.current_transport() {
            if let Err(e) = t.write_frame(&StreamFrame::subscribe(topic)).await {
                tracing::debug!(topic, "Subscribe write failed, will retry on reconnect: {e}");
            }
        }
    }

    /// Drop a topic registration.
    pub async fn unsubscribe_topic(&self, topic: &str) {
        self.topics.lock().unwrap().remove(topic);
        if let Some(t) = self.current_transport() {
            if let Err(e) = t.write_frame(&StreamFrame::unsubscribe(topic)).await {
                tracing::debug!(topic, "Unsubscribe write failed: {e}");
            }
        }
    }

    /// Publish a frame upstream (e.g. on the notify-bill channel).
    pub async fn publish(&self, frame: StreamFrame) -> ClientResult<()> {
        let transport = self
            .current_transport()
            .ok_or_else(|| ClientError::Stream("not connected".into()))?;
        transport.write_frame(&frame).await
    }

    /// Tear the connection down and stop reconnecting.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn current_transport(&self) -> Option<Arc<dyn StreamTransport>> {
        self.current.lock().unwrap().clone()
    }

    async fn run(self: Arc<Self>) {
        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            match self.connector.connect().await {
                Ok(transport) => {
                    *self.current.lock().unwrap() = Some(Arc::clone(&transport));
                    if self.resubscribe(&transport).await {
                        self.conn_tx.send_replace(ConnectionState::Connected);
                        tracing::info!("Stream connected");
                        self.pump(&transport).await;
                    }
                    *self.current.lock().unwrap() = None;
                    if self.shutdown.is_cancelled() {
                        let _ = transport.close().await;
                        break;
                    }
                    self.conn_tx.send_replace(ConnectionState::Reconnecting);
                    tracing::warn!("Stream disconnected, reconnecting");
                }
                Err(e) => {
                    self.conn_tx.send_replace(ConnectionState::Reconnecting);
                    tracing::warn!("Stream connect failed: {e}");
                }
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }
    }

    async fn resubscribe(&self, transport: &Arc<dyn StreamTransport>) -> bool {
        let topics: Vec<String> = self.topics.lock().unwrap().iter().cloned().collect();
        for topic in topics {
            if let Err(e) = transport.write_frame(&StreamFrame::subscribe(topic.as_str())).await {
                tracing::warn!(topic = %topic, "Resubscribe failed: {e}");
                return false;
            }
        }
        true
    }

    /// Drive one live connection until it dies or the client shuts down.
    async fn pump(&self, transport: &Arc<dyn StreamTransport>) {
        let mut heartbeat = tokio::time::interval(self.heartbeat_interval);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_seen = Instant::now();

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    let _ = transport.close().await;
                    return;
                }
                _ = heartbeat.tick() => {
                    if last_seen.elapsed() > self.heartbeat_interval * 3 {
                        tracing::warn!("Heartbeat window missed, dropping link");
                        return;
                    }
                    if transport.write_frame(&StreamFrame::heartbeat()).await.is_err() {
                        return;
                    }
                }
                read = transport.read_frame() => match read {
                    Ok(frame) => {
                        last_seen = Instant::now();
                        if frame.kind == FrameKind::Message {
                            if let Err(e) = self.frames_tx.send(frame) {
                                tracing::debug!("No subscribers for stream frame: {e}");
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Stream read error: {e}");
                        return;
                    }
                }
            }
        }
    }
}
