//! Transport abstraction for the streaming connection

use async_trait::async_trait;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{broadcast, Mutex};

use crate::error::{ClientError, ClientResult};
use shared::stream::StreamFrame;

/// One live streaming connection.
///
/// `read_frame` must be cancel-safe: the client polls it inside a select
/// alongside heartbeats and shutdown.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    async fn read_frame(&self) -> ClientResult<StreamFrame>;
    async fn write_frame(&self, frame: &StreamFrame) -> ClientResult<()>;
    async fn close(&self) -> ClientResult<()>;
}

/// Produces a fresh transport per (re)connection attempt.
#[async_trait]
pub trait StreamConnector: Send + Sync {
    async fn connect(&self) -> ClientResult<Arc<dyn StreamTransport>>;
}

/// In-memory transport over broadcast channels (tests, same-process server).
pub struct MemoryTransport {
    /// Frames FROM the server side
    rx: Mutex<broadcast::Receiver<StreamFrame>>,
    /// Frames TO the server side
    tx: broadcast::Sender<StreamFrame>,
}

impl MemoryTransport {
    pub fn new(
        server_tx: &broadcast::Sender<StreamFrame>,
        client_tx: &broadcast::Sender<StreamFrame>,
    ) -> Self {
        Self {
            rx: Mutex::new(server_tx.subscribe()),
            tx: client_tx.clone(),
        }
    }
}

#[async_trait]
impl StreamTransport for MemoryTransport {
    async fn read_frame(&self) -> ClientResult<StreamFrame> {
        let mut rx = self.rx.lock().await;
        rx.recv()
            .await
            .map_err(|e| ClientError::Stream(format!("Memory channel error: {e}")))
    }

    async fn write_frame(&self, frame: &StreamFrame) -> ClientResult<()> {
        self.tx
            .send(frame.clone())
            .map_err(|e| ClientError::Stream(format!("Failed to send to server: {e}")))?;
        Ok(())
    }

    async fn close(&self) -> ClientResult<()> {
        Ok(())
    }
}

/// In-memory connector that can sever its link to exercise reconnection.
///
/// Severing replaces the server-side sender; transports dialed before the
/// cut see their channel close and the client re-dials through
/// [`StreamConnector::connect`], landing on the fresh link.
pub struct MemoryConnector {
    link: StdMutex<broadcast::Sender<StreamFrame>>,
    client_tx: broadcast::Sender<StreamFrame>,
    /// Keeps the outbound channel open even when nobody inspects it.
    _outbound_keepalive: broadcast::Receiver<StreamFrame>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        let (link, _) = broadcast::channel(256);
        let (client_tx, keepalive) = broadcast::channel(256);
        Self {
            link: StdMutex::new(link),
            client_tx,
            _outbound_keepalive: keepalive,
        }
    }

    /// Publish a frame to the connected client, if any.
    pub fn publish(&self, frame: StreamFrame) {
        if let Ok(link) = self.link.lock() {
            let _ = link.send(frame);
        }
    }

    /// Frames the client wrote: subscriptions, heartbeats, publishes.
    pub fn outbound(&self) -> broadcast::Receiver<StreamFrame> {
        self.client_tx.subscribe()
    }

    /// Drop the current link, forcing the client into its reconnect path.
    pub fn sever(&self) {
        if let Ok(mut link) = self.link.lock() {
            let (fresh, _) = broadcast::channel(256);
            *link = fresh;
        }
    }
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StreamConnector for MemoryConnector {
    async fn connect(&self) -> ClientResult<Arc<dyn StreamTransport>> {
        let link = self
            .link
            .lock()
            .map_err(|_| ClientError::Stream("connector lock poisoned".into()))?;
        Ok(Arc::new(MemoryTransport::new(&link, &self.client_tx)))
    }
}
