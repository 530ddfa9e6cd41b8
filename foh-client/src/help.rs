//! Help requests
//!
//! Customer side: create a request for a table, with the "Need bill"
//! reason additionally published to staff on the notify-bill channel.
//! Staff side: a live feed fed the same way as the order board, plus the
//! resolve-then-delete completion sequence.

use std::sync::{Arc, Mutex, Weak};

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use crate::api;
use crate::error::ClientResult;
use crate::http::HttpClient;
use crate::notify::{Notice, Notifier};
use crate::stream::StreamClient;
use shared::models::{HelpRequest, NewHelpRequest};
use shared::stream::{topic, BillNotice, HelpRequestStreamEvent, StreamFrame};

/// Reason that additionally notifies staff to bring the bill.
pub const NEED_BILL: &str = "Need bill";

/// Send a help request for a table.
///
/// A "Need bill" reason also publishes a [`BillNotice`] to staff; that
/// publish is best-effort, the request itself is the operation.
pub async fn request_help(
    http: &dyn HttpClient,
    stream: &StreamClient,
    table_number: &str,
    reason: &str,
) -> ClientResult<()> {
    let request = NewHelpRequest {
        table_number: table_number.to_string(),
        reason: Some(reason.to_string()),
    };
    api::create_help_request(http, &request).await?;

    if reason == NEED_BILL {
        let notice = BillNotice {
            table_number: table_number.to_string(),
            requested_at: chrono::Utc::now(),
        };
        match StreamFrame::message(topic::NOTIFY_BILL, &notice) {
            Ok(frame) => {
                if let Err(e) = stream.publish(frame).await {
                    tracing::warn!("Bill notification publish failed: {e}");
                }
            }
            Err(e) => tracing::warn!("Failed to encode bill notification: {e}"),
        }
    }

    Ok(())
}

#[derive(Default)]
struct FeedState {
    requests: Vec<HelpRequest>,
    initialized: bool,
    pending: Vec<HelpRequestStreamEvent>,
}

/// Staff-side live help-request feed.
pub struct HelpFeed {
    http: Arc<dyn HttpClient>,
    stream: Arc<StreamClient>,
    notifier: Arc<Notifier>,
    state: Mutex<FeedState>,
    requests_tx: watch::Sender<Vec<HelpRequest>>,
    shutdown: CancellationToken,
}

impl HelpFeed {
    pub fn new(
        http: Arc<dyn HttpClient>,
        stream: Arc<StreamClient>,
        notifier: Arc<Notifier>,
    ) -> Arc<Self> {
        let (requests_tx, _) = watch::channel(Vec::new());
        Arc::new(Self {
            http,
            stream,
            notifier,
            state: Mutex::new(FeedState::default()),
            requests_tx,
            shutdown: CancellationToken::new(),
        })
    }

    /// Subscribe the feed topic, start consuming events, load the snapshot.
    pub async fn start(self: &Arc<Self>) {
        self.spawn_event_loop();
        self.stream.subscribe_topic(topic::HELP_REQUESTS).await;
        self.load_snapshot().await;
    }

    pub fn requests(&self) -> watch::Receiver<Vec<HelpRequest>> {
        self.requests_tx.subscribe()
    }

    /// Resolve then delete: the two-step completion sequence.
    pub async fn resolve(&self, id: i64) -> ClientResult<()> {
        api::resolve_help_request(self.http.as_ref(), id).await?;
        api::delete_help_request(self.http.as_ref(), id).await?;

        let mut st = self.state.lock().unwrap();
        st.requests.retain(|r| r.id != id);
        self.publish_locked(&st);
        Ok(())
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
        let stream = Arc::clone(&self.stream);
        tokio::spawn(async move {
            stream.unsubscribe_topic(topic::HELP_REQUESTS).await;
        });
    }

    async fn load_snapshot(&self) {
        match api::active_help_requests(self.http.as_ref()).await {
            Ok(requests) => {
                let mut st = self.state.lock().unwrap();
                st.requests = requests;
                st.initialized = true;
                let pending: Vec<HelpRequestStreamEvent> = st.pending.drain(..).collect();
                for event in pending {
                    self.apply_event(&mut st, event);
                }
                self.publish_locked(&st);
            }
            Err(e) => {
                tracing::warn!("Failed to load help requests: {e}");
                self.notifier.notify_once(
                    &format!("help-load-{}", e.class()),
                    Notice::warning("Help requests", "Failed to load help requests"),
                );
            }
        }
    }

    fn spawn_event_loop(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let mut frames = self.stream.frames();
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    frame = frames.recv() => match frame {
                        Ok(frame) if frame.topic == topic::HELP_REQUESTS => {
                            let Some(feed) = weak.upgrade() else { break };
                            match frame.parse_payload::<HelpRequestStreamEvent>() {
                                Ok(event) => feed.ingest(event),
                                Err(e) => tracing::warn!("Bad help request payload: {e}"),
                            }
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(skipped = n, "Help feed lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        });
    }

    fn ingest(&self, event: HelpRequestStreamEvent) {
        let mut st = self.state.lock().unwrap();
        if !st.initialized {
            st.pending.push(event);
            return;
        }
        self.apply_event(&mut st, event);
        self.publish_locked(&st);
    }

    fn apply_event(&self, st: &mut FeedState, event: HelpRequestStreamEvent) {
        if event.event_type.is_some_and(|t| t == shared::stream::StreamEventType::Delete) {
            if let Some(id) = event.request_id.or(event.request.as_ref().map(|r| r.id)) {
                st.requests.retain(|r| r.id != id);
            }
            return;
        }

        let Some(request) = event.request else {
            return;
        };
        match st.requests.iter().position(|r| r.id == request.id) {
            Some(i) => st.requests[i] = request,
            None => {
                self.notifier.notify_once(
                    &format!("help-{}", request.id),
                    Notice::info(
                        "Help requested",
                        format!("Table #{}", request.table_number),
                    ),
                );
                st.requests.push(request);
            }
        }
    }

    fn publish_locked(&self, st: &FeedState) {
        // Urgent first, then oldest first.
        let mut requests = st.requests.clone();
        requests.sort_by(|a, b| {
            b.urgent
                .cmp(&a.urgent)
                .then(a.request_time.cmp(&b.request_time))
        });
        self.requests_tx.send_replace(requests);
    }
}
