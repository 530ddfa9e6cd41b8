//! Live order reconciler
//!
//! One authoritative snapshot fetch plus an unbounded event stream yield an
//! ordered, deduplicated view of active orders for a scope. Events that
//! arrive before the first snapshot completes are buffered and applied once
//! it lands, so nothing is dropped or duplicated by the race. Disconnects
//! never clear the list; it heals through later snapshots and events.

pub mod cache;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api;
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::http::HttpClient;
use crate::notify::{Notice, Notifier};
use crate::route::{Route, Router};
use crate::stream::StreamClient;
use cache::MenuItemCache;
use shared::models::{Order, OrderStatus};
use shared::stream::{topic, OrderStreamEvent, SessionStreamEvent, StreamEventType};

/// The subset of orders a board tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// One table's orders.
    Table(String),
    /// All active orders, kitchen-wide.
    Kitchen,
}

impl Scope {
    pub fn table(table_number: impl Into<String>) -> Self {
        Scope::Table(table_number.into())
    }

    pub fn is_kitchen(&self) -> bool {
        matches!(self, Scope::Kitchen)
    }

    pub fn orders_topic(&self) -> String {
        match self {
            Scope::Table(t) => topic::table_orders(t),
            Scope::Kitchen => topic::KITCHEN_ORDERS.to_string(),
        }
    }

    pub fn session_topic(&self) -> Option<String> {
        match self {
            Scope::Table(t) => Some(topic::session_ended(t)),
            Scope::Kitchen => None,
        }
    }
}

/// Board entry: server state plus any optimistic status override.
///
/// The override is merged over the server state until the next
/// authoritative event or snapshot supersedes it.
#[derive(Debug)]
struct BoardEntry {
    server: Order,
    local_status: Option<OrderStatus>,
}

impl BoardEntry {
    fn id(&self) -> i64 {
        self.server.id
    }

    fn merged(&self) -> Order {
        let mut order = self.server.clone();
        if let Some(status) = self.local_status {
            order.status = status;
        }
        order
    }
}

#[derive(Default)]
struct BoardState {
    entries: Vec<BoardEntry>,
    /// Set once the first snapshot lands; events buffer until then.
    initialized: bool,
    pending: Vec<OrderStreamEvent>,
    /// Every order id ever observed, for brand-new detection.
    seen: HashSet<i64>,
    /// Pending delayed removals of completed orders, by order id.
    removals: HashMap<i64, JoinHandle<()>>,
    session_active: bool,
}

/// Live order view for one scope.
pub struct OrderBoard {
    scope: Scope,
    http: Arc<dyn HttpClient>,
    stream: Arc<StreamClient>,
    cache: Arc<MenuItemCache>,
    notifier: Arc<Notifier>,
    router: Router,
    state: Mutex<BoardState>,
    orders_tx: watch::Sender<Vec<Order>>,
    grace: Duration,
    shutdown: CancellationToken,
}

impl OrderBoard {
    pub fn new(
        scope: Scope,
        http: Arc<dyn HttpClient>,
        stream: Arc<StreamClient>,
        cache: Arc<MenuItemCache>,
        notifier: Arc<Notifier>,
        router: Router,
        config: &ClientConfig,
    ) -> Arc<Self> {
        let (orders_tx, _) = watch::channel(Vec::new());
        Arc::new(Self {
            scope,
            http,
            stream,
            cache,
            notifier,
            router,
            state: Mutex::new(BoardState {
                session_active: true,
                ..BoardState::default()
            }),
            orders_tx,
            grace: config.completed_grace,
            shutdown: CancellationToken::new(),
        })
    }

    /// Subscribe the scope's topics, start consuming events and load the
    /// initial snapshot. Subscribing first means a pre-snapshot event is
    /// buffered rather than lost.
    pub async fn start(self: &Arc<Self>) {
        self.spawn_event_loop();
        self.stream.subscribe_topic(&self.scope.orders_topic()).await;
        if let Some(session_topic) = self.scope.session_topic() {
            self.stream.subscribe_topic(&session_topic).await;
        }
        self.load_snapshot().await;
    }

    /// Current list snapshot plus change subscription.
    pub fn orders(&self) -> watch::Receiver<Vec<Order>> {
        self.orders_tx.subscribe()
    }

    pub fn current_orders(&self) -> Vec<Order> {
        self.orders_tx.borrow().clone()
    }

    /// False once the table's session ended.
    pub fn session_active(&self) -> bool {
        self.state.lock().unwrap().session_active
    }

    /// Fetch the authoritative snapshot for the scope.
    ///
    /// On failure the existing list is left untouched and a de-duplicated
    /// warning goes out; a later call can still initialize the board.
    pub async fn load_snapshot(&self) {
        let result = match &self.scope {
            Scope::Kitchen => api::all_orders(self.http.as_ref()).await,
            Scope::Table(t) => api::orders_by_table(self.http.as_ref(), t).await,
        };

        let mut orders = match result {
            Ok(orders) => orders,
            Err(e) => {
                tracing::warn!("Failed to load orders snapshot: {e}");
                self.notifier.notify_once(
                    &format!("orders-load-{}", e.class()),
                    Notice::warning("Orders", "Failed to load orders"),
                );
                return;
            }
        };

        if self.shutdown.is_cancelled() {
            return;
        }

        for order in &mut orders {
            self.cache.enrich_order(order);
        }

        let mut st = self.state.lock().unwrap();
        // The snapshot is authoritative: it supersedes optimistic
        // overrides and their pending removals.
        for (_, handle) in st.removals.drain() {
            handle.abort();
        }
        for order in &orders {
            st.seen.insert(order.id);
        }
        st.entries = orders
            .into_iter()
            .filter(|o| !o.status.is_terminal())
            .map(|server| BoardEntry {
                server,
                local_status: None,
            })
            .collect();
        st.entries
            .sort_by(|a, b| b.server.placed_at.cmp(&a.server.placed_at));
        st.initialized = true;

        let pending: Vec<OrderStreamEvent> = st.pending.drain(..).collect();
        for event in pending {
            self.apply_event(&mut st, event);
        }
        self.publish_locked(&st);
    }

    /// Manual refresh: drop the menu cache, then refetch.
    pub async fn refresh(&self) {
        self.cache.clear();
        self.load_snapshot().await;
    }

    /// Mark an order completed: optimistic local overwrite on success plus
    /// a delayed removal so staff still sees the entry briefly. A repeat
    /// call replaces the pending removal, never duplicates it.
    pub async fn complete_order(self: &Arc<Self>, id: i64) -> ClientResult<()> {
        match api::update_order_status(self.http.as_ref(), id, OrderStatus::Completed).await {
            Ok(()) => {
                let mut st = self.state.lock().unwrap();
                let known = match st.entries.iter_mut().find(|e| e.id() == id) {
                    Some(entry) => {
                        entry.local_status = Some(OrderStatus::Completed);
                        true
                    }
                    None => false,
                };
                if known {
                    self.publish_locked(&st);
                    self.schedule_removal(&mut st, id);
                }
                drop(st);
                self.notifier.notify_once(
                    &format!("complete-{id}"),
                    Notice::info("Order", format!("Order {id} completed")),
                );
                Ok(())
            }
            Err(e) => {
                // No rollback needed: nothing was applied locally.
                self.notifier
                    .notify(Notice::error("Order", "Failed to complete order"));
                Err(e)
            }
        }
    }

    /// Cancel the listeners and every pending removal timer.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        let mut st = self.state.lock().unwrap();
        for (_, handle) in st.removals.drain() {
            handle.abort();
        }
        drop(st);
        self.notifier.reset();

        let stream = Arc::clone(&self.stream);
        let orders_topic = self.scope.orders_topic();
        let session_topic = self.scope.session_topic();
        tokio::spawn(async move {
            stream.unsubscribe_topic(&orders_topic).await;
            if let Some(t) = session_topic {
                stream.unsubscribe_topic(&t).await;
            }
        });
    }

    // ==================== Event intake ====================

    fn spawn_event_loop(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let mut frames = self.stream.frames();
        let shutdown = self.shutdown.clone();
        let orders_topic = self.scope.orders_topic();
        let session_topic = self.scope.session_topic();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    frame = frames.recv() => match frame {
                        Ok(frame) => {
                            let Some(board) = weak.upgrade() else { break };
                            if frame.topic == orders_topic {
                                match frame.parse_payload::<OrderStreamEvent>() {
                                    Ok(event) => board.ingest(event),
                                    Err(e) => tracing::warn!("Bad order event payload: {e}"),
                                }
                            } else if session_topic.as_deref() == Some(frame.topic.as_str()) {
                                match frame.parse_payload::<SessionStreamEvent>() {
                                    Ok(event) => board.handle_session_event(event),
                                    Err(e) => tracing::warn!("Bad session event payload: {e}"),
                                }
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(skipped = n, "Order feed lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        });
    }

    fn ingest(&self, event: OrderStreamEvent) {
        let mut st = self.state.lock().unwrap();
        if !st.initialized {
            st.pending.push(event);
            return;
        }
        self.apply_event(&mut st, event);
        self.publish_locked(&st);
    }

    /// Reconcile one event, atomically with respect to the list.
    fn apply_event(&self, st: &mut BoardState, event: OrderStreamEvent) {
        let is_delete = event.is_delete();
        let mut order = event.order;
        self.cache.enrich_order(&mut order);
        let id = order.id;

        // An authoritative event supersedes any optimistic override and
        // its pending removal.
        if let Some(handle) = st.removals.remove(&id) {
            handle.abort();
        }

        let prev_status = st
            .entries
            .iter()
            .find(|e| e.id() == id)
            .map(|e| e.server.status);
        st.entries.retain(|e| e.id() != id);

        let brand_new = st.seen.insert(id);

        if is_delete || order.status.is_terminal() {
            // Net effect: removal.
            return;
        }

        if brand_new && self.scope.is_kitchen() {
            self.notifier.notify_once(
                &format!("new-{id}"),
                Notice::info("New order", format!("Table #{}", order.table_number)),
            );
        }
        if order.status == OrderStatus::Ready && prev_status.is_some_and(|s| s != OrderStatus::Ready)
        {
            self.notifier.notify_once(
                &format!("ready-{id}"),
                Notice::info("Order ready", format!("Table #{}", order.table_number)),
            );
        }

        st.entries.push(BoardEntry {
            server: order,
            local_status: None,
        });
        st.entries
            .sort_by(|a, b| b.server.placed_at.cmp(&a.server.placed_at));
    }

    fn handle_session_event(&self, event: SessionStreamEvent) {
        if event.event_type != StreamEventType::SessionEnded {
            return;
        }
        self.state.lock().unwrap().session_active = false;
        if let Scope::Table(t) = &self.scope {
            tracing::info!(table = %t, "Table session ended");
            self.router.go(Route::PostSession {
                table_number: t.clone(),
            });
        }
    }

    fn schedule_removal(self: &Arc<Self>, st: &mut BoardState, id: i64) {
        if let Some(previous) = st.removals.remove(&id) {
            previous.abort();
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        let shutdown = self.shutdown.clone();
        let grace = self.grace;
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = tokio::time::sleep(grace) => {
                    if let Some(board) = weak.upgrade() {
                        let mut st = board.state.lock().unwrap();
                        st.removals.remove(&id);
                        st.entries.retain(|e| e.id() != id);
                        board.publish_locked(&st);
                    }
                }
            }
        });
        st.removals.insert(id, handle);
    }

    fn publish_locked(&self, st: &BoardState) {
        self.orders_tx
            .send_replace(st.entries.iter().map(BoardEntry::merged).collect());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_topics() {
        assert_eq!(Scope::table("12").orders_topic(), "orders/12");
        assert_eq!(
            Scope::table("12").session_topic().as_deref(),
            Some("session-ended/12")
        );
        assert_eq!(Scope::Kitchen.orders_topic(), "kitchen-orders");
        assert!(Scope::Kitchen.session_topic().is_none());
        assert!(Scope::Kitchen.is_kitchen());
    }
}
