//! Session broadcast synchronizer
//!
//! Keeps one logical "current user" consistent across every context that
//! shares the same store and bus, and recovers a valid session on load.
//! Storage is the source of truth; broadcast signals only wake a context
//! up to re-read it, and storage-change events are the fallback when a
//! broadcast is missed.

pub mod token;

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use crate::api;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::http::HttpClient;
use crate::route::{Route, Router};
use crate::storage::{keys, SharedStore, StorageEvent};
use crate::tabbus::{
    AuthSignal, TabBus, TabMessage, ADMIN_AUTH_CHANNEL, EMPLOYEE_AUTH_CHANNEL,
};
use shared::client::{Role, StoredUser};
use shared::util::now_secs;

/// Session state of this context.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Uninitialized,
    Loading,
    Authenticated(StoredUser),
    Anonymous,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn user(&self) -> Option<&StoredUser> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.user().map(|u| u.role)
    }
}

/// Session synchronizer for one context.
pub struct SessionManager {
    http: Arc<dyn HttpClient>,
    store: SharedStore,
    bus: TabBus,
    router: Router,
    state_tx: watch::Sender<SessionState>,
    recheck_delay: Duration,
    shutdown: CancellationToken,
}

impl SessionManager {
    pub fn new(
        http: Arc<dyn HttpClient>,
        store: SharedStore,
        bus: TabBus,
        router: Router,
        config: &ClientConfig,
    ) -> Arc<Self> {
        let (state_tx, _) = watch::channel(SessionState::Uninitialized);
        Arc::new(Self {
            http,
            store,
            bus,
            router,
            state_tx,
            recheck_delay: config.recheck_delay,
            shutdown: CancellationToken::new(),
        })
    }

    /// Recover any persisted session and start the cross-context listeners.
    pub fn start(self: &Arc<Self>) {
        self.initialize();
        self.spawn_bus_listener();
        self.spawn_storage_listener();
    }

    /// Current state snapshot.
    pub fn state(&self) -> SessionState {
        self.state_tx.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Tear down the listeners, symmetric with [`SessionManager::start`].
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    // ==================== Initialization ====================

    /// Re-derive the session from storage.
    ///
    /// The admin slot wins when both hold a usable credential; a malformed
    /// or expired credential is purged and treated as absent.
    fn initialize(&self) {
        self.state_tx.send_replace(SessionState::Loading);
        let now = now_secs();

        if let Some(user) = self.read_slot(keys::ADMIN_TOKEN, keys::ADMIN_USER, now) {
            self.http.set_bearer(Some(user.token.clone()));
            self.state_tx.send_replace(SessionState::Authenticated(user));
            return;
        }

        if let Some(user) = self.read_slot(keys::EMPLOYEE_TOKEN, keys::EMPLOYEE_USER, now) {
            self.http.set_bearer(Some(user.token.clone()));
            self.state_tx.send_replace(SessionState::Authenticated(user));
            return;
        }

        self.http.set_bearer(None);
        self.state_tx.send_replace(SessionState::Anonymous);
    }

    fn read_slot(&self, token_key: &str, user_key: &str, now: u64) -> Option<StoredUser> {
        let stored_token = self.store.get(token_key)?;
        let raw_user = self.store.get(user_key)?;

        match serde_json::from_str::<StoredUser>(&raw_user) {
            Ok(mut user) if token::is_valid(&stored_token, now) => {
                // The token key is authoritative over the copy inside
                // the user record.
                user.token = stored_token;
                Some(user)
            }
            _ => {
                self.purge_slot(token_key, user_key);
                None
            }
        }
    }

    fn purge_slot(&self, token_key: &str, user_key: &str) {
        if let Err(e) = self.store.delete(token_key) {
            tracing::warn!(key = token_key, "Failed to purge credential: {e}");
        }
        if let Err(e) = self.store.delete(user_key) {
            tracing::warn!(key = user_key, "Failed to purge credential: {e}");
        }
    }

    fn persist_slot(&self, token_key: &str, user_key: &str, user: &StoredUser) {
        let raw = match serde_json::to_string(user) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Failed to encode session: {e}");
                return;
            }
        };
        if let Err(e) = self.store.set(token_key, &user.token) {
            tracing::warn!(key = token_key, "Failed to persist credential: {e}");
        }
        if let Err(e) = self.store.set(user_key, &raw) {
            tracing::warn!(key = user_key, "Failed to persist credential: {e}");
        }
    }

    // ==================== Login / logout ====================

    /// Admin login. Rejects non-admin accounts: this path is admin-only.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<StoredUser> {
        let resp = api::login(self.http.as_ref(), username, password).await?;
        if resp.user.role != Role::Admin {
            return Err(ClientError::Auth("Unauthorized role".into()));
        }

        // The two credential slots are mutually exclusive.
        self.purge_slot(keys::EMPLOYEE_TOKEN, keys::EMPLOYEE_USER);

        let user = StoredUser::from_login(&resp);
        self.persist_slot(keys::ADMIN_TOKEN, keys::ADMIN_USER, &user);
        self.http.set_bearer(Some(user.token.clone()));
        self.state_tx
            .send_replace(SessionState::Authenticated(user.clone()));
        self.bus.publish(ADMIN_AUTH_CHANNEL, AuthSignal::Login);

        tracing::debug!(username, "Admin logged in");
        Ok(user)
    }

    /// Employee login. Any employee role is accepted.
    pub async fn employee_login(&self, username: &str, password: &str) -> ClientResult<StoredUser> {
        let resp = api::employee_login(self.http.as_ref(), username, password).await?;

        self.purge_slot(keys::ADMIN_TOKEN, keys::ADMIN_USER);

        let user = StoredUser::from_login(&resp);
        self.persist_slot(keys::EMPLOYEE_TOKEN, keys::EMPLOYEE_USER, &user);
        self.http.set_bearer(Some(user.token.clone()));
        self.state_tx
            .send_replace(SessionState::Authenticated(user.clone()));
        self.bus
            .publish(EMPLOYEE_AUTH_CHANNEL, AuthSignal::EmployeeLogin);

        tracing::debug!(username, "Employee logged in");
        Ok(user)
    }

    /// Logout. Server calls and broadcasts are best-effort; local cleanup
    /// always completes and the state always ends definite.
    pub async fn logout(&self) {
        let result = match self.state().role() {
            Some(Role::Admin) => api::logout(self.http.as_ref()).await,
            _ => api::employee_logout(self.http.as_ref()).await,
        };
        if let Err(e) = result {
            tracing::debug!("Logout endpoint failed: {e}");
        }

        // Both slots: a context could hold stale data in each.
        self.purge_slot(keys::ADMIN_TOKEN, keys::ADMIN_USER);
        self.purge_slot(keys::EMPLOYEE_TOKEN, keys::EMPLOYEE_USER);
        self.http.set_bearer(None);
        self.state_tx.send_replace(SessionState::Anonymous);

        self.bus.publish(ADMIN_AUTH_CHANNEL, AuthSignal::Logout);
        self.bus
            .publish(EMPLOYEE_AUTH_CHANNEL, AuthSignal::EmployeeLogout);

        self.router.go(Route::EmployeeLogin);
    }

    // ==================== Cross-context listeners ====================

    fn spawn_bus_listener(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let mut rx = self.bus.subscribe();
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(msg) => {
                            let Some(mgr) = weak.upgrade() else { break };
                            mgr.handle_signal(msg).await;
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(skipped = n, "Auth bus lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        });
    }

    fn spawn_storage_listener(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let mut rx = self.store.subscribe();
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    ev = rx.recv() => match ev {
                        Ok(ev) => {
                            let Some(mgr) = weak.upgrade() else { break };
                            mgr.handle_storage(ev).await;
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(skipped = n, "Storage events lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        });
    }

    async fn handle_signal(&self, msg: TabMessage) {
        match (msg.channel, msg.signal) {
            (ADMIN_AUTH_CHANNEL, AuthSignal::Logout) => {
                self.purge_slot(keys::ADMIN_TOKEN, keys::ADMIN_USER);
                self.initialize();
            }
            (EMPLOYEE_AUTH_CHANNEL, AuthSignal::EmployeeLogout) => {
                self.purge_slot(keys::EMPLOYEE_TOKEN, keys::EMPLOYEE_USER);
                self.initialize();
            }
            (_, AuthSignal::Login | AuthSignal::EmployeeLogin) => {
                // Do not trust the message payload; wait for the writer's
                // storage write to land, then re-read storage.
                self.recheck_later().await;
            }
            _ => {}
        }
    }

    /// Secondary consistency signal: a cleared token key with no
    /// replacement forces a re-derivation for the matching role.
    async fn handle_storage(&self, ev: StorageEvent) {
        if ev.new_value.is_some() {
            return;
        }
        let role = self.state().role();
        let affected = match ev.key.as_str() {
            keys::ADMIN_TOKEN => role == Some(Role::Admin),
            keys::EMPLOYEE_TOKEN => role.is_some_and(|r| r.is_employee()),
            _ => false,
        };
        if affected {
            self.recheck_later().await;
        }
    }

    async fn recheck_later(&self) {
        tokio::select! {
            _ = self.shutdown.cancelled() => {}
            _ = tokio::time::sleep(self.recheck_delay) => self.initialize(),
        }
    }
}
