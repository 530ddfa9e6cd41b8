//! Navigation targets emitted by the sync layer
//!
//! The rendering shell subscribes and performs the actual page change.

use tokio::sync::broadcast;

/// Where the shell should navigate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Entry point after logout.
    EmployeeLogin,
    /// Post-session page after a table's session ends.
    PostSession { table_number: String },
}

/// Fan-out of navigation requests.
#[derive(Debug, Clone)]
pub struct Router {
    tx: broadcast::Sender<Route>,
}

impl Router {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Route> {
        self.tx.subscribe()
    }

    /// Request navigation; ignored when no shell is attached.
    pub fn go(&self, route: Route) {
        if let Err(e) = self.tx.send(route) {
            tracing::debug!("No shell attached for navigation: {e}");
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
