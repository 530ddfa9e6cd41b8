//! Front-of-house sync client
//!
//! Client-side state for a QR-ordering front of house: one logical session
//! kept consistent across browser-tab-like contexts, and live order lists
//! reconciled from a snapshot fetch plus a streamed event feed.
//!
//! The rendering layer is out of scope; every stateful piece exposes a
//! current snapshot plus a subscribe-to-changes interface.

pub mod api;
pub mod config;
pub mod error;
pub mod help;
pub mod http;
pub mod notify;
pub mod orders;
pub mod route;
pub mod session;
pub mod storage;
pub mod stream;
pub mod tabbus;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::{HttpClient, NetworkHttpClient};
pub use notify::{Notice, NoticeLevel, Notifier};
pub use orders::{cache::MenuItemCache, OrderBoard, Scope};
pub use route::{Route, Router};
pub use session::{SessionManager, SessionState};
pub use storage::{KeyValueStore, SharedStore};
pub use stream::{ConnectionState, StreamClient};
pub use tabbus::{AuthSignal, TabBus};

// Re-export shared types for convenience
pub use shared::client::{Role, StoredUser};
pub use shared::models::{HelpRequest, MenuItem, Order, OrderStatus};
