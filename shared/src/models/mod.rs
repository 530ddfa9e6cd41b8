//! Data model shared between REST snapshots and stream payloads.

pub mod help_request;
pub mod menu_item;
pub mod order;

pub use help_request::{HelpRequest, NewHelpRequest};
pub use menu_item::{MenuItem, MenuItemRef};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatus};
