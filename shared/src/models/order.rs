use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::menu_item::MenuItemRef;

/// Order lifecycle status.
///
/// The backend emits these in inconsistent casing ("Completed" vs
/// "COMPLETED"); deserialization normalizes at the boundary, serialization
/// always emits SCREAMING_SNAKE_CASE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    WaitingForConfirmation,
    InProgress,
    Ready,
    Completed,
}

impl OrderStatus {
    /// Terminal states leave the active view.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed)
    }

    /// Case- and separator-insensitive parse.
    pub fn parse(s: &str) -> Option<Self> {
        let canonical: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        match canonical.as_str() {
            "WAITINGFORCONFIRMATION" => Some(Self::WaitingForConfirmation),
            "INPROGRESS" => Some(Self::InProgress),
            "READY" => Some(Self::Ready),
            "COMPLETED" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WaitingForConfirmation => write!(f, "WAITING_FOR_CONFIRMATION"),
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::Ready => write!(f, "READY"),
            Self::Completed => write!(f, "COMPLETED"),
        }
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown order status: {raw}")))
    }
}

/// One order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub menu_item: MenuItemRef,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub instructions: String,
}

fn default_quantity() -> u32 {
    1
}

/// A placed order as observed by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub table_number: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(rename = "statusOfOrder", alias = "status")]
    pub status: OrderStatus,
    /// Placement timestamp; the wire field is `time`.
    #[serde(rename = "time", alias = "placedAt")]
    pub placed_at: DateTime<Utc>,
}

/// Order submission body for `POST /api/orders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub table_number: String,
    pub items: Vec<NewOrderItem>,
}

/// Line of a submission: bare menu item reference plus quantity and note.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub menu_item: MenuItemRef,
    pub quantity: u32,
    #[serde(default)]
    pub instructions: String,
}

impl NewOrderItem {
    pub fn new(menu_item_id: i64, quantity: u32, instructions: impl Into<String>) -> Self {
        Self {
            menu_item: MenuItemRef::placeholder(menu_item_id),
            quantity,
            instructions: instructions.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_mixed_casing() {
        assert_eq!(OrderStatus::parse("COMPLETED"), Some(OrderStatus::Completed));
        assert_eq!(OrderStatus::parse("Completed"), Some(OrderStatus::Completed));
        assert_eq!(OrderStatus::parse("completed"), Some(OrderStatus::Completed));
        assert_eq!(
            OrderStatus::parse("waiting_for_confirmation"),
            Some(OrderStatus::WaitingForConfirmation)
        );
        assert_eq!(OrderStatus::parse("In_Progress"), Some(OrderStatus::InProgress));
        assert_eq!(OrderStatus::parse("CANCELLED"), None);
    }

    #[test]
    fn status_serializes_canonical() {
        let json = serde_json::to_string(&OrderStatus::WaitingForConfirmation).unwrap();
        assert_eq!(json, "\"WAITING_FOR_CONFIRMATION\"");
    }

    #[test]
    fn order_deserializes_wire_shape() {
        let json = r#"{
            "id": 42,
            "tableNumber": "12",
            "statusOfOrder": "In_Progress",
            "time": "2025-05-01T12:00:00Z",
            "items": [
                {"menuItem": {"id": 7}, "quantity": 2, "instructions": "no onions"},
                {"menuItem": {"id": 9}}
            ]
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.status, OrderStatus::InProgress);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[1].quantity, 1);
        assert!(order.items[1].menu_item.is_partial());
    }

    #[test]
    fn submission_serializes_bare_item_references() {
        let order = NewOrder {
            table_number: "3".into(),
            items: vec![NewOrderItem::new(7, 2, "")],
        };
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["items"][0]["menuItem"], serde_json::json!({"id": 7}));
    }
}
