//! In-process kitchen feed demo
//!
//! Wires an `OrderBoard` to an in-memory stream and a canned snapshot,
//! then replays a short service: a new order arrives, goes ready, and is
//! completed by the kitchen.
//!
//! Run with: cargo run -p foh-client --example kitchen_feed

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use foh_client::stream::transport::{MemoryConnector, StreamConnector};
use foh_client::{
    ClientConfig, ClientResult, HttpClient, MenuItemCache, Notifier, OrderBoard, Router, Scope,
    StreamClient,
};
use shared::stream::{topic, StreamFrame};

/// Canned backend: one in-progress order in the snapshot, every mutation
/// accepted.
struct CannedHttp;

#[async_trait]
impl HttpClient for CannedHttp {
    async fn get(&self, path: &str) -> ClientResult<Value> {
        if path == "api/orders" {
            return Ok(json!([{
                "id": 1,
                "tableNumber": "3",
                "statusOfOrder": "IN_PROGRESS",
                "time": "2025-05-01T12:00:00Z",
                "items": [
                    {"menuItem": {"id": 7, "name": "Ramen", "price": 12.5}, "quantity": 2}
                ]
            }]));
        }
        Ok(Value::Null)
    }

    async fn post(&self, _path: &str, _body: Option<Value>) -> ClientResult<Value> {
        Ok(Value::Null)
    }

    async fn put(&self, _path: &str, _body: Option<Value>) -> ClientResult<Value> {
        Ok(Value::Null)
    }

    async fn delete(&self, _path: &str) -> ClientResult<Value> {
        Ok(Value::Null)
    }

    fn set_bearer(&self, _token: Option<String>) {}

    fn bearer(&self) -> Option<String> {
        None
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ClientConfig::default();
    let connector = Arc::new(MemoryConnector::new());
    let stream = StreamClient::new(
        Arc::clone(&connector) as Arc<dyn StreamConnector>,
        &config,
    );
    stream.start();

    let notifier = Arc::new(Notifier::new(config.notice_cooldown));
    let mut notices = notifier.subscribe();
    tokio::spawn(async move {
        while let Ok(notice) = notices.recv().await {
            println!("[{:?}] {}: {}", notice.level, notice.title, notice.message);
        }
    });

    let board = OrderBoard::new(
        Scope::Kitchen,
        Arc::new(CannedHttp),
        Arc::clone(&stream),
        Arc::new(MenuItemCache::new()),
        notifier,
        Router::new(),
        &config,
    );
    board.start().await;
    println!("snapshot: {} active order(s)", board.current_orders().len());

    // Table 5 places an order; the line item is a bare reference that the
    // menu cache backfills.
    connector.publish(
        StreamFrame::message(
            topic::KITCHEN_ORDERS,
            &json!({"order": {
                "id": 2,
                "tableNumber": "5",
                "statusOfOrder": "WAITING_FOR_CONFIRMATION",
                "time": "2025-05-01T12:02:00Z",
                "items": [{"menuItem": {"id": 7}, "quantity": 1}]
            }}),
        )
        .expect("encode event"),
    );
    tokio::time::sleep(Duration::from_millis(50)).await;

    connector.publish(
        StreamFrame::message(
            topic::KITCHEN_ORDERS,
            &json!({"order": {
                "id": 2,
                "tableNumber": "5",
                "statusOfOrder": "READY",
                "time": "2025-05-01T12:02:00Z",
                "items": [{"menuItem": {"id": 7}, "quantity": 1}]
            }}),
        )
        .expect("encode event"),
    );
    tokio::time::sleep(Duration::from_millis(50)).await;

    board.complete_order(1).await.expect("complete order");

    for order in board.current_orders() {
        let first = order
            .items
            .first()
            .and_then(|i| i.menu_item.name.clone())
            .unwrap_or_else(|| "?".into());
        println!(
            "order {} (table {}) {} - {}",
            order.id, order.table_number, order.status, first
        );
    }

    board.shutdown();
    stream.shutdown();
}
