//! Shared test harness: a scriptable HTTP client plus payload builders.
#![allow(dead_code)]

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use foh_client::{ClientError, ClientResult, HttpClient};
use shared::stream::{OrderStreamEvent, StreamFrame};

/// One recorded HTTP call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

enum Routed {
    Respond(Value),
    Fail(String),
}

/// Scriptable in-memory HTTP client.
///
/// Unrouted paths answer 404-shaped errors; every call is recorded.
#[derive(Default)]
pub struct MockHttp {
    routes: Mutex<HashMap<(&'static str, String), Routed>>,
    calls: Mutex<Vec<Call>>,
    bearer: RwLock<Option<String>>,
}

impl MockHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, method: &'static str, path: &str, value: Value) {
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), Routed::Respond(value));
    }

    pub fn fail(&self, method: &'static str, path: &str, message: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), Routed::Fail(message.to_string()));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &'static str, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    fn dispatch(&self, method: &'static str, path: &str, body: Option<Value>) -> ClientResult<Value> {
        self.calls.lock().unwrap().push(Call {
            method,
            path: path.to_string(),
            body,
        });
        match self.routes.lock().unwrap().get(&(method, path.to_string())) {
            Some(Routed::Respond(value)) => Ok(value.clone()),
            Some(Routed::Fail(message)) => Err(ClientError::Server(message.clone())),
            None => Err(ClientError::NotFound(path.to_string())),
        }
    }
}

#[async_trait]
impl HttpClient for MockHttp {
    async fn get(&self, path: &str) -> ClientResult<Value> {
        self.dispatch("GET", path, None)
    }

    async fn post(&self, path: &str, body: Option<Value>) -> ClientResult<Value> {
        self.dispatch("POST", path, body)
    }

    async fn put(&self, path: &str, body: Option<Value>) -> ClientResult<Value> {
        self.dispatch("PUT", path, body)
    }

    async fn delete(&self, path: &str) -> ClientResult<Value> {
        self.dispatch("DELETE", path, None)
    }

    fn set_bearer(&self, token: Option<String>) {
        *self.bearer.write().unwrap() = token;
    }

    fn bearer(&self) -> Option<String> {
        self.bearer.read().unwrap().clone()
    }
}

// ==================== Payload builders ====================

/// JWT-shaped token with the given expiry claim.
pub fn make_token(exp: u64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"u1","exp":{exp}}}"#));
    format!("{header}.{payload}.sig")
}

/// Token expiring one hour from now.
pub fn fresh_token() -> String {
    make_token(shared::util::now_secs() + 3600)
}

pub fn login_response(name: &str, role: &str, username: &str, token: &str) -> Value {
    json!({
        "accessToken": token,
        "refreshToken": "refresh",
        "user": { "name": name, "role": role, "username": username, "restaurantId": "r1" }
    })
}

/// Order wire value with one full and one bare menu item line.
pub fn order_value(id: i64, table: &str, status: &str, time: &str) -> Value {
    json!({
        "id": id,
        "tableNumber": table,
        "statusOfOrder": status,
        "time": time,
        "items": [
            {
                "menuItem": {"id": 7, "name": "Ramen", "price": 12.5, "category": "Mains", "available": true},
                "quantity": 2,
                "instructions": ""
            },
            {"menuItem": {"id": 9}, "quantity": 1}
        ]
    })
}

/// Create-or-update event frame on an orders topic.
pub fn upsert_frame(topic: &str, order: Value) -> StreamFrame {
    let event: OrderStreamEvent = serde_json::from_value(json!({ "order": order })).unwrap();
    StreamFrame::message(topic, &event).unwrap()
}

/// Explicit delete event frame.
pub fn delete_frame(topic: &str, order: Value) -> StreamFrame {
    let event: OrderStreamEvent =
        serde_json::from_value(json!({ "eventType": "DELETE", "order": order })).unwrap();
    StreamFrame::message(topic, &event).unwrap()
}

pub fn help_request_value(id: i64, table: &str, reason: &str, time: &str, urgent: bool) -> Value {
    json!({
        "id": id,
        "tableNumber": table,
        "reason": reason,
        "requestTime": time,
        "isUrgent": urgent
    })
}
