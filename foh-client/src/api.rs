//! Typed wrappers over the REST surface
//!
//! Validation errors are rejected here, before any network call.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::error::{ClientError, ClientResult};
use crate::http::HttpClient;
use shared::client::{LoginRequest, LoginResponse};
use shared::models::{HelpRequest, MenuItem, NewHelpRequest, NewOrder, Order, OrderStatus};

/// Snapshot endpoints return either a single object or a list.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(v: OneOrMany<T>) -> Self {
        match v {
            OneOrMany::Many(list) => list,
            OneOrMany::One(one) => vec![one],
        }
    }
}

fn decode<T: DeserializeOwned>(value: serde_json::Value) -> ClientResult<T> {
    serde_json::from_value(value).map_err(ClientError::from)
}

// ==================== Auth ====================

pub async fn login(
    http: &dyn HttpClient,
    username: &str,
    password: &str,
) -> ClientResult<LoginResponse> {
    let req = LoginRequest {
        username: username.to_string(),
        password: password.to_string(),
    };
    let value = http.post("login", Some(serde_json::to_value(&req)?)).await?;
    decode(value)
}

pub async fn employee_login(
    http: &dyn HttpClient,
    username: &str,
    password: &str,
) -> ClientResult<LoginResponse> {
    let req = LoginRequest {
        username: username.to_string(),
        password: password.to_string(),
    };
    let value = http
        .post("api/employee/login", Some(serde_json::to_value(&req)?))
        .await?;
    decode(value)
}

pub async fn logout(http: &dyn HttpClient) -> ClientResult<()> {
    http.post("logout", None).await?;
    Ok(())
}

pub async fn employee_logout(http: &dyn HttpClient) -> ClientResult<()> {
    http.post("api/employee/logout", None).await?;
    Ok(())
}

// ==================== Menu ====================

pub async fn fetch_menu(http: &dyn HttpClient) -> ClientResult<Vec<MenuItem>> {
    decode(http.get("api/menu").await?)
}

/// Unauthenticated variant used by the customer-facing pages.
pub async fn fetch_public_menu(http: &dyn HttpClient) -> ClientResult<Vec<MenuItem>> {
    decode(http.get("api/menu/public").await?)
}

// ==================== Orders ====================

pub async fn place_order(http: &dyn HttpClient, order: &NewOrder) -> ClientResult<()> {
    if order.table_number.trim().is_empty() {
        return Err(ClientError::Validation("Table ID is missing".into()));
    }
    if order.items.is_empty() {
        return Err(ClientError::Validation("Your cart is empty".into()));
    }
    if let Some(item) = order.items.iter().find(|i| i.quantity == 0) {
        return Err(ClientError::Validation(format!(
            "Invalid quantity for item {}",
            item.menu_item.id
        )));
    }
    http.post("api/orders", Some(serde_json::to_value(order)?))
        .await?;
    Ok(())
}

pub async fn all_orders(http: &dyn HttpClient) -> ClientResult<Vec<Order>> {
    let value = http.get("api/orders").await?;
    Ok(decode::<OneOrMany<Order>>(value)?.into())
}

pub async fn orders_by_table(http: &dyn HttpClient, table_number: &str) -> ClientResult<Vec<Order>> {
    let value = http
        .get(&format!("api/orders/by-table/{table_number}"))
        .await?;
    Ok(decode::<OneOrMany<Order>>(value)?.into())
}

pub async fn update_order_status(
    http: &dyn HttpClient,
    id: i64,
    status: OrderStatus,
) -> ClientResult<()> {
    http.put(
        &format!("api/orders/{id}/status"),
        Some(json!({ "status": status })),
    )
    .await?;
    Ok(())
}

// ==================== Help requests ====================

pub async fn active_help_requests(http: &dyn HttpClient) -> ClientResult<Vec<HelpRequest>> {
    let value = http.get("api/help-requests/all-active-request").await?;
    Ok(decode::<OneOrMany<HelpRequest>>(value)?.into())
}

pub async fn create_help_request(
    http: &dyn HttpClient,
    request: &NewHelpRequest,
) -> ClientResult<()> {
    if request.table_number.trim().is_empty() {
        return Err(ClientError::Validation(
            "Table ID is required to request help".into(),
        ));
    }
    http.post("api/help-requests", Some(serde_json::to_value(request)?))
        .await?;
    Ok(())
}

pub async fn resolve_help_request(http: &dyn HttpClient, id: i64) -> ClientResult<()> {
    http.put(&format!("api/help-requests/{id}/resolve"), None)
        .await?;
    Ok(())
}

pub async fn delete_help_request(http: &dyn HttpClient, id: i64) -> ClientResult<()> {
    http.delete(&format!("api/help-requests/{id}")).await?;
    Ok(())
}
