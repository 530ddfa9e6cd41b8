//! Session synchronizer behavior across contexts sharing one store and bus.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{login_response, make_token, MockHttp};
use foh_client::storage::keys;
use foh_client::{
    ClientConfig, HttpClient, Role, Route, Router, SessionManager, SessionState, SharedStore,
    TabBus,
};
use serde_json::json;
use shared::util::now_secs;
use tokio::time::timeout;

fn manager(
    store: &SharedStore,
    bus: &TabBus,
) -> (Arc<MockHttp>, Arc<SessionManager>, Router) {
    let http = Arc::new(MockHttp::new());
    let router = Router::new();
    let mgr = SessionManager::new(
        Arc::clone(&http) as Arc<dyn HttpClient>,
        store.clone(),
        bus.clone(),
        router.clone(),
        &ClientConfig::default(),
    );
    (http, mgr, router)
}

fn stored_user(role: &str, token: &str) -> String {
    json!({
        "name": "Someone",
        "role": role,
        "email": "someone@example.com",
        "token": token
    })
    .to_string()
}

#[tokio::test]
async fn credential_slots_are_mutually_exclusive() {
    let store = SharedStore::in_memory();
    let bus = TabBus::new();
    let (http, mgr, _) = manager(&store, &bus);
    mgr.start();
    assert_eq!(mgr.state(), SessionState::Anonymous);

    let admin_token = make_token(now_secs() + 3600);
    http.route(
        "POST",
        "login",
        login_response("Boss", "ADMIN", "boss@example.com", &admin_token),
    );
    mgr.login("boss@example.com", "pw").await.unwrap();

    assert_eq!(store.get(keys::ADMIN_TOKEN).as_deref(), Some(admin_token.as_str()));
    assert!(store.get(keys::ADMIN_USER).is_some());
    assert!(store.get(keys::EMPLOYEE_TOKEN).is_none());
    assert_eq!(http.bearer().as_deref(), Some(admin_token.as_str()));
    assert_eq!(mgr.state().role(), Some(Role::Admin));

    // Employee login purges the admin slot.
    let employee_token = make_token(now_secs() + 7200);
    http.route(
        "POST",
        "api/employee/login",
        login_response("Ana", "WAITER", "ana@example.com", &employee_token),
    );
    mgr.employee_login("ana@example.com", "pw").await.unwrap();

    assert!(store.get(keys::ADMIN_TOKEN).is_none());
    assert!(store.get(keys::ADMIN_USER).is_none());
    assert_eq!(
        store.get(keys::EMPLOYEE_TOKEN).as_deref(),
        Some(employee_token.as_str())
    );
    assert!(store.get(keys::EMPLOYEE_USER).is_some());
    assert_eq!(mgr.state().role(), Some(Role::Waiter));
    assert_eq!(http.bearer().as_deref(), Some(employee_token.as_str()));

    mgr.shutdown();
}

#[tokio::test]
async fn admin_login_rejects_non_admin_role() {
    let store = SharedStore::in_memory();
    let bus = TabBus::new();
    let (http, mgr, _) = manager(&store, &bus);
    mgr.start();

    let token = make_token(now_secs() + 3600);
    http.route(
        "POST",
        "login",
        login_response("Ana", "WAITER", "ana@example.com", &token),
    );

    let err = mgr.login("ana@example.com", "pw").await.unwrap_err();
    assert!(err.to_string().contains("Unauthorized role"));
    assert!(store.get(keys::ADMIN_TOKEN).is_none());
    assert_eq!(mgr.state(), SessionState::Anonymous);

    mgr.shutdown();
}

#[tokio::test]
async fn expired_credential_never_authenticates() {
    let store = SharedStore::in_memory();
    let expired = make_token(now_secs().saturating_sub(100));
    store.set(keys::ADMIN_TOKEN, &expired).unwrap();
    store
        .set(keys::ADMIN_USER, &stored_user("ADMIN", &expired))
        .unwrap();

    let bus = TabBus::new();
    let (_, mgr, _) = manager(&store, &bus);
    mgr.start();

    assert_eq!(mgr.state(), SessionState::Anonymous);
    // The stale credential was purged, not just skipped.
    assert!(store.get(keys::ADMIN_TOKEN).is_none());
    assert!(store.get(keys::ADMIN_USER).is_none());

    mgr.shutdown();
}

#[tokio::test]
async fn malformed_admin_credential_falls_through_to_employee() {
    let store = SharedStore::in_memory();
    store.set(keys::ADMIN_TOKEN, "not-a-token").unwrap();
    store
        .set(keys::ADMIN_USER, &stored_user("ADMIN", "not-a-token"))
        .unwrap();
    let employee_token = make_token(now_secs() + 3600);
    store.set(keys::EMPLOYEE_TOKEN, &employee_token).unwrap();
    store
        .set(keys::EMPLOYEE_USER, &stored_user("KITCHEN", &employee_token))
        .unwrap();

    let bus = TabBus::new();
    let (http, mgr, _) = manager(&store, &bus);
    mgr.start();

    assert_eq!(mgr.state().role(), Some(Role::Kitchen));
    assert!(store.get(keys::ADMIN_TOKEN).is_none());
    assert_eq!(http.bearer().as_deref(), Some(employee_token.as_str()));

    mgr.shutdown();
}

#[tokio::test(start_paused = true)]
async fn login_broadcast_converges_other_contexts() {
    let store = SharedStore::in_memory();
    let bus = TabBus::new();
    let (http_a, a, _) = manager(&store, &bus);
    let (http_b, b, _) = manager(&store, &bus);
    a.start();
    b.start();
    assert_eq!(b.state(), SessionState::Anonymous);

    let token = make_token(now_secs() + 3600);
    http_a.route(
        "POST",
        "login",
        login_response("Boss", "ADMIN", "boss@example.com", &token),
    );
    a.login("boss@example.com", "pw").await.unwrap();

    // B re-reads storage after the scheduled re-check delay.
    let mut rx = b.subscribe();
    let state = timeout(
        Duration::from_secs(30),
        rx.wait_for(|s| s.is_authenticated()),
    )
    .await
    .expect("context B never converged")
    .unwrap()
    .clone();
    assert_eq!(state.role(), Some(Role::Admin));
    assert_eq!(http_b.bearer().as_deref(), Some(token.as_str()));

    a.shutdown();
    b.shutdown();
}

#[tokio::test(start_paused = true)]
async fn logout_broadcast_forces_other_contexts_anonymous() {
    let store = SharedStore::in_memory();
    let bus = TabBus::new();
    let (http_a, a, _) = manager(&store, &bus);
    let (_, b, _) = manager(&store, &bus);

    let token = make_token(now_secs() + 3600);
    http_a.route(
        "POST",
        "login",
        login_response("Boss", "ADMIN", "boss@example.com", &token),
    );
    a.start();
    a.login("boss@example.com", "pw").await.unwrap();
    b.start();
    assert_eq!(b.state().role(), Some(Role::Admin));

    // Logout endpoint is unrouted: best-effort, cleanup proceeds anyway.
    a.logout().await;

    let mut rx = b.subscribe();
    timeout(
        Duration::from_secs(30),
        rx.wait_for(|s| *s == SessionState::Anonymous),
    )
    .await
    .expect("context B kept a purged session")
    .unwrap();

    a.shutdown();
    b.shutdown();
}

#[tokio::test(start_paused = true)]
async fn logout_purges_both_slots_and_routes_to_login() {
    let store = SharedStore::in_memory();
    let bus = TabBus::new();
    let (http, mgr, router) = manager(&store, &bus);
    mgr.start();

    let token = make_token(now_secs() + 3600);
    http.route(
        "POST",
        "api/employee/login",
        login_response("Ana", "WAITER", "ana@example.com", &token),
    );
    mgr.employee_login("ana@example.com", "pw").await.unwrap();

    let mut routes = router.subscribe();
    mgr.logout().await;

    assert_eq!(mgr.state(), SessionState::Anonymous);
    assert!(store.get(keys::ADMIN_TOKEN).is_none());
    assert!(store.get(keys::ADMIN_USER).is_none());
    assert!(store.get(keys::EMPLOYEE_TOKEN).is_none());
    assert!(store.get(keys::EMPLOYEE_USER).is_none());
    assert!(http.bearer().is_none());
    assert_eq!(routes.recv().await.unwrap(), Route::EmployeeLogin);

    mgr.shutdown();
}

#[tokio::test(start_paused = true)]
async fn cleared_token_key_is_a_fallback_logout_signal() {
    let store = SharedStore::in_memory();
    let token = make_token(now_secs() + 3600);
    store.set(keys::ADMIN_TOKEN, &token).unwrap();
    store
        .set(keys::ADMIN_USER, &stored_user("ADMIN", &token))
        .unwrap();

    let bus = TabBus::new();
    let (_, mgr, _) = manager(&store, &bus);
    mgr.start();
    assert_eq!(mgr.state().role(), Some(Role::Admin));

    // Another context clears the token without a broadcast.
    store.delete(keys::ADMIN_TOKEN).unwrap();

    let mut rx = mgr.subscribe();
    timeout(
        Duration::from_secs(30),
        rx.wait_for(|s| *s == SessionState::Anonymous),
    )
    .await
    .expect("storage-change fallback did not fire")
    .unwrap();

    mgr.shutdown();
}
