//! Integration tests for the HTTP server.
//!
//! Drives the real router through axum-test; sessions are wired manually
//! via Cookie headers so multiple participants can act in one test.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::header::{COOKIE, LOCATION, SET_COOKIE};
use axum::http::{HeaderValue, StatusCode};
use axum_test::TestServer;
use governor::Quota;
use std::num::NonZeroU32;
use std::sync::Arc;
use tally::api::{create_router, AppState, JoinForm};
use tally::store::MemoryStore;
use tally_core::pulse::PulseConfig;
use tally_core::Roster;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

async fn test_state() -> AppState {
    AppState::new(Roster::new(), Arc::new(MemoryStore), PulseConfig::default()).await
}

async fn test_server() -> (TestServer, AppState) {
    let state = test_state().await;
    let server = TestServer::new(create_router(state.clone())).expect("test server");
    (server, state)
}

/// Join as `name` and return the session Cookie header value.
async fn join_as(server: &TestServer, name: &str) -> HeaderValue {
    let response = server
        .post("/join")
        .form(&JoinForm {
            name: name.to_string(),
        })
        .await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

    let set_cookie = response.header(SET_COOKIE);
    let set_cookie = set_cookie.to_str().unwrap();
    // "tally_session=<token>; Path=/; ..." -> "tally_session=<token>"
    let pair = set_cookie.split(';').next().unwrap().trim();
    HeaderValue::from_str(pair).unwrap()
}

// =============================================================================
// PAGES
// =============================================================================

#[tokio::test]
async fn test_health() {
    let (server, _state) = test_server().await;

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_index_page_has_join_form() {
    let (server, _state) = test_server().await;

    let response = server.get("/").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("/join"));
}

#[tokio::test]
async fn test_counter_redirects_without_session() {
    let (server, _state) = test_server().await;

    let response = server.get("/counter").await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(response.header(LOCATION), "/");
}

#[tokio::test]
async fn test_counter_page_shows_name() {
    let (server, _state) = test_server().await;
    let cookie = join_as(&server, "Alice").await;

    let response = server.get("/counter").add_header(COOKIE, cookie).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("Alice"));
}

#[tokio::test]
async fn test_pages_render_configured_pulse() {
    // The page script and stylesheet must agree with the server-side marker
    let config = PulseConfig::new("glow", std::time::Duration::from_millis(150));
    let state = AppState::new(Roster::new(), Arc::new(MemoryStore), config).await;
    let server = TestServer::new(create_router(state)).unwrap();
    let cookie = join_as(&server, "Alice").await;

    let response = server.get("/counter").add_header(COOKIE, cookie).await;
    let body = response.text();
    assert!(body.contains(".glow{"));
    assert!(body.contains("classList.add('glow')"));
    assert!(body.contains("150"));
    assert!(!body.contains("pulse"));
}

// =============================================================================
// JOIN
// =============================================================================

#[tokio::test]
async fn test_join_sets_session_cookie() {
    let (server, _state) = test_server().await;

    let response = server
        .post("/join")
        .form(&JoinForm {
            name: String::from("Alice"),
        })
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(response.header(LOCATION), "/counter");
    let set_cookie = response.header(SET_COOKIE);
    assert!(set_cookie.to_str().unwrap().starts_with("tally_session="));
}

#[tokio::test]
async fn test_join_blank_name_redirects_home() {
    let (server, _state) = test_server().await;

    let response = server
        .post("/join")
        .form(&JoinForm {
            name: String::from("   "),
        })
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(response.header(LOCATION), "/");
}

#[tokio::test]
async fn test_rejoin_invalidates_previous_session() {
    let (server, _state) = test_server().await;

    let old = join_as(&server, "Alice").await;
    let new = join_as(&server, "Alice").await;

    // Only the latest token is live; the stale cookie is logged out
    let response = server.post("/increment").add_header(COOKIE, old).await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = server.post("/increment").add_header(COOKIE, new).await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_rejoin_keeps_existing_count() {
    let (server, _state) = test_server().await;

    let first = join_as(&server, "Alice").await;
    let response = server.post("/increment").add_header(COOKIE, first).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    // Joining again must not reset the count
    let second = join_as(&server, "Alice").await;
    let response = server.post("/increment").add_header(COOKIE, second).await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["count"], 2);
}

// =============================================================================
// COUNT MUTATIONS
// =============================================================================

#[tokio::test]
async fn test_increment_requires_session() {
    let (server, _state) = test_server().await;

    let response = server.post("/increment").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Not logged in");
}

#[tokio::test]
async fn test_increment_and_decrement() {
    let (server, _state) = test_server().await;
    let cookie = join_as(&server, "Alice").await;

    let response = server
        .post("/increment")
        .add_header(COOKIE, cookie.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 1);

    let response = server
        .post("/increment")
        .add_header(COOKIE, cookie.clone())
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["count"], 2);

    let response = server.post("/decrement").add_header(COOKIE, cookie).await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_decrement_floors_at_zero() {
    let (server, _state) = test_server().await;
    let cookie = join_as(&server, "Alice").await;

    let response = server.post("/decrement").add_header(COOKIE, cookie).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_mutations_are_rate_limited() {
    // Joins share the budget, so allow two: one for the join, one increment
    let quota = Quota::per_hour(NonZeroU32::new(2).unwrap());
    let state = AppState::with_quota(
        Roster::new(),
        Arc::new(MemoryStore),
        PulseConfig::default(),
        quota,
    )
    .await;
    let server = TestServer::new(create_router(state)).unwrap();
    let cookie = join_as(&server, "Alice").await;

    let response = server
        .post("/increment")
        .add_header(COOKIE, cookie.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server.post("/increment").add_header(COOKIE, cookie).await;
    assert_eq!(response.status_code(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_join_is_rate_limited() {
    let quota = Quota::per_hour(NonZeroU32::new(1).unwrap());
    let state = AppState::with_quota(
        Roster::new(),
        Arc::new(MemoryStore),
        PulseConfig::default(),
        quota,
    )
    .await;
    let server = TestServer::new(create_router(state)).unwrap();

    join_as(&server, "Alice").await;

    let response = server
        .post("/join")
        .form(&JoinForm {
            name: String::from("Bob"),
        })
        .await;
    assert_eq!(response.status_code(), StatusCode::TOO_MANY_REQUESTS);
}

// =============================================================================
// PARTICIPANTS API
// =============================================================================

#[tokio::test]
async fn test_participants_sorted_by_count() {
    let (server, _state) = test_server().await;
    let alice = join_as(&server, "Alice").await;
    let bob = join_as(&server, "Bob").await;

    server.post("/increment").add_header(COOKIE, bob.clone()).await;
    server.post("/increment").add_header(COOKIE, bob).await;
    server.post("/increment").add_header(COOKIE, alice).await;

    let response = server.get("/api/participants").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let rows: serde_json::Value = response.json();

    assert_eq!(rows[0]["name"], "Bob");
    assert_eq!(rows[0]["count"], 2);
    assert_eq!(rows[1]["name"], "Alice");
    assert_eq!(rows[1]["count"], 1);
}

#[tokio::test]
async fn test_mutation_pulses_participant_marker() {
    let (server, state) = test_server().await;
    let cookie = join_as(&server, "Alice").await;

    server.post("/increment").add_header(COOKIE, cookie).await;

    // The marker is applied synchronously with the mutation; it clears on
    // its own after the configured duration
    let name = tally_core::Name::new("Alice").unwrap();
    assert!(state.pulser().is_marked(&name).await);

    let response = server.get("/api/participants").await;
    let rows: serde_json::Value = response.json();
    assert_eq!(rows[0]["classes"][0], "pulse");
}
