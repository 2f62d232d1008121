//! # Sessions
//!
//! Cookie-backed sessions for the HTML pages and the mutation API.
//!
//! A session is a random 24-byte token, handed out as a URL-safe base64
//! cookie and mapped server-side to a participant name. Token comparison is
//! constant-time so lookups leak nothing about stored tokens.
//!
//! One live token per participant: re-joining under the same name replaces
//! the previous token, so the table is bounded by the roster size and the
//! per-request scan stays proportional to the number of participants.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use std::collections::BTreeMap;
use subtle::ConstantTimeEq;
use tally_core::Name;
use tokio::sync::RwLock;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "tally_session";

/// Number of random bytes behind each token.
const TOKEN_BYTES: usize = 24;

/// Server-side session table: participant name -> live token.
#[derive(Debug, Default)]
pub struct SessionStore {
    tokens: RwLock<BTreeMap<Name, String>>,
}

impl SessionStore {
    /// Create an empty session store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh session token for a participant.
    ///
    /// Any previous token for the same name stops resolving, so the table
    /// holds at most one entry per participant.
    pub async fn issue(&self, name: Name) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = URL_SAFE_NO_PAD.encode(bytes);

        self.tokens.write().await.insert(name, token.clone());
        token
    }

    /// Resolve a presented token to a participant name.
    ///
    /// Comparison is constant-time per stored token.
    pub async fn resolve(&self, presented: &str) -> Option<Name> {
        let tokens = self.tokens.read().await;
        tokens
            .iter()
            .find(|(_, stored)| constant_time_str_eq(stored, presented))
            .map(|(name, _)| name.clone())
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }
}

fn constant_time_str_eq(a: &str, b: &str) -> bool {
    a.len() == b.len() && bool::from(a.as_bytes().ct_eq(b.as_bytes()))
}

// =============================================================================
// COOKIE HELPERS
// =============================================================================

/// Build the `Set-Cookie` value for a session token.
#[must_use]
pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

/// Extract the session token from request headers, if any.
#[must_use]
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == SESSION_COOKIE).then(|| value.to_string())
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use axum::http::HeaderValue;

    #[tokio::test]
    async fn issue_and_resolve() {
        let store = SessionStore::new();
        let name = Name::new("Alice").unwrap();
        let token = store.issue(name.clone()).await;

        assert_eq!(store.resolve(&token).await, Some(name));
        assert_eq!(store.resolve("bogus").await, None);
    }

    #[tokio::test]
    async fn tokens_are_unique() {
        let store = SessionStore::new();
        let a = store.issue(Name::new("Alice").unwrap()).await;
        let b = store.issue(Name::new("Bob").unwrap()).await;
        assert_ne!(a, b);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn reissue_replaces_previous_token() {
        let store = SessionStore::new();
        let name = Name::new("Alice").unwrap();

        let old = store.issue(name.clone()).await;
        let new = store.issue(name.clone()).await;
        assert_ne!(old, new);

        // One live session per participant; the old token is dead
        assert_eq!(store.len().await, 1);
        assert_eq!(store.resolve(&old).await, None);
        assert_eq!(store.resolve(&new).await, Some(name));
    }

    #[test]
    fn session_token_parses_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("other=1; tally_session=abc123; theme=dark"),
        );
        assert_eq!(session_token(&headers), Some(String::from("abc123")));
    }

    #[test]
    fn session_token_missing_cookie() {
        let headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("other=1"));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn cookie_is_scoped_and_http_only() {
        let cookie = session_cookie("tok");
        assert!(cookie.starts_with("tally_session=tok"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Path=/"));
    }
}
