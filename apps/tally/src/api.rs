//! # HTTP Server
//!
//! Pages and REST API for the drink counter.
//!
//! ## Endpoints
//!
//! - `GET /` - landing page (join form)
//! - `POST /join` - create a session for a name, add it to the roster
//! - `GET /counter` - per-participant counter page
//! - `POST /increment` / `POST /decrement` - mutate the session's count
//! - `GET /leaderboard` - leaderboard page
//! - `GET /api/participants` - all participants sorted by count, with
//!   their active marker classes
//! - `GET /health` - liveness probe
//!
//! Every count mutation pulses the participant's marker element; API
//! consumers receive the marker in `classes` and key a CSS transition on it.

use crate::error::AppError;
use crate::pulse::Pulser;
use crate::session::{session_cookie, session_token, SessionStore};
use crate::store::RosterPersist;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::response::{AppendHeaders, Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use tally_core::pulse::PulseConfig;
use tally_core::{Name, Roster};
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Default mutation budget per second.
const MUTATIONS_PER_SECOND: u32 = 30;

// =============================================================================
// SHARED STATE
// =============================================================================

/// Shared HTTP server state.
#[derive(Clone)]
pub struct AppState {
    /// The in-process roster, source of truth while serving.
    roster: Arc<RwLock<Roster>>,
    /// Persistence backend; snapshotted after every mutation.
    store: Arc<dyn RosterPersist>,
    /// Cookie sessions: token -> participant name.
    sessions: Arc<SessionStore>,
    /// The pulse scheduler for marker elements.
    pulser: Pulser,
    /// Rate limiter for mutating routes.
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl AppState {
    /// Build state with the default mutation quota.
    pub async fn new(roster: Roster, store: Arc<dyn RosterPersist>, pulse: PulseConfig) -> Self {
        Self::with_quota(roster, store, pulse, default_quota()).await
    }

    /// Build state with an explicit mutation quota.
    pub async fn with_quota(
        roster: Roster,
        store: Arc<dyn RosterPersist>,
        pulse: PulseConfig,
        quota: Quota,
    ) -> Self {
        let pulser = Pulser::new(pulse);
        // Pre-register marker elements for everyone already on the roster
        for (name, _) in roster.iter() {
            pulser.register(name).await;
        }

        Self {
            roster: Arc::new(RwLock::new(roster)),
            store,
            sessions: Arc::new(SessionStore::new()),
            pulser,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// The pulse scheduler (exposed for tests).
    #[must_use]
    pub fn pulser(&self) -> &Pulser {
        &self.pulser
    }
}

fn default_quota() -> Quota {
    Quota::per_second(NonZeroU32::new(MUTATIONS_PER_SECOND).unwrap_or(NonZeroU32::MIN))
}

// =============================================================================
// ROUTER
// =============================================================================

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/join", post(join))
        .route("/counter", get(counter_page))
        .route("/increment", post(increment))
        .route("/decrement", post(decrement))
        .route("/leaderboard", get(leaderboard_page))
        .route("/api/participants", get(api_participants))
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Start the HTTP server and run until ctrl-c.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<(), AppError> {
    let app = create_router(state);

    info!(addr = %addr, "starting tally server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install ctrl-c handler");
    }
}

// =============================================================================
// SESSION HELPERS
// =============================================================================

async fn require_session(state: &AppState, headers: &HeaderMap) -> Result<Name, AppError> {
    let token = session_token(headers).ok_or(AppError::NotLoggedIn)?;
    state
        .sessions
        .resolve(&token)
        .await
        .ok_or(AppError::NotLoggedIn)
}

// =============================================================================
// JOIN
// =============================================================================

/// Join form payload.
#[derive(Debug, Deserialize, Serialize)]
pub struct JoinForm {
    /// The participant's display name.
    pub name: String,
}

/// Process a name submission and create a session.
///
/// A blank or invalid name silently redirects back to the landing page,
/// matching the original form behavior.
async fn join(State(state): State<AppState>, Form(form): Form<JoinForm>) -> Result<Response, AppError> {
    // Joins share the mutation budget: an unthrottled join would let a
    // client grow the roster and session table without bound
    state.limiter.check().map_err(|_| AppError::Throttled)?;

    let Ok(name) = Name::new(&form.name) else {
        return Ok(Redirect::to("/").into_response());
    };

    {
        let mut roster = state.roster.write().await;
        if roster.join(name.clone()) {
            state.store.save(&roster)?;
            info!(name = %name, "participant joined");
        }
    }
    state.pulser.register(&name).await;

    let token = state.sessions.issue(name).await;
    let cookie = session_cookie(&token);
    Ok((AppendHeaders([(SET_COOKIE, cookie)]), Redirect::to("/counter")).into_response())
}

// =============================================================================
// COUNT MUTATIONS
// =============================================================================

async fn increment(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    mutate(&state, &headers, Roster::increment).await
}

async fn decrement(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    mutate(&state, &headers, Roster::decrement).await
}

/// Shared body of increment/decrement: session, rate limit, mutate,
/// persist, pulse.
async fn mutate(
    state: &AppState,
    headers: &HeaderMap,
    op: fn(&mut Roster, &Name) -> Result<tally_core::Count, tally_core::TallyError>,
) -> Result<Json<serde_json::Value>, AppError> {
    let name = require_session(state, headers).await?;
    state.limiter.check().map_err(|_| AppError::Throttled)?;

    let count = {
        let mut roster = state.roster.write().await;
        let count = op(&mut roster, &name)?;
        state.store.save(&roster)?;
        count
    };

    state.pulser.register(&name).await;
    if let Err(e) = state.pulser.pulse(&name).await {
        // Unreachable after register; log rather than fail the mutation
        warn!(error = %e, "pulse scheduling failed");
    }

    Ok(Json(json!({ "success": true, "count": count.value() })))
}

// =============================================================================
// PARTICIPANTS API
// =============================================================================

/// One leaderboard row.
#[derive(Debug, Serialize)]
pub struct ParticipantRow {
    /// Participant name.
    pub name: String,
    /// Current drink count.
    pub count: u64,
    /// Active marker classes on the participant's element.
    pub classes: Vec<String>,
}

/// All participants sorted by count (descending).
async fn api_participants(State(state): State<AppState>) -> Json<Vec<ParticipantRow>> {
    let board = {
        let roster = state.roster.read().await;
        roster.leaderboard()
    };

    let mut rows = Vec::with_capacity(board.len());
    for (name, count) in board {
        let classes = state.pulser.classes(&name).await;
        rows.push(ParticipantRow {
            name: name.to_string(),
            count: count.value(),
            classes,
        });
    }
    Json(rows)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

// =============================================================================
// PAGES
// =============================================================================

/// Shared page stylesheet, keyed on the configured marker class and
/// duration so the CSS transition always matches the server-side pulse.
fn page_style(pulse: &PulseConfig) -> String {
    format!(
        "<style>\
         body{{font-family:sans-serif;max-width:32rem;margin:2rem auto}}\
         .{class}{{transform:scale(1.15);transition:transform {ms}ms}}\
         #count{{display:inline-block;font-size:2rem;transition:transform {ms}ms}}\
         </style>",
        class = pulse.class,
        ms = pulse.duration.as_millis(),
    )
}

async fn index_page(State(state): State<AppState>) -> Html<String> {
    let style = page_style(state.pulser.config());
    Html(format!(
        "<!doctype html><html><head><title>Tally</title>{style}</head><body>\
         <h1>Tally</h1>\
         <form method=\"post\" action=\"/join\">\
         <input name=\"name\" placeholder=\"Your name\" autofocus>\
         <button type=\"submit\">Join</button>\
         </form>\
         <p><a href=\"/leaderboard\">Leaderboard</a></p>\
         </body></html>"
    ))
}

/// Render the counter page for the session's participant.
async fn counter_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Ok(name) = require_session(&state, &headers).await else {
        return Redirect::to("/").into_response();
    };

    let count = {
        let roster = state.roster.read().await;
        roster.count(&name).unwrap_or_default()
    };

    let pulse = state.pulser.config();
    Html(format!(
        "<!doctype html><html><head><title>Tally</title>{style}</head><body>\
         <h1>Hi {name}</h1>\
         <p><span id=\"count\">{count}</span> drinks</p>\
         <button onclick=\"send('/increment')\">+1</button>\
         <button onclick=\"send('/decrement')\">-1</button>\
         <p><a href=\"/leaderboard\">Leaderboard</a></p>\
         <script>\
         async function send(path){{\
           const r=await fetch(path,{{method:'POST'}});\
           if(!r.ok)return;\
           const d=await r.json();\
           const el=document.getElementById('count');\
           el.textContent=d.count;\
           el.classList.add('{class}');\
           setTimeout(()=>el.classList.remove('{class}'),{ms});\
         }}\
         </script>\
         </body></html>",
        style = page_style(pulse),
        name = html_escape(name.as_str()),
        count = count,
        class = pulse.class,
        ms = pulse.duration.as_millis(),
    ))
    .into_response()
}

async fn leaderboard_page(State(state): State<AppState>) -> Html<String> {
    let style = page_style(state.pulser.config());
    Html(format!(
        "<!doctype html><html><head><title>Leaderboard</title>{style}</head><body>\
         <h1>Leaderboard</h1>\
         <ol id=\"board\"></ol>\
         <p><a href=\"/\">Home</a></p>\
         <script>\
         async function refresh(){{\
           const r=await fetch('/api/participants');\
           if(!r.ok)return;\
           const rows=await r.json();\
           const board=document.getElementById('board');\
           board.innerHTML='';\
           for(const row of rows){{\
             const li=document.createElement('li');\
             li.textContent=`${{row.name}}: ${{row.count}}`;\
             li.className=row.classes.join(' ');\
             board.appendChild(li);\
           }}\
         }}\
         refresh();setInterval(refresh,2000);\
         </script>\
         </body></html>"
    ))
}

fn html_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

// =============================================================================
// TESTS
// =============================================================================
