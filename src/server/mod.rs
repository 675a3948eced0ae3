//! Web front-end: a one-page form plus a small JSON API.
//!
//! Routes:
//! - `GET /` renders the form
//! - `POST /ask` runs one interaction and renders the answer
//! - `POST /api/ask` is the JSON equivalent
//! - `GET /health` returns `OK`
//!
//! The browser's session id lives in the `askdesk_session` cookie and is
//! generated on first visit.

pub mod page;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::{Form, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{info, warn};
use uuid::Uuid;

use crate::agent::{Agent, DispatchStatus};
use crate::error::{AgentError, Result};

pub const SESSION_COOKIE: &str = "askdesk_session";

/// Per-session async locks so one session never runs two interactions at once.
#[derive(Debug, Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock guarding `session_id`, created on first use.
    pub fn lock_for(&self, session_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }
}

struct AppState {
    agent: Arc<Agent>,
    locks: SessionLocks,
}

impl AppState {
    /// Run one interaction while holding the session's lock.
    async fn ask(&self, session_id: &str, query: &str) -> Result<crate::agent::Interaction> {
        let lock = self.locks.lock_for(session_id);
        let _guard = lock.lock().await;
        self.agent.respond(session_id, query).await
    }
}

/// Build the router over a shared agent.
pub fn router(agent: Arc<Agent>) -> Router {
    let state = Arc::new(AppState {
        agent,
        locks: SessionLocks::new(),
    });
    Router::new()
        .route("/", get(index_handler))
        .route("/ask", post(ask_form_handler))
        .route("/api/ask", post(ask_json_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Bind `addr` and serve until the process exits.
pub async fn serve(agent: Arc<Agent>, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_on(listener, agent).await
}

/// Serve on an already bound listener.
pub async fn serve_on(listener: TcpListener, agent: Arc<Agent>) -> Result<()> {
    info!(addr = %listener.local_addr()?, "askdesk listening");
    axum::serve(listener, router(agent)).await?;
    Ok(())
}

async fn index_handler(headers: HeaderMap) -> Response {
    let (session_id, fresh) = session_from(&headers);
    with_session_cookie(Html(page::render(None, None)).into_response(), &session_id, fresh)
}

#[derive(Debug, Deserialize)]
struct AskForm {
    #[serde(default)]
    query: String,
}

async fn ask_form_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<AskForm>,
) -> Response {
    let (session_id, fresh) = session_from(&headers);
    let response = match state.ask(&session_id, &form.query).await {
        Ok(interaction) => Html(page::render(Some(&form.query), Some(&interaction.answer))).into_response(),
        Err(AgentError::InvalidArgument(_)) => (
            StatusCode::BAD_REQUEST,
            Html(page::render(None, Some("Please enter a question."))),
        )
            .into_response(),
        Err(err) => {
            warn!(session_id = %session_id, error = %err, "interaction failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(page::render(Some(&form.query), Some("Something went wrong. Please try again."))),
            )
                .into_response()
        }
    };
    with_session_cookie(response, &session_id, fresh)
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub query: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub session_id: String,
    pub answer: String,
    pub status: DispatchStatus,
}

async fn ask_json_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> std::result::Result<Json<AskResponse>, ApiError> {
    let session_id = request
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let interaction = state.ask(&session_id, &request.query).await?;
    Ok(Json(AskResponse {
        session_id,
        answer: interaction.answer,
        status: interaction.status,
    }))
}

async fn health_handler() -> &'static str {
    "OK"
}

/// JSON error body for the API routes.
struct ApiError(AgentError);

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AgentError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Session id from the cookie, or a fresh one (`true`) when absent or malformed.
fn session_from(headers: &HeaderMap) -> (String, bool) {
    let existing = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value).ok());
    match existing {
        Some(id) => (id.to_string(), false),
        None => (Uuid::new_v4().to_string(), true),
    }
}

fn with_session_cookie(mut response: Response, session_id: &str, fresh: bool) -> Response {
    if fresh {
        let cookie = format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax");
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(SET_COOKIE, value);
        }
    }
    response
}
