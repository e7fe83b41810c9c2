//! HTTP route handlers for the health assistant API.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;

use crate::generation::{BackendKind, Lifestyle, Task};
use crate::session::{Session, SessionId};

use super::error::ApiError;
use super::state::AppState;

/// Header carrying the session id.
pub const SESSION_HEADER: &str = "x-session-id";

/// Create the API router with all routes.
#[must_use]
pub fn create_router(state: Arc<AppState>) -> Router {
    let static_dir = ServeDir::new(&state.config.server.static_dir);

    // Routes that act on the caller's session; the layer resolves it once.
    let session_routes = Router::new()
        .route("/api/key", post(set_api_key))
        .route("/api/summarize", post(summarize))
        .route("/api/summaries", get(list_summaries))
        .route("/api/answer", post(answer))
        .route("/api/tips", post(tips))
        .route_layer(middleware::from_fn_with_state(state.clone(), session_scope));

    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/session",
            get(session_status).post(start_session).delete(end_session),
        )
        .merge(session_routes)
        .fallback_service(static_dir)
        .with_state(state)
}

/// Resolve the caller's session (creating one when none is presented), hand
/// it to the handler and echo it on the response, errors included.
async fn session_scope(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let session_id = state.sessions.resolve(session_from_headers(request.headers()));
    request.extensions_mut().insert(session_id);

    let mut response = next.run(request).await;
    set_session_header(&mut response, session_id);
    response
}

fn set_session_header(response: &mut Response, session_id: SessionId) {
    if let Ok(value) = HeaderValue::from_str(&session_id.to_string()) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
}

fn with_session_header(session_id: SessionId, body: impl IntoResponse) -> Response {
    let mut response = body.into_response();
    set_session_header(&mut response, session_id);
    response
}

/// Session id from the request header, if present and well-formed.
fn session_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Health check endpoint.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "health-assistant",
        "version": env!("CARGO_PKG_VERSION"),
        "backend": state.generation.backend_kind(),
        "model": state.generation.model(),
    }))
}

/// Session status response.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionStatus {
    /// Session id to send back in `x-session-id`.
    pub session_id: SessionId,
    /// Whether a key is stored.
    pub has_api_key: bool,
    /// Whether a previous summary can be used as context.
    pub has_last_summary: bool,
    /// Saved summaries count.
    pub summary_count: usize,
    /// Successful generations so far.
    pub interaction_count: u64,
    /// Backend in use.
    pub backend: BackendKind,
    /// Lifestyle choices for the tips form.
    pub lifestyles: Vec<String>,
}

impl SessionStatus {
    fn new(session_id: SessionId, session: &Session, backend: BackendKind) -> Self {
        Self {
            session_id,
            has_api_key: session.has_api_key(),
            has_last_summary: session.last_summary.is_some(),
            summary_count: session.summaries.len(),
            interaction_count: session.interaction_count,
            backend,
            lifestyles: Lifestyle::ALL.iter().map(|l| l.label().to_string()).collect(),
        }
    }
}

fn session_status_response(state: &AppState, id: SessionId) -> Response {
    let backend = state.generation.backend_kind();
    let status = state.sessions.with_session(id, |s| SessionStatus::new(id, s, backend));
    with_session_header(id, Json(status))
}

/// Always starts a fresh session, whatever id was presented.
async fn start_session(State(state): State<Arc<AppState>>) -> Response {
    let id = state.sessions.create();
    session_status_response(&state, id)
}

async fn session_status(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let id = state.sessions.resolve(session_from_headers(&headers));
    session_status_response(&state, id)
}

/// Ends the presented session; never creates one.
async fn end_session(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let Some(id) = session_from_headers(&headers) else {
        return Json(serde_json::json!({ "ended": false })).into_response();
    };
    let ended = state.sessions.end(id);
    with_session_header(id, Json(serde_json::json!({ "ended": ended })))
}

/// API key submission.
#[derive(Debug, Deserialize)]
pub struct ApiKeyRequest {
    /// Key entered by the user.
    pub api_key: String,
}

/// Result of the advisory key check.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiKeyResponse {
    /// Session the key was stored in.
    pub session_id: SessionId,
    /// Whether the key could list a Gemini model.
    pub valid: bool,
}

/// Store the key and report the advisory check. An invalid key is still kept.
async fn set_api_key(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
    Json(request): Json<ApiKeyRequest>,
) -> Result<Json<ApiKeyResponse>, ApiError> {
    let api_key = request.api_key.trim().to_string();
    if api_key.is_empty() {
        return Err(ApiError::missing_key());
    }

    state
        .sessions
        .update(session_id, |s| s.api_key.clone_from(&api_key));

    let valid = state.generation.is_valid_key(&api_key).await;
    if !valid {
        tracing::warn!("Session {session_id}: API key failed the model listing check");
    }

    Ok(Json(ApiKeyResponse { session_id, valid }))
}

/// Generated text plus the session it belongs to.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Session id.
    pub session_id: SessionId,
    /// Task performed.
    pub task: Task,
    /// Generated text, verbatim.
    pub text: String,
}

/// Article summary request.
#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    /// Article text.
    pub article_text: String,
}

async fn summarize(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<GenerationResponse>, ApiError> {
    let api_key = state.sessions.with_session(session_id, |s| s.api_key.clone());

    if api_key.trim().is_empty() {
        return Err(ApiError::missing_key());
    }
    if request.article_text.trim().is_empty() {
        return Err(ApiError::validation("Please paste some text to summarize."));
    }

    let summary = state
        .generation
        .summarize(&request.article_text, &api_key)
        .await
        .map_err(|e| ApiError::generation(Task::Summarize, &e))?;

    let timestamp = Session::summary_key(Local::now());
    state.sessions.update(session_id, |s| {
        s.record_summary(timestamp, &request.article_text, &summary);
        s.record_interaction();
    });

    Ok(Json(GenerationResponse {
        session_id,
        task: Task::Summarize,
        text: summary,
    }))
}

/// One saved summary for display.
#[derive(Debug, Serialize, Deserialize)]
pub struct SavedSummary {
    /// Timestamp key.
    pub timestamp: String,
    /// Truncated article text.
    pub input_preview: String,
    /// Summary text.
    pub output: String,
}

async fn list_summaries(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
) -> Json<Vec<SavedSummary>> {
    let saved = state.sessions.with_session(session_id, |s| {
        s.saved_summaries()
            .map(|(timestamp, record)| SavedSummary {
                timestamp: timestamp.clone(),
                input_preview: record.input_preview(),
                output: record.output.clone(),
            })
            .collect()
    });
    Json(saved)
}

/// Health question request.
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    /// The question.
    pub question: String,
    /// Use the session's last summary as context.
    #[serde(default)]
    pub use_last_summary: bool,
}

async fn answer(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<GenerationResponse>, ApiError> {
    if request.question.trim().is_empty() {
        return Err(ApiError::validation("Please enter a question first."));
    }

    let (api_key, last_summary) = state
        .sessions
        .with_session(session_id, |s| (s.api_key.clone(), s.last_summary.clone()));

    if api_key.trim().is_empty() {
        return Err(ApiError::missing_key());
    }

    let context = last_summary.filter(|_| request.use_last_summary);
    let text = state
        .generation
        .answer(&request.question, context.as_deref(), &api_key)
        .await
        .map_err(|e| ApiError::generation(Task::Answer, &e))?;

    state.sessions.update(session_id, Session::record_interaction);

    Ok(Json(GenerationResponse {
        session_id,
        task: Task::Answer,
        text,
    }))
}

/// Wellness tips request.
#[derive(Debug, Deserialize)]
pub struct TipsRequest {
    /// Health goal.
    pub goal: String,
    /// Activity level.
    #[serde(default)]
    pub lifestyle: Lifestyle,
    /// Optional conditions or concerns.
    #[serde(default)]
    pub conditions: Option<String>,
}

async fn tips(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
    Json(request): Json<TipsRequest>,
) -> Result<Json<GenerationResponse>, ApiError> {
    if request.goal.trim().is_empty() {
        return Err(ApiError::validation("Please enter your health goal."));
    }

    let api_key = state.sessions.with_session(session_id, |s| s.api_key.clone());

    if api_key.trim().is_empty() {
        return Err(ApiError::missing_key());
    }

    let text = state
        .generation
        .tips(
            &request.goal,
            request.lifestyle,
            request.conditions.as_deref(),
            &api_key,
        )
        .await
        .map_err(|e| ApiError::generation(Task::Tips, &e))?;

    state.sessions.update(session_id, Session::record_interaction);

    Ok(Json(GenerationResponse {
        session_id,
        task: Task::Tips,
        text,
    }))
}
