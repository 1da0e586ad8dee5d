//! HTTP Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agent_core::{AgentError, Session, SessionId, Turn, TurnRole};
use stripe_toolkit::{extract_link, qr_data_url, render_qr};

use crate::state::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub llm_connected: bool,
    pub payments: String,
    pub tools: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub turn: TurnView,
}

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub title: String,
    pub turns: Vec<TurnView>,
}

/// A turn as the chat UI renders it
#[derive(Debug, Serialize)]
pub struct TurnView {
    pub role: TurnRole,
    pub content: String,
    pub failed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,
    /// PNG data URL of the checkout link's QR code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
}

impl From<&Turn> for TurnView {
    fn from(turn: &Turn) -> Self {
        let checkout_url = match turn.role() {
            TurnRole::Assistant => extract_link(turn.content()),
            TurnRole::User => None,
        };
        let qr_code = checkout_url.as_deref().and_then(|url| {
            qr_data_url(url)
                .inspect_err(|e| tracing::warn!(url, "QR rendering failed: {e}"))
                .ok()
        });

        Self {
            role: turn.role(),
            content: turn.content().to_owned(),
            failed: turn.failed(),
            created_at: turn.created_at(),
            checkout_url,
            qr_code,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QrQuery {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

fn error_response(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

fn agent_error(err: &AgentError) -> ApiError {
    match err {
        AgentError::InvalidInput(msg) => error_response(StatusCode::BAD_REQUEST, "INVALID_INPUT", msg),
        other => {
            tracing::error!("Request failed: {other}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "AGENT_ERROR",
                other.user_message(),
            )
        }
    }
}

fn session_not_found(id: &SessionId) -> ApiError {
    error_response(
        StatusCode::NOT_FOUND,
        "SESSION_NOT_FOUND",
        format!("No session with id {id}"),
    )
}

fn session_view(session: &Session) -> SessionView {
    SessionView {
        session_id: session.id.to_string(),
        title: session.title(),
        turns: session.transcript().iter().map(TurnView::from).collect(),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let agent = state.orchestrator.agent();
    let llm_connected = agent.provider().health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        llm_connected,
        payments: state.payments.clone(),
        tools: agent.tools().names().into_iter().map(String::from).collect(),
    })
}

pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionCreated>) {
    let (id, _) = state.sessions.create().await;
    (
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id: id.to_string(),
        }),
    )
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let id = SessionId::from_string(id);
    let shared = state
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| session_not_found(&id))?;

    let session = shared.lock().await;
    Ok(Json(session_view(&session)))
}

/// End a session and drop its transcript
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = SessionId::from_string(id);
    if state.sessions.remove(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(&id))
    }
}

/// Submit one user turn; the session is created when no id is given
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if payload.message.trim().is_empty() {
        return Err(agent_error(&AgentError::InvalidInput(
            "message must not be empty".into(),
        )));
    }

    let (id, shared) = match payload.session_id {
        Some(id) => {
            let id = SessionId::from_string(id);
            let shared = state
                .sessions
                .get(&id)
                .await
                .ok_or_else(|| session_not_found(&id))?;
            (id, shared)
        }
        None => state.sessions.create().await,
    };

    // held for the whole turn: one turn at a time per session
    let mut session = shared.lock().await;
    let turn = state
        .orchestrator
        .submit(&mut session, &payload.message)
        .await
        .map_err(|e| agent_error(&e))?;

    Ok(Json(ChatResponse {
        session_id: id.to_string(),
        turn: TurnView::from(&turn),
    }))
}

/// QR code PNG for a checkout link
pub async fn qr_code(Query(query): Query<QrQuery>) -> Result<impl IntoResponse, ApiError> {
    let url = query.url.trim();
    if extract_link(url).as_deref() != Some(url) {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "NOT_A_CHECKOUT_LINK",
            "url must be a Stripe checkout link",
        ));
    }

    let png = render_qr(url).map_err(|e| {
        error_response(StatusCode::UNPROCESSABLE_ENTITY, "QR_RENDER_FAILED", e.to_string())
    })?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
