//! stripe-agent HTTP Server
//!
//! Axum server behind the chat UI: sessions, turns, and QR codes for the
//! checkout links the agent produces.

mod handlers;
mod state;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use chrono::TimeDelta;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{RetentionPolicy, SessionRegistry};
use agent_runtime::RuntimeConfig;
use stripe_toolkit::StripeAgentToolkit;

use crate::handlers::{
    chat_handler, create_session, delete_session, get_session, health_check, qr_code,
};
use crate::state::AppState;

/// API routes plus the static frontend bundle
pub fn router(state: AppState, static_dir: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/chat", post(chat_handler))
        .route("/api/qr", get(qr_code))
        // WASM frontend
        .fallback_service(ServeDir::new(static_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// `MAX_SESSIONS` and `SESSION_IDLE_TTL_SECS`, defaulting per [`RetentionPolicy`]
fn retention_from_env() -> anyhow::Result<RetentionPolicy> {
    let mut retention = RetentionPolicy::default();
    if let Ok(max) = std::env::var("MAX_SESSIONS") {
        retention.max_sessions = max.parse().context("MAX_SESSIONS")?;
    }
    if let Ok(secs) = std::env::var("SESSION_IDLE_TTL_SECS") {
        let secs: u32 = secs.parse().context("SESSION_IDLE_TTL_SECS")?;
        retention.idle_ttl = TimeDelta::seconds(i64::from(secs));
    }
    Ok(retention)
}

/// Periodically drop idle sessions
fn spawn_session_sweeper(sessions: Arc<SessionRegistry>, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let evicted = sessions.sweep().await;
            if evicted > 0 {
                let live = sessions.len().await;
                tracing::info!(evicted, live, "Idle sessions expired");
            }
        }
    });
}

fn offline_requested() -> bool {
    std::env::var("STRIPE_AGENT_OFFLINE").is_ok_and(|v| matches!(v.as_str(), "1" | "true"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Configuration errors stop the server before any capability call
    let runtime = RuntimeConfig::from_env().context("LLM configuration")?;
    let llm = runtime.build_provider().context("LLM provider")?;

    match llm.health_check().await {
        Ok(true) => tracing::info!(provider = ?runtime.provider, model = %runtime.model, "LLM reachable"),
        Ok(false) | Err(_) => {
            tracing::warn!(provider = ?runtime.provider, "LLM not reachable - turns will fail until it is");
        }
    }

    let toolkit = if offline_requested() {
        tracing::warn!("STRIPE_AGENT_OFFLINE set - using the in-memory payment provider");
        StripeAgentToolkit::offline()
    } else {
        StripeAgentToolkit::from_env().context("Stripe configuration")?
    };
    tracing::info!(actions = ?toolkit.actions().enabled(), "Capability declaration loaded");

    let payments = toolkit.provider().name().to_owned();
    let orchestrator = toolkit.orchestrator(llm, &runtime.model)?;
    let retention = retention_from_env()?;
    tracing::info!(
        max_sessions = retention.max_sessions,
        idle_ttl_secs = retention.idle_ttl.num_seconds(),
        "Session retention"
    );
    let state = AppState::new(orchestrator, payments)
        .with_sessions(SessionRegistry::with_retention(retention));
    spawn_session_sweeper(Arc::clone(&state.sessions), Duration::from_secs(60));

    let static_dir = std::env::var("STATIC_DIR").unwrap_or_else(|_| "static".into());
    let app = router(state, &static_dir);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    tracing::info!("stripe-agent server running on http://{addr}");
    tracing::info!("  GET  /health             - Health check");
    tracing::info!("  POST /api/sessions       - New chat session");
    tracing::info!("  GET  /api/sessions/{{id}}  - Session transcript");
    tracing::info!("  DEL  /api/sessions/{{id}}  - End session");
    tracing::info!("  POST /api/chat           - Send message");
    tracing::info!("  GET  /api/qr?url=...     - QR code for a checkout link");

    axum::serve(listener, app).await?;

    Ok(())
}
