//! Application State

use std::sync::Arc;

use agent_core::{SessionRegistry, TurnOrchestrator};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Agent plus error-turn policy, shared by every session
    pub orchestrator: Arc<TurnOrchestrator>,

    /// Live chat sessions, each behind its own lock
    pub sessions: Arc<SessionRegistry>,

    /// Payment backend name (`stripe`, `mock`, ...)
    pub payments: String,
}

impl AppState {
    pub fn new(orchestrator: TurnOrchestrator, payments: impl Into<String>) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            sessions: Arc::new(SessionRegistry::new()),
            payments: payments.into(),
        }
    }

    #[must_use]
    pub fn with_sessions(mut self, sessions: SessionRegistry) -> Self {
        self.sessions = Arc::new(sessions);
        self
    }
}
