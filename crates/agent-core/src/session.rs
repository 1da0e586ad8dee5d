//! Session Management
//!
//! A [`Session`] owns the user-visible [`Transcript`] of one conversation.
//! Sessions are plain values handed to the
//! [`TurnOrchestrator`](crate::orchestrator::TurnOrchestrator) on every call;
//! the [`SessionRegistry`] keeps them addressable for multi-session servers.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who produced a turn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Assistant => f.write_str("assistant"),
        }
    }
}

/// One message in the user-visible conversation. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    role: TurnRole,
    content: String,
    /// Content is a substituted error string rather than agent output
    #[serde(default)]
    failed: bool,
    created_at: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self::build(TurnRole::User, content.into(), false)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::build(TurnRole::Assistant, content.into(), false)
    }

    /// Assistant turn standing in for a failed agent invocation
    pub fn failure(content: impl Into<String>) -> Self {
        Self::build(TurnRole::Assistant, content.into(), true)
    }

    fn build(role: TurnRole, content: String, failed: bool) -> Self {
        Self {
            role,
            content,
            failed,
            created_at: Utc::now(),
        }
    }

    pub const fn role(&self) -> TurnRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub const fn failed(&self) -> bool {
        self.failed
    }

    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Ordered, append-only history of turns.
///
/// Turns only enter in (user, assistant) pairs through the orchestrator.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, user: Turn, assistant: Turn) {
        debug_assert_eq!(user.role, TurnRole::User);
        debug_assert_eq!(assistant.role, TurnRole::Assistant);
        self.turns.push(user);
        self.turns.push(assistant);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A chat session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,

    transcript: Transcript,

    pub created_at: DateTime<Utc>,

    /// Last activity timestamp
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(SessionId::new())
    }

    pub fn with_id(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            transcript: Transcript::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub const fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub(crate) fn record(&mut self, user: Turn, assistant: Turn) {
        self.transcript.record(user, assistant);
        self.updated_at = Utc::now();
    }

    /// Title derived from the first user turn
    pub fn title(&self) -> String {
        self.transcript
            .iter()
            .find(|t| t.role == TurnRole::User)
            .map_or_else(
                || format!("Session {}", &self.id.0[..8.min(self.id.0.len())]),
                |t| {
                    let preview: String = t.content.chars().take(50).collect();
                    if t.content.chars().count() > 50 {
                        format!("{preview}...")
                    } else {
                        preview
                    }
                },
            )
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to one registered session. Holding the lock serializes turns.
pub type SharedSession = Arc<Mutex<Session>>;

/// How long a [`SessionRegistry`] keeps sessions around
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Upper bound on live sessions; the least recently active idle session
    /// is dropped to make room
    pub max_sessions: usize,

    /// Sessions with no turn for this long are dropped by [`SessionRegistry::sweep`]
    pub idle_ttl: TimeDelta,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_sessions: 1000,
            idle_ttl: TimeDelta::hours(1),
        }
    }
}

type SessionMap = HashMap<SessionId, SharedSession>;

/// In-memory registry of live sessions.
///
/// Each session sits behind its own mutex, so a session processes one turn at
/// a time while independent sessions run concurrently. A session whose lock
/// is held is mid-turn and never evicted.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<SessionMap>,
    retention: RetentionPolicy,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retention: RetentionPolicy) -> Self {
        Self {
            sessions: RwLock::default(),
            retention,
        }
    }

    pub const fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    /// Start a new empty session, evicting idle ones when at capacity
    pub async fn create(&self) -> (SessionId, SharedSession) {
        let session = Session::new();
        let id = session.id.clone();
        let shared = Arc::new(Mutex::new(session));

        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.retention.max_sessions {
            self.make_room(&mut sessions);
        }
        sessions.insert(id.clone(), Arc::clone(&shared));
        drop(sessions);

        tracing::debug!(session = %id, "Session created");
        (id, shared)
    }

    /// Drop every session idle for at least the configured TTL
    pub async fn sweep(&self) -> usize {
        let cutoff = Utc::now() - self.retention.idle_ttl;
        let mut sessions = self.sessions.write().await;
        let expired: Vec<SessionId> = idle_sessions(&sessions)
            .into_iter()
            .filter(|(_, updated_at)| *updated_at <= cutoff)
            .map(|(id, _)| id)
            .collect();

        for id in &expired {
            sessions.remove(id);
        }
        if !expired.is_empty() {
            tracing::debug!(evicted = expired.len(), "Expired idle sessions");
        }
        expired.len()
    }

    fn make_room(&self, sessions: &mut SessionMap) {
        let cutoff = Utc::now() - self.retention.idle_ttl;
        let mut idle = idle_sessions(sessions);
        idle.sort_by_key(|(_, updated_at)| *updated_at);

        for (id, updated_at) in idle {
            if updated_at > cutoff && sessions.len() < self.retention.max_sessions {
                break;
            }
            sessions.remove(&id);
            tracing::debug!(session = %id, "Session evicted");
        }

        if sessions.len() >= self.retention.max_sessions {
            tracing::warn!(
                live = sessions.len(),
                max = self.retention.max_sessions,
                "Every session is mid-turn; exceeding capacity"
            );
        }
    }

    pub async fn get(&self, id: &SessionId) -> Option<SharedSession> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &SessionId) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::debug!(session = %id, "Session removed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Sessions not mid-turn, with their last activity
fn idle_sessions(sessions: &SessionMap) -> Vec<(SessionId, DateTime<Utc>)> {
    sessions
        .iter()
        .filter_map(|(id, shared)| {
            let session = shared.try_lock().ok()?;
            Some((id.clone(), session.updated_at))
        })
        .collect()
}
