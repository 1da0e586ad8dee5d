//! # agent-core
//!
//! Provider-agnostic agent loop, tool system and turn orchestration.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  TurnOrchestrator ── Session { Transcript [Turn, Turn, ...] }    │
//! │        │                                                         │
//! │  ┌─────▼───────┐  ┌─────────────┐  ┌─────────────────────┐       │
//! │  │   Agent     │  │    Tool     │  │    LlmProvider      │       │
//! │  │ (ReAct loop)│──│  Registry   │──│    (Strategy)       │       │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘       │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait lets the agent run on Ollama, an OpenAI-compatible
//! API, or a scripted stand-in without changing agent logic. Tools report
//! backend failures as [`AgentError::Capability`], which the orchestrator
//! turns into a visible error turn.

pub mod error;
pub mod message;
pub mod orchestrator;
pub mod provider;
pub mod reasoning;
pub mod session;
pub mod tool;

pub use error::{AgentError, CapabilityErrorKind, Result};
pub use message::{Conversation, Message, Role};
pub use orchestrator::TurnOrchestrator;
pub use provider::LlmProvider;
#[cfg(any(test, feature = "testing"))]
pub use provider::ScriptedProvider;
pub use reasoning::{Agent, AgentBuilder, AgentConfig};
pub use session::{
    RetentionPolicy, Session, SessionId, SessionRegistry, SharedSession, Transcript, Turn,
    TurnRole,
};
pub use tool::{ParameterSchema, Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema};
