//! Conversation Messages
//!
//! The message format exchanged with LLM providers. These are the model's
//! working context (system prompt, tool results, intermediate replies), as
//! opposed to the user-visible [`Transcript`](crate::session::Transcript).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{Transcript, TurnRole};

/// Role of a message sender
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt/instructions
    System,
    /// User input
    User,
    /// Assistant (LLM) response
    Assistant,
    /// Tool result (injected as context)
    Tool,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<TurnRole> for Role {
    fn from(role: TurnRole) -> Self {
        match role {
            TurnRole::User => Self::User,
            TurnRole::Assistant => Self::Assistant,
        }
    }
}

/// A single message in the model context
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,

    pub content: String,

    /// Tool call this message answers (tool messages only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Tool result message, optionally tied to the call that produced it
    pub fn tool(content: impl Into<String>, tool_call_id: Option<String>) -> Self {
        Self {
            tool_call_id,
            ..Self::new(Role::Tool, content)
        }
    }

    /// Rough token estimate (~4 characters per token plus role overhead)
    pub fn estimate_tokens(&self) -> u32 {
        u32::try_from(self.content.len() / 4).unwrap_or(u32::MAX).saturating_add(4)
    }
}

/// Model context for one agent invocation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,

    /// Budget enforced by [`Conversation::truncate_to_fit`]
    #[serde(default = "default_max_context")]
    max_context_tokens: u32,
}

const fn default_max_context() -> u32 {
    8192
}

impl Default for Conversation {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            max_context_tokens: default_max_context(),
        }
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        let mut conv = Self::new();
        conv.push(Message::system(prompt));
        conv
    }

    /// Seed the context with prior transcript turns, oldest first.
    ///
    /// Tool traffic from earlier turns is not part of the transcript, so the
    /// model only sees what the user saw.
    pub fn from_transcript(transcript: &Transcript) -> Self {
        let mut conv = Self::new();
        for turn in transcript.turns() {
            conv.push(Message::new(turn.role().into(), turn.content()));
        }
        conv
    }

    pub fn with_max_context_tokens(mut self, max: u32) -> Self {
        self.max_context_tokens = max;
        self
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn has_system_prompt(&self) -> bool {
        self.messages.first().is_some_and(|m| m.role == Role::System)
    }

    /// Put a system prompt at the front unless one is already there
    pub fn ensure_system_prompt(&mut self, prompt: impl Into<String>) {
        if !self.has_system_prompt() {
            self.messages.insert(0, Message::system(prompt));
        }
    }

    pub fn estimate_tokens(&self) -> u32 {
        self.messages.iter().map(Message::estimate_tokens).sum()
    }

    /// Drop the oldest non-system messages until the estimate fits the
    /// budget. The newest message is never removed.
    pub fn truncate_to_fit(&mut self) {
        while self.estimate_tokens() > self.max_context_tokens && self.messages.len() > 2 {
            let Some(pos) = self.messages.iter().position(|m| m.role != Role::System) else {
                break;
            };
            if pos + 1 >= self.messages.len() {
                break;
            }
            self.messages.remove(pos);
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_message_keeps_call_id() {
        let msg = Message::tool("ok", Some("call-1".into()));
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call-1"));
    }

    #[test]
    fn test_system_prompt_inserted_once() {
        let mut conv = Conversation::new();
        conv.push(Message::user("Hi"));
        conv.ensure_system_prompt("Be brief.");
        conv.ensure_system_prompt("Ignored.");

        assert_eq!(conv.len(), 2);
        assert_eq!(conv.messages()[0].content, "Be brief.");
        assert_eq!(conv.last().map(|m| m.role), Some(Role::User));
    }

    #[test]
    fn test_truncation_keeps_system_and_newest() {
        let mut conv = Conversation::with_system_prompt("sys").with_max_context_tokens(40);
        for i in 0..10 {
            conv.push(Message::user(format!("message number {i} with some padding text")));
        }
        conv.truncate_to_fit();

        assert!(conv.has_system_prompt());
        assert!(conv.last().unwrap().content.starts_with("message number 9"));
        assert!(conv.len() < 11);
    }
}
