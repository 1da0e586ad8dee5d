//! Turn Orchestration
//!
//! Turns a user utterance into exactly one assistant turn. Agent and
//! capability failures never escape: they become an `Error: ...` turn so the
//! session stays usable.

use std::sync::Arc;
use std::time::Instant;

use crate::error::{AgentError, CapabilityErrorKind, Result};
use crate::message::{Conversation, Message};
use crate::reasoning::Agent;
use crate::session::{Session, Turn};

pub struct TurnOrchestrator {
    agent: Arc<Agent>,
    recovery_hint: Option<String>,
}

impl TurnOrchestrator {
    pub const fn new(agent: Arc<Agent>) -> Self {
        Self {
            agent,
            recovery_hint: None,
        }
    }

    /// Text appended to error turns caused by a reference to a missing
    /// resource (usually a step of a multi-call workflow run out of order)
    #[must_use]
    pub fn with_recovery_hint(mut self, hint: impl Into<String>) -> Self {
        self.recovery_hint = Some(hint.into());
        self
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Submit one utterance to the agent on behalf of `session`.
    ///
    /// Appends the user turn and the resulting assistant turn (in that order)
    /// and returns the assistant turn. Only an empty utterance is an error,
    /// and it leaves the transcript untouched.
    pub async fn submit(&self, session: &mut Session, utterance: &str) -> Result<Turn> {
        let utterance = validate_utterance(utterance)?;

        let mut conversation = Conversation::from_transcript(session.transcript());
        conversation.push(Message::user(utterance));

        let started = Instant::now();
        let reply = self.reply(&mut conversation).await;

        tracing::info!(
            session = %session.id,
            failed = reply.failed(),
            turns = session.transcript().len() + 2,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Turn completed"
        );

        session.record(Turn::user(utterance), reply.clone());
        Ok(reply)
    }

    /// One-shot mode: a single turn against a throwaway session
    pub async fn run_once(&self, utterance: &str) -> Result<Turn> {
        let mut session = Session::new();
        self.submit(&mut session, utterance).await
    }

    async fn reply(&self, conversation: &mut Conversation) -> Turn {
        match self.agent.run(conversation).await {
            Ok(output) => Turn::assistant(output),
            Err(err) => {
                tracing::error!(error = %err, "Agent invocation failed");
                Turn::failure(self.render_error(&err))
            }
        }
    }

    /// `Error: {details}`, plus the recovery hint for missing-resource
    /// capability failures
    pub fn render_error(&self, err: &AgentError) -> String {
        let mut text = format!("Error: {err}");
        if let (Some(CapabilityErrorKind::ResourceMissing), Some(hint)) =
            (err.capability_kind(), &self.recovery_hint)
        {
            text.push_str("\n\n");
            text.push_str(hint);
        }
        text
    }
}

fn validate_utterance(utterance: &str) -> Result<&str> {
    let trimmed = utterance.trim();
    if trimmed.is_empty() {
        return Err(AgentError::InvalidInput("message must not be empty".into()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::message::Role;
    use crate::provider::ScriptedProvider;
    use crate::session::TurnRole;
    use crate::tool::{ParameterSchema, Tool, ToolCall, ToolResult, ToolSchema};

    struct PriceTool;

    #[async_trait]
    impl Tool for PriceTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "create_payment_link".into(),
                description: "Create a payment link".into(),
                parameters: vec![ParameterSchema::required("price", "string", "Price id")],
                category: None,
            }
        }

        async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
            let price = call.str_arg("price").unwrap_or_default();
            Err(AgentError::capability(
                CapabilityErrorKind::ResourceMissing,
                format!("No such price: '{price}'"),
            ))
        }
    }

    fn orchestrator(replies: Vec<&str>) -> (TurnOrchestrator, Arc<ScriptedProvider>) {
        let provider = Arc::new(ScriptedProvider::new(replies));
        let agent = Agent::builder()
            .provider(provider.clone())
            .tool(PriceTool)
            .build()
            .unwrap();
        let orchestrator =
            TurnOrchestrator::new(Arc::new(agent)).with_recovery_hint("Retry in order.");
        (orchestrator, provider)
    }

    #[tokio::test]
    async fn test_each_submit_appends_user_then_assistant() {
        let (orch, _) = orchestrator(vec!["Hello!", "Still here."]);
        let mut session = Session::new();

        let first = orch.submit(&mut session, "hi").await.unwrap();
        assert_eq!(first.role(), TurnRole::Assistant);
        assert_eq!(first.content(), "Hello!");
        assert_eq!(session.transcript().len(), 2);

        orch.submit(&mut session, "  again  ").await.unwrap();
        let turns = session.transcript().turns();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[2].role(), TurnRole::User);
        assert_eq!(turns[2].content(), "again");
        assert_eq!(turns[3].content(), "Still here.");
    }

    #[tokio::test]
    async fn test_history_is_sent_to_the_agent() {
        let (orch, provider) = orchestrator(vec!["first", "second"]);
        let mut session = Session::new();
        orch.submit(&mut session, "one").await.unwrap();
        orch.submit(&mut session, "two").await.unwrap();

        let second_request = &provider.requests().await[1];
        let roles: Vec<Role> = second_request.iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::System, Role::User, Role::Assistant, Role::User]);
    }

    #[tokio::test]
    async fn test_empty_utterance_rejected_without_side_effects() {
        let (orch, provider) = orchestrator(vec![]);
        let mut session = Session::new();

        let err = orch.submit(&mut session, "   ").await.unwrap_err();
        assert!(matches!(err, AgentError::InvalidInput(_)));
        assert!(session.transcript().is_empty());
        assert!(provider.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_capability_failure_becomes_error_turn_with_hint() {
        let (orch, _) = orchestrator(vec![
            r#"{"tool": "create_payment_link", "arguments": {"price": "price_bogus"}}"#,
            "Recovered.",
        ]);
        let mut session = Session::new();

        let turn = orch.submit(&mut session, "make a link").await.unwrap();
        assert!(turn.failed());
        assert!(turn.content().starts_with("Error: No such price: 'price_bogus'"));
        assert!(turn.content().ends_with("Retry in order."));

        let next = orch.submit(&mut session, "try something else").await.unwrap();
        assert_eq!(next.content(), "Recovered.");
        assert_eq!(session.transcript().len(), 4);
    }

    #[tokio::test]
    async fn test_provider_failure_becomes_error_turn_without_hint() {
        let (orch, _) = orchestrator(vec![]);
        let turn = orch.run_once("hello").await.unwrap();
        assert!(turn.failed());
        assert_eq!(turn.content(), "Error: Provider error: script exhausted");
    }
}
