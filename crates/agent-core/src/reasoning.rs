//! Reasoning Loop
//!
//! ReAct (Reason + Act) loop: the model either answers or asks for a tool;
//! tool results are fed back until it answers in plain text.

use std::sync::Arc;
use std::time::Instant;

use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message};
use crate::provider::{GenerationOptions, LlmProvider};
use crate::tool::{Tool, ToolCall, ToolRegistry, ToolResult};

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Display name used in logs
    pub name: String,

    /// Fixed instructions placed at the top of the system prompt
    pub system_prompt: String,

    /// Maximum reasoning iterations before giving up
    pub max_iterations: usize,

    pub generation: GenerationOptions,

    /// Whether to append tool descriptions to system prompt
    pub inject_tool_descriptions: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "Agent".into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_iterations: 10,
            generation: GenerationOptions::default(),
            inject_tool_descriptions: true,
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. \
After receiving tool results, use them to answer. Be concise and accurate.";

const TOOL_BLOCK_OPEN: &str = "```tool";
const TOOL_BLOCK_CLOSE: &str = "```";

/// The conversational agent
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    /// Instructions plus the generated tool section
    pub fn system_prompt(&self) -> String {
        let mut prompt = self.config.system_prompt.clone();

        if self.config.inject_tool_descriptions && !self.tools.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(&self.tools.generate_prompt_section());
        }

        prompt
    }

    /// Run the loop until the model produces a final answer.
    ///
    /// Intermediate replies and tool results are appended to `conversation`.
    /// A capability failure inside a tool ends the run with that error.
    pub async fn run(&self, conversation: &mut Conversation) -> Result<String> {
        conversation.ensure_system_prompt(self.system_prompt());
        conversation.truncate_to_fit();

        let started = Instant::now();

        for iteration in 1..=self.config.max_iterations {
            let completion = self
                .provider
                .complete(conversation.messages(), &self.config.generation)
                .await?;

            if completion.truncated() {
                tracing::warn!(agent = %self.config.name, iteration, "Completion truncated");
            }

            let content = completion.content;
            conversation.push(Message::assistant(&content));

            let Some(call) = parse_tool_call(&content) else {
                tracing::debug!(
                    agent = %self.config.name,
                    iterations = iteration,
                    elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "Final answer"
                );
                return Ok(content);
            };

            tracing::debug!(agent = %self.config.name, tool = %call.name, iteration, "Executing tool");
            let result = self.execute_tool(&call).await?;
            conversation.push(Message::tool(format_tool_result(&result), call.id.clone()));
        }

        Err(AgentError::MaxIterations(self.config.max_iterations))
    }

    /// Run with a single question (fresh context)
    pub async fn ask(&self, question: &str) -> Result<String> {
        let mut conversation = Conversation::new();
        conversation.push(Message::user(question));
        self.run(&mut conversation).await
    }

    /// Execute a call. Capability errors propagate; every other failure is
    /// turned into a failed result so the model can correct itself.
    async fn execute_tool(&self, call: &ToolCall) -> Result<ToolResult> {
        match self.tools.execute(call).await {
            Ok(mut result) => {
                result.id.clone_from(&call.id);
                Ok(result)
            }
            Err(err @ AgentError::Capability { .. }) => {
                tracing::warn!(tool = %call.name, error = %err, "Capability call failed");
                Err(err)
            }
            Err(err) => {
                tracing::debug!(tool = %call.name, error = %err, "Tool call rejected");
                let mut result = ToolResult::failure(&call.name, format!("Error: {err}"));
                result.id.clone_from(&call.id);
                Ok(result)
            }
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }
}

fn format_tool_result(result: &ToolResult) -> String {
    if result.success {
        format!("[Tool '{}' returned]\n{}", result.name, result.render())
    } else {
        format!("[Tool '{}' failed]\n{}", result.name, result.render())
    }
}

/// Find a tool call in a model reply: a fenced ```` ```tool ```` block first,
/// then a bare JSON object carrying a `"tool"` key, or `"name"` together
/// with `"arguments"`.
pub fn parse_tool_call(content: &str) -> Option<ToolCall> {
    let mut call = parse_fenced_tool_call(content).or_else(|| parse_inline_tool_call(content))?;
    if call.id.is_none() {
        call.id = Some(uuid::Uuid::new_v4().to_string());
    }
    Some(call)
}

fn parse_fenced_tool_call(content: &str) -> Option<ToolCall> {
    let start = content.find(TOOL_BLOCK_OPEN)?;
    let body = &content[start + TOOL_BLOCK_OPEN.len()..];
    let end = body.find(TOOL_BLOCK_CLOSE)?;
    serde_json::from_str(body[..end].trim()).ok()
}

fn parse_inline_tool_call(content: &str) -> Option<ToolCall> {
    let names_tool = content.contains(r#""tool""#)
        || (content.contains(r#""name""#) && content.contains(r#""arguments""#));
    if !names_tool {
        return None;
    }

    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end <= start {
        return None;
    }

    serde_json::from_str(&content[start..=end]).ok()
}

/// Builder for [`Agent`]
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: ToolRegistry::new(),
            config: AgentConfig::default(),
        }
    }

    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    #[must_use]
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    #[must_use]
    pub const fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    #[must_use]
    pub const fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        if self.config.max_iterations == 0 {
            return Err(AgentError::Config("max_iterations must be at least 1".into()));
        }

        Ok(Agent::new(provider, Arc::new(self.tools), self.config))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::error::CapabilityErrorKind;
    use crate::message::Role;
    use crate::provider::ScriptedProvider;
    use crate::tool::{ParameterSchema, ToolSchema};

    struct LookupTool;

    #[async_trait]
    impl Tool for LookupTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "lookup".into(),
                description: "Look up a key".into(),
                parameters: vec![ParameterSchema::required("key", "string", "Key")],
                category: None,
            }
        }

        async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
            match call.str_arg("key") {
                Some("missing") => Err(AgentError::capability(
                    CapabilityErrorKind::ResourceMissing,
                    "No such key: 'missing'",
                )),
                Some(key) => Ok(ToolResult::success("lookup", format!("value-of-{key}"))
                    .with_data(json!({ "key": key }))),
                None => Err(AgentError::ToolValidation("key".into())),
            }
        }
    }

    fn agent(replies: Vec<&str>) -> (Agent, Arc<ScriptedProvider>) {
        let provider = Arc::new(ScriptedProvider::new(replies));
        let agent = Agent::builder()
            .provider(provider.clone())
            .tool(LookupTool)
            .max_iterations(4)
            .build()
            .unwrap();
        (agent, provider)
    }

    #[test]
    fn test_parses_fenced_block() {
        let content = "Let me check.\n```tool\n{\"tool\": \"lookup\", \"arguments\": {\"key\": \"a\"}}\n```";
        let call = parse_tool_call(content).unwrap();
        assert_eq!(call.name, "lookup");
        assert_eq!(call.str_arg("key"), Some("a"));
        assert!(call.id.is_some());
    }

    #[test]
    fn test_parses_inline_json_and_ignores_prose() {
        let call = parse_tool_call(r#"{"tool": "lookup", "arguments": {"key": "b"}}"#).unwrap();
        assert_eq!(call.str_arg("key"), Some("b"));
        assert!(parse_tool_call("Here is your link: https://checkout.stripe.com/c/pay/x").is_none());
    }

    #[test]
    fn test_parses_inline_json_with_name_key() {
        let call = parse_tool_call(r#"{"name": "lookup", "arguments": {"key": "c"}}"#).unwrap();
        assert_eq!(call.name, "lookup");
        assert_eq!(call.str_arg("key"), Some("c"));

        // a record echoed back to the user is not a call
        assert!(parse_tool_call(r#"Created {"id": "prod_1", "name": "Test"}"#).is_none());
    }

    #[tokio::test]
    async fn test_inline_name_call_is_executed() {
        let (agent, provider) = agent(vec![
            r#"{"name": "lookup", "arguments": {"key": "d"}}"#,
            "The value is value-of-d.",
        ]);

        assert_eq!(agent.ask("what is d?").await.unwrap(), "The value is value-of-d.");
        let requests = provider.requests().await;
        assert_eq!(requests.len(), 2);
        assert!(requests[1].last().unwrap().content.contains("value-of-d"));
    }

    #[tokio::test]
    async fn test_tool_result_fed_back_before_answer() {
        let (agent, provider) = agent(vec![
            r#"```tool
{"tool": "lookup", "arguments": {"key": "a"}}
```"#,
            "The value is value-of-a.",
        ]);

        let answer = agent.ask("what is a?").await.unwrap();
        assert_eq!(answer, "The value is value-of-a.");

        let requests = provider.requests().await;
        assert_eq!(requests.len(), 2);
        let fed_back = requests[1].last().unwrap();
        assert_eq!(fed_back.role, Role::Tool);
        assert!(fed_back.content.contains("value-of-a"));
        assert!(requests[0][0].content.contains("### lookup"));
    }

    #[tokio::test]
    async fn test_unknown_tool_reported_to_model() {
        let (agent, provider) = agent(vec![
            r#"{"tool": "nope", "arguments": {}}"#,
            "Sorry, I cannot do that.",
        ]);

        assert_eq!(agent.ask("go").await.unwrap(), "Sorry, I cannot do that.");
        let requests = provider.requests().await;
        assert!(requests[1].last().unwrap().content.contains("Tool not found: nope"));
    }

    #[tokio::test]
    async fn test_capability_error_aborts_run() {
        let (agent, provider) = agent(vec![
            r#"{"tool": "lookup", "arguments": {"key": "missing"}}"#,
            "unreachable",
        ]);

        let err = agent.ask("go").await.unwrap_err();
        assert_eq!(err.capability_kind(), Some(CapabilityErrorKind::ResourceMissing));
        assert_eq!(provider.remaining().await, 1);
    }

    #[tokio::test]
    async fn test_loop_is_bounded() {
        let call = r#"{"tool": "lookup", "arguments": {"key": "a"}}"#;
        let (agent, _) = agent(vec![call; 5]);
        assert!(matches!(agent.ask("go").await, Err(AgentError::MaxIterations(4))));
    }

    #[test]
    fn test_builder_requires_provider() {
        assert!(matches!(AgentBuilder::new().build(), Err(AgentError::Config(_))));
    }
}
