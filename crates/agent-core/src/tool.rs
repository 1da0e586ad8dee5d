//! Tool System
//!
//! Capabilities the agent can invoke. Tools are registered once at startup
//! and dispatched by name from the reasoning loop (or from an MCP server).

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AgentError, Result};

/// Tool call request from the LLM
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool identifier
    #[serde(rename = "tool", alias = "name")]
    pub name: String,

    #[serde(default)]
    pub arguments: HashMap<String, Value>,

    /// Optional call ID for tracking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: HashMap<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
            id: None,
        }
    }

    /// String argument, trimmed; `None` when absent, not a string, or blank
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.arguments
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Integer argument; accepts JSON integers and integral strings
    pub fn int_arg(&self, key: &str) -> Option<i64> {
        match self.arguments.get(key)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Result from tool execution
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool that was called
    pub name: String,

    /// Call ID (if provided in request)
    pub id: Option<String>,

    pub success: bool,

    /// Output (success message or error)
    pub output: String,

    /// Structured data (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ToolResult {
    pub fn success(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: true,
            output: output.into(),
            data: None,
        }
    }

    pub fn failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: false,
            output: error.into(),
            data: None,
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Text fed back to the model: output followed by the structured data
    pub fn render(&self) -> String {
        match &self.data {
            Some(data) => format!("{}\n{}", self.output, data),
            None => self.output.clone(),
        }
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    pub name: String,

    /// JSON Schema type (string, integer, number, boolean)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description (shown to the LLM)
    pub description: String,

    #[serde(default)]
    pub required: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParameterSchema {
    pub fn required(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: true,
            default: None,
        }
    }

    pub fn optional(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
        default: Option<Value>,
    ) -> Self {
        Self {
            required: false,
            default,
            ..Self::required(name, param_type, description)
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self.param_type.as_str() {
            "string" => value.is_string(),
            "integer" => {
                value.is_i64()
                    || value.is_u64()
                    || value.as_str().is_some_and(|s| s.trim().parse::<i64>().is_ok())
            }
            "number" => value.is_number(),
            "boolean" => value.is_boolean(),
            _ => true,
        }
    }
}

/// Tool definition schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    pub parameters: Vec<ParameterSchema>,

    /// Grouping key (e.g. the capability group a tool belongs to)
    #[serde(default)]
    pub category: Option<String>,
}

impl ToolSchema {
    /// JSON Schema object describing the tool's arguments
    pub fn input_schema(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| {
                let mut prop = json!({ "type": p.param_type, "description": p.description });
                if let Some(default) = &p.default {
                    prop["default"] = default.clone();
                }
                (p.name.clone(), prop)
            })
            .collect();
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's schema
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments.
    ///
    /// Backend failures should come back as [`AgentError::Capability`];
    /// anything else is reported to the model as a failed tool call.
    async fn execute(&self, call: &ToolCall) -> Result<ToolResult>;

    /// Validate arguments before execution: required parameters present,
    /// supplied values of the declared type
    fn validate(&self, call: &ToolCall) -> Result<()> {
        let schema = self.schema();

        for param in &schema.parameters {
            match call.arguments.get(&param.name) {
                None | Some(Value::Null) if param.required => {
                    return Err(AgentError::ToolValidation(format!(
                        "Missing required parameter: {}",
                        param.name
                    )));
                }
                Some(value) if !value.is_null() && !param.accepts(value) => {
                    return Err(AgentError::ToolValidation(format!(
                        "Parameter '{}' must be of type {}",
                        param.name, param.param_type
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }
}

/// Registry for available tools, ordered by name
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_shared(Arc::new(tool));
    }

    pub fn register_shared(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.schema().name;
        tracing::debug!(tool = %name, "Registered tool");
        self.tools.insert(name, tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Validate and execute a tool call
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| AgentError::ToolNotFound(call.name.clone()))?;

        tool.validate(call)?;
        tool.execute(call).await
    }

    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|t| t.schema()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// System prompt section describing the tool-call protocol and tools
    pub fn generate_prompt_section(&self) -> String {
        let mut prompt = String::from("## Available Tools\n\n");
        prompt.push_str("Call a tool by replying with only a JSON block in this exact format:\n\n");
        prompt.push_str(
            "```tool\n{\"tool\": \"tool_name\", \"arguments\": {\"arg\": \"value\"}}\n```\n\n",
        );
        prompt.push_str("Call one tool at a time and wait for its result.\n\n");

        for schema in self.schemas() {
            prompt.push_str(&format!("### {}\n{}\n", schema.name, schema.description));

            if !schema.parameters.is_empty() {
                prompt.push_str("**Parameters:**\n");
                for param in &schema.parameters {
                    let required = if param.required { " (required)" } else { "" };
                    prompt.push_str(&format!(
                        "- `{}` ({}){}: {}\n",
                        param.name, param.param_type, required, param.description
                    ));
                }
            }
            prompt.push('\n');
        }

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "echo".into(),
                description: "Repeat text".into(),
                parameters: vec![
                    ParameterSchema::required("text", "string", "Text to repeat"),
                    ParameterSchema::optional("times", "integer", "Repetitions", Some(json!(1))),
                ],
                category: None,
            }
        }

        async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
            let text = call.str_arg("text").unwrap_or_default();
            let times = usize::try_from(call.int_arg("times").unwrap_or(1)).unwrap_or(1);
            Ok(ToolResult::success("echo", text.repeat(times)))
        }
    }

    fn call(args: Value) -> ToolCall {
        serde_json::from_value(json!({ "tool": "echo", "arguments": args })).unwrap()
    }

    #[tokio::test]
    async fn test_registry_validates_then_executes() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        let ok = registry.execute(&call(json!({ "text": "ab", "times": "2" }))).await.unwrap();
        assert_eq!(ok.output, "abab");

        let missing = registry.execute(&call(json!({}))).await;
        assert!(matches!(missing, Err(AgentError::ToolValidation(_))));

        let wrong_type = registry.execute(&call(json!({ "text": 5 }))).await;
        assert!(matches!(wrong_type, Err(AgentError::ToolValidation(_))));

        let unknown = ToolCall::new("nope", HashMap::new());
        assert!(matches!(
            registry.execute(&unknown).await,
            Err(AgentError::ToolNotFound(_))
        ));
    }

    #[test]
    fn test_tool_call_accepts_name_alias() {
        let parsed: ToolCall =
            serde_json::from_str(r#"{"name": "echo", "arguments": {"text": "x"}}"#).unwrap();
        assert_eq!(parsed.name, "echo");
        assert_eq!(parsed.str_arg("text"), Some("x"));
    }

    #[test]
    fn test_input_schema_lists_required() {
        let schema = EchoTool.schema().input_schema();
        assert_eq!(schema["required"], json!(["text"]));
        assert_eq!(schema["properties"]["times"]["default"], json!(1));
    }

    #[test]
    fn test_prompt_section_mentions_every_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);
        let section = registry.generate_prompt_section();
        assert!(section.contains("### echo"));
        assert!(section.contains("`text` (string) (required)"));
    }
}
