//! # agent-mcp
//!
//! Serves the enabled payment tools to any MCP client (Claude Desktop, IDE
//! agents, ...) so the client's own model drives the product -> price ->
//! payment link chain.

use std::sync::Arc;

use rmcp::{
    ServerHandler, ServiceExt,
    model::{
        CallToolRequestParam, CallToolResult, Content, ErrorData, JsonObject, ListToolsResult,
        PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool,
    },
    service::{RequestContext, RoleServer},
};

use agent_core::{AgentError, CapabilityErrorKind, ToolCall, ToolRegistry};
use stripe_toolkit::{ORDERING_HINT, PAYMENT_LINK_INSTRUCTIONS, StripeAgentToolkit};

/// MCP descriptors for every registered tool
pub fn tool_descriptors(registry: &ToolRegistry) -> Vec<Tool> {
    registry
        .schemas()
        .into_iter()
        .map(|schema| {
            let input_schema = match schema.input_schema() {
                serde_json::Value::Object(map) => map,
                _ => JsonObject::new(),
            };
            Tool::new(schema.name, schema.description, Arc::new(input_schema))
        })
        .collect()
}

#[derive(Clone)]
pub struct StripeMcpServer {
    tools: Arc<ToolRegistry>,
}

impl StripeMcpServer {
    pub fn new(toolkit: &StripeAgentToolkit) -> Self {
        Self {
            tools: Arc::new(toolkit.tools()),
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run one tool. `Err` carries the text reported back as a tool error.
    pub async fn execute(&self, name: &str, arguments: Option<JsonObject>) -> Result<String, String> {
        let call = ToolCall::new(name, arguments.unwrap_or_default().into_iter().collect());

        match self.tools.execute(&call).await {
            Ok(result) if result.success => Ok(result.render()),
            Ok(result) => Err(result.render()),
            Err(err) => {
                tracing::warn!(tool = name, error = %err, "Tool call failed");
                Err(describe_error(&err))
            }
        }
    }

    /// Serve over stdin/stdout until the client disconnects
    pub async fn run_stdio(self) -> anyhow::Result<()> {
        use tokio::io::{stdin, stdout};

        tracing::info!(tools = ?self.tools.names(), "Starting MCP server on stdio");
        let service = self.serve((stdin(), stdout())).await?;
        service.waiting().await?;
        tracing::info!("MCP server shut down");
        Ok(())
    }
}

fn describe_error(err: &AgentError) -> String {
    match err.capability_kind() {
        Some(CapabilityErrorKind::ResourceMissing) => format!("{err}\n\n{ORDERING_HINT}"),
        _ => err.to_string(),
    }
}

impl ServerHandler for StripeMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(PAYMENT_LINK_INSTRUCTIONS.into()),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(tool_descriptors(&self.tools)))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        if self.tools.get(&request.name).is_none() {
            return Err(ErrorData::invalid_params(
                format!("unknown tool: {}", request.name),
                None,
            ));
        }

        Ok(match self.execute(&request.name, request.arguments).await {
            Ok(text) => CallToolResult::success(vec![Content::text(text)]),
            Err(text) => CallToolResult::error(vec![Content::text(text)]),
        })
    }
}
