//! Stripe Agent Toolkit
//!
//! Binds a [`PaymentProvider`] to a capability declaration and hands out
//! the resulting tools, or a ready-to-use agent and orchestrator.

use std::sync::Arc;

use agent_core::{
    Agent, AgentBuilder, LlmProvider, Result as CoreResult, ToolRegistry, TurnOrchestrator,
};

use crate::client::StripeClient;
use crate::config::{Actions, ToolkitConfig};
use crate::error::Result;
use crate::mock::MockPaymentProvider;
use crate::provider::PaymentProvider;
use crate::tools::{CreatePaymentLinkTool, CreatePriceTool, CreateProductTool};
use crate::{ORDERING_HINT, PAYMENT_LINK_INSTRUCTIONS};

#[derive(Clone)]
pub struct StripeAgentToolkit {
    provider: Arc<dyn PaymentProvider>,
    actions: Actions,
}

impl StripeAgentToolkit {
    pub fn new(provider: Arc<dyn PaymentProvider>, actions: Actions) -> Self {
        Self { provider, actions }
    }

    /// Live Stripe toolkit from `STRIPE_SECRET_KEY` / `STRIPE_AGENT_CONFIG`
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_config(&ToolkitConfig::from_env()?))
    }

    pub fn from_config(config: &ToolkitConfig) -> Self {
        Self::new(Arc::new(StripeClient::new(config)), config.actions)
    }

    /// In-memory toolkit with every action enabled
    pub fn offline() -> Self {
        Self::new(Arc::new(MockPaymentProvider::new()), Actions::default())
    }

    pub fn provider(&self) -> &Arc<dyn PaymentProvider> {
        &self.provider
    }

    pub const fn actions(&self) -> &Actions {
        &self.actions
    }

    /// One tool per enabled action; disabled actions are not registered
    pub fn tools(&self) -> ToolRegistry {
        let mut registry = ToolRegistry::new();

        if self.actions.products.create {
            registry.register(CreateProductTool::new(self.provider.clone()));
        }
        if self.actions.prices.create {
            registry.register(CreatePriceTool::new(self.provider.clone()));
        }
        if self.actions.payment_links.create {
            registry.register(CreatePaymentLinkTool::new(self.provider.clone()));
        }

        tracing::info!(
            provider = self.provider.name(),
            tools = ?registry.names(),
            "Payment tools ready"
        );
        registry
    }

    /// Agent builder preloaded with the payment-link instructions and tools
    pub fn agent_builder(&self, llm: Arc<dyn LlmProvider>) -> AgentBuilder {
        Agent::builder()
            .name("stripe-agent")
            .provider(llm)
            .system_prompt(PAYMENT_LINK_INSTRUCTIONS)
            .tools(self.tools())
    }

    /// Orchestrator whose error turns carry the ordering hint
    pub fn orchestrator(&self, llm: Arc<dyn LlmProvider>, model: &str) -> CoreResult<TurnOrchestrator> {
        let agent = self.agent_builder(llm).model(model).build()?;
        Ok(TurnOrchestrator::new(Arc::new(agent)).with_recovery_hint(ORDERING_HINT))
    }
}
