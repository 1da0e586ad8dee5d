//! # agent-runtime
//!
//! LLM backends for the stripe-agent binaries.
//!
//! ## Providers
//!
//! - **OpenAI** (default): any OpenAI-compatible `/v1/chat/completions` API
//! - **Ollama**: local inference via an Ollama daemon
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::RuntimeConfig;
//!
//! let provider = RuntimeConfig::from_env()?.build_provider()?;
//! let agent = AgentBuilder::new().provider(provider).build()?;
//! ```

#[cfg(feature = "ollama")]
pub mod ollama;
#[cfg(feature = "openai")]
pub mod openai;

use std::str::FromStr;
use std::sync::Arc;

#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaProvider};
#[cfg(feature = "openai")]
pub use openai::{OpenAiConfig, OpenAiProvider};

pub use agent_core::{AgentError, LlmProvider, Result};

/// Which LLM backend to use
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Ollama,
}

impl ProviderKind {
    /// Model used when `LLM_MODEL` is not set
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => agent_core::provider::DEFAULT_MODEL,
            Self::Ollama => "llama3.2",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(AgentError::Config(format!(
                "unknown LLM provider '{other}' (expected 'openai' or 'ollama')"
            ))),
        }
    }
}

/// Backend selection, read from the environment
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub provider: ProviderKind,
    pub model: String,
}

impl RuntimeConfig {
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            model: provider.default_model().into(),
        }
    }

    /// `LLM_PROVIDER` (default `openai`) and `LLM_MODEL`
    pub fn from_env() -> Result<Self> {
        let provider = match std::env::var("LLM_PROVIDER") {
            Ok(value) => value.parse()?,
            Err(_) => ProviderKind::OpenAi,
        };
        let mut config = Self::new(provider);
        if let Ok(model) = std::env::var("LLM_MODEL") {
            config.model = model;
        }
        Ok(config)
    }

    /// Instantiate the selected provider. Fails when its credentials are
    /// missing or its feature was compiled out.
    pub fn build_provider(&self) -> Result<Arc<dyn LlmProvider>> {
        match self.provider {
            #[cfg(feature = "openai")]
            ProviderKind::OpenAi => Ok(Arc::new(OpenAiProvider::from_env()?)),
            #[cfg(feature = "ollama")]
            ProviderKind::Ollama => Ok(Arc::new(OllamaProvider::from_env())),
            #[allow(unreachable_patterns)]
            other => Err(AgentError::Config(format!(
                "provider {other:?} not compiled in"
            ))),
        }
    }
}
