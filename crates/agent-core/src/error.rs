//! Error Types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Closed classification of failures reported by a capability provider.
///
/// Tools translate their backend's errors into one of these kinds so callers
/// can react to a failure class without inspecting message text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityErrorKind {
    /// A referenced resource (product, price, ...) does not exist
    ResourceMissing,
    /// The request was rejected as malformed
    InvalidRequest,
    /// Credentials were refused
    Authentication,
    /// The provider throttled the request
    RateLimited,
    /// Any other provider-side failure
    Api,
}

impl std::fmt::Display for CapabilityErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ResourceMissing => "resource_missing",
            Self::InvalidRequest => "invalid_request",
            Self::Authentication => "authentication",
            Self::RateLimited => "rate_limited",
            Self::Api => "api",
        };
        f.write_str(name)
    }
}

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Tool not found in registry
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool arguments failed validation
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Tool execution failed for a reason other than the capability backend
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// A capability call (remote operation behind a tool) failed.
    /// Aborts the reasoning loop.
    #[error("{message}")]
    Capability {
        kind: CapabilityErrorKind,
        message: String,
    },

    /// Maximum iterations reached in reasoning loop
    #[error("Maximum iterations ({0}) reached")]
    MaxIterations(usize),

    /// Caller supplied unusable input (e.g. an empty utterance)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Parse error (e.g., provider response parsing)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limited by the LLM provider
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication with the LLM provider failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Build a capability error
    pub fn capability(kind: CapabilityErrorKind, message: impl Into<String>) -> Self {
        Self::Capability {
            kind,
            message: message.into(),
        }
    }

    /// Kind of the capability failure, if this is one
    pub const fn capability_kind(&self) -> Option<CapabilityErrorKind> {
        match self {
            Self::Capability { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(msg) => format!("The AI service encountered an error: {msg}"),
            Self::ProviderUnavailable(_) => {
                "The AI service is currently unavailable. Please try again.".into()
            }
            Self::Capability { message, .. } => format!("Payment service error: {message}"),
            Self::MaxIterations(_) => {
                "The request took too long to process. Please try a simpler request.".into()
            }
            Self::InvalidInput(msg) => msg.clone(),
            Self::RateLimited(_) => "Too many requests. Please wait a moment.".into(),
            Self::Auth(_) => "Authentication failed. Please check your credentials.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_error_displays_provider_message() {
        let err = AgentError::capability(
            CapabilityErrorKind::ResourceMissing,
            "No such price: 'price_123'",
        );
        assert_eq!(err.to_string(), "No such price: 'price_123'");
        assert_eq!(
            err.capability_kind(),
            Some(CapabilityErrorKind::ResourceMissing)
        );
        assert_eq!(err.user_message(), "Payment service error: No such price: 'price_123'");
    }

    #[test]
    fn test_capability_kind_only_on_capability_errors() {
        assert_eq!(
            AgentError::capability(CapabilityErrorKind::RateLimited, "slow down").capability_kind(),
            Some(CapabilityErrorKind::RateLimited)
        );
        assert_eq!(AgentError::RateLimited("429".into()).capability_kind(), None);
        assert_eq!(AgentError::ToolNotFound("x".into()).capability_kind(), None);
    }
}
