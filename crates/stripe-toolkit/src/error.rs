//! Payment Error Types

use agent_core::{AgentError, CapabilityErrorKind};
use stripe::{ErrorCode, StripeError};
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// A remote capability call failed
    #[error("{message}")]
    Capability {
        kind: CapabilityErrorKind,
        message: String,
    },

    /// Missing or malformed configuration (credentials, declaration file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The capability declaration does not enable this action
    #[error("Action not enabled: {0}")]
    ActionDisabled(String),

    /// QR image could not be produced
    #[error("QR rendering failed: {0}")]
    Render(String),
}

impl PaymentError {
    pub fn capability(kind: CapabilityErrorKind, message: impl Into<String>) -> Self {
        Self::Capability {
            kind,
            message: message.into(),
        }
    }

    pub fn resource_missing(message: impl Into<String>) -> Self {
        Self::capability(CapabilityErrorKind::ResourceMissing, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::capability(CapabilityErrorKind::InvalidRequest, message)
    }

    pub const fn kind(&self) -> Option<CapabilityErrorKind> {
        match self {
            Self::Capability { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Classify a Stripe client error into a capability kind
pub fn classify(err: &StripeError) -> CapabilityErrorKind {
    match err {
        StripeError::Stripe(request) => {
            if matches!(request.code, Some(ErrorCode::ResourceMissing)) {
                return CapabilityErrorKind::ResourceMissing;
            }
            match request.http_status {
                404 => CapabilityErrorKind::ResourceMissing,
                401 | 403 => CapabilityErrorKind::Authentication,
                429 => CapabilityErrorKind::RateLimited,
                400..=499 => CapabilityErrorKind::InvalidRequest,
                _ => CapabilityErrorKind::Api,
            }
        }
        _ => CapabilityErrorKind::Api,
    }
}

impl From<StripeError> for PaymentError {
    fn from(err: StripeError) -> Self {
        let kind = classify(&err);
        let message = match &err {
            StripeError::Stripe(request) => request
                .message
                .clone()
                .unwrap_or_else(|| format!("Stripe returned HTTP {}", request.http_status)),
            other => other.to_string(),
        };
        Self::Capability { kind, message }
    }
}

impl From<PaymentError> for AgentError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Capability { kind, message } => Self::Capability { kind, message },
            PaymentError::ActionDisabled(action) => {
                Self::ToolExecution(format!("action '{action}' is not enabled"))
            }
            PaymentError::Config(msg) => Self::Config(msg),
            PaymentError::Render(msg) => Self::Other(msg),
        }
    }
}
