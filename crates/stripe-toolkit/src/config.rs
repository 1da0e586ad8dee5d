//! Toolkit Configuration
//!
//! The secret key and the capability declaration (which actions the agent
//! may perform). Both are fixed at startup.

use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{PaymentError, Result};

/// Enabled operations within one action group
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActionPermissions {
    pub create: bool,
}

impl ActionPermissions {
    pub const CREATE: Self = Self { create: true };
}

/// Capability declaration: action group -> enabled operations.
///
/// Groups missing from a declaration file are disabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Actions {
    #[serde(default)]
    pub payment_links: ActionPermissions,
    #[serde(default)]
    pub products: ActionPermissions,
    #[serde(default)]
    pub prices: ActionPermissions,
}

impl Default for Actions {
    /// Everything needed to go from a product name to a payment link
    fn default() -> Self {
        Self {
            payment_links: ActionPermissions::CREATE,
            products: ActionPermissions::CREATE,
            prices: ActionPermissions::CREATE,
        }
    }
}

impl Actions {
    pub const fn none() -> Self {
        Self {
            payment_links: ActionPermissions { create: false },
            products: ActionPermissions { create: false },
            prices: ActionPermissions { create: false },
        }
    }

    /// `group.operation` names of every enabled action
    pub fn enabled(&self) -> Vec<&'static str> {
        [
            (self.products.create, "products.create"),
            (self.prices.create, "prices.create"),
            (self.payment_links.create, "payment_links.create"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DeclarationFile {
    actions: Actions,
}

/// Parse a TOML declaration with an `[actions.*]` table per group
pub fn parse_actions(source: &str) -> Result<Actions> {
    toml::from_str::<DeclarationFile>(source)
        .map(|file| file.actions)
        .map_err(|e| PaymentError::Config(format!("invalid capability declaration: {e}")))
}

pub fn load_actions(path: impl AsRef<Path>) -> Result<Actions> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)
        .map_err(|e| PaymentError::Config(format!("cannot read {}: {e}", path.display())))?;
    parse_actions(&source)
}

/// Secret key plus capability declaration
#[derive(Clone, Debug)]
pub struct ToolkitConfig {
    secret_key: SecretString,
    pub actions: Actions,
}

impl ToolkitConfig {
    /// Validates the key shape: secret (`sk_`) or restricted (`rk_`) key
    pub fn new(secret_key: impl Into<String>, actions: Actions) -> Result<Self> {
        let secret_key = secret_key.into();
        let trimmed = secret_key.trim();
        if trimmed.is_empty() {
            return Err(PaymentError::Config("STRIPE_SECRET_KEY is empty".into()));
        }
        if !(trimmed.starts_with("sk_") || trimmed.starts_with("rk_")) {
            return Err(PaymentError::Config(
                "STRIPE_SECRET_KEY must be a secret (sk_) or restricted (rk_) key".into(),
            ));
        }
        Ok(Self {
            secret_key: SecretString::from(trimmed.to_owned()),
            actions,
        })
    }

    /// `STRIPE_SECRET_KEY` (required) and `STRIPE_AGENT_CONFIG` (optional
    /// declaration file)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let secret_key = var("STRIPE_SECRET_KEY")
            .ok_or_else(|| PaymentError::Config("STRIPE_SECRET_KEY not set".into()))?;
        let actions = match var("STRIPE_AGENT_CONFIG") {
            Some(path) => load_actions(path)?,
            None => Actions::default(),
        };
        Self::new(secret_key, actions)
    }

    pub fn secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }

    pub fn is_test_mode(&self) -> bool {
        self.secret_key().contains("_test_")
    }
}
