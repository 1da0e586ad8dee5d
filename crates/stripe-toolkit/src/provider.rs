//! Payment Capability Provider
//!
//! The three remote operations the agent can chain. [`StripeClient`] talks
//! to Stripe; [`MockPaymentProvider`] keeps everything in memory.
//!
//! [`StripeClient`]: crate::client::StripeClient
//! [`MockPaymentProvider`]: crate::mock::MockPaymentProvider

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPrice {
    /// Product id the price belongs to
    pub product: String,
    /// Amount in the currency's minor unit (cents for USD)
    pub unit_amount: i64,
    /// Three-letter ISO code, lowercase
    pub currency: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub id: String,
    pub product: String,
    pub unit_amount: i64,
    pub currency: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPaymentLink {
    /// Price id to sell
    pub price: String,
    pub quantity: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLink {
    pub id: String,
    /// Shareable checkout URL
    pub url: String,
}

/// Remote payment operations (Strategy pattern)
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_product(&self, request: &NewProduct) -> Result<Product>;

    async fn create_price(&self, request: &NewPrice) -> Result<Price>;

    async fn create_payment_link(&self, request: &NewPaymentLink) -> Result<PaymentLink>;

    /// Provider name for logs
    fn name(&self) -> &str;
}
