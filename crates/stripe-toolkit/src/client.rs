//! Stripe Client
//!
//! `PaymentProvider` backed by the Stripe API through `async-stripe`.

use async_trait::async_trait;
use stripe::{
    Client, CreatePaymentLink, CreatePaymentLinkLineItems, CreatePrice, CreateProduct, Currency,
    IdOrCreate, PaymentLink as StripePaymentLink, Price as StripePrice,
    Product as StripeProduct,
};

use crate::config::ToolkitConfig;
use crate::error::{PaymentError, Result};
use crate::provider::{
    NewPaymentLink, NewPrice, NewProduct, PaymentLink, PaymentProvider, Price, Product,
};

/// Stripe client wrapper
pub struct StripeClient {
    client: Client,
    test_mode: bool,
}

impl StripeClient {
    pub fn new(config: &ToolkitConfig) -> Self {
        Self {
            client: Client::new(config.secret_key()),
            test_mode: config.is_test_mode(),
        }
    }

    pub const fn is_test_mode(&self) -> bool {
        self.test_mode
    }
}

/// ISO code to Stripe's currency enum
pub fn parse_currency(code: &str) -> Result<Currency> {
    let code = code.trim().to_ascii_lowercase();
    serde_json::from_value(serde_json::Value::String(code.clone()))
        .map_err(|_| PaymentError::invalid_request(format!("Unsupported currency: '{code}'")))
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_product(&self, request: &NewProduct) -> Result<Product> {
        let mut params = CreateProduct::new(&request.name);
        params.description = request.description.as_deref();

        let product = StripeProduct::create(&self.client, params).await?;
        tracing::info!(product = %product.id, "Stripe product created");

        Ok(Product {
            id: product.id.to_string(),
            name: request.name.clone(),
        })
    }

    async fn create_price(&self, request: &NewPrice) -> Result<Price> {
        let currency = parse_currency(&request.currency)?;

        let mut params = CreatePrice::new(currency);
        params.product = Some(IdOrCreate::Id(&request.product));
        params.unit_amount = Some(request.unit_amount);

        let price = StripePrice::create(&self.client, params).await?;
        tracing::info!(price = %price.id, product = %request.product, "Stripe price created");

        Ok(Price {
            id: price.id.to_string(),
            product: request.product.clone(),
            unit_amount: request.unit_amount,
            currency: request.currency.to_ascii_lowercase(),
        })
    }

    async fn create_payment_link(&self, request: &NewPaymentLink) -> Result<PaymentLink> {
        let params = CreatePaymentLink::new(vec![CreatePaymentLinkLineItems {
            price: request.price.clone(),
            quantity: request.quantity,
            ..Default::default()
        }]);

        let link = StripePaymentLink::create(&self.client, params).await?;
        tracing::info!(payment_link = %link.id, price = %request.price, "Stripe payment link created");

        Ok(PaymentLink {
            id: link.id.to_string(),
            url: link.url,
        })
    }

    fn name(&self) -> &str {
        if self.test_mode { "stripe (test mode)" } else { "stripe" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Actions;

    #[test]
    fn test_currency_codes_are_case_insensitive() {
        assert!(matches!(parse_currency("USD"), Ok(Currency::USD)));
        assert!(matches!(parse_currency(" eur "), Ok(Currency::EUR)));
    }

    #[test]
    fn test_unknown_currency_is_invalid_request() {
        let err = parse_currency("zzz").unwrap_err();
        assert_eq!(
            err.kind(),
            Some(agent_core::CapabilityErrorKind::InvalidRequest)
        );
    }

    #[test]
    fn test_mode_follows_key() {
        let config = ToolkitConfig::new("sk_test_123", Actions::default()).unwrap();
        let client = StripeClient::new(&config);
        assert!(client.is_test_mode());
        assert_eq!(client.name(), "stripe (test mode)");
    }
}
