//! Payment Tools
//!
//! The agent-facing side of [`PaymentProvider`]: one tool per enabled
//! action. Names and parameters follow Stripe's agent toolkit so prompts
//! written for it work unchanged.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use agent_core::{
    AgentError, ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema,
};

use crate::provider::{NewPaymentLink, NewPrice, NewProduct, PaymentProvider};

pub const DEFAULT_CURRENCY: &str = "usd";

fn required_str<'a>(call: &'a ToolCall, key: &str) -> CoreResult<&'a str> {
    call.str_arg(key)
        .ok_or_else(|| AgentError::ToolValidation(format!("Missing required parameter: {key}")))
}

/// Creates a product in Stripe
pub struct CreateProductTool {
    provider: Arc<dyn PaymentProvider>,
}

impl CreateProductTool {
    pub fn new(provider: Arc<dyn PaymentProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for CreateProductTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "create_product".into(),
            description: "Create a product in Stripe. Returns the product id, which \
                          create_price needs."
                .into(),
            parameters: vec![
                ParameterSchema::required("name", "string", "The name of the product"),
                ParameterSchema::optional(
                    "description",
                    "string",
                    "The description of the product",
                    None,
                ),
            ],
            category: Some("products".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let request = NewProduct {
            name: required_str(call, "name")?.to_owned(),
            description: call.str_arg("description").map(str::to_owned),
        };

        let product = self.provider.create_product(&request).await?;

        Ok(
            ToolResult::success("create_product", format!("Created product {}", product.id))
                .with_data(json!(product)),
        )
    }
}

/// Creates a price for an existing product
pub struct CreatePriceTool {
    provider: Arc<dyn PaymentProvider>,
}

impl CreatePriceTool {
    pub fn new(provider: Arc<dyn PaymentProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for CreatePriceTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "create_price".into(),
            description: "Create a price in Stripe for an existing product. Returns the \
                          price id, which create_payment_link needs."
                .into(),
            parameters: vec![
                ParameterSchema::required(
                    "product",
                    "string",
                    "The id of the product to create the price for",
                ),
                ParameterSchema::required(
                    "unit_amount",
                    "integer",
                    "The unit amount of the price in the currency's smallest unit (cents)",
                ),
                ParameterSchema::optional(
                    "currency",
                    "string",
                    "Three-letter ISO currency code",
                    Some(json!(DEFAULT_CURRENCY)),
                ),
            ],
            category: Some("prices".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let unit_amount = call.int_arg("unit_amount").ok_or_else(|| {
            AgentError::ToolValidation("Parameter 'unit_amount' must be an integer".into())
        })?;

        let request = NewPrice {
            product: required_str(call, "product")?.to_owned(),
            unit_amount,
            currency: call
                .str_arg("currency")
                .unwrap_or(DEFAULT_CURRENCY)
                .to_ascii_lowercase(),
        };

        let price = self.provider.create_price(&request).await?;

        Ok(
            ToolResult::success("create_price", format!("Created price {}", price.id))
                .with_data(json!(price)),
        )
    }
}

/// Creates a shareable payment link for a price
pub struct CreatePaymentLinkTool {
    provider: Arc<dyn PaymentProvider>,
}

impl CreatePaymentLinkTool {
    pub fn new(provider: Arc<dyn PaymentProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for CreatePaymentLinkTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "create_payment_link".into(),
            description: "Create a payment link in Stripe for an existing price. Returns \
                          the checkout URL."
                .into(),
            parameters: vec![
                ParameterSchema::required(
                    "price",
                    "string",
                    "The id of the price to create the payment link for",
                ),
                ParameterSchema::optional(
                    "quantity",
                    "integer",
                    "The quantity of the product to include",
                    Some(json!(1)),
                ),
            ],
            category: Some("payment_links".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let quantity = match call.int_arg("quantity") {
            None => 1,
            Some(q) => u64::try_from(q).ok().filter(|q| *q > 0).ok_or_else(|| {
                AgentError::ToolValidation("Parameter 'quantity' must be at least 1".into())
            })?,
        };

        let request = NewPaymentLink {
            price: required_str(call, "price")?.to_owned(),
            quantity,
        };

        let link = self.provider.create_payment_link(&request).await?;

        Ok(
            ToolResult::success("create_payment_link", format!("Payment link: {}", link.url))
                .with_data(json!(link)),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use agent_core::{CapabilityErrorKind, ToolRegistry};
    use serde_json::Value;

    use super::*;
    use crate::mock::MockPaymentProvider;

    fn call(name: &str, args: Value) -> ToolCall {
        let arguments: HashMap<String, Value> = serde_json::from_value(args).unwrap();
        ToolCall::new(name, arguments)
    }

    fn registry(provider: Arc<dyn PaymentProvider>) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(CreateProductTool::new(provider.clone()));
        registry.register(CreatePriceTool::new(provider.clone()));
        registry.register(CreatePaymentLinkTool::new(provider));
        registry
    }

    #[tokio::test]
    async fn test_tools_chain_through_returned_ids() {
        let registry = registry(Arc::new(MockPaymentProvider::new()));

        let product = registry
            .execute(&call("create_product", json!({ "name": "Test" })))
            .await
            .unwrap();
        let product_id = product.data.unwrap()["id"].as_str().unwrap().to_owned();

        // integral strings are accepted for integer parameters
        let price = registry
            .execute(&call(
                "create_price",
                json!({ "product": product_id, "unit_amount": "10000" }),
            ))
            .await
            .unwrap();
        let data = price.data.unwrap();
        assert_eq!(data["currency"], "usd");
        assert_eq!(data["unit_amount"], 10_000);

        let link = registry
            .execute(&call("create_payment_link", json!({ "price": data["id"] })))
            .await
            .unwrap();
        assert!(link.output.contains("https://checkout.stripe.com/c/pay/plink_mock_1"));
    }

    #[tokio::test]
    async fn test_provider_failures_become_capability_errors() {
        let registry = registry(Arc::new(MockPaymentProvider::new()));

        let err = registry
            .execute(&call("create_payment_link", json!({ "price": "price_123" })))
            .await
            .unwrap_err();
        assert_eq!(err.capability_kind(), Some(CapabilityErrorKind::ResourceMissing));
        assert_eq!(err.to_string(), "No such price: 'price_123'");
    }

    #[tokio::test]
    async fn test_malformed_arguments_are_validation_errors() {
        let registry = registry(Arc::new(MockPaymentProvider::new()));

        let err = registry
            .execute(&call("create_price", json!({ "product": "prod_1", "unit_amount": "ten" })))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ToolValidation(_)));

        let err = registry
            .execute(&call("create_payment_link", json!({ "price": "p", "quantity": 0 })))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ToolValidation(_)));
    }

    #[test]
    fn test_categories_match_action_groups() {
        let provider: Arc<dyn PaymentProvider> = Arc::new(MockPaymentProvider::new());
        assert_eq!(
            CreatePaymentLinkTool::new(provider).schema().category.as_deref(),
            Some("payment_links")
        );
    }
}
