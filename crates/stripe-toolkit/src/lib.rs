//! # stripe-toolkit
//!
//! Stripe payment capabilities for the agent: create a product, price it,
//! and sell it through a payment link.
//!
//! ## Payment-link chain
//!
//! ```text
//! ┌────────────────┐  product id  ┌──────────────┐  price id  ┌─────────────────────┐
//! │ create_product │─────────────▶│ create_price │───────────▶│ create_payment_link │──▶ URL
//! └────────────────┘              └──────────────┘            └─────────────────────┘
//! ```
//!
//! Each step needs the id returned by the previous one. The order is only
//! enforced by the instructions given to the model; a call made out of
//! order fails with a `ResourceMissing` capability error and the turn
//! ends with [`ORDERING_HINT`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stripe_toolkit::{StripeAgentToolkit, ONE_SHOT_ASSIGNMENT, extract_link};
//!
//! let toolkit = StripeAgentToolkit::from_env()?;
//! let orchestrator = toolkit.orchestrator(llm, "gpt-4o-mini")?;
//!
//! let turn = orchestrator.run_once(ONE_SHOT_ASSIGNMENT).await?;
//! if let Some(url) = extract_link(turn.content()) {
//!     println!("{url}");
//! }
//! ```

pub mod client;
pub mod config;
mod error;
pub mod link;
pub mod mock;
pub mod provider;
mod toolkit;
pub mod tools;

pub use client::StripeClient;
pub use config::{ActionPermissions, Actions, ToolkitConfig};
pub use error::{PaymentError, Result, classify};
pub use link::{extract_link, qr_data_url, render_qr};
pub use mock::MockPaymentProvider;
pub use provider::{
    NewPaymentLink, NewPrice, NewProduct, PaymentLink, PaymentProvider, Price, Product,
};
pub use toolkit::StripeAgentToolkit;
pub use tools::{CreatePaymentLinkTool, CreatePriceTool, CreateProductTool};

/// General instructions for a Stripe-integrated agent
pub const BASE_INSTRUCTIONS: &str = "Integrate with Stripe effectively to support business needs.";

/// Base instructions plus the product -> price -> link ordering policy
pub const PAYMENT_LINK_INSTRUCTIONS: &str = "Integrate with Stripe effectively to support \
business needs.

To create a payment link, always work in this order:
1. Call create_product and note the product id it returns.
2. Call create_price with that product id. Amounts are integers in the \
currency's smallest unit, so $100 is unit_amount 10000.
3. Call create_payment_link with the price id returned in step 2.
4. Reply with the complete payment link URL exactly as returned.

Never invent ids; only use ids returned by earlier tool calls.";

/// The fixed assignment of the one-shot CLI
pub const ONE_SHOT_ASSIGNMENT: &str =
    r#"Create a payment link for a new product called "Test" with a price of $100."#;

/// Appended to error turns caused by a missing product or price
pub const ORDERING_HINT: &str = "Try again, creating the product first, then a price for \
that product, then the payment link for that price.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_link_instructions_extend_base() {
        assert!(PAYMENT_LINK_INSTRUCTIONS.starts_with(BASE_INSTRUCTIONS));
        let product = PAYMENT_LINK_INSTRUCTIONS.find("create_product").unwrap();
        let price = PAYMENT_LINK_INSTRUCTIONS.find("create_price").unwrap();
        let link = PAYMENT_LINK_INSTRUCTIONS.find("create_payment_link").unwrap();
        assert!(product < price && price < link);
    }
}
