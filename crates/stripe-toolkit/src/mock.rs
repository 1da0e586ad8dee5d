//! Mock Payment Provider
//!
//! In-memory stand-in for Stripe, for tests and offline demos. Ids are
//! sequential and references are checked the way Stripe checks them.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{PaymentError, Result};
use crate::provider::{
    NewPaymentLink, NewPrice, NewProduct, PaymentLink, PaymentProvider, Price, Product,
};

pub const MOCK_CHECKOUT_BASE: &str = "https://checkout.stripe.com/c/pay";

#[derive(Default)]
struct Ledger {
    products: HashMap<String, Product>,
    prices: HashMap<String, Price>,
    links: Vec<PaymentLink>,
    next_product: u64,
    next_price: u64,
    next_link: u64,
}

#[derive(Default)]
pub struct MockPaymentProvider {
    ledger: Mutex<Ledger>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn products(&self) -> Vec<Product> {
        let ledger = self.ledger.lock().await;
        let mut products: Vec<_> = ledger.products.values().cloned().collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));
        products
    }

    pub async fn prices(&self) -> Vec<Price> {
        let ledger = self.ledger.lock().await;
        let mut prices: Vec<_> = ledger.prices.values().cloned().collect();
        prices.sort_by(|a, b| a.id.cmp(&b.id));
        prices
    }

    /// Links in creation order
    pub async fn links(&self) -> Vec<PaymentLink> {
        self.ledger.lock().await.links.clone()
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_product(&self, request: &NewProduct) -> Result<Product> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(PaymentError::invalid_request("Missing required param: name."));
        }

        let mut ledger = self.ledger.lock().await;
        ledger.next_product += 1;
        let product = Product {
            id: format!("prod_mock_{}", ledger.next_product),
            name: name.to_owned(),
        };
        ledger.products.insert(product.id.clone(), product.clone());

        tracing::debug!(product = %product.id, "Mock product created");
        Ok(product)
    }

    async fn create_price(&self, request: &NewPrice) -> Result<Price> {
        if request.unit_amount <= 0 {
            return Err(PaymentError::invalid_request(format!(
                "Invalid unit_amount: must be a positive integer, got {}",
                request.unit_amount
            )));
        }

        let mut ledger = self.ledger.lock().await;
        if !ledger.products.contains_key(&request.product) {
            return Err(PaymentError::resource_missing(format!(
                "No such product: '{}'",
                request.product
            )));
        }

        ledger.next_price += 1;
        let price = Price {
            id: format!("price_mock_{}", ledger.next_price),
            product: request.product.clone(),
            unit_amount: request.unit_amount,
            currency: request.currency.to_ascii_lowercase(),
        };
        ledger.prices.insert(price.id.clone(), price.clone());

        tracing::debug!(price = %price.id, product = %price.product, "Mock price created");
        Ok(price)
    }

    async fn create_payment_link(&self, request: &NewPaymentLink) -> Result<PaymentLink> {
        if request.quantity == 0 {
            return Err(PaymentError::invalid_request(
                "Invalid quantity: must be at least 1",
            ));
        }

        let mut ledger = self.ledger.lock().await;
        if !ledger.prices.contains_key(&request.price) {
            return Err(PaymentError::resource_missing(format!(
                "No such price: '{}'",
                request.price
            )));
        }

        ledger.next_link += 1;
        let id = format!("plink_mock_{}", ledger.next_link);
        let link = PaymentLink {
            url: format!("{MOCK_CHECKOUT_BASE}/{id}"),
            id,
        };
        ledger.links.push(link.clone());

        tracing::debug!(payment_link = %link.id, "Mock payment link created");
        Ok(link)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
