//! Checkout provider port for the webhook-style provider.
//!
//! Read operations against the provider's account API. Payment completion
//! arrives out-of-band through webhook events, not through this port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::billing::BillingError;

/// Port for the webhook-style checkout platform.
#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    /// List the account's products.
    async fn list_products(&self) -> Result<Vec<Product>, BillingError>;

    /// Fetch a single product.
    async fn get_product(&self, product_id: &str) -> Result<Product, BillingError>;

    /// List orders, optionally filtered.
    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<ProviderOrder>, BillingError>;

    /// Create a hosted checkout link for a product.
    async fn create_payment_link(
        &self,
        product_id: &str,
        extra: Option<Value>,
    ) -> Result<PaymentLink, BillingError>;
}

/// A product in the provider's catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An order/sale on the provider side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderOrder {
    pub id: String,
    pub product_id: String,
    pub customer_email: String,
    pub customer_name: String,
    pub amount: f64,
    pub status: String,
    pub created_at: String,
}

/// Filter for order listings.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<u32>,
}

/// A hosted checkout URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentLink {
    pub payment_url: String,
}
