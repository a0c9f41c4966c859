//! HTTP surface for payments, webhooks, and entitlement checks.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::BillingAppState;
pub use routes::billing_router;
