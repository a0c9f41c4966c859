//! Vendra checkout platform adapter (webhook-style provider).
//!
//! Two halves: a REST client for the account API (products, orders, payment
//! links) implementing the `CheckoutProvider` port, and the webhook payload
//! types + token verification for the events Vendra pushes to us.

mod client;
mod webhook;

pub use client::VendraClient;
pub use webhook::{
    verify_webhook_token, VendraCustomer, VendraEvent, VendraPayment, VendraSubscription,
    VendraWebhookPayload, WEBHOOK_TOKEN_HEADER,
};
