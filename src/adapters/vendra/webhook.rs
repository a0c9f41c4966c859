//! Vendra webhook payload types and token verification.
//!
//! Vendra authenticates webhooks with a static shared token carried either
//! in the payload (`webhook_token`) or in a request header. No signature
//! scheme; the comparison is constant-time to avoid leaking the token
//! byte-by-byte.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::domain::billing::BillingError;

/// Header carrying the shared webhook token when not in the body.
pub const WEBHOOK_TOKEN_HEADER: &str = "x-vendra-token";

/// Webhook event types Vendra delivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VendraEvent {
    OrderPaid,
    OrderRefused,
    OrderRefunded,
    SubscriptionStarted,
    SubscriptionRenewed,
    SubscriptionCancelled,
    Unknown(String),
}

impl VendraEvent {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "order.paid" => VendraEvent::OrderPaid,
            "order.refused" => VendraEvent::OrderRefused,
            "order.refunded" => VendraEvent::OrderRefunded,
            "subscription.started" => VendraEvent::SubscriptionStarted,
            "subscription.renewed" => VendraEvent::SubscriptionRenewed,
            "subscription.cancelled" => VendraEvent::SubscriptionCancelled,
            other => VendraEvent::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            VendraEvent::OrderPaid => "order.paid",
            VendraEvent::OrderRefused => "order.refused",
            VendraEvent::OrderRefunded => "order.refunded",
            VendraEvent::SubscriptionStarted => "subscription.started",
            VendraEvent::SubscriptionRenewed => "subscription.renewed",
            VendraEvent::SubscriptionCancelled => "subscription.cancelled",
            VendraEvent::Unknown(s) => s,
        }
    }
}

/// Customer block of a webhook payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendraCustomer {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub cpf: Option<String>,
}

/// Payment block of a webhook payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendraPayment {
    pub method: String,
    pub status: String,
    pub amount: f64,
    #[serde(default)]
    pub installments: Option<u32>,
}

/// Subscription block, present on subscription.* events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendraSubscription {
    pub id: String,
    pub status: String,
    pub plan: String,
    #[serde(default)]
    pub next_charge_date: Option<String>,
}

/// Full webhook payload as Vendra posts it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendraWebhookPayload {
    pub event: String,
    pub order_id: String,
    pub order_ref: String,
    pub product_id: String,
    pub product_name: String,
    pub customer: VendraCustomer,
    pub payment: VendraPayment,
    #[serde(default)]
    pub subscription: Option<VendraSubscription>,
    pub created_at: String,
    /// Shared token, when Vendra is configured to send it in the body.
    #[serde(default)]
    pub webhook_token: Option<String>,
}

impl VendraWebhookPayload {
    pub fn event(&self) -> VendraEvent {
        VendraEvent::parse(&self.event)
    }
}

/// Verifies the shared webhook token from the body field or header value.
///
/// Constant-time comparison; mismatch or absence is an `Auth` error and
/// must short-circuit before any ledger mutation.
pub fn verify_webhook_token(
    expected: &SecretString,
    body_token: Option<&str>,
    header_token: Option<&str>,
) -> Result<(), BillingError> {
    let received = body_token
        .or(header_token)
        .ok_or_else(|| BillingError::auth("missing webhook token"))?;

    let expected = expected.expose_secret().as_bytes();
    if received.as_bytes().ct_eq(expected).unwrap_u8() != 1 {
        return Err(BillingError::auth("invalid webhook token"));
    }

    Ok(())
}
