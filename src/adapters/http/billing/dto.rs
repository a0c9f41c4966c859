//! HTTP DTOs for the billing endpoints.
//!
//! These types define the JSON request/response structure and are the
//! boundary between HTTP and the application layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::billing::{CardDetails, PaymentOutcome, PlanType};
use crate::ports::PaymentIntent;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Customer block of a payment creation request.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub document: Option<String>,
}

/// Card block of a payment creation request.
///
/// Holds raw card data in flight; `CardDetails` takes over immediately so
/// the redacting `Debug` applies everywhere past deserialization.
#[derive(Clone, Deserialize)]
pub struct CardRequest {
    pub number: String,
    pub holder_name: String,
    pub expiry_date: String,
    pub cvv: String,
}

impl From<CardRequest> for CardDetails {
    fn from(card: CardRequest) -> Self {
        CardDetails {
            number: card.number,
            holder_name: card.holder_name,
            expiry_date: card.expiry_date,
            cvv: card.cvv,
        }
    }
}

/// Request to create a payment.
#[derive(Clone, Deserialize)]
pub struct CreatePaymentRequest {
    pub amount: f64,
    #[serde(default)]
    pub description: Option<String>,
    pub customer: CustomerRequest,
    pub payment_method: String,
    #[serde(default)]
    pub card: Option<CardRequest>,
    /// Plan the purchase grants; defaults to monthly.
    #[serde(default)]
    pub plan_type: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// Request to create a hosted checkout link.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentLinkRequest {
    pub product_id: String,
    /// Extra fields forwarded to the provider (offer codes, redirect URLs).
    #[serde(default)]
    pub extra: Option<Value>,
}

/// Query for a payment status check.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentStatusQuery {
    #[serde(alias = "paymentId")]
    pub payment_id: String,
}

/// Query for an entitlement check.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionCheckQuery {
    pub email: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Response for payment creation and status checks.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentResponse {
    pub success: bool,
    pub outcome: PaymentOutcome,
    pub payment: PaymentIntent,
}

/// Response for webhook deliveries.
///
/// Vendra only looks at the status code, but the body reports whether the
/// event actually took effect.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Response for the entitlement check.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionCheckResponse {
    pub success: bool,
    pub has_active_subscription: bool,
    /// False when the lookup itself failed and no-access is a safe default.
    pub checked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_type: Option<PlanType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

/// Standard error body.
///
/// The message travels under the `error` key, which is what API clients
/// parse on non-2xx responses.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    #[serde(rename = "error")]
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
