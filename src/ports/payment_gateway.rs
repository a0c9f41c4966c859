//! Payment gateway port for the polling-style provider.
//!
//! The gateway creates payment intents and answers status fetches; it never
//! pushes events to us. The orchestrator (or the client, between requests)
//! drives the intent to a terminal state by polling.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::billing::{BillingError, CardDetails};

/// Port for the polling-style payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent.
    ///
    /// Card payments may capture synchronously (the returned intent is
    /// already approved); PIX payments come back pending with a QR code.
    async fn create_payment(&self, request: PaymentRequest) -> Result<PaymentIntent, BillingError>;

    /// Fetch the current state of an in-flight payment.
    async fn get_payment_status(&self, payment_id: &str) -> Result<PaymentIntent, BillingError>;

    /// Cancel an in-flight payment, returning its final state.
    async fn cancel_payment(&self, payment_id: &str) -> Result<PaymentIntent, BillingError>;
}

/// Customer identification sent with a payment request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    /// CPF/CNPJ, when the customer provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
}

/// Canonical payment request, translated by the adapter into the provider's
/// wire format.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub amount: f64,
    pub description: String,
    pub customer: CustomerInfo,
    /// "pix" or "credit_card".
    pub payment_method: String,
    pub card: Option<CardDetails>,
    pub metadata: Option<Value>,
}

/// An in-flight payment at the provider. Ephemeral: held in memory and
/// transit only, never persisted locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Provider-specific status string; classify before acting on it.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_url: Option<String>,
    /// QR code image, normalized from `qr_code`/`qr_code_url`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
    /// PIX copy-paste code, normalized from `pix_code`/`pix_copy_paste`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pix_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_gateway_is_object_safe() {
        fn _accepts_dyn(_gateway: &dyn PaymentGateway) {}
    }

    #[test]
    fn intent_serialization_omits_absent_fields() {
        let intent = PaymentIntent {
            id: "pay_1".to_string(),
            status: "pending".to_string(),
            payment_url: None,
            qr_code: Some("data:image/png;base64,...".to_string()),
            pix_code: None,
            amount: Some(29.90),
            created_at: None,
            expires_at: None,
        };
        let json = serde_json::to_value(&intent).unwrap();
        assert!(json.get("pix_code").is_none());
        assert_eq!(json["status"], "pending");
    }
}
