//! PixFlow wire format and response normalization.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::billing::CardDetails;
use crate::ports::{CustomerInfo, PaymentIntent, PaymentRequest};

/// Payment creation payload in PixFlow's wire format.
#[derive(Debug, Serialize)]
pub(super) struct CreatePaymentPayload {
    pub amount: f64,
    pub description: String,
    pub customer: CustomerInfo,
    pub payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<CardWire>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl CreatePaymentPayload {
    pub fn from_request(request: PaymentRequest) -> Self {
        Self {
            amount: request.amount,
            description: request.description,
            customer: request.customer,
            payment_method: request.payment_method,
            card: request.card.map(CardWire::from),
            metadata: request.metadata,
        }
    }
}

/// Card fields as PixFlow expects them.
#[derive(Serialize)]
pub(super) struct CardWire {
    pub number: String,
    pub holder_name: String,
    pub expiry_date: String,
    pub cvv: String,
}

impl std::fmt::Debug for CardWire {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CardWire {{ number: \"<redacted>\", .. }}")
    }
}

impl From<CardDetails> for CardWire {
    fn from(card: CardDetails) -> Self {
        Self {
            number: card.number,
            holder_name: card.holder_name,
            expiry_date: card.expiry_date,
            cvv: card.cvv,
        }
    }
}

/// Raw PixFlow payment response before normalization.
///
/// PixFlow is inconsistent about which QR/PIX field it populates depending
/// on endpoint and API revision, hence the paired fallbacks.
#[derive(Debug, Deserialize)]
pub(super) struct PaymentResponse {
    pub id: String,
    pub status: String,
    pub payment_url: Option<String>,
    pub qr_code: Option<String>,
    pub qr_code_url: Option<String>,
    pub pix_code: Option<String>,
    pub pix_copy_paste: Option<String>,
    pub amount: Option<f64>,
    pub created_at: Option<String>,
    pub expires_at: Option<String>,
}

impl PaymentResponse {
    /// Collapses the field aliases into the canonical intent shape.
    ///
    /// `qr_code` falls back to `qr_code_url` and `pix_code` falls back to
    /// `pix_copy_paste`. Applied identically on create and on status fetch
    /// so callers never branch on which alias the provider populated.
    pub fn normalize(self) -> PaymentIntent {
        PaymentIntent {
            id: self.id,
            status: self.status,
            payment_url: self.payment_url,
            qr_code: self.qr_code.or(self.qr_code_url),
            pix_code: self.pix_code.or(self.pix_copy_paste),
            amount: self.amount,
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }
}

/// Error body shape PixFlow returns on non-2xx responses.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    pub message: Option<String>,
    pub error: Option<String>,
}

/// Extracts the provider's message from an error body, preferring the JSON
/// `message`/`error` fields and falling back to the raw text.
pub(super) fn upstream_message(body: &str, fallback: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.message.or(parsed.error) {
            return message;
        }
    }
    if body.trim().is_empty() {
        fallback.to_string()
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> PaymentResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn normalize_prefers_primary_fields() {
        let intent = response(
            r#"{"id":"pay_1","status":"pending","qr_code":"QR","qr_code_url":"QR_URL",
                "pix_code":"PIX","pix_copy_paste":"PIX_ALT"}"#,
        )
        .normalize();
        assert_eq!(intent.qr_code.as_deref(), Some("QR"));
        assert_eq!(intent.pix_code.as_deref(), Some("PIX"));
    }

    #[test]
    fn normalize_falls_back_to_aliases() {
        let intent = response(
            r#"{"id":"pay_1","status":"pending","qr_code_url":"QR_URL","pix_copy_paste":"PIX_ALT"}"#,
        )
        .normalize();
        assert_eq!(intent.qr_code.as_deref(), Some("QR_URL"));
        assert_eq!(intent.pix_code.as_deref(), Some("PIX_ALT"));
    }

    #[test]
    fn normalize_leaves_absent_fields_absent() {
        let intent = response(r#"{"id":"pay_1","status":"paid"}"#).normalize();
        assert!(intent.qr_code.is_none());
        assert!(intent.pix_code.is_none());
    }

    #[test]
    fn upstream_message_prefers_json_message() {
        assert_eq!(
            upstream_message(r#"{"message":"card declined"}"#, "fallback"),
            "card declined"
        );
        assert_eq!(
            upstream_message(r#"{"error":"invalid token"}"#, "fallback"),
            "invalid token"
        );
    }

    #[test]
    fn upstream_message_falls_back_to_raw_body() {
        assert_eq!(upstream_message("gateway exploded", "fallback"), "gateway exploded");
        assert_eq!(upstream_message("", "fallback"), "fallback");
        assert_eq!(upstream_message("{}", "fallback"), "{}");
    }

    #[test]
    fn card_wire_debug_never_prints_pan() {
        let wire = CardWire {
            number: "4111111111111111".to_string(),
            holder_name: "ANA".to_string(),
            expiry_date: "12/28".to_string(),
            cvv: "123".to_string(),
        };
        let printed = format!("{:?}", wire);
        assert!(!printed.contains("4111"));
        assert!(!printed.contains("123"));
    }
}
