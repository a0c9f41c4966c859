//! PixFlow REST client implementing the `PaymentGateway` port.

use async_trait::async_trait;
use secrecy::ExposeSecret;

use crate::config::PixflowConfig;
use crate::domain::billing::BillingError;
use crate::ports::{PaymentGateway, PaymentIntent, PaymentRequest};

use super::wire::{upstream_message, CreatePaymentPayload, PaymentResponse};

/// PixFlow payment gateway adapter.
pub struct PixflowGateway {
    config: PixflowConfig,
    http_client: reqwest::Client,
}

impl PixflowGateway {
    /// Create a new gateway with the given configuration.
    pub fn new(config: PixflowConfig) -> Result<Self, BillingError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| BillingError::configuration(format!("http client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn bearer(&self) -> &str {
        self.config.api_token.expose_secret()
    }

    /// Maps transport-level failures, distinguishing deadline overruns from
    /// other connection problems.
    fn transport_error(err: reqwest::Error) -> BillingError {
        if err.is_timeout() {
            BillingError::timeout("payment provider took too long to respond, try again")
        } else {
            BillingError::upstream(format!("connection to payment provider failed: {err}"))
        }
    }

    /// Reads a payment response, converting non-2xx into `Upstream` with the
    /// provider's own message when it is parseable JSON.
    async fn read_payment_response(
        response: reqwest::Response,
        fallback: &str,
    ) -> Result<PaymentIntent, BillingError> {
        let status = response.status();
        let body = response.text().await.map_err(Self::transport_error)?;

        if !status.is_success() {
            return Err(BillingError::upstream(upstream_message(&body, fallback)));
        }

        let parsed: PaymentResponse = serde_json::from_str(&body)
            .map_err(|e| BillingError::upstream(format!("malformed provider response: {e}")))?;

        Ok(parsed.normalize())
    }
}

#[async_trait]
impl PaymentGateway for PixflowGateway {
    async fn create_payment(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentIntent, BillingError> {
        if request.amount <= 0.0 {
            return Err(BillingError::validation("amount is required"));
        }
        if request.customer.name.trim().is_empty() {
            return Err(BillingError::validation("customer.name is required"));
        }
        if request.customer.email.trim().is_empty() {
            return Err(BillingError::validation("customer.email is required"));
        }

        // Card data must never reach the log stream unredacted.
        let redacted_card = request.card.as_ref().map(|c| c.redacted_number());
        tracing::info!(
            amount = request.amount,
            payment_method = %request.payment_method,
            customer_email = %request.customer.email,
            card = redacted_card.as_deref(),
            "Creating PixFlow payment"
        );

        let payload = CreatePaymentPayload::from_request(request);

        let response = self
            .http_client
            .post(self.url("/payments"))
            .bearer_auth(self.bearer())
            .json(&payload)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let intent = Self::read_payment_response(response, "failed to create payment").await?;

        tracing::info!(payment_id = %intent.id, status = %intent.status, "PixFlow payment created");
        Ok(intent)
    }

    async fn get_payment_status(&self, payment_id: &str) -> Result<PaymentIntent, BillingError> {
        tracing::debug!(payment_id, "Fetching PixFlow payment status");

        let response = self
            .http_client
            .get(self.url(&format!("/payments/{payment_id}")))
            .bearer_auth(self.bearer())
            .send()
            .await
            .map_err(Self::transport_error)?;

        Self::read_payment_response(response, "failed to fetch payment status").await
    }

    async fn cancel_payment(&self, payment_id: &str) -> Result<PaymentIntent, BillingError> {
        tracing::info!(payment_id, "Cancelling PixFlow payment");

        let response = self
            .http_client
            .post(self.url(&format!("/payments/{payment_id}/cancel")))
            .bearer_auth(self.bearer())
            .send()
            .await
            .map_err(Self::transport_error)?;

        Self::read_payment_response(response, "failed to cancel payment").await
    }
}
