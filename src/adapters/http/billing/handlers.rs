//! HTTP handlers for billing endpoints.
//!
//! These handlers connect axum routes to the application layer command
//! handlers and own the error-to-status mapping.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use secrecy::SecretString;
use serde_json::json;

use crate::adapters::vendra::{VendraWebhookPayload, WEBHOOK_TOKEN_HEADER};
use crate::application::handlers::{
    CheckPaymentCommand, CheckPaymentHandler, CheckSubscriptionHandler, CreatePaymentCommand,
    CreatePaymentHandler, PaymentContext, PollingPolicy, ProcessWebhookCommand,
    ProcessWebhookHandler, WatchPaymentCommand, WatchPaymentHandler,
};
use crate::domain::billing::{classify, BillingError, CustomerDetails, PaymentOutcome, PlanType};
use crate::domain::foundation::EmailAddress;
use crate::ports::{CheckoutProvider, PaymentGateway, SubscriptionLedger};

use super::dto::{
    CreatePaymentRequest, ErrorResponse, PaymentLinkRequest, PaymentResponse, PaymentStatusQuery,
    SubscriptionCheckQuery, SubscriptionCheckResponse, WebhookResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the billing routes; cloned per request.
#[derive(Clone)]
pub struct BillingAppState {
    pub gateway: Arc<dyn PaymentGateway>,
    pub ledger: Arc<dyn SubscriptionLedger>,
    /// Present only when Vendra API credentials are configured.
    pub checkout: Option<Arc<dyn CheckoutProvider>>,
    pub webhook_token: SecretString,
    pub polling: PollingPolicy,
}

impl BillingAppState {
    pub fn create_payment_handler(&self) -> CreatePaymentHandler {
        CreatePaymentHandler::new(self.gateway.clone(), self.ledger.clone())
    }

    pub fn check_payment_handler(&self) -> CheckPaymentHandler {
        CheckPaymentHandler::new(self.gateway.clone(), self.ledger.clone())
    }

    pub fn watch_payment_handler(&self) -> WatchPaymentHandler {
        WatchPaymentHandler::new(self.gateway.clone(), self.ledger.clone(), self.polling)
    }

    pub fn webhook_handler(&self) -> ProcessWebhookHandler {
        ProcessWebhookHandler::new(self.ledger.clone(), self.webhook_token.clone())
    }

    pub fn check_subscription_handler(&self) -> CheckSubscriptionHandler {
        CheckSubscriptionHandler::new(self.ledger.clone())
    }

    fn checkout_provider(&self) -> Result<Arc<dyn CheckoutProvider>, BillingError> {
        self.checkout
            .clone()
            .ok_or_else(|| BillingError::configuration("Vendra API credentials not configured"))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Payment Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/payments/create - Create a payment with the gateway.
///
/// Pending payments (pix) get a background watcher that polls the gateway
/// and settles the ledger when the payment reaches a terminal status.
pub async fn create_payment(
    State(state): State<BillingAppState>,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let plan_type = match &request.plan_type {
        Some(raw) => PlanType::parse(raw)
            .ok_or_else(|| BillingError::validation(format!("unknown plan type: {raw}")))?,
        None => PlanType::Monthly,
    };

    let cmd = CreatePaymentCommand {
        amount: request.amount,
        description: request.description.clone(),
        customer_name: request.customer.name.clone(),
        customer_email: request.customer.email.clone(),
        customer_phone: request.customer.phone.clone(),
        customer_document: request.customer.document.clone(),
        payment_method: request.payment_method.clone(),
        card: request.card.clone().map(Into::into),
        plan_type,
        metadata: request.metadata.clone(),
    };

    let result = state.create_payment_handler().handle(cmd).await?;

    if result.outcome == PaymentOutcome::Pending {
        // Validated by the handler above.
        if let Ok(user_email) = EmailAddress::new(&request.customer.email) {
            let context = PaymentContext {
                user_email,
                customer: CustomerDetails {
                    name: request.customer.name,
                    phone: request.customer.phone,
                    cpf: request.customer.document,
                },
                plan_type,
                amount: request.amount,
                payment_method: request.payment_method,
                metadata: request.metadata.unwrap_or_else(|| json!({})),
            };
            let watcher = state.watch_payment_handler();
            let payment_id = result.intent.id.clone();
            tokio::spawn(async move {
                if let Err(e) = watcher
                    .handle(WatchPaymentCommand {
                        payment_id: payment_id.clone(),
                        context,
                    })
                    .await
                {
                    tracing::error!(%payment_id, error = %e, "Payment watch aborted");
                }
            });
        }
    }

    Ok(Json(PaymentResponse {
        success: true,
        outcome: result.outcome,
        payment: result.intent,
    }))
}

/// GET /api/payments/status - One-shot status check for a payment.
pub async fn payment_status(
    State(state): State<BillingAppState>,
    Query(query): Query<PaymentStatusQuery>,
) -> Result<impl IntoResponse, BillingApiError> {
    let result = state
        .check_payment_handler()
        .handle(CheckPaymentCommand {
            payment_id: query.payment_id,
            context: None,
        })
        .await?;

    Ok(Json(PaymentResponse {
        success: true,
        outcome: result.outcome,
        payment: result.intent,
    }))
}

/// POST /api/payments/:payment_id/cancel - Cancel a pending payment.
pub async fn cancel_payment(
    State(state): State<BillingAppState>,
    Path(payment_id): Path<String>,
) -> Result<impl IntoResponse, BillingApiError> {
    let intent = state.gateway.cancel_payment(&payment_id).await?;
    let outcome = classify(&intent.status);

    Ok(Json(PaymentResponse {
        success: true,
        outcome,
        payment: intent,
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Checkout Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/checkout/products - List the Vendra product catalog.
pub async fn list_products(
    State(state): State<BillingAppState>,
) -> Result<impl IntoResponse, BillingApiError> {
    let provider = state.checkout_provider()?;
    let products = provider.list_products().await?;
    Ok(Json(products))
}

/// POST /api/checkout/link - Create a hosted checkout link for a product.
pub async fn create_payment_link(
    State(state): State<BillingAppState>,
    Json(request): Json<PaymentLinkRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let provider = state.checkout_provider()?;
    let link = provider
        .create_payment_link(&request.product_id, request.extra)
        .await?;
    Ok(Json(link))
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook Endpoint
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/vendra - Handle a Vendra webhook delivery.
///
/// Token mismatch is the only non-200 answer. Processing failures still
/// return 200 with `success: false` so Vendra does not redeliver an event
/// that will fail the same way again; the ledger's idempotency makes any
/// redelivery that does happen harmless.
pub async fn vendra_webhook(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
    Json(payload): Json<VendraWebhookPayload>,
) -> impl IntoResponse {
    let header_token = headers
        .get(WEBHOOK_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let result = state
        .webhook_handler()
        .handle(ProcessWebhookCommand {
            payload,
            header_token,
        })
        .await;

    match result {
        Ok(_) => (StatusCode::OK, Json(WebhookResponse::ok())),
        Err(BillingError::Auth(_)) => (
            StatusCode::UNAUTHORIZED,
            Json(WebhookResponse::failed("invalid webhook token")),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Webhook processing failed");
            (StatusCode::OK, Json(WebhookResponse::failed(e.to_string())))
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Subscription + Health Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/subscription/check - Entitlement check by email.
pub async fn check_subscription(
    State(state): State<BillingAppState>,
    Query(query): Query<SubscriptionCheckQuery>,
) -> Result<impl IntoResponse, BillingApiError> {
    let result = state.check_subscription_handler().handle(&query.email).await?;

    Ok(Json(SubscriptionCheckResponse {
        success: true,
        has_active_subscription: result.has_active_subscription,
        checked: result.checked,
        plan_type: result.plan_type,
        expires_at: result.expires_at.map(|t| t.to_string()),
    }))
}

/// GET /health - Liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Mapping
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts billing errors to HTTP responses.
pub struct BillingApiError(BillingError);

impl From<BillingError> for BillingApiError {
    fn from(err: BillingError) -> Self {
        Self(err)
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = match &self.0 {
            BillingError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            BillingError::Auth(_) => (StatusCode::UNAUTHORIZED, "INVALID_WEBHOOK_TOKEN"),
            BillingError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            BillingError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "PROVIDER_TIMEOUT"),
            BillingError::Upstream(_) => (StatusCode::INTERNAL_SERVER_ERROR, "PROVIDER_ERROR"),
            BillingError::Configuration(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR")
            }
            BillingError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        // Database details stay in the logs, not the response.
        let message = match &self.0 {
            BillingError::Database(_) => "internal error".to_string(),
            BillingError::Timeout(_) => {
                "payment provider timed out, please try again".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse::new(code, message);
        (status, Json(body)).into_response()
    }
}
