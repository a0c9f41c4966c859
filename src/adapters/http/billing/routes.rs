//! Axum router configuration for the billing endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    cancel_payment, check_subscription, create_payment, create_payment_link, health,
    list_products, payment_status, vendra_webhook, BillingAppState,
};

/// Payment endpoints.
///
/// - `POST /create` - Create a payment with the gateway
/// - `GET /status` - One-shot status check
/// - `POST /:payment_id/cancel` - Cancel a pending payment
pub fn payment_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/create", post(create_payment))
        .route("/status", get(payment_status))
        .route("/:payment_id/cancel", post(cancel_payment))
}

/// Checkout endpoints, backed by the Vendra account API.
///
/// - `GET /products` - List the product catalog
/// - `POST /link` - Create a hosted checkout link
pub fn checkout_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/link", post(create_payment_link))
}

/// Webhook endpoints. No user authentication; the shared token in the
/// payload or header is verified instead.
///
/// - `POST /vendra` - Handle Vendra webhook deliveries
pub fn webhook_routes() -> Router<BillingAppState> {
    Router::new().route("/vendra", post(vendra_webhook))
}

/// Subscription endpoints.
///
/// - `GET /check` - Entitlement check by email
pub fn subscription_routes() -> Router<BillingAppState> {
    Router::new().route("/check", get(check_subscription))
}

/// Complete billing router, suitable for mounting at `/api`.
pub fn billing_router() -> Router<BillingAppState> {
    Router::new()
        .nest("/payments", payment_routes())
        .nest("/checkout", checkout_routes())
        .nest("/webhooks", webhook_routes())
        .nest("/subscription", subscription_routes())
        .route("/health", get(health))
}
