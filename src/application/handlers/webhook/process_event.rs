//! Command handler for Vendra webhook events.

use std::sync::Arc;

use secrecy::SecretString;
use serde_json::json;

use crate::adapters::vendra::{verify_webhook_token, VendraEvent, VendraWebhookPayload};
use crate::domain::billing::{BillingError, CustomerDetails, PlanType};
use crate::domain::foundation::EmailAddress;
use crate::ports::{ApprovedPayment, SubscriptionLedger};

/// Command to process one delivered webhook.
#[derive(Debug, Clone)]
pub struct ProcessWebhookCommand {
    pub payload: VendraWebhookPayload,
    /// Token from the request header, when Vendra sends it there.
    pub header_token: Option<String>,
}

/// Outcome of webhook processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessWebhookResult {
    /// Payment confirmed, subscription created (or already present).
    SubscriptionActivated,
    /// Active subscription extended by one plan period.
    SubscriptionRenewed,
    /// Renewal arrived with no active subscription to extend.
    NoActiveSubscription,
    /// Refused payment recorded (or silently ignored when unknown).
    PaymentFailureRecorded,
    /// Subscription cancelled following a refund or cancellation event.
    SubscriptionCancelled,
    /// Unknown event type; acknowledged without action.
    Ignored,
}

/// Handler for Vendra webhook deliveries.
///
/// Token verification runs before anything else; a mismatch must leave the
/// ledger untouched. Event names drive the dispatch, and redelivered events
/// are absorbed by the ledger's idempotent writes, so Vendra's at-least-once
/// delivery is safe.
pub struct ProcessWebhookHandler {
    ledger: Arc<dyn SubscriptionLedger>,
    webhook_token: SecretString,
}

impl ProcessWebhookHandler {
    pub fn new(ledger: Arc<dyn SubscriptionLedger>, webhook_token: SecretString) -> Self {
        Self {
            ledger,
            webhook_token,
        }
    }

    pub async fn handle(
        &self,
        cmd: ProcessWebhookCommand,
    ) -> Result<ProcessWebhookResult, BillingError> {
        let payload = &cmd.payload;
        verify_webhook_token(
            &self.webhook_token,
            payload.webhook_token.as_deref(),
            cmd.header_token.as_deref(),
        )?;

        let event = payload.event();
        tracing::info!(
            event = event.as_str(),
            order_id = %payload.order_id,
            "Processing webhook event"
        );

        match event {
            VendraEvent::OrderPaid | VendraEvent::SubscriptionStarted => {
                self.activate_subscription(payload).await
            }
            VendraEvent::SubscriptionRenewed => self.renew_subscription(payload).await,
            VendraEvent::OrderRefused => {
                self.ledger
                    .record_failed_payment(
                        &payload.order_id,
                        payload.payment.amount,
                        self.event_metadata(payload, Some("payment_refused")),
                    )
                    .await?;
                Ok(ProcessWebhookResult::PaymentFailureRecorded)
            }
            VendraEvent::OrderRefunded => {
                self.cancel_subscription(payload, "refunded").await
            }
            VendraEvent::SubscriptionCancelled => {
                self.cancel_subscription(payload, "cancelled").await
            }
            VendraEvent::Unknown(name) => {
                tracing::warn!(event = %name, "Ignoring unknown webhook event");
                Ok(ProcessWebhookResult::Ignored)
            }
        }
    }

    async fn activate_subscription(
        &self,
        payload: &VendraWebhookPayload,
    ) -> Result<ProcessWebhookResult, BillingError> {
        let user_email = EmailAddress::new(&payload.customer.email)?;
        let plan_type = PlanType::from_product_name(&payload.product_name);

        self.ledger
            .upsert_approved_payment(ApprovedPayment {
                transaction_id: payload.order_id.clone(),
                user_email,
                customer: CustomerDetails {
                    name: payload.customer.name.clone(),
                    phone: payload.customer.phone.clone(),
                    cpf: payload.customer.cpf.clone(),
                },
                plan_type,
                amount: payload.payment.amount,
                payment_method: payload.payment.method.clone(),
                metadata: self.event_metadata(payload, None),
            })
            .await?;

        Ok(ProcessWebhookResult::SubscriptionActivated)
    }

    async fn renew_subscription(
        &self,
        payload: &VendraWebhookPayload,
    ) -> Result<ProcessWebhookResult, BillingError> {
        let user_email = EmailAddress::new(&payload.customer.email)?;

        let renewed = self
            .ledger
            .renew_active_subscription(
                &user_email,
                payload.payment.amount,
                self.event_metadata(payload, None),
            )
            .await?;

        match renewed {
            Some(_) => Ok(ProcessWebhookResult::SubscriptionRenewed),
            None => {
                tracing::warn!(
                    order_id = %payload.order_id,
                    "Renewal event without an active subscription"
                );
                Ok(ProcessWebhookResult::NoActiveSubscription)
            }
        }
    }

    async fn cancel_subscription(
        &self,
        payload: &VendraWebhookPayload,
        reason: &str,
    ) -> Result<ProcessWebhookResult, BillingError> {
        let user_email = EmailAddress::new(&payload.customer.email)?;

        self.ledger
            .cancel_active_subscription(
                &user_email,
                payload.payment.amount,
                self.event_metadata(payload, Some(reason)),
            )
            .await?;

        Ok(ProcessWebhookResult::SubscriptionCancelled)
    }

    fn event_metadata(
        &self,
        payload: &VendraWebhookPayload,
        reason: Option<&str>,
    ) -> serde_json::Value {
        let mut metadata = json!({
            "event": payload.event,
            "order_id": payload.order_id,
            "order_ref": payload.order_ref,
            "product_id": payload.product_id,
            "product_name": payload.product_name,
            "payment_method": payload.payment.method,
            "payment_status": payload.payment.status,
        });
        if let Some(installments) = payload.payment.installments {
            metadata["installments"] = json!(installments);
        }
        if let Some(subscription) = &payload.subscription {
            metadata["provider_subscription_id"] = json!(subscription.id);
        }
        if let Some(reason) = reason {
            metadata["reason"] = json!(reason);
        }
        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    use crate::adapters::memory::InMemorySubscriptionLedger;
    use crate::adapters::vendra::{VendraCustomer, VendraPayment};
    use crate::domain::billing::SubscriptionStatus;

    const TOKEN: &str = "whsec-test";

    fn handler(ledger: Arc<InMemorySubscriptionLedger>) -> ProcessWebhookHandler {
        ProcessWebhookHandler::new(ledger, SecretString::new(TOKEN.to_string()))
    }

    fn payload(event: &str, order_id: &str) -> VendraWebhookPayload {
        VendraWebhookPayload {
            event: event.to_string(),
            order_id: order_id.to_string(),
            order_ref: format!("REF-{order_id}"),
            product_id: "prod_1".to_string(),
            product_name: "CalmWave Mensal".to_string(),
            customer: VendraCustomer {
                email: "ana@example.com".to_string(),
                name: "Ana".to_string(),
                phone: Some("+5511999990000".to_string()),
                cpf: None,
            },
            payment: VendraPayment {
                method: "credit_card".to_string(),
                status: "paid".to_string(),
                amount: 29.90,
                installments: None,
            },
            subscription: None,
            created_at: "2024-01-15T00:00:00Z".to_string(),
            webhook_token: Some(TOKEN.to_string()),
        }
    }

    fn command(payload: VendraWebhookPayload) -> ProcessWebhookCommand {
        ProcessWebhookCommand {
            payload,
            header_token: None,
        }
    }

    #[tokio::test]
    async fn order_paid_activates_subscription() {
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let handler = handler(ledger.clone());

        let result = handler
            .handle(command(payload("order.paid", "ord_1")))
            .await
            .unwrap();

        assert_eq!(result, ProcessWebhookResult::SubscriptionActivated);
        let subs = ledger.subscriptions();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].transaction_id, "ord_1");
        assert_eq!(subs[0].payment_method, "credit_card");
    }

    #[tokio::test]
    async fn annual_product_name_selects_annual_plan() {
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let handler = handler(ledger.clone());

        let mut p = payload("order.paid", "ord_1");
        p.product_name = "CalmWave Premium Anual".to_string();
        p.payment.amount = 179.90;
        handler.handle(command(p)).await.unwrap();

        assert_eq!(ledger.subscriptions()[0].plan_type, PlanType::Annual);
    }

    #[tokio::test]
    async fn redelivered_order_paid_is_absorbed() {
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let handler = handler(ledger.clone());

        handler
            .handle(command(payload("order.paid", "ord_1")))
            .await
            .unwrap();
        handler
            .handle(command(payload("order.paid", "ord_1")))
            .await
            .unwrap();

        assert_eq!(ledger.subscriptions().len(), 1);
        assert_eq!(ledger.history_for("ord_1").len(), 1);
    }

    #[tokio::test]
    async fn bad_token_rejects_before_any_write() {
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let handler = handler(ledger.clone());

        let mut p = payload("order.paid", "ord_1");
        p.webhook_token = Some("wrong".to_string());
        let err = handler.handle(command(p)).await.unwrap_err();

        assert!(matches!(err, BillingError::Auth(_)));
        assert!(ledger.subscriptions().is_empty());
        assert!(ledger.history().is_empty());
    }

    #[tokio::test]
    async fn header_token_authenticates_when_body_token_absent() {
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let handler = handler(ledger.clone());

        let mut p = payload("order.paid", "ord_1");
        p.webhook_token = None;
        let result = handler
            .handle(ProcessWebhookCommand {
                payload: p,
                header_token: Some(TOKEN.to_string()),
            })
            .await
            .unwrap();

        assert_eq!(result, ProcessWebhookResult::SubscriptionActivated);
    }

    #[tokio::test]
    async fn renewal_without_active_subscription_reports_it() {
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let handler = handler(ledger.clone());

        let result = handler
            .handle(command(payload("subscription.renewed", "ord_2")))
            .await
            .unwrap();

        assert_eq!(result, ProcessWebhookResult::NoActiveSubscription);
        assert!(ledger.history().is_empty());
    }

    #[tokio::test]
    async fn refund_cancels_the_active_subscription() {
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let handler = handler(ledger.clone());

        handler
            .handle(command(payload("order.paid", "ord_1")))
            .await
            .unwrap();
        let result = handler
            .handle(command(payload("order.refunded", "ord_1")))
            .await
            .unwrap();

        assert_eq!(result, ProcessWebhookResult::SubscriptionCancelled);
        assert_eq!(ledger.subscriptions()[0].status, SubscriptionStatus::Cancelled);
        let entries = ledger.history_for("ord_1");
        assert_eq!(entries[1].metadata["reason"], json!("refunded"));
    }

    #[tokio::test]
    async fn refused_order_for_unknown_transaction_is_ignored_quietly() {
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let handler = handler(ledger.clone());

        let result = handler
            .handle(command(payload("order.refused", "ord_404")))
            .await
            .unwrap();

        assert_eq!(result, ProcessWebhookResult::PaymentFailureRecorded);
        assert!(ledger.history().is_empty());
    }

    #[tokio::test]
    async fn unknown_event_is_acknowledged_without_action() {
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let handler = handler(ledger.clone());

        let result = handler
            .handle(command(payload("order.chargeback_opened", "ord_1")))
            .await
            .unwrap();

        assert_eq!(result, ProcessWebhookResult::Ignored);
        assert!(ledger.subscriptions().is_empty());
    }
}
