//! Command handler for a single payment status check.

use std::sync::Arc;

use crate::domain::billing::{classify, BillingError, PaymentOutcome};
use crate::ports::{PaymentGateway, PaymentIntent, SubscriptionLedger};

use super::PaymentContext;

/// Command to check one payment's current status.
#[derive(Debug, Clone)]
pub struct CheckPaymentCommand {
    pub payment_id: String,
    /// When present, a terminal outcome is written to the ledger.
    pub context: Option<PaymentContext>,
}

/// Result of a status check.
#[derive(Debug, Clone)]
pub struct CheckPaymentResult {
    pub intent: PaymentIntent,
    pub outcome: PaymentOutcome,
}

/// Handler for one-shot status checks.
///
/// A bare check (no context) only classifies; with the purchase context the
/// terminal outcomes are recorded: approved becomes a subscription upsert,
/// failed becomes a rejected history entry.
pub struct CheckPaymentHandler {
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<dyn SubscriptionLedger>,
}

impl CheckPaymentHandler {
    pub fn new(gateway: Arc<dyn PaymentGateway>, ledger: Arc<dyn SubscriptionLedger>) -> Self {
        Self { gateway, ledger }
    }

    pub async fn handle(&self, cmd: CheckPaymentCommand) -> Result<CheckPaymentResult, BillingError> {
        let intent = self.gateway.get_payment_status(&cmd.payment_id).await?;
        let outcome = classify(&intent.status);

        if let Some(context) = &cmd.context {
            match outcome {
                PaymentOutcome::Approved => {
                    self.ledger
                        .upsert_approved_payment(context.approved_payment(&intent.id))
                        .await?;
                }
                PaymentOutcome::Failed => {
                    self.ledger
                        .record_failed_payment(&intent.id, context.amount, context.metadata.clone())
                        .await?;
                }
                PaymentOutcome::Pending => {}
            }
        }

        Ok(CheckPaymentResult { intent, outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    use crate::adapters::memory::InMemorySubscriptionLedger;
    use crate::domain::billing::{CustomerDetails, PlanType};
    use crate::domain::foundation::EmailAddress;
    use crate::ports::PaymentRequest;

    struct StubGateway {
        status: &'static str,
    }

    #[async_trait]
    impl PaymentGateway for StubGateway {
        async fn create_payment(&self, _request: PaymentRequest) -> Result<PaymentIntent, BillingError> {
            Err(BillingError::upstream("not used"))
        }

        async fn get_payment_status(&self, payment_id: &str) -> Result<PaymentIntent, BillingError> {
            Ok(PaymentIntent {
                id: payment_id.to_string(),
                status: self.status.to_string(),
                payment_url: None,
                qr_code: None,
                pix_code: None,
                amount: Some(29.90),
                created_at: None,
                expires_at: None,
            })
        }

        async fn cancel_payment(&self, _payment_id: &str) -> Result<PaymentIntent, BillingError> {
            Err(BillingError::upstream("not used"))
        }
    }

    fn context() -> PaymentContext {
        PaymentContext {
            user_email: EmailAddress::new("ana@example.com").unwrap(),
            customer: CustomerDetails {
                name: "Ana".to_string(),
                phone: None,
                cpf: None,
            },
            plan_type: PlanType::Monthly,
            amount: 29.90,
            payment_method: "pix".to_string(),
            metadata: json!({"source": "checkout"}),
        }
    }

    #[tokio::test]
    async fn approved_check_with_context_records_subscription() {
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let handler = CheckPaymentHandler::new(Arc::new(StubGateway { status: "paid" }), ledger.clone());

        let result = handler
            .handle(CheckPaymentCommand {
                payment_id: "PAY-9".to_string(),
                context: Some(context()),
            })
            .await
            .unwrap();

        assert_eq!(result.outcome, PaymentOutcome::Approved);
        assert_eq!(ledger.subscriptions().len(), 1);
    }

    #[tokio::test]
    async fn check_without_context_only_classifies() {
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let handler = CheckPaymentHandler::new(Arc::new(StubGateway { status: "paid" }), ledger.clone());

        let result = handler
            .handle(CheckPaymentCommand {
                payment_id: "PAY-9".to_string(),
                context: None,
            })
            .await
            .unwrap();

        assert_eq!(result.outcome, PaymentOutcome::Approved);
        assert!(ledger.subscriptions().is_empty());
    }

    #[tokio::test]
    async fn unknown_status_stays_pending() {
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let handler = CheckPaymentHandler::new(
            Arc::new(StubGateway { status: "something_new" }),
            ledger.clone(),
        );

        let result = handler
            .handle(CheckPaymentCommand {
                payment_id: "PAY-9".to_string(),
                context: Some(context()),
            })
            .await
            .unwrap();

        assert_eq!(result.outcome, PaymentOutcome::Pending);
        assert!(ledger.subscriptions().is_empty());
        assert!(ledger.history().is_empty());
    }
}
