//! Command handler for creating a payment with the gateway.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::domain::billing::{classify, BillingError, CardDetails, CustomerDetails, PaymentOutcome, PlanType};
use crate::domain::foundation::EmailAddress;
use crate::ports::{CustomerInfo, PaymentGateway, PaymentIntent, PaymentRequest, SubscriptionLedger};

use super::PaymentContext;

const DEFAULT_DESCRIPTION: &str = "Pagamento";

/// Command to create a payment.
#[derive(Debug, Clone)]
pub struct CreatePaymentCommand {
    pub amount: f64,
    pub description: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub customer_document: Option<String>,
    pub payment_method: String,
    pub card: Option<CardDetails>,
    pub plan_type: PlanType,
    pub metadata: Option<Value>,
}

/// Result of payment creation.
#[derive(Debug, Clone)]
pub struct CreatePaymentResult {
    pub intent: PaymentIntent,
    pub outcome: PaymentOutcome,
}

/// Handler for creating payments.
///
/// Card payments can settle synchronously, in which case the approved
/// outcome is recorded immediately. Asynchronous methods (pix) come back
/// pending and are confirmed by the watcher or a status check.
pub struct CreatePaymentHandler {
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<dyn SubscriptionLedger>,
}

impl CreatePaymentHandler {
    pub fn new(gateway: Arc<dyn PaymentGateway>, ledger: Arc<dyn SubscriptionLedger>) -> Self {
        Self { gateway, ledger }
    }

    pub async fn handle(
        &self,
        cmd: CreatePaymentCommand,
    ) -> Result<CreatePaymentResult, BillingError> {
        let user_email = EmailAddress::new(&cmd.customer_email)?;

        if cmd.payment_method == "credit_card" {
            let card = cmd
                .card
                .as_ref()
                .ok_or_else(|| BillingError::validation("card details are required for credit_card payments"))?;
            card.validate()?;
        }

        let description = cmd
            .description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

        let request = PaymentRequest {
            amount: cmd.amount,
            description,
            customer: CustomerInfo {
                name: cmd.customer_name.clone(),
                email: user_email.as_str().to_string(),
                document: cmd.customer_document.clone(),
            },
            payment_method: cmd.payment_method.clone(),
            card: cmd.card.clone(),
            metadata: cmd.metadata.clone(),
        };

        let intent = self.gateway.create_payment(request).await?;
        let outcome = classify(&intent.status);

        if outcome == PaymentOutcome::Approved {
            let context = PaymentContext {
                user_email,
                customer: CustomerDetails {
                    name: cmd.customer_name,
                    phone: cmd.customer_phone,
                    cpf: cmd.customer_document,
                },
                plan_type: cmd.plan_type,
                amount: cmd.amount,
                payment_method: cmd.payment_method,
                metadata: cmd.metadata.unwrap_or_else(|| json!({})),
            };
            self.ledger
                .upsert_approved_payment(context.approved_payment(&intent.id))
                .await?;
            tracing::info!(payment_id = %intent.id, "Payment approved at creation");
        }

        Ok(CreatePaymentResult { intent, outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::adapters::memory::InMemorySubscriptionLedger;

    struct StubGateway {
        status: &'static str,
        calls: Mutex<u32>,
    }

    impl StubGateway {
        fn returning(status: &'static str) -> Self {
            Self {
                status,
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl PaymentGateway for StubGateway {
        async fn create_payment(
            &self,
            _request: PaymentRequest,
        ) -> Result<PaymentIntent, BillingError> {
            *self.calls.lock().unwrap() += 1;
            Ok(PaymentIntent {
                id: "PAY-1".to_string(),
                status: self.status.to_string(),
                payment_url: None,
                qr_code: None,
                pix_code: Some("00020126...".to_string()),
                amount: Some(29.90),
                created_at: None,
                expires_at: None,
            })
        }

        async fn get_payment_status(&self, _payment_id: &str) -> Result<PaymentIntent, BillingError> {
            Err(BillingError::upstream("not used"))
        }

        async fn cancel_payment(&self, _payment_id: &str) -> Result<PaymentIntent, BillingError> {
            Err(BillingError::upstream("not used"))
        }
    }

    fn command(method: &str) -> CreatePaymentCommand {
        CreatePaymentCommand {
            amount: 29.90,
            description: None,
            customer_name: "Ana".to_string(),
            customer_email: "ana@example.com".to_string(),
            customer_phone: None,
            customer_document: None,
            payment_method: method.to_string(),
            card: None,
            plan_type: PlanType::Monthly,
            metadata: None,
        }
    }

    #[tokio::test]
    async fn pending_creation_does_not_touch_the_ledger() {
        let gateway = Arc::new(StubGateway::returning("pending"));
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let handler = CreatePaymentHandler::new(gateway, ledger.clone());

        let result = handler.handle(command("pix")).await.unwrap();

        assert_eq!(result.outcome, PaymentOutcome::Pending);
        assert!(ledger.subscriptions().is_empty());
    }

    #[tokio::test]
    async fn synchronous_approval_records_the_subscription() {
        let gateway = Arc::new(StubGateway::returning("approved"));
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let handler = CreatePaymentHandler::new(gateway, ledger.clone());

        let result = handler.handle(command("pix")).await.unwrap();

        assert_eq!(result.outcome, PaymentOutcome::Approved);
        let subs = ledger.subscriptions();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].transaction_id, "PAY-1");
    }

    #[tokio::test]
    async fn invalid_email_is_rejected_before_the_gateway_is_called() {
        let gateway = Arc::new(StubGateway::returning("approved"));
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let handler = CreatePaymentHandler::new(gateway.clone(), ledger);

        let mut cmd = command("pix");
        cmd.customer_email = "not-an-email".to_string();
        let err = handler.handle(cmd).await.unwrap_err();

        assert!(matches!(err, BillingError::Validation(_)));
        assert_eq!(*gateway.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn credit_card_without_card_details_is_rejected() {
        let gateway = Arc::new(StubGateway::returning("approved"));
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let handler = CreatePaymentHandler::new(gateway, ledger);

        let err = handler.handle(command("credit_card")).await.unwrap_err();
        assert!(matches!(err, BillingError::Validation(_)));
    }
}
