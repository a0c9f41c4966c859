//! Polling watcher that confirms asynchronous payments.
//!
//! Pix payments settle out-of-band: the watcher polls the gateway at a fixed
//! interval until the status classifies as terminal or the deadline passes.
//! A deadline expiry is not a failure: the watcher exits without touching
//! the ledger, and a later webhook or manual check can still settle it.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::config::PixflowConfig;
use crate::domain::billing::{classify, BillingError, PaymentOutcome, Subscription};
use crate::ports::{PaymentGateway, SubscriptionLedger};

use super::PaymentContext;

/// Cadence and deadline for the watch loop.
#[derive(Debug, Clone, Copy)]
pub struct PollingPolicy {
    pub interval: Duration,
    pub deadline: Duration,
}

impl PollingPolicy {
    pub fn from_config(config: &PixflowConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            deadline: config.poll_deadline(),
        }
    }
}

impl Default for PollingPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            deadline: Duration::from_secs(600),
        }
    }
}

/// Command to watch a payment until it settles.
#[derive(Debug, Clone)]
pub struct WatchPaymentCommand {
    pub payment_id: String,
    pub context: PaymentContext,
}

/// Terminal state of a watch.
#[derive(Debug, Clone)]
pub enum WatchPaymentResult {
    /// Payment approved; the subscription it produced.
    Approved(Subscription),
    /// Payment reached a failed status.
    Failed,
    /// Deadline passed with the payment still pending. No ledger mutation.
    TimedOut,
}

/// Handler that polls a payment to a terminal outcome.
pub struct WatchPaymentHandler {
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<dyn SubscriptionLedger>,
    policy: PollingPolicy,
}

impl WatchPaymentHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        ledger: Arc<dyn SubscriptionLedger>,
        policy: PollingPolicy,
    ) -> Self {
        Self {
            gateway,
            ledger,
            policy,
        }
    }

    pub async fn handle(&self, cmd: WatchPaymentCommand) -> Result<WatchPaymentResult, BillingError> {
        let started = Instant::now();

        loop {
            if started.elapsed() >= self.policy.deadline {
                tracing::info!(
                    payment_id = %cmd.payment_id,
                    deadline_secs = self.policy.deadline.as_secs(),
                    "Payment watch deadline passed, giving up"
                );
                return Ok(WatchPaymentResult::TimedOut);
            }

            match self.gateway.get_payment_status(&cmd.payment_id).await {
                Ok(intent) => match classify(&intent.status) {
                    PaymentOutcome::Approved => {
                        let subscription = self
                            .ledger
                            .upsert_approved_payment(cmd.context.approved_payment(&intent.id))
                            .await?;
                        tracing::info!(payment_id = %cmd.payment_id, "Payment approved");
                        return Ok(WatchPaymentResult::Approved(subscription));
                    }
                    PaymentOutcome::Failed => {
                        self.ledger
                            .record_failed_payment(
                                &intent.id,
                                cmd.context.amount,
                                cmd.context.metadata.clone(),
                            )
                            .await?;
                        tracing::info!(
                            payment_id = %cmd.payment_id,
                            status = %intent.status,
                            "Payment failed"
                        );
                        return Ok(WatchPaymentResult::Failed);
                    }
                    PaymentOutcome::Pending => {}
                },
                // Transient provider trouble must not kill the watch.
                Err(e) if e.is_retryable() => {
                    tracing::warn!(payment_id = %cmd.payment_id, error = %e, "Status poll failed, retrying");
                }
                Err(e) => return Err(e),
            }

            sleep(self.policy.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::adapters::memory::InMemorySubscriptionLedger;
    use crate::domain::billing::{CustomerDetails, PlanType};
    use crate::domain::foundation::EmailAddress;
    use crate::ports::{PaymentIntent, PaymentRequest};

    struct ScriptedGateway {
        statuses: Mutex<VecDeque<Result<&'static str, BillingError>>>,
    }

    impl ScriptedGateway {
        fn new(script: Vec<Result<&'static str, BillingError>>) -> Self {
            Self {
                statuses: Mutex::new(script.into_iter().collect()),
            }
        }
    }

    #[async_trait]
    impl PaymentGateway for ScriptedGateway {
        async fn create_payment(&self, _request: PaymentRequest) -> Result<PaymentIntent, BillingError> {
            Err(BillingError::upstream("not used"))
        }

        async fn get_payment_status(&self, payment_id: &str) -> Result<PaymentIntent, BillingError> {
            // Keeps returning the last scripted status once the script runs out.
            let mut script = self.statuses.lock().unwrap();
            let next = if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap()
            };
            next.map(|status| PaymentIntent {
                id: payment_id.to_string(),
                status: status.to_string(),
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

    fn command() -> WatchPaymentCommand {
        WatchPaymentCommand {
            payment_id: "PAY-42".to_string(),
            context: PaymentContext {
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
            },
        }
    }

    fn policy() -> PollingPolicy {
        PollingPolicy {
            interval: Duration::from_secs(5),
            deadline: Duration::from_secs(600),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn approves_after_pending_polls() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Ok("pending"),
            Ok("pending"),
            Ok("paid"),
        ]));
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let handler = WatchPaymentHandler::new(gateway, ledger.clone(), policy());

        let result = handler.handle(command()).await.unwrap();

        assert!(matches!(result, WatchPaymentResult::Approved(_)));
        assert_eq!(ledger.subscriptions().len(), 1);
        assert_eq!(ledger.subscriptions()[0].transaction_id, "PAY-42");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_status_records_rejection_and_stops() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok("pending"), Ok("expired")]));
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let handler = WatchPaymentHandler::new(gateway, ledger.clone(), policy());

        let result = handler.handle(command()).await.unwrap();

        assert!(matches!(result, WatchPaymentResult::Failed));
        assert!(ledger.subscriptions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_expiry_leaves_the_ledger_untouched() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok("pending")]));
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let handler = WatchPaymentHandler::new(gateway, ledger.clone(), policy());

        let result = handler.handle(command()).await.unwrap();

        assert!(matches!(result, WatchPaymentResult::TimedOut));
        assert!(ledger.subscriptions().is_empty());
        assert!(ledger.history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn transient_upstream_errors_do_not_kill_the_watch() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Err(BillingError::timeout("deadline exceeded")),
            Err(BillingError::upstream("HTTP 502")),
            Ok("paid"),
        ]));
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let handler = WatchPaymentHandler::new(gateway, ledger.clone(), policy());

        let result = handler.handle(command()).await.unwrap();

        assert!(matches!(result, WatchPaymentResult::Approved(_)));
    }
}
