//! Query handler for the entitlement check.

use std::sync::Arc;

use crate::domain::billing::{BillingError, PlanType};
use crate::domain::foundation::{EmailAddress, Timestamp};
use crate::ports::SubscriptionLedger;

/// Result of an entitlement check.
///
/// `checked` distinguishes "no subscription" from "could not look": a ledger
/// failure degrades to no-access rather than erroring the caller, and the
/// flag lets clients tell the two apart.
#[derive(Debug, Clone)]
pub struct CheckSubscriptionResult {
    pub has_active_subscription: bool,
    pub checked: bool,
    pub plan_type: Option<PlanType>,
    pub expires_at: Option<Timestamp>,
}

impl CheckSubscriptionResult {
    fn no_access(checked: bool) -> Self {
        Self {
            has_active_subscription: false,
            checked,
            plan_type: None,
            expires_at: None,
        }
    }
}

/// Handler for entitlement checks.
pub struct CheckSubscriptionHandler {
    ledger: Arc<dyn SubscriptionLedger>,
}

impl CheckSubscriptionHandler {
    pub fn new(ledger: Arc<dyn SubscriptionLedger>) -> Self {
        Self { ledger }
    }

    pub async fn handle(&self, email: &str) -> Result<CheckSubscriptionResult, BillingError> {
        let user_email = EmailAddress::new(email)?;

        match self.ledger.find_active_subscription(&user_email).await {
            Ok(Some(subscription)) => Ok(CheckSubscriptionResult {
                has_active_subscription: true,
                checked: true,
                plan_type: Some(subscription.plan_type),
                expires_at: Some(subscription.expires_at),
            }),
            Ok(None) => Ok(CheckSubscriptionResult::no_access(true)),
            Err(e) => {
                // Degrade to no-access instead of failing the caller.
                tracing::warn!(email = %user_email, error = %e, "Subscription check failed");
                Ok(CheckSubscriptionResult::no_access(false))
            }
        }
    }
}
