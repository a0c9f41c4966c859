//! Subscription ledger port: the sole writer of subscriptions and payment
//! history, and the source of truth for entitlement checks.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::billing::{BillingError, CustomerDetails, PlanType, Subscription};
use crate::domain::foundation::EmailAddress;

/// An approved payment ready to be recorded.
#[derive(Debug, Clone)]
pub struct ApprovedPayment {
    /// External transaction id; the idempotency key.
    pub transaction_id: String,
    pub user_email: EmailAddress,
    pub customer: CustomerDetails,
    pub plan_type: PlanType,
    pub amount: f64,
    pub payment_method: String,
    /// Provider event context, stored on the history entry.
    pub metadata: Value,
}

/// Port for the persisted subscription + payment-history store.
///
/// Implementations must enforce `transaction_id` uniqueness at the storage
/// layer: two concurrent upserts for the same transaction must have exactly
/// one winner, with the loser observing the winner's row.
#[async_trait]
pub trait SubscriptionLedger: Send + Sync {
    /// Records an approved payment, idempotently.
    ///
    /// If a subscription with this transaction id already exists it is
    /// returned unchanged (webhook redelivery, duplicate confirmations).
    /// Otherwise a new active subscription is inserted together with an
    /// approved history entry. The subscription row is authoritative: a
    /// history-append failure after the insert is logged, not surfaced.
    async fn upsert_approved_payment(
        &self,
        payment: ApprovedPayment,
    ) -> Result<Subscription, BillingError>;

    /// Extends the single active subscription for this identity by one plan
    /// period from now. Returns `None` when no active subscription exists.
    async fn renew_active_subscription(
        &self,
        user_email: &EmailAddress,
        amount: f64,
        metadata: Value,
    ) -> Result<Option<Subscription>, BillingError>;

    /// Appends a rejected history entry when a subscription exists for this
    /// transaction id; no-op otherwise (nothing to attach the failure to).
    async fn record_failed_payment(
        &self,
        transaction_id: &str,
        amount: f64,
        metadata: Value,
    ) -> Result<(), BillingError>;

    /// Cancels the active subscription for this identity, appending a
    /// rejected history entry carrying the reason. No-op when absent.
    async fn cancel_active_subscription(
        &self,
        user_email: &EmailAddress,
        amount: f64,
        metadata: Value,
    ) -> Result<(), BillingError>;

    /// The active, unexpired subscription for this identity, if any.
    ///
    /// Derived at read time: `status = active AND expires_at >= now`.
    async fn find_active_subscription(
        &self,
        user_email: &EmailAddress,
    ) -> Result<Option<Subscription>, BillingError>;

    /// Whether the identity currently holds an active, unexpired subscription.
    async fn has_active_subscription(
        &self,
        user_email: &EmailAddress,
    ) -> Result<bool, BillingError> {
        Ok(self.find_active_subscription(user_email).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_ledger_is_object_safe() {
        fn _accepts_dyn(_ledger: &dyn SubscriptionLedger) {}
    }
}
