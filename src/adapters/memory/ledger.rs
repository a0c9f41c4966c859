//! In-memory implementation of the `SubscriptionLedger` port.
//!
//! Backs integration tests and local development without PostgreSQL. The
//! single interior mutex plays the role of the storage-level uniqueness
//! constraint: concurrent upserts for one transaction id serialize through
//! it, so exactly one insert wins and the loser observes the winner's row.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::domain::billing::{
    BillingError, HistoryStatus, PaymentHistoryEntry, Subscription, SubscriptionStatus,
};
use crate::domain::foundation::{EmailAddress, Timestamp};
use crate::ports::{ApprovedPayment, SubscriptionLedger};

#[derive(Default)]
struct LedgerState {
    subscriptions: Vec<Subscription>,
    history: Vec<PaymentHistoryEntry>,
}

/// In-memory subscription ledger.
#[derive(Default)]
pub struct InMemorySubscriptionLedger {
    state: Mutex<LedgerState>,
    fixed_now: Mutex<Option<Timestamp>>,
}

impl InMemorySubscriptionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the ledger clock for deterministic expiry assertions.
    pub fn set_now(&self, now: Timestamp) {
        *self.fixed_now.lock().unwrap() = Some(now);
    }

    fn now(&self) -> Timestamp {
        self.fixed_now.lock().unwrap().unwrap_or_else(Timestamp::now)
    }

    /// Snapshot of all subscription rows.
    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.state.lock().unwrap().subscriptions.clone()
    }

    /// Snapshot of all history entries.
    pub fn history(&self) -> Vec<PaymentHistoryEntry> {
        self.state.lock().unwrap().history.clone()
    }

    /// History entries recorded for one transaction id.
    pub fn history_for(&self, transaction_id: &str) -> Vec<PaymentHistoryEntry> {
        self.state
            .lock()
            .unwrap()
            .history
            .iter()
            .filter(|e| e.transaction_id == transaction_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SubscriptionLedger for InMemorySubscriptionLedger {
    async fn upsert_approved_payment(
        &self,
        payment: ApprovedPayment,
    ) -> Result<Subscription, BillingError> {
        let now = self.now();
        let mut state = self.state.lock().unwrap();

        // Idempotency: the transaction id is the key.
        if let Some(existing) = state
            .subscriptions
            .iter()
            .find(|s| s.transaction_id == payment.transaction_id)
        {
            tracing::info!(
                transaction_id = %payment.transaction_id,
                subscription_id = %existing.id,
                "Subscription already exists for this transaction"
            );
            return Ok(existing.clone());
        }

        let subscription = Subscription::new_active(
            payment.user_email,
            payment.customer,
            payment.plan_type,
            payment.amount,
            payment.transaction_id.clone(),
            payment.payment_method,
            now,
        );

        state.subscriptions.push(subscription.clone());
        state.history.push(PaymentHistoryEntry::new(
            subscription.id,
            payment.amount,
            HistoryStatus::Approved,
            payment.transaction_id,
            payment.metadata,
            now,
        ));

        Ok(subscription)
    }

    async fn renew_active_subscription(
        &self,
        user_email: &EmailAddress,
        amount: f64,
        metadata: Value,
    ) -> Result<Option<Subscription>, BillingError> {
        let now = self.now();
        let mut state = self.state.lock().unwrap();

        let Some(subscription) = state
            .subscriptions
            .iter_mut()
            .find(|s| s.user_email == *user_email && s.status == SubscriptionStatus::Active)
        else {
            return Ok(None);
        };

        subscription.renew(now);
        let renewed = subscription.clone();

        let mut metadata = metadata;
        if let Value::Object(map) = &mut metadata {
            map.insert("renewal".to_string(), json!(true));
        }

        state.history.push(PaymentHistoryEntry::new(
            renewed.id,
            amount,
            HistoryStatus::Approved,
            renewed.transaction_id.clone(),
            metadata,
            now,
        ));

        Ok(Some(renewed))
    }

    async fn record_failed_payment(
        &self,
        transaction_id: &str,
        amount: f64,
        metadata: Value,
    ) -> Result<(), BillingError> {
        let now = self.now();
        let mut state = self.state.lock().unwrap();

        // Nothing to attach the failure to when the transaction is unknown.
        let Some(subscription_id) = state
            .subscriptions
            .iter()
            .find(|s| s.transaction_id == transaction_id)
            .map(|s| s.id)
        else {
            return Ok(());
        };

        state.history.push(PaymentHistoryEntry::new(
            subscription_id,
            amount,
            HistoryStatus::Rejected,
            transaction_id,
            metadata,
            now,
        ));

        Ok(())
    }

    async fn cancel_active_subscription(
        &self,
        user_email: &EmailAddress,
        amount: f64,
        metadata: Value,
    ) -> Result<(), BillingError> {
        let now = self.now();
        let mut state = self.state.lock().unwrap();

        let Some(subscription) = state
            .subscriptions
            .iter_mut()
            .find(|s| s.user_email == *user_email && s.status == SubscriptionStatus::Active)
        else {
            return Ok(());
        };

        subscription.cancel(now);
        let (id, transaction_id) = (subscription.id, subscription.transaction_id.clone());

        state.history.push(PaymentHistoryEntry::new(
            id,
            amount,
            HistoryStatus::Rejected,
            transaction_id,
            metadata,
            now,
        ));

        Ok(())
    }

    async fn find_active_subscription(
        &self,
        user_email: &EmailAddress,
    ) -> Result<Option<Subscription>, BillingError> {
        let now = self.now();
        let state = self.state.lock().unwrap();

        Ok(state
            .subscriptions
            .iter()
            .find(|s| s.user_email == *user_email && s.is_active_at(now))
            .cloned())
    }
}
