//! Subscription aggregate and payment history entries.
//!
//! One logical subscription row per subscriber, keyed by email for lookups
//! and by the external transaction id for idempotent creation. History
//! entries are append-only and written solely through the ledger.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::foundation::{EmailAddress, Timestamp};

use super::PlanType;

/// Stored subscription status.
///
/// "Expired" is derived, never stored: an active row whose `expires_at` has
/// passed no longer grants access, with no status-flip write required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(SubscriptionStatus::Active),
            "cancelled" => Some(SubscriptionStatus::Cancelled),
            _ => None,
        }
    }
}

/// Customer identity captured alongside a subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub phone: Option<String>,
    pub cpf: Option<String>,
}

/// A subscriber's persisted entitlement record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub user_email: EmailAddress,
    pub user_name: String,
    pub user_phone: Option<String>,
    pub user_cpf: Option<String>,
    pub plan_type: PlanType,
    pub amount: f64,
    pub status: SubscriptionStatus,
    /// External provider transaction id; the idempotency key.
    pub transaction_id: String,
    pub payment_method: String,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Subscription {
    /// Creates a new active subscription starting at `now`.
    #[allow(clippy::too_many_arguments)]
    pub fn new_active(
        user_email: EmailAddress,
        customer: CustomerDetails,
        plan_type: PlanType,
        amount: f64,
        transaction_id: impl Into<String>,
        payment_method: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_email,
            user_name: customer.name,
            user_phone: customer.phone,
            user_cpf: customer.cpf,
            plan_type,
            amount,
            status: SubscriptionStatus::Active,
            transaction_id: transaction_id.into(),
            payment_method: payment_method.into(),
            expires_at: plan_type.expiry_from(now),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the subscription grants access at `now`.
    ///
    /// Re-derived on every read: expiry is time-based, not event-based.
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        self.status == SubscriptionStatus::Active && !self.expires_at.is_before(&now)
    }

    /// Extends the subscription by one plan period from `now`.
    ///
    /// Deliberately anchored at the renewal moment, not the previous
    /// expiry: a renewal arriving 10 days late does not preserve the
    /// missed days.
    pub fn renew(&mut self, now: Timestamp) {
        self.expires_at = self.plan_type.expiry_from(now);
        self.updated_at = now;
    }

    /// Marks the subscription cancelled.
    pub fn cancel(&mut self, now: Timestamp) {
        self.status = SubscriptionStatus::Cancelled;
        self.updated_at = now;
    }
}

/// Status of a payment history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryStatus {
    Approved,
    Rejected,
}

impl HistoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryStatus::Approved => "approved",
            HistoryStatus::Rejected => "rejected",
        }
    }
}

/// Append-only record of a classified terminal payment outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentHistoryEntry {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub amount: f64,
    pub status: HistoryStatus,
    pub transaction_id: String,
    /// Opaque provider event context (event name, order ref, reason tags).
    pub metadata: Value,
    pub created_at: Timestamp,
}

impl PaymentHistoryEntry {
    pub fn new(
        subscription_id: Uuid,
        amount: f64,
        status: HistoryStatus,
        transaction_id: impl Into<String>,
        metadata: Value,
        now: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            subscription_id,
            amount,
            status,
            transaction_id: transaction_id.into(),
            metadata,
            created_at: now,
        }
    }
}
