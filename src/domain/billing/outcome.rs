//! Canonical payment outcome classification.
//!
//! Both providers report payment state as free-form strings with their own
//! vocabularies. `classify` collapses them into the three buckets the
//! orchestrator acts on.

use serde::{Deserialize, Serialize};

/// Provider-agnostic result of classifying a raw payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    /// Payment settled; the ledger may be written.
    Approved,

    /// Payment still in flight; keep polling.
    Pending,

    /// Payment terminally failed, cancelled, or expired.
    Failed,
}

impl PaymentOutcome {
    /// Terminal outcomes stop the polling loop.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentOutcome::Pending)
    }
}

/// Maps a provider status string to its canonical outcome, case-insensitively.
///
/// Unrecognized strings classify as `Pending`: an in-flight payment must not
/// be closed out because a provider introduced a new status value. The cost
/// is that a typo'd terminal status keeps the poll loop alive until its
/// deadline (see DESIGN.md).
pub fn classify(raw_status: &str) -> PaymentOutcome {
    match raw_status.to_lowercase().as_str() {
        "paid" | "approved" | "confirmed" | "completed" => PaymentOutcome::Approved,
        "failed" | "cancelled" | "canceled" | "expired" | "rejected" => PaymentOutcome::Failed,
        _ => PaymentOutcome::Pending,
    }
}
