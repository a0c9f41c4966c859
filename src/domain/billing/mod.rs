//! Billing domain: plans, payment outcomes, cards, and the subscription
//! aggregate persisted by the ledger.

mod card;
mod errors;
mod outcome;
mod plan;
mod subscription;

pub use card::CardDetails;
pub use errors::BillingError;
pub use outcome::{classify, PaymentOutcome};
pub use plan::PlanType;
pub use subscription::{
    CustomerDetails, HistoryStatus, PaymentHistoryEntry, Subscription, SubscriptionStatus,
};
