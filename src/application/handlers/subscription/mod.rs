//! Subscription entitlement checks.

mod check_subscription;

pub use check_subscription::{CheckSubscriptionHandler, CheckSubscriptionResult};
