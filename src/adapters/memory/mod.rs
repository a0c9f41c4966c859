//! In-memory adapters for tests and local development.

mod ledger;

pub use ledger::InMemorySubscriptionLedger;
