//! PostgreSQL adapters.

mod ledger;

pub use ledger::PostgresSubscriptionLedger;
