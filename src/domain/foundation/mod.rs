//! Shared value objects used across the domain.

mod email;
mod timestamp;

pub use email::EmailAddress;
pub use timestamp::Timestamp;
