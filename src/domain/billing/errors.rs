//! Error taxonomy for the billing core.

use thiserror::Error;

/// Errors produced by the billing core and its adapters.
///
/// The variants carry distinct handling policies:
///
/// - `Validation` — malformed client input, mapped to 400, never retried.
/// - `Auth` — webhook token mismatch, mapped to 401, no ledger mutation.
/// - `Configuration` — missing provider credentials, surfaced at adapter
///   construction rather than per request.
/// - `Upstream` — non-2xx or malformed response from a payment provider,
///   surfaced as 500 with the provider's sanitized message.
/// - `Timeout` — a network call exceeded its deadline; distinct from a
///   Failed classification, mapped to a user-facing "try again".
/// - `NotFound` / `Database` — ledger-side failures.
#[derive(Debug, Clone, Error)]
pub enum BillingError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("webhook authentication failed: {0}")]
    Auth(String),

    #[error("provider not configured: {0}")]
    Configuration(String),

    #[error("payment provider error: {0}")]
    Upstream(String),

    #[error("payment provider timed out: {0}")]
    Timeout(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(String),
}

impl BillingError {
    pub fn validation(message: impl Into<String>) -> Self {
        BillingError::Validation(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        BillingError::Auth(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        BillingError::Configuration(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        BillingError::Upstream(message.into())
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        BillingError::Timeout(message.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        BillingError::NotFound(resource.into())
    }

    pub fn database(message: impl Into<String>) -> Self {
        BillingError::Database(message.into())
    }

    /// Whether the caller may safely retry the operation as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BillingError::Timeout(_) | BillingError::Upstream(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = BillingError::upstream("HTTP 502 from gateway");
        assert!(err.to_string().contains("502"));

        let err = BillingError::not_found("subscription");
        assert_eq!(err.to_string(), "subscription not found");
    }

    #[test]
    fn retryability_by_variant() {
        assert!(BillingError::timeout("deadline").is_retryable());
        assert!(BillingError::upstream("bad gateway").is_retryable());
        assert!(!BillingError::validation("bad cvv").is_retryable());
        assert!(!BillingError::auth("bad token").is_retryable());
    }
}
