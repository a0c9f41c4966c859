//! Email address value object.

use serde::{Deserialize, Serialize};

use crate::domain::billing::BillingError;

/// Validated email address, the natural key for subscriber lookups.
///
/// Validation mirrors the checkout form contract: one `@`, non-empty local
/// part, and a domain containing a dot. Stored lowercased so ledger lookups
/// are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, BillingError> {
        let raw = raw.as_ref().trim();
        if raw.is_empty() {
            return Err(BillingError::validation("customer.email is required"));
        }

        let mut parts = raw.splitn(2, '@');
        let local = parts.next().unwrap_or_default();
        let domain = parts.next().unwrap_or_default();

        let local_ok = !local.is_empty() && !local.contains(char::is_whitespace);
        let domain_ok = domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !domain.contains(char::is_whitespace);

        if !local_ok || !domain_ok {
            return Err(BillingError::validation(format!("invalid email: {raw}")));
        }

        Ok(Self(raw.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_addresses() {
        assert!(EmailAddress::new("ana@example.com").is_ok());
        assert!(EmailAddress::new("joao.silva+tag@mail.example.br").is_ok());
    }

    #[test]
    fn lowercases_for_lookup_stability() {
        let email = EmailAddress::new("Ana@Example.COM").unwrap();
        assert_eq!(email.as_str(), "ana@example.com");
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(EmailAddress::new("").is_err());
        assert!(EmailAddress::new("no-at-sign").is_err());
        assert!(EmailAddress::new("a@b").is_err());
        assert!(EmailAddress::new("a b@example.com").is_err());
        assert!(EmailAddress::new("a@.com").is_err());
    }
}
