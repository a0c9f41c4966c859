//! Credit card details with validation and mandatory redaction.
//!
//! # Security
//!
//! Card numbers never reach logs or telemetry unredacted: the `Debug`
//! implementation and `redacted_number()` both mask everything except the
//! last four digits, and the CVV is never printed at all.

use serde::{Deserialize, Serialize};

use super::BillingError;

/// Card data accepted by the checkout endpoint.
///
/// Serialized verbatim to the polling provider; everything rendered locally
/// goes through the redacted accessors.
#[derive(Clone, Serialize, Deserialize)]
pub struct CardDetails {
    pub number: String,
    pub holder_name: String,
    /// Expiry in `MM/YY` form.
    pub expiry_date: String,
    pub cvv: String,
}

impl CardDetails {
    /// Validates the card against the checkout contract.
    ///
    /// - number: 13-19 digits after stripping spaces
    /// - expiry: `MM/YY` with month 01-12
    /// - cvv: 3-4 digits
    pub fn validate(&self) -> Result<(), BillingError> {
        let number: String = self.number.chars().filter(|c| !c.is_whitespace()).collect();
        if number.len() < 13 || number.len() > 19 || !number.chars().all(|c| c.is_ascii_digit()) {
            return Err(BillingError::validation("invalid card number"));
        }

        if self.holder_name.trim().is_empty() {
            return Err(BillingError::validation("card holder name is required"));
        }

        let expiry_ok = self.expiry_date.is_ascii()
            && self.expiry_date.len() == 5
            && self.expiry_date.as_bytes()[2] == b'/'
            && self.expiry_date[..2].chars().all(|c| c.is_ascii_digit())
            && self.expiry_date[3..].chars().all(|c| c.is_ascii_digit());
        if !expiry_ok {
            return Err(BillingError::validation(
                "invalid expiry date, expected MM/YY",
            ));
        }
        let month: u8 = self.expiry_date[..2].parse().unwrap_or(0);
        if !(1..=12).contains(&month) {
            return Err(BillingError::validation("invalid expiry month"));
        }

        if self.cvv.len() < 3 || self.cvv.len() > 4 || !self.cvv.chars().all(|c| c.is_ascii_digit())
        {
            return Err(BillingError::validation("invalid CVV"));
        }

        Ok(())
    }

    /// Card number with all but the last four digits masked.
    pub fn redacted_number(&self) -> String {
        let digits: String = self.number.chars().filter(|c| !c.is_whitespace()).collect();
        let last4 = if digits.len() >= 4 {
            &digits[digits.len() - 4..]
        } else {
            digits.as_str()
        };
        format!("****{last4}")
    }
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &self.redacted_number())
            .field("holder_name", &self.holder_name)
            .field("expiry_date", &self.expiry_date)
            .field("cvv", &"***")
            .finish()
    }
}
