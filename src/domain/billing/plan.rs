//! Subscription plan types and period arithmetic.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

/// Subscription plan duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    Monthly,
    Annual,
}

impl PlanType {
    /// Plan price in BRL.
    pub fn price(&self) -> f64 {
        match self {
            PlanType::Monthly => 29.90,
            PlanType::Annual => 179.90,
        }
    }

    /// Computes the expiry for a period starting at `now`.
    ///
    /// Calendar-exact: one month for monthly, one year for annual. Renewals
    /// call this with the renewal moment, not the previous expiry, so a late
    /// renewal does not carry forward missed days.
    pub fn expiry_from(&self, now: Timestamp) -> Timestamp {
        match self {
            PlanType::Monthly => now.add_months(1),
            PlanType::Annual => now.add_years(1),
        }
    }

    /// Infers the plan from a checkout product name.
    ///
    /// The webhook provider carries no plan field, only the product name;
    /// annual products are labeled "anual"/"annual" in either storefront
    /// language.
    pub fn from_product_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("anual") || lower.contains("annual") {
            PlanType::Annual
        } else {
            PlanType::Monthly
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Monthly => "monthly",
            PlanType::Annual => "annual",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "monthly" => Some(PlanType::Monthly),
            "annual" => Some(PlanType::Annual),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse_rfc3339(s).unwrap()
    }

    #[test]
    fn monthly_expiry_is_one_calendar_month() {
        let expiry = PlanType::Monthly.expiry_from(ts("2024-01-15T00:00:00Z"));
        assert_eq!(expiry, ts("2024-02-15T00:00:00Z"));
    }

    #[test]
    fn annual_expiry_is_one_calendar_year() {
        let expiry = PlanType::Annual.expiry_from(ts("2024-01-15T00:00:00Z"));
        assert_eq!(expiry, ts("2025-01-15T00:00:00Z"));
    }

    #[test]
    fn plan_inference_from_product_name() {
        assert_eq!(PlanType::from_product_name("CalmWave Anual"), PlanType::Annual);
        assert_eq!(PlanType::from_product_name("Annual Plan"), PlanType::Annual);
        assert_eq!(PlanType::from_product_name("CalmWave Mensal"), PlanType::Monthly);
        assert_eq!(PlanType::from_product_name(""), PlanType::Monthly);
    }

    #[test]
    fn string_roundtrip() {
        for plan in [PlanType::Monthly, PlanType::Annual] {
            assert_eq!(PlanType::parse(plan.as_str()), Some(plan));
        }
        assert_eq!(PlanType::parse("weekly"), None);
    }

    #[test]
    fn plan_prices() {
        assert_eq!(PlanType::Monthly.price(), 29.90);
        assert_eq!(PlanType::Annual.price(), 179.90);
    }
}
