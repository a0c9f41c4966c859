//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Checks if this timestamp is after another.
    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Creates a new timestamp by adding the specified number of days.
    pub fn add_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// Creates a new timestamp by adding calendar months.
    ///
    /// Calendar-exact: Jan 15 + 1 month = Feb 15. Day-of-month is clamped
    /// when the target month is shorter (Jan 31 + 1 month = Feb 28/29).
    pub fn add_months(&self, months: u32) -> Self {
        Self(
            self.0
                .checked_add_months(Months::new(months))
                .unwrap_or(self.0),
        )
    }

    /// Creates a new timestamp by adding calendar years.
    pub fn add_years(&self, years: u32) -> Self {
        self.add_months(years * 12)
    }

    /// Creates a new timestamp by adding the specified number of seconds.
    pub fn plus_secs(&self, secs: u64) -> Self {
        Self(self.0 + Duration::seconds(secs as i64))
    }

    /// Parses an RFC 3339 timestamp string.
    pub fn parse_rfc3339(s: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| Self(dt.with_timezone(&Utc)))
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse_rfc3339(s).unwrap()
    }

    #[test]
    fn add_months_is_calendar_exact() {
        assert_eq!(ts("2024-01-15T00:00:00Z").add_months(1), ts("2024-02-15T00:00:00Z"));
        assert_eq!(ts("2024-12-10T08:30:00Z").add_months(1), ts("2025-01-10T08:30:00Z"));
    }

    #[test]
    fn add_months_clamps_short_months() {
        assert_eq!(ts("2024-01-31T00:00:00Z").add_months(1), ts("2024-02-29T00:00:00Z"));
        assert_eq!(ts("2023-01-31T00:00:00Z").add_months(1), ts("2023-02-28T00:00:00Z"));
    }

    #[test]
    fn add_years_handles_leap_day() {
        assert_eq!(ts("2024-02-29T12:00:00Z").add_years(1), ts("2025-02-28T12:00:00Z"));
        assert_eq!(ts("2024-01-15T00:00:00Z").add_years(1), ts("2025-01-15T00:00:00Z"));
    }

    #[test]
    fn ordering_comparisons() {
        let earlier = ts("2024-01-01T00:00:00Z");
        let later = ts("2024-06-01T00:00:00Z");
        assert!(earlier.is_before(&later));
        assert!(later.is_after(&earlier));
        assert!(!earlier.is_after(&later));
    }

    #[test]
    fn parse_rfc3339_rejects_garbage() {
        assert!(Timestamp::parse_rfc3339("not-a-date").is_none());
    }
}
