//! Date-partitioned index naming.
//!
//! Nodes are written into one index per UTC calendar day. The index name is
//! produced by substituting the date into a configured pattern:
//!
//! ```text
//! nodestore-{date}  ->  nodestore-2024-01-05
//! ```
//!
//! The same scheme is used in reverse by the retention sweep, which recovers the
//! date from index names found behind the alias. Names may carry a trailing
//! suffix after the date (`nodestore-2023-06-01-reindex`) and still parse.

use std::fmt::Debug;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;

use crate::error::ValidationError;

/// Placeholder replaced by the partition date.
pub const DATE_PLACEHOLDER: &str = "{date}";

/// Date format embedded in partition index names.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Default index naming pattern.
pub const DEFAULT_INDEX_PATTERN: &str = "nodestore-{date}";

/// Source of the current time.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// The process clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stopped at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Creates a clock stopped at midnight UTC of the given date.
    pub fn at_date(date: NaiveDate) -> Self {
        Self(start_of_day(date))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Returns midnight UTC of `date`.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Why an index name was not recognized as a partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The name does not start with `<prefix>YYYY-MM-DD`.
    PatternMismatch,
    /// The name has the right shape but the date is not a calendar date.
    InvalidDate(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::PatternMismatch => {
                write!(f, "index name does not match expected pattern")
            }
            SkipReason::InvalidDate(e) => write!(f, "failed to parse date: {}", e),
        }
    }
}

/// Builds and parses partition index names.
#[derive(Debug, Clone)]
pub struct PartitionScheme {
    pattern: String,
    prefix: String,
    date_regex: Regex,
}

impl PartitionScheme {
    /// Creates a scheme from a naming pattern such as `nodestore-{date}`.
    ///
    /// The pattern must contain the `{date}` placeholder exactly once, preceded
    /// by a non-empty prefix. The prefix is what the index template and the
    /// retention sweep match on.
    pub fn new(pattern: impl Into<String>) -> Result<Self, ValidationError> {
        let pattern = pattern.into();
        let invalid = |message: &str| ValidationError::InvalidIndexPattern {
            pattern: pattern.clone(),
            message: message.to_string(),
        };

        match pattern.matches(DATE_PLACEHOLDER).count() {
            0 => return Err(invalid("missing {date} placeholder")),
            1 => {}
            _ => return Err(invalid("{date} placeholder must appear exactly once")),
        }

        let prefix = pattern
            .split(DATE_PLACEHOLDER)
            .next()
            .unwrap_or_default()
            .to_string();
        if prefix.is_empty() {
            return Err(invalid("a prefix is required before {date}"));
        }
        if prefix.contains(['*', ',', ' ']) {
            return Err(invalid("prefix must not contain '*', ',' or spaces"));
        }

        let date_regex = Regex::new(&format!(
            r"^{}(\d{{4}}-\d{{2}}-\d{{2}})",
            regex::escape(&prefix)
        ))
        .map_err(|e| invalid(&e.to_string()))?;

        Ok(Self {
            pattern,
            prefix,
            date_regex,
        })
    }

    /// Returns the naming pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the fixed part of index names preceding the date.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the index name for a given date.
    pub fn index_for_date(&self, date: NaiveDate) -> String {
        self.pattern
            .replace(DATE_PLACEHOLDER, &date.format(DATE_FORMAT).to_string())
    }

    /// Returns the index that writes go to right now.
    pub fn write_index(&self, clock: &dyn Clock) -> String {
        self.index_for_date(clock.now().date_naive())
    }

    /// Returns the index pattern bound to the template (`<prefix>*`).
    pub fn template_pattern(&self) -> String {
        format!("{}*", self.prefix)
    }

    /// Recovers the partition date embedded in an index name.
    pub fn parse_index_date(&self, index: &str) -> Result<NaiveDate, SkipReason> {
        let captures = self
            .date_regex
            .captures(index)
            .ok_or(SkipReason::PatternMismatch)?;
        let date = &captures[1];
        NaiveDate::parse_from_str(date, DATE_FORMAT)
            .map_err(|e| SkipReason::InvalidDate(format!("{}: {}", date, e)))
    }
}

impl Default for PartitionScheme {
    fn default() -> Self {
        // The default pattern is statically valid.
        match Self::new(DEFAULT_INDEX_PATTERN) {
            Ok(scheme) => scheme,
            Err(e) => unreachable!("default index pattern rejected: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_index_for_date() {
        let scheme = PartitionScheme::new("sentry-{date}").unwrap();
        assert_eq!(scheme.index_for_date(date("2024-01-05")), "sentry-2024-01-05");
        assert_eq!(scheme.prefix(), "sentry-");
        assert_eq!(scheme.template_pattern(), "sentry-*");
    }

    #[test]
    fn test_write_index_uses_utc_date() {
        let scheme = PartitionScheme::default();
        let clock = FixedClock(
            DateTime::parse_from_rfc3339("2024-03-01T23:30:00-05:00")
                .unwrap()
                .with_timezone(&Utc),
        );
        assert_eq!(scheme.write_index(&clock), "nodestore-2024-03-02");
    }

    #[test]
    fn test_pattern_with_suffix() {
        let scheme = PartitionScheme::new("nodes-{date}-v2").unwrap();
        assert_eq!(scheme.index_for_date(date("2024-01-01")), "nodes-2024-01-01-v2");
        assert_eq!(
            scheme.parse_index_date("nodes-2024-01-01-v2"),
            Ok(date("2024-01-01"))
        );
    }

    #[test]
    fn test_rejects_invalid_patterns() {
        assert!(PartitionScheme::new("nodestore").is_err());
        assert!(PartitionScheme::new("{date}").is_err());
        assert!(PartitionScheme::new("a-{date}-{date}").is_err());
        assert!(PartitionScheme::new("a*-{date}").is_err());
    }

    #[test]
    fn test_parse_index_date() {
        let scheme = PartitionScheme::new("sentry-{date}").unwrap();
        assert_eq!(
            scheme.parse_index_date("sentry-2024-01-03"),
            Ok(date("2024-01-03"))
        );
        assert_eq!(
            scheme.parse_index_date("sentry-2023-06-01-reindex"),
            Ok(date("2023-06-01"))
        );
        assert_eq!(
            scheme.parse_index_date("sentry-2023-06-01-fixed"),
            Ok(date("2023-06-01"))
        );
    }

    #[test]
    fn test_parse_index_date_skips_foreign_names() {
        let scheme = PartitionScheme::new("sentry-{date}").unwrap();
        assert_eq!(
            scheme.parse_index_date("sentry-weird"),
            Err(SkipReason::PatternMismatch)
        );
        assert_eq!(
            scheme.parse_index_date("other-2024-01-01"),
            Err(SkipReason::PatternMismatch)
        );
        assert_eq!(
            scheme.parse_index_date("xsentry-2024-01-01"),
            Err(SkipReason::PatternMismatch)
        );
    }

    #[test]
    fn test_parse_index_date_rejects_impossible_dates() {
        let scheme = PartitionScheme::new("sentry-{date}").unwrap();
        let result = scheme.parse_index_date("sentry-2024-13-40");
        assert!(matches!(result, Err(SkipReason::InvalidDate(_))));
    }

    #[test]
    fn test_prefix_is_matched_literally() {
        let scheme = PartitionScheme::new("node.store-{date}").unwrap();
        assert!(scheme.parse_index_date("node.store-2024-01-01").is_ok());
        assert_eq!(
            scheme.parse_index_date("nodeXstore-2024-01-01"),
            Err(SkipReason::PatternMismatch)
        );
    }

    #[test]
    fn test_fixed_clock_at_date() {
        let clock = FixedClock::at_date(date("2024-01-03"));
        assert_eq!(clock.now().to_rfc3339(), "2024-01-03T00:00:00+00:00");
    }
}
