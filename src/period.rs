//! Fiscal period labels
//!
//! Disclosures label each reporting interval as `YY.MM-MM`: a two-digit year,
//! the start month and the end month (e.g. `24.07-09`). The end month drives
//! quarter classification and `(year, end_month)` drives ordering.

use crate::error::{MetricsError, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Parsed `YY.MM-MM` period label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FiscalPeriod {
    /// Two-digit year as printed in the label
    pub year: u32,
    pub start_month: u32,
    pub end_month: u32,
}

impl FiscalPeriod {
    /// Parse a period label such as `24.07-09`
    pub fn parse(label: &str) -> Result<Self> {
        let malformed = || MetricsError::MalformedPeriod(label.to_string());
        let trimmed = label.trim();

        let (year, months) = trimmed.split_once('.').ok_or_else(malformed)?;
        let (start, end) = months.split_once('-').ok_or_else(malformed)?;

        let year = parse_digits(year, 2).ok_or_else(malformed)?;
        let start_month = parse_month(start).ok_or_else(malformed)?;
        let end_month = parse_month(end).ok_or_else(malformed)?;

        Ok(Self {
            year,
            start_month,
            end_month,
        })
    }

    /// Chronological key: `(year, end_month)`
    pub fn sort_key(&self) -> (u32, u32) {
        (self.year, self.end_month)
    }
}

impl FromStr for FiscalPeriod {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for FiscalPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}.{:02}-{:02}",
            self.year, self.start_month, self.end_month
        )
    }
}

/// Total order over raw period labels.
///
/// Parsed labels compare by `(year, end_month)`; labels that do not parse sort
/// before every parsed label and among themselves by raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodKey {
    parsed: Option<(u32, u32)>,
    label: String,
}

impl PeriodKey {
    pub fn from_label(label: &str) -> Self {
        Self {
            parsed: FiscalPeriod::parse(label).ok().map(|p| p.sort_key()),
            label: label.trim().to_string(),
        }
    }

    /// Whether the label parsed as a fiscal period
    pub fn is_parsed(&self) -> bool {
        self.parsed.is_some()
    }
}

impl Ord for PeriodKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parsed
            .cmp(&other.parsed)
            .then_with(|| self.label.cmp(&other.label))
    }
}

impl PartialOrd for PeriodKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn parse_digits(text: &str, width: usize) -> Option<u32> {
    if text.len() != width || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn parse_month(text: &str) -> Option<u32> {
    parse_digits(text, 2).filter(|m| (1..=12).contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_period() {
        let p = FiscalPeriod::parse("24.07-09").unwrap();
        assert_eq!(p.year, 24);
        assert_eq!(p.start_month, 7);
        assert_eq!(p.end_month, 9);
        assert_eq!(p.to_string(), "24.07-09");
    }

    #[test]
    fn test_parse_tolerates_surrounding_whitespace() {
        assert_eq!(FiscalPeriod::parse(" 25.01-03 ").unwrap().end_month, 3);
    }

    #[test]
    fn test_malformed_periods() {
        for label in ["", "24.07", "2024.07-09", "24.07-13", "24-07.09", "ab.07-09", "24.7-9"] {
            assert!(
                matches!(FiscalPeriod::parse(label), Err(MetricsError::MalformedPeriod(_))),
                "{label:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_period_key_orders_by_year_then_end_month() {
        let mut labels = vec!["25.01-03", "24.10-12", "23.04-06", "24.04-06", "24.07-09"];
        labels.sort_by_cached_key(|l| PeriodKey::from_label(l));
        assert_eq!(
            labels,
            vec!["23.04-06", "24.04-06", "24.07-09", "24.10-12", "25.01-03"]
        );
    }

    #[test]
    fn test_unparsed_labels_sort_first() {
        let bad = PeriodKey::from_label("n/a");
        let good = PeriodKey::from_label("10.01-03");
        assert!(!bad.is_parsed());
        assert!(bad < good);
    }
}
