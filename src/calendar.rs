//! Fiscal calendar implementation

use crate::constants::DEFAULT_FISCAL_YEAR_END_MONTH;
use crate::error::{MetricsError, Result};
use crate::period::FiscalPeriod;
use crate::types::Quarter;
use hashbrown::HashMap;

/// Quarter-end months derived from a company's fiscal year end month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiscalCalendar {
    year_end_month: u32,
    /// End month of 1Q..4Q, indexed by `Quarter::index`
    quarter_ends: [u32; 4],
}

impl FiscalCalendar {
    /// Create a calendar for a fiscal year ending in `year_end_month` (1-12)
    pub fn new(year_end_month: u32) -> Result<Self> {
        if !(1..=12).contains(&year_end_month) {
            return Err(MetricsError::InvalidFiscalMonth(year_end_month));
        }

        let m = year_end_month;
        let q4 = m;
        let q3 = if m > 3 { m - 3 } else { m + 9 };
        let q2 = if m <= 6 { m + 6 } else { m - 6 };
        let q1 = if m <= 9 { m + 3 } else { m - 9 };

        Ok(Self {
            year_end_month,
            quarter_ends: [q1, q2, q3, q4],
        })
    }

    /// Fiscal year end month this calendar was built from
    pub fn year_end_month(&self) -> u32 {
        self.year_end_month
    }

    /// End month of the given quarter
    pub fn quarter_end_month(&self, quarter: Quarter) -> u32 {
        self.quarter_ends[quarter.index()]
    }

    /// Quarter ending in `month`, if any
    pub fn quarter_for_month(&self, month: u32) -> Option<Quarter> {
        Quarter::ALL
            .into_iter()
            .find(|q| self.quarter_end_month(*q) == month)
    }

    /// Classify a raw period label; `None` for malformed labels or off-calendar months
    pub fn classify(&self, label: &str) -> Option<Quarter> {
        FiscalPeriod::parse(label)
            .ok()
            .and_then(|p| self.classify_period(&p))
    }

    /// Classify an already parsed period
    pub fn classify_period(&self, period: &FiscalPeriod) -> Option<Quarter> {
        self.quarter_for_month(period.end_month)
    }

    /// Fiscal year a raw period label belongs to
    pub fn fiscal_year_of(&self, label: &str) -> Option<i32> {
        FiscalPeriod::parse(label)
            .ok()
            .map(|p| self.fiscal_year_of_period(&p))
    }

    /// Periods ending after the year end month belong to the next fiscal year
    pub fn fiscal_year_of_period(&self, period: &FiscalPeriod) -> i32 {
        let year = period.year as i32;
        if period.end_month > self.year_end_month {
            year + 1
        } else {
            year
        }
    }
}

impl Default for FiscalCalendar {
    fn default() -> Self {
        Self {
            year_end_month: DEFAULT_FISCAL_YEAR_END_MONTH,
            quarter_ends: [6, 9, 12, 3],
        }
    }
}

/// Determine the fiscal year end month from disclosure labels.
///
/// Annual statements are labelled `YYYY.MM`; the month of the last one wins.
/// Without annual labels the most frequent quarterly end month is used
/// (earliest seen wins a tie). Falls back to March.
pub fn infer_year_end_month<A, Q>(annual_labels: A, quarterly_labels: Q) -> u32
where
    A: IntoIterator,
    A::Item: AsRef<str>,
    Q: IntoIterator,
    Q::Item: AsRef<str>,
{
    if let Some(month) = annual_labels
        .into_iter()
        .filter_map(|l| parse_annual_month(l.as_ref()))
        .last()
    {
        return month;
    }

    let mut counts: HashMap<u32, (usize, usize)> = HashMap::new();
    for (order, label) in quarterly_labels.into_iter().enumerate() {
        if let Ok(period) = FiscalPeriod::parse(label.as_ref()) {
            let entry = counts.entry(period.end_month).or_insert((0, order));
            entry.0 += 1;
        }
    }

    counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(month, _)| month)
        .unwrap_or_else(|| {
            log::warn!(
                "Could not determine fiscal year end month, defaulting to {}",
                DEFAULT_FISCAL_YEAR_END_MONTH
            );
            DEFAULT_FISCAL_YEAR_END_MONTH
        })
}

fn parse_annual_month(label: &str) -> Option<u32> {
    let (year, month) = label.trim().split_once('.')?;
    if year.len() != 4 || month.len() != 2 {
        return None;
    }
    if !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    month.parse::<u32>().ok().filter(|m| (1..=12).contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_march_year_end() {
        let cal = FiscalCalendar::new(3).unwrap();
        assert_eq!(cal.quarter_end_month(Quarter::Q1), 6);
        assert_eq!(cal.quarter_end_month(Quarter::Q2), 9);
        assert_eq!(cal.quarter_end_month(Quarter::Q3), 12);
        assert_eq!(cal.quarter_end_month(Quarter::Q4), 3);
        assert_eq!(cal, FiscalCalendar::default());
    }

    #[test]
    fn test_december_year_end() {
        let cal = FiscalCalendar::new(12).unwrap();
        assert_eq!(cal.classify("24.01-03"), Some(Quarter::Q1));
        assert_eq!(cal.classify("24.04-06"), Some(Quarter::Q2));
        assert_eq!(cal.classify("24.07-09"), Some(Quarter::Q3));
        assert_eq!(cal.classify("24.10-12"), Some(Quarter::Q4));
    }

    #[test]
    fn test_quarter_ends_distinct_for_every_month() {
        for m in 1..=12 {
            let cal = FiscalCalendar::new(m).unwrap();
            let mut ends: Vec<u32> = Quarter::ALL.iter().map(|q| cal.quarter_end_month(*q)).collect();
            assert!(ends.iter().all(|e| (1..=12).contains(e)));
            ends.sort();
            ends.dedup();
            assert_eq!(ends.len(), 4, "month {m}");
        }
    }

    #[test]
    fn test_invalid_month_rejected() {
        assert!(matches!(FiscalCalendar::new(0), Err(MetricsError::InvalidFiscalMonth(0))));
        assert!(matches!(FiscalCalendar::new(13), Err(MetricsError::InvalidFiscalMonth(13))));
    }

    #[test]
    fn test_unclassified_periods() {
        let cal = FiscalCalendar::new(3).unwrap();
        assert_eq!(cal.classify("24.06-07"), None);
        assert_eq!(cal.classify("garbage"), None);
    }

    #[test]
    fn test_fiscal_year_of() {
        let cal = FiscalCalendar::new(3).unwrap();
        assert_eq!(cal.fiscal_year_of("24.04-06"), Some(25));
        assert_eq!(cal.fiscal_year_of("24.10-12"), Some(25));
        assert_eq!(cal.fiscal_year_of("25.01-03"), Some(25));
        assert_eq!(cal.fiscal_year_of("bad"), None);

        let dec = FiscalCalendar::new(12).unwrap();
        assert_eq!(dec.fiscal_year_of("24.10-12"), Some(24));
    }

    #[test]
    fn test_infer_from_annual_labels() {
        let annual = ["2023.03", "2024.03", "2025.09"];
        assert_eq!(infer_year_end_month(annual, Vec::<&str>::new()), 9);
    }

    #[test]
    fn test_infer_from_quarterly_labels() {
        let quarterly = ["24.04-06", "24.07-09", "25.01-03", "24.10-12", "25.04-06"];
        assert_eq!(infer_year_end_month(Vec::<&str>::new(), quarterly), 6);
    }

    #[test]
    fn test_infer_defaults_to_march() {
        assert_eq!(
            infer_year_end_month(Vec::<&str>::new(), Vec::<&str>::new()),
            DEFAULT_FISCAL_YEAR_END_MONTH
        );
    }
}
