//! Metric constants and defaults
//!
//! Contains default values and constants used throughout the metrics pipeline

/// Fiscal year end month assumed when none can be determined (March)
pub const DEFAULT_FISCAL_YEAR_END_MONTH: u32 = 3;

/// Trailing window length (current quarter plus three preceding)
pub const TRAILING_WINDOW: usize = 4;

/// Positional distance to the year-ago quarter
pub const YEAR_AGO_OFFSET: usize = 4;

/// Yield annualization multipliers for 1Q..4Q cumulative income
pub const ANNUALIZATION_FACTORS: [f64; 4] = [4.0, 2.0, 1.33, 1.0];

/// Days between announcement and the first eligible price observation
pub const DEFAULT_PRICE_OFFSET_DAYS: i64 = 1;

/// Number of most recent quarters used for price correlation
pub const CORRELATION_QUARTERS: usize = 3;

/// Decimal places for percentage metrics
pub const METRIC_DECIMALS: i32 = 2;

/// Decimal places for correlation coefficients
pub const CORRELATION_DECIMALS: i32 = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(DEFAULT_FISCAL_YEAR_END_MONTH, 3);
        assert_eq!(TRAILING_WINDOW, YEAR_AGO_OFFSET);
        assert_eq!(ANNUALIZATION_FACTORS[3], 1.0);
        assert!(DEFAULT_PRICE_OFFSET_DAYS > 0);
        assert_eq!(CORRELATION_QUARTERS, 3);
    }
}
