//! Trailing-window arithmetic shared by growth and discount metrics
//!
//! A `TrailingSeries` views one metric over records sorted most recent first.
//! Index `i` is the current quarter, `i + 1` the previous one and `i + 4` the
//! year-ago quarter. The window at `i` is `[i, i + 1, i + 2, i + 3]`.

use crate::config::YearAgoPolicy;
use crate::constants::{METRIC_DECIMALS, TRAILING_WINDOW, YEAR_AGO_OFFSET};
use crate::events::SkipReason;
use crate::types::Quarter;

/// Round to `decimals` places by the exact binary value of `value`.
///
/// Scaling by `10^decimals` first can land a value on the wrong side of a
/// boundary (`7.665 * 100 == 766.5`), so rounding goes through decimal
/// formatting instead.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() || decimals < 0 {
        return value;
    }
    format!("{:.*}", decimals as usize, value)
        .parse()
        .unwrap_or(value)
}

/// Outcome of a windowed computation
pub type Outcome = std::result::Result<f64, SkipReason>;

/// One metric over a descending (most recent first) record sequence
#[derive(Debug, Clone, Copy)]
pub struct TrailingSeries<'a> {
    values: &'a [Option<f64>],
    quarters: &'a [Option<Quarter>],
    policy: YearAgoPolicy,
}

impl<'a> TrailingSeries<'a> {
    /// `values` and `quarters` must be index-aligned
    pub fn new(
        values: &'a [Option<f64>],
        quarters: &'a [Option<Quarter>],
        policy: YearAgoPolicy,
    ) -> Self {
        debug_assert_eq!(values.len(), quarters.len());
        Self {
            values,
            quarters,
            policy,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of the current quarter
    pub fn current(&self, i: usize) -> Outcome {
        self.values
            .get(i)
            .copied()
            .flatten()
            .ok_or(SkipReason::MissingValue)
    }

    /// Value four positions back, subject to the year-ago policy
    pub fn year_ago(&self, i: usize) -> Outcome {
        let j = i + YEAR_AGO_OFFSET;
        if j >= self.len() {
            return Err(SkipReason::NoYearAgo);
        }
        let value = self.values[j].ok_or(SkipReason::MissingYearAgo)?;

        if self.policy == YearAgoPolicy::MatchQuarter {
            match (self.quarters[i], self.quarters[j]) {
                (Some(a), Some(b)) if a == b => {}
                _ => return Err(SkipReason::QuarterMismatch),
            }
        }
        Ok(value)
    }

    /// Value one position back
    pub fn previous(&self, i: usize) -> Outcome {
        let j = i + 1;
        if j >= self.len() {
            return Err(SkipReason::NoPreviousQuarter);
        }
        self.values[j].ok_or(SkipReason::MissingPrevious)
    }

    /// Sum of absolute values over the trailing window.
    ///
    /// The window is gathered from the current quarter backwards and stops at
    /// the first gap; anything short of a full window is rejected.
    pub fn window_abs_sum(&self, i: usize) -> Outcome {
        let mut window = Vec::with_capacity(TRAILING_WINDOW);
        window.push(self.current(i)?);

        for j in 1..TRAILING_WINDOW {
            match self.values.get(i + j).copied().flatten() {
                Some(v) => window.push(v),
                None => break,
            }
        }

        if window.len() != TRAILING_WINDOW {
            return Err(SkipReason::IncompleteWindow);
        }
        Ok(window.iter().map(|v| v.abs()).sum())
    }

    /// `(v[i] - v[i+4]) / sum(|v[i..i+4]|) * 100`
    pub fn normalized_change(&self, i: usize) -> Outcome {
        let current = self.current(i)?;
        let year_ago = self.year_ago(i)?;
        let denominator = self.window_abs_sum(i)?;

        if denominator == 0.0 {
            return Err(SkipReason::ZeroDenominator);
        }
        Ok(round_to(
            (current - year_ago) / denominator * 100.0,
            METRIC_DECIMALS,
        ))
    }

    /// `v[i] - v[i+4]`
    pub fn year_over_year(&self, i: usize) -> Outcome {
        let current = self.current(i)?;
        let year_ago = self.year_ago(i)?;
        Ok(round_to(current - year_ago, METRIC_DECIMALS))
    }

    /// `v[i] - v[i+1]`
    pub fn quarter_over_quarter(&self, i: usize) -> Outcome {
        let current = self.current(i)?;
        let previous = self.previous(i)?;
        Ok(round_to(current - previous, METRIC_DECIMALS))
    }
}
