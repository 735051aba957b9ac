//! Correlation between fundamentals and post-announcement prices
//!
//! Only the three most recent quarters take part, and the coefficients are
//! written to the most recent record alone: each run describes the
//! correlation as of that snapshot, not a per-row rolling value.

use crate::constants::{CORRELATION_DECIMALS, CORRELATION_QUARTERS};
use crate::events::{report_metric, DerivedField, PipelineEvent, PipelineObserver, SkipReason, Stage};
use crate::metrics::window::round_to;
use crate::record::{sort_descending, QuarterlyRecord};
use statrs::statistics::{Data, Distribution};

/// Pearson correlation coefficient of two equally long samples.
///
/// `None` when fewer than two pairs exist or either sample is constant.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let x_data = Data::new(x.to_vec());
    let y_data = Data::new(y.to_vec());

    let x_mean = x_data.mean()?;
    let y_mean = y_data.mean()?;

    let covariance: f64 = x
        .iter()
        .zip(y.iter())
        .map(|(&xi, &yi)| (xi - x_mean) * (yi - y_mean))
        .sum::<f64>()
        / (x.len() - 1) as f64;

    let x_std = x_data.std_dev()?;
    let y_std = y_data.std_dev()?;

    if x_std == 0.0 || y_std == 0.0 {
        None
    } else {
        Some((covariance / (x_std * y_std)).clamp(-1.0, 1.0))
    }
}

/// Computes `growth_price_corr` and `yield_price_corr`
#[derive(Debug, Clone, Copy)]
pub struct CorrelationEngine {
    quarters: usize,
}

impl Default for CorrelationEngine {
    fn default() -> Self {
        Self {
            quarters: CORRELATION_QUARTERS,
        }
    }
}

impl CorrelationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill correlations on the most recent record and clear them elsewhere.
    /// Leaves `records` sorted most recent first.
    pub fn apply(&self, records: &mut [QuarterlyRecord], observer: &mut dyn PipelineObserver) {
        observer.on_event(&PipelineEvent::StageStarted {
            stage: Stage::Correlation,
            records: records.len(),
        });
        sort_descending(records);

        for record in records.iter_mut() {
            record.growth_price_corr = None;
            record.yield_price_corr = None;
        }

        if records.len() < self.quarters {
            log::debug!(
                "Correlation needs {} quarters, only {} available",
                self.quarters,
                records.len()
            );
            return;
        }

        let latest = &records[..self.quarters];
        let growth = self.correlate(latest, |r| r.income_growth);
        let yields = self.correlate(latest, |r| r.income_yield);

        let head = &mut records[0];
        head.growth_price_corr =
            report_metric(observer, &head.period, DerivedField::GrowthPriceCorr, growth);
        head.yield_price_corr =
            report_metric(observer, &head.period, DerivedField::YieldPriceCorr, yields);
    }

    fn correlate<F>(&self, latest: &[QuarterlyRecord], signal: F) -> std::result::Result<f64, SkipReason>
    where
        F: Fn(&QuarterlyRecord) -> Option<f64>,
    {
        let (xs, ys): (Vec<f64>, Vec<f64>) = latest
            .iter()
            .filter_map(|r| Some((signal(r)?, r.price_open?)))
            .unzip();

        if xs.len() != self.quarters {
            return Err(SkipReason::InsufficientPairs(xs.len()));
        }
        pearson(&xs, &ys)
            .map(|r| round_to(r, CORRELATION_DECIMALS))
            .ok_or(SkipReason::ZeroVariance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CollectingObserver, NullObserver};
    use approx::assert_relative_eq;

    fn row(period: &str, growth: Option<f64>, yld: Option<f64>, price: Option<f64>) -> QuarterlyRecord {
        QuarterlyRecord {
            period: period.to_string(),
            income_growth: growth,
            income_yield: yld,
            price_open: price,
            ..Default::default()
        }
    }

    #[test]
    fn test_pearson() {
        assert_relative_eq!(pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap(), -1.0, epsilon = 1e-12);
        // r = 0.5 for this triple
        assert_relative_eq!(pearson(&[1.0, 2.0, 3.0], &[1.0, 3.0, 2.0]).unwrap(), 0.5, epsilon = 1e-12);
        assert_eq!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(pearson(&[1.0], &[1.0]), None);
    }

    #[test]
    fn test_only_latest_record_gets_correlation() {
        let mut data = vec![
            row("24.01-03", Some(9.0), Some(9.0), Some(900.0)),
            row("24.04-06", Some(1.0), Some(3.0), Some(100.0)),
            row("24.07-09", Some(2.0), Some(2.0), Some(200.0)),
            row("24.10-12", Some(3.0), Some(1.0), Some(300.0)),
        ];
        data[0].growth_price_corr = Some(0.9);

        CorrelationEngine::new().apply(&mut data, &mut NullObserver);

        assert_eq!(data[0].period, "24.10-12");
        assert_relative_eq!(data[0].growth_price_corr.unwrap(), 1.0);
        assert_relative_eq!(data[0].yield_price_corr.unwrap(), -1.0);
        assert!(data[1..]
            .iter()
            .all(|r| r.growth_price_corr.is_none() && r.yield_price_corr.is_none()));
    }

    #[test]
    fn test_two_pairs_are_not_enough() {
        let mut data = vec![
            row("24.04-06", Some(1.0), Some(3.0), None),
            row("24.07-09", Some(2.0), Some(2.0), Some(200.0)),
            row("24.10-12", Some(3.0), Some(1.0), Some(300.0)),
        ];
        let mut observer = CollectingObserver::new();
        CorrelationEngine::new().apply(&mut data, &mut observer);

        assert!(data[0].growth_price_corr.is_none());
        assert_eq!(
            observer.skips_for("24.10-12", DerivedField::GrowthPriceCorr),
            vec![SkipReason::InsufficientPairs(2)]
        );
    }

    #[test]
    fn test_fewer_than_three_records() {
        let mut data = vec![
            row("24.07-09", Some(2.0), Some(2.0), Some(200.0)),
            row("24.10-12", Some(3.0), Some(1.0), Some(300.0)),
        ];
        CorrelationEngine::new().apply(&mut data, &mut NullObserver);
        assert!(data.iter().all(|r| r.growth_price_corr.is_none()));
    }

    #[test]
    fn test_rounding_to_three_decimals() {
        let mut data = vec![
            row("24.04-06", Some(1.0), None, Some(10.0)),
            row("24.07-09", Some(2.0), None, Some(30.0)),
            row("24.10-12", Some(4.0), None, Some(35.0)),
        ];
        CorrelationEngine::new().apply(&mut data, &mut NullObserver);

        let expected = pearson(&[4.0, 2.0, 1.0], &[35.0, 30.0, 10.0]).unwrap();
        assert_eq!(data[0].growth_price_corr, Some(round_to(expected, 3)));
        assert!(data[0].yield_price_corr.is_none());
    }
}
