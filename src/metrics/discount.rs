//! Discount rates: how the income yield moved
//!
//! Three signals over the yield series, most recent first:
//! - `discount_avg`: yield change normalized by the trailing window
//! - `discount_yoy`: yield minus the year-ago yield
//! - `discount_qoq`: yield minus the previous quarter's yield

use crate::config::YearAgoPolicy;
use crate::events::{
    report_metric, DerivedField, PipelineEvent, PipelineObserver, SkipReason, Stage,
};
use crate::metrics::window::TrailingSeries;
use crate::record::{sort_descending, QuarterlyRecord};
use crate::types::Quarter;

/// Computes the three discount fields from `income_yield`
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscountRateCalculator {
    policy: YearAgoPolicy,
}

impl DiscountRateCalculator {
    pub fn new(policy: YearAgoPolicy) -> Self {
        Self { policy }
    }

    /// Fill discount fields. Leaves `records` sorted most recent first.
    pub fn apply(&self, records: &mut [QuarterlyRecord], observer: &mut dyn PipelineObserver) {
        observer.on_event(&PipelineEvent::StageStarted {
            stage: Stage::Discount,
            records: records.len(),
        });
        sort_descending(records);

        let quarters: Vec<Option<Quarter>> = records.iter().map(|r| r.quarter).collect();
        let yields: Vec<Option<f64>> = records
            .iter()
            .map(|r| r.parsed_value(r.income_yield))
            .collect();
        let series = TrailingSeries::new(&yields, &quarters, self.policy);

        for (i, record) in records.iter_mut().enumerate() {
            let outcomes = if record.is_well_formed() {
                [
                    series.normalized_change(i),
                    series.year_over_year(i),
                    series.quarter_over_quarter(i),
                ]
            } else {
                [Err(SkipReason::MalformedPeriod); 3]
            };
            let [avg, yoy, qoq] = outcomes;

            record.discount_avg =
                report_metric(observer, &record.period, DerivedField::DiscountAvg, avg);
            record.discount_yoy =
                report_metric(observer, &record.period, DerivedField::DiscountYoy, yoy);
            record.discount_qoq =
                report_metric(observer, &record.period, DerivedField::DiscountQoq, qoq);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NullObserver;
    use approx::assert_relative_eq;

    fn with_yields(rows: &[(&str, Option<f64>)]) -> Vec<QuarterlyRecord> {
        rows.iter()
            .map(|(period, y)| QuarterlyRecord {
                period: period.to_string(),
                income_yield: *y,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_discount_rates() {
        let mut data = with_yields(&[
            ("23.04-06", Some(4.0)),
            ("24.04-06", Some(5.0)),
            ("24.07-09", Some(6.0)),
            ("24.10-12", Some(7.0)),
            ("25.01-03", Some(8.0)),
        ]);

        DiscountRateCalculator::default().apply(&mut data, &mut NullObserver);
        let latest = &data[0];
        assert_eq!(latest.period, "25.01-03");

        // (8 - 4) / (8 + 7 + 6 + 5) * 100
        assert_relative_eq!(latest.discount_avg.unwrap(), 15.38, epsilon = 1e-9);
        assert_relative_eq!(latest.discount_yoy.unwrap(), 4.0, epsilon = 1e-9);
        assert_relative_eq!(latest.discount_qoq.unwrap(), 1.0, epsilon = 1e-9);

        assert!(data[1].discount_avg.is_none());
        assert!(data[1].discount_yoy.is_none());
        assert_relative_eq!(data[1].discount_qoq.unwrap(), 1.0, epsilon = 1e-9);
        assert!(data[4].discount_qoq.is_none());
    }

    #[test]
    fn test_malformed_row_is_not_a_previous_quarter() {
        let mut data = with_yields(&[("bogus", Some(3.0)), ("24.04-06", Some(5.0))]);
        DiscountRateCalculator::default().apply(&mut data, &mut NullObserver);

        assert_eq!(data[1].period, "bogus");
        assert!(data[0].discount_qoq.is_none());
        assert!(data[1].discount_qoq.is_none());
        assert!(data[1].discount_yoy.is_none());
    }

    #[test]
    fn test_missing_previous_yield() {
        let mut data = with_yields(&[("24.07-09", None), ("24.10-12", Some(7.0))]);
        DiscountRateCalculator::default().apply(&mut data, &mut NullObserver);
        assert!(data[0].discount_qoq.is_none());
        assert!(data[1].discount_qoq.is_none());
    }
}
