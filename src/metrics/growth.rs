//! Trailing four-quarter growth of revenue and ordinary income
//!
//! Growth is normalized by the sum of absolute values over the trailing
//! window, not by the year-ago value.

use crate::config::YearAgoPolicy;
use crate::events::{
    report_metric, DerivedField, PipelineEvent, PipelineObserver, SkipReason, Stage,
};
use crate::metrics::window::TrailingSeries;
use crate::record::{sort_descending, QuarterlyRecord};
use crate::types::Quarter;

/// Computes `revenue_growth` and `income_growth`
#[derive(Debug, Clone, Copy, Default)]
pub struct GrowthCalculator {
    policy: YearAgoPolicy,
}

impl GrowthCalculator {
    pub fn new(policy: YearAgoPolicy) -> Self {
        Self { policy }
    }

    /// Fill growth fields. Leaves `records` sorted most recent first.
    pub fn apply(&self, records: &mut [QuarterlyRecord], observer: &mut dyn PipelineObserver) {
        observer.on_event(&PipelineEvent::StageStarted {
            stage: Stage::Growth,
            records: records.len(),
        });
        sort_descending(records);

        // Rows with unparsable periods never enter a window or a year-ago slot
        let well_formed: Vec<bool> = records.iter().map(|r| r.is_well_formed()).collect();
        let quarters: Vec<Option<Quarter>> = records.iter().map(|r| r.quarter).collect();
        let revenue: Vec<Option<f64>> = records.iter().map(|r| r.parsed_value(r.revenue)).collect();
        let income: Vec<Option<f64>> = records
            .iter()
            .map(|r| r.parsed_value(r.ordinary_income))
            .collect();

        let revenue = TrailingSeries::new(&revenue, &quarters, self.policy);
        let income = TrailingSeries::new(&income, &quarters, self.policy);

        for (i, record) in records.iter_mut().enumerate() {
            let (revenue_growth, income_growth) = if well_formed[i] {
                (revenue.normalized_change(i), income.normalized_change(i))
            } else {
                (Err(SkipReason::MalformedPeriod), Err(SkipReason::MalformedPeriod))
            };
            record.revenue_growth = report_metric(
                observer,
                &record.period,
                DerivedField::RevenueGrowth,
                revenue_growth,
            );
            record.income_growth = report_metric(
                observer,
                &record.period,
                DerivedField::IncomeGrowth,
                income_growth,
            );
        }
    }
}

/// Growth rates of a bare descending series, positional year-ago
pub fn growth_rates(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let quarters = vec![None; values.len()];
    let series = TrailingSeries::new(values, &quarters, YearAgoPolicy::Positional);
    (0..values.len())
        .map(|i| series.normalized_change(i).ok())
        .collect()
}
