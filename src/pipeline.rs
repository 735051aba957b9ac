//! Metrics pipeline: runs every stage over one company's records
//!
//! Stage order is fixed: classification, growth, yield, discount, price
//! alignment, correlation. Each stage re-sorts the records it needs, since
//! yield accumulation walks oldest first while the windowed stages walk most
//! recent first.

use crate::calendar::FiscalCalendar;
use crate::config::PipelineConfig;
use crate::error::{MetricsError, Result};
use crate::events::{LogObserver, PipelineEvent, PipelineObserver, Stage};
use crate::metrics::{
    CorrelationEngine, DiscountRateCalculator, FiscalYearLedger, GrowthCalculator,
    YieldAccumulator,
};
use crate::pricing::{PriceAligner, PriceSeries};
use crate::record::{sort_ascending, QuarterlyRecord};
use hashbrown::HashSet;

/// Counts describing one pipeline run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub records: usize,
    pub classified: usize,
    pub with_growth: usize,
    pub with_yield: usize,
    pub price_matches: usize,
    pub growth_price_corr: Option<f64>,
    pub yield_price_corr: Option<f64>,
}

impl RunSummary {
    fn from_records(records: &[QuarterlyRecord]) -> Self {
        let latest = records.iter().max_by_key(|r| r.period_key());
        Self {
            records: records.len(),
            classified: records.iter().filter(|r| r.quarter.is_some()).count(),
            with_growth: records.iter().filter(|r| r.income_growth.is_some()).count(),
            with_yield: records.iter().filter(|r| r.income_yield.is_some()).count(),
            price_matches: records.iter().filter(|r| r.price_open.is_some()).count(),
            growth_price_corr: latest.and_then(|r| r.growth_price_corr),
            yield_price_corr: latest.and_then(|r| r.yield_price_corr),
        }
    }
}

/// Output of a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Enriched records, oldest first
    pub records: Vec<QuarterlyRecord>,
    /// Fiscal-year grouping the yields were computed from
    pub ledger: FiscalYearLedger,
    pub summary: RunSummary,
}

impl PipelineOutput {
    /// Most recent record
    pub fn latest(&self) -> Option<&QuarterlyRecord> {
        self.records.last()
    }
}

/// Quarterly metrics pipeline for one company
#[derive(Debug, Clone)]
pub struct MetricsPipeline {
    config: PipelineConfig,
    calendar: FiscalCalendar,
}

impl MetricsPipeline {
    /// Create a pipeline, validating the configuration
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let calendar = config.calendar()?;
        Ok(Self { config, calendar })
    }

    /// Pipeline with default settings for a fiscal year end month
    pub fn for_fiscal_month(fiscal_year_end_month: u32) -> Result<Self> {
        Self::new(PipelineConfig::for_fiscal_month(fiscal_year_end_month))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn calendar(&self) -> &FiscalCalendar {
        &self.calendar
    }

    /// Run all stages, reporting diagnostics through the `log` facade
    pub fn run(&self, records: Vec<QuarterlyRecord>, prices: &PriceSeries) -> Result<PipelineOutput> {
        self.run_with_observer(records, prices, &mut LogObserver)
    }

    /// Run all stages, reporting diagnostics to `observer`
    pub fn run_with_observer(
        &self,
        mut records: Vec<QuarterlyRecord>,
        prices: &PriceSeries,
        observer: &mut dyn PipelineObserver,
    ) -> Result<PipelineOutput> {
        validate_records(&records)?;

        for record in records.iter_mut() {
            record.reset_derived();
        }

        self.classify(&mut records, observer);

        let policy = self.config.year_ago_policy;
        GrowthCalculator::new(policy).apply(&mut records, observer);
        let ledger = YieldAccumulator::new(self.calendar).apply(&mut records, observer);
        DiscountRateCalculator::new(policy).apply(&mut records, observer);
        PriceAligner::new(self.config.price_offset_days).apply(&mut records, prices, observer);
        CorrelationEngine::new().apply(&mut records, observer);

        sort_ascending(&mut records);
        let summary = RunSummary::from_records(&records);

        log::info!(
            "Processed {} quarters ({} classified, {} with growth, {} with yield, {} priced)",
            summary.records,
            summary.classified,
            summary.with_growth,
            summary.with_yield,
            summary.price_matches
        );

        Ok(PipelineOutput {
            records,
            ledger,
            summary,
        })
    }

    fn classify(&self, records: &mut [QuarterlyRecord], observer: &mut dyn PipelineObserver) {
        observer.on_event(&PipelineEvent::StageStarted {
            stage: Stage::Classification,
            records: records.len(),
        });

        for record in records.iter_mut() {
            record.quarter = self.calendar.classify(&record.period);
            observer.on_event(&PipelineEvent::Classified {
                period: record.period.clone(),
                quarter: record.quarter,
            });
        }
    }
}

impl Default for MetricsPipeline {
    fn default() -> Self {
        Self {
            config: PipelineConfig::default(),
            calendar: FiscalCalendar::default(),
        }
    }
}

/// Enrich records with default settings for a fiscal year end month
pub fn enrich(
    records: Vec<QuarterlyRecord>,
    prices: &PriceSeries,
    fiscal_year_end_month: u32,
) -> Result<Vec<QuarterlyRecord>> {
    let pipeline = MetricsPipeline::for_fiscal_month(fiscal_year_end_month)?;
    Ok(pipeline.run(records, prices)?.records)
}

fn validate_records(records: &[QuarterlyRecord]) -> Result<()> {
    if records.is_empty() {
        return Err(MetricsError::EmptyInput);
    }

    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        let label = record.period.trim();
        if !seen.insert(label) {
            return Err(MetricsError::DuplicatePeriod(label.to_string()));
        }
    }
    Ok(())
}
