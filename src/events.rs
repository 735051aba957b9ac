//! Diagnostic events emitted while the pipeline runs
//!
//! Observers are purely informational; no stage reads anything back from them.

use crate::types::{Price, Quarter};
use chrono::NaiveDate;
use std::fmt;

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Classification,
    Growth,
    Yield,
    Discount,
    PriceAlignment,
    Correlation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Classification => "classification",
            Stage::Growth => "growth",
            Stage::Yield => "yield",
            Stage::Discount => "discount",
            Stage::PriceAlignment => "price alignment",
            Stage::Correlation => "correlation",
        };
        f.write_str(name)
    }
}

/// Derived field a metric event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivedField {
    RevenueGrowth,
    IncomeGrowth,
    IncomeYield,
    DiscountAvg,
    DiscountYoy,
    DiscountQoq,
    GrowthPriceCorr,
    YieldPriceCorr,
}

impl fmt::Display for DerivedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DerivedField::RevenueGrowth => "revenue_growth",
            DerivedField::IncomeGrowth => "income_growth",
            DerivedField::IncomeYield => "income_yield",
            DerivedField::DiscountAvg => "discount_avg",
            DerivedField::DiscountYoy => "discount_yoy",
            DerivedField::DiscountQoq => "discount_qoq",
            DerivedField::GrowthPriceCorr => "growth_price_corr",
            DerivedField::YieldPriceCorr => "yield_price_corr",
        };
        f.write_str(name)
    }
}

/// Why a derived value was left empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The record's own input value is missing
    MissingValue,
    /// Fewer than four older records exist
    NoYearAgo,
    /// The year-ago record lacks the value
    MissingYearAgo,
    /// The year-ago record is a different quarter
    QuarterMismatch,
    /// The trailing window has a gap
    IncompleteWindow,
    /// The trailing window sums to zero
    ZeroDenominator,
    /// No older record exists
    NoPreviousQuarter,
    /// The previous record lacks the value
    MissingPrevious,
    /// Capital is missing or zero
    MissingCapital,
    /// The period label does not parse
    MalformedPeriod,
    /// The period could not be classified into a quarter
    Unclassified,
    /// The record has no announcement date
    MissingAnnouncementDate,
    /// No price observation qualifies
    NoPriceObservation,
    /// Fewer than the required number of signal/price pairs
    InsufficientPairs(usize),
    /// One of the correlated series is constant
    ZeroVariance,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingValue => write!(f, "value missing"),
            SkipReason::NoYearAgo => write!(f, "no year-ago quarter"),
            SkipReason::MissingYearAgo => write!(f, "year-ago value missing"),
            SkipReason::QuarterMismatch => write!(f, "year-ago quarter label differs"),
            SkipReason::IncompleteWindow => write!(f, "trailing window incomplete"),
            SkipReason::ZeroDenominator => write!(f, "trailing window sums to zero"),
            SkipReason::NoPreviousQuarter => write!(f, "no previous quarter"),
            SkipReason::MissingPrevious => write!(f, "previous value missing"),
            SkipReason::MissingCapital => write!(f, "capital missing or zero"),
            SkipReason::MalformedPeriod => write!(f, "malformed period label"),
            SkipReason::Unclassified => write!(f, "period not classified"),
            SkipReason::MissingAnnouncementDate => write!(f, "no announcement date"),
            SkipReason::NoPriceObservation => write!(f, "no qualifying price"),
            SkipReason::InsufficientPairs(n) => write!(f, "only {} paired observations", n),
            SkipReason::ZeroVariance => write!(f, "constant series"),
        }
    }
}

/// Event emitted by a pipeline stage
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    StageStarted {
        stage: Stage,
        records: usize,
    },
    Classified {
        period: String,
        quarter: Option<Quarter>,
    },
    MetricComputed {
        period: String,
        field: DerivedField,
        value: f64,
    },
    MetricSkipped {
        period: String,
        field: DerivedField,
        reason: SkipReason,
    },
    PriceMatched {
        period: String,
        date: NaiveDate,
        open: Price,
        same_day: bool,
    },
    PriceUnmatched {
        period: String,
        reason: SkipReason,
    },
}

/// Receives pipeline events
pub trait PipelineObserver {
    fn on_event(&mut self, event: &PipelineEvent);
}

/// Forwards events to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl PipelineObserver for LogObserver {
    fn on_event(&mut self, event: &PipelineEvent) {
        match event {
            PipelineEvent::StageStarted { stage, records } => {
                log::debug!("Running {} stage over {} records", stage, records);
            }
            PipelineEvent::Classified { period, quarter } => match quarter {
                Some(q) => log::trace!("{} classified as {}", period, q),
                None => log::debug!("{} could not be classified", period),
            },
            PipelineEvent::MetricComputed {
                period,
                field,
                value,
            } => {
                log::trace!("{} {} = {}", period, field, value);
            }
            PipelineEvent::MetricSkipped {
                period,
                field,
                reason,
            } => {
                log::debug!("{} {} skipped: {}", period, field, reason);
            }
            PipelineEvent::PriceMatched {
                period,
                date,
                open,
                same_day,
            } => {
                if *same_day {
                    log::debug!("{} matched same-day price {} on {}", period, open, date);
                } else {
                    log::trace!("{} matched price {} on {}", period, open, date);
                }
            }
            PipelineEvent::PriceUnmatched { period, reason } => {
                log::warn!("No price for {}: {}", period, reason);
            }
        }
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl PipelineObserver for NullObserver {
    fn on_event(&mut self, _event: &PipelineEvent) {}
}

/// Keeps every event in memory
#[derive(Debug, Clone, Default)]
pub struct CollectingObserver {
    pub events: Vec<PipelineEvent>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip reasons recorded for one period and field
    pub fn skips_for(&self, period: &str, field: DerivedField) -> Vec<SkipReason> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::MetricSkipped {
                    period: p,
                    field: f,
                    reason,
                } if p == period && *f == field => Some(*reason),
                _ => None,
            })
            .collect()
    }
}

impl PipelineObserver for CollectingObserver {
    fn on_event(&mut self, event: &PipelineEvent) {
        self.events.push(event.clone());
    }
}

/// Emit the outcome of one metric and return the value to store
pub(crate) fn report_metric(
    observer: &mut dyn PipelineObserver,
    period: &str,
    field: DerivedField,
    outcome: std::result::Result<f64, SkipReason>,
) -> Option<f64> {
    match outcome {
        Ok(value) => {
            observer.on_event(&PipelineEvent::MetricComputed {
                period: period.to_string(),
                field,
                value,
            });
            Some(value)
        }
        Err(reason) => {
            observer.on_event(&PipelineEvent::MetricSkipped {
                period: period.to_string(),
                field,
                reason,
            });
            None
        }
    }
}
