//! Fiscal-year-to-date annualized ordinary income yield
//!
//! Income accumulates through a fiscal year in quarter order and is
//! annualized by a quarter-dependent factor before being divided by capital
//! (total equity):
//!
//! | Quarter | Numerator            | Factor |
//! |---------|----------------------|--------|
//! | 1Q      | 1Q income            | 4      |
//! | 2Q      | 1Q + 2Q              | 2      |
//! | 3Q      | 1Q + 2Q + 3Q         | 1.33   |
//! | 4Q      | full year            | 1      |

use crate::calendar::FiscalCalendar;
use crate::constants::{ANNUALIZATION_FACTORS, METRIC_DECIMALS};
use crate::events::{report_metric, DerivedField, PipelineEvent, PipelineObserver, SkipReason, Stage};
use crate::metrics::window::round_to;
use crate::record::{sort_ascending, QuarterlyRecord};
use crate::types::{Amount, Quarter};
use std::collections::BTreeMap;

/// Inputs of one classified record inside its fiscal year
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuarterEntry {
    /// Index of the record in the ascending record slice
    pub index: usize,
    pub income: Option<Amount>,
    pub capital: Option<Amount>,
}

/// Quarter slots of one fiscal year
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FiscalYear {
    slots: [Option<QuarterEntry>; 4],
}

impl FiscalYear {
    pub fn get(&self, quarter: Quarter) -> Option<&QuarterEntry> {
        self.slots[quarter.index()].as_ref()
    }

    /// Sum of disclosed income over all present quarters
    pub fn total_income(&self) -> Amount {
        self.slots.iter().flatten().filter_map(|e| e.income).sum()
    }

    /// Whether all four quarters are present
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(|s| s.is_some())
    }
}

/// Records grouped by fiscal year and quarter.
///
/// Built once from an ascending record slice and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FiscalYearLedger {
    years: BTreeMap<i32, FiscalYear>,
}

impl FiscalYearLedger {
    /// Group classified records by fiscal year; unclassified records are ignored
    pub fn build(records: &[QuarterlyRecord], calendar: &FiscalCalendar) -> Self {
        let mut years: BTreeMap<i32, FiscalYear> = BTreeMap::new();

        for (index, record) in records.iter().enumerate() {
            let (Some(quarter), Some(period)) = (record.quarter, record.fiscal_period()) else {
                continue;
            };
            let fiscal_year = calendar.fiscal_year_of_period(&period);

            years.entry(fiscal_year).or_default().slots[quarter.index()] = Some(QuarterEntry {
                index,
                income: record.ordinary_income,
                capital: record.total_equity,
            });
        }

        Self { years }
    }

    pub fn get(&self, fiscal_year: i32) -> Option<&FiscalYear> {
        self.years.get(&fiscal_year)
    }

    /// Fiscal years in ascending order
    pub fn fiscal_years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Yield outcome for every classified record, keyed by record index.
    ///
    /// Quarters without income add nothing to the running total. The total
    /// still advances when the quarter's own capital is missing.
    pub fn yields(&self) -> Vec<(usize, std::result::Result<f64, SkipReason>)> {
        let mut outcomes = Vec::new();

        for year in self.years.values() {
            let mut cumulative = 0.0;

            for quarter in Quarter::ALL {
                let Some(entry) = year.get(quarter) else {
                    continue;
                };
                let Some(income) = entry.income else {
                    outcomes.push((entry.index, Err(SkipReason::MissingValue)));
                    continue;
                };
                cumulative += income;

                let outcome = match entry.capital {
                    Some(capital) if capital != 0.0 => {
                        let factor = ANNUALIZATION_FACTORS[quarter.index()];
                        Ok(round_to(
                            cumulative * factor / capital * 100.0,
                            METRIC_DECIMALS,
                        ))
                    }
                    _ => Err(SkipReason::MissingCapital),
                };
                outcomes.push((entry.index, outcome));
            }
        }

        outcomes
    }
}

/// Computes `income_yield`
#[derive(Debug, Clone, Copy)]
pub struct YieldAccumulator {
    calendar: FiscalCalendar,
}

impl YieldAccumulator {
    pub fn new(calendar: FiscalCalendar) -> Self {
        Self { calendar }
    }

    /// Fill `income_yield`. Leaves `records` sorted oldest first and returns
    /// the ledger the yields were computed from.
    pub fn apply(
        &self,
        records: &mut [QuarterlyRecord],
        observer: &mut dyn PipelineObserver,
    ) -> FiscalYearLedger {
        observer.on_event(&PipelineEvent::StageStarted {
            stage: Stage::Yield,
            records: records.len(),
        });
        sort_ascending(records);

        for record in records.iter_mut() {
            record.income_yield = None;
            if record.quarter.is_none() {
                let reason = if record.is_well_formed() {
                    SkipReason::Unclassified
                } else {
                    SkipReason::MalformedPeriod
                };
                report_metric(observer, &record.period, DerivedField::IncomeYield, Err(reason));
            }
        }

        let ledger = FiscalYearLedger::build(records, &self.calendar);
        for (index, outcome) in ledger.yields() {
            let record = &mut records[index];
            record.income_yield =
                report_metric(observer, &record.period, DerivedField::IncomeYield, outcome);
        }

        ledger
    }
}
