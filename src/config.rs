//! Pipeline configuration

use crate::calendar::FiscalCalendar;
use crate::constants::{DEFAULT_FISCAL_YEAR_END_MONTH, DEFAULT_PRICE_OFFSET_DAYS};
use crate::error::{MetricsError, Result};
use serde::{Deserialize, Serialize};

/// How the quarter four positions back is trusted as the year-ago quarter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YearAgoPolicy {
    /// Position `i + 4` is the year-ago quarter, even across gaps in the series
    #[default]
    Positional,
    /// Position `i + 4` must also carry the same quarter label as `i`
    MatchQuarter,
}

/// Settings for a single pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Month the fiscal year ends in (1-12)
    pub fiscal_year_end_month: u32,
    pub year_ago_policy: YearAgoPolicy,
    /// Days after the announcement from which price observations qualify
    pub price_offset_days: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fiscal_year_end_month: DEFAULT_FISCAL_YEAR_END_MONTH,
            year_ago_policy: YearAgoPolicy::default(),
            price_offset_days: DEFAULT_PRICE_OFFSET_DAYS,
        }
    }
}

impl PipelineConfig {
    /// Config for a given fiscal year end month, other settings default
    pub fn for_fiscal_month(fiscal_year_end_month: u32) -> Self {
        Self {
            fiscal_year_end_month,
            ..Default::default()
        }
    }

    /// Check that all settings are usable
    pub fn validate(&self) -> Result<()> {
        if !(1..=12).contains(&self.fiscal_year_end_month) {
            return Err(MetricsError::InvalidFiscalMonth(self.fiscal_year_end_month));
        }
        if self.price_offset_days < 0 {
            return Err(MetricsError::ConfigError(format!(
                "price_offset_days must not be negative, got {}",
                self.price_offset_days
            )));
        }
        Ok(())
    }

    /// Fiscal calendar for the configured year end month
    pub fn calendar(&self) -> Result<FiscalCalendar> {
        FiscalCalendar::new(self.fiscal_year_end_month)
    }
}
