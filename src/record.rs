//! Quarterly disclosure records

use crate::period::{FiscalPeriod, PeriodKey};
use crate::types::{Amount, Percentage, Price, Quarter};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One disclosed reporting period plus the metrics derived from it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyRecord {
    /// Period label, `YY.MM-MM`
    pub period: String,
    pub revenue: Option<Amount>,
    pub operating_income: Option<Amount>,
    pub ordinary_income: Option<Amount>,
    pub net_income: Option<Amount>,
    pub adjusted_eps: Option<Amount>,
    pub total_assets: Option<Amount>,
    pub total_equity: Option<Amount>,
    pub announcement_date: Option<NaiveDate>,
    /// Link to the source disclosure document
    pub document_url: Option<String>,

    // Derived
    pub quarter: Option<Quarter>,
    pub revenue_growth: Option<Percentage>,
    pub income_growth: Option<Percentage>,
    pub income_yield: Option<Percentage>,
    pub discount_avg: Option<Percentage>,
    pub discount_yoy: Option<Percentage>,
    pub discount_qoq: Option<Percentage>,
    pub price_date: Option<NaiveDate>,
    pub price_open: Option<Price>,
    pub growth_price_corr: Option<f64>,
    pub yield_price_corr: Option<f64>,
}

impl QuarterlyRecord {
    /// Create a record with only its period label set
    pub fn new(period: impl Into<String>) -> Self {
        Self {
            period: period.into(),
            ..Default::default()
        }
    }

    /// Builder-style setter for revenue
    pub fn with_revenue(mut self, revenue: Amount) -> Self {
        self.revenue = Some(revenue);
        self
    }

    /// Builder-style setter for ordinary income
    pub fn with_ordinary_income(mut self, income: Amount) -> Self {
        self.ordinary_income = Some(income);
        self
    }

    /// Builder-style setter for total equity (capital)
    pub fn with_total_equity(mut self, equity: Amount) -> Self {
        self.total_equity = Some(equity);
        self
    }

    /// Builder-style setter for total assets
    pub fn with_total_assets(mut self, assets: Amount) -> Self {
        self.total_assets = Some(assets);
        self
    }

    /// Builder-style setter for the announcement date
    pub fn with_announcement_date(mut self, date: NaiveDate) -> Self {
        self.announcement_date = Some(date);
        self
    }

    /// Parsed period, if the label is well formed
    pub fn fiscal_period(&self) -> Option<FiscalPeriod> {
        FiscalPeriod::parse(&self.period).ok()
    }

    /// Whether the period label parses
    pub fn is_well_formed(&self) -> bool {
        self.fiscal_period().is_some()
    }

    /// `value` of this record, or `None` when the period label does not parse
    pub fn parsed_value(&self, value: Option<f64>) -> Option<f64> {
        value.filter(|_| self.is_well_formed())
    }

    /// Chronological ordering key
    pub fn period_key(&self) -> PeriodKey {
        PeriodKey::from_label(&self.period)
    }

    /// Clear every derived field
    pub fn reset_derived(&mut self) {
        self.quarter = None;
        self.revenue_growth = None;
        self.income_growth = None;
        self.income_yield = None;
        self.discount_avg = None;
        self.discount_yoy = None;
        self.discount_qoq = None;
        self.price_date = None;
        self.price_open = None;
        self.growth_price_corr = None;
        self.yield_price_corr = None;
    }
}

/// Sort records oldest first
pub fn sort_ascending(records: &mut [QuarterlyRecord]) {
    records.sort_by_cached_key(|r| r.period_key());
}

/// Sort records most recent first
pub fn sort_descending(records: &mut [QuarterlyRecord]) {
    records.sort_by_cached_key(|r| std::cmp::Reverse(r.period_key()));
}
