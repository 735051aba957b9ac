//! Core types and constants

use crate::error::MetricsError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Price type (using f64 for precision)
pub type Price = f64;

/// Disclosed monetary amount (revenue, income, equity, ...)
pub type Amount = f64;

/// Percentage expressed in percent units (5.0 == 5%)
pub type Percentage = f64;

/// Fiscal quarter relative to a company's fiscal year end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Quarter {
    #[serde(rename = "1Q")]
    Q1,
    #[serde(rename = "2Q")]
    Q2,
    #[serde(rename = "3Q")]
    Q3,
    #[serde(rename = "4Q")]
    Q4,
}

impl Quarter {
    /// Quarters in fiscal-year order
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    /// Zero-based position inside the fiscal year
    pub fn index(self) -> usize {
        match self {
            Quarter::Q1 => 0,
            Quarter::Q2 => 1,
            Quarter::Q3 => 2,
            Quarter::Q4 => 3,
        }
    }

    /// Label used in disclosures and output tables
    pub fn label(self) -> &'static str {
        match self {
            Quarter::Q1 => "1Q",
            Quarter::Q2 => "2Q",
            Quarter::Q3 => "3Q",
            Quarter::Q4 => "4Q",
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Quarter {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1Q" => Ok(Quarter::Q1),
            "2Q" => Ok(Quarter::Q2),
            "3Q" => Ok(Quarter::Q3),
            "4Q" => Ok(Quarter::Q4),
            other => Err(MetricsError::ParseError(format!("Unknown quarter: {}", other))),
        }
    }
}

/// Single opening-price observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: Price,
}

impl PricePoint {
    /// Create a new price point
    pub fn new(date: NaiveDate, open: Price) -> Self {
        Self { date, open }
    }
}
