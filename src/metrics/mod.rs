//! Metric stages - growth, yield, discount, correlation

pub mod correlation;
pub mod discount;
pub mod growth;
pub mod window;
pub mod yields;

pub use correlation::{pearson, CorrelationEngine};
pub use discount::DiscountRateCalculator;
pub use growth::{growth_rates, GrowthCalculator};
pub use window::{round_to, TrailingSeries};
pub use yields::{FiscalYear, FiscalYearLedger, QuarterEntry, YieldAccumulator};
