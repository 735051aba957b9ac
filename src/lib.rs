//! # Quarterly Metrics
//!
//! Derived financial metrics from quarterly disclosures.
//!
//! Given a company's quarterly records and a series of daily opening prices,
//! the pipeline classifies each period into its fiscal quarter and computes
//! trailing growth rates, an annualized income yield, discount rates over the
//! yield series, the post-announcement price and, for the latest quarter,
//! correlations between the metrics and price.
//!
//! ## Example
//!
//! ```rust,no_run
//! use quarterly_metrics::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let records = read_disclosures("7203_disclosures.csv")?;
//!     let prices = read_price_series("7203_prices.csv")?;
//!
//!     let pipeline = MetricsPipeline::for_fiscal_month(3)?;
//!     let output = pipeline.run(records, &prices)?;
//!
//!     if let Some(latest) = output.latest() {
//!         println!("{} income growth: {:?}", latest.period, latest.income_growth);
//!     }
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod calendar;
pub mod config;
pub mod constants;
pub mod data;
pub mod error;
pub mod events;
pub mod metrics;
pub mod period;
pub mod pipeline;
pub mod pricing;
pub mod record;
pub mod types;

pub mod prelude {
    //! Commonly used types and functions
    pub use crate::batch::{BatchReport, BatchRunner, CompanyInput, LatestSnapshot};
    pub use crate::calendar::{infer_year_end_month, FiscalCalendar};
    pub use crate::config::{PipelineConfig, YearAgoPolicy};
    pub use crate::data::{read_disclosures, read_price_series, write_enriched_csv, write_json};
    pub use crate::error::{MetricsError, Result};
    pub use crate::events::{LogObserver, PipelineEvent, PipelineObserver};
    pub use crate::metrics::{
        CorrelationEngine, DiscountRateCalculator, GrowthCalculator, YieldAccumulator,
    };
    pub use crate::period::FiscalPeriod;
    pub use crate::pipeline::{enrich, MetricsPipeline, PipelineOutput};
    pub use crate::pricing::{PriceAligner, PriceSeries};
    pub use crate::record::QuarterlyRecord;
    pub use crate::types::*;
}
