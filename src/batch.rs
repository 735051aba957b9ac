//! Running the pipeline for many companies
//!
//! Each company is independent, so runs fan out over rayon's pool. A failure
//! is recorded against its company and never aborts the rest of the batch.

use crate::config::PipelineConfig;
use crate::error::{MetricsError, Result};
use crate::pipeline::MetricsPipeline;
use crate::pricing::PriceSeries;
use crate::record::QuarterlyRecord;
use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// One company's inputs
#[derive(Debug, Clone)]
pub struct CompanyInput {
    pub code: String,
    pub name: String,
    pub records: Vec<QuarterlyRecord>,
    pub prices: PriceSeries,
    /// Falls back to the runner's configured month when absent
    pub fiscal_year_end_month: Option<u32>,
}

impl CompanyInput {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        records: Vec<QuarterlyRecord>,
        prices: PriceSeries,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            records,
            prices,
            fiscal_year_end_month: None,
        }
    }

    pub fn with_fiscal_year_end_month(mut self, month: u32) -> Self {
        self.fiscal_year_end_month = Some(month);
        self
    }

    fn resolve_fiscal_month(&self, configured: u32) -> u32 {
        self.fiscal_year_end_month.unwrap_or(configured)
    }
}

/// Latest enriched quarter of one company.
///
/// Growth, yield and discount figures are fractions here (percent / 100).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestSnapshot {
    pub code: String,
    pub name: String,
    pub period: String,
    pub announcement_date: Option<NaiveDate>,
    pub revenue_growth: Option<f64>,
    pub income_growth: Option<f64>,
    pub income_yield: Option<f64>,
    pub discount_avg: Option<f64>,
    pub discount_yoy: Option<f64>,
    pub discount_qoq: Option<f64>,
    pub price_open: Option<f64>,
    pub growth_price_corr: Option<f64>,
    pub yield_price_corr: Option<f64>,
    pub document_url: Option<String>,
}

impl LatestSnapshot {
    /// Snapshot of the most recent record, if any
    pub fn from_records(code: &str, name: &str, records: &[QuarterlyRecord]) -> Option<Self> {
        let latest = records.iter().max_by_key(|r| r.period_key())?;
        let fraction = |v: Option<f64>| v.map(|p| p / 100.0);

        Some(Self {
            code: code.to_string(),
            name: name.to_string(),
            period: latest.period.clone(),
            announcement_date: latest.announcement_date,
            revenue_growth: fraction(latest.revenue_growth),
            income_growth: fraction(latest.income_growth),
            income_yield: fraction(latest.income_yield),
            discount_avg: fraction(latest.discount_avg),
            discount_yoy: fraction(latest.discount_yoy),
            discount_qoq: fraction(latest.discount_qoq),
            price_open: latest.price_open,
            growth_price_corr: latest.growth_price_corr,
            yield_price_corr: latest.yield_price_corr,
            document_url: latest.document_url.clone(),
        })
    }
}

/// A company whose run did not produce a snapshot
#[derive(Debug)]
pub struct BatchFailure {
    pub code: String,
    pub name: String,
    pub error: MetricsError,
}

/// Result of a batch run, in input order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub snapshots: Vec<LatestSnapshot>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.snapshots.len() + self.failures.len()
    }
}

/// Runs the pipeline across companies in parallel
#[derive(Debug, Clone, Default)]
pub struct BatchRunner {
    config: PipelineConfig,
}

impl BatchRunner {
    /// `config` applies to every company; a company's own fiscal month wins
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn run(&self, companies: Vec<CompanyInput>) -> BatchReport {
        let outcomes: Vec<(String, String, Result<LatestSnapshot>)> = companies
            .into_par_iter()
            .map(|company| {
                let outcome = self.run_one(&company);
                (company.code, company.name, outcome)
            })
            .collect();

        let mut report = BatchReport::default();
        for (code, name, outcome) in outcomes {
            match outcome {
                Ok(snapshot) => report.snapshots.push(snapshot),
                Err(error) => {
                    log::warn!("{} {} failed: {}", code, name, error);
                    report.failures.push(BatchFailure { code, name, error });
                }
            }
        }

        log::info!(
            "Batch finished: {} succeeded, {} failed",
            report.snapshots.len(),
            report.failures.len()
        );
        report
    }

    fn run_one(&self, company: &CompanyInput) -> Result<LatestSnapshot> {
        let fiscal_year_end_month = company.resolve_fiscal_month(self.config.fiscal_year_end_month);
        let config = PipelineConfig {
            fiscal_year_end_month,
            ..self.config.clone()
        };
        let pipeline = MetricsPipeline::new(config)?;
        let output = pipeline.run(company.records.clone(), &company.prices)?;
        LatestSnapshot::from_records(&company.code, &company.name, &output.records)
            .ok_or(MetricsError::EmptyInput)
    }
}

/// Entry of a company code list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CodeEntry {
    pub code: String,
    #[serde(default)]
    pub name: String,
    /// Optional per-company fiscal year end month
    #[serde(default)]
    pub fiscal_month: Option<u32>,
}

/// Read a `code,name[,fiscal_month]` list from any reader; blank codes are skipped
pub fn read_code_list_from<R: Read>(reader: R) -> Result<Vec<CodeEntry>> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut entries = Vec::new();
    for row in reader.deserialize::<CodeEntry>() {
        let entry = row?;
        if !entry.code.is_empty() {
            entries.push(entry);
        }
    }
    Ok(entries)
}

/// Read a company code list file
pub fn read_code_list<P: AsRef<Path>>(path: P) -> Result<Vec<CodeEntry>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        MetricsError::DataError(format!("Failed to open {}: {}", path.display(), e))
    })?;
    read_code_list_from(file)
}

/// Write snapshots as CSV
pub fn write_snapshots<W: Write>(writer: W, snapshots: &[LatestSnapshot]) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(writer);
    for snapshot in snapshots {
        writer.serialize(snapshot)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_snapshots_csv<P: AsRef<Path>>(path: P, snapshots: &[LatestSnapshot]) -> Result<()> {
    write_snapshots(File::create(path.as_ref())?, snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn company(code: &str, periods: &[&str]) -> CompanyInput {
        let records = periods
            .iter()
            .enumerate()
            .map(|(i, p)| {
                QuarterlyRecord::new(*p)
                    .with_revenue(100.0 + i as f64)
                    .with_ordinary_income(10.0)
                    .with_total_equity(1000.0)
            })
            .collect();
        CompanyInput::new(code, format!("Company {}", code), records, PriceSeries::default())
    }

    #[test]
    fn test_snapshot_uses_fractions() {
        let mut latest = QuarterlyRecord::new("24.07-09");
        latest.income_yield = Some(6.0);
        latest.discount_qoq = Some(-1.5);
        latest.growth_price_corr = Some(0.75);
        let older = QuarterlyRecord::new("24.04-06");

        let snapshot = LatestSnapshot::from_records("1301", "Foods", &[latest, older]).unwrap();
        assert_eq!(snapshot.period, "24.07-09");
        assert_relative_eq!(snapshot.income_yield.unwrap(), 0.06);
        assert_relative_eq!(snapshot.discount_qoq.unwrap(), -0.015);
        assert_eq!(snapshot.growth_price_corr, Some(0.75));
        assert!(snapshot.income_growth.is_none());
    }

    #[test]
    fn test_snapshot_of_nothing() {
        assert!(LatestSnapshot::from_records("1301", "Foods", &[]).is_none());
    }

    #[test]
    fn test_batch_isolates_failures() {
        let good = company("1301", &["24.04-06", "24.07-09"]).with_fiscal_year_end_month(3);
        let empty = company("1302", &[]);
        let dup = company("1303", &["24.04-06", "24.04-06"]);
        let other = company("1304", &["24.01-03"]).with_fiscal_year_end_month(12);

        let report = BatchRunner::default().run(vec![good, empty, dup, other]);
        assert_eq!(report.total(), 4);

        let codes: Vec<&str> = report.snapshots.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["1301", "1304"]);
        assert_eq!(report.snapshots[0].period, "24.07-09");
        // 10 * 2 / 1000 for Q2, then as a fraction
        assert_relative_eq!(report.snapshots[0].income_yield.unwrap(), 0.04);
        // Q1 under a December year end: 10 * 4 / 1000
        assert_relative_eq!(report.snapshots[1].income_yield.unwrap(), 0.04);

        let failed: Vec<&str> = report.failures.iter().map(|f| f.code.as_str()).collect();
        assert_eq!(failed, vec!["1302", "1303"]);
        assert!(matches!(report.failures[0].error, MetricsError::EmptyInput));
        assert!(matches!(report.failures[1].error, MetricsError::DuplicatePeriod(_)));
    }

    #[test]
    fn test_configured_month_used_without_override() {
        // Five quarters of a March year end; 06 is the most frequent end month
        let periods = ["24.04-06", "24.07-09", "24.10-12", "25.01-03", "25.04-06"];
        let records: Vec<QuarterlyRecord> = periods
            .iter()
            .zip([10.0, 20.0, 30.0, 40.0, 10.0])
            .map(|(p, income)| {
                QuarterlyRecord::new(*p)
                    .with_ordinary_income(income)
                    .with_total_equity(1000.0)
            })
            .collect();
        let company = CompanyInput::new("7203", "Motors", records.clone(), PriceSeries::default());

        let report = BatchRunner::new(PipelineConfig::for_fiscal_month(3)).run(vec![company]);
        let snapshot = &report.snapshots[0];
        assert_eq!(snapshot.period, "25.04-06");
        // 25.04-06 opens a new fiscal year: 10 * 4 / 1000
        assert_relative_eq!(snapshot.income_yield.unwrap(), 0.04, epsilon = 1e-12);

        let direct = MetricsPipeline::for_fiscal_month(3)
            .unwrap()
            .run(records, &PriceSeries::default())
            .unwrap();
        assert_relative_eq!(
            direct.latest().unwrap().income_yield.unwrap() / 100.0,
            snapshot.income_yield.unwrap(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_company_override_beats_configured_month() {
        let company = company("1304", &["24.01-03"]).with_fiscal_year_end_month(12);
        let report = BatchRunner::new(PipelineConfig::for_fiscal_month(3)).run(vec![company]);
        // Q1 under a December year end: 10 * 4 / 1000
        assert_relative_eq!(report.snapshots[0].income_yield.unwrap(), 0.04, epsilon = 1e-12);
    }

    #[test]
    fn test_read_code_list() {
        let csv = "code,name\n1301,Foods\n,Nameless\n7203,Motors\n";
        let entries = read_code_list_from(csv.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].code, "7203");
        assert_eq!(entries[1].name, "Motors");
        assert_eq!(entries[1].fiscal_month, None);
    }

    #[test]
    fn test_read_code_list_with_fiscal_month() {
        let csv = "code,name,fiscal_month\n1301,Foods,12\n7203,Motors,\n";
        let entries = read_code_list_from(csv.as_bytes()).unwrap();
        assert_eq!(entries[0].fiscal_month, Some(12));
        assert_eq!(entries[1].fiscal_month, None);
    }

    #[test]
    fn test_write_snapshots() {
        let mut record = QuarterlyRecord::new("24.04-06");
        record.income_yield = Some(4.0);
        let snapshot = LatestSnapshot::from_records("1301", "Foods", &[record]).unwrap();

        let mut buf = Vec::new();
        write_snapshots(&mut buf, &[snapshot]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("code,name,period,"));
        assert!(text.contains("1301,Foods,24.04-06,,,,0.04,"));
    }
}
