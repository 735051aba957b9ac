//! CSV adapters for disclosures, prices and enriched output

use crate::data::parse::{parse_disclosure_date, parse_number};
use crate::error::{MetricsError, Result};
use crate::pricing::PriceSeries;
use crate::record::{sort_ascending, QuarterlyRecord};
use crate::types::{Percentage, PricePoint, Quarter};
use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Raw disclosure row; every cell is kept as text until parsed
#[derive(Debug, Deserialize)]
struct DisclosureRow {
    #[serde(default)]
    period: String,
    #[serde(default)]
    revenue: Option<String>,
    #[serde(default)]
    operating_income: Option<String>,
    #[serde(default)]
    ordinary_income: Option<String>,
    #[serde(default)]
    net_income: Option<String>,
    #[serde(default)]
    adjusted_eps: Option<String>,
    #[serde(default)]
    announcement_date: Option<String>,
    #[serde(default)]
    document_url: Option<String>,
    #[serde(default)]
    total_assets: Option<String>,
    #[serde(default)]
    total_equity: Option<String>,
}

impl DisclosureRow {
    fn into_record(self) -> QuarterlyRecord {
        let number = |cell: &Option<String>| cell.as_deref().and_then(parse_number);
        QuarterlyRecord {
            revenue: number(&self.revenue),
            operating_income: number(&self.operating_income),
            ordinary_income: number(&self.ordinary_income),
            net_income: number(&self.net_income),
            adjusted_eps: number(&self.adjusted_eps),
            total_assets: number(&self.total_assets),
            total_equity: number(&self.total_equity),
            announcement_date: self
                .announcement_date
                .as_deref()
                .and_then(parse_disclosure_date),
            document_url: self.document_url.filter(|u| !u.trim().is_empty()),
            period: self.period.trim().to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct PriceRow {
    date: String,
    open: String,
}

/// Output row in table column order
#[derive(Debug, Serialize)]
struct EnrichedRow<'a> {
    period: &'a str,
    quarter: Option<Quarter>,
    revenue: Option<f64>,
    ordinary_income: Option<f64>,
    announcement_date: Option<NaiveDate>,
    document_url: Option<&'a str>,
    total_assets: Option<f64>,
    total_equity: Option<f64>,
    revenue_growth: Option<Percentage>,
    income_growth: Option<Percentage>,
    income_yield: Option<Percentage>,
    discount_avg: Option<Percentage>,
    discount_yoy: Option<Percentage>,
    discount_qoq: Option<Percentage>,
    price_date: Option<NaiveDate>,
    price_open: Option<f64>,
    growth_price_corr: Option<f64>,
    yield_price_corr: Option<f64>,
}

impl<'a> From<&'a QuarterlyRecord> for EnrichedRow<'a> {
    fn from(r: &'a QuarterlyRecord) -> Self {
        Self {
            period: &r.period,
            quarter: r.quarter,
            revenue: r.revenue,
            ordinary_income: r.ordinary_income,
            announcement_date: r.announcement_date,
            document_url: r.document_url.as_deref(),
            total_assets: r.total_assets,
            total_equity: r.total_equity,
            revenue_growth: r.revenue_growth,
            income_growth: r.income_growth,
            income_yield: r.income_yield,
            discount_avg: r.discount_avg,
            discount_yoy: r.discount_yoy,
            discount_qoq: r.discount_qoq,
            price_date: r.price_date,
            price_open: r.price_open,
            growth_price_corr: r.growth_price_corr,
            yield_price_corr: r.yield_price_corr,
        }
    }
}

/// Read disclosures from any reader; rows without a period are skipped
pub fn read_disclosures_from<R: Read>(reader: R) -> Result<Vec<QuarterlyRecord>> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (line, row) in reader.deserialize::<DisclosureRow>().enumerate() {
        let row = row?;
        if row.period.trim().is_empty() {
            log::warn!("Skipping disclosure row {} without a period", line + 2);
            continue;
        }
        records.push(row.into_record());
    }

    log::debug!("Read {} disclosure rows", records.len());
    Ok(records)
}

/// Read disclosures from a CSV file
pub fn read_disclosures<P: AsRef<Path>>(path: P) -> Result<Vec<QuarterlyRecord>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        MetricsError::DataError(format!("Failed to open {}: {}", path.display(), e))
    })?;
    read_disclosures_from(file)
}

/// Read a `date,open` price table; unparsable rows are skipped
pub fn read_price_series_from<R: Read>(reader: R) -> Result<PriceSeries> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut points = Vec::new();
    let mut skipped = 0usize;
    for row in reader.deserialize::<PriceRow>() {
        let row = row?;
        match (parse_disclosure_date(&row.date), parse_number(&row.open)) {
            (Some(date), Some(open)) => points.push(PricePoint::new(date, open)),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {} unparsable price rows", skipped);
    }
    Ok(PriceSeries::new(points))
}

/// Read a price CSV file
pub fn read_price_series<P: AsRef<Path>>(path: P) -> Result<PriceSeries> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        MetricsError::DataError(format!("Failed to open {}: {}", path.display(), e))
    })?;
    read_price_series_from(file)
}

/// Write enriched records oldest first
pub fn write_enriched<W: Write>(writer: W, records: &[QuarterlyRecord]) -> Result<()> {
    let mut ordered = records.to_vec();
    sort_ascending(&mut ordered);

    let mut writer = WriterBuilder::new().from_writer(writer);
    for record in &ordered {
        writer.serialize(EnrichedRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write enriched records to a CSV file
pub fn write_enriched_csv<P: AsRef<Path>>(path: P, records: &[QuarterlyRecord]) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_enriched(file, records)?;
    log::info!("Wrote {} records to {}", records.len(), path.as_ref().display());
    Ok(())
}

/// Write records as pretty-printed JSON, oldest first
pub fn write_json<W: Write>(writer: W, records: &[QuarterlyRecord]) -> Result<()> {
    let mut ordered = records.to_vec();
    sort_ascending(&mut ordered);
    serde_json::to_writer_pretty(writer, &ordered)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISCLOSURES: &str = "\
period,revenue,operating_income,ordinary_income,net_income,adjusted_eps,announcement_date,document_url,total_assets,total_equity
24.04-06,\"1,000\",－,80,50,12.5,2024/08/07,https://example.com/a.pdf,\"5,000\",\"2,000\"
,1,2,3,4,5,,,,
24.07-09,－,-,－20,,,24/11/10,,,
";

    #[test]
    fn test_read_disclosures() {
        let records = read_disclosures_from(DISCLOSURES.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.period, "24.04-06");
        assert_eq!(first.revenue, Some(1000.0));
        assert_eq!(first.operating_income, None);
        assert_eq!(first.ordinary_income, Some(80.0));
        assert_eq!(first.total_equity, Some(2000.0));
        assert_eq!(first.announcement_date, NaiveDate::from_ymd_opt(2024, 8, 7));
        assert_eq!(first.document_url.as_deref(), Some("https://example.com/a.pdf"));

        let second = &records[1];
        assert_eq!(second.revenue, None);
        assert_eq!(second.ordinary_income, Some(-20.0));
        assert_eq!(second.announcement_date, NaiveDate::from_ymd_opt(2024, 11, 10));
        assert!(second.document_url.is_none());
    }

    #[test]
    fn test_read_prices_skips_bad_rows() {
        let csv = "date,open\n2024/08/09,\"1,250\"\nnot-a-date,100\n2024-08-02,1200\n2024/08/09,9999\n";
        let series = read_price_series_from(csv.as_bytes()).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.points()[1].open, 1250.0);
    }

    #[test]
    fn test_write_enriched_header_and_order() {
        let mut late = QuarterlyRecord::new("24.07-09");
        late.quarter = Some(Quarter::Q2);
        late.income_yield = Some(6.5);
        let early = QuarterlyRecord::new("24.04-06").with_revenue(1000.0);

        let mut buf = Vec::new();
        write_enriched(&mut buf, &[late, early]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("period,quarter,revenue,ordinary_income,announcement_date"));
        assert!(lines[0].ends_with("growth_price_corr,yield_price_corr"));
        assert!(lines[1].starts_with("24.04-06,,1000.0,"));
        assert!(lines[2].starts_with("24.07-09,2Q,"));
        assert!(lines[2].contains(",6.5,"));
    }

    #[test]
    fn test_write_json() {
        let record = QuarterlyRecord::new("24.04-06").with_revenue(10.0);
        let mut buf = Vec::new();
        write_json(&mut buf, &[record]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value[0]["period"], "24.04-06");
        assert_eq!(value[0]["revenue"], 10.0);
    }
}
