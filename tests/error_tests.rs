//! Error construction and message formatting

use quarterly_metrics::calendar::FiscalCalendar;
use quarterly_metrics::config::PipelineConfig;
use quarterly_metrics::error::MetricsError;
use quarterly_metrics::period::FiscalPeriod;
use quarterly_metrics::pipeline::MetricsPipeline;
use quarterly_metrics::pricing::PriceSeries;
use quarterly_metrics::record::QuarterlyRecord;
use quarterly_metrics::types::Quarter;

#[cfg(test)]
mod error_tests {
    use super::*;

    // ========== Configuration ==========

    #[test]
    fn test_invalid_fiscal_month() {
        let err = FiscalCalendar::new(13).unwrap_err();
        assert!(matches!(err, MetricsError::InvalidFiscalMonth(13)));

        let msg = err.to_string();
        assert!(msg.contains("Invalid fiscal year end month"));
        assert!(msg.contains("13"));
        assert!(msg.contains("1-12"));
    }

    #[test]
    fn test_negative_price_offset() {
        let config = PipelineConfig {
            price_offset_days: -3,
            ..Default::default()
        };
        let err = MetricsPipeline::new(config).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("Configuration error"));
        assert!(msg.contains("price_offset_days"));
        assert!(msg.contains("-3"));
    }

    // ========== Input validation ==========

    #[test]
    fn test_malformed_period() {
        let err = FiscalPeriod::parse("2024.04-06").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Malformed fiscal period label"));
        assert!(msg.contains("2024.04-06"));
    }

    #[test]
    fn test_bad_month_in_period() {
        assert!(matches!(
            FiscalPeriod::parse("24.04-13"),
            Err(MetricsError::MalformedPeriod(_))
        ));
    }

    #[test]
    fn test_empty_input() {
        let err = MetricsPipeline::default()
            .run(Vec::new(), &PriceSeries::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "No quarterly records supplied");
    }

    #[test]
    fn test_duplicate_period() {
        let records = vec![
            QuarterlyRecord::new("24.07-09"),
            QuarterlyRecord::new("24.04-06"),
            QuarterlyRecord::new("24.07-09"),
        ];
        let err = MetricsPipeline::default()
            .run(records, &PriceSeries::default())
            .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("Duplicate fiscal period"));
        assert!(msg.contains("24.07-09"));
    }

    #[test]
    fn test_quarter_parse_error() {
        let err = "5Q".parse::<Quarter>().unwrap_err();
        assert!(matches!(err, MetricsError::ParseError(_)));
        assert!(err.to_string().contains("5Q"));
    }

    // ========== Wrapped errors ==========

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.csv");
        let err: MetricsError = io.into();
        let msg = err.to_string();
        assert!(msg.contains("IO error"));
        assert!(msg.contains("missing.csv"));
    }

    #[test]
    fn test_serde_error_conversion() {
        let bad = serde_json::from_str::<PipelineConfig>("{not json").unwrap_err();
        let err: MetricsError = bad.into();
        assert!(err.to_string().contains("Serialization error"));
    }

    #[test]
    fn test_missing_file_is_data_error() {
        let err = quarterly_metrics::data::read_disclosures("/nonexistent/disclosures.csv")
            .unwrap_err();
        assert!(matches!(err, MetricsError::DataError(_)));
        assert!(err.to_string().contains("/nonexistent/disclosures.csv"));
    }
}
