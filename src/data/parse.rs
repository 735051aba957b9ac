//! Parsing of disclosure cell text

use chrono::NaiveDate;

/// Parse a disclosed number.
///
/// Empty cells and dash placeholders (`-`, `－`) are missing values.
/// Thousands separators are dropped and the full-width minus is normalized.
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() || text == "-" || text == "－" {
        return None;
    }

    let normalized: String = text
        .chars()
        .filter(|c| *c != ',')
        .map(|c| if c == '－' { '-' } else { c })
        .collect();

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an announcement or price date.
///
/// Accepts `YYYY/MM/DD`, `YY/MM/DD` (20YY) and ISO `YYYY-MM-DD`.
pub fn parse_disclosure_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if text.contains('/') {
        let parts: Vec<&str> = text.split('/').collect();
        if parts.len() != 3 {
            return None;
        }
        let mut year: i32 = parts[0].trim().parse().ok()?;
        let month: u32 = parts[1].trim().parse().ok()?;
        let day: u32 = parts[2].trim().parse().ok()?;
        if year < 100 {
            year += 2000;
        }
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}
