//! Data adapters: disclosure and price tables in, enriched tables out

pub mod csv_io;
pub mod parse;

pub use csv_io::{
    read_disclosures, read_disclosures_from, read_price_series, read_price_series_from,
    write_enriched, write_enriched_csv, write_json,
};
pub use parse::{parse_disclosure_date, parse_number};
