//! File formats for documents.

mod csv;

pub use csv::{parse_csv, parse_csv_str, write_csv, write_csv_to};
