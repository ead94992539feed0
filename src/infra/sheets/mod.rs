//! Registration sheet exported as CSV.

mod csv_sheet;

pub use csv_sheet::{CsvSheet, parse_rows};
