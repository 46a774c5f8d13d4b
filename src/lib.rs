//! sheetextract - Extract spreadsheet tables to JSON records
//!
//! Reads workbooks (xlsx, xlsm, xlsb, xls, ods) with their first row as the
//! header, reports their shape on the console, and writes each table as a
//! JSON array of row objects.

pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod output;
pub mod parser;

pub use config::{Config, DateFormat, Source};
pub use error::ExtractError;
pub use extract::{Extracted, Extractor};
pub use model::Table;
