//! Parser layer for reading spreadsheet workbooks

mod excel;

pub use self::excel::{parse_range, ExcelParser};
