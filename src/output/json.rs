//! JSON records output: one object per row, keyed by column name

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::{debug, info};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::config::DateFormat;
use crate::error::{ExtractError, Result};
use crate::model::{CellValue, Column, Row, Table};

/// JSON records writer
pub struct JsonOutput {
    pretty: bool,
    date_format: DateFormat,
}

impl JsonOutput {
    pub fn new(date_format: DateFormat) -> Self {
        Self {
            pretty: false,
            date_format,
        }
    }

    pub fn pretty(date_format: DateFormat) -> Self {
        Self {
            pretty: true,
            date_format,
        }
    }

    /// Write `table` as a JSON array of row objects.
    ///
    /// Keys follow column order and non-ASCII text is written as-is.
    pub fn write_records(&self, table: &Table, writer: &mut dyn Write) -> serde_json::Result<()> {
        let records = Records {
            table,
            date_format: self.date_format,
        };
        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, &records)
        } else {
            serde_json::to_writer(&mut *writer, &records)
        }
    }

    /// Write `table` to `path`, creating the parent directory if needed
    pub fn write_file(&self, table: &Table, path: &Path) -> Result<()> {
        let write_err = |source| ExtractError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(write_err)?;
        }

        let file = File::create(path).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        self.write_records(table, &mut writer)
            .map_err(|source| ExtractError::Serialize {
                path: path.to_path_buf(),
                source,
            })?;
        writer.flush().map_err(write_err)?;

        info!("wrote {} records to {}", table.row_count(), path.display());
        Ok(())
    }

    /// Re-read a written file and check it against `table`
    pub fn verify_file(&self, table: &Table, path: &Path) -> Result<()> {
        let file = File::open(path).map_err(|source| ExtractError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_json::from_reader(BufReader::new(file)).map_err(|source| {
            ExtractError::Serialize {
                path: path.to_path_buf(),
                source,
            }
        })?;

        compare_records(table, &value, self.date_format).map_err(|reason| ExtractError::Verify {
            path: path.to_path_buf(),
            reason,
        })?;

        debug!("verified {}", path.display());
        Ok(())
    }
}

/// Convert a cell to the JSON value it is written as
pub fn cell_value_to_json(value: &CellValue, date_format: DateFormat) -> Value {
    match value {
        CellValue::Null => Value::Null,
        CellValue::Bool(b) => Value::Bool(*b),
        CellValue::Int(i) => Value::from(*i),
        CellValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        CellValue::String(s) => Value::String(s.clone()),
        CellValue::DateTime(dt) => match date_format {
            DateFormat::Epoch => Value::from(dt.and_utc().timestamp_millis()),
            DateFormat::Iso => Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()),
        },
        CellValue::Duration(d) => match date_format {
            DateFormat::Epoch => Value::from(d.num_milliseconds()),
            DateFormat::Iso => Value::String(d.to_string()),
        },
    }
}

struct Records<'a> {
    table: &'a Table,
    date_format: DateFormat,
}

impl Serialize for Records<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.table.row_count()))?;
        for row in &self.table.rows {
            seq.serialize_element(&Record {
                columns: &self.table.columns,
                row,
                date_format: self.date_format,
            })?;
        }
        seq.end()
    }
}

struct Record<'a> {
    columns: &'a [Column],
    row: &'a Row,
    date_format: DateFormat,
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, cell) in self.columns.iter().zip(&self.row.cells) {
            map.serialize_entry(&column.name, &cell_value_to_json(cell, self.date_format))?;
        }
        map.end()
    }
}

/// Check that `value` holds exactly the records of `table`, in order
fn compare_records(
    table: &Table,
    value: &Value,
    date_format: DateFormat,
) -> std::result::Result<(), String> {
    let objects = value
        .as_array()
        .ok_or_else(|| "top-level value is not an array".to_string())?;

    if objects.len() != table.row_count() {
        return Err(format!(
            "expected {} objects, found {}",
            table.row_count(),
            objects.len()
        ));
    }

    for (n, (object, row)) in objects.iter().zip(&table.rows).enumerate() {
        let object = object
            .as_object()
            .ok_or_else(|| format!("element {} is not an object", n))?;

        if object.len() != table.column_count() {
            return Err(format!(
                "object {} has {} keys, expected {}",
                n,
                object.len(),
                table.column_count()
            ));
        }

        for (column, cell) in table.columns.iter().zip(&row.cells) {
            let expected = cell_value_to_json(cell, date_format);
            match object.get(&column.name) {
                Some(actual) if *actual == expected => {}
                Some(actual) => {
                    return Err(format!(
                        "object {} column '{}': expected {}, found {}",
                        n, column.name, expected, actual
                    ))
                }
                None => return Err(format!("object {} is missing column '{}'", n, column.name)),
            }
        }
    }

    Ok(())
}
