//! Console diagnostics for a loaded table

use std::io::Write;

use tabled::builder::Builder;
use tabled::settings::Style;

use crate::model::Table;

/// Width of the line printed between sources
pub const SEPARATOR_WIDTH: usize = 50;

/// Terminal report: row count, columns, and a preview of the first rows
pub struct TerminalOutput {
    preview_rows: usize,
}

impl TerminalOutput {
    pub fn new(preview_rows: usize) -> Self {
        Self { preview_rows }
    }

    pub fn write_reading(&self, label: &str, writer: &mut dyn Write) -> std::io::Result<()> {
        writeln!(writer, "Reading {} file...", label)
    }

    pub fn write_separator(&self, writer: &mut dyn Write) -> std::io::Result<()> {
        writeln!(writer)?;
        writeln!(writer, "{}", "=".repeat(SEPARATOR_WIDTH))
    }

    /// Print the row count, column list, and preview for `table`
    pub fn write_report(
        &self,
        label: &str,
        table: &Table,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        writeln!(writer, "{} rows of {} found", table.row_count(), label)?;
        writeln!(writer)?;
        writeln!(writer, "Columns {}: {:?}", label, table.column_names())?;
        writeln!(writer)?;
        writeln!(
            writer,
            "Preview {} (first {} rows):",
            label, self.preview_rows
        )?;
        writeln!(writer, "{}", build_preview(table, self.preview_rows))?;
        Ok(())
    }
}

/// Render the first `limit` rows as a table, with a leading row-index column
fn build_preview(table: &Table, limit: usize) -> String {
    let rows = table.head(limit);
    if rows.is_empty() {
        return format!("(no rows) columns: {:?}", table.column_names());
    }

    let mut builder = Builder::default();

    let mut header = vec![String::new()];
    header.extend(table.columns.iter().map(|c| c.name.clone()));
    builder.push_record(header);

    for (i, row) in rows.iter().enumerate() {
        let mut record = vec![i.to_string()];
        record.extend(row.cells.iter().map(|c| c.display().into_owned()));
        builder.push_record(record);
    }

    let mut preview = builder.build();
    preview.with(Style::modern());
    preview.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellValue, Column};

    fn contacts(rows: i64) -> Table {
        let mut table = Table::new(vec![Column::new("Name", 0), Column::new("Phone", 1)]);
        for i in 0..rows {
            table.add_row(vec![format!("Contact {}", i).into(), CellValue::Null], i as usize + 2);
        }
        table
    }

    fn report(table: &Table) -> String {
        let mut buf = Vec::new();
        TerminalOutput::new(5)
            .write_report("correspondents", table, &mut buf)
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_report_lines() {
        let out = report(&contacts(2));

        assert!(out.starts_with("2 rows of correspondents found\n"));
        assert!(out.contains(r#"Columns correspondents: ["Name", "Phone"]"#));
        assert!(out.contains("Contact 1"));
        assert!(out.contains("NULL"));
    }

    #[test]
    fn test_preview_is_limited() {
        let out = report(&contacts(8));

        assert!(out.contains("8 rows of correspondents found"));
        assert!(out.contains("Contact 4"));
        assert!(!out.contains("Contact 5"));
    }

    #[test]
    fn test_empty_preview() {
        let out = report(&contacts(0));

        assert!(out.starts_with("0 rows of correspondents found\n"));
        assert!(out.contains("(no rows)"));
    }
}
