//! Excel file parser (xlsx, xlsm, xlsb, xls, ods)

use std::path::Path;

use calamine::{open_workbook_auto, CellErrorType, Data, Range, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexSet;
use log::{debug, info};

use crate::error::{ExtractError, Result};
use crate::model::{CellValue, Column, Table};

/// Parser for spreadsheet workbooks
#[derive(Debug, Default, Clone, Copy)]
pub struct ExcelParser;

impl ExcelParser {
    /// Read one worksheet of `path` into a table.
    ///
    /// The first sheet is used when `sheet` is `None`. `label` only names the
    /// input in error messages.
    pub fn parse(&self, label: &str, path: &Path, sheet: Option<&str>) -> Result<Table> {
        let mut workbook = open_workbook_auto(path).map_err(|source| ExtractError::Open {
            label: label.to_string(),
            path: path.to_path_buf(),
            source,
        })?;
        info!("opened {} workbook {}", label, path.display());

        let sheets = workbook.sheet_names();
        let sheet_name = match sheet {
            Some(name) => {
                if !sheets.iter().any(|s| s == name) {
                    return Err(ExtractError::SheetNotFound {
                        label: label.to_string(),
                        path: path.to_path_buf(),
                        sheet: name.to_string(),
                    });
                }
                name.to_string()
            }
            None => sheets.first().cloned().ok_or_else(|| ExtractError::NoSheets {
                label: label.to_string(),
                path: path.to_path_buf(),
            })?,
        };
        debug!("reading sheet '{}' of {}", sheet_name, path.display());

        let range: Range<Data> =
            workbook
                .worksheet_range(&sheet_name)
                .map_err(|source| ExtractError::Sheet {
                    label: label.to_string(),
                    path: path.to_path_buf(),
                    sheet: sheet_name.clone(),
                    source,
                })?;

        let table = parse_range(&range);
        debug!(
            "{}: {} rows x {} columns",
            label,
            table.row_count(),
            table.column_count()
        );
        Ok(table)
    }
}

/// Turn a sheet range into a table, using its first row as the header.
///
/// Columns left of the first used cell are kept as empty `Unnamed: <i>`
/// columns so column positions match the sheet.
pub fn parse_range(range: &Range<Data>) -> Table {
    let (start_row, start_col) = range
        .start()
        .map_or((0, 0), |(r, c)| (r as usize, c as usize));
    let mut rows = range.rows();

    let Some(header_row) = rows.next() else {
        return Table::default();
    };

    let mut header = vec![Data::Empty; start_col];
    header.extend_from_slice(header_row);
    let mut table = Table::new(header_columns(&header));

    for (line_num, row) in rows.enumerate() {
        if row.iter().all(is_blank) {
            continue;
        }
        let mut cells = vec![CellValue::Null; start_col];
        cells.extend(row.iter().map(convert_cell));
        table.add_row(cells, start_row + line_num + 2); // +2 for 1-indexing and header
    }

    table.infer_column_types();
    table
}

/// Name columns from the header cells.
///
/// Blank headers become `Unnamed: <index>` and repeated names get a `.<n>`
/// suffix so every column name is unique.
fn header_columns(header: &[Data]) -> Vec<Column> {
    let mut names: IndexSet<String> = IndexSet::with_capacity(header.len());

    for (i, cell) in header.iter().enumerate() {
        let base = match cell_to_string(cell) {
            s if s.is_empty() => format!("Unnamed: {}", i),
            s => s,
        };

        let mut name = base.clone();
        let mut suffix = 0;
        while names.contains(&name) {
            suffix += 1;
            name = format!("{}.{}", base, suffix);
        }
        names.insert(name);
    }

    names
        .into_iter()
        .enumerate()
        .map(|(i, name)| Column::new(name, i))
        .collect()
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.is_empty(),
        _ => false,
    }
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => match float_as_int(*f) {
            Some(i) => i.to_string(),
            None => f.to_string(),
        },
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    }
}

fn float_as_int(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) => {
            if s.is_empty() {
                CellValue::Null
            } else {
                CellValue::String(s.clone())
            }
        }
        Data::Float(f) => match float_as_int(*f) {
            Some(i) => CellValue::Int(i),
            None => CellValue::Float(*f),
        },
        Data::Int(i) => CellValue::Int(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => {
            let converted = if dt.is_duration() {
                dt.as_duration().map(CellValue::Duration)
            } else {
                dt.as_datetime().map(CellValue::DateTime)
            };
            converted.unwrap_or(CellValue::Float(dt.as_f64()))
        }
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::String(s.clone())),
        Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(CellErrorType::NA) => CellValue::Null,
        Data::Error(e) => CellValue::String(e.to_string()),
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(cells: &[&[Data]]) -> Range<Data> {
        let height = cells.len() as u32;
        let width = cells.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, row) in cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    #[test]
    fn test_header_naming() {
        let columns = header_columns(&[s("Name"), Data::Empty, s("Name"), Data::Float(2024.0), s("Name")]);
        let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();

        assert_eq!(names, ["Name", "Unnamed: 1", "Name.1", "2024", "Name.2"]);
        assert_eq!(columns[3].index, 3);
    }

    #[test]
    fn test_convert_cell() {
        assert_eq!(convert_cell(&Data::Empty), CellValue::Null);
        assert_eq!(convert_cell(&s("")), CellValue::Null);
        assert_eq!(convert_cell(&s(" ")), CellValue::String(" ".into()));
        assert_eq!(convert_cell(&Data::Float(42.0)), CellValue::Int(42));
        assert_eq!(convert_cell(&Data::Float(3.25)), CellValue::Float(3.25));
        assert_eq!(convert_cell(&Data::Bool(true)), CellValue::Bool(true));
        assert_eq!(convert_cell(&Data::Error(CellErrorType::NA)), CellValue::Null);
        assert!(matches!(
            convert_cell(&Data::Error(CellErrorType::Div0)),
            CellValue::String(ref e) if e.starts_with('#')
        ));
    }

    #[test]
    fn test_convert_iso_dates() {
        let expected = NaiveDate::from_ymd_opt(1984, 3, 7)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(
            convert_cell(&Data::DateTimeIso("1984-03-07".into())),
            CellValue::DateTime(expected)
        );
        assert_eq!(
            convert_cell(&Data::DateTimeIso("1984-03-07T00:00:00".into())),
            CellValue::DateTime(expected)
        );
        assert_eq!(
            convert_cell(&Data::DateTimeIso("soon".into())),
            CellValue::String("soon".into())
        );
    }

    #[test]
    fn test_parse_range() {
        let table = parse_range(&range(&[
            &[s("Name"), s("DOB")],
            &[s("Élodie"), Data::Float(1990.0)],
            &[Data::Empty, Data::Empty],
            &[s("Marc"), Data::Empty],
        ]));

        assert_eq!(table.column_names(), ["Name", "DOB"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0].cells[0], CellValue::String("Élodie".into()));
        assert_eq!(table.rows[0].cells[1], CellValue::Int(1990));
        assert_eq!(table.rows[1].cells[1], CellValue::Null);
        assert_eq!(table.rows[1].source_line, 4);
    }

    #[test]
    fn test_parse_header_only() {
        let table = parse_range(&range(&[&[s("Name"), s("Phone")]]));
        assert_eq!(table.column_names(), ["Name", "Phone"]);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_parse_range_offset_columns() {
        // data starts at B1
        let mut range = Range::new((0, 1), (2, 2));
        range.set_value((0, 1), s("Name"));
        range.set_value((0, 2), s("DOB"));
        range.set_value((1, 1), s("Anaïs"));
        range.set_value((1, 2), Data::Float(1990.0));
        range.set_value((2, 1), s("Paul"));

        let table = parse_range(&range);

        assert_eq!(table.column_names(), ["Unnamed: 0", "Name", "DOB"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0].cells[0], CellValue::Null);
        assert_eq!(table.rows[0].cells[1], CellValue::String("Anaïs".into()));
        assert_eq!(table.rows[0].cells[2], CellValue::Int(1990));
        assert_eq!(table.rows[1].cells[2], CellValue::Null);
    }

    #[test]
    fn test_parse_date_and_duration_cells() {
        use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("visits.xlsx");

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let duration_format = Format::new().set_num_format("[h]:mm");
        worksheet.write_string(0, 0, "DOB").unwrap();
        worksheet.write_string(0, 1, "Chair time").unwrap();
        worksheet
            .write_datetime_with_format(1, 0, &ExcelDateTime::from_ymd(1984, 3, 7).unwrap(), &date_format)
            .unwrap();
        worksheet
            .write_datetime_with_format(1, 1, &ExcelDateTime::from_hms(1, 30, 0).unwrap(), &duration_format)
            .unwrap();
        workbook.save(&path).unwrap();

        let table = ExcelParser.parse("patients", &path, None).unwrap();

        let dob = NaiveDate::from_ymd_opt(1984, 3, 7)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(table.rows[0].cells[0], CellValue::DateTime(dob));
        assert_eq!(
            table.rows[0].cells[1],
            CellValue::Duration(chrono::Duration::minutes(90))
        );
    }

    #[test]
    fn test_parse_empty_range() {
        let table = parse_range(&Range::<Data>::empty());
        assert_eq!(table.column_count(), 0);
        assert_eq!(table.row_count(), 0);
    }
}
