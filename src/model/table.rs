//! Table, Row, and Cell data structures

use std::borrow::Cow;

use chrono::{Duration, NaiveDateTime};

use super::schema::{CellType, Column};

/// A decoded cell value
#[derive(Debug, Clone)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    DateTime(NaiveDateTime),
    Duration(Duration),
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Null, CellValue::Null) => true,
            (CellValue::Bool(a), CellValue::Bool(b)) => a == b,
            (CellValue::Int(a), CellValue::Int(b)) => a == b,
            (CellValue::Float(a), CellValue::Float(b)) => {
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (CellValue::String(a), CellValue::String(b)) => a == b,
            (CellValue::DateTime(a), CellValue::DateTime(b)) => a == b,
            (CellValue::Duration(a), CellValue::Duration(b)) => a == b,
            _ => false,
        }
    }
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn cell_type(&self) -> CellType {
        match self {
            CellValue::Null => CellType::Null,
            CellValue::Bool(_) => CellType::Bool,
            CellValue::Int(_) => CellType::Int,
            CellValue::Float(_) => CellType::Float,
            CellValue::String(_) => CellType::String,
            CellValue::DateTime(_) => CellType::DateTime,
            CellValue::Duration(_) => CellType::Duration,
        }
    }

    /// Convert to a display string
    pub fn display(&self) -> Cow<'_, str> {
        match self {
            CellValue::Null => Cow::Borrowed("NULL"),
            CellValue::Bool(b) => Cow::Owned(b.to_string()),
            CellValue::Int(i) => Cow::Owned(i.to_string()),
            CellValue::Float(f) => Cow::Owned(f.to_string()),
            CellValue::String(s) => Cow::Borrowed(s.as_str()),
            CellValue::DateTime(dt) => Cow::Owned(dt.to_string()),
            CellValue::Duration(d) => Cow::Owned(d.to_string()),
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

/// A row in the table
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Cell values in column order
    pub cells: Vec<CellValue>,
    /// Row number in the source sheet (1-indexed, header is row 1)
    pub source_line: usize,
}

impl Row {
    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.cells.get(index)
    }
}

/// A table containing columns and rows
#[derive(Debug, Default)]
pub struct Table {
    /// Column definitions
    pub columns: Vec<Column>,
    /// All rows in the table, in source order
    pub rows: Vec<Row>,
}

impl Table {
    /// Create a new empty table with column definitions
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Add a row, padding or truncating it to the column count
    pub fn add_row(&mut self, mut cells: Vec<CellValue>, source_line: usize) {
        cells.resize(self.columns.len(), CellValue::Null);
        self.rows.push(Row { cells, source_line });
    }

    /// Column names in detected order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// The first `n` rows, or fewer if the table is shorter
    pub fn head(&self, n: usize) -> &[Row] {
        &self.rows[..n.min(self.rows.len())]
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Infer each column's type and promote integers in float columns.
    pub fn infer_column_types(&mut self) {
        for col_idx in 0..self.columns.len() {
            let inferred = self
                .rows
                .iter()
                .filter_map(|row| row.get(col_idx))
                .fold(CellType::Null, |acc, cell| acc.widen(cell.cell_type()));

            if inferred == CellType::Float {
                for row in &mut self.rows {
                    if let Some(cell) = row.cells.get_mut(col_idx) {
                        if let CellValue::Int(i) = *cell {
                            *cell = CellValue::Float(i as f64);
                        }
                    }
                }
            }

            self.columns[col_idx].inferred_type = inferred;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(names: &[&str]) -> Table {
        Table::new(
            names
                .iter()
                .enumerate()
                .map(|(i, n)| Column::new(*n, i))
                .collect(),
        )
    }

    #[test]
    fn test_add_row_pads_short_rows() {
        let mut t = table(&["Name", "DOB", "Phone"]);
        t.add_row(vec!["Zoé".into()], 2);

        assert_eq!(t.rows[0].cells.len(), 3);
        assert!(t.rows[0].cells[1].is_null());
        assert!(t.rows[0].cells[2].is_null());
    }

    #[test]
    fn test_head_is_bounded() {
        let mut t = table(&["Name"]);
        for i in 0..3 {
            t.add_row(vec![CellValue::Int(i)], i as usize + 2);
        }

        assert_eq!(t.head(5).len(), 3);
        assert_eq!(t.head(2).len(), 2);
        assert_eq!(t.head(2)[1].cells[0], CellValue::Int(1));
        assert!(table(&["Name"]).head(5).is_empty());
    }

    #[test]
    fn test_infer_promotes_mixed_numeric_column() {
        let mut t = table(&["Amount", "Count"]);
        t.add_row(vec![CellValue::Int(1), CellValue::Int(3)], 2);
        t.add_row(vec![CellValue::Float(2.5), CellValue::Null], 3);
        t.infer_column_types();

        assert_eq!(t.columns[0].inferred_type, CellType::Float);
        assert_eq!(t.rows[0].cells[0], CellValue::Float(1.0));
        assert_eq!(t.columns[1].inferred_type, CellType::Int);
        assert_eq!(t.rows[0].cells[1], CellValue::Int(3));
    }

    #[test]
    fn test_infer_leaves_mixed_columns_alone() {
        let mut t = table(&["Code"]);
        t.add_row(vec![CellValue::Int(7)], 2);
        t.add_row(vec!["A7".into()], 3);
        t.infer_column_types();

        assert_eq!(t.columns[0].inferred_type, CellType::Mixed);
        assert_eq!(t.rows[0].cells[0], CellValue::Int(7));
    }
}
