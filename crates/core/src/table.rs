//! Uniform tabular model shared by every decoder
//!
//! A [`StatsTable`] is a list of column names plus rows of [`Cell`]s. Decoders
//! build it from loosely-shaped records (ordered key/value lists), the filter
//! consumes it and the shell prints or exports it.

use std::fmt;
use std::io;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Display name of the value column
pub const VALUE_COLUMN: &str = "値";

/// Display name of the unit column
pub const UNIT_COLUMN: &str = "単位";

/// A single table cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
    Null,
}

impl Cell {
    /// Parse a raw value into a finite number, or `Null`
    pub fn numeric(raw: &str) -> Cell {
        match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Cell::Number(n),
            _ => Cell::Null,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

/// Integral numbers keep one decimal place (`0.0`, `1200.0`) and nulls print
/// as an empty string, so filters match what a dataframe would show.
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e16 => write!(f, "{n:.1}"),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Null => Ok(()),
        }
    }
}

/// Columns and rows of one statistics table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl StatsTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from records of `(column, cell)` pairs
    ///
    /// Column order is the order of first appearance across all records.
    /// Cells missing from a record are `Null`.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Vec<(String, Cell)>>,
    {
        let records: Vec<Vec<(String, Cell)>> = records.into_iter().collect();

        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for (key, _) in record {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let mut table = Self::new(columns);
        for record in records {
            let mut row = vec![Cell::Null; table.columns.len()];
            for (key, cell) in record {
                if let Some(at) = table.column_index(&key) {
                    row[at] = cell;
                }
            }
            table.rows.push(row);
        }
        table
    }

    /// Append a row, padding or truncating it to the column count
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Null);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Column values by name
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let at = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[at]).collect())
    }

    /// Rename a column in place; unknown names are ignored
    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some(at) = self.column_index(from) {
            self.columns[at] = to.to_string();
        }
    }

    /// Replace every cell of `name` with its numeric coercion
    pub fn coerce_numeric(&mut self, name: &str) {
        let Some(at) = self.column_index(name) else {
            return;
        };
        for row in &mut self.rows {
            let coerced = match &row[at] {
                Cell::Text(s) => Cell::numeric(s),
                Cell::Number(n) if n.is_finite() => Cell::Number(*n),
                _ => Cell::Null,
            };
            row[at] = coerced;
        }
    }

    /// A new table with the same columns and only the rows `keep` accepts
    pub fn retain_rows<F>(&self, mut keep: F) -> StatsTable
    where
        F: FnMut(&[Cell]) -> bool,
    {
        StatsTable {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| keep(row.as_slice()))
                .cloned()
                .collect(),
        }
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> StatsTable {
        StatsTable {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Write the table as CSV with a header row
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(&self.columns)?;
        for row in &self.rows {
            out.write_record(row.iter().map(|cell| cell.to_string()))?;
        }
        out.flush()?;
        Ok(())
    }

    /// Rows as column-keyed maps, ready for JSON output
    pub fn records(&self) -> Vec<Record<'_>> {
        self.rows
            .iter()
            .map(|row| Record {
                columns: &self.columns,
                cells: row,
            })
            .collect()
    }
}

/// Borrowed view of one row that serializes as a map of column to cell
#[derive(Debug)]
pub struct Record<'a> {
    columns: &'a [String],
    cells: &'a [Cell],
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, cell) in self.columns.iter().zip(self.cells) {
            map.serialize_entry(column, cell)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> Vec<(String, Cell)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Cell::from(*v)))
            .collect()
    }

    #[test]
    fn test_from_records_union_of_columns_in_first_seen_order() {
        let table = StatsTable::from_records(vec![
            record(&[("a", "1"), ("b", "2")]),
            record(&[("c", "3"), ("a", "4")]),
        ]);

        assert_eq!(table.columns(), &["a", "b", "c"]);
        assert_eq!(table.rows()[1], vec![Cell::from("4"), Cell::Null, Cell::from("3")]);
    }

    #[test]
    fn test_coerce_numeric() {
        let mut table = StatsTable::from_records(vec![
            record(&[(VALUE_COLUMN, "12.5")]),
            record(&[(VALUE_COLUMN, "N/A")]),
            record(&[(VALUE_COLUMN, "0")]),
            record(&[(VALUE_COLUMN, "inf")]),
            record(&[(VALUE_COLUMN, " 7 ")]),
        ]);

        table.coerce_numeric(VALUE_COLUMN);

        let values: Vec<Cell> = table.column(VALUE_COLUMN).unwrap().into_iter().cloned().collect();
        assert_eq!(
            values,
            vec![
                Cell::Number(12.5),
                Cell::Null,
                Cell::Number(0.0),
                Cell::Null,
                Cell::Number(7.0)
            ]
        );
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Number(0.0).to_string(), "0.0");
        assert_eq!(Cell::Number(1200.0).to_string(), "1200.0");
        assert_eq!(Cell::Number(12.5).to_string(), "12.5");
        assert_eq!(Cell::Null.to_string(), "");
        assert_eq!(Cell::from("人口").to_string(), "人口");
    }

    #[test]
    fn test_rename_and_push_row_padding() {
        let mut table = StatsTable::new(vec!["unit".into(), "value".into()]);
        table.push_row(vec![Cell::from("人")]);
        table.rename("unit", UNIT_COLUMN);
        table.rename("missing", "ignored");

        assert_eq!(table.columns(), &[UNIT_COLUMN, "value"]);
        assert_eq!(table.rows()[0], vec![Cell::from("人"), Cell::Null]);
    }

    #[test]
    fn test_write_csv() {
        let mut table = StatsTable::new(vec!["地域".into(), VALUE_COLUMN.into()]);
        table.push_row(vec![Cell::from("東京, 都"), Cell::Number(3.0)]);
        table.push_row(vec![Cell::from("大阪"), Cell::Null]);

        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "地域,値\n\"東京, 都\",3.0\n大阪,\n"
        );
    }

    #[test]
    fn test_records_serialize_as_objects() {
        let mut table = StatsTable::new(vec!["地域".into(), VALUE_COLUMN.into()]);
        table.push_row(vec![Cell::from("東京"), Cell::Number(1.5)]);
        table.push_row(vec![Cell::from("大阪"), Cell::Null]);

        let json = serde_json::to_value(table.records()).unwrap();

        assert_eq!(
            json,
            serde_json::json!([{"地域": "東京", "値": 1.5}, {"地域": "大阪", "値": null}])
        );
    }

    #[test]
    fn test_head_and_retain_rows_keep_columns() {
        let mut table = StatsTable::new(vec!["x".into()]);
        for i in 0..5 {
            table.push_row(vec![Cell::Number(i as f64)]);
        }

        assert_eq!(table.head(2).len(), 2);
        let even = table.retain_rows(|row| row[0].as_number().is_some_and(|n| n % 2.0 == 0.0));
        assert_eq!(even.len(), 3);
        assert_eq!(even.columns(), table.columns());
    }
}
