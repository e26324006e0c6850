//! In-memory tabular model shared by every pipeline stage.
//!
//! A `Table` is an ordered list of column names plus ordered rows of typed
//! cells. Loaders (CSV here, spreadsheets in `loanbook-io`) produce tables;
//! stages consume and return them.

use std::fmt;

use chrono::{NaiveDate, TimeDelta};
use ordered_float::OrderedFloat;

use crate::error::ReconError;

static EMPTY: Value = Value::Empty;

/// Largest magnitude below which every integer has an exact `f64`.
const MAX_EXACT_INT: u64 = 1 << 53;

/// A single cell.
///
/// Equality is exact and type-sensitive: `Text("1001")` never equals
/// `Number(1001.0)`. Integer and float spreadsheet cells are both `Number`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    #[default]
    Empty,
    Text(String),
    Number(OrderedFloat<f64>),
    Bool(bool),
    /// Date or datetime cell, held as an Excel serial (1900 date system).
    Date(OrderedFloat<f64>),
}

impl Value {
    pub fn number(n: f64) -> Self {
        Self::Number(OrderedFloat(n))
    }

    pub fn date(serial: f64) -> Self {
        Self::Date(OrderedFloat(serial))
    }

    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Infer a cell from a raw delimited-text field: empty stays empty,
    /// finite float literals become numbers, anything else is text.
    ///
    /// Integer literals become numbers only while `f64` holds them exactly;
    /// longer ones (18-digit account numbers) stay text so that distinct
    /// keys never compare equal.
    pub fn from_field(field: &str) -> Self {
        if field.is_empty() {
            return Self::Empty;
        }
        let trimmed = field.trim();
        if is_integer_literal(trimmed) {
            return match trimmed.parse::<i64>() {
                Ok(n) if n.unsigned_abs() <= MAX_EXACT_INT => Self::number(n as f64),
                _ => Self::Text(field.to_string()),
            };
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Self::number(n),
            _ => Self::Text(field.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Text content, or `None` for non-text cells.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value of a number cell or of text holding a float literal.
    /// Dates are not amounts.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(n.into_inner()),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Self::Empty | Self::Bool(_) | Self::Date(_) => None,
        }
    }
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => write!(f, "{s}"),
            // Integers without decimals
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", n.into_inner() as i64),
            Self::Number(n) => write!(f, "{}", n.into_inner()),
            Self::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Self::Date(serial) => fmt_serial(f, serial.into_inner()),
        }
    }
}

/// ISO date for whole serials, ISO datetime otherwise.
fn fmt_serial(f: &mut fmt::Formatter<'_>, serial: f64) -> fmt::Result {
    let ms = (serial * 86_400_000.0).round() as i64;
    let datetime = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .zip(TimeDelta::try_milliseconds(ms))
        .and_then(|(epoch, delta)| epoch.checked_add_signed(delta));
    match datetime {
        Some(dt) if serial.fract() == 0.0 => write!(f, "{}", dt.format("%Y-%m-%d")),
        Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        None => write!(f, "{serial}"),
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::text(s)
    }
}

/// Ordered columns plus ordered rows. Every row has exactly one cell per column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    pub fn with_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Parse delimited text whose first record is the header row.
    pub fn from_csv_str(data: &str, delimiter: u8) -> Result<Self, ReconError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(data.as_bytes());

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| ReconError::Pipeline(e.to_string()))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut table = Self::new(columns);
        for record in reader.records() {
            let record = record.map_err(|e| ReconError::Pipeline(e.to_string()))?;
            table.push_row(record.iter().map(Value::from_field).collect());
        }
        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Append a row, padding short rows with empty cells and dropping cells
    /// beyond the last column.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Empty);
        self.rows.push(row);
    }

    /// Index of the first column named exactly `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Column names with surrounding whitespace removed, in original order.
    pub fn trimmed_columns(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.trim()).collect()
    }

    pub fn cell(&self, row: usize, col: usize) -> &Value {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    pub fn column_values(&self, col: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |r| r.get(col).unwrap_or(&EMPTY))
    }

    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[Value]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }

    /// Append a column. `values` must hold one cell per row.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<Value>) -> Result<(), ReconError> {
        if values.len() != self.rows.len() {
            return Err(ReconError::Pipeline(format!(
                "column has {} values for {} rows",
                values.len(),
                self.rows.len()
            )));
        }
        self.columns.push(name.into());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_inference() {
        assert_eq!(Value::from_field(""), Value::Empty);
        assert_eq!(Value::from_field("1001"), Value::number(1001.0));
        assert_eq!(Value::from_field("12.5"), Value::number(12.5));
        assert_eq!(Value::from_field("LN-1001"), Value::text("LN-1001"));
        // Non-finite literals stay text
        assert_eq!(Value::from_field("NaN"), Value::text("NaN"));
        assert_eq!(Value::from_field("inf"), Value::text("inf"));
    }

    #[test]
    fn long_integers_stay_text() {
        // 2^53 is the last integer before f64 starts skipping
        assert_eq!(Value::from_field("9007199254740992"), Value::number(9_007_199_254_740_992.0));
        assert_eq!(Value::from_field("9007199254740993"), Value::text("9007199254740993"));
        assert_eq!(Value::from_field("-42"), Value::number(-42.0));
        assert_eq!(Value::from_field("123456789012345678901234"), Value::text("123456789012345678901234"));
        // Still usable as an amount
        assert_eq!(Value::from_field("9007199254740993").to_f64(), Some(9_007_199_254_740_992.0));
    }

    #[test]
    fn equality_is_type_sensitive() {
        assert_ne!(Value::text("1001"), Value::number(1001.0));
        assert_eq!(Value::number(1001.0), Value::number(1001.0));
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(Value::number(3.5).to_f64(), Some(3.5));
        assert_eq!(Value::text(" 42 ").to_f64(), Some(42.0));
        assert_eq!(Value::text("n/a").to_f64(), None);
        assert_eq!(Value::Bool(true).to_f64(), None);
        assert_eq!(Value::Empty.to_f64(), None);
    }

    #[test]
    fn display_formats_integers_without_decimals() {
        assert_eq!(Value::number(1500.0).to_string(), "1500");
        assert_eq!(Value::number(0.25).to_string(), "0.25");
        assert_eq!(Value::Bool(false).to_string(), "FALSE");
        assert_eq!(Value::Empty.to_string(), "");
    }

    #[test]
    fn dates_display_as_iso() {
        assert_eq!(Value::date(45382.0).to_string(), "2024-03-31");
        assert_eq!(Value::date(45382.5).to_string(), "2024-03-31 12:00:00");
        assert_eq!(Value::date(45382.0).to_f64(), None);
        assert_ne!(Value::date(45382.0), Value::number(45382.0));
    }

    #[test]
    fn csv_parse_pads_ragged_rows() {
        let csv = "\
id,name,amount
1,alpha,10
2,beta
";
        let table = Table::from_csv_str(csv, b',').unwrap();
        assert_eq!(table.columns(), &["id", "name", "amount"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(1, 2), &Value::Empty);
        assert_eq!(table.cell(0, 2), &Value::number(10.0));
        // Out of range reads as empty
        assert_eq!(table.cell(9, 9), &Value::Empty);
    }

    #[test]
    fn push_column_requires_one_value_per_row() {
        let mut table = Table::with_rows(vec!["a".into()], vec![vec![1.0.into()], vec![2.0.into()]]);
        assert!(table.push_column("b", vec![Value::Empty]).is_err());
        table.push_column("b", vec![Value::Empty, "x".into()]).unwrap();
        assert_eq!(table.columns(), &["a", "b"]);
        assert_eq!(table.cell(1, 1), &Value::text("x"));
    }

    #[test]
    fn trimmed_columns_keep_order() {
        let table = Table::new(vec![" Gl Desc ".into(), "Debit Amount\t".into()]);
        assert_eq!(table.trimmed_columns(), vec!["Gl Desc", "Debit Amount"]);
    }
}
