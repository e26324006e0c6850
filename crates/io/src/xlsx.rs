// Excel import (xlsx, xlsm, xls, xlsb, ods) and export (xlsx only)
//
// Import: first sheet (or a named one) becomes a Table; the first non-empty
//         row is the header.
// Export: one worksheet, header row then data rows. Values only, no formulas.
//         Date cells keep a date number format.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use loanbook_recon::{Table, Value};
use rust_xlsxwriter::{Format, FormatBorder, Workbook as XlsxWorkbook};

use crate::error::IoError;
use crate::OUTPUT_SHEET_NAME;

/// Excel sheet limits
const MAX_ROWS: usize = 1_048_576;
const MAX_COLS: usize = 16_384;

const DATE_FORMAT: &str = "yyyy-mm-dd";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Import one sheet of a spreadsheet file. `sheet = None` reads the first sheet.
pub fn import(path: &Path, sheet: Option<&str>) -> Result<Table, IoError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path).map_err(|e| IoError::read(path, e))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(name) => sheet_names
            .iter()
            .find(|s| s.as_str() == name)
            .cloned()
            .ok_or_else(|| IoError::SheetNotFound {
                path: path.to_path_buf(),
                sheet: name.to_string(),
                available: sheet_names.clone(),
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| IoError::read(path, "workbook contains no sheets"))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| IoError::read(path, format!("sheet '{sheet_name}': {e}")))?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_value).collect::<Vec<Value>>())
        .skip_while(|row| row.iter().all(Value::is_empty));

    let header = rows.next().ok_or_else(|| IoError::NoHeader { path: path.to_path_buf() })?;
    let columns = header.iter().map(|v| v.to_string()).collect();
    let table = Table::with_rows(columns, rows.collect());

    log::debug!(
        "{} [{}]: {} rows x {} columns",
        path.display(),
        sheet_name,
        table.len(),
        table.width()
    );
    Ok(table)
}

/// Map one spreadsheet cell to a table value.
fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Empty,
        Data::String(s) if s.is_empty() => Value::Empty,
        Data::String(s) => Value::text(s.as_str()),
        Data::Float(n) => Value::number(*n),
        Data::Int(n) => Value::number(*n as f64),
        Data::Bool(b) => Value::Bool(*b),
        // Store error as text representation
        Data::Error(e) => Value::text(format!("#{e:?}")),
        Data::DateTime(dt) if dt.is_duration() => Value::number(dt.as_f64()),
        Data::DateTime(dt) => Value::date(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::text(s.as_str()),
    }
}

/// Export statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportResult {
    pub rows_exported: usize,
    pub cells_exported: usize,
}

/// Write `table` to an xlsx file with a single `Loan Portfolio` sheet.
pub fn export(table: &Table, path: &Path) -> Result<ExportResult, IoError> {
    let (bytes, result) = render(table).map_err(|e| IoError::write(path, e))?;
    std::fs::write(path, bytes).map_err(|e| IoError::write(path, e))?;
    log::debug!("wrote {} data rows to {}", result.rows_exported, path.display());
    Ok(result)
}

/// Same as [`export`], returning the xlsx bytes instead of writing a file.
pub fn export_to_buffer(table: &Table) -> Result<Vec<u8>, IoError> {
    let (bytes, _) = render(table).map_err(IoError::Workbook)?;
    Ok(bytes)
}

fn render(table: &Table) -> Result<(Vec<u8>, ExportResult), String> {
    let (mut workbook, result) = build_workbook(table)?;
    let bytes = workbook
        .save_to_buffer()
        .map_err(|e| format!("Failed to serialize XLSX: {}", e))?;
    Ok((bytes, result))
}

fn build_workbook(table: &Table) -> Result<(XlsxWorkbook, ExportResult), String> {
    if table.len() + 1 > MAX_ROWS || table.width() > MAX_COLS {
        return Err(format!(
            "{} rows x {} columns exceeds the Excel sheet limit",
            table.len() + 1,
            table.width()
        ));
    }

    let mut xlsx_workbook = XlsxWorkbook::new();
    let worksheet = xlsx_workbook
        .add_worksheet()
        .set_name(OUTPUT_SHEET_NAME)
        .map_err(|e| format!("Failed to create sheet '{}': {}", OUTPUT_SHEET_NAME, e))?;

    let mut result = ExportResult::default();

    let header_format = Format::new().set_bold().set_border(FormatBorder::Thin);
    let date_format = Format::new().set_num_format(DATE_FORMAT);
    let datetime_format = Format::new().set_num_format(DATETIME_FORMAT);
    for (col, name) in table.columns().iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, name, &header_format)
            .map_err(|e| format!("Failed to write header '{}': {}", name, e))?;
    }

    for (row_idx, row) in table.rows().iter().enumerate() {
        let row32 = (row_idx + 1) as u32;
        for (col_idx, value) in row.iter().enumerate() {
            let col16 = col_idx as u16;
            let written = match value {
                Value::Empty => continue,
                Value::Text(s) => worksheet.write_string(row32, col16, s),
                Value::Number(n) => worksheet.write_number(row32, col16, n.into_inner()),
                Value::Bool(b) => worksheet.write_boolean(row32, col16, *b),
                Value::Date(serial) if serial.fract() == 0.0 => {
                    worksheet.write_number_with_format(row32, col16, serial.into_inner(), &date_format)
                }
                Value::Date(serial) => {
                    worksheet.write_number_with_format(row32, col16, serial.into_inner(), &datetime_format)
                }
            };
            written.map_err(|e| format!("Failed to write row {}: {}", row_idx + 2, e))?;
            result.cells_exported += 1;
        }
        result.rows_exported += 1;
    }

    Ok((xlsx_workbook, result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn portfolio() -> Table {
        Table::with_rows(
            vec![
                "loan_account_number".into(),
                "customer_name".into(),
                "principal_outstanding".into(),
                "nach_status".into(),
                "Accrual_Amount".into(),
                "AUM".into(),
            ],
            vec![
                vec![
                    Value::text("LN1001"),
                    Value::text("Asha Rao"),
                    Value::number(100_000.0),
                    Value::Bool(true),
                    Value::number(1500.0),
                    Value::number(101_000.0),
                ],
                vec![
                    Value::text("LN1004"),
                    Value::Empty,
                    Value::number(1000.0),
                    Value::Bool(false),
                    Value::number(50.25),
                    Value::Empty,
                ],
            ],
        )
    }

    #[test]
    fn export_then_import_preserves_types() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Loan_Portfolio.xlsx");

        let result = export(&portfolio(), &path).unwrap();
        assert_eq!(result.rows_exported, 2);
        assert_eq!(result.cells_exported, 10);

        let table = import(&path, None).unwrap();
        assert_eq!(table.columns(), portfolio().columns());
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 0), &Value::text("LN1001"));
        assert_eq!(table.cell(0, 2), &Value::number(100_000.0));
        assert_eq!(table.cell(0, 3), &Value::Bool(true));
        assert_eq!(table.cell(1, 1), &Value::Empty);
        assert_eq!(table.cell(1, 4), &Value::number(50.25));
    }

    #[test]
    fn export_uses_portfolio_sheet_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        export(&portfolio(), &path).unwrap();

        let workbook: Sheets<_> = open_workbook_auto(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec![OUTPUT_SHEET_NAME.to_string()]);
        assert!(import(&path, Some(OUTPUT_SHEET_NAME)).is_ok());
    }

    #[test]
    fn header_only_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");
        let empty = Table::new(vec!["loan_account_number".into(), "AUM".into()]);
        export(&empty, &path).unwrap();

        let table = import(&path, None).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns(), &["loan_account_number", "AUM"]);
    }

    #[test]
    fn missing_sheet_lists_available() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        export(&portfolio(), &path).unwrap();

        let err = import(&path, Some("LMS053")).unwrap_err();
        assert!(err.to_string().contains("available: Loan Portfolio"), "{err}");
    }

    #[test]
    fn buffer_export_matches_file_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buffer.xlsx");
        let bytes = export_to_buffer(&portfolio()).unwrap();
        assert_eq!(&bytes[..2], b"PK");

        std::fs::write(&path, &bytes).unwrap();
        let table = import(&path, Some(OUTPUT_SHEET_NAME)).unwrap();
        assert_eq!(table, import_exported(&portfolio(), dir.path()));
    }

    fn import_exported(table: &Table, dir: &Path) -> Table {
        let path = dir.join("file.xlsx");
        export(table, &path).unwrap();
        import(&path, None).unwrap()
    }

    #[test]
    fn dates_survive_export_and_import() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dates.xlsx");
        let table = Table::with_rows(
            vec!["loan_account_number".into(), "sanction_date".into(), "last_receipt_at".into()],
            vec![vec![Value::text("LN1001"), Value::date(45382.0), Value::date(45382.5)]],
        );
        export(&table, &path).unwrap();

        let mut workbook: Sheets<_> = open_workbook_auto(&path).unwrap();
        let range = workbook.worksheet_range(OUTPUT_SHEET_NAME).unwrap();
        assert!(
            matches!(range.get_value((1, 1)), Some(Data::DateTime(_))),
            "sanction_date cell {:?}",
            range.get_value((1, 1))
        );

        let back = import(&path, None).unwrap();
        assert_eq!(back.cell(0, 1), &Value::date(45382.0));
        assert_eq!(back.cell(0, 2), &Value::date(45382.5));
        assert_eq!(back.cell(0, 1).to_string(), "2024-03-31");
    }

    #[test]
    fn oversized_table_is_a_workbook_error() {
        let wide = Table::new((0..=MAX_COLS).map(|i| format!("c{i}")).collect());
        let err = export_to_buffer(&wide).unwrap_err();
        assert!(matches!(err, IoError::Workbook(_)), "{err}");
    }

    #[test]
    fn cell_mapping() {
        assert_eq!(cell_value(&Data::String(String::new())), Value::Empty);
        assert_eq!(cell_value(&Data::Int(42)), Value::number(42.0));
        assert_eq!(cell_value(&Data::Float(0.5)), Value::number(0.5));
        assert_eq!(
            cell_value(&Data::DateTimeIso("2024-03-31".into())),
            Value::text("2024-03-31")
        );
    }
}
