// File I/O operations

use std::path::Path;

use loanbook_recon::Table;

pub mod csv;
pub mod error;
pub mod xlsx;

pub use error::IoError;

/// Default name of the reconciled workbook.
pub const OUTPUT_FILE_NAME: &str = "Loan_Portfolio.xlsx";
/// Worksheet the reconciled portfolio is written to.
pub const OUTPUT_SHEET_NAME: &str = "Loan Portfolio";

/// How a file's contents are parsed, chosen from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Spreadsheet,
    Delimited,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(Self::Spreadsheet),
            "csv" | "tsv" | "txt" => Some(Self::Delimited),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Sheet to read from a spreadsheet; the first sheet when `None`.
    pub sheet: Option<String>,
    /// Field delimiter for delimited files; sniffed when `None` (tab for `.tsv`).
    pub delimiter: Option<u8>,
}

/// Load one input table, dispatching on the file extension.
pub fn load_table(path: &Path, options: &LoadOptions) -> Result<Table, IoError> {
    let kind = FileKind::from_path(path).ok_or_else(|| IoError::Unsupported {
        path: path.to_path_buf(),
        extension: path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default(),
    })?;

    match kind {
        FileKind::Spreadsheet => xlsx::import(path, options.sheet.as_deref()),
        FileKind::Delimited => {
            if let Some(sheet) = &options.sheet {
                log::warn!("ignoring sheet '{sheet}' for delimited file {}", path.display());
            }
            let is_tsv = path
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case("tsv"));
            let delimiter = options.delimiter.or(is_tsv.then_some(b'\t'));
            csv::import(path, delimiter)
        }
    }
}

/// Write the reconciled portfolio workbook.
pub fn export_xlsx(table: &Table, path: &Path) -> Result<xlsx::ExportResult, IoError> {
    xlsx::export(table, path)
}
