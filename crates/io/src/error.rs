use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("cannot read {}: {message}", path.display())]
    Read { path: PathBuf, message: String },
    #[error("cannot write {}: {message}", path.display())]
    Write { path: PathBuf, message: String },
    #[error("unsupported file type '{extension}' for {}", path.display())]
    Unsupported { path: PathBuf, extension: String },
    #[error("{}: no sheet named '{sheet}' (available: {})", path.display(), available.join(", "))]
    SheetNotFound {
        path: PathBuf,
        sheet: String,
        available: Vec<String>,
    },
    /// The workbook could not be built in memory.
    #[error("cannot build workbook: {0}")]
    Workbook(String),
    /// The file holds no non-empty row to use as a header.
    #[error("{}: no header row found", path.display())]
    NoHeader { path: PathBuf },
}

impl IoError {
    pub fn read(path: &std::path::Path, message: impl ToString) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    pub fn write(path: &std::path::Path, message: impl ToString) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }
}
