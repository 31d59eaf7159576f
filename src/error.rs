// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Structural failures while reading an input dataset.
///
/// Anything in here is fatal for a run; per-row problems never end up as a `LoadError`.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported file type: {} (expected xlsx, xlsm, xlsb, xls, ods, csv or a directory of csv files)", .0.display())]
    Unsupported(PathBuf),

    #[error("could not read spreadsheet {}: {source}", path.display())]
    Spreadsheet {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("could not read csv {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("could not list {}: {source}", path.display())]
    Pattern {
        path: PathBuf,
        #[source]
        source: glob::PatternError,
    },

    #[error("{} contains no tables", .0.display())]
    EmptyWorkbook(PathBuf),

    #[error("{} (table `{table}`) has no `{column}` column", path.display())]
    MissingColumn {
        path: PathBuf,
        table: String,
        column: String,
    },
}
