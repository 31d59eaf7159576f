// src/load/mod.rs

pub mod cell;
mod delimited;
mod excel;

use anyhow::{Context, Result};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use tracing::{info, instrument};

use crate::config::Config;
use crate::error::LoadError;
pub use cell::Cell;

static EMPTY: Cell = Cell::Empty;

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// One named table: a header row plus data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    /// Column names, deduplicated (`X`, `X.1`, ...) so every header is addressable.
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table from a raw grid whose first row is the header.
    /// Fully blank rows are dropped; blank headers become `Unnamed: <idx>`.
    pub fn from_grid(name: impl Into<String>, grid: Vec<Vec<Cell>>) -> Self {
        let mut grid = grid.into_iter();
        let raw_headers = grid.next().unwrap_or_default();

        let mut seen: HashMap<String, usize> = HashMap::new();
        let headers = raw_headers
            .iter()
            .enumerate()
            .map(|(idx, cell)| {
                let base = cell
                    .as_text()
                    .unwrap_or_else(|| format!("Unnamed: {}", idx));
                let count = seen.entry(base.clone()).or_insert(0);
                let header = if *count == 0 {
                    base
                } else {
                    format!("{}.{}", base, count)
                };
                *count += 1;
                header
            })
            .collect();

        let rows = grid
            .filter(|row| row.iter().any(|c| !c.is_empty()))
            .collect();

        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Exact header lookup.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Header lookup ignoring surrounding whitespace and case.
    pub fn column_index_loose(&self, name: &str) -> Option<usize> {
        let wanted = name.trim();
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(wanted))
    }

    /// Loose lookup that fails with a `LoadError` naming the file and column.
    pub fn require_column(&self, name: &str, source: &Path) -> Result<usize, LoadError> {
        self.column_index(name)
            .or_else(|| self.column_index_loose(name))
            .ok_or_else(|| LoadError::MissingColumn {
                path: source.to_path_buf(),
                table: self.name.clone(),
                column: name.to_string(),
            })
    }

    /// Cell at `row`/`col`; short rows read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }
}

/// Every table of one input file (sheets of a workbook, or files of a directory).
#[derive(Debug, Clone, PartialEq)]
pub struct Workbook {
    pub source: PathBuf,
    pub tables: Vec<Table>,
}

impl Workbook {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    /// First table, the way a single-sheet read picks sheet 0.
    pub fn into_first_table(self) -> Result<Table, LoadError> {
        let source = self.source;
        self.tables
            .into_iter()
            .next()
            .ok_or(LoadError::EmptyWorkbook(source))
    }
}

/// Load every table in `path`: a spreadsheet, a single csv, or a directory of csv files.
#[instrument(level = "debug", skip(path), fields(path = %path.display()))]
pub fn load_workbook(path: &Path) -> Result<Workbook, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    if path.is_dir() {
        return delimited::load_csv_dir(path);
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
        excel::load_spreadsheet(path)
    } else if ext == "csv" {
        let table = delimited::load_csv(path)?;
        Ok(Workbook {
            source: path.to_path_buf(),
            tables: vec![table],
        })
    } else {
        Err(LoadError::Unsupported(path.to_path_buf()))
    }
}

/// Load only the first table of `path`.
pub fn load_table(path: &Path) -> Result<Table, LoadError> {
    load_workbook(path)?.into_first_table()
}

/// The three inputs of a run, loaded once and handed to each stage.
#[derive(Debug, Clone)]
pub struct Datasets {
    pub mapping: Table,
    pub mapping_path: PathBuf,
    pub responses: Table,
    pub responses_path: PathBuf,
    pub recommendations: Workbook,
}

/// Read the mapping, response and recommendation inputs named by `config`.
#[instrument(level = "info", skip(config))]
pub fn load_datasets(config: &Config) -> Result<Datasets> {
    let mapping_path = config.mapping_path();
    let responses_path = config.response_path();
    let recommendation_path = config.recommendation_path();

    let mapping = load_table(&mapping_path)
        .with_context(|| format!("loading mapping file {}", mapping_path.display()))?;
    info!(rows = mapping.rows.len(), path = %mapping_path.display(), "loaded mapping");

    let responses = load_table(&responses_path)
        .with_context(|| format!("loading response file {}", responses_path.display()))?;
    info!(
        rows = responses.rows.len(),
        columns = responses.headers.len(),
        path = %responses_path.display(),
        "loaded responses"
    );

    let recommendations = load_workbook(&recommendation_path).with_context(|| {
        format!(
            "loading recommendation file {}",
            recommendation_path.display()
        )
    })?;
    info!(
        tables = recommendations.tables.len(),
        path = %recommendation_path.display(),
        "loaded recommendations"
    );

    Ok(Datasets {
        mapping,
        mapping_path,
        responses,
        responses_path,
        recommendations,
    })
}
