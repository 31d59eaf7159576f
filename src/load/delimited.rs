// src/load/delimited.rs

use csv::ReaderBuilder;
use glob::glob;
use std::{fs::File, io::BufReader, path::Path};
use tracing::{debug, warn};

use super::cell::Cell;
use super::{Table, Workbook};
use crate::error::LoadError;

/// Read a single csv file; the table is named after the file stem.
pub(super) fn load_csv(path: &Path) -> Result<Table, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(|e| csv_err(csv::Error::from(e)))?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let mut grid = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(csv_err)?;
        grid.push(record.iter().map(Cell::from_text).collect::<Vec<_>>());
    }

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    debug!(table = %name, rows = grid.len(), "loaded csv");
    Ok(Table::from_grid(name, grid))
}

/// Read every `*.csv` in `dir` as one table per file, sorted by file name.
pub(super) fn load_csv_dir(dir: &Path) -> Result<Workbook, LoadError> {
    let pattern = format!("{}/*.csv", dir.display());
    let entries = glob(&pattern).map_err(|source| LoadError::Pattern {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(p) if p.is_file() => paths.push(p),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "skipping unreadable directory entry"),
        }
    }
    paths.sort();

    let tables = paths
        .iter()
        .map(|p| load_csv(p))
        .collect::<Result<Vec<_>, _>>()?;
    if tables.is_empty() {
        return Err(LoadError::EmptyWorkbook(dir.to_path_buf()));
    }

    Ok(Workbook {
        source: dir.to_path_buf(),
        tables,
    })
}
