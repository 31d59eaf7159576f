// src/load/excel.rs

use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::{debug, trace};

use super::cell::{excel_serial_to_datetime, parse_timestamp, Cell};
use super::{Table, Workbook};
use crate::error::LoadError;

/// Read every sheet of a spreadsheet into memory.
/// The workbook handle is dropped before returning.
pub(super) fn load_spreadsheet(path: &Path) -> Result<Workbook, LoadError> {
    let spreadsheet_err = |source| LoadError::Spreadsheet {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = open_workbook_auto(path).map_err(spreadsheet_err)?;
    let sheet_names = workbook.sheet_names().to_vec();

    let mut tables = Vec::with_capacity(sheet_names.len());
    for name in sheet_names {
        let range = workbook.worksheet_range(&name).map_err(spreadsheet_err)?;
        let grid: Vec<Vec<Cell>> = range
            .rows()
            .map(|row| row.iter().map(cell_from_data).collect())
            .collect();
        trace!(sheet = %name, rows = grid.len(), "read sheet");
        tables.push(Table::from_grid(name, grid));
    }
    drop(workbook);

    debug!(sheets = tables.len(), "loaded spreadsheet");
    Ok(Workbook {
        source: path.to_path_buf(),
        tables,
    })
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::from_text(s),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            excel_serial_to_datetime(serial)
                .map(Cell::DateTime)
                .unwrap_or(Cell::Number(serial))
        }
        Data::DateTimeIso(s) => parse_timestamp(s)
            .map(Cell::DateTime)
            .unwrap_or_else(|| Cell::from_text(s)),
        Data::DurationIso(s) => Cell::from_text(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn converts_calamine_values() {
        assert_eq!(cell_from_data(&Data::Empty), Cell::Empty);
        assert_eq!(cell_from_data(&Data::Int(4)), Cell::Number(4.0));
        assert_eq!(
            cell_from_data(&Data::String("  3 - Defined ".into())),
            Cell::Text("3 - Defined".into())
        );
        assert_eq!(cell_from_data(&Data::String("   ".into())), Cell::Empty);

        let want = NaiveDate::from_ymd_opt(2024, 5, 14)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(
            cell_from_data(&Data::DateTimeIso("2024-05-14T10:00:00".into())),
            Cell::DateTime(want)
        );
    }

    #[test]
    fn unreadable_spreadsheet_names_the_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a zip archive")?;

        let err = load_spreadsheet(&path).unwrap_err();
        assert!(matches!(err, LoadError::Spreadsheet { .. }));
        assert!(err.to_string().contains("broken.xlsx"));
        Ok(())
    }
}
