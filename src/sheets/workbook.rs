//! Workbook Reader
//! Reads tabs from a local spreadsheet export (.xlsx, .xls, .ods) using calamine.

use super::{Cell, RawTab, SheetError, SheetSource};
use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::{Duration, NaiveDate};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Spreadsheet date serials count days from 1899-12-30.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

fn convert_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::from(s.as_str()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => serial_to_date(dt.as_f64())
            .map(Cell::Date)
            .unwrap_or(Cell::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => {
            log::debug!("Cell error {:?} read as empty", e);
            Cell::Empty
        }
    }
}

pub struct WorkbookSource {
    path: PathBuf,
    workbook: Sheets<BufReader<File>>,
}

impl WorkbookSource {
    pub fn open(path: &Path) -> Result<Self, SheetError> {
        if !path.exists() {
            return Err(SheetError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("workbook not found: {}", path.display()),
            )));
        }
        let workbook = open_workbook_auto(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            workbook,
        })
    }
}

impl SheetSource for WorkbookSource {
    fn describe(&self) -> String {
        format!("workbook '{}'", self.path.display())
    }

    fn read_tab(&mut self, name: &str) -> Result<RawTab, SheetError> {
        if !self.workbook.sheet_names().iter().any(|s| s == name) {
            return Err(SheetError::TabNotFound(name.to_string()));
        }

        let range = self.workbook.worksheet_range(name)?;
        let grid: Vec<Vec<Cell>> = range
            .rows()
            .map(|row| row.iter().map(convert_cell).collect())
            .collect();

        Ok(RawTab::from_grid(name, grid))
    }
}
