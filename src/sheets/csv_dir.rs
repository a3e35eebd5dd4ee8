//! CSV Directory Reader
//! Reads each tab from `<dir>/<TAB>.csv`.

use super::{Cell, RawTab, SheetError, SheetSource};
use csv::ReaderBuilder;
use std::path::{Path, PathBuf};

pub struct CsvDirSource {
    dir: PathBuf,
}

impl CsvDirSource {
    pub fn new(dir: &Path) -> Result<Self, SheetError> {
        if !dir.is_dir() {
            return Err(SheetError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("CSV directory not found: {}", dir.display()),
            )));
        }
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn tab_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.csv"))
    }
}

impl SheetSource for CsvDirSource {
    fn describe(&self) -> String {
        format!("CSV directory '{}'", self.dir.display())
    }

    fn read_tab(&mut self, name: &str) -> Result<RawTab, SheetError> {
        let path = self.tab_path(name);
        if !path.exists() {
            return Err(SheetError::TabNotFound(name.to_string()));
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)?;

        let mut grid = Vec::new();
        for record in reader.records() {
            let record = record?;
            grid.push(record.iter().map(Cell::from).collect());
        }

        Ok(RawTab::from_grid(name, grid))
    }
}
