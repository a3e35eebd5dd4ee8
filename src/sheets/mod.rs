//! Sheets module - spreadsheet tab readers

mod csv_dir;
mod google;
mod workbook;

pub use csv_dir::CsvDirSource;
pub use google::GoogleSheetsSource;
pub use workbook::{serial_to_date, WorkbookSource};

use crate::config::{SheetConfig, SourceKind, TabNames};
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Failed to open workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("Tab not found: '{0}'")]
    TabNotFound(String),
    #[error("Failed to read CSV tab: {0}")]
    Csv(#[from] csv::Error),
    #[error("Spreadsheet request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Spreadsheet '{0}' not found or not shared with this account")]
    SpreadsheetNotFound(String),
    #[error("Missing access token: environment variable {0} is not set")]
    MissingToken(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single spreadsheet cell as read from the source.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl Cell {
    /// Render the cell as text for tabular normalization.
    /// Blank text and empty cells both come back as `None`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) if s.trim().is_empty() => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(n.to_string())
                }
            }
            Cell::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
            Cell::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

/// One tab: a header row plus data rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTab {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTab {
    /// Build a tab from a grid whose first row is the header.
    pub fn from_grid(name: &str, mut grid: Vec<Vec<Cell>>) -> Self {
        if grid.is_empty() {
            return Self {
                name: name.to_string(),
                ..Default::default()
            };
        }

        let headers = grid
            .remove(0)
            .iter()
            .map(|c| c.as_text().map(|s| s.trim().to_string()).unwrap_or_default())
            .collect();

        Self {
            name: name.to_string(),
            headers,
            rows: grid,
        }
    }
}

/// The three tabs of one spreadsheet read.
#[derive(Debug, Clone, Default)]
pub struct RawSheets {
    pub loads: RawTab,
    pub fuel: RawTab,
    pub expenses: RawTab,
}

/// Read access to named spreadsheet tabs.
pub trait SheetSource {
    /// Human-readable description for log messages.
    fn describe(&self) -> String;

    fn read_tab(&mut self, name: &str) -> Result<RawTab, SheetError>;

    /// Read the loads, fuel and expenses tabs.
    fn read_all(&mut self, tabs: &TabNames) -> Result<RawSheets, SheetError> {
        log::info!("Reading spreadsheet {}", self.describe());
        let mut read = |name: &str| -> Result<RawTab, SheetError> {
            log::info!("  - Reading tab '{}'", name);
            let tab = self.read_tab(name)?;
            log::debug!("    {} rows, columns {:?}", tab.rows.len(), tab.headers);
            Ok(tab)
        };

        Ok(RawSheets {
            loads: read(&tabs.loads)?,
            fuel: read(&tabs.fuel)?,
            expenses: read(&tabs.expenses)?,
        })
    }
}

/// Open the source named by the sheet config.
pub fn open_source(config: &SheetConfig) -> Result<Box<dyn SheetSource>, SheetError> {
    match config.source {
        SourceKind::Workbook => Ok(Box::new(WorkbookSource::open(&config.path)?)),
        SourceKind::Csv => Ok(Box::new(CsvDirSource::new(&config.path)?)),
        SourceKind::Google => {
            let spreadsheet_id = config.spreadsheet_id.clone().unwrap_or_default();
            let token = std::env::var(&config.token_env)
                .map_err(|_| SheetError::MissingToken(config.token_env.clone()))?;
            Ok(Box::new(GoogleSheetsSource::new(spreadsheet_id, token)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_renders_as_none() {
        assert_eq!(Cell::Text("   ".into()).as_text(), None);
        assert_eq!(Cell::Empty.as_text(), None);
    }

    #[test]
    fn whole_numbers_render_without_decimal_point() {
        assert_eq!(Cell::Number(412.0).as_text().as_deref(), Some("412"));
        assert_eq!(Cell::Number(3.25).as_text().as_deref(), Some("3.25"));
    }

    #[test]
    fn from_grid_splits_header_row() {
        let tab = RawTab::from_grid(
            "FUEL",
            vec![
                vec![Cell::from(" Trip "), Cell::from("Gallons")],
                vec![Cell::from("2024-03-01 to Dallas"), Cell::Number(80.5)],
            ],
        );
        assert_eq!(tab.headers, vec!["Trip", "Gallons"]);
        assert_eq!(tab.rows.len(), 1);
    }
}
