//! Data module - tab normalization and typed record extraction

mod loader;
mod processor;
mod records;

pub use loader::{TabFrame, SOURCE_ROW_COL};
pub use processor::{parse_date, parse_flag, parse_number, RecordProcessor};
pub use records::{trip_key, ExpenseRecord, FuelStopRecord, LoadRecord, SheetData};

use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("Tab '{tab}' is missing columns: {}", columns.join(", "))]
    MissingColumns { tab: String, columns: Vec<String> },
    #[error("Tab '{tab}' has duplicate column '{column}'")]
    DuplicateColumn { tab: String, column: String },
    #[error("Tab '{tab}' row {row}: column '{column}' has invalid {expected} value '{value}'")]
    InvalidValue {
        tab: String,
        row: u32,
        column: String,
        expected: &'static str,
        value: String,
    },
    #[error("Tab '{tab}' row {row}: column '{column}' is required")]
    MissingValue {
        tab: String,
        row: u32,
        column: String,
    },
}
