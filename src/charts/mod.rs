//! Charts module - PNG rendering of the report views

mod renderer;

pub use renderer::{
    pie_slices, value_range, BarSeries, StaticChartRenderer, EXPENSE_BREAKDOWN_FILE,
    MONTHLY_EXPENSES_FILE, PALETTE, ROUTE_PERFORMANCE_FILE, TRIP_PROFITABILITY_FILE,
};

use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to draw chart: {0}")]
    Draw(String),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for ChartError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        ChartError::Draw(err.to_string())
    }
}
