//! Report module - analysis queries, aggregation, insights and exports

mod aggregate;
mod export;
mod insights;
mod queries;

pub use aggregate::{
    aggregate, category_totals, compute_profit_stats, month_totals, routes_by_profit,
    Aggregates, CategoryTotal, MonthTotal, ProfitStats,
};
pub use export::{write_trip_summary, SUMMARY_FILE};
pub use insights::{write_insights, FOOD_CATEGORY, MAINTENANCE_CATEGORY};
pub use queries::{
    load_queries, run_queries, split_queries, ExpenseDetail, MonthlyExpense, ReportData,
    RouteStats, TripProfit, REQUIRED_QUERIES,
};

use crate::charts::{ChartError, StaticChartRenderer};
use crate::config::ReportConfig;
use polars::prelude::PolarsError;
use rusqlite::Connection;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to read query file '{path}': {source}")]
    QueryFile {
        path: String,
        source: std::io::Error,
    },
    #[error("Query file must contain at least {REQUIRED_QUERIES} queries, found {0}")]
    TooFewQueries(usize),
    #[error("Query {index} failed: {source}")]
    Query {
        index: usize,
        source: rusqlite::Error,
    },
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("Chart error: {0}")]
    Chart(#[from] ChartError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Files written by one report run.
#[derive(Debug, Clone)]
pub struct ReportOutput {
    pub charts: Vec<PathBuf>,
    pub summary: PathBuf,
}

/// Run the queries, aggregate, render charts, write the summary CSV and
/// print insights to `out`.
pub fn run_report<W: Write>(
    conn: &Connection,
    config: &ReportConfig,
    out: &mut W,
) -> Result<ReportOutput, ReportError> {
    let queries = load_queries(&config.queries)?;
    let data = run_queries(conn, &queries)?;
    let aggregates = aggregate(&data.trips, &data.monthly_expenses, &data.routes)?;

    std::fs::create_dir_all(&config.output_dir)?;

    let renderer = StaticChartRenderer::new(config.chart_width, config.chart_height);
    let charts = renderer.render_all(&data, &aggregates, &config.output_dir)?;
    let summary = write_trip_summary(&data.trips, &config.output_dir)?;

    write_insights(out, &data, &aggregates)?;

    Ok(ReportOutput { charts, summary })
}
