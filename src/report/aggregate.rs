//! Aggregation Module
//! Category totals, route ordering and net profit statistics over query results.

use super::queries::{MonthlyExpense, RouteStats, TripProfit};
use super::ReportError;
use polars::prelude::*;
use statrs::statistics::{Data, Median, Statistics};

/// Descriptive statistics of net profit across trips.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfitStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub p95: f64,
    pub p05: f64,
}

impl Default for ProfitStats {
    fn default() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            std: f64::NAN,
            p95: f64::NAN,
            p05: f64::NAN,
        }
    }
}

/// Total spend for one expense category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub total_spent: f64,
}

/// Total spend for one month, all categories.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthTotal {
    pub month: String,
    pub total_spent: f64,
}

/// Derived views the charts and console summary are drawn from.
#[derive(Debug, Clone, Default)]
pub struct Aggregates {
    pub category_totals: Vec<CategoryTotal>,
    pub month_totals: Vec<MonthTotal>,
    pub routes_by_profit: Vec<RouteStats>,
    pub profit_stats: ProfitStats,
}

/// Calculate percentile using linear interpolation (NumPy compatible).
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    let n = sorted_values.len();
    if n == 0 {
        return f64::NAN;
    }
    if n == 1 {
        return sorted_values[0];
    }

    let rank = (p / 100.0) * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = (rank.ceil() as usize).min(n - 1);
    let frac = rank - lower as f64;

    if lower == upper {
        sorted_values[lower]
    } else {
        sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
    }
}

/// Compute descriptive statistics for an array of values.
pub fn compute_profit_stats(values: &[f64]) -> ProfitStats {
    let values: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    let n = values.len();
    if n == 0 {
        return ProfitStats::default();
    }

    let mut sorted = values.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    // sample std dev; a single trip has no spread
    let std = if n > 1 { values.iter().std_dev() } else { 0.0 };

    ProfitStats {
        count: n,
        mean: values.iter().mean(),
        median: Data::new(values).median(),
        std,
        p95: percentile(&sorted, 95.0),
        p05: percentile(&sorted, 5.0),
    }
}

fn string_values(df: &DataFrame, column: &str) -> Result<Vec<String>, ReportError> {
    Ok(df
        .column(column)?
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect())
}

fn f64_values(df: &DataFrame, column: &str) -> Result<Vec<f64>, ReportError> {
    Ok(df
        .column(column)?
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect())
}

/// Sum spending per category across all months, largest first.
pub fn category_totals(expenses: &[MonthlyExpense]) -> Result<Vec<CategoryTotal>, ReportError> {
    if expenses.is_empty() {
        return Ok(Vec::new());
    }

    let df = df!(
        "category" => expenses.iter().map(|e| e.category.as_str()).collect::<Vec<_>>(),
        "total_spent" => expenses.iter().map(|e| e.total_spent).collect::<Vec<_>>(),
    )?;

    let out = df
        .lazy()
        .group_by([col("category")])
        .agg([col("total_spent").sum()])
        .sort(
            ["total_spent", "category"],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        )
        .collect()?;

    let categories = string_values(&out, "category")?;
    let totals = f64_values(&out, "total_spent")?;

    Ok(categories
        .into_iter()
        .zip(totals)
        .map(|(category, total_spent)| CategoryTotal {
            category,
            total_spent,
        })
        .collect())
}

/// Sum spending per month, oldest first.
pub fn month_totals(expenses: &[MonthlyExpense]) -> Result<Vec<MonthTotal>, ReportError> {
    if expenses.is_empty() {
        return Ok(Vec::new());
    }

    let df = df!(
        "month" => expenses.iter().map(|e| e.month.as_str()).collect::<Vec<_>>(),
        "total_spent" => expenses.iter().map(|e| e.total_spent).collect::<Vec<_>>(),
    )?;

    let out = df
        .lazy()
        .group_by([col("month")])
        .agg([col("total_spent").sum()])
        .sort(["month"], SortMultipleOptions::default())
        .collect()?;

    let months = string_values(&out, "month")?;
    let totals = f64_values(&out, "total_spent")?;

    Ok(months
        .into_iter()
        .zip(totals)
        .map(|(month, total_spent)| MonthTotal { month, total_spent })
        .collect())
}

/// Routes ordered by average profit per mile, best first; routes without
/// mileage go last.
pub fn routes_by_profit(routes: &[RouteStats]) -> Result<Vec<RouteStats>, ReportError> {
    if routes.is_empty() {
        return Ok(Vec::new());
    }

    let df = df!(
        "idx" => (0..routes.len() as u32).collect::<Vec<_>>(),
        "avg_profit_per_mile" => routes.iter().map(|r| r.avg_profit_per_mile).collect::<Vec<_>>(),
    )?;

    let out = df
        .lazy()
        .sort(
            ["avg_profit_per_mile"],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_nulls_last(true)
                .with_maintain_order(true),
        )
        .collect()?;

    let order = out.column("idx")?.u32()?;
    Ok(order
        .into_iter()
        .flatten()
        .map(|i| routes[i as usize].clone())
        .collect())
}

/// Build every aggregate the reporter needs.
pub fn aggregate(
    trips: &[TripProfit],
    monthly: &[MonthlyExpense],
    routes: &[RouteStats],
) -> Result<Aggregates, ReportError> {
    let net: Vec<f64> = trips.iter().map(|t| t.net_profit).collect();
    Ok(Aggregates {
        category_totals: category_totals(monthly)?,
        month_totals: month_totals(monthly)?,
        routes_by_profit: routes_by_profit(routes)?,
        profit_stats: compute_profit_stats(&net),
    })
}
