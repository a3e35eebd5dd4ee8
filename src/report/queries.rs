//! Analysis Queries Module
//! Loads the query file and maps result rows by column name.

use super::ReportError;
use chrono::NaiveDate;
use rusqlite::{Connection, Row};
use std::path::Path;

/// Number of queries the reporter runs, in file order.
pub const REQUIRED_QUERIES: usize = 4;

/// Net result of one load after fuel and other expenses.
#[derive(Debug, Clone, PartialEq)]
pub struct TripProfit {
    pub load_id: i64,
    pub load_date: NaiveDate,
    pub pickup_location: Option<String>,
    pub dropoff_location: String,
    pub total_miles: Option<f64>,
    pub revenue: f64,
    pub total_fuel_cost: f64,
    pub total_other_expenses: f64,
    pub net_profit: f64,
}

impl TripProfit {
    pub fn total_costs(&self) -> f64 {
        self.total_fuel_cost + self.total_other_expenses
    }

    pub fn profit_per_mile(&self) -> Option<f64> {
        self.total_miles
            .filter(|m| *m > 0.0)
            .map(|m| self.net_profit / m)
    }

    /// Chart label: `"<dropoff> (MM-DD)"`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.dropoff_location, self.load_date.format("%m-%d"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyExpense {
    pub month: String,
    pub category: String,
    pub total_spent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteStats {
    pub dropoff_location: String,
    pub trip_count: i64,
    pub total_miles: f64,
    pub avg_profit_per_mile: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDetail {
    pub load_id: i64,
    pub load_date: NaiveDate,
    pub dropoff_location: String,
    pub expense_date: NaiveDate,
    pub category: String,
    pub amount: f64,
    pub description: Option<String>,
}

/// Results of the four analysis queries.
#[derive(Debug, Clone, Default)]
pub struct ReportData {
    pub trips: Vec<TripProfit>,
    pub monthly_expenses: Vec<MonthlyExpense>,
    pub routes: Vec<RouteStats>,
    pub expense_details: Vec<ExpenseDetail>,
}

/// Split query text on `;`, dropping blank and comment-only fragments.
pub fn split_queries(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(str::trim)
        .filter(|q| {
            q.lines()
                .map(str::trim)
                .any(|line| !line.is_empty() && !line.starts_with("--"))
        })
        .map(str::to_string)
        .collect()
}

/// Read and split the query file; fewer than four queries is an error.
pub fn load_queries(path: &Path) -> Result<Vec<String>, ReportError> {
    log::info!("Loading queries from '{}'", path.display());
    let text = std::fs::read_to_string(path).map_err(|source| ReportError::QueryFile {
        path: path.display().to_string(),
        source,
    })?;

    let queries = split_queries(&text);
    if queries.len() < REQUIRED_QUERIES {
        return Err(ReportError::TooFewQueries(queries.len()));
    }
    if queries.len() > REQUIRED_QUERIES {
        log::warn!(
            "Query file has {} queries; only the first {} are used",
            queries.len(),
            REQUIRED_QUERIES
        );
    }
    Ok(queries)
}

fn run<T, F>(conn: &Connection, index: usize, sql: &str, map: F) -> Result<Vec<T>, ReportError>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    log::debug!("Running query {}", index + 1);
    let query_err = |source: rusqlite::Error| ReportError::Query {
        index: index + 1,
        source,
    };

    let mut stmt = conn.prepare(sql).map_err(query_err)?;
    let rows = stmt
        .query_map([], map)
        .map_err(query_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(query_err)?;
    Ok(rows)
}

fn trip_from_row(row: &Row<'_>) -> rusqlite::Result<TripProfit> {
    Ok(TripProfit {
        load_id: row.get("load_id")?,
        load_date: row.get("load_date")?,
        pickup_location: row.get("pickup_location")?,
        dropoff_location: row.get("dropoff_location")?,
        total_miles: row.get("total_miles")?,
        revenue: row.get("revenue")?,
        total_fuel_cost: row.get("total_fuel_cost")?,
        total_other_expenses: row.get("total_other_expenses")?,
        net_profit: row.get("net_profit")?,
    })
}

fn monthly_from_row(row: &Row<'_>) -> rusqlite::Result<MonthlyExpense> {
    Ok(MonthlyExpense {
        month: row.get("month")?,
        category: row.get("category")?,
        total_spent: row.get("total_spent")?,
    })
}

fn route_from_row(row: &Row<'_>) -> rusqlite::Result<RouteStats> {
    Ok(RouteStats {
        dropoff_location: row.get("dropoff_location")?,
        trip_count: row.get("trip_count")?,
        total_miles: row.get("total_miles")?,
        avg_profit_per_mile: row.get("avg_profit_per_mile")?,
    })
}

fn detail_from_row(row: &Row<'_>) -> rusqlite::Result<ExpenseDetail> {
    Ok(ExpenseDetail {
        load_id: row.get("load_id")?,
        load_date: row.get("load_date")?,
        dropoff_location: row.get("dropoff_location")?,
        expense_date: row.get("expense_date")?,
        category: row.get("category")?,
        amount: row.get("amount")?,
        description: row.get("description")?,
    })
}

/// Run the four analysis queries in file order.
pub fn run_queries(conn: &Connection, queries: &[String]) -> Result<ReportData, ReportError> {
    if queries.len() < REQUIRED_QUERIES {
        return Err(ReportError::TooFewQueries(queries.len()));
    }

    let data = ReportData {
        trips: run(conn, 0, &queries[0], trip_from_row)?,
        monthly_expenses: run(conn, 1, &queries[1], monthly_from_row)?,
        routes: run(conn, 2, &queries[2], route_from_row)?,
        expense_details: run(conn, 3, &queries[3], detail_from_row)?,
    };

    log::info!(
        "Queries returned {} trips, {} monthly expense rows, {} routes, {} expense details",
        data.trips.len(),
        data.monthly_expenses.len(),
        data.routes.len(),
        data.expense_details.len()
    );
    Ok(data)
}
