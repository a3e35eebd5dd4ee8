//! CSV summary export: one row per trip.

use super::queries::TripProfit;
use super::ReportError;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const SUMMARY_FILE: &str = "trip_summary.csv";

const SUMMARY_COLUMNS: [&str; 10] = [
    "load_id",
    "load_date",
    "pickup_location",
    "dropoff_location",
    "total_miles",
    "revenue",
    "total_fuel_cost",
    "total_other_expenses",
    "net_profit",
    "profit_per_mile",
];

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    load_id: i64,
    load_date: String,
    pickup_location: &'a str,
    dropoff_location: &'a str,
    total_miles: Option<f64>,
    revenue: f64,
    total_fuel_cost: f64,
    total_other_expenses: f64,
    net_profit: f64,
    profit_per_mile: Option<String>,
}

impl<'a> From<&'a TripProfit> for SummaryRow<'a> {
    fn from(trip: &'a TripProfit) -> Self {
        Self {
            load_id: trip.load_id,
            load_date: trip.load_date.format("%Y-%m-%d").to_string(),
            pickup_location: trip.pickup_location.as_deref().unwrap_or(""),
            dropoff_location: &trip.dropoff_location,
            total_miles: trip.total_miles,
            revenue: trip.revenue,
            total_fuel_cost: trip.total_fuel_cost,
            total_other_expenses: trip.total_other_expenses,
            net_profit: trip.net_profit,
            profit_per_mile: trip.profit_per_mile().map(|v| format!("{v:.3}")),
        }
    }
}

/// Write the trip summary CSV, returning the path written.
pub fn write_trip_summary(trips: &[TripProfit], output_dir: &Path) -> Result<PathBuf, ReportError> {
    let path = output_dir.join(SUMMARY_FILE);
    let mut writer = csv::Writer::from_path(&path)?;
    // serialize only emits the header with the first row
    if trips.is_empty() {
        writer.write_record(SUMMARY_COLUMNS)?;
    }
    for trip in trips {
        writer.serialize(SummaryRow::from(trip))?;
    }
    writer.flush()?;
    log::info!("Wrote {} trips to {}", trips.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn summary_has_header_and_one_row_per_trip() {
        let dir = tempfile::tempdir().unwrap();
        let trips = vec![TripProfit {
            load_id: 7,
            load_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            pickup_location: Some("Memphis".into()),
            dropoff_location: "Dallas, TX".into(),
            total_miles: Some(450.0),
            revenue: 1800.0,
            total_fuel_cost: 420.0,
            total_other_expenses: 30.0,
            net_profit: 1350.0,
        }];

        let path = write_trip_summary(&trips, dir.path()).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "load_id,load_date,pickup_location,dropoff_location,total_miles,revenue,\
             total_fuel_cost,total_other_expenses,net_profit,profit_per_mile"
        );
        assert_eq!(
            lines[1],
            "7,2024-03-01,Memphis,\"Dallas, TX\",450.0,1800.0,420.0,30.0,1350.0,3.000"
        );
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn empty_summary_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_trip_summary(&[], dir.path()).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text.trim_end(), SUMMARY_COLUMNS.join(","));
    }
}
