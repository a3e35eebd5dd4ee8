//! Typed spreadsheet records

use chrono::NaiveDate;

/// Derive the trip identifier used to correlate tabs: `"<YYYY-MM-DD> to <dropoff>"`.
pub fn trip_key(load_date: NaiveDate, dropoff_location: &str) -> String {
    format!("{} to {}", load_date.format("%Y-%m-%d"), dropoff_location)
}

/// One row of the loads tab.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRecord {
    pub source_row: u32,
    pub load_date: NaiveDate,
    pub pickup_location: Option<String>,
    pub dropoff_location: String,
    pub total_miles: Option<f64>,
    pub revenue: Option<f64>,
    pub is_drop_and_hook: bool,
    pub wait_time_hours: Option<f64>,
    pub notes: Option<String>,
}

impl LoadRecord {
    pub fn trip_key(&self) -> String {
        trip_key(self.load_date, &self.dropoff_location)
    }
}

/// One row of the fuel tab.
#[derive(Debug, Clone, PartialEq)]
pub struct FuelStopRecord {
    pub source_row: u32,
    pub trip: Option<String>,
    pub stop_date: NaiveDate,
    pub gallons: Option<f64>,
    pub total_cost: Option<f64>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// One row of the expenses tab.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseRecord {
    pub source_row: u32,
    pub trip: Option<String>,
    pub expense_date: NaiveDate,
    pub category: Option<String>,
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

/// Everything one loader run inserts, in spreadsheet row order.
#[derive(Debug, Clone, Default)]
pub struct SheetData {
    pub loads: Vec<LoadRecord>,
    pub fuel_stops: Vec<FuelStopRecord>,
    pub expenses: Vec<ExpenseRecord>,
}
