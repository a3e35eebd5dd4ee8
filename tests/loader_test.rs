//! Loader integration tests against an in-memory store.

use chrono::NaiveDate;
use haulbook::data::{ExpenseRecord, FuelStopRecord, LoadRecord, SheetData};
use haulbook::db::{self, load_all, SkipKind};
use rusqlite::Connection;

const SCHEMA: &str = include_str!("../sql/schema.sql");

fn store() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
    db::apply_schema(&conn, SCHEMA).unwrap();
    conn
}

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

fn load(row: u32, d: NaiveDate, dropoff: &str, revenue: f64) -> LoadRecord {
    LoadRecord {
        source_row: row,
        load_date: d,
        pickup_location: Some("Memphis".into()),
        dropoff_location: dropoff.into(),
        total_miles: Some(450.0),
        revenue: Some(revenue),
        is_drop_and_hook: false,
        wait_time_hours: None,
        notes: None,
    }
}

fn fuel(row: u32, trip: Option<&str>, cost: f64) -> FuelStopRecord {
    FuelStopRecord {
        source_row: row,
        trip: trip.map(str::to_string),
        stop_date: date(3, 1),
        gallons: Some(100.0),
        total_cost: Some(cost),
        location: None,
        notes: None,
    }
}

fn expense(row: u32, trip: Option<&str>, amount: Option<f64>) -> ExpenseRecord {
    ExpenseRecord {
        source_row: row,
        trip: trip.map(str::to_string),
        expense_date: date(3, 1),
        category: Some("Food".into()),
        amount,
        description: Some("Lunch".into()),
        notes: None,
    }
}

fn sample() -> SheetData {
    SheetData {
        loads: vec![
            load(2, date(3, 1), "Dallas, TX", 1800.0),
            load(3, date(3, 4), "Tulsa, OK", 900.0),
        ],
        fuel_stops: vec![
            fuel(2, Some("2024-03-01 to Dallas, TX"), 420.0),
            fuel(3, Some("2024-03-04 to Tulsa, OK"), 310.0),
        ],
        expenses: vec![expense(2, Some("2024-03-04 to Tulsa, OK"), Some(25.5))],
    }
}

fn load_id_for(conn: &Connection, dropoff: &str) -> i64 {
    conn.query_row(
        "SELECT load_id FROM loads WHERE dropoff_location = ?1",
        [dropoff],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn dependent_rows_reference_matching_load() {
    let mut conn = store();
    let summary = load_all(&mut conn, &sample()).unwrap();

    assert_eq!(summary.loads_inserted, 2);
    assert_eq!(summary.fuel_stops_inserted, 2);
    assert_eq!(summary.expenses_inserted, 1);
    assert!(summary.skipped.is_empty());

    let tulsa = load_id_for(&conn, "Tulsa, OK");
    let fuel_load: i64 = conn
        .query_row(
            "SELECT load_id FROM fuel_stops WHERE total_cost = 310.0",
            [],
            |row| row.get(0),
        )
        .unwrap();
    let expense_load: i64 = conn
        .query_row("SELECT load_id FROM expenses", [], |row| row.get(0))
        .unwrap();
    assert_eq!(fuel_load, tulsa);
    assert_eq!(expense_load, tulsa);
}

#[test]
fn unmatched_rows_are_skipped_and_reported() {
    let mut conn = store();
    let mut data = sample();
    data.fuel_stops.push(fuel(4, Some("2024-03-01 to Dallas"), 50.0));
    data.expenses.push(expense(3, None, Some(12.0)));
    data.expenses.push(expense(4, Some(" 2024-03-04 to Tulsa, OK"), Some(8.0)));

    let summary = load_all(&mut conn, &data).unwrap();

    assert_eq!(summary.fuel_stops_inserted, 2);
    assert_eq!(summary.expenses_inserted, 1);
    assert_eq!(summary.skipped_count(SkipKind::FuelStop), 1);
    assert_eq!(summary.skipped_count(SkipKind::Expense), 2);
    assert_eq!(summary.skipped[0].source_row, 4);
    assert_eq!(summary.skipped[0].trip.as_deref(), Some("2024-03-01 to Dallas"));
    assert_eq!(db::count_rows(&conn, "fuel_stops").unwrap(), 2);
    assert_eq!(db::count_rows(&conn, "expenses").unwrap(), 1);
}

#[test]
fn duplicate_trip_key_attaches_to_last_load() {
    let mut conn = store();
    let data = SheetData {
        loads: vec![
            load(2, date(3, 1), "Dallas", 1000.0),
            load(3, date(3, 1), "Dallas", 1200.0),
        ],
        fuel_stops: vec![fuel(2, Some("2024-03-01 to Dallas"), 200.0)],
        expenses: vec![],
    };

    let summary = load_all(&mut conn, &data).unwrap();
    assert_eq!(summary.loads_inserted, 2);
    assert_eq!(summary.trips_mapped, 1);
    assert_eq!(summary.ambiguous_trips, vec!["2024-03-01 to Dallas".to_string()]);

    let last: i64 = conn
        .query_row("SELECT load_id FROM loads WHERE revenue = 1200.0", [], |row| {
            row.get(0)
        })
        .unwrap();
    let fuel_load: i64 = conn
        .query_row("SELECT load_id FROM fuel_stops", [], |row| row.get(0))
        .unwrap();
    assert_eq!(fuel_load, last);
}

#[test]
fn reload_replaces_previous_rows_and_restarts_ids() {
    let mut conn = store();
    load_all(&mut conn, &sample()).unwrap();
    load_all(&mut conn, &sample()).unwrap();

    assert_eq!(db::count_rows(&conn, "loads").unwrap(), 2);
    assert_eq!(db::count_rows(&conn, "fuel_stops").unwrap(), 2);
    assert_eq!(load_id_for(&conn, "Dallas, TX"), 1);
    assert_eq!(db::count_rows(&conn, "load_runs").unwrap(), 2);
}

#[test]
fn failed_run_rolls_back_and_keeps_previous_data() {
    let mut conn = store();
    let first = load_all(&mut conn, &sample()).unwrap();

    let mut bad = SheetData {
        loads: vec![load(2, date(4, 2), "Reno", 2500.0)],
        fuel_stops: vec![fuel(2, Some("2024-04-02 to Reno"), 600.0)],
        expenses: vec![],
    };
    // amount is NOT NULL in the store
    bad.expenses.push(expense(2, Some("2024-04-02 to Reno"), None));

    let err = load_all(&mut conn, &bad).unwrap_err();
    assert!(
        err.to_string().contains("NOT NULL constraint failed: expenses.amount"),
        "{err}"
    );

    assert_eq!(db::count_rows(&conn, "loads").unwrap(), 2);
    assert_eq!(db::count_rows(&conn, "fuel_stops").unwrap(), 2);
    assert_eq!(db::count_rows(&conn, "expenses").unwrap(), 1);
    assert_eq!(db::count_rows(&conn, "load_runs").unwrap(), 1);
    let reno: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM loads WHERE dropoff_location = 'Reno'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(reno, 0);
    assert_eq!(load_id_for(&conn, "Dallas, TX"), 1);
    assert_eq!(first.run_id, 1);
}

#[test]
fn run_is_recorded_with_counts() {
    let mut conn = store();
    let mut data = sample();
    data.expenses.push(expense(3, Some("nowhere"), Some(5.0)));
    let summary = load_all(&mut conn, &data).unwrap();

    let (loads, fuel_skipped, expenses_inserted, expenses_skipped): (i64, i64, i64, i64) = conn
        .query_row(
            "SELECT loads_inserted, fuel_stops_skipped, expenses_inserted, expenses_skipped \
             FROM load_runs WHERE run_id = ?1",
            [summary.run_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .unwrap();
    assert_eq!((loads, fuel_skipped, expenses_inserted, expenses_skipped), (2, 0, 1, 1));
}

#[test]
fn dependent_rows_without_loads_are_all_skipped() {
    let mut conn = store();
    let data = SheetData {
        loads: vec![],
        ..sample()
    };

    let summary = load_all(&mut conn, &data).unwrap();
    assert_eq!(summary.trips_mapped, 0);
    assert_eq!(summary.fuel_stops_inserted + summary.expenses_inserted, 0);
    assert_eq!(summary.skipped.len(), 3);
}
