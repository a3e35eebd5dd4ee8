//! Transactional Loader
//! Clears the store and reloads it from spreadsheet records in one transaction,
//! reconciling fuel stops and expenses to loads through their trip identifier.

use super::StoreError;
use crate::data::{ExpenseRecord, FuelStopRecord, LoadRecord, SheetData};
use rusqlite::{params, Connection, Transaction};
use std::collections::HashMap;

/// Trip identifier -> database load id, filled while loads are inserted.
///
/// Keys are not unique by construction: a later load with the same date and
/// dropoff replaces the earlier mapping.
#[derive(Debug, Default)]
pub struct TripMap {
    ids: HashMap<String, i64>,
    ambiguous: Vec<String>,
}

impl TripMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a trip key to a load id, returning the id it replaced, if any.
    pub fn record(&mut self, key: String, load_id: i64) -> Option<i64> {
        let previous = self.ids.insert(key.clone(), load_id);
        if let Some(previous) = previous {
            log::warn!(
                "Trip '{}' matches more than one load (ids {} and {}); dependent rows will attach to {}",
                key,
                previous,
                load_id,
                load_id
            );
            if !self.ambiguous.contains(&key) {
                self.ambiguous.push(key);
            }
        }
        previous
    }

    /// Exact-match lookup. A missing trip never matches.
    pub fn resolve(&self, trip: Option<&str>) -> Option<i64> {
        trip.and_then(|t| self.ids.get(t).copied())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Keys that were recorded more than once.
    pub fn ambiguous_keys(&self) -> &[String] {
        &self.ambiguous
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipKind {
    FuelStop,
    Expense,
}

impl std::fmt::Display for SkipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipKind::FuelStop => write!(f, "fuel stop"),
            SkipKind::Expense => write!(f, "expense"),
        }
    }
}

/// A dependent row dropped because its trip matched no load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub kind: SkipKind,
    pub source_row: u32,
    pub trip: Option<String>,
}

/// Outcome of a committed loader run.
#[derive(Debug, Clone, Default)]
pub struct LoadSummary {
    pub run_id: i64,
    pub loads_inserted: usize,
    pub trips_mapped: usize,
    pub fuel_stops_inserted: usize,
    pub expenses_inserted: usize,
    pub skipped: Vec<SkippedRow>,
    pub ambiguous_trips: Vec<String>,
}

impl LoadSummary {
    pub fn skipped_count(&self, kind: SkipKind) -> usize {
        self.skipped.iter().filter(|s| s.kind == kind).count()
    }
}

fn clear_tables(tx: &Transaction) -> Result<(), StoreError> {
    log::info!("Clearing existing data from loads, fuel_stops, expenses");
    tx.execute_batch(
        "DELETE FROM expenses;
         DELETE FROM fuel_stops;
         DELETE FROM loads;
         DELETE FROM sqlite_sequence WHERE name IN ('loads', 'fuel_stops', 'expenses');",
    )?;
    Ok(())
}

fn insert_loads(
    tx: &Transaction,
    loads: &[LoadRecord],
    trips: &mut TripMap,
) -> Result<usize, StoreError> {
    log::info!("  - Inserting loads and building trip map...");
    let mut stmt = tx.prepare_cached(
        "INSERT INTO loads (load_date, pickup_location, dropoff_location, total_miles, revenue, \
         is_drop_and_hook, wait_time_hours, notes) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) RETURNING load_id",
    )?;

    for load in loads {
        let load_id: i64 = stmt.query_row(
            params![
                load.load_date,
                load.pickup_location,
                load.dropoff_location,
                load.total_miles,
                load.revenue,
                load.is_drop_and_hook,
                load.wait_time_hours,
                load.notes,
            ],
            |row| row.get(0),
        )?;
        trips.record(load.trip_key(), load_id);
    }

    log::info!("    {} loads inserted, {} trips mapped", loads.len(), trips.len());
    Ok(loads.len())
}

fn warn_skip(kind: SkipKind, source_row: u32, trip: Option<&str>) -> SkippedRow {
    log::warn!(
        "Skipping {} (row {}): no matching trip for '{}'",
        kind,
        source_row,
        trip.unwrap_or("")
    );
    SkippedRow {
        kind,
        source_row,
        trip: trip.map(str::to_string),
    }
}

fn insert_fuel_stops(
    tx: &Transaction,
    fuel_stops: &[FuelStopRecord],
    trips: &TripMap,
    skipped: &mut Vec<SkippedRow>,
) -> Result<usize, StoreError> {
    log::info!("  - Inserting fuel stops...");
    let mut stmt = tx.prepare_cached(
        "INSERT INTO fuel_stops (load_id, stop_date, gallons, total_cost, location, notes) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;

    let mut inserted = 0;
    for stop in fuel_stops {
        match trips.resolve(stop.trip.as_deref()) {
            Some(load_id) => {
                stmt.execute(params![
                    load_id,
                    stop.stop_date,
                    stop.gallons,
                    stop.total_cost,
                    stop.location,
                    stop.notes,
                ])?;
                inserted += 1;
            }
            None => skipped.push(warn_skip(
                SkipKind::FuelStop,
                stop.source_row,
                stop.trip.as_deref(),
            )),
        }
    }

    log::info!("    {} fuel stops inserted", inserted);
    Ok(inserted)
}

fn insert_expenses(
    tx: &Transaction,
    expenses: &[ExpenseRecord],
    trips: &TripMap,
    skipped: &mut Vec<SkippedRow>,
) -> Result<usize, StoreError> {
    log::info!("  - Inserting expenses...");
    let mut stmt = tx.prepare_cached(
        "INSERT INTO expenses (load_id, expense_date, category, amount, description, notes) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;

    let mut inserted = 0;
    for expense in expenses {
        match trips.resolve(expense.trip.as_deref()) {
            Some(load_id) => {
                stmt.execute(params![
                    load_id,
                    expense.expense_date,
                    expense.category,
                    expense.amount,
                    expense.description,
                    expense.notes,
                ])?;
                inserted += 1;
            }
            None => skipped.push(warn_skip(
                SkipKind::Expense,
                expense.source_row,
                expense.trip.as_deref(),
            )),
        }
    }

    log::info!("    {} expenses inserted", inserted);
    Ok(inserted)
}

fn record_run(tx: &Transaction, summary: &LoadSummary) -> Result<i64, StoreError> {
    let started_at = chrono::Utc::now().to_rfc3339();
    let run_id = tx.query_row(
        "INSERT INTO load_runs (started_at, loads_inserted, fuel_stops_inserted, fuel_stops_skipped, \
         expenses_inserted, expenses_skipped) VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING run_id",
        params![
            started_at,
            summary.loads_inserted as i64,
            summary.fuel_stops_inserted as i64,
            summary.skipped_count(SkipKind::FuelStop) as i64,
            summary.expenses_inserted as i64,
            summary.skipped_count(SkipKind::Expense) as i64,
        ],
        |row| row.get(0),
    )?;
    Ok(run_id)
}

fn insert_all(tx: &Transaction, data: &SheetData) -> Result<LoadSummary, StoreError> {
    clear_tables(tx)?;

    let mut trips = TripMap::new();
    let mut summary = LoadSummary {
        loads_inserted: insert_loads(tx, &data.loads, &mut trips)?,
        ..Default::default()
    };
    summary.trips_mapped = trips.len();
    if trips.is_empty() && !(data.fuel_stops.is_empty() && data.expenses.is_empty()) {
        log::warn!("No loads inserted; every fuel stop and expense will be skipped");
    }
    summary.fuel_stops_inserted =
        insert_fuel_stops(tx, &data.fuel_stops, &trips, &mut summary.skipped)?;
    summary.expenses_inserted =
        insert_expenses(tx, &data.expenses, &trips, &mut summary.skipped)?;
    summary.ambiguous_trips = trips.ambiguous_keys().to_vec();
    summary.run_id = record_run(tx, &summary)?;
    Ok(summary)
}

/// Replace the store contents with `data` in a single transaction.
///
/// The previous contents are deleted inside the same transaction, so any
/// failure leaves the store exactly as it was before the run.
pub fn load_all(conn: &mut Connection, data: &SheetData) -> Result<LoadSummary, StoreError> {
    let tx = conn.transaction()?;

    match insert_all(&tx, data) {
        Ok(summary) => {
            tx.commit()?;
            log::info!("Transaction committed (run {})", summary.run_id);
            Ok(summary)
        }
        Err(e) => {
            match tx.rollback() {
                Ok(()) => log::warn!("Transaction rolled back"),
                Err(rollback) => log::warn!("Rollback failed: {}", rollback),
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_requires_exact_match() {
        let mut trips = TripMap::new();
        assert!(trips.is_empty());
        trips.record("2024-03-01 to Dallas".into(), 1);

        assert_eq!(trips.resolve(Some("2024-03-01 to Dallas")), Some(1));
        assert_eq!(trips.resolve(Some("2024-03-01 to dallas")), None);
        assert_eq!(trips.resolve(Some("2024-03-01 to Dallas ")), None);
        assert_eq!(trips.resolve(None), None);
    }

    #[test]
    fn duplicate_key_keeps_last_id() {
        let mut trips = TripMap::new();
        assert_eq!(trips.record("2024-03-01 to Dallas".into(), 1), None);
        assert_eq!(trips.record("2024-03-01 to Dallas".into(), 2), Some(1));
        assert_eq!(trips.record("2024-03-01 to Dallas".into(), 3), Some(2));

        assert_eq!(trips.resolve(Some("2024-03-01 to Dallas")), Some(3));
        assert_eq!(trips.len(), 1);
        assert_eq!(trips.ambiguous_keys(), ["2024-03-01 to Dallas"]);
    }
}
