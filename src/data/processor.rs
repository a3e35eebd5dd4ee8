//! Record Processor Module
//! Column-by-column type coercion from normalized tab frames into typed records.

use super::loader::TabFrame;
use super::records::{ExpenseRecord, FuelStopRecord, LoadRecord, SheetData};
use super::NormalizeError;
use crate::sheets::{serial_to_date, RawSheets, RawTab};
use chrono::{Datelike, NaiveDate, NaiveDateTime};

pub mod columns {
    pub const LOAD_DATE: &str = "Load Date";
    pub const PICKUP: &str = "Pickup Location";
    pub const DROPOFF: &str = "Dropoff Location";
    pub const TOTAL_MILES: &str = "Total Miles";
    pub const REVENUE: &str = "Revenue";
    pub const DROP_AND_HOOK: &str = "Is Drop and Hook";
    pub const WAIT_TIME: &str = "Wait Time Hours";
    pub const NOTES: &str = "Notes";

    pub const TRIP: &str = "Trip";
    pub const STOP_DATE: &str = "Stop Date";
    pub const GALLONS: &str = "Gallons";
    pub const TOTAL_COST: &str = "Total Cost";
    pub const LOCATION: &str = "Location";

    pub const EXPENSE_DATE: &str = "Expense Date";
    pub const CATEGORY: &str = "Category";
    pub const AMOUNT: &str = "Amount";
    pub const DESCRIPTION: &str = "Item Description (What)";
    pub const EXPENSE_NOTES: &str = "Notes (Why)";
}

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%m/%d/%y"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Dates outside this window are misreads (e.g. `%Y` taking "24" as year 24).
const MIN_YEAR: i32 = 1950;
const MAX_YEAR: i32 = 2100;

fn plausible(date: NaiveDate) -> Option<NaiveDate> {
    (MIN_YEAR..MAX_YEAR).contains(&date.year()).then_some(date)
}

fn parse_date_only(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .find_map(plausible)
}

/// Parse a date cell. Accepts ISO and US formats (four- or two-digit years),
/// a trailing time part, and bare spreadsheet date serials.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    if let Some(date) = parse_date_only(value) {
        return Some(date);
    }
    if let Some(date) = DATETIME_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .find_map(|dt| plausible(dt.date()))
    {
        return Some(date);
    }

    // "2024-03-01 00:00:00.000" and similar
    if let Some((date_part, _)) = value.split_once([' ', 'T']) {
        if let Some(date) = parse_date_only(date_part) {
            return Some(date);
        }
    }

    // same window as serials: 1950..2100
    match value.parse::<f64>() {
        Ok(serial) if (18264.0..73051.0).contains(&serial) => serial_to_date(serial),
        _ => None,
    }
}

/// Parse a numeric cell, tolerating currency symbols and thousands separators.
pub fn parse_number(value: &str) -> Option<f64> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a yes/no cell.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "x" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

/// Column accessor for one tab, keeping row numbers for error messages.
struct TabColumns<'a> {
    frame: &'a TabFrame,
    rows: Vec<u32>,
}

impl<'a> TabColumns<'a> {
    fn new(frame: &'a TabFrame, required: &[&str]) -> Result<Self, NormalizeError> {
        frame.require_columns(required)?;
        Ok(Self {
            frame,
            rows: frame.source_rows()?,
        })
    }

    /// Optional column: absent columns read as all-null.
    fn text(&self, column: &str) -> Result<Vec<Option<String>>, NormalizeError> {
        if self.frame.get_columns().iter().any(|c| c == column) {
            self.frame.text_column(column)
        } else {
            Ok(vec![None; self.rows.len()])
        }
    }

    fn invalid(&self, idx: usize, column: &str, expected: &'static str, value: &str) -> NormalizeError {
        NormalizeError::InvalidValue {
            tab: self.frame.name().to_string(),
            row: self.rows[idx],
            column: column.to_string(),
            expected,
            value: value.to_string(),
        }
    }

    fn required_text(&self, column: &str) -> Result<Vec<String>, NormalizeError> {
        self.text(column)?
            .into_iter()
            .enumerate()
            .map(|(idx, v)| {
                v.ok_or_else(|| NormalizeError::MissingValue {
                    tab: self.frame.name().to_string(),
                    row: self.rows[idx],
                    column: column.to_string(),
                })
            })
            .collect()
    }

    fn dates(&self, column: &str) -> Result<Vec<NaiveDate>, NormalizeError> {
        self.required_text(column)?
            .iter()
            .enumerate()
            .map(|(idx, v)| parse_date(v).ok_or_else(|| self.invalid(idx, column, "date", v)))
            .collect()
    }

    fn numbers(&self, column: &str) -> Result<Vec<Option<f64>>, NormalizeError> {
        self.text(column)?
            .iter()
            .enumerate()
            .map(|(idx, v)| match v {
                None => Ok(None),
                Some(s) => parse_number(s)
                    .map(Some)
                    .ok_or_else(|| self.invalid(idx, column, "numeric", s)),
            })
            .collect()
    }

    fn flags(&self, column: &str) -> Result<Vec<bool>, NormalizeError> {
        self.text(column)?
            .iter()
            .enumerate()
            .map(|(idx, v)| match v {
                None => Ok(false),
                Some(s) => parse_flag(s).ok_or_else(|| self.invalid(idx, column, "yes/no", s)),
            })
            .collect()
    }
}

/// Handles coercion of the three tabs into typed records.
pub struct RecordProcessor;

impl RecordProcessor {
    /// Normalize all three tabs. Any coercion failure aborts the whole run.
    pub fn process(raw: &RawSheets) -> Result<SheetData, NormalizeError> {
        let data = SheetData {
            loads: Self::process_loads(&raw.loads)?,
            fuel_stops: Self::process_fuel(&raw.fuel)?,
            expenses: Self::process_expenses(&raw.expenses)?,
        };

        log::info!(
            "Parsed {} loads, {} fuel stops, {} expenses",
            data.loads.len(),
            data.fuel_stops.len(),
            data.expenses.len()
        );
        Ok(data)
    }

    pub fn process_loads(tab: &RawTab) -> Result<Vec<LoadRecord>, NormalizeError> {
        use columns::*;

        let frame = TabFrame::from_raw(tab)?;
        let cols = TabColumns::new(&frame, &[LOAD_DATE, DROPOFF])?;

        let dates = cols.dates(LOAD_DATE)?;
        let pickups = cols.text(PICKUP)?;
        let dropoffs = cols.required_text(DROPOFF)?;
        let miles = cols.numbers(TOTAL_MILES)?;
        let revenue = cols.numbers(REVENUE)?;
        let drop_and_hook = cols.flags(DROP_AND_HOOK)?;
        let wait_time = cols.numbers(WAIT_TIME)?;
        let notes = cols.text(NOTES)?;

        Ok((0..frame.get_row_count())
            .map(|i| LoadRecord {
                source_row: cols.rows[i],
                load_date: dates[i],
                pickup_location: pickups[i].clone(),
                dropoff_location: dropoffs[i].clone(),
                total_miles: miles[i],
                revenue: revenue[i],
                is_drop_and_hook: drop_and_hook[i],
                wait_time_hours: wait_time[i],
                notes: notes[i].clone(),
            })
            .collect())
    }

    pub fn process_fuel(tab: &RawTab) -> Result<Vec<FuelStopRecord>, NormalizeError> {
        use columns::*;

        let frame = TabFrame::from_raw(tab)?;
        let cols = TabColumns::new(&frame, &[TRIP, STOP_DATE, TOTAL_COST])?;

        let trips = cols.text(TRIP)?;
        let dates = cols.dates(STOP_DATE)?;
        let gallons = cols.numbers(GALLONS)?;
        let cost = cols.numbers(TOTAL_COST)?;
        let locations = cols.text(LOCATION)?;
        let notes = cols.text(NOTES)?;

        Ok((0..frame.get_row_count())
            .map(|i| FuelStopRecord {
                source_row: cols.rows[i],
                trip: trips[i].clone(),
                stop_date: dates[i],
                gallons: gallons[i],
                total_cost: cost[i],
                location: locations[i].clone(),
                notes: notes[i].clone(),
            })
            .collect())
    }

    pub fn process_expenses(tab: &RawTab) -> Result<Vec<ExpenseRecord>, NormalizeError> {
        use columns::*;

        let frame = TabFrame::from_raw(tab)?;
        let cols = TabColumns::new(&frame, &[TRIP, EXPENSE_DATE, CATEGORY, AMOUNT])?;

        let trips = cols.text(TRIP)?;
        let dates = cols.dates(EXPENSE_DATE)?;
        let categories = cols.text(CATEGORY)?;
        let amounts = cols.numbers(AMOUNT)?;
        let descriptions = cols.text(DESCRIPTION)?;
        let notes = cols.text(EXPENSE_NOTES)?;

        Ok((0..frame.get_row_count())
            .map(|i| ExpenseRecord {
                source_row: cols.rows[i],
                trip: trips[i].clone(),
                expense_date: dates[i],
                category: categories[i].clone(),
                amount: amounts[i],
                description: descriptions[i].clone(),
                notes: notes[i].clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::Cell;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn grid(name: &str, rows: &[&[&str]]) -> RawTab {
        RawTab::from_grid(
            name,
            rows.iter()
                .map(|r| r.iter().map(|s| Cell::from(*s)).collect())
                .collect(),
        )
    }

    #[test]
    fn dates_accept_common_sheet_formats() {
        assert_eq!(parse_date("2024-03-01"), Some(date(2024, 3, 1)));
        assert_eq!(parse_date("3/1/2024"), Some(date(2024, 3, 1)));
        assert_eq!(parse_date("2024-03-01 00:00:00"), Some(date(2024, 3, 1)));
        assert_eq!(parse_date("2024-03-01T08:30:00.000Z"), Some(date(2024, 3, 1)));
        assert_eq!(parse_date("45352"), Some(date(2024, 3, 1)));
        assert_eq!(parse_date("next tuesday"), None);
        assert_eq!(parse_date("12"), None);
    }

    #[test]
    fn two_digit_years_land_in_this_century() {
        assert_eq!(parse_date("3/1/24"), Some(date(2024, 3, 1)));
        assert_eq!(parse_date("03/01/24"), Some(date(2024, 3, 1)));
        assert_eq!(parse_date("3/1/24 08:15"), Some(date(2024, 3, 1)));
        assert_eq!(parse_date("3/1/0024"), None);
        assert_eq!(parse_date("0024-03-01"), None);
    }

    #[test]
    fn two_digit_year_load_keeps_matching_trip_key() {
        let tab = grid(
            "LOADS",
            &[&["Load Date", "Dropoff Location"], &["3/1/24", "Dallas"]],
        );
        let loads = RecordProcessor::process_loads(&tab).unwrap();
        assert_eq!(loads[0].trip_key(), "2024-03-01 to Dallas");
    }

    #[test]
    fn implausible_year_is_a_normalization_error() {
        let tab = grid(
            "LOADS",
            &[&["Load Date", "Dropoff Location"], &["3/1/0024", "Dallas"]],
        );
        let err = RecordProcessor::process_loads(&tab).unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::InvalidValue { row: 2, expected: "date", .. }
        ));
    }

    #[test]
    fn numbers_tolerate_currency_formatting() {
        assert_eq!(parse_number("1,250.75"), Some(1250.75));
        assert_eq!(parse_number("$ 89.10"), Some(89.10));
        assert_eq!(parse_number("-42"), Some(-42.0));
        assert_eq!(parse_number("n/a"), None);
    }

    #[test]
    fn flags_accept_checkbox_and_words() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("no"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn loads_are_coerced_per_column() {
        let tab = grid(
            "LOADS",
            &[
                &[
                    "Load Date",
                    "Pickup Location",
                    "Dropoff Location",
                    "Total Miles",
                    "Revenue",
                    "Is Drop and Hook",
                    "Wait Time Hours",
                    "Notes",
                ],
                &["3/1/2024", "Memphis", "Dallas", "452", "$1,800", "TRUE", "", "detention"],
                &["", "", "", "", "", "", "", ""],
                &["2024-03-04", "", "Tulsa", "", "", "", "1.5", ""],
            ],
        );

        let loads = RecordProcessor::process_loads(&tab).unwrap();
        assert_eq!(loads.len(), 2);

        assert_eq!(loads[0].source_row, 2);
        assert_eq!(loads[0].trip_key(), "2024-03-01 to Dallas");
        assert_eq!(loads[0].revenue, Some(1800.0));
        assert!(loads[0].is_drop_and_hook);
        assert_eq!(loads[0].wait_time_hours, None);

        assert_eq!(loads[1].source_row, 4);
        assert_eq!(loads[1].pickup_location, None);
        assert!(!loads[1].is_drop_and_hook);
        assert_eq!(loads[1].wait_time_hours, Some(1.5));
    }

    #[test]
    fn load_without_dropoff_is_rejected() {
        let tab = grid(
            "LOADS",
            &[&["Load Date", "Dropoff Location"], &["2024-03-01", ""]],
        );
        let err = RecordProcessor::process_loads(&tab).unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::MissingValue { row: 2, ref column, .. } if column == "Dropoff Location"
        ));
    }

    #[test]
    fn invalid_number_names_tab_row_and_column() {
        let tab = grid(
            "FUEL",
            &[
                &["Trip", "Stop Date", "Gallons", "Total Cost"],
                &["2024-03-01 to Dallas", "2024-03-01", "lots", "300"],
            ],
        );
        let err = RecordProcessor::process_fuel(&tab).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Tab 'FUEL' row 2: column 'Gallons' has invalid numeric value 'lots'"
        );
    }

    #[test]
    fn expenses_keep_missing_trip_and_amount_as_null() {
        let tab = grid(
            "EXPENSES",
            &[
                &["Trip", "Expense Date", "Category", "Amount", "Item Description (What)"],
                &["", "2024-03-02", "Food", "", "lunch"],
            ],
        );
        let expenses = RecordProcessor::process_expenses(&tab).unwrap();
        assert_eq!(expenses[0].trip, None);
        assert_eq!(expenses[0].amount, None);
        assert_eq!(expenses[0].description.as_deref(), Some("lunch"));
        assert_eq!(expenses[0].notes, None);
    }
}
