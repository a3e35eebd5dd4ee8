//! Haulbook - trucking spreadsheet ETL and profitability reporting
//!
//! The loader moves the LOADS, FUEL and EXPENSES tabs into SQLite in one
//! transaction; the reporter reads them back out as charts, a CSV summary
//! and console insights.

pub mod charts;
pub mod cli;
pub mod commands;
pub mod config;
pub mod data;
pub mod db;
pub mod report;
pub mod sheets;
