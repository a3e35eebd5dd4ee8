//! Command handlers

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::data::RecordProcessor;
use crate::db::{self, LoadSummary, SkipKind};
use crate::report;
use crate::sheets;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Execute CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command {
        Commands::InitDb { schema } => {
            if let Some(schema) = schema {
                config.database.schema = schema;
            }
            cmd_init_db(&config)
        }
        Commands::Load { sheet } => {
            if let Some(sheet) = sheet {
                config.sheet.override_path(sheet)?;
            }
            cmd_load(&config).map(|_| ())
        }
        Commands::Report { output_dir } => {
            if let Some(dir) = output_dir {
                config.report.output_dir = dir;
            }
            cmd_report(&config)
        }
        Commands::Config => {
            println!("{}", config);
            Ok(())
        }
    }
}

fn cmd_init_db(config: &Config) -> Result<()> {
    let schema_path = &config.database.schema;
    let schema = std::fs::read_to_string(schema_path)
        .with_context(|| format!("Failed to read schema file: {}", schema_path.display()))?;

    let conn = db::create(&config.database.path)
        .with_context(|| format!("Failed to open database: {}", config.database.path.display()))?;
    db::apply_schema(&conn, &schema).context("Failed to apply schema")?;

    log::info!(
        "Schema applied to {} ({} tables)",
        config.database.path.display(),
        db::TABLES.len()
    );
    Ok(())
}

/// Loader job: read, normalize, then replace the store contents in one transaction.
pub fn cmd_load(config: &Config) -> Result<LoadSummary> {
    log::info!("Starting ETL process");

    let mut conn = db::open(&config.database.path).context("Failed to connect to database")?;
    db::verify_schema(&conn).context("Database schema check failed")?;

    let mut source = sheets::open_source(&config.sheet).context("Failed to open spreadsheet")?;
    let raw = source
        .read_all(&config.sheet.tabs)
        .context("Failed to read spreadsheet tabs")?;

    let data = RecordProcessor::process(&raw).context("Failed to normalize spreadsheet data")?;
    log::info!(
        "Normalized {} loads, {} fuel stops, {} expenses",
        data.loads.len(),
        data.fuel_stops.len(),
        data.expenses.len()
    );

    let summary = db::load_all(&mut conn, &data).context("ETL load failed")?;

    log_summary(&summary);
    Ok(summary)
}

fn log_summary(summary: &LoadSummary) {
    log::info!(
        "Inserted {} loads ({} distinct trips), {} fuel stops, {} expenses",
        summary.loads_inserted,
        summary.trips_mapped,
        summary.fuel_stops_inserted,
        summary.expenses_inserted
    );

    let fuel_skipped = summary.skipped_count(SkipKind::FuelStop);
    let expenses_skipped = summary.skipped_count(SkipKind::Expense);
    if fuel_skipped + expenses_skipped > 0 {
        log::warn!(
            "Skipped {} fuel stops and {} expenses with no matching trip",
            fuel_skipped,
            expenses_skipped
        );
    }
    if !summary.ambiguous_trips.is_empty() {
        log::warn!(
            "Ambiguous trips (attached to the last matching load): {}",
            summary.ambiguous_trips.join(", ")
        );
    }
    log::info!("ETL process completed successfully (run {})", summary.run_id);
}

fn cmd_report(config: &Config) -> Result<()> {
    let conn = db::open(&config.database.path).context("Failed to connect to database")?;
    db::verify_schema(&conn).context("Database schema check failed")?;

    let mut stdout = std::io::stdout().lock();
    let output = report::run_report(&conn, &config.report, &mut stdout)
        .context("Failed to generate report")?;

    let written: Vec<PathBuf> = output
        .charts
        .iter()
        .chain(std::iter::once(&output.summary))
        .cloned()
        .collect();
    for path in &written {
        log::info!("Wrote {}", path.display());
    }
    log::info!(
        "Analysis complete: {} files in {}",
        written.len(),
        config.report.output_dir.display()
    );
    Ok(())
}
