//! CLI definition using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "haulbook")]
#[command(version)]
#[command(about = "Load trucking spreadsheets into SQLite and report on trip profitability")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ./haulbook.toml when present)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database tables
    InitDb {
        /// Schema script (overrides config)
        #[arg(long)]
        schema: Option<PathBuf>,
    },

    /// Clear the database and reload it from the spreadsheet
    Load {
        /// Workbook file or CSV directory (overrides config)
        #[arg(long, short = 's')]
        sheet: Option<PathBuf>,
    },

    /// Run the analysis queries, write charts and the trip summary
    Report {
        /// Output directory (overrides config)
        #[arg(long, short = 'o')]
        output_dir: Option<PathBuf>,
    },

    /// Print the effective configuration
    Config,
}
