//! Haulbook - trucking spreadsheet ETL and profitability reporting

use clap::Parser;
use haulbook::cli::Cli;
use haulbook::commands;

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = commands::execute(cli) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
