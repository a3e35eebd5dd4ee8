//! Configuration management for haulbook
//!
//! Config is read from `haulbook.toml` in the working directory unless a path is given.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "haulbook.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Config error: {0}")]
    Invalid(String),
}

/// Where the spreadsheet data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Local workbook export (.xlsx, .xls, .ods)
    #[default]
    Workbook,
    /// Google Sheets v4 API
    Google,
    /// Directory with one CSV file per tab
    Csv,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Workbook => write!(f, "workbook"),
            SourceKind::Google => write!(f, "google"),
            SourceKind::Csv => write!(f, "csv"),
        }
    }
}

/// Names of the three spreadsheet tabs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabNames {
    #[serde(default = "default_loads_tab")]
    pub loads: String,
    #[serde(default = "default_fuel_tab")]
    pub fuel: String,
    #[serde(default = "default_expenses_tab")]
    pub expenses: String,
}

impl Default for TabNames {
    fn default() -> Self {
        Self {
            loads: default_loads_tab(),
            fuel: default_fuel_tab(),
            expenses: default_expenses_tab(),
        }
    }
}

fn default_loads_tab() -> String {
    "LOADS".to_string()
}

fn default_fuel_tab() -> String {
    "FUEL".to_string()
}

fn default_expenses_tab() -> String {
    "EXPENSES".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// Schema bootstrap script used by `init-db`
    #[serde(default = "default_schema_path")]
    pub schema: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            schema: default_schema_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("haulbook.db")
}

fn default_schema_path() -> PathBuf {
    PathBuf::from("sql/schema.sql")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    #[serde(default)]
    pub source: SourceKind,

    /// Workbook file or CSV directory, depending on `source`
    #[serde(default = "default_sheet_path")]
    pub path: PathBuf,

    /// Spreadsheet id for the Google source
    #[serde(default)]
    pub spreadsheet_id: Option<String>,

    /// Environment variable holding the OAuth bearer token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    #[serde(default)]
    pub tabs: TabNames,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::default(),
            path: default_sheet_path(),
            spreadsheet_id: None,
            token_env: default_token_env(),
            tabs: TabNames::default(),
        }
    }
}

impl SheetConfig {
    /// Point a file-based source at another workbook or CSV directory.
    pub fn override_path(&mut self, path: PathBuf) -> Result<(), ConfigError> {
        if self.source == SourceKind::Google {
            return Err(ConfigError::Invalid(format!(
                "--sheet {} cannot be used with sheet.source = \"google\"",
                path.display()
            )));
        }
        self.path = path;
        Ok(())
    }
}

fn default_sheet_path() -> PathBuf {
    PathBuf::from("trucking-analytics.xlsx")
}

fn default_token_env() -> String {
    "GOOGLE_SHEETS_TOKEN".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_queries_path")]
    pub queries: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Chart width in pixels
    #[serde(default = "default_chart_width")]
    pub chart_width: u32,

    /// Chart height in pixels
    #[serde(default = "default_chart_height")]
    pub chart_height: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            queries: default_queries_path(),
            output_dir: default_output_dir(),
            chart_width: default_chart_width(),
            chart_height: default_chart_height(),
        }
    }
}

fn default_queries_path() -> PathBuf {
    PathBuf::from("sql/analysis_queries.sql")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_chart_width() -> u32 {
    1200
}

fn default_chart_height() -> u32 {
    800
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub sheet: SheetConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

impl Config {
    /// Load config from an explicit path, or from the default file if present.
    ///
    /// An explicit path that does not exist is an error; a missing default file
    /// falls back to built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Self::from_file(path)
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    log::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse config text and check cross-field requirements.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.sheet.source == SourceKind::Google && self.sheet.spreadsheet_id.is_none() {
            return Err(ConfigError::Invalid(
                "sheet.spreadsheet_id is required when sheet.source = \"google\"".to_string(),
            ));
        }
        if self.report.chart_width == 0 || self.report.chart_height == 0 {
            return Err(ConfigError::Invalid(
                "report.chart_width and report.chart_height must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Haulbook Configuration")?;
        writeln!(f, "======================")?;
        writeln!(f)?;
        writeln!(f, "Database:        {}", self.database.path.display())?;
        writeln!(f, "Schema script:   {}", self.database.schema.display())?;
        writeln!(f, "Sheet source:    {}", self.sheet.source)?;
        match self.sheet.source {
            SourceKind::Google => writeln!(
                f,
                "Spreadsheet id:  {} (token from ${})",
                self.sheet.spreadsheet_id.as_deref().unwrap_or("(unset)"),
                self.sheet.token_env
            )?,
            _ => writeln!(f, "Sheet path:      {}", self.sheet.path.display())?,
        }
        writeln!(
            f,
            "Tabs:            {} / {} / {}",
            self.sheet.tabs.loads, self.sheet.tabs.fuel, self.sheet.tabs.expenses
        )?;
        writeln!(f, "Queries:         {}", self.report.queries.display())?;
        writeln!(f, "Output dir:      {}", self.report.output_dir.display())?;
        writeln!(
            f,
            "Chart size:      {}x{}",
            self.report.chart_width, self.report.chart_height
        )?;
        Ok(())
    }
}
