//! Configuration passed explicitly into every stage.
//!
//! Precedence, lowest first: built-in defaults, YAML config file,
//! `AIRSTAR_*` environment variables, then CLI flags (applied by the binary).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    pub clean: CleanConfig,
    pub rules: CleaningConfig,
    pub model: ModelConfig,
    pub warehouse: WarehouseConfig,
}

/// Batch cleaning stage: source file in, compressed artifact out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanConfig {
    pub source_path: String,
    pub artifact_path: String,
    /// Maximum rows held in memory at once.
    pub batch_size: usize,
    /// Rows re-read from the artifact by the post-run integrity check.
    pub sample_rows: usize,
    /// zstd level for the artifact.
    pub compression_level: i32,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            source_path: "./data/airline_2m.csv".to_string(),
            artifact_path: "airline_cleaned.csv.zst".to_string(),
            batch_size: 50_000,
            sample_rows: 1_000,
            compression_level: 3,
        }
    }
}

/// Column lists driving the cleaning rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Storage leftovers dropped when present.
    pub drop_columns: Vec<String>,
    /// Rows missing any of these (when present) are dropped.
    pub key_columns: Vec<String>,
    pub date_column: String,
    /// Rows with a negative value in any of these are dropped.
    pub non_negative_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub duration_column: String,
    pub arrival_time_column: String,
    pub departure_time_column: String,
    pub delay_source_column: String,
    pub delay_flag_column: String,
    /// Minutes strictly above which a departure delay is significant.
    pub delay_threshold_minutes: f64,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        let owned = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            drop_columns: owned(&["Unnamed: 0"]),
            key_columns: owned(&[
                "FlightDate",
                "DepTime",
                "ArrTime",
                "Origin",
                "Dest",
                "Reporting_Airline",
            ]),
            date_column: "FlightDate".to_string(),
            non_negative_columns: owned(&[
                "DepDelayMinutes",
                "ArrDelayMinutes",
                "TaxiOut",
                "TaxiIn",
                "CRSElapsedTime",
                "ActualElapsedTime",
            ]),
            categorical_columns: owned(&["Reporting_Airline", "Origin", "Dest"]),
            duration_column: "FlightDuration".to_string(),
            arrival_time_column: "ArrTime".to_string(),
            departure_time_column: "DepTime".to_string(),
            delay_source_column: "DepDelayMinutes".to_string(),
            delay_flag_column: "SignificantDelay".to_string(),
            delay_threshold_minutes: 15.0,
        }
    }
}

/// Dimensional reshaping stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory receiving one CSV file per table.
    pub tables_dir: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            tables_dir: ".".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarehouseBackend {
    Sqlite,
    Postgres,
}

impl std::str::FromStr for WarehouseBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(WarehouseBackend::Sqlite),
            "postgres" | "postgresql" | "pg" => Ok(WarehouseBackend::Postgres),
            other => Err(Error::Config(format!("unknown warehouse backend '{other}'"))),
        }
    }
}

/// Relational sink for the cleaned artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseConfig {
    pub backend: WarehouseBackend,
    pub table: String,
    /// Rows per append; independent of the cleaning batch size.
    pub load_batch_size: usize,
    pub sqlite_path: String,
    pub pg_host: String,
    pub pg_port: u16,
    pub pg_user: String,
    pub pg_password: String,
    pub pg_database: String,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            backend: WarehouseBackend::Sqlite,
            table: "flights".to_string(),
            load_batch_size: 100_000,
            sqlite_path: "airstar.db".to_string(),
            pg_host: "localhost".to_string(),
            pg_port: 5432,
            pg_user: "airstar".to_string(),
            pg_password: String::new(),
            pg_database: "airstar".to_string(),
        }
    }
}

impl EtlConfig {
    /// Defaults, then the optional YAML file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p).map_err(|e| {
                    Error::Config(format!("cannot read config file {}: {e}", p.display()))
                })?;
                Self::from_yaml_str(&text)?
            }
            None => Self::default(),
        };
        cfg.apply_env_from(|k| std::env::var(k).ok())?;
        Ok(cfg)
    }

    /// Parse a YAML document; missing keys keep their defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Apply `AIRSTAR_*` overrides looked up through `lookup`.
    ///
    /// Environment variables:
    /// - `AIRSTAR_SOURCE`, `AIRSTAR_ARTIFACT`: stage paths
    /// - `AIRSTAR_BATCH_SIZE`, `AIRSTAR_SAMPLE_ROWS`, `AIRSTAR_COMPRESSION_LEVEL`
    /// - `AIRSTAR_TABLES_DIR`
    /// - `AIRSTAR_WAREHOUSE` (`sqlite` | `postgres`), `AIRSTAR_WAREHOUSE_TABLE`,
    ///   `AIRSTAR_LOAD_BATCH_SIZE`, `AIRSTAR_SQLITE_PATH`
    /// - `AIRSTAR_PG_HOST`, `AIRSTAR_PG_PORT`, `AIRSTAR_PG_USER`,
    ///   `AIRSTAR_PG_PASSWORD`, `AIRSTAR_PG_DATABASE`
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(s) = lookup("AIRSTAR_SOURCE") {
            self.clean.source_path = s;
        }
        if let Some(s) = lookup("AIRSTAR_ARTIFACT") {
            self.clean.artifact_path = s;
        }
        if let Some(s) = lookup("AIRSTAR_BATCH_SIZE") {
            self.clean.batch_size = parse_env("AIRSTAR_BATCH_SIZE", &s)?;
        }
        if let Some(s) = lookup("AIRSTAR_SAMPLE_ROWS") {
            self.clean.sample_rows = parse_env("AIRSTAR_SAMPLE_ROWS", &s)?;
        }
        if let Some(s) = lookup("AIRSTAR_COMPRESSION_LEVEL") {
            self.clean.compression_level = parse_env("AIRSTAR_COMPRESSION_LEVEL", &s)?;
        }
        if let Some(s) = lookup("AIRSTAR_TABLES_DIR") {
            self.model.tables_dir = s;
        }
        if let Some(s) = lookup("AIRSTAR_WAREHOUSE") {
            self.warehouse.backend = s.parse()?;
        }
        if let Some(s) = lookup("AIRSTAR_WAREHOUSE_TABLE") {
            self.warehouse.table = s;
        }
        if let Some(s) = lookup("AIRSTAR_LOAD_BATCH_SIZE") {
            self.warehouse.load_batch_size = parse_env("AIRSTAR_LOAD_BATCH_SIZE", &s)?;
        }
        if let Some(s) = lookup("AIRSTAR_SQLITE_PATH") {
            self.warehouse.sqlite_path = s;
        }
        if let Some(s) = lookup("AIRSTAR_PG_HOST") {
            self.warehouse.pg_host = s;
        }
        if let Some(s) = lookup("AIRSTAR_PG_PORT") {
            self.warehouse.pg_port = parse_env("AIRSTAR_PG_PORT", &s)?;
        }
        if let Some(s) = lookup("AIRSTAR_PG_USER") {
            self.warehouse.pg_user = s;
        }
        if let Some(s) = lookup("AIRSTAR_PG_PASSWORD") {
            self.warehouse.pg_password = s;
        }
        if let Some(s) = lookup("AIRSTAR_PG_DATABASE") {
            self.warehouse.pg_database = s;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.clean.batch_size == 0 {
            return Err(Error::Config("batch_size must be positive".into()));
        }
        if self.clean.sample_rows == 0 {
            return Err(Error::Config("sample_rows must be positive".into()));
        }
        if !(-7..=22).contains(&self.clean.compression_level) {
            return Err(Error::Config(format!(
                "compression_level {} outside zstd range -7..=22",
                self.clean.compression_level
            )));
        }
        if self.warehouse.load_batch_size == 0 {
            return Err(Error::Config("load_batch_size must be positive".into()));
        }
        if self.warehouse.table.trim().is_empty() {
            return Err(Error::Config("warehouse table name is empty".into()));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| Error::Config(format!("{key}: cannot parse '{value}'")))
}
