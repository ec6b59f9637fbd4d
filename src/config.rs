//! Pipeline configuration
//!
//! Both binaries read the same `PipelineConfig`, from YAML or JSON. Every
//! field has a default so a missing config file runs with the stock layout:
//! CSVs under `data/`, a DuckDB file `vendor.duckdb`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "VENDOR_ETL_CONFIG";

/// Config file used when `VENDOR_ETL_CONFIG` is unset
pub const DEFAULT_CONFIG_FILE: &str = "vendor_etl.yaml";

/// Environment variable overriding the store password
pub const PASSWORD_ENV: &str = "VENDOR_ETL_DB_PASSWORD";

/// PostgreSQL port used when none is configured
pub const DEFAULT_POSTGRES_PORT: u16 = 5433;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory scanned for source CSV files
    pub source_dir: PathBuf,

    /// Rows per chunk when streaming a CSV into the store
    pub chunk_size: usize,

    /// Rows per batch when writing the summary table
    pub summary_batch_size: usize,

    /// CSV field delimiter
    pub delimiter: char,

    /// Rows sampled for CSV type inference (`None` scans the whole file)
    pub infer_schema_rows: Option<usize>,

    /// Directory for per-component log files (console only when unset)
    pub log_dir: Option<PathBuf>,

    /// Raw and summary table names
    pub tables: TableNames,

    /// Store connection parameters
    pub store: StoreConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("data"),
            chunk_size: 200_000,
            summary_batch_size: 50_000,
            delimiter: ',',
            infer_schema_rows: None,
            log_dir: None,
            tables: TableNames::default(),
            store: StoreConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load config from a YAML or JSON file, chosen by extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config '{}': {e}", path.display()))
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_yaml_str(&content)?
        };
        Ok(config)
    }

    /// Resolve the config from the environment
    ///
    /// `VENDOR_ETL_CONFIG` must point at an existing file when set. Without
    /// it, `vendor_etl.yaml` is used if present, otherwise defaults.
    pub fn from_env() -> Result<Self> {
        Self::resolve(None)
    }

    /// Resolve the config, with an explicit path taking precedence over
    /// `VENDOR_ETL_CONFIG`
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match (explicit, std::env::var(CONFIG_ENV)) {
            (Some(path), _) => Self::load(path)?,
            (None, Ok(path)) => Self::load(path)?,
            (None, Err(_)) if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::load(DEFAULT_CONFIG_FILE)?
            }
            (None, Err(_)) => Self::default(),
        };

        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            config.store.password = Some(password);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::invalid_value(
                "chunk_size",
                "must be greater than zero",
            ));
        }
        if self.summary_batch_size == 0 {
            return Err(Error::invalid_value(
                "summary_batch_size",
                "must be greater than zero",
            ));
        }
        if !self.delimiter.is_ascii() {
            return Err(Error::invalid_value(
                "delimiter",
                format!("'{}' is not a single-byte character", self.delimiter),
            ));
        }
        if self.infer_schema_rows == Some(0) {
            return Err(Error::invalid_value(
                "infer_schema_rows",
                "must be greater than zero when set",
            ));
        }
        self.tables.validate()?;
        self.store.validate()
    }
}

// ============================================================================
// Table Names
// ============================================================================

/// Names of the tables the summary query reads and writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    /// Purchase transactions
    pub purchases: String,
    /// Product price catalog
    pub purchase_prices: String,
    /// Vendor invoices carrying freight
    pub vendor_invoice: String,
    /// Sales transactions
    pub sales: String,
    /// Destination summary table
    pub summary: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            purchases: "purchases".to_string(),
            purchase_prices: "purchase_prices".to_string(),
            vendor_invoice: "vendor_invoice".to_string(),
            sales: "sales".to_string(),
            summary: "summary_table".to_string(),
        }
    }
}

impl TableNames {
    fn validate(&self) -> Result<()> {
        let fields = [
            ("tables.purchases", &self.purchases),
            ("tables.purchase_prices", &self.purchase_prices),
            ("tables.vendor_invoice", &self.vendor_invoice),
            ("tables.sales", &self.sales),
            ("tables.summary", &self.summary),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(Error::invalid_value(field, "table name cannot be empty"));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Store Config
// ============================================================================

/// Relational engine behind the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreEngine {
    /// DuckDB database file (or `:memory:`)
    #[default]
    Duckdb,
    /// PostgreSQL attached through DuckDB's postgres extension
    Postgres,
}

impl std::fmt::Display for StoreEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreEngine::Duckdb => write!(f, "duckdb"),
            StoreEngine::Postgres => write!(f, "postgres"),
        }
    }
}

/// Store connection parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Engine type
    pub engine: StoreEngine,
    /// DuckDB database path
    pub path: String,
    /// Full postgres connection string (overrides the individual parameters)
    pub connection_string: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            engine: StoreEngine::Duckdb,
            path: "vendor.duckdb".to_string(),
            connection_string: None,
            host: None,
            port: None,
            database: None,
            user: None,
            password: None,
        }
    }
}

impl StoreConfig {
    /// In-memory DuckDB store
    pub fn in_memory() -> Self {
        Self {
            path: ":memory:".to_string(),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.engine == StoreEngine::Duckdb && self.path.trim().is_empty() {
            return Err(Error::invalid_value("store.path", "cannot be empty"));
        }
        Ok(())
    }

    /// Build the connection string for the configured engine
    pub fn connection_string(&self) -> String {
        match self.engine {
            StoreEngine::Duckdb => self.path.clone(),
            StoreEngine::Postgres => {
                if let Some(ref conn_str) = self.connection_string {
                    return conn_str.clone();
                }
                let host = self.host.as_deref().unwrap_or("localhost");
                let port = self.port.unwrap_or(DEFAULT_POSTGRES_PORT);
                let user = self.user.as_deref().unwrap_or("postgres");
                let password = self.password.as_deref().unwrap_or_default();
                let database = self.database.as_deref().unwrap_or("vendor_db");
                format!("postgresql://{user}:{password}@{host}:{port}/{database}")
            }
        }
    }
}
