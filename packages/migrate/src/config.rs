use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Tool configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Destination PostgreSQL connection string.
    pub database_url: String,
    /// Path to the legacy Access database file. Only the steps that read
    /// the legacy export need it.
    pub legacy_db_path: Option<String>,
    /// Directory holding account snapshot files.
    pub snapshot_dir: String,
    /// mdbtools binaries, overridable for non-standard installs.
    pub mdb_export_bin: String,
    pub mdb_tables_bin: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            legacy_db_path: env::var("LEGACY_DB_PATH").ok(),
            snapshot_dir: env::var("SNAPSHOT_DIR")
                .unwrap_or_else(|_| "./snapshots".to_string()),
            mdb_export_bin: env::var("MDB_EXPORT_BIN")
                .unwrap_or_else(|_| "mdb-export".to_string()),
            mdb_tables_bin: env::var("MDB_TABLES_BIN")
                .unwrap_or_else(|_| "mdb-tables".to_string()),
        })
    }

    /// The legacy database path, required by audit and transfer.
    pub fn require_legacy_db_path(&self) -> Result<&str> {
        self.legacy_db_path
            .as_deref()
            .context("LEGACY_DB_PATH must be set for this step")
    }
}
