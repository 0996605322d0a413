//! Read-only access to the legacy desktop database export.
//!
//! The legacy system is a single-file Access database. We never link
//! against it directly: the `mdbtools` binaries (`mdb-tables`,
//! `mdb-export`) do the driving, and their CSV output is parsed into
//! plain in-memory tables of strings. The file is small enough that whole
//! tables fit in memory comfortably, which keeps the transfer loop simple.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

/// Failures talking to the legacy export. All of these are structural:
/// if the export tool is missing or a table cannot be read, the run
/// cannot meaningfully continue.
#[derive(Debug, thiserror::Error)]
pub enum LegacyError {
    #[error("legacy database file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to spawn {tool}: {source}")]
    ToolSpawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed for {table:?}: {stderr}")]
    ExportFailed {
        tool: String,
        table: String,
        stderr: String,
    },

    #[error("table {0:?} not present in legacy export")]
    MissingTable(String),

    #[error("malformed CSV from legacy export: {0}")]
    Csv(#[from] csv::Error),
}

/// One legacy table held fully in memory. Every cell is a string; blank
/// cells read back as `None`.
#[derive(Debug, Clone)]
pub struct LegacyTable {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl LegacyTable {
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Cell value at (row, column). `None` when the column does not exist
    /// in the export or the cell is blank — both read as NULL downstream.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        let raw = self.rows.get(row)?.get(idx)?;
        if raw.is_empty() {
            None
        } else {
            Some(raw.as_str())
        }
    }
}

/// Handle on the legacy database file plus the export tooling used to
/// read it.
pub struct LegacyDatabase {
    path: PathBuf,
    export_bin: String,
    tables_bin: String,
}

impl LegacyDatabase {
    pub fn open(
        path: impl AsRef<Path>,
        export_bin: impl Into<String>,
        tables_bin: impl Into<String>,
    ) -> Result<Self, LegacyError> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(LegacyError::FileNotFound(path));
        }
        Ok(Self {
            path,
            export_bin: export_bin.into(),
            tables_bin: tables_bin.into(),
        })
    }

    /// List the table names in the export.
    pub fn table_names(&self) -> Result<Vec<String>, LegacyError> {
        let output = Command::new(&self.tables_bin)
            .arg("-1")
            .arg(&self.path)
            .output()
            .map_err(|source| LegacyError::ToolSpawn {
                tool: self.tables_bin.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(LegacyError::ExportFailed {
                tool: self.tables_bin.clone(),
                table: String::new(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Export one table in full.
    ///
    /// `mdb-export` writes CSV with a header row; its default date format
    /// (`MM/DD/YY HH:MM:SS`) is one of the formats the date converter
    /// recognizes, so no format flag is passed.
    pub fn read_table(&self, table: &str) -> Result<LegacyTable, LegacyError> {
        if !self.table_names()?.iter().any(|t| t == table) {
            return Err(LegacyError::MissingTable(table.to_string()));
        }

        let output = Command::new(&self.export_bin)
            .arg(&self.path)
            .arg(table)
            .output()
            .map_err(|source| LegacyError::ToolSpawn {
                tool: self.export_bin.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(LegacyError::ExportFailed {
                tool: self.export_bin.clone(),
                table: table.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(output.stdout.as_slice());

        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        debug!(table, rows = rows.len(), "read legacy table");
        Ok(LegacyTable::new(table, columns, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LegacyTable {
        LegacyTable::new(
            "Sources",
            vec!["ID".into(), "SourceName".into(), "Active".into()],
            vec![
                vec!["1".into(), "Word of mouth".into(), "1".into()],
                vec!["2".into(), "Phone book".into(), "".into()],
            ],
        )
    }

    #[test]
    fn blank_cells_read_as_none() {
        let t = sample();
        assert_eq!(t.value(0, "Active"), Some("1"));
        assert_eq!(t.value(1, "Active"), None);
    }

    #[test]
    fn missing_columns_read_as_none() {
        let t = sample();
        assert_eq!(t.value(0, "NoSuchColumn"), None);
    }

    #[test]
    fn out_of_range_rows_read_as_none() {
        let t = sample();
        assert_eq!(t.value(99, "ID"), None);
    }
}
