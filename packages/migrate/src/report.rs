//! Run summary for a transfer: per-table row counts and conversion
//! failure tallies.
//!
//! The acceptance check for a migration run is row-count parity against
//! the legacy source plus operator spot checks, so this report is the
//! primary artifact the operator reads after `transfer` finishes.

use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Outcome of transferring one table.
#[derive(Debug, Clone)]
pub struct TableReport {
    /// Destination table name.
    pub table: String,
    /// Rows read from the legacy export.
    pub legacy_rows: u64,
    /// Rows inserted into the destination.
    pub inserted: u64,
    /// Unrecognized-value tallies keyed by legacy column name.
    pub conversion_failures: BTreeMap<String, u64>,
}

impl TableReport {
    pub fn failure_total(&self) -> u64 {
        self.conversion_failures.values().sum()
    }

    pub fn counts_match(&self) -> bool {
        self.legacy_rows == self.inserted
    }
}

/// Outcome of a full transfer run.
#[derive(Debug, Clone, Default)]
pub struct TransferReport {
    pub tables: Vec<TableReport>,
}

impl TransferReport {
    pub fn total_inserted(&self) -> u64 {
        self.tables.iter().map(|t| t.inserted).sum()
    }

    pub fn total_failures(&self) -> u64 {
        self.tables.iter().map(|t| t.failure_total()).sum()
    }

    pub fn all_counts_match(&self) -> bool {
        self.tables.iter().all(|t| t.counts_match())
    }

    /// Plain-text summary table.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<24} {:>10} {:>10} {:>8}",
            "table", "legacy", "inserted", "nulled"
        );
        for t in &self.tables {
            let marker = if t.counts_match() { "" } else { "  << COUNT MISMATCH" };
            let _ = writeln!(
                out,
                "{:<24} {:>10} {:>10} {:>8}{}",
                t.table,
                t.legacy_rows,
                t.inserted,
                t.failure_total(),
                marker
            );
        }
        let _ = writeln!(
            out,
            "\n{} rows transferred, {} values nulled as unrecognized",
            self.total_inserted(),
            self.total_failures()
        );
        for t in &self.tables {
            for (column, count) in &t.conversion_failures {
                let _ = writeln!(out, "    {}.{}: {} unrecognized", t.table, column, count);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_is_flagged_but_not_fatal() {
        let report = TransferReport {
            tables: vec![
                TableReport {
                    table: "customers".into(),
                    legacy_rows: 10,
                    inserted: 10,
                    conversion_failures: BTreeMap::new(),
                },
                TableReport {
                    table: "work_orders".into(),
                    legacy_rows: 5,
                    inserted: 4,
                    conversion_failures: BTreeMap::from([("RushOrder".to_string(), 2)]),
                },
            ],
        };

        assert!(!report.all_counts_match());
        assert_eq!(report.total_inserted(), 14);
        assert_eq!(report.total_failures(), 2);

        let rendered = report.render();
        assert!(rendered.contains("COUNT MISMATCH"));
        assert!(rendered.contains("work_orders.RushOrder: 2 unrecognized"));
    }
}
