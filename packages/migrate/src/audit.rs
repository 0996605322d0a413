//! Data quality auditor: a read-only census of the legacy values slated
//! for type conversion.
//!
//! Run before a migration to see the full universe of encodings the
//! converters will face — every distinct raw value per column with its
//! frequency, plus flags for zeroed-out date placeholders and
//! currency-formatted numerics. The auditor writes nothing anywhere and
//! is safe to run as many times as you like.

use std::collections::HashMap;
use std::fmt::Write as _;

use lazy_static::lazy_static;
use regex::Regex;

use crate::convert::{TargetType, INVALID_DATE_SENTINELS};
use crate::legacy::{LegacyDatabase, LegacyError, LegacyTable};
use crate::manifest::TableSpec;

/// Distinct values shown per column before the report truncates.
pub const TOP_VALUES: usize = 20;

lazy_static! {
    static ref CURRENCY_RE: Regex = Regex::new(
        r"^\$\s*[0-9][0-9,]*(\.[0-9]+)?$|^[0-9]{1,3}(,[0-9]{3})+(\.[0-9]+)?$"
    )
    .unwrap();
}

/// One distinct raw value and how often it occurs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueCount {
    pub value: String,
    pub count: u64,
}

/// Census of a single (table, column) pair.
#[derive(Debug, Clone)]
pub struct ColumnAudit {
    pub table: String,
    pub column: String,
    pub target: TargetType,
    /// Total rows scanned.
    pub rows: u64,
    /// Rows where the cell was blank.
    pub blank: u64,
    /// Distinct non-blank values, most frequent first, capped at
    /// [`TOP_VALUES`]. Ties break alphabetically so output is stable.
    pub top_values: Vec<ValueCount>,
    /// Count of distinct non-blank values before capping.
    pub distinct: u64,
    /// Values matching a known invalid-date placeholder.
    pub invalid_dates: u64,
    /// Values carrying currency formatting ($ or thousands separators).
    pub currency_formatted: u64,
}

/// Full audit over every typed column in the manifest.
#[derive(Debug, Clone, Default)]
pub struct AuditReport {
    pub columns: Vec<ColumnAudit>,
}

/// Census one table against its spec. Only columns with a real conversion
/// are audited; verbatim text columns and the primary key are skipped.
pub fn audit_table(table: &LegacyTable, spec: &TableSpec) -> Vec<ColumnAudit> {
    let mut audits = Vec::new();

    for col in &spec.columns {
        if col.ty == TargetType::Text || col.legacy == spec.key {
            continue;
        }

        let mut counts: HashMap<&str, u64> = HashMap::new();
        let mut blank = 0u64;
        let mut invalid_dates = 0u64;
        let mut currency = 0u64;

        for row in 0..table.row_count() {
            match table.value(row, col.legacy) {
                None => blank += 1,
                Some(raw) => {
                    let trimmed = raw.trim();
                    if trimmed.is_empty() {
                        blank += 1;
                        continue;
                    }
                    *counts.entry(trimmed).or_insert(0) += 1;
                    if INVALID_DATE_SENTINELS.contains(&trimmed) {
                        invalid_dates += 1;
                    }
                    if CURRENCY_RE.is_match(trimmed) {
                        currency += 1;
                    }
                }
            }
        }

        let distinct = counts.len() as u64;
        let mut top: Vec<ValueCount> = counts
            .into_iter()
            .map(|(value, count)| ValueCount {
                value: value.to_string(),
                count,
            })
            .collect();
        top.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
        top.truncate(TOP_VALUES);

        audits.push(ColumnAudit {
            table: table.name().to_string(),
            column: col.legacy.to_string(),
            target: col.ty,
            rows: table.row_count() as u64,
            blank,
            top_values: top,
            distinct,
            invalid_dates,
            currency_formatted: currency,
        });
    }

    audits
}

/// Run the audit across the whole manifest against the legacy export.
pub fn run_audit(
    db: &LegacyDatabase,
    manifest: &[TableSpec],
) -> Result<AuditReport, LegacyError> {
    let mut report = AuditReport::default();
    for spec in manifest {
        let table = db.read_table(spec.legacy)?;
        report.columns.extend(audit_table(&table, spec));
    }
    Ok(report)
}

impl AuditReport {
    /// Plain-text rendering for operator review.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for col in &self.columns {
            let _ = writeln!(
                out,
                "{}.{} ({}) — {} rows, {} blank, {} distinct",
                col.table,
                col.column,
                col.target.as_str(),
                col.rows,
                col.blank,
                col.distinct,
            );
            for vc in &col.top_values {
                let _ = writeln!(out, "    {:>6}  {}", vc.count, vc.value);
            }
            if col.distinct as usize > col.top_values.len() {
                let _ = writeln!(
                    out,
                    "    ... {} more distinct values",
                    col.distinct as usize - col.top_values.len()
                );
            }
            if col.invalid_dates > 0 {
                let _ = writeln!(out, "    !! {} invalid-date placeholders", col.invalid_dates);
            }
            if col.currency_formatted > 0 {
                let _ = writeln!(
                    out,
                    "    !! {} currency-formatted values",
                    col.currency_formatted
                );
            }
            let _ = writeln!(out);
        }
        out
    }
}
