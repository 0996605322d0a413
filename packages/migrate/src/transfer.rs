//! Table transfer orchestrator: move every legacy row into the
//! normalized schema, one table at a time, in manifest order.
//!
//! Two failure classes are kept strictly apart. A cell that fails
//! conversion is nulled, logged with its full context, and tallied — the
//! row still transfers. A structural problem (missing table, dead
//! connection, constraint violation, unparseable primary key) aborts the
//! whole run; the fix is to repair the environment and start over from
//! `create-schema`.

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgPool, Postgres};
use tracing::{info, warn};

use crate::convert::{convert_value, ConversionOutcome, DestValue, TargetType};
use crate::legacy::{LegacyDatabase, LegacyTable};
use crate::manifest::TableSpec;
use crate::report::{TableReport, TransferReport};

/// One destination cell: a typed value or a typed null. The null carries
/// its target type because Postgres needs the bind parameter typed even
/// when it is NULL.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Value(DestValue),
    Null(TargetType),
}

/// A legacy row after conversion, ready to insert. `cells` is parallel
/// to the table spec's column list.
#[derive(Debug, Clone)]
pub struct ConvertedRow {
    pub key: i32,
    pub cells: Vec<Cell>,
    /// (legacy column, raw value) pairs that were nulled as unrecognized.
    pub failures: Vec<(String, String)>,
}

/// Convert one legacy row against its table spec.
///
/// A primary key that fails integer conversion is a structural error —
/// a null key could never satisfy the destination constraints, and a
/// row without identity cannot be referenced by anything downstream.
pub fn convert_row(spec: &TableSpec, table: &LegacyTable, row: usize) -> Result<ConvertedRow> {
    let key_raw = table.value(row, spec.key);
    let key = match convert_value(key_raw, TargetType::Integer) {
        ConversionOutcome::Converted(DestValue::Int(id)) => id,
        _ => bail!(
            "Row {} of {} has unusable primary key {:?}",
            row,
            spec.legacy,
            key_raw
        ),
    };

    let mut cells = Vec::with_capacity(spec.columns.len());
    let mut failures = Vec::new();

    for col in &spec.columns {
        let raw = table.value(row, col.legacy);
        match convert_value(raw, col.ty) {
            ConversionOutcome::Converted(v) => cells.push(Cell::Value(v)),
            ConversionOutcome::NullEmpty => cells.push(Cell::Null(col.ty)),
            ConversionOutcome::NullUnrecognized => {
                // raw is necessarily Some here; blank cells are NullEmpty.
                let raw = raw.unwrap_or_default().to_string();
                failures.push((col.legacy.to_string(), raw));
                cells.push(Cell::Null(col.ty));
            }
        }
    }

    Ok(ConvertedRow { key, cells, failures })
}

/// Build the parameterized INSERT for a table spec.
pub fn insert_sql(spec: &TableSpec) -> String {
    let columns: Vec<&str> = spec.columns.iter().map(|c| c.dest).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${}", i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        spec.dest,
        columns.join(", "),
        placeholders.join(", ")
    )
}

fn bind_cell<'q>(
    q: Query<'q, Postgres, PgArguments>,
    cell: &Cell,
) -> Query<'q, Postgres, PgArguments> {
    match cell {
        Cell::Value(DestValue::Bool(v)) => q.bind(*v),
        Cell::Value(DestValue::Date(v)) => q.bind(*v),
        Cell::Value(DestValue::DateTime(v)) => q.bind(*v),
        Cell::Value(DestValue::Int(v)) => q.bind(*v),
        Cell::Value(DestValue::Decimal(v)) => q.bind(*v),
        Cell::Value(DestValue::Text(v)) => q.bind(v.clone()),
        Cell::Null(TargetType::Boolean) => q.bind(None::<bool>),
        Cell::Null(TargetType::Date) => q.bind(None::<NaiveDate>),
        Cell::Null(TargetType::DateTime) => q.bind(None::<NaiveDateTime>),
        Cell::Null(TargetType::Integer) => q.bind(None::<i32>),
        Cell::Null(TargetType::Decimal) => q.bind(None::<Decimal>),
        Cell::Null(TargetType::Text) => q.bind(None::<String>),
    }
}

/// Transfer one table: read it whole, convert row by row, insert
/// preserving the legacy primary key.
async fn transfer_table(
    db: &LegacyDatabase,
    pool: &PgPool,
    spec: &TableSpec,
) -> Result<TableReport> {
    let table = db
        .read_table(spec.legacy)
        .with_context(|| format!("Failed to read legacy table {}", spec.legacy))?;

    info!(
        table = spec.legacy,
        rows = table.row_count(),
        dest = spec.dest,
        "Transferring"
    );

    let sql = insert_sql(spec);
    let mut report = TableReport {
        table: spec.dest.to_string(),
        legacy_rows: table.row_count() as u64,
        inserted: 0,
        conversion_failures: Default::default(),
    };

    for row in 0..table.row_count() {
        let converted = convert_row(spec, &table, row)?;

        for (column, raw) in &converted.failures {
            warn!(
                table = spec.legacy,
                column = column.as_str(),
                row_id = converted.key,
                raw = raw.as_str(),
                "Unrecognized value nulled"
            );
            *report
                .conversion_failures
                .entry(column.clone())
                .or_insert(0) += 1;
        }

        let mut q = sqlx::query(&sql);
        for cell in &converted.cells {
            q = bind_cell(q, cell);
        }
        q.execute(pool).await.with_context(|| {
            format!(
                "Failed to insert row {} into {}",
                converted.key, spec.dest
            )
        })?;
        report.inserted += 1;
    }

    let dest_count: i64 =
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", spec.dest))
            .fetch_one(pool)
            .await
            .with_context(|| format!("Failed to count rows in {}", spec.dest))?;

    if dest_count as u64 != report.legacy_rows {
        warn!(
            table = spec.dest,
            legacy = report.legacy_rows,
            destination = dest_count,
            "Row counts differ after transfer"
        );
    }

    Ok(report)
}

/// Run the full transfer in manifest order. Strictly sequential: child
/// tables insert foreign keys minted by the tables before them.
pub async fn run_transfer(
    db: &LegacyDatabase,
    pool: &PgPool,
    manifest: &[TableSpec],
) -> Result<TransferReport> {
    let mut report = TransferReport::default();

    for spec in manifest {
        let table_report = transfer_table(db, pool, spec).await?;
        info!(
            table = table_report.table.as_str(),
            inserted = table_report.inserted,
            nulled = table_report.failure_total(),
            "Table done"
        );
        report.tables.push(table_report);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy::LegacyTable;
    use crate::manifest::find_table;
    use std::str::FromStr;

    fn work_order_row(cells: &[&str]) -> LegacyTable {
        LegacyTable::new(
            "WorkOrders",
            vec![
                "ID".into(),
                "CustomerID".into(),
                "WONumber".into(),
                "DateIn".into(),
                "DatePromised".into(),
                "DateCompleted".into(),
                "RushOrder".into(),
                "Price".into(),
                "Deposit".into(),
                "Paid".into(),
                "Notes".into(),
            ],
            vec![cells.iter().map(|c| c.to_string()).collect()],
        )
    }

    #[test]
    fn converts_a_messy_work_order_row() {
        let spec = find_table("WorkOrders").unwrap();
        let table = work_order_row(&[
            "17",
            "4",
            "WO-1042",
            "01/10/24 00:00:00",
            "",
            "0000-00-00",
            "Y",
            "$1,200.00",
            "",
            "0",
            "hem restitched",
        ]);

        let row = convert_row(&spec, &table, 0).unwrap();
        assert_eq!(row.key, 17);
        assert!(row.failures.is_empty());

        let by_col = |name: &str| {
            let idx = spec.columns.iter().position(|c| c.legacy == name).unwrap();
            row.cells[idx].clone()
        };

        assert_eq!(by_col("RushOrder"), Cell::Value(DestValue::Bool(true)));
        assert_eq!(
            by_col("DateIn"),
            Cell::Value(DestValue::Date(
                NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
            ))
        );
        assert_eq!(
            by_col("Price"),
            Cell::Value(DestValue::Decimal(Decimal::from_str("1200.00").unwrap()))
        );
        assert_eq!(by_col("Paid"), Cell::Value(DestValue::Bool(false)));
        // Sentinel date and blank deposit both land as typed nulls.
        assert_eq!(by_col("DateCompleted"), Cell::Null(TargetType::Date));
        assert_eq!(by_col("Deposit"), Cell::Null(TargetType::Decimal));
    }

    #[test]
    fn unrecognized_values_null_the_field_not_the_row() {
        let spec = find_table("WorkOrders").unwrap();
        let table = work_order_row(&[
            "18", "4", "WO-1043", "someday", "", "", "MAYBE", "call for price", "", "1", "",
        ]);

        let row = convert_row(&spec, &table, 0).unwrap();
        assert_eq!(row.key, 18);
        assert_eq!(row.failures.len(), 3);
        let failed: Vec<&str> = row.failures.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(failed, vec!["DateIn", "RushOrder", "Price"]);

        // The row is still fully materialized, nulls in the bad spots.
        assert_eq!(row.cells.len(), spec.columns.len());
    }

    #[test]
    fn unparseable_primary_key_is_structural() {
        let spec = find_table("WorkOrders").unwrap();
        let table = work_order_row(&[
            "not-an-id", "4", "WO-1044", "", "", "", "", "", "", "", "",
        ]);
        assert!(convert_row(&spec, &table, 0).is_err());
    }

    #[test]
    fn insert_sql_matches_column_order() {
        let spec = find_table("Sources").unwrap();
        assert_eq!(
            insert_sql(&spec),
            "INSERT INTO sources (id, source_name, active) VALUES ($1, $2, $3)"
        );
    }
}
