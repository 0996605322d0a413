//! Schema materializer: drop and recreate the normalized destination
//! schema.
//!
//! This is a one-time cutover tool, so there is no diffing and no
//! incremental ALTER — every run drops the tables it owns and recreates
//! them from the fixed DDL below. The `users` table is included because
//! the recreate would otherwise orphan application accounts; the identity
//! preservation step (`accounts`) exists to carry them across.

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

/// Destination tables in creation order (parents before children).
/// Drops run in reverse.
pub const DESTINATION_TABLES: [&str; 9] = [
    "users",
    "awning_types",
    "sources",
    "customers",
    "work_orders",
    "work_order_items",
    "repair_orders",
    "repair_order_items",
    "inventory_items",
];

const CREATE_STATEMENTS: [&str; 9] = [
    r#"
    CREATE TABLE users (
        id SERIAL PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        display_name TEXT,
        is_admin BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        last_login TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE TABLE awning_types (
        id INTEGER PRIMARY KEY,
        type_name TEXT,
        description TEXT
    )
    "#,
    r#"
    CREATE TABLE sources (
        id INTEGER PRIMARY KEY,
        source_name TEXT,
        active BOOLEAN
    )
    "#,
    r#"
    CREATE TABLE customers (
        id INTEGER PRIMARY KEY,
        company_name TEXT,
        contact_name TEXT,
        address TEXT,
        city TEXT,
        state TEXT,
        zip TEXT,
        phone TEXT,
        email TEXT,
        source_id INTEGER REFERENCES sources(id),
        date_added DATE,
        tax_exempt BOOLEAN,
        credit_limit NUMERIC(10, 2)
    )
    "#,
    r#"
    CREATE TABLE work_orders (
        id INTEGER PRIMARY KEY,
        customer_id INTEGER REFERENCES customers(id),
        wo_number TEXT,
        date_in DATE,
        date_promised DATE,
        date_completed DATE,
        rush_order BOOLEAN,
        price NUMERIC(10, 2),
        deposit NUMERIC(10, 2),
        paid BOOLEAN,
        notes TEXT
    )
    "#,
    r#"
    CREATE TABLE work_order_items (
        id INTEGER PRIMARY KEY,
        work_order_id INTEGER REFERENCES work_orders(id),
        awning_type_id INTEGER REFERENCES awning_types(id),
        quantity INTEGER,
        description TEXT,
        unit_price NUMERIC(10, 2),
        cleaned BOOLEAN,
        repaired BOOLEAN
    )
    "#,
    r#"
    CREATE TABLE repair_orders (
        id INTEGER PRIMARY KEY,
        customer_id INTEGER REFERENCES customers(id),
        ro_number TEXT,
        wo_number TEXT,
        date_in TIMESTAMP,
        date_completed TIMESTAMP,
        estimated_cost NUMERIC(10, 2),
        actual_cost NUMERIC(10, 2),
        approved BOOLEAN
    )
    "#,
    r#"
    CREATE TABLE repair_order_items (
        id INTEGER PRIMARY KEY,
        repair_order_id INTEGER REFERENCES repair_orders(id),
        description TEXT,
        hours NUMERIC(10, 2),
        parts_cost NUMERIC(10, 2),
        completed BOOLEAN
    )
    "#,
    r#"
    CREATE TABLE inventory_items (
        id INTEGER PRIMARY KEY,
        part_number TEXT,
        description TEXT,
        quantity_on_hand INTEGER,
        unit_cost NUMERIC(10, 2),
        reorder_point INTEGER,
        last_ordered DATE
    )
    "#,
];

/// Drop and recreate every destination table.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    for table in DESTINATION_TABLES.iter().rev() {
        sqlx::query(&format!("DROP TABLE IF EXISTS {} CASCADE", table))
            .execute(pool)
            .await
            .with_context(|| format!("Failed to drop {}", table))?;
    }

    for (table, ddl) in DESTINATION_TABLES.iter().copied().zip(CREATE_STATEMENTS) {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to create {}", table))?;
        info!(table, "created");
    }

    info!("Destination schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::migration_manifest;

    #[test]
    fn every_manifest_table_has_ddl() {
        for spec in migration_manifest() {
            assert!(
                DESTINATION_TABLES.contains(&spec.dest),
                "{} has no CREATE statement",
                spec.dest
            );
        }
    }

    #[test]
    fn ddl_covers_every_manifest_column() {
        for spec in migration_manifest() {
            let idx = DESTINATION_TABLES
                .iter()
                .position(|t| *t == spec.dest)
                .unwrap();
            let ddl = CREATE_STATEMENTS[idx];
            for col in &spec.columns {
                assert!(
                    ddl.contains(col.dest),
                    "{}.{} missing from DDL",
                    spec.dest,
                    col.dest
                );
            }
        }
    }
}
