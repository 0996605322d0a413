//! The migration manifest: which legacy table maps to which destination
//! table, which columns get which target type, and the order tables must
//! transfer in.
//!
//! The manifest is the single source of truth for the pipeline. The
//! auditor walks it to know which columns to census, and the transfer
//! orchestrator walks it in order so that foreign keys always point at
//! rows that already exist. Adding a table or retyping a column is a data
//! change here, not a code reorder in the orchestrator.

use crate::convert::TargetType;

/// One legacy column and its destination.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    /// Column name in the legacy export.
    pub legacy: &'static str,
    /// Column name in the destination table.
    pub dest: &'static str,
    /// Target type; `Text` columns are carried verbatim.
    pub ty: TargetType,
}

impl ColumnSpec {
    const fn new(legacy: &'static str, dest: &'static str, ty: TargetType) -> Self {
        Self { legacy, dest, ty }
    }
}

/// One legacy table and its destination.
#[derive(Debug, Clone)]
pub struct TableSpec {
    /// Table name in the legacy export.
    pub legacy: &'static str,
    /// Table name in the destination schema.
    pub dest: &'static str,
    /// Legacy primary key column. Preserved verbatim so child-table
    /// foreign keys stay valid without a remapping step.
    pub key: &'static str,
    /// Columns to transfer, primary key included.
    pub columns: Vec<ColumnSpec>,
    /// Foreign keys as (column in this table, referenced destination
    /// table). Referenced tables must appear earlier in the manifest.
    pub references: Vec<(&'static str, &'static str)>,
}

use crate::convert::TargetType::{Boolean, Date, DateTime, Decimal, Integer, Text};

/// The full manifest, in transfer order: lookups, then parents, then
/// orders, then line items.
pub fn migration_manifest() -> Vec<TableSpec> {
    vec![
        TableSpec {
            legacy: "AwningTypes",
            dest: "awning_types",
            key: "ID",
            columns: vec![
                ColumnSpec::new("ID", "id", Integer),
                ColumnSpec::new("TypeName", "type_name", Text),
                ColumnSpec::new("Description", "description", Text),
            ],
            references: vec![],
        },
        TableSpec {
            legacy: "Sources",
            dest: "sources",
            key: "ID",
            columns: vec![
                ColumnSpec::new("ID", "id", Integer),
                ColumnSpec::new("SourceName", "source_name", Text),
                ColumnSpec::new("Active", "active", Boolean),
            ],
            references: vec![],
        },
        TableSpec {
            legacy: "Customers",
            dest: "customers",
            key: "ID",
            columns: vec![
                ColumnSpec::new("ID", "id", Integer),
                ColumnSpec::new("CompanyName", "company_name", Text),
                ColumnSpec::new("ContactName", "contact_name", Text),
                ColumnSpec::new("Address", "address", Text),
                ColumnSpec::new("City", "city", Text),
                ColumnSpec::new("State", "state", Text),
                ColumnSpec::new("Zip", "zip", Text),
                ColumnSpec::new("Phone", "phone", Text),
                ColumnSpec::new("Email", "email", Text),
                ColumnSpec::new("SourceID", "source_id", Integer),
                ColumnSpec::new("DateAdded", "date_added", Date),
                ColumnSpec::new("TaxExempt", "tax_exempt", Boolean),
                ColumnSpec::new("CreditLimit", "credit_limit", Decimal),
            ],
            references: vec![("SourceID", "sources")],
        },
        TableSpec {
            legacy: "WorkOrders",
            dest: "work_orders",
            key: "ID",
            columns: vec![
                ColumnSpec::new("ID", "id", Integer),
                ColumnSpec::new("CustomerID", "customer_id", Integer),
                ColumnSpec::new("WONumber", "wo_number", Text),
                ColumnSpec::new("DateIn", "date_in", Date),
                ColumnSpec::new("DatePromised", "date_promised", Date),
                ColumnSpec::new("DateCompleted", "date_completed", Date),
                ColumnSpec::new("RushOrder", "rush_order", Boolean),
                ColumnSpec::new("Price", "price", Decimal),
                ColumnSpec::new("Deposit", "deposit", Decimal),
                ColumnSpec::new("Paid", "paid", Boolean),
                ColumnSpec::new("Notes", "notes", Text),
            ],
            references: vec![("CustomerID", "customers")],
        },
        TableSpec {
            legacy: "WorkOrderItems",
            dest: "work_order_items",
            key: "ID",
            columns: vec![
                ColumnSpec::new("ID", "id", Integer),
                ColumnSpec::new("WorkOrderID", "work_order_id", Integer),
                ColumnSpec::new("AwningTypeID", "awning_type_id", Integer),
                ColumnSpec::new("Quantity", "quantity", Integer),
                ColumnSpec::new("Description", "description", Text),
                ColumnSpec::new("UnitPrice", "unit_price", Decimal),
                ColumnSpec::new("Cleaned", "cleaned", Boolean),
                ColumnSpec::new("Repaired", "repaired", Boolean),
            ],
            references: vec![
                ("WorkOrderID", "work_orders"),
                ("AwningTypeID", "awning_types"),
            ],
        },
        TableSpec {
            legacy: "RepairOrders",
            dest: "repair_orders",
            key: "ID",
            columns: vec![
                ColumnSpec::new("ID", "id", Integer),
                ColumnSpec::new("CustomerID", "customer_id", Integer),
                ColumnSpec::new("RONumber", "ro_number", Text),
                // Free-text cross-reference to a work order; the legacy app
                // never enforced it, so it stays a string.
                ColumnSpec::new("WONumber", "wo_number", Text),
                ColumnSpec::new("DateIn", "date_in", DateTime),
                ColumnSpec::new("DateCompleted", "date_completed", DateTime),
                ColumnSpec::new("EstimatedCost", "estimated_cost", Decimal),
                ColumnSpec::new("ActualCost", "actual_cost", Decimal),
                ColumnSpec::new("Approved", "approved", Boolean),
            ],
            references: vec![("CustomerID", "customers")],
        },
        TableSpec {
            legacy: "RepairOrderItems",
            dest: "repair_order_items",
            key: "ID",
            columns: vec![
                ColumnSpec::new("ID", "id", Integer),
                ColumnSpec::new("RepairOrderID", "repair_order_id", Integer),
                ColumnSpec::new("Description", "description", Text),
                ColumnSpec::new("Hours", "hours", Decimal),
                ColumnSpec::new("PartsCost", "parts_cost", Decimal),
                ColumnSpec::new("Completed", "completed", Boolean),
            ],
            references: vec![("RepairOrderID", "repair_orders")],
        },
        TableSpec {
            legacy: "Inventory",
            dest: "inventory_items",
            key: "ID",
            columns: vec![
                ColumnSpec::new("ID", "id", Integer),
                ColumnSpec::new("PartNumber", "part_number", Text),
                ColumnSpec::new("Description", "description", Text),
                ColumnSpec::new("QuantityOnHand", "quantity_on_hand", Integer),
                ColumnSpec::new("UnitCost", "unit_cost", Decimal),
                ColumnSpec::new("ReorderPoint", "reorder_point", Integer),
                ColumnSpec::new("LastOrdered", "last_ordered", Date),
            ],
            references: vec![],
        },
    ]
}

/// Look up a table spec by its legacy name.
pub fn find_table(legacy_name: &str) -> Option<TableSpec> {
    migration_manifest()
        .into_iter()
        .find(|t| t.legacy == legacy_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_column_is_declared_in_every_table() {
        for table in migration_manifest() {
            assert!(
                table.columns.iter().any(|c| c.legacy == table.key),
                "{} is missing its key column {}",
                table.legacy,
                table.key
            );
        }
    }

    #[test]
    fn references_point_at_earlier_tables() {
        let manifest = migration_manifest();
        for (idx, table) in manifest.iter().enumerate() {
            for (column, referenced) in &table.references {
                let target = manifest.iter().position(|t| &t.dest == referenced);
                let target =
                    target.unwrap_or_else(|| panic!("{referenced} not in manifest"));
                assert!(
                    target < idx,
                    "{}.{} references {} which transfers later",
                    table.legacy,
                    column,
                    referenced
                );
                assert!(
                    table.columns.iter().any(|c| &c.legacy == column),
                    "{}.{} is a reference but not a declared column",
                    table.legacy,
                    column
                );
            }
        }
    }
}
