//! Auditor tests over in-memory legacy tables.

use migrate_core::audit::{audit_table, TOP_VALUES};
use migrate_core::legacy::LegacyTable;
use migrate_core::manifest::find_table;

fn sources_table(active_values: &[&str]) -> LegacyTable {
    LegacyTable::new(
        "Sources",
        vec!["ID".into(), "SourceName".into(), "Active".into()],
        active_values
            .iter()
            .enumerate()
            .map(|(i, v)| vec![(i + 1).to_string(), format!("Source {}", i + 1), v.to_string()])
            .collect(),
    )
}

#[test]
fn distinct_values_ranked_by_frequency() {
    let spec = find_table("Sources").unwrap();
    let legacy = sources_table(&["1", "1", "1", "0", "0", "YES", ""]);

    let audits = audit_table(&legacy, &spec);
    assert_eq!(audits.len(), 1);

    let active = &audits[0];
    assert_eq!(active.table, "Sources");
    assert_eq!(active.column, "Active");
    assert_eq!(active.rows, 7);
    assert_eq!(active.blank, 1);
    assert_eq!(active.distinct, 3);

    let ranked: Vec<(&str, u64)> = active
        .top_values
        .iter()
        .map(|vc| (vc.value.as_str(), vc.count))
        .collect();
    assert_eq!(ranked, vec![("1", 3), ("0", 2), ("YES", 1)]);
}

#[test]
fn ties_break_alphabetically_for_stable_output() {
    let spec = find_table("Sources").unwrap();
    let legacy = sources_table(&["N", "Y", "N", "Y"]);

    let audits = audit_table(&legacy, &spec);
    let ranked: Vec<&str> = audits[0].top_values.iter().map(|vc| vc.value.as_str()).collect();
    assert_eq!(ranked, vec!["N", "Y"]);
}

#[test]
fn report_caps_at_top_values_but_counts_all_distinct() {
    let spec = find_table("Sources").unwrap();
    let many: Vec<String> = (0..TOP_VALUES + 5).map(|i| format!("V{i:03}")).collect();
    let refs: Vec<&str> = many.iter().map(String::as_str).collect();
    let legacy = sources_table(&refs);

    let audits = audit_table(&legacy, &spec);
    assert_eq!(audits[0].top_values.len(), TOP_VALUES);
    assert_eq!(audits[0].distinct as usize, TOP_VALUES + 5);
}

#[test]
fn flags_sentinel_dates_and_currency() {
    let spec = find_table("Inventory").unwrap();
    let legacy = LegacyTable::new(
        "Inventory",
        vec![
            "ID".into(),
            "PartNumber".into(),
            "Description".into(),
            "QuantityOnHand".into(),
            "UnitCost".into(),
            "ReorderPoint".into(),
            "LastOrdered".into(),
        ],
        vec![
            vec!["1".into(), "GRMT-10".into(), "".into(), "12".into(), "$4.50".into(), "5".into(), "00/00/00".into()],
            vec!["2".into(), "THRD-2".into(), "".into(), "3".into(), "1,250.00".into(), "1".into(), "06/01/23".into()],
        ],
    );

    let audits = audit_table(&legacy, &spec);
    let last_ordered = audits.iter().find(|a| a.column == "LastOrdered").unwrap();
    assert_eq!(last_ordered.invalid_dates, 1);

    let unit_cost = audits.iter().find(|a| a.column == "UnitCost").unwrap();
    assert_eq!(unit_cost.currency_formatted, 2);
}

#[test]
fn rendering_mentions_every_audited_column() {
    let spec = find_table("Sources").unwrap();
    let legacy = sources_table(&["1", "0"]);

    let mut report = migrate_core::audit::AuditReport::default();
    report.columns.extend(audit_table(&legacy, &spec));

    let rendered = report.render();
    assert!(rendered.contains("Sources.Active"));
    assert!(rendered.contains("(boolean)"));
}
