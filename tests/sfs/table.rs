use crate::common::{date, parse};
use sfs_ingest::document::{DocumentNode, NodeKind};
use sfs_ingest::sources::sfs::table::TableReconstructor;

fn cells(table: &DocumentNode) -> Vec<Vec<String>> {
    table
        .children()
        .iter()
        .map(|row| row.children().iter().map(DocumentNode::text).collect())
        .collect()
}

#[test]
fn two_rows_of_three_cells() {
    let table = TableReconstructor::new().reconstruct("Name      Age   City\nAnn       30    Lund");
    assert_eq!(table.kind, NodeKind::Table);
    assert_eq!(
        cells(&table),
        vec![vec!["Name", "Age", "City"], vec!["Ann", "30", "Lund"]]
    );
}

#[test]
fn table_found_by_the_builder() {
    let act = parse("1 § Avgifter:\n\nName      Age   City\nAnn       30    Lund\n\n2 § Text.");
    let section = &act.children()[0];
    let table = &section.children()[1];
    assert_eq!(table.kind, NodeKind::Table);
    assert_eq!(table.children().len(), 2);
    assert_eq!(act.children()[1].kind, NodeKind::Section);
}

#[test]
fn rows_split_over_paragraphs_stay_in_one_table() {
    let act = parse("1 § Avgifter.\n\nName      Age   City\n\nAnn       30    Lund\n\nBo        41    Umeå");
    let table = &act.children()[0].children()[1];
    assert_eq!(table.kind, NodeKind::Table);
    assert_eq!(table.children().len(), 3);
}

#[test]
fn indented_lines_continue_the_previous_row() {
    let table = TableReconstructor::new()
        .reconstruct("Fordon    Avgift\n  med släp\nBåt       50");
    assert_eq!(
        cells(&table),
        vec![vec!["Fordon med släp", "Avgift"], vec!["Båt", "50"]]
    );
}

#[test]
fn short_rows_are_padded() {
    let table = TableReconstructor::new().reconstruct("A     B     C\nx     y");
    assert_eq!(cells(&table)[1], vec!["x", "y", ""]);
}

#[test]
fn later_rows_can_add_a_column_on_the_right() {
    let table = TableReconstructor::new().reconstruct("Namn    Värde\nAnn     30    Lund");
    assert_eq!(
        cells(&table),
        vec![vec!["Namn", "Värde", ""], vec!["Ann", "30", "Lund"]]
    );
}

#[test]
fn markers_switch_row_validity() {
    let table = TableReconstructor::new().reconstruct(
        "Avgift    Kronor\n/Upphör att gälla U:2025-01-01/\nAvgift A  100\n/Träder i kraft I:2025-01-01/\nAvgift A  150",
    );
    let rows = table.children();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].attrs.validity.is_none());
    assert_eq!(
        rows[1].attrs.validity.as_ref().and_then(|v| v.expires),
        Some(date("2025-01-01"))
    );
    assert_eq!(
        rows[2].attrs.validity.as_ref().and_then(|v| v.entry_into_force),
        Some(date("2025-01-01"))
    );
    assert_eq!(cells(&table)[2], vec!["Avgift A", "150"]);
}
