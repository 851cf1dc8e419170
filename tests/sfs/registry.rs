use crate::common::{date, parse, resolver, uris, SFS_PREFIX};
use sfs_ingest::document::{NodeKind, PredicateRef};
use sfs_ingest::sources::sfs::registry::{
    link_registry, ChangeCategory, ChangeRecord, Registry, RegistryEntry,
};
use std::io::Write;

const DOC_URI: &str = "http://rinfo.lagrummet.se/publ/sfs/2001:558";

fn entry(sfs_id: &str, changes: Vec<ChangeRecord>) -> RegistryEntry {
    RegistryEntry {
        sfs_id: sfs_id.to_string(),
        title: Some(format!("Lag ({sfs_id}) om ändring i lagen (2001:558) om vägtrafikregister")),
        entry_into_force: Some(date("2019-07-01")),
        revoked_on: None,
        changes,
    }
}

#[test]
fn load_from_file_reads_entries() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[
            {{"sfs_id": "2019:370", "entry_into_force": "2019-07-01",
              "changes": [{{"category": "amended", "text": "2 kap. 1 §"}}]}},
            {{"sfs_id": "1985:100", "revoked_on": "2001-01-01"}}
        ]"#
    )
    .unwrap();

    let registry = Registry::load_from_file(file.path()).unwrap();
    assert_eq!(registry.len(), 2);
    let amendment = registry.get(" 2019:370 ").expect("trimmed lookup");
    assert_eq!(amendment.entry_into_force, Some(date("2019-07-01")));
    assert_eq!(amendment.changes[0].category, ChangeCategory::Amended);
    assert_eq!(
        registry.get("1985:100").and_then(|e| e.revoked_on),
        Some(date("2001-01-01"))
    );
    assert!(registry.get("1999:1").is_none());
}

#[test]
fn load_from_file_reports_bad_json() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{not json").unwrap();
    let err = Registry::load_from_file(file.path()).unwrap_err();
    assert!(err.starts_with("Failed to parse registry"), "{err}");

    let err = Registry::load_from_file("/nonexistent/registry.json").unwrap_err();
    assert!(err.starts_with("Failed to read registry"), "{err}");
}

#[test]
fn change_categories_map_to_predicates() {
    assert_eq!(
        ChangeCategory::Amended.predicate(),
        PredicateRef::new("rpubl:ersatter")
    );
    assert_eq!(
        ChangeCategory::Inserted.predicate(),
        PredicateRef::new("rpubl:inforsI")
    );
    assert_eq!(
        ChangeCategory::Revoked.predicate(),
        PredicateRef::new("rpubl:upphaver")
    );
}

#[test]
fn transitional_provisions_are_linked() {
    let mut act = parse(
        "1 kap. Inledning\n\n1 § Text.\n\nÖvergångsbestämmelser\n\n2001:558\n\nDenna lag träder i kraft den 1 oktober 2001.\n\n2019:370\n\nDenna lag träder i kraft den 1 juli 2019.",
    );
    let registry = Registry::from_entries([entry(
        "2019:370",
        vec![
            ChangeRecord {
                category: ChangeCategory::Amended,
                text: "ändr. 2 kap. 1 §".to_string(),
            },
            ChangeRecord {
                category: ChangeCategory::Inserted,
                text: "nya 1 kap. 5 §".to_string(),
            },
        ],
    )]);

    let linked = link_registry(&mut act, &registry, &resolver(), DOC_URI).unwrap();
    assert_eq!(linked, 1);

    let provisions = &act.children()[1];
    assert_eq!(
        provisions.children()[0].kind,
        NodeKind::TransitionalProvision { amendment: None }
    );
    let NodeKind::TransitionalProvision {
        amendment: Some(link),
    } = &provisions.children()[1].kind
    else {
        panic!("expected a linked provision");
    };
    assert_eq!(link.sfs_id, "2019:370");
    assert_eq!(link.entry_into_force, Some(date("2019-07-01")));
    assert_eq!(link.changes.len(), 2);
    assert_eq!(
        uris(&link.changes[0].runs),
        vec![format!("{SFS_PREFIX}2001:558#K2P1")]
    );
    assert_eq!(
        uris(&link.changes[1].runs),
        vec![format!("{SFS_PREFIX}2001:558#K1P5")]
    );
    let inserted = crate::common::references(&link.changes[1].runs);
    assert_eq!(
        inserted[0].predicate,
        Some(PredicateRef::new("rpubl:inforsI"))
    );
}

#[test]
fn linking_twice_keeps_the_first_link() {
    let mut act = parse("1 § Text.\n\nÖvergångsbestämmelser\n\n2019:370\n\nDenna lag träder i kraft.");
    let registry = Registry::from_entries([entry("2019:370", Vec::new())]);
    let resolver = resolver();
    assert_eq!(link_registry(&mut act, &registry, &resolver, DOC_URI).unwrap(), 1);
    assert_eq!(link_registry(&mut act, &registry, &resolver, DOC_URI).unwrap(), 0);
}
