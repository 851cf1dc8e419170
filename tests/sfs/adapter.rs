use crate::common::{date, find, load_fixture, references, resources, test_config, SFS_PREFIX};
use sfs_ingest::document::{InlineRun, PredicateRef};
use sfs_ingest::ingest::ingest_batch;
use sfs_ingest::sources::adapter_for;
use sfs_ingest::sources::sfs::adapter::parse_document;
use sfs_ingest::sources::sfs::registry::{Registry, RegistryEntry};
use sfs_ingest::types::{DocumentInput, DocumentStatus, ParsedDocument, SourceKind};

fn parse_input(input: &DocumentInput, registry: &Registry) -> ParsedDocument {
    parse_document(input, &resources(), registry, &test_config()).expect("parse document")
}

fn parse_fixture(filename: &str) -> ParsedDocument {
    parse_input(
        &DocumentInput::sfs(None, load_fixture(filename)),
        &Registry::default(),
    )
}

#[test]
fn header_becomes_metadata() {
    let document = parse_fixture("lag_om_fordonsregister.txt");
    assert_eq!(document.status, DocumentStatus::Parsed);
    assert_eq!(document.uri, format!("{SFS_PREFIX}2001:558"));

    let metadata = &document.metadata;
    assert_eq!(metadata.sfs_id.as_deref(), Some("2001:558"));
    assert_eq!(
        metadata.title.as_deref(),
        Some("Lag (2001:558) om vägtrafikregister")
    );
    assert_eq!(
        metadata.department.as_deref(),
        Some("Justitiedepartementet L5")
    );
    assert_eq!(
        metadata.authority_uri.as_deref(),
        Some("http://lagen.nu/org/2008/justitiedepartementet")
    );
    assert_eq!(metadata.issued, Some(date("2001-06-14")));
    assert_eq!(metadata.amended_through.as_deref(), Some("2019:370"));
    assert_eq!(metadata.in_force, Some(date("2001-10-01")));

    let body = document.body.expect("body");
    assert_eq!(
        body.attrs.validity.and_then(|v| v.entry_into_force),
        Some(date("2001-10-01"))
    );
}

#[test]
fn fixture_fragment_ids() {
    let document = parse_fixture("lag_om_fordonsregister.txt");
    let body = document.body.expect("body");
    for id in [
        "K1", "K1P1", "K1P1S1", "K1P2", "K1P2S1", "K1P3", "K1P3S1", "K1P3T1", "K1P3T2",
        "K1P3T3", "K1P4", "K1P4S1", "K2", "K2P1", "K2P1S1", "K2P2", "K2P3", "K2P3S1",
        "L2001:558", "L2001:558S1", "L2019:370", "L2019:370S1",
    ] {
        assert!(find(&body, id).is_some(), "missing {id}");
    }
}

#[test]
fn fixture_citations_carry_the_configured_predicate() {
    let document = parse_fixture("lag_om_fordonsregister.txt");
    let body = document.body.expect("body");

    let penalty = find(&body, "K1P4S1").expect("K1P4S1");
    let links = references(penalty.runs());
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].uri, format!("{SFS_PREFIX}2001:558#K2P1"));
    assert_eq!(links[0].text, "2 kap. 1 §");
    assert_eq!(
        links[0].predicate,
        Some(PredicateRef::new("dcterms:references"))
    );

    let scope = find(&body, "K2P3S1").expect("K2P3S1");
    assert_eq!(
        references(scope.runs())[0].uri,
        format!("{SFS_PREFIX}2001:558#K1P3")
    );
}

#[test]
fn fixture_defined_terms() {
    let document = parse_fixture("lag_om_fordonsregister.txt");
    let body = document.body.expect("body");

    let definition = find(&body, "K1P2S1").expect("K1P2S1");
    let runs = definition.runs();
    let term = references(runs)
        .into_iter()
        .find(|r| r.is_defined_term)
        .expect("defined term");
    assert_eq!(term.text, "fordon");
    assert_eq!(term.uri, "http://lagen.nu/concept/Fordon");
    assert!(references(runs)
        .iter()
        .any(|r| !r.is_defined_term && r.uri == format!("{SFS_PREFIX}2001:559")));

    let register = find(&body, "K1P1S1").expect("K1P1S1");
    let terms: Vec<&str> = register
        .runs()
        .iter()
        .filter_map(|run| match run {
            InlineRun::Reference(r) if r.is_defined_term => Some(r.text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(terms, vec!["vägtrafikregister"]);
}

#[test]
fn revoked_header_short_circuits() {
    let document = parse_fixture("upphavd_forordning.txt");
    assert_eq!(
        document.status,
        DocumentStatus::Revoked {
            revoked_on: Some(date("2001-01-01"))
        }
    );
    assert!(document.body.is_none());
    assert_eq!(document.uri, format!("{SFS_PREFIX}1985:100"));
    assert_eq!(
        document.metadata.title.as_deref(),
        Some("Förordning (1985:100) om tullavgifter")
    );

    let json = serde_json::to_value(&document).unwrap();
    assert_eq!(json["status"], "revoked");
    assert_eq!(json["revoked_on"], "2001-01-01");
}

#[test]
fn registry_revocation_short_circuits() {
    let registry = Registry::from_entries([RegistryEntry {
        sfs_id: "2001:558".to_string(),
        title: None,
        entry_into_force: None,
        revoked_on: Some(date("2020-01-01")),
        changes: Vec::new(),
    }]);
    let input = DocumentInput::sfs(None, load_fixture("lag_om_fordonsregister.txt"));
    let document = parse_input(&input, &registry);
    assert_eq!(document.status.as_str(), "revoked");
    assert!(document.metadata.registry.is_some());
}

#[test]
fn future_registry_revocation_becomes_expiry() {
    let registry = Registry::from_entries([RegistryEntry {
        sfs_id: "2001:558".to_string(),
        title: None,
        entry_into_force: None,
        revoked_on: Some(date("2030-01-01")),
        changes: Vec::new(),
    }]);
    let input = DocumentInput::sfs(None, load_fixture("lag_om_fordonsregister.txt"));
    let document = parse_input(&input, &registry);
    assert_eq!(document.status, DocumentStatus::Parsed);
    let body = document.body.expect("body");
    assert_eq!(
        body.attrs.validity.and_then(|v| v.expires),
        Some(date("2030-01-01"))
    );
}

#[test]
fn missing_body_is_not_applicable() {
    let input = DocumentInput::sfs(None, "SFS nr: 2000:1\nRubrik: Lag (2000:1) om ingenting\n\n");
    let document = parse_input(&input, &Registry::default());
    assert!(matches!(
        document.status,
        DocumentStatus::NotApplicable { .. }
    ));
    assert!(document.body.is_none());
}

#[test]
fn missing_sfs_number_is_not_applicable() {
    let input = DocumentInput::sfs(None, "1 § Text.");
    let document = parse_input(&input, &Registry::default());
    assert_eq!(document.status.as_str(), "not_applicable");
    assert!(document.uri.is_empty());
}

#[test]
fn input_id_is_used_without_a_header() {
    let input = DocumentInput::sfs(Some("1999:175"), "1 § Text.\n\n2 § Se 1 §.");
    let document = parse_input(&input, &Registry::default());
    assert_eq!(document.status, DocumentStatus::Parsed);
    assert_eq!(document.uri, format!("{SFS_PREFIX}1999:175"));
    let body = document.body.expect("body");
    let see = find(&body, "P2S1").expect("P2S1");
    assert_eq!(
        references(see.runs())[0].uri,
        format!("{SFS_PREFIX}1999:175#P1")
    );
}

#[test]
fn adapter_labels_units() {
    let adapter = adapter_for(SourceKind::Sfs);
    assert_eq!(
        adapter.unit_label(&DocumentInput::sfs(Some("1998:204"), "")),
        "SFS 1998:204"
    );
    assert_eq!(
        adapter.unit_label(&DocumentInput::sfs(None, "")),
        "SFS (id from header)"
    );
}

#[test]
fn batch_counts_every_outcome() {
    let inputs = vec![
        DocumentInput::sfs(None, load_fixture("lag_om_fordonsregister.txt")),
        DocumentInput::sfs(None, load_fixture("upphavd_forordning.txt")),
        DocumentInput::sfs(None, "1 § Text utan nummer."),
    ];
    let report = ingest_batch(&inputs, &resources(), &Registry::default(), &test_config());
    assert_eq!(report.parsed, 1);
    assert_eq!(report.revoked, 1);
    assert_eq!(report.not_applicable, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(report.total(), 3);
    assert_eq!(report.documents.len(), 3);
}

#[test]
fn input_deserializes_from_camel_case_json() {
    let input: DocumentInput =
        serde_json::from_str(r#"{"source": "sfs", "sfsId": "1998:204", "text": "1 § Text."}"#)
            .unwrap();
    assert_eq!(input.source, SourceKind::Sfs);
    assert_eq!(input.sfs_id.as_deref(), Some("1998:204"));
}
