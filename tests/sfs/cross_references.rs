use crate::common::{references, resolver, uris, SFS_PREFIX};
use sfs_ingest::document::{runs_text, InlineRun, PredicateRef};
use sfs_ingest::error::ResolveError;
use sfs_ingest::sources::common::normalize_text;
use sfs_ingest::sources::sfs::cross_references::{CitationContext, ReferenceResolver};
use sfs_ingest::sources::sfs::escape::{descape, escape};
use sfs_ingest::sources::sfs::grammar::CitationGrammar;
use sfs_ingest::sources::sfs::named_laws::NamedLawTable;
use std::sync::Arc;

fn resolve(text: &str, base: &str) -> Vec<InlineRun> {
    resolver().parse(text, base, None).expect("resolve")
}

fn sfs(path: &str) -> String {
    format!("{SFS_PREFIX}{path}")
}

#[test]
fn same_law_resolves_internally_against_the_base() {
    let runs = resolve("1 § samma lag", &sfs("1962:700#K2"));
    assert_eq!(uris(&runs), vec![sfs("1962:700#K2P1")]);
    assert_eq!(runs_text(&runs), "1 § samma lag");
}

#[test]
fn elliptical_section_inherits_law_and_chapter() {
    let runs = resolve("7 §", &sfs("1998:204#K3P5"));
    assert_eq!(uris(&runs), vec![sfs("1998:204#K3P7")]);
}

#[test]
fn chapter_and_section_in_running_text() {
    let runs = resolve(
        "Bestämmelser finns i 2 kap. 1 § och i 5 kap.",
        &sfs("2001:558#K1P4"),
    );
    assert_eq!(
        uris(&runs),
        vec![sfs("2001:558#K2P1"), sfs("2001:558#K5")]
    );
    assert_eq!(
        runs_text(&runs),
        "Bestämmelser finns i 2 kap. 1 § och i 5 kap."
    );
}

#[test]
fn explicit_law_with_number() {
    let runs = resolve(
        "enligt 3 § lagen (1994:1009) om ersättning",
        &sfs("2001:558#K1P1"),
    );
    assert_eq!(uris(&runs), vec![sfs("1994:1009#P3")]);
    let found = references(&runs);
    assert_eq!(found[0].text, "3 § lagen (1994:1009)");
}

#[test]
fn named_law_is_looked_up() {
    let runs = resolve("Straff enligt 3 kap. 1 § brottsbalken.", &sfs("2001:558"));
    assert_eq!(uris(&runs), vec![sfs("1962:700#K3P1")]);
}

#[test]
fn unknown_named_law_stays_plain_text() {
    let runs = resolve("enligt 4 § påhittadebalken", &sfs("2001:558"));
    assert!(uris(&runs).is_empty());
    assert_eq!(runs_text(&runs), "enligt 4 § påhittadebalken");
}

#[test]
fn later_citations_inherit_from_earlier_ones() {
    let runs = resolve(
        "Se 2 kap. 3 § brottsbalken och 5 § samma lag.",
        &sfs("2001:558#K1P1"),
    );
    assert_eq!(
        uris(&runs),
        vec![sfs("1962:700#K2P3"), sfs("1962:700#K2P5")]
    );
}

#[test]
fn piece_and_item_components() {
    let runs = resolve("enligt 4 § andra stycket 3 punkten", &sfs("2001:558#K1"));
    assert_eq!(uris(&runs), vec![sfs("2001:558#K1P4S2N3")]);
}

#[test]
fn section_list_links_every_number() {
    let runs = resolve("enligt 4 och 5 §§", &sfs("2001:558#K2P1"));
    assert_eq!(
        uris(&runs),
        vec![sfs("2001:558#K2P4"), sfs("2001:558#K2P5")]
    );
    let texts: Vec<&str> = references(&runs).iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["4", "5 §§"]);
    assert_eq!(runs_text(&runs), "enligt 4 och 5 §§");
}

#[test]
fn predicate_is_attached_to_links() {
    let predicate = PredicateRef::new("rpubl:ersatter");
    let runs = resolver()
        .parse("5 §", &sfs("2001:558#K1"), Some(&predicate))
        .unwrap();
    assert_eq!(references(&runs)[0].predicate.as_ref(), Some(&predicate));
}

#[test]
fn malformed_base_uri_leaves_internal_citations_unresolved() {
    let runs = resolve("enligt 7 §", "not a uri");
    assert!(uris(&runs).is_empty());
    assert_eq!(runs_text(&runs), "enligt 7 §");
}

#[test]
fn context_is_reset_for_each_call() {
    let resolver = resolver();
    let first = resolver
        .parse("3 kap. 1 § brottsbalken", &sfs("2001:558#K1"), None)
        .unwrap();
    let second = resolver.parse("2 §", &sfs("2001:558#K1"), None).unwrap();
    assert_eq!(uris(&first), vec![sfs("1962:700#K3P1")]);
    assert_eq!(uris(&second), vec![sfs("2001:558#K1P2")]);
}

#[test]
fn explicit_context_threads_across_calls() {
    let resolver = resolver();
    let mut context = CitationContext::from_base_uri(&sfs("2001:558#K1"));
    resolver
        .parse_with_context("3 kap. 1 § brottsbalken", &mut context, None)
        .unwrap();
    let runs = resolver.parse_with_context("2 §", &mut context, None).unwrap();
    assert_eq!(uris(&runs), vec![sfs("1962:700#K3P2")]);
}

#[test]
fn text_is_preserved() {
    let inputs = [
        "Bestämmelser   om  avgifter finns i\n2 kap. 1 §.",
        "enligt skatte- och avgiftslagen (1997:483)",
        "Se 4–6 §§ och 2 kap. lagen (1998:204) om personuppgifter.",
        "Ingen hänvisning här.",
    ];
    for input in inputs {
        let runs = resolve(input, &sfs("2001:558#K1P1"));
        assert_eq!(runs_text(&runs), normalize_text(input), "{input:?}");
    }
}

#[test]
fn escape_round_trip() {
    let inputs = [
        "skatte- och avgiftslagen",
        "brottsbalkens 3 kap.",
        "lagen och balken",
        "tull- eller skattelagstiftningen",
        "",
    ];
    for input in inputs {
        assert_eq!(descape(&escape(input)), input);
    }
}

#[test]
fn zero_length_rule_is_a_parse_error() {
    let grammar = CitationGrammar::parse("@version 1\nEmptyRef = (?P<section>\\d*)").unwrap();
    let resolver = ReferenceResolver::new(
        Arc::new(grammar),
        Arc::new(NamedLawTable::default()),
        SFS_PREFIX,
    );
    let err = resolver
        .parse("abc", &sfs("2001:558"), None)
        .unwrap_err();
    assert_eq!(err, ResolveError::Parse { consumed: 0, total: 3 });
}
