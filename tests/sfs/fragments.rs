use crate::common::{find, fragment_ids, parse, resolver, uris, SFS_PREFIX};
use sfs_ingest::document::{DocumentNode, InlineRun, NodeKind, TypeLabel};
use sfs_ingest::sources::sfs::definitions::DefinitionFinder;
use sfs_ingest::sources::sfs::fragments::FragmentIdAssigner;

const DOC_URI: &str = "http://rinfo.lagrummet.se/publ/sfs/2001:558";

fn assign(root: &mut DocumentNode) {
    let resolver = resolver();
    FragmentIdAssigner::new(
        &resolver,
        DefinitionFinder::new("http://lagen.nu/concept/"),
        DOC_URI,
        None,
    )
    .assign(root)
    .expect("assign");
}

fn assigned(text: &str) -> DocumentNode {
    let mut act = parse(text);
    assign(&mut act);
    act
}

#[test]
fn ids_follow_the_hierarchy() {
    let act = assigned(
        "1 kap. Inledning\n\n1 § Lagen gäller fordon.\n\nDen gäller även släp.\n\n2 § Text.\n\n2 kap. Ansvar\n\n1 § Text.",
    );
    assert_eq!(
        fragment_ids(&act),
        vec!["K1", "K1P1", "K1P1S1", "K1P1S2", "K1P2", "K1P2S1", "K2", "K2P1", "K2P1S1"]
    );
}

#[test]
fn unlabeled_nodes_pass_their_prefix_through() {
    let act = assigned("1 § Med fordon avses\n\n1. bil,\n\n2. motorcykel.\n\nTredje stycket.");
    let ids = fragment_ids(&act);
    assert_eq!(ids, vec!["P1", "P1S1", "P1N1", "P1N2", "P1S2"]);
}

#[test]
fn letter_items_use_their_letters() {
    let act = assigned("1 § Avser\n\na) bil,\n\nb) båt.");
    assert!(find(&act, "P1Na").is_some());
    assert!(find(&act, "P1Nb").is_some());
}

#[test]
fn divisions_are_skipped_when_sections_run_through_the_act() {
    let act = assigned(
        "AVD. I ALLMÄNNA\n\n1 kap. Om brott\n\n1 § Text.\n\nAVD. II SÄRSKILDA\n\n2 kap. Om mord\n\n2 § Text.",
    );
    let ids = fragment_ids(&act);
    assert!(ids.iter().all(|id| !id.starts_with('A')), "{ids:?}");
    assert!(ids.contains(&"K2P2".to_string()));
}

#[test]
fn divisions_get_ids_when_section_numbering_restarts() {
    let act = assigned(
        "AVD. I ALLMÄNNA\n\n1 kap. Om brott\n\n1 § Text.\n\nAVD. II SÄRSKILDA\n\n2 kap. Om mord\n\n1 § Text.",
    );
    let ids = fragment_ids(&act);
    assert!(ids.contains(&"AIK1P1".to_string()), "{ids:?}");
    assert!(ids.contains(&"AIIK2P1".to_string()), "{ids:?}");
}

#[test]
fn configured_labels_are_skipped() {
    let resolver = resolver();
    let mut act = parse("1 § Text.\n\nAndra stycket.");
    FragmentIdAssigner::new(
        &resolver,
        DefinitionFinder::new("http://lagen.nu/concept/"),
        DOC_URI,
        None,
    )
    .with_skipped_labels([TypeLabel::Paragraph])
    .assign(&mut act)
    .unwrap();
    assert_eq!(fragment_ids(&act), vec!["P1"]);
}

#[test]
fn transitional_provisions_use_the_amendment_id() {
    let act = assigned("1 § Text.\n\nÖvergångsbestämmelser\n\n2005:10\n\nDenna lag träder i kraft.");
    assert!(find(&act, "L2005:10").is_some());
    assert!(find(&act, "L2005:10S1").is_some());
}

#[test]
fn table_rows_are_counted() {
    let act = assigned("1 § Avgifter.\n\nName      Age   City\nAnn       30    Lund");
    assert!(find(&act, "P1T1").is_some());
    assert!(find(&act, "P1T2").is_some());
}

#[test]
fn citations_use_the_enclosing_position_as_base() {
    let act = assigned("3 kap. Tillsyn\n\n5 § Text.\n\n6 § Som anges i 5 § gäller.");
    let paragraph = find(&act, "K3P6S1").expect("paragraph");
    assert_eq!(
        uris(paragraph.runs()),
        vec![format!("{SFS_PREFIX}2001:558#K3P5")]
    );
}

#[test]
fn reassigning_is_idempotent() {
    let mut act = assigned(
        "1 kap. Inledning\n\n1 § I denna lag avses med fordon ett motordrivet fordon.\n\n2 § Se 1 §.",
    );
    let first = act.clone();
    assign(&mut act);
    assert_eq!(act, first);
}

#[test]
fn explicit_definition_is_annotated_once_per_section() {
    let act = assigned(
        "1 § I denna lag avses med fordon ett motordrivet transportmedel.\n\nMed släpvagn avses ett fordon utan motor.\n\n2 § Med terrängfordon avses fordon för terräng.",
    );
    let terms: Vec<(String, String)> = collect_terms(&act);
    assert_eq!(
        terms,
        vec![
            ("fordon".to_string(), "http://lagen.nu/concept/Fordon".to_string()),
            (
                "terrängfordon".to_string(),
                "http://lagen.nu/concept/Terrängfordon".to_string()
            ),
        ]
    );
}

#[test]
fn term_list_items_are_annotated() {
    let act = assigned(
        "1 § I denna lag avses med:\n\n1. fordon: ett motordrivet transportmedel,\n\n2. släp: ett fordon utan motor.",
    );
    let terms: Vec<String> = collect_terms(&act).into_iter().map(|(t, _)| t).collect();
    assert_eq!(terms, vec!["fordon", "släp"]);
}

#[test]
fn criminal_and_parenthetical_terms() {
    let act = assigned(
        "1 § Den som olovligen tar en bil döms för tillgrepp av fortskaffningsmedel till fängelse.\n\n2 § Den som bedriver handel (handlare) ska anmäla det.",
    );
    let terms: Vec<String> = collect_terms(&act).into_iter().map(|(t, _)| t).collect();
    assert_eq!(terms, vec!["tillgrepp av fortskaffningsmedel", "handlare"]);
}

fn collect_terms(root: &DocumentNode) -> Vec<(String, String)> {
    let mut terms = Vec::new();
    root.walk(&mut |node| {
        if !matches!(node.kind, NodeKind::Paragraph | NodeKind::ListItem) {
            return;
        }
        for run in node.runs() {
            if let InlineRun::Reference(reference) = run {
                if reference.is_defined_term {
                    terms.push((reference.text.clone(), reference.uri.clone()));
                }
            }
        }
    });
    terms
}
