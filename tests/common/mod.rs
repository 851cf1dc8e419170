#![allow(dead_code)]
use chrono::NaiveDate;
use sfs_ingest::document::{DocumentNode, InlineRun, ResolvedReference};
use sfs_ingest::runtime::types::ParserResources;
use sfs_ingest::sources::configs::ParserConfig;
use sfs_ingest::sources::sfs::cross_references::ReferenceResolver;
use sfs_ingest::sources::sfs::parser::parse_body;
use sfs_ingest::sources::sfs::reader::TextCursor;
use std::path::Path;

pub const SFS_PREFIX: &str = "http://rinfo.lagrummet.se/publ/sfs/";

pub fn fixtures_dir() -> String {
    format!("{}/tests/fixtures/sfs", env!("CARGO_MANIFEST_DIR"))
}

pub fn load_fixture(filename: &str) -> String {
    let path = Path::new(&fixtures_dir()).join(filename);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e))
}

pub fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

/// Default config pinned to a fixed reference date.
pub fn test_config() -> ParserConfig {
    ParserConfig {
        reference_date: Some(date("2026-01-01")),
        ..ParserConfig::default()
    }
}

pub fn resources() -> ParserResources {
    ParserResources::embedded().expect("embedded resources")
}

pub fn resolver() -> ReferenceResolver {
    resources().resolver(&test_config())
}

pub fn parse(text: &str) -> DocumentNode {
    parse_body(TextCursor::from_text(text)).expect("structural parse")
}

pub fn references(runs: &[InlineRun]) -> Vec<&ResolvedReference> {
    runs.iter()
        .filter_map(|run| match run {
            InlineRun::Reference(reference) => Some(reference),
            InlineRun::Text(_) => None,
        })
        .collect()
}

pub fn uris(runs: &[InlineRun]) -> Vec<String> {
    references(runs).iter().map(|r| r.uri.clone()).collect()
}

/// Fragment ids in document order.
pub fn fragment_ids(root: &DocumentNode) -> Vec<String> {
    let mut ids = Vec::new();
    root.walk(&mut |node| {
        if let Some(id) = node.fragment_id() {
            ids.push(id.to_string());
        }
    });
    ids
}

pub fn find<'a>(root: &'a DocumentNode, id: &str) -> Option<&'a DocumentNode> {
    let mut found = None;
    root.walk(&mut |node| {
        if found.is_none() && node.fragment_id() == Some(id) {
            found = Some(node);
        }
    });
    found
}
