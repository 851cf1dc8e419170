use crate::document::TypeLabel;
use crate::sources::sfs::reader::ReaderOptions;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URI_PREFIX: &str = "http://rinfo.lagrummet.se/publ/sfs/";
pub const DEFAULT_CONCEPT_BASE: &str = "http://lagen.nu/concept/";
pub const DEFAULT_REFERENCE_PREDICATE: &str = "dcterms:references";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParserConfig {
    pub linesep: String,
    pub autostrip: bool,
    pub expand_tabs: bool,
    pub tab_width: usize,
    /// Date revocations are compared against; today when unset.
    pub reference_date: Option<NaiveDate>,
    pub base_uri_prefix: String,
    pub concept_base: String,
    pub reference_predicate: String,
    pub grammar_path: Option<PathBuf>,
    pub named_laws_path: Option<PathBuf>,
    pub authorities_path: Option<PathBuf>,
    /// Extra fragment labels ("A", "B", …) that never receive ids.
    pub skip_fragment_labels: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        let reader = ReaderOptions::default();
        Self {
            linesep: reader.linesep,
            autostrip: reader.autostrip,
            expand_tabs: reader.expand_tabs,
            tab_width: reader.tab_width,
            reference_date: None,
            base_uri_prefix: DEFAULT_BASE_URI_PREFIX.to_string(),
            concept_base: DEFAULT_CONCEPT_BASE.to_string(),
            reference_predicate: DEFAULT_REFERENCE_PREDICATE.to_string(),
            grammar_path: None,
            named_laws_path: None,
            authorities_path: None,
            skip_fragment_labels: Vec::new(),
        }
    }
}

impl ParserConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content =
            fs::read_to_string(path).map_err(|e| format!("Failed to read parser config: {e}"))?;
        let config: ParserConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse parser config: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.linesep.is_empty() {
            return Err("linesep must not be empty".to_string());
        }
        if let Some(label) = self
            .skip_fragment_labels
            .iter()
            .find(|label| TypeLabel::parse(label).is_none())
        {
            return Err(format!("Unknown fragment label {label:?}"));
        }
        Ok(())
    }

    pub fn reader_options(&self) -> ReaderOptions {
        ReaderOptions {
            linesep: self.linesep.clone(),
            autostrip: self.autostrip,
            expand_tabs: self.expand_tabs,
            tab_width: self.tab_width,
        }
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    pub fn skipped_labels(&self) -> Vec<TypeLabel> {
        self.skip_fragment_labels
            .iter()
            .filter_map(|label| TypeLabel::parse(label))
            .collect()
    }

    /// URI of the statute `sfs_id`, e.g. `…/publ/sfs/1998:204`.
    pub fn document_uri(&self, sfs_id: &str) -> String {
        let law = crate::sources::sfs::cross_references::normalize_law(sfs_id);
        format!("{}{}", self.base_uri_prefix, law)
    }
}
