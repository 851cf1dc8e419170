//! Amendment registry records and their link to transitional provisions.

use crate::document::{DocumentNode, InlineRun, NodeKind, PredicateRef};
use crate::error::ResolveError;
use crate::sources::sfs::cross_references::ReferenceResolver;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeCategory {
    Amended,
    Inserted,
    Revoked,
    Renumbered,
}

impl ChangeCategory {
    /// Predicate attached to citations found in a change description.
    pub fn predicate(self) -> PredicateRef {
        PredicateRef::new(match self {
            ChangeCategory::Amended => "rpubl:ersatter",
            ChangeCategory::Inserted => "rpubl:inforsI",
            ChangeCategory::Revoked => "rpubl:upphaver",
            ChangeCategory::Renumbered => "rpubl:ersatter",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub category: ChangeCategory,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub sfs_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub entry_into_force: Option<NaiveDate>,
    #[serde(default)]
    pub revoked_on: Option<NaiveDate>,
    #[serde(default)]
    pub changes: Vec<ChangeRecord>,
}

/// Registry records keyed by SFS id.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: HashMap<String, RegistryEntry>,
}

impl Registry {
    pub fn from_entries<I: IntoIterator<Item = RegistryEntry>>(entries: I) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.sfs_id.clone(), entry))
                .collect(),
        }
    }

    /// Reads a JSON array of entries.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content =
            fs::read_to_string(path).map_err(|e| format!("Failed to read registry: {e}"))?;
        let entries: Vec<RegistryEntry> = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse registry: {e}"))?;
        Ok(Self::from_entries(entries))
    }

    pub fn get(&self, sfs_id: &str) -> Option<&RegistryEntry> {
        self.entries.get(sfs_id.trim())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedChange {
    pub category: ChangeCategory,
    pub runs: Vec<InlineRun>,
}

/// What a transitional provision learns from the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmendmentLink {
    pub sfs_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_into_force: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<AnnotatedChange>,
}

impl AmendmentLink {
    /// Resolves citations in each change description against `doc_uri`.
    pub fn annotate(
        entry: &RegistryEntry,
        resolver: &ReferenceResolver,
        doc_uri: &str,
    ) -> Result<Self, ResolveError> {
        let mut changes = Vec::with_capacity(entry.changes.len());
        for change in &entry.changes {
            let predicate = change.category.predicate();
            let runs = resolver.parse(&change.text, doc_uri, Some(&predicate))?;
            changes.push(AnnotatedChange {
                category: change.category,
                runs,
            });
        }
        Ok(Self {
            sfs_id: entry.sfs_id.clone(),
            title: entry.title.clone(),
            entry_into_force: entry.entry_into_force,
            changes,
        })
    }
}

/// Attaches registry data to every transitional provision whose ordinal is
/// a known SFS id. Returns the number of linked provisions.
pub fn link_registry(
    root: &mut DocumentNode,
    registry: &Registry,
    resolver: &ReferenceResolver,
    doc_uri: &str,
) -> Result<usize, ResolveError> {
    let mut pending = Vec::new();
    root.walk(&mut |node| {
        if let (NodeKind::TransitionalProvision { amendment: None }, Some(ordinal)) =
            (&node.kind, node.ordinal())
        {
            if let Some(entry) = registry.get(ordinal.as_str()) {
                pending.push(entry.clone());
            }
        }
    });
    let mut links: HashMap<String, AmendmentLink> = HashMap::new();
    for entry in pending {
        let link = AmendmentLink::annotate(&entry, resolver, doc_uri)?;
        links.insert(entry.sfs_id.clone(), link);
    }

    let mut linked = 0;
    root.walk_mut(&mut |node| {
        let Some(id) = node.ordinal().map(|o| o.as_str().to_string()) else {
            return;
        };
        if let NodeKind::TransitionalProvision { amendment } = &mut node.kind {
            if amendment.is_none() {
                if let Some(link) = links.get(&id) {
                    *amendment = Some(link.clone());
                    linked += 1;
                }
            }
        }
    });
    tracing::debug!("[Parser] linked {} transitional provisions to the registry", linked);
    Ok(linked)
}
