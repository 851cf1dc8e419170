use crate::document::DocumentNode;
use crate::sources::sfs::registry::RegistryEntry;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Sfs,
}

/// One decoded statute text, as handed over by the extraction step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInput {
    pub source: SourceKind,
    /// Used when the text carries no header block.
    #[serde(default)]
    pub sfs_id: Option<String>,
    pub text: String,
}

impl DocumentInput {
    pub fn sfs(sfs_id: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            source: SourceKind::Sfs,
            sfs_id: sfs_id.map(str::to_string),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sfs_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authority_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued: Option<NaiveDate>,
    /// Last amendment incorporated in the text ("Ändrad: t.o.m. SFS …").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amended_through: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_force: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_on: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<RegistryEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentStatus {
    Parsed,
    Revoked { revoked_on: Option<NaiveDate> },
    NotApplicable { reason: String },
}

impl DocumentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            DocumentStatus::Parsed => "parsed",
            DocumentStatus::Revoked { .. } => "revoked",
            DocumentStatus::NotApplicable { .. } => "not_applicable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub uri: String,
    pub metadata: DocumentMetadata,
    #[serde(flatten)]
    pub status: DocumentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<DocumentNode>,
}
