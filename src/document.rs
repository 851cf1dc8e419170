//! Document model for parsed statutes.
//!
//! A statute is a tree of [`DocumentNode`]s. The node's [`NodeKind`] decides
//! whether its payload is a child sequence or inline text; attributes that
//! every node may carry (ordinal, fragment id, validity) live in
//! [`NodeAttrs`].

use crate::sources::sfs::registry::AmendmentLink;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrdinalPart {
    Numeric(u64),
    Alpha(String),
}

/// Ordinal such as `3`, `3a` or `IV`, ordered by its numeric and alpha runs.
#[derive(Debug, Clone)]
pub struct OrdinalValue {
    raw: String,
    parts: Vec<OrdinalPart>,
}

impl OrdinalValue {
    pub fn new(raw: &str) -> Self {
        let raw: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        let parts = split_ordinal(&raw);
        Self { raw, parts }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn parts(&self) -> &[OrdinalPart] {
        &self.parts
    }

    pub fn is_first(&self) -> bool {
        self.parts == [OrdinalPart::Numeric(1)]
    }
}

pub fn split_ordinal(value: &str) -> Vec<OrdinalPart> {
    let mut parts = Vec::new();
    let mut digits = String::new();
    let mut alpha = String::new();

    for c in value.chars() {
        if c.is_ascii_digit() {
            if !alpha.is_empty() {
                parts.push(OrdinalPart::Alpha(std::mem::take(&mut alpha)));
            }
            digits.push(c);
        } else if c.is_alphabetic() {
            if !digits.is_empty() {
                parts.push(numeric_part(&std::mem::take(&mut digits)));
            }
            alpha.extend(c.to_lowercase());
        } else {
            if !digits.is_empty() {
                parts.push(numeric_part(&std::mem::take(&mut digits)));
            }
            if !alpha.is_empty() {
                parts.push(OrdinalPart::Alpha(std::mem::take(&mut alpha)));
            }
        }
    }
    if !digits.is_empty() {
        parts.push(numeric_part(&digits));
    }
    if !alpha.is_empty() {
        parts.push(OrdinalPart::Alpha(alpha));
    }
    parts
}

fn numeric_part(digits: &str) -> OrdinalPart {
    digits
        .parse::<u64>()
        .map(OrdinalPart::Numeric)
        .unwrap_or_else(|_| OrdinalPart::Alpha(digits.to_string()))
}

impl Ord for OrdinalPart {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (OrdinalPart::Numeric(a), OrdinalPart::Numeric(b)) => a.cmp(b),
            (OrdinalPart::Alpha(a), OrdinalPart::Alpha(b)) => a.cmp(b),
            (OrdinalPart::Numeric(_), OrdinalPart::Alpha(_)) => Ordering::Less,
            (OrdinalPart::Alpha(_), OrdinalPart::Numeric(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for OrdinalPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrdinalValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parts.cmp(&other.parts)
    }
}

impl PartialOrd for OrdinalValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OrdinalValue {
    fn eq(&self, other: &Self) -> bool {
        self.parts == other.parts
    }
}

impl Eq for OrdinalValue {}

impl fmt::Display for OrdinalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for OrdinalValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for OrdinalValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(OrdinalValue::new(&raw))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_into_force: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<NaiveDate>,
    /// Enters into force on a day the government decides.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub entry_by_authority: bool,
    /// Ceases to apply on a day the government decides.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub expires_by_authority: bool,
}

impl Validity {
    pub fn is_empty(&self) -> bool {
        self.entry_into_force.is_none()
            && self.expires.is_none()
            && !self.entry_by_authority
            && !self.expires_by_authority
    }

    /// Drops an expiry that precedes the entry-into-force date.
    pub fn normalized(mut self) -> Self {
        if let (Some(entry), Some(expires)) = (self.entry_into_force, self.expires) {
            if entry > expires {
                tracing::warn!(
                    "[Parser] dropping expiry {} before entry into force {}",
                    expires,
                    entry
                );
                self.expires = None;
            }
        }
        self
    }

    pub fn into_option(self) -> Option<Self> {
        let normalized = self.normalized();
        if normalized.is_empty() {
            None
        } else {
            Some(normalized)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredicateRef(pub String);

impl PredicateRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedReference {
    pub text: String,
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicate: Option<PredicateRef>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_defined_term: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum InlineRun {
    Text(String),
    Reference(ResolvedReference),
}

impl InlineRun {
    pub fn text(&self) -> &str {
        match self {
            InlineRun::Text(text) => text,
            InlineRun::Reference(reference) => &reference.text,
        }
    }
}

/// Appends text, merging with a trailing text run.
pub fn push_text(runs: &mut Vec<InlineRun>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(InlineRun::Text(last)) = runs.last_mut() {
        last.push_str(text);
        return;
    }
    runs.push(InlineRun::Text(text.to_string()));
}

pub fn push_run(runs: &mut Vec<InlineRun>, run: InlineRun) {
    match run {
        InlineRun::Text(text) => push_text(runs, &text),
        reference => runs.push(reference),
    }
}

pub fn runs_text(runs: &[InlineRun]) -> String {
    runs.iter().map(InlineRun::text).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListStyle {
    Numbered,
    Letter,
    Dash,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    Act,
    Division {
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    Chapter {
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    RevokedChapter,
    Section,
    RevokedSection,
    Paragraph,
    Heading {
        level: u8,
    },
    List {
        style: ListStyle,
    },
    ListItem,
    Table,
    TableRow,
    TableCell,
    TransitionalProvisions,
    TransitionalProvision {
        #[serde(skip_serializing_if = "Option::is_none")]
        amendment: Option<AmendmentLink>,
    },
    Appendix {
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
}

/// Fragment label used when building hierarchical ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeLabel {
    #[serde(rename = "A")]
    Division,
    #[serde(rename = "K")]
    Chapter,
    #[serde(rename = "P")]
    Section,
    #[serde(rename = "S")]
    Paragraph,
    #[serde(rename = "N")]
    ListItem,
    #[serde(rename = "T")]
    TableRow,
    #[serde(rename = "L")]
    TransitionalProvision,
    #[serde(rename = "B")]
    Appendix,
}

impl TypeLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeLabel::Division => "A",
            TypeLabel::Chapter => "K",
            TypeLabel::Section => "P",
            TypeLabel::Paragraph => "S",
            TypeLabel::ListItem => "N",
            TypeLabel::TableRow => "T",
            TypeLabel::TransitionalProvision => "L",
            TypeLabel::Appendix => "B",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "A" => Some(TypeLabel::Division),
            "K" => Some(TypeLabel::Chapter),
            "P" => Some(TypeLabel::Section),
            "S" => Some(TypeLabel::Paragraph),
            "N" => Some(TypeLabel::ListItem),
            "T" => Some(TypeLabel::TableRow),
            "L" => Some(TypeLabel::TransitionalProvision),
            "B" => Some(TypeLabel::Appendix),
            _ => None,
        }
    }
}

impl NodeKind {
    pub fn is_compound(&self) -> bool {
        match self {
            NodeKind::Act
            | NodeKind::Division { .. }
            | NodeKind::Chapter { .. }
            | NodeKind::Section
            | NodeKind::List { .. }
            | NodeKind::Table
            | NodeKind::TableRow
            | NodeKind::TransitionalProvisions
            | NodeKind::TransitionalProvision { .. }
            | NodeKind::Appendix { .. } => true,
            NodeKind::RevokedChapter
            | NodeKind::RevokedSection
            | NodeKind::Paragraph
            | NodeKind::Heading { .. }
            | NodeKind::ListItem
            | NodeKind::TableCell => false,
        }
    }

    pub fn type_label(&self) -> Option<TypeLabel> {
        match self {
            NodeKind::Division { .. } => Some(TypeLabel::Division),
            NodeKind::Chapter { .. } | NodeKind::RevokedChapter => Some(TypeLabel::Chapter),
            NodeKind::Section | NodeKind::RevokedSection => Some(TypeLabel::Section),
            NodeKind::Paragraph => Some(TypeLabel::Paragraph),
            NodeKind::ListItem => Some(TypeLabel::ListItem),
            NodeKind::TableRow => Some(TypeLabel::TableRow),
            NodeKind::TransitionalProvision { .. } => Some(TypeLabel::TransitionalProvision),
            NodeKind::Appendix { .. } => Some(TypeLabel::Appendix),
            NodeKind::Act
            | NodeKind::Heading { .. }
            | NodeKind::List { .. }
            | NodeKind::Table
            | NodeKind::TableCell
            | NodeKind::TransitionalProvisions => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeAttrs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<OrdinalValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fragment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validity: Option<Validity>,
}

impl NodeAttrs {
    pub fn fragment_id(&self) -> Option<&str> {
        self.fragment_id.as_deref()
    }

    /// Sets the fragment id once. Returns false when an id was already set.
    pub fn assign_fragment_id(&mut self, id: String) -> bool {
        match &self.fragment_id {
            Some(existing) => {
                if *existing != id {
                    tracing::warn!(
                        "[Parser] fragment id {} already assigned, ignoring {}",
                        existing,
                        id
                    );
                }
                false
            }
            None => {
                self.fragment_id = Some(id);
                true
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    Children(Vec<DocumentNode>),
    Inline(Vec<InlineRun>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentNode {
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(flatten)]
    pub attrs: NodeAttrs,
    pub payload: Payload,
}

impl DocumentNode {
    /// Creates an empty node of `kind` with the payload shape the kind requires.
    pub fn new(kind: NodeKind) -> Self {
        let payload = if kind.is_compound() {
            Payload::Children(Vec::new())
        } else {
            Payload::Inline(Vec::new())
        };
        Self {
            kind,
            attrs: NodeAttrs::default(),
            payload,
        }
    }

    pub fn leaf(kind: NodeKind, text: &str) -> Self {
        let mut node = Self::new(kind);
        if let Payload::Inline(runs) = &mut node.payload {
            push_text(runs, text);
        }
        node
    }

    pub fn with_ordinal(mut self, ordinal: Option<OrdinalValue>) -> Self {
        self.attrs.ordinal = ordinal;
        self
    }

    pub fn with_validity(mut self, validity: Option<Validity>) -> Self {
        self.attrs.validity = validity;
        self
    }

    pub fn ordinal(&self) -> Option<&OrdinalValue> {
        self.attrs.ordinal.as_ref()
    }

    pub fn fragment_id(&self) -> Option<&str> {
        self.attrs.fragment_id()
    }

    pub fn children(&self) -> &[DocumentNode] {
        match &self.payload {
            Payload::Children(children) => children,
            Payload::Inline(_) => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<DocumentNode>> {
        match &mut self.payload {
            Payload::Children(children) => Some(children),
            Payload::Inline(_) => None,
        }
    }

    pub fn runs(&self) -> &[InlineRun] {
        match &self.payload {
            Payload::Inline(runs) => runs,
            Payload::Children(_) => &[],
        }
    }

    pub fn runs_mut(&mut self) -> Option<&mut Vec<InlineRun>> {
        match &mut self.payload {
            Payload::Inline(runs) => Some(runs),
            Payload::Children(_) => None,
        }
    }

    /// Appends a child. Leaf nodes ignore children; builders never hand them any.
    pub fn push(&mut self, child: DocumentNode) {
        match &mut self.payload {
            Payload::Children(children) => children.push(child),
            Payload::Inline(_) => {
                debug_assert!(false, "attempted to push a child into a leaf node");
            }
        }
    }

    /// Visible text of this node and all descendants.
    pub fn text(&self) -> String {
        match &self.payload {
            Payload::Inline(runs) => runs_text(runs),
            Payload::Children(children) => children
                .iter()
                .map(DocumentNode::text)
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// Depth-first, document-order traversal including `self`.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a DocumentNode)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    pub fn walk_mut(&mut self, visit: &mut dyn FnMut(&mut DocumentNode)) {
        visit(self);
        if let Some(children) = self.children_mut() {
            for child in children {
                child.walk_mut(visit);
            }
        }
    }

    pub fn count_where(&self, predicate: &dyn Fn(&DocumentNode) -> bool) -> usize {
        let mut count = 0;
        self.walk(&mut |node| {
            if predicate(node) {
                count += 1;
            }
        });
        count
    }
}
