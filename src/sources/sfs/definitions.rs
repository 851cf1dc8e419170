//! Defined-term detection.
//!
//! A paragraph is checked against four trigger families in a fixed order
//! and only the first family whose trigger matches is used.

use crate::document::{InlineRun, ResolvedReference};
use crate::sources::common::{capitalize_first, normalize_text};
use regex::Regex;
use std::sync::LazyLock;

pub const MAX_TERM_CHARS: usize = 68;

static EXPLICIT_TRIGGER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:I|Vid tillämpningen av) denna (?:lag|balk|förordning|kungörelse)\b").unwrap()
});
static EXPLICIT_TERM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:avses|förstås|betyder|menas) med (?P<term>[^\s,:.;][^,:.;]*?)(?:,|:| (?:en|ett|den|det|de|sådan|sådant|sådana|varje|all|alla|någon|något)\b|$)",
    )
    .unwrap()
});
static EXPLICIT_LIST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:avses|förstås|betyder|menas) med:?\s*$").unwrap());
static PARENTHETICAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((?P<term>[a-zåäö][a-zåäö -]{2,})\)").unwrap());
static CRIMINAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"döms för (?P<term>[\w -]+?),? till (?:fängelse|böter)").unwrap()
});
static RUNNING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Med (?P<term>[^,.:;]+?) (?:avses|förstås|menas)\b").unwrap());
static LIST_TERM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{1,3} ?[a-z]?[.)]|[a-zåäö]\)|[-–—]) +(?P<term>[^:,.;]+?):").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionFamily {
    Explicit,
    Parenthetical,
    Criminal,
    Running,
}

/// Outcome of checking one paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    None,
    Term {
        family: DefinitionFamily,
        term: String,
    },
    /// Explicit trigger that introduces a list of terms.
    TermList,
}

#[derive(Debug, Clone)]
pub struct DefinitionFinder {
    concept_base: String,
}

impl DefinitionFinder {
    pub fn new(concept_base: impl Into<String>) -> Self {
        Self {
            concept_base: concept_base.into(),
        }
    }

    pub fn detect(&self, text: &str) -> Detection {
        let text = normalize_text(text);
        if EXPLICIT_TRIGGER_RE.is_match(&text) {
            if EXPLICIT_LIST_RE.is_match(&text) {
                return Detection::TermList;
            }
            return term_from(&EXPLICIT_TERM_RE, &text, DefinitionFamily::Explicit);
        }
        if PARENTHETICAL_RE.is_match(&text) {
            return term_from(&PARENTHETICAL_RE, &text, DefinitionFamily::Parenthetical);
        }
        if CRIMINAL_RE.is_match(&text) {
            return term_from(&CRIMINAL_RE, &text, DefinitionFamily::Criminal);
        }
        if RUNNING_RE.is_match(&text) {
            return term_from(&RUNNING_RE, &text, DefinitionFamily::Running);
        }
        Detection::None
    }

    /// Term of a list item under a term-list trigger ("1. fordon: …").
    pub fn list_term(&self, text: &str) -> Option<String> {
        let text = normalize_text(text);
        let caps = LIST_TERM_RE.captures(&text)?;
        accept_term(&caps["term"])
    }

    pub fn concept_uri(&self, term: &str) -> String {
        let name = capitalize_first(&normalize_text(term)).replace(' ', "_");
        format!("{}{}", self.concept_base, name)
    }

    /// Marks the first occurrence of `term` in the text runs. Returns false
    /// when no text run contains it.
    pub fn annotate(&self, runs: &mut Vec<InlineRun>, term: &str) -> bool {
        for idx in 0..runs.len() {
            let InlineRun::Text(text) = &runs[idx] else {
                continue;
            };
            let Some(start) = text.find(term) else {
                continue;
            };
            let end = start + term.len();
            let before = text[..start].to_string();
            let after = text[end..].to_string();
            let mut replacement = Vec::with_capacity(3);
            if !before.is_empty() {
                replacement.push(InlineRun::Text(before));
            }
            replacement.push(InlineRun::Reference(ResolvedReference {
                text: term.to_string(),
                uri: self.concept_uri(term),
                predicate: None,
                is_defined_term: true,
            }));
            if !after.is_empty() {
                replacement.push(InlineRun::Text(after));
            }
            runs.splice(idx..=idx, replacement);
            return true;
        }
        false
    }
}

pub fn has_defined_term(runs: &[InlineRun]) -> bool {
    runs.iter()
        .any(|run| matches!(run, InlineRun::Reference(r) if r.is_defined_term))
}

fn term_from(re: &Regex, text: &str, family: DefinitionFamily) -> Detection {
    re.captures(text)
        .and_then(|caps| accept_term(&caps["term"]))
        .map(|term| Detection::Term { family, term })
        .unwrap_or(Detection::None)
}

fn accept_term(raw: &str) -> Option<String> {
    let term = normalize_text(raw);
    if term.is_empty() || term.chars().count() >= MAX_TERM_CHARS {
        return None;
    }
    Some(term)
}
