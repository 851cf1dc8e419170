//! Citation tagging and URI construction.
//!
//! A scan walks the text left to right. At each position every grammar rule
//! is tried; the earliest match wins, ties going to the rule declared first.
//! Matched spans become references whose URI is built from the captured
//! components plus whatever the [`CitationContext`] supplies for the parts
//! the citation leaves out.

use crate::document::{push_run, push_text, InlineRun, PredicateRef, ResolvedReference};
use crate::error::{ResolveError, UnresolvedCitation};
use crate::sources::common::normalize_text;
use crate::sources::sfs::escape::{descape, escape};
use crate::sources::sfs::grammar::CitationGrammar;
use crate::sources::sfs::named_laws::NamedLawTable;
use regex::{Captures, Regex};
use std::sync::{Arc, LazyLock};

static BASE_URI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<prefix>[a-z][a-z0-9+.-]*://[^#]*/)(?P<law>(?:bih\.|N)?\d{4}:\d+(?:_\d+| ?s\. ?\d+)?)(?:#(?P<frag>.*))?$",
    )
    .expect("BASE_URI_RE should compile")
});
static FRAGMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:K(?P<chapter>\d+[a-z]?))?(?:P(?P<section>\d+[a-z]?))?(?:S(?P<piece>\d+))?(?:N(?P<item>\d+[a-z]?))?$",
    )
    .expect("FRAGMENT_RE should compile")
});
static SUBLAW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+:\d+)\.(\d)").unwrap());
static PAGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" ?s\. ?(\d+)").unwrap());
static LIST_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?: ?[a-z]\b)?").unwrap());

const ORDINAL_WORDS: &[&str] = &[
    "första", "andra", "tredje", "fjärde", "femte", "sjätte", "sjunde", "åttonde", "nionde",
    "tionde",
];

/// Scan state threaded through the citations of one text span.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitationContext {
    pub prefix: Option<String>,
    pub current_law: Option<String>,
    pub current_chapter: Option<String>,
    pub current_section: Option<String>,
    pub current_piece: Option<String>,
    pub current_item: Option<String>,
    pub last_law: Option<String>,
}

impl CitationContext {
    /// Decomposes `base_uri`. An unrecognised URI gives an empty context; an
    /// unrecognised fragment keeps the law and drops the rest.
    pub fn from_base_uri(base_uri: &str) -> Self {
        let Some(caps) = BASE_URI_RE.captures(base_uri.trim()) else {
            tracing::debug!("[Parser] base URI {:?} not recognised", base_uri);
            return Self::default();
        };
        let mut context = Self {
            prefix: Some(caps["prefix"].to_string()),
            current_law: Some(caps["law"].to_string()),
            ..Self::default()
        };
        if let Some(fragment) = caps.name("frag") {
            match FRAGMENT_RE.captures(fragment.as_str()) {
                Some(frag) => {
                    let part = |name: &str| frag.name(name).map(|m| m.as_str().to_string());
                    context.current_chapter = part("chapter");
                    context.current_section = part("section");
                    context.current_piece = part("piece");
                    context.current_item = part("item");
                }
                None => {
                    tracing::debug!("[Parser] ignoring base fragment {:?}", fragment.as_str());
                }
            }
        }
        context
    }
}

/// Components of one citation, in URI order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Components {
    law: Option<String>,
    lawref: Option<String>,
    chapter: Option<String>,
    section: Option<String>,
    element: Option<String>,
    piece: Option<String>,
    item: Option<String>,
}

impl Components {
    const MARKERS: [&'static str; 6] = ["L", "K", "P", "O", "S", "N"];

    fn fragment_parts(&self) -> [Option<&str>; 6] {
        [
            self.lawref.as_deref(),
            self.chapter.as_deref(),
            self.section.as_deref(),
            self.element.as_deref(),
            self.piece.as_deref(),
            self.item.as_deref(),
        ]
    }

    fn is_empty(&self) -> bool {
        self.law.is_none() && self.fragment_parts().iter().all(Option::is_none)
    }
}

/// A match in progress: captured parts before context is applied.
struct Citation {
    explicit: Components,
    same_law: bool,
    named_law: Option<String>,
    section_list: Option<(usize, usize)>,
}

#[derive(Debug, Clone)]
pub struct ReferenceResolver {
    grammar: Arc<CitationGrammar>,
    named_laws: Arc<NamedLawTable>,
    default_prefix: String,
}

impl ReferenceResolver {
    pub fn new(
        grammar: Arc<CitationGrammar>,
        named_laws: Arc<NamedLawTable>,
        default_prefix: impl Into<String>,
    ) -> Self {
        Self {
            grammar,
            named_laws,
            default_prefix: default_prefix.into(),
        }
    }

    /// Tags citations in `text`, seeding a fresh context from `base_uri`.
    pub fn parse(
        &self,
        text: &str,
        base_uri: &str,
        predicate: Option<&PredicateRef>,
    ) -> Result<Vec<InlineRun>, ResolveError> {
        let mut context = CitationContext::from_base_uri(base_uri);
        self.parse_with_context(text, &mut context, predicate)
    }

    pub fn parse_with_context(
        &self,
        text: &str,
        context: &mut CitationContext,
        predicate: Option<&PredicateRef>,
    ) -> Result<Vec<InlineRun>, ResolveError> {
        let normalized = normalize_text(text);
        let escaped = escape(&normalized);
        let total = escaped.chars().count();
        let mut runs = Vec::new();
        let mut pos = 0;

        while pos < escaped.len() {
            let Some(caps) = self.earliest_match(&escaped, pos) else {
                break;
            };
            let Some(whole) = caps.get(0) else {
                break;
            };
            if whole.start() == whole.end() {
                return Err(ResolveError::Parse {
                    consumed: escaped[..whole.start()].chars().count(),
                    total,
                });
            }
            push_text(&mut runs, &descape(&escaped[pos..whole.start()]));

            let citation = read_citation(&caps);
            if citation.explicit.is_empty()
                && !citation.same_law
                && citation.named_law.is_none()
                && citation.section_list.is_none()
            {
                return Err(ResolveError::Parse {
                    consumed: escaped[..whole.start()].chars().count(),
                    total,
                });
            }

            let span = &escaped[whole.start()..whole.end()];
            match self.link_citation(&citation, span, whole.start(), context, predicate) {
                Ok(links) => {
                    for run in links {
                        push_run(&mut runs, run);
                    }
                }
                Err(unresolved) => {
                    tracing::debug!("[Parser] {}", unresolved);
                    push_text(&mut runs, &descape(span));
                }
            }
            pos = whole.end();
        }
        if pos < escaped.len() {
            push_text(&mut runs, &descape(&escaped[pos..]));
        }
        Ok(runs)
    }

    fn earliest_match<'t>(&self, text: &'t str, pos: usize) -> Option<Captures<'t>> {
        let mut best: Option<Captures<'t>> = None;
        for rule in self.grammar.rules() {
            let Some(caps) = rule.regex.captures_at(text, pos) else {
                continue;
            };
            let start = caps.get(0).map(|m| m.start()).unwrap_or(usize::MAX);
            let best_start = best
                .as_ref()
                .and_then(|b| b.get(0))
                .map(|m| m.start())
                .unwrap_or(usize::MAX);
            if start < best_start {
                best = Some(caps);
            }
        }
        best
    }

    /// Resolves a citation into one or more links covering `span`.
    fn link_citation(
        &self,
        citation: &Citation,
        span: &str,
        span_start: usize,
        context: &mut CitationContext,
        predicate: Option<&PredicateRef>,
    ) -> Result<Vec<InlineRun>, UnresolvedCitation> {
        let unresolved = |reason: &'static str| UnresolvedCitation {
            text: descape(span),
            reason,
        };

        let mut explicit = citation.explicit.clone();
        if let Some(name) = &citation.named_law {
            let id = self
                .named_laws
                .lookup(&descape(name))
                .ok_or_else(|| unresolved("unknown statute name"))?;
            explicit.law = Some(id.to_string());
        }
        if citation.same_law {
            // The base statute itself is an internal reference.
            if let Some(last) = &context.last_law {
                if Some(last) != context.current_law.as_ref() {
                    explicit.law = Some(last.clone());
                }
            }
        }
        let inherit = explicit.law.is_none();

        let Some((list_start, list_end)) = citation.section_list else {
            let resolved = resolve(&explicit, inherit, context).map_err(unresolved)?;
            let uri = self.build_uri(&resolved, context).map_err(unresolved)?;
            remember(&explicit, &resolved, context);
            return Ok(vec![reference(descape(span), uri, predicate)]);
        };

        let list_start = list_start - span_start;
        let list_end = list_end - span_start;
        let numbers: Vec<(usize, usize)> = LIST_NUMBER_RE
            .find_iter(&span[list_start..list_end])
            .map(|m| (list_start + m.start(), list_start + m.end()))
            .collect();
        let mut runs = Vec::new();
        let mut written = 0;
        for (idx, (start, end)) in numbers.iter().enumerate() {
            let last = idx + 1 == numbers.len();
            let mut target = explicit.clone();
            target.section = Some(span[*start..*end].to_string());
            let resolved = resolve(&target, inherit, context).map_err(unresolved)?;
            let uri = self.build_uri(&resolved, context).map_err(unresolved)?;

            let link_start = if idx == 0 { 0 } else { *start };
            let link_end = if last { span.len() } else { *end };
            if link_start > written {
                runs.push(InlineRun::Text(descape(&span[written..link_start])));
            }
            runs.push(reference(descape(&span[link_start..link_end]), uri, predicate));
            written = link_end;
            if last {
                remember(&target, &resolved, context);
            }
        }
        Ok(runs)
    }

    fn build_uri(
        &self,
        resolved: &Components,
        context: &CitationContext,
    ) -> Result<String, &'static str> {
        let law = resolved.law.as_deref().ok_or("no statute in scope")?;
        let mut uri = context
            .prefix
            .clone()
            .unwrap_or_else(|| self.default_prefix.clone());
        uri.push_str(&normalize_law(law));

        let parts = resolved.fragment_parts();
        let mut written = false;
        for (idx, part) in parts.iter().enumerate() {
            let marker = Components::MARKERS[idx];
            // A missing piece between two written components reads as the first.
            let value = match part {
                Some(value) => component_value(value),
                None if marker == "S" && written && parts[idx + 1..].iter().any(Option::is_some) => {
                    "1".to_string()
                }
                None => continue,
            };
            if !written {
                uri.push('#');
            }
            uri.push_str(marker);
            uri.push_str(&value);
            written = true;
        }
        Ok(uri)
    }
}

/// Fills the components a citation leaves out from the context. Filling
/// stops at the first explicitly given component.
fn resolve(
    explicit: &Components,
    inherit: bool,
    context: &CitationContext,
) -> Result<Components, &'static str> {
    let mut resolved = explicit.clone();
    if inherit {
        let none: Option<String> = None;
        let slots = [
            (&mut resolved.law, explicit.law.is_some(), &context.current_law),
            (&mut resolved.lawref, explicit.lawref.is_some(), &none),
            (&mut resolved.chapter, explicit.chapter.is_some(), &context.current_chapter),
            (&mut resolved.section, explicit.section.is_some(), &context.current_section),
            (&mut resolved.element, explicit.element.is_some(), &none),
            (&mut resolved.piece, explicit.piece.is_some(), &context.current_piece),
            (&mut resolved.item, explicit.item.is_some(), &context.current_item),
        ];
        for (slot, given, from_context) in slots {
            if given {
                break;
            }
            *slot = from_context.clone();
        }
    }
    if resolved.law.is_none() {
        return Err("no statute in scope");
    }
    Ok(resolved)
}

fn remember(explicit: &Components, resolved: &Components, context: &mut CitationContext) {
    if explicit.law.is_some() {
        context.last_law = explicit.law.clone();
    }
    context.current_law = resolved.law.clone();
    context.current_chapter = resolved.chapter.clone();
    context.current_section = resolved.section.clone();
    context.current_piece = resolved.piece.clone();
    context.current_item = resolved.item.clone();
}

fn read_citation(caps: &Captures<'_>) -> Citation {
    let get = |name: &str| caps.name(name).map(|m| m.as_str().to_string());
    Citation {
        explicit: Components {
            law: get("law"),
            lawref: get("lawref"),
            chapter: get("chapter"),
            section: get("section"),
            element: get("element"),
            piece: get("piece"),
            item: get("item"),
        },
        same_law: caps.name("same_law").is_some(),
        named_law: get("named_law"),
        section_list: caps.name("section_list").map(|m| (m.start(), m.end())),
    }
}

fn reference(text: String, uri: String, predicate: Option<&PredicateRef>) -> InlineRun {
    InlineRun::Reference(ResolvedReference {
        text,
        uri,
        predicate: predicate.cloned(),
        is_defined_term: false,
    })
}

/// `1736:0123.2` and `1736:0123 s. 2` both become `1736:0123_2`.
pub fn normalize_law(law: &str) -> String {
    let law = SUBLAW_RE.replace(law.trim(), "$1 $2");
    let law = PAGE_RE.replace(&law, " $1");
    law.split_whitespace().collect::<Vec<_>>().join("_")
}

fn component_value(value: &str) -> String {
    let value: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    match ORDINAL_WORDS.iter().position(|word| *word == value) {
        Some(idx) => (idx + 1).to_string(),
        None => value,
    }
}
