//! Fragment ids, citation resolution of leaf text, and defined terms.
//!
//! One top-down pass. Labeled nodes get `parent_id + label + ordinal` (or a
//! running count among their labeled siblings when they have no ordinal);
//! unlabeled nodes are transparent and hand their parent's prefix and
//! counters to their children.

use crate::document::{DocumentNode, InlineRun, NodeKind, PredicateRef, TypeLabel};
use crate::error::ResolveError;
use crate::sources::sfs::cross_references::ReferenceResolver;
use crate::sources::sfs::definitions::{has_defined_term, DefinitionFinder, Detection};
use std::collections::{HashMap, HashSet};

type Counters = HashMap<TypeLabel, usize>;

/// Ordinals of the enclosing units, used for citation base URIs.
#[derive(Debug, Clone, Default)]
struct Scope {
    chapter: Option<String>,
    section: Option<String>,
    piece: Option<String>,
}

#[derive(Debug, Default)]
struct TermState {
    /// A term was found earlier in the current section.
    found_in_section: bool,
    /// The previous paragraph introduced a list of terms.
    list_mode: bool,
}

pub struct FragmentIdAssigner<'a> {
    resolver: &'a ReferenceResolver,
    definitions: DefinitionFinder,
    doc_uri: String,
    predicate: Option<PredicateRef>,
    extra_skip: HashSet<TypeLabel>,
}

impl<'a> FragmentIdAssigner<'a> {
    pub fn new(
        resolver: &'a ReferenceResolver,
        definitions: DefinitionFinder,
        doc_uri: impl Into<String>,
        predicate: Option<PredicateRef>,
    ) -> Self {
        Self {
            resolver,
            definitions,
            doc_uri: doc_uri.into(),
            predicate,
            extra_skip: HashSet::new(),
        }
    }

    pub fn with_skipped_labels<I: IntoIterator<Item = TypeLabel>>(mut self, labels: I) -> Self {
        self.extra_skip.extend(labels);
        self
    }

    /// Labels that get no id in `root`: the configured ones, plus divisions
    /// when chapters carry the numbering on their own.
    pub fn skip_set(&self, root: &DocumentNode) -> HashSet<TypeLabel> {
        let mut skip = self.extra_skip.clone();
        let has_chapters =
            root.count_where(&|n| matches!(n.kind, NodeKind::Chapter { .. })) > 0;
        let first_sections = root.count_where(&|n| {
            n.kind == NodeKind::Section && n.ordinal().is_some_and(|o| o.as_str() == "1")
        });
        if has_chapters && first_sections < 2 {
            skip.insert(TypeLabel::Division);
        }
        skip
    }

    /// Assigns ids below `root`. A tree that already carries ids keeps them
    /// and is not resolved again.
    pub fn assign(&self, root: &mut DocumentNode) -> Result<(), ResolveError> {
        let resolve = root.count_where(&|n| n.fragment_id().is_some()) == 0;
        let skip = self.skip_set(root);
        let mut counters = Counters::new();
        let mut terms = TermState::default();
        self.visit(
            root,
            "",
            &mut counters,
            &Scope::default(),
            &skip,
            resolve,
            &mut terms,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn visit(
        &self,
        node: &mut DocumentNode,
        prefix: &str,
        counters: &mut Counters,
        scope: &Scope,
        skip: &HashSet<TypeLabel>,
        resolve: bool,
        terms: &mut TermState,
    ) -> Result<(), ResolveError> {
        let Some(children) = node.children_mut() else {
            return Ok(());
        };
        for child in children.iter_mut() {
            let label = child.kind.type_label();
            let mut child_scope = scope.clone();
            match &child.kind {
                NodeKind::Chapter { .. } | NodeKind::RevokedChapter => {
                    child_scope = Scope {
                        chapter: child.ordinal().map(|o| o.as_str().to_string()),
                        ..Scope::default()
                    };
                }
                NodeKind::Section | NodeKind::RevokedSection => {
                    child_scope.section = child.ordinal().map(|o| o.as_str().to_string());
                    child_scope.piece = None;
                    *terms = TermState::default();
                }
                NodeKind::TransitionalProvisions | NodeKind::Appendix { .. } => {
                    child_scope = Scope::default();
                }
                _ => {}
            }

            let mut own_prefix = None;
            if let Some(label) = label {
                let count = counters.entry(label).or_insert(0);
                *count += 1;
                let number = child
                    .ordinal()
                    .map(|o| o.as_str().to_string())
                    .unwrap_or_else(|| count.to_string());
                if !skip.contains(&label) {
                    child
                        .attrs
                        .assign_fragment_id(format!("{prefix}{}{number}", label.as_str()));
                    own_prefix = child.fragment_id().map(str::to_string);
                }
                if label == TypeLabel::Paragraph {
                    child_scope.piece = Some(number);
                }
            }

            if resolve {
                self.resolve_leaf(child, &child_scope, terms)?;
            }

            match (label, own_prefix) {
                (Some(_), Some(id)) => {
                    let mut fresh = Counters::new();
                    self.visit(child, &id, &mut fresh, &child_scope, skip, resolve, terms)?;
                }
                (Some(_), None) => {
                    let mut fresh = Counters::new();
                    self.visit(child, prefix, &mut fresh, &child_scope, skip, resolve, terms)?;
                }
                (None, _) => {
                    self.visit(child, prefix, counters, &child_scope, skip, resolve, terms)?;
                }
            }
        }
        Ok(())
    }

    fn base_uri(&self, scope: &Scope) -> String {
        let mut fragment = String::new();
        if let Some(chapter) = &scope.chapter {
            fragment.push('K');
            fragment.push_str(chapter);
        }
        if let Some(section) = &scope.section {
            fragment.push('P');
            fragment.push_str(section);
            if let Some(piece) = &scope.piece {
                fragment.push('S');
                fragment.push_str(piece);
            }
        }
        if fragment.is_empty() {
            self.doc_uri.clone()
        } else {
            format!("{}#{fragment}", self.doc_uri)
        }
    }

    fn resolve_leaf(
        &self,
        node: &mut DocumentNode,
        scope: &Scope,
        terms: &mut TermState,
    ) -> Result<(), ResolveError> {
        let resolvable = matches!(
            node.kind,
            NodeKind::Paragraph
                | NodeKind::ListItem
                | NodeKind::TableCell
                | NodeKind::RevokedChapter
                | NodeKind::RevokedSection
        );
        if !resolvable {
            if node.kind.is_compound() && !matches!(node.kind, NodeKind::List { .. }) {
                terms.list_mode = false;
            }
            return Ok(());
        }
        let base = self.base_uri(scope);
        let kind = node.kind.clone();
        let Some(runs) = node.runs_mut() else {
            return Ok(());
        };

        let mut resolved = Vec::with_capacity(runs.len());
        for run in runs.drain(..) {
            match run {
                InlineRun::Text(text) => {
                    resolved.extend(self.resolver.parse(&text, &base, self.predicate.as_ref())?);
                }
                reference => resolved.push(reference),
            }
        }
        *runs = resolved;

        match kind {
            NodeKind::Paragraph => self.detect_terms(runs, terms),
            NodeKind::ListItem if terms.list_mode => {
                let text: String = runs.iter().map(InlineRun::text).collect();
                if let Some(term) = self.definitions.list_term(&text) {
                    self.definitions.annotate(runs, &term);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn detect_terms(&self, runs: &mut Vec<InlineRun>, terms: &mut TermState) {
        terms.list_mode = false;
        if terms.found_in_section || has_defined_term(runs) {
            return;
        }
        let text: String = runs.iter().map(InlineRun::text).collect();
        match self.definitions.detect(&text) {
            Detection::None => {}
            Detection::TermList => terms.list_mode = true,
            Detection::Term { term, .. } => {
                if self.definitions.annotate(runs, &term) {
                    terms.found_in_section = true;
                }
            }
        }
    }
}
