//! Recursive state machine that turns statute text into a [`DocumentNode`]
//! tree.
//!
//! Every structural unit has a handler. A handler reads its own opening
//! paragraph, then keeps consuming children until the classifier reports a
//! category from the handler's follow set, and returns without reading it.
//! The caller then dispatches on that category.

use crate::document::{DocumentNode, ListStyle, NodeKind, OrdinalValue, Validity};
use crate::error::StructuralParseError;
use crate::sources::common::{normalize_text, split_first_line};
use crate::sources::sfs::classifier::{
    is_transitional_marker, letter_item_ordinal, match_appendix,
    match_chapter, match_division, match_revoked_chapter, match_revoked_section,
    match_section, match_transitional_entry, numbered_item_ordinal, Category, ParseState,
    StructuralClassifier,
};
use crate::sources::sfs::reader::TextCursor;
use crate::sources::sfs::table::TableReconstructor;
use crate::sources::sfs::temporal::{extract_validity, has_marker, strip_markers};

const DIVISION_FOLLOW: &[Category] = &[
    Category::Division,
    Category::TransitionalProvisions,
    Category::Appendix,
    Category::EndOfInput,
];
const CHAPTER_FOLLOW: &[Category] = &[
    Category::Chapter,
    Category::RevokedChapter,
    Category::Division,
    Category::TransitionalProvisions,
    Category::Appendix,
    Category::EndOfInput,
];
const SECTION_FOLLOW: &[Category] = &[
    Category::Section,
    Category::RevokedSection,
    Category::Chapter,
    Category::RevokedChapter,
    Category::Division,
    Category::Heading,
    Category::TransitionalProvisions,
    Category::Appendix,
    Category::EndOfInput,
];
const TRANSITIONAL_FOLLOW: &[Category] = &[Category::Appendix, Category::EndOfInput];
const PROVISION_FOLLOW: &[Category] = &[
    Category::TransitionalProvision,
    Category::Appendix,
    Category::EndOfInput,
];
const APPENDIX_FOLLOW: &[Category] = &[Category::Appendix, Category::EndOfInput];

type BuildResult = Result<DocumentNode, StructuralParseError>;

pub struct DocumentBuilder {
    cursor: TextCursor,
    classifier: StructuralClassifier,
    tables: TableReconstructor,
    state: ParseState,
    /// Validity from a marker-only paragraph, applied to the next unit.
    pending_validity: Option<Validity>,
}

impl DocumentBuilder {
    pub fn new(cursor: TextCursor) -> Self {
        Self {
            cursor,
            classifier: StructuralClassifier::new(),
            tables: TableReconstructor::new(),
            state: ParseState::default(),
            pending_validity: None,
        }
    }

    pub fn state(&self) -> &ParseState {
        &self.state
    }

    /// Consumes the remaining input into an `Act` node.
    pub fn build(mut self) -> BuildResult {
        let mut act = DocumentNode::new(NodeKind::Act);
        loop {
            let before = self.cursor.position();
            let category = self.next_category();
            match category {
                Category::EndOfInput => break,
                Category::Division => act.push(self.division()?),
                _ => act.push(self.body_unit(category)?),
            }
            self.ensure_progress(before)?;
        }
        Ok(act)
    }

    /// Units allowed below a division or directly below the act.
    fn body_unit(&mut self, category: Category) -> BuildResult {
        match category {
            Category::Chapter => self.chapter(),
            Category::RevokedChapter => self.revoked_chapter(),
            Category::Section => self.section(),
            Category::RevokedSection => self.revoked_section(),
            Category::TransitionalProvisions => self.transitional_provisions(),
            Category::Appendix => self.appendix(),
            other => self.content(other),
        }
    }

    /// Next non-blank category. Blank paragraphs are consumed, and so are
    /// marker-only paragraphs outside tables.
    fn next_category(&mut self) -> Category {
        loop {
            let category = self.classifier.classify(&self.cursor, &self.state);
            if category == Category::Blank {
                self.cursor.read_paragraph();
                continue;
            }
            if !self.state.in_table && self.at_marker_only() {
                let (_, validity) = extract_validity(&self.cursor.read_paragraph());
                self.pending_validity = merge_validity(self.pending_validity.take(), validity);
                continue;
            }
            return category;
        }
    }

    fn at_marker_only(&self) -> bool {
        self.cursor
            .peek_paragraph_at(1)
            .is_some_and(|raw| has_marker(&raw) && strip_markers(&raw).is_empty())
    }

    fn ensure_progress(&self, before: usize) -> Result<(), StructuralParseError> {
        if self.cursor.position() > before || self.cursor.eof() {
            return Ok(());
        }
        Err(StructuralParseError::new(
            "handler loop did not advance",
            before,
            self.cursor.remaining(),
        ))
    }

    /// Reads the next paragraph as a non-heading unit.
    fn read_unit(&mut self) -> (usize, String, Option<Validity>) {
        let offset = self.cursor.position();
        let raw = self.cursor.read_paragraph();
        self.state.last_was_heading = false;
        let (text, validity) = extract_validity(&raw);
        let validity = merge_validity(self.pending_validity.take(), validity);
        (offset, text, validity)
    }

    fn mismatch(&self, what: &str, offset: usize, text: &str) -> StructuralParseError {
        StructuralParseError::new(format!("expected {what}"), offset, text)
    }

    /// Runs `child` for every category outside `follow`.
    fn collect_until<F>(
        &mut self,
        node: &mut DocumentNode,
        follow: &[Category],
        mut child: F,
    ) -> Result<(), StructuralParseError>
    where
        F: FnMut(&mut Self, Category) -> BuildResult,
    {
        loop {
            let before = self.cursor.position();
            let category = self.next_category();
            if follow.contains(&category) {
                return Ok(());
            }
            node.push(child(self, category)?);
            self.ensure_progress(before)?;
        }
    }

    fn division(&mut self) -> BuildResult {
        let (offset, text, validity) = self.read_unit();
        let found = match_division(&text).ok_or_else(|| self.mismatch("division", offset, &text))?;
        tracing::debug!("[Parser] division {:?}", found.ordinal);
        let mut node = DocumentNode::new(NodeKind::Division { title: found.title })
            .with_ordinal(found.ordinal)
            .with_validity(validity);
        self.collect_until(&mut node, DIVISION_FOLLOW, |this, category| {
            this.body_unit(category)
        })?;
        Ok(node)
    }

    fn chapter(&mut self) -> BuildResult {
        let (offset, text, validity) = self.read_unit();
        let (first, rest) = split_first_line(&text);
        let inline_revoked = if rest.is_empty() {
            None
        } else {
            match_revoked_section(rest)
        };
        let inline_section =
            inline_revoked.is_none() && !rest.is_empty() && match_section(rest, None).is_some();
        let heading_text = if inline_section || inline_revoked.is_some() {
            first
        } else {
            text.as_str()
        };
        let found =
            match_chapter(heading_text).ok_or_else(|| self.mismatch("chapter", offset, &text))?;

        self.state.current_section = None;
        tracing::debug!("[Parser] chapter {:?}", found.ordinal);

        let mut node = DocumentNode::new(NodeKind::Chapter { title: found.title })
            .with_ordinal(found.ordinal)
            .with_validity(validity);
        if let Some(ordinal) = inline_revoked {
            self.state.current_section = Some(ordinal.clone());
            node.push(
                DocumentNode::leaf(NodeKind::RevokedSection, &normalize_text(rest))
                    .with_ordinal(Some(ordinal)),
            );
        } else if inline_section {
            let section = self.section_from(offset, rest, None)?;
            node.push(section);
        }
        self.collect_until(&mut node, CHAPTER_FOLLOW, |this, category| match category {
            Category::Section => this.section(),
            Category::RevokedSection => this.revoked_section(),
            other => this.content(other),
        })?;
        Ok(node)
    }

    fn revoked_chapter(&mut self) -> BuildResult {
        let (offset, text, validity) = self.read_unit();
        let ordinal = match_revoked_chapter(&text)
            .ok_or_else(|| self.mismatch("revoked chapter", offset, &text))?;
        self.state.current_section = None;
        Ok(DocumentNode::leaf(NodeKind::RevokedChapter, &normalize_text(&text))
            .with_ordinal(Some(ordinal))
            .with_validity(validity))
    }

    fn section(&mut self) -> BuildResult {
        let (offset, text, validity) = self.read_unit();
        let mut node = self.section_from(offset, &text, validity)?;
        self.collect_until(&mut node, SECTION_FOLLOW, |this, category| this.content(category))?;
        Ok(node)
    }

    /// Section node for an opening paragraph. The text after the section
    /// mark becomes the first paragraph.
    fn section_from(
        &mut self,
        offset: usize,
        text: &str,
        validity: Option<Validity>,
    ) -> BuildResult {
        let found =
            match_section(text, None).ok_or_else(|| self.mismatch("section", offset, text))?;
        self.state.current_section = Some(found.ordinal.clone());
        let mut node = DocumentNode::new(NodeKind::Section)
            .with_ordinal(Some(found.ordinal))
            .with_validity(validity);
        let rest = normalize_text(&found.rest);
        if !rest.is_empty() {
            node.push(DocumentNode::leaf(NodeKind::Paragraph, &rest));
        }
        Ok(node)
    }

    fn revoked_section(&mut self) -> BuildResult {
        let (offset, text, validity) = self.read_unit();
        let ordinal = match_revoked_section(&text)
            .ok_or_else(|| self.mismatch("revoked section", offset, &text))?;
        self.state.current_section = Some(ordinal.clone());
        Ok(DocumentNode::leaf(NodeKind::RevokedSection, &normalize_text(&text))
            .with_ordinal(Some(ordinal))
            .with_validity(validity))
    }

    fn transitional_provisions(&mut self) -> BuildResult {
        let (offset, text, validity) = self.read_unit();
        let (first, rest) = split_first_line(&text);
        if !is_transitional_marker(first) {
            return Err(self.mismatch("transitional provisions", offset, &text));
        }
        let mut node = DocumentNode::new(NodeKind::TransitionalProvisions).with_validity(validity);
        if !rest.is_empty() {
            match match_transitional_entry(rest) {
                Some(_) => {
                    let mut provision = self.provision_from(offset, rest)?;
                    self.collect_until(&mut provision, PROVISION_FOLLOW, |this, category| {
                        this.content(category)
                    })?;
                    node.push(provision);
                }
                None => node.push(DocumentNode::leaf(NodeKind::Paragraph, &normalize_text(rest))),
            }
        }
        self.collect_until(&mut node, TRANSITIONAL_FOLLOW, |this, category| match category {
            Category::TransitionalProvision => this.transitional_provision(),
            other => this.content(other),
        })?;
        Ok(node)
    }

    fn transitional_provision(&mut self) -> BuildResult {
        let (offset, text, validity) = self.read_unit();
        let mut node = self.provision_from(offset, &text)?.with_validity(validity);
        self.collect_until(&mut node, PROVISION_FOLLOW, |this, category| this.content(category))?;
        Ok(node)
    }

    fn provision_from(&mut self, offset: usize, text: &str) -> BuildResult {
        let id = match_transitional_entry(text)
            .ok_or_else(|| self.mismatch("transitional provision", offset, text))?;
        let mut node = DocumentNode::new(NodeKind::TransitionalProvision { amendment: None })
            .with_ordinal(Some(OrdinalValue::new(&id)));
        let (_, rest) = split_first_line(text);
        if !rest.is_empty() {
            node.push(DocumentNode::leaf(NodeKind::Paragraph, &normalize_text(rest)));
        }
        Ok(node)
    }

    fn appendix(&mut self) -> BuildResult {
        let (offset, text, validity) = self.read_unit();
        let found = match_appendix(&text).ok_or_else(|| self.mismatch("appendix", offset, &text))?;
        let mut node = DocumentNode::new(NodeKind::Appendix { title: found.title })
            .with_ordinal(found.ordinal)
            .with_validity(validity);
        self.collect_until(&mut node, APPENDIX_FOLLOW, |this, category| this.content(category))?;
        Ok(node)
    }

    /// Leaf-level content. Structural categories that are not allowed at the
    /// current level end up as plain paragraphs.
    fn content(&mut self, category: Category) -> BuildResult {
        match category {
            Category::Table => Ok(self.table()),
            Category::NumberedList => self.list(ListStyle::Numbered),
            Category::LetterList => self.list(ListStyle::Letter),
            Category::DashList => self.list(ListStyle::Dash),
            Category::Heading => Ok(self.heading()),
            _ => Ok(self.paragraph()),
        }
    }

    fn paragraph(&mut self) -> DocumentNode {
        let (_, text, validity) = self.read_unit();
        DocumentNode::leaf(NodeKind::Paragraph, &normalize_text(&text)).with_validity(validity)
    }

    fn heading(&mut self) -> DocumentNode {
        let level = if self.state.last_was_heading { 2 } else { 1 };
        let (_, text, validity) = self.read_unit();
        self.state.last_was_heading = true;
        DocumentNode::leaf(NodeKind::Heading { level }, &normalize_text(&text))
            .with_validity(validity)
    }

    fn list(&mut self, style: ListStyle) -> BuildResult {
        let own = list_category(style);
        let mut list = DocumentNode::new(NodeKind::List { style });
        loop {
            let before = self.cursor.position();
            let category = self.next_category();
            if category == own {
                list.push(self.list_item(style));
            } else if nests_in(style, category) {
                let nested = match category {
                    Category::LetterList => ListStyle::Letter,
                    _ => ListStyle::Dash,
                };
                list.push(self.list(nested)?);
            } else {
                return Ok(list);
            }
            self.ensure_progress(before)?;
        }
    }

    fn list_item(&mut self, style: ListStyle) -> DocumentNode {
        let (_, text, validity) = self.read_unit();
        let text = normalize_text(&text);
        let ordinal = match style {
            ListStyle::Numbered => numbered_item_ordinal(&text),
            ListStyle::Letter => letter_item_ordinal(&text),
            ListStyle::Dash => None,
        };
        DocumentNode::leaf(NodeKind::ListItem, &text)
            .with_ordinal(ordinal)
            .with_validity(validity)
    }

    fn table(&mut self) -> DocumentNode {
        let validity = self.pending_validity.take();
        self.state.in_table = true;
        self.state.last_was_heading = false;
        let mut block: Vec<String> = Vec::new();
        loop {
            let category = self.next_category();
            if category == Category::Table {
                block.push(self.cursor.read_paragraph_raw());
                continue;
            }
            if self.marker_before_table() {
                block.push(self.cursor.read_paragraph_raw());
                continue;
            }
            break;
        }
        self.state.in_table = false;
        self.tables
            .reconstruct(&block.join("\n"))
            .with_validity(validity)
    }

    /// A marker-only paragraph whose next non-blank paragraph continues the
    /// table.
    fn marker_before_table(&self) -> bool {
        let Some(raw) = self.cursor.peek_paragraph_at(1) else {
            return false;
        };
        if !has_marker(&raw) || !strip_markers(&raw).is_empty() {
            return false;
        }
        let mut n = 2;
        while let Some(next) = self.cursor.peek_paragraph_at(n) {
            if !next.trim().is_empty() {
                return self.classifier.classify_paragraph(&self.cursor, n, &next, &self.state)
                    == Category::Table;
            }
            n += 1;
        }
        false
    }
}

/// Combines two validity sets; fields of `own` win.
fn merge_validity(pending: Option<Validity>, own: Option<Validity>) -> Option<Validity> {
    match (pending, own) {
        (None, own) => own,
        (pending, None) => pending,
        (Some(pending), Some(own)) => Validity {
            entry_into_force: own.entry_into_force.or(pending.entry_into_force),
            expires: own.expires.or(pending.expires),
            entry_by_authority: own.entry_by_authority || pending.entry_by_authority,
            expires_by_authority: own.expires_by_authority || pending.expires_by_authority,
        }
        .into_option(),
    }
}

fn list_category(style: ListStyle) -> Category {
    match style {
        ListStyle::Numbered => Category::NumberedList,
        ListStyle::Letter => Category::LetterList,
        ListStyle::Dash => Category::DashList,
    }
}

fn nests_in(style: ListStyle, category: Category) -> bool {
    match style {
        ListStyle::Numbered => matches!(category, Category::LetterList | Category::DashList),
        ListStyle::Letter => category == Category::DashList,
        ListStyle::Dash => false,
    }
}

/// Parses statute body text into an `Act` tree.
pub fn parse_body(cursor: TextCursor) -> BuildResult {
    DocumentBuilder::new(cursor).build()
}
