//! Decides what kind of structural unit the next paragraph starts.
//!
//! Categories overlap visually (a chapter title can look like a heading, a
//! list item like a section), so the predicates run in one fixed priority
//! order and the first match wins. Predicates only read the cursor; the
//! builder owns every state change.

use crate::document::OrdinalValue;
use crate::sources::sfs::reader::TextCursor;
use crate::sources::sfs::temporal::strip_markers;
use regex::Regex;
use std::sync::LazyLock;

pub const MAX_HEADING_CHARS: usize = 110;
const SHORT_LINE_CHARS: usize = 55;
const HEADING_LOOKAHEAD_DEPTH: usize = 2;
const MAX_BLANK_SKIP: usize = 8;

static DIVISION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:AVD\.|AVDELNING) (?P<num>[IVXLC]+)\.?(?:\s+(?P<title>.+))?$").unwrap()
});
static REVOKED_CHAPTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<num>\d+(?: ?[a-z])?) kap\. (?:[Hh]ar upphävts|[Uu]pphävd) genom (?:[Ff]örordning|[Ll]ag) \(\d{4}:\d+\)\.?$",
    )
    .unwrap()
});
static REVOKED_SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<num>\d+ ?[a-z]?) §[ .]+(?:[Hh]ar upphävts|[Nn]y beteckning \d+ ?[a-z]? §) genom (?:[Ff]örordning|[Ll]ag) \(\d{4}:\d+\)\.?$",
    )
    .unwrap()
});
static CHAPTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<num>\d+(?: ?[a-z])?) [Kk]ap\.(?:\s+(?P<title>.*))?$").unwrap()
});
static CHAPTER_CONTINUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:,|;| och| eller| samt| om)$").unwrap());
static SECTION_MARK_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+ ?[a-z]? §").unwrap());
static SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^(?P<num>\d+ ?[a-z]?) §(?:\s+(?P<rest>.*))?$").unwrap());
static SECTION_OLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^§ (?P<num>\d+ ?[a-z]?)\.(?:\s+(?P<rest>.*))?$").unwrap());
static TRANSITIONAL_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:Ikraftträdande- och )?[Öö]vergångsbestämmelser?\s*$").unwrap()
});
static TRANSITIONAL_ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<id>\d{4}:\d+)(?: s\. ?\d+)?\s*$").unwrap());
static APPENDIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Bilaga(?: (?P<num>\d+ ?[a-zA-Z]?|[A-Z])\b)?(?P<rest>(?:\s*[:.–-]\s*|\s+).*)?$")
        .unwrap()
});
static NUMBERED_DOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<num>\d{1,3}(?: ?[a-z])?)\. +\S").unwrap());
static NUMBERED_PAREN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<num>\d{1,3})\) +\S").unwrap());
static LETTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<num>[a-zåäö])\) +\S").unwrap());
static DASH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-–—] +\S").unwrap());
static HEADING_ALLOWED_PERIOD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:m\. ?m\.|m\. ?fl\.|etc\.)$").unwrap());
static HEADING_CONTINUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:[,:;]| och| eller| samt)$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Blank,
    Division,
    RevokedChapter,
    RevokedSection,
    Chapter,
    Section,
    Table,
    TransitionalProvisions,
    TransitionalProvision,
    Appendix,
    NumberedList,
    DashList,
    LetterList,
    Heading,
    Paragraph,
    EndOfInput,
}

/// Numbering context read by predicates.
#[derive(Debug, Clone, Default)]
pub struct ParseState {
    pub current_section: Option<OrdinalValue>,
    pub last_was_heading: bool,
    pub in_table: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitledMatch {
    pub ordinal: Option<OrdinalValue>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMatch {
    pub ordinal: OrdinalValue,
    pub rest: String,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralClassifier;

impl StructuralClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, cursor: &TextCursor, state: &ParseState) -> Category {
        let Some(raw) = cursor.peek_paragraph_at(1) else {
            return Category::EndOfInput;
        };
        self.classify_paragraph(cursor, 1, &raw, state)
    }

    /// Classifies `raw`, the `n`th paragraph of lookahead.
    pub fn classify_paragraph(
        &self,
        cursor: &TextCursor,
        n: usize,
        raw: &str,
        state: &ParseState,
    ) -> Category {
        if raw.trim().is_empty() {
            return Category::Blank;
        }
        let p = strip_markers(raw);
        if p.is_empty() {
            return Category::Paragraph;
        }

        if match_division(&p).is_some() {
            Category::Division
        } else if match_revoked_chapter(&p).is_some() {
            Category::RevokedChapter
        } else if match_revoked_section(&p).is_some() {
            Category::RevokedSection
        } else if match_chapter(&p).is_some() {
            Category::Chapter
        } else if match_section(&p, state.current_section.as_ref()).is_some() {
            Category::Section
        } else if self.is_table(cursor, n, &p, state) {
            Category::Table
        } else if is_transitional_marker(&p) {
            Category::TransitionalProvisions
        } else if match_transitional_entry(&p).is_some() {
            Category::TransitionalProvision
        } else if match_appendix(&p).is_some() {
            Category::Appendix
        } else if numbered_item_ordinal(&p).is_some() {
            Category::NumberedList
        } else if is_dash_item(&p) {
            Category::DashList
        } else if letter_item_ordinal(&p).is_some() {
            Category::LetterList
        } else if self.is_heading(cursor, n, &p, HEADING_LOOKAHEAD_DEPTH) {
            Category::Heading
        } else {
            Category::Paragraph
        }
    }

    fn is_table(&self, cursor: &TextCursor, n: usize, p: &str, state: &ParseState) -> bool {
        let lines: Vec<&str> = non_empty_lines(p).collect();
        if lines.len() != 1 {
            return table_shape(p, false);
        }
        if !has_column_gap(lines[0]) {
            return false;
        }
        if state.in_table {
            return true;
        }
        match next_non_blank(cursor, n) {
            Some((_, next)) => {
                let next = strip_markers(&next);
                if looks_like_section(&next) || heading_shape(&next) {
                    false
                } else {
                    table_shape(&next, true)
                }
            }
            None => false,
        }
    }

    /// Heading shape plus lookahead confirming that a section (or another
    /// heading, up to `depth` levels) follows.
    pub fn is_heading(&self, cursor: &TextCursor, n: usize, p: &str, depth: usize) -> bool {
        if !heading_shape(p) {
            return false;
        }
        let Some((next_n, next)) = next_non_blank(cursor, n) else {
            return false;
        };
        let next = strip_markers(&next);
        if looks_like_section(&next) {
            return true;
        }
        depth > 0 && self.is_heading(cursor, next_n, &next, depth - 1)
    }
}

fn next_non_blank(cursor: &TextCursor, n: usize) -> Option<(usize, String)> {
    for offset in 1..=MAX_BLANK_SKIP {
        let candidate = cursor.peek_paragraph_at(n + offset)?;
        if !candidate.trim().is_empty() {
            return Some((n + offset, candidate));
        }
    }
    None
}

fn non_empty_lines(p: &str) -> impl Iterator<Item = &str> {
    p.lines().filter(|line| !line.trim().is_empty())
}

pub fn first_line(p: &str) -> &str {
    p.lines().next().unwrap_or("").trim()
}

pub fn has_column_gap(line: &str) -> bool {
    line.trim().contains("  ")
}

/// Shape test shared by classification and table-block continuation.
pub fn table_shape(p: &str, require_columns: bool) -> bool {
    let lines: Vec<&str> = non_empty_lines(p).collect();
    if lines.is_empty() {
        return false;
    }
    let column_lines = lines.iter().filter(|line| has_column_gap(line)).count();
    if lines.len() == 1 {
        return column_lines == 1;
    }
    if column_lines == lines.len() {
        return true;
    }
    if column_lines >= 2 && column_lines * 2 >= lines.len() {
        return true;
    }
    !require_columns
        && numbered_item_ordinal(lines[0]).is_none()
        && letter_item_ordinal(lines[0]).is_none()
        && !is_dash_item(lines[0])
        && lines.iter().all(|line| {
            let line = line.trim();
            line.chars().count() < SHORT_LINE_CHARS
                && !line.ends_with(['.', ',', ';', ':'])
        })
}

pub fn match_division(p: &str) -> Option<TitledMatch> {
    let caps = DIVISION_RE.captures(first_line(p))?;
    let mut title = caps.name("title").map(|m| m.as_str().trim().to_string());
    let rest = rest_lines(p);
    if !rest.is_empty() {
        title = Some(match title {
            Some(title) => format!("{title} {rest}"),
            None => rest,
        });
    }
    Some(TitledMatch {
        ordinal: Some(OrdinalValue::new(&caps["num"])),
        title,
    })
}

pub fn match_revoked_chapter(p: &str) -> Option<OrdinalValue> {
    let line = single_line(p);
    REVOKED_CHAPTER_RE
        .captures(&line)
        .map(|caps| OrdinalValue::new(&caps["num"]))
}

pub fn match_revoked_section(p: &str) -> Option<OrdinalValue> {
    let line = single_line(p);
    REVOKED_SECTION_RE
        .captures(&line)
        .map(|caps| OrdinalValue::new(&caps["num"]))
}

pub fn match_chapter(p: &str) -> Option<TitledMatch> {
    let line = first_line(p);
    let caps = CHAPTER_RE.captures(line)?;
    if CHAPTER_CONTINUATION_RE.is_match(line) {
        return None;
    }
    let title = caps.name("title").map(|m| m.as_str().trim()).unwrap_or("");
    if SECTION_MARK_START_RE.is_match(title) || title.starts_with('§') {
        return None;
    }
    if title.chars().next().is_some_and(char::is_lowercase) {
        return None;
    }
    let mut title = title.to_string();
    let rest = rest_lines(p);
    if !rest.is_empty() {
        if !title.is_empty() {
            title.push(' ');
        }
        title.push_str(&rest);
    }
    Some(TitledMatch {
        ordinal: Some(OrdinalValue::new(&caps["num"])),
        title: if title.is_empty() { None } else { Some(title) },
    })
}

/// Section start, rejecting citations in running text: a lowercase or
/// punctuation continuation after the mark, or a number that does not move
/// the numbering forward.
pub fn match_section(p: &str, current: Option<&OrdinalValue>) -> Option<SectionMatch> {
    let found = section_parts(p)?;
    if let Some(current) = current {
        if !found.ordinal.is_first() && found.ordinal <= *current {
            return None;
        }
    }
    Some(found)
}

fn section_parts(p: &str) -> Option<SectionMatch> {
    let caps = SECTION_RE
        .captures(p)
        .or_else(|| SECTION_OLD_RE.captures(p))?;
    let rest = caps
        .name("rest")
        .map(|m| m.as_str().trim())
        .unwrap_or("")
        .to_string();
    if rest
        .chars()
        .next()
        .is_some_and(|c| c.is_lowercase() || matches!(c, ',' | ';' | '§'))
    {
        return None;
    }
    Some(SectionMatch {
        ordinal: OrdinalValue::new(&caps["num"]),
        rest,
    })
}

pub fn looks_like_section(p: &str) -> bool {
    section_parts(p).is_some() || match_revoked_section(p).is_some()
}

pub fn is_transitional_marker(p: &str) -> bool {
    TRANSITIONAL_MARKER_RE.is_match(first_line(p))
}

pub fn match_transitional_entry(p: &str) -> Option<String> {
    TRANSITIONAL_ENTRY_RE
        .captures(first_line(p))
        .map(|caps| caps["id"].to_string())
}

pub fn match_appendix(p: &str) -> Option<TitledMatch> {
    let line = first_line(p);
    if line.chars().count() > 100 {
        return None;
    }
    let caps = APPENDIX_RE.captures(line)?;
    let mut title = caps
        .name("rest")
        .map(|m| {
            m.as_str()
                .trim()
                .trim_start_matches([':', '.', '–', '-'])
                .trim()
                .to_string()
        })
        .unwrap_or_default();
    let rest = rest_lines(p);
    if !rest.is_empty() {
        if !title.is_empty() {
            title.push(' ');
        }
        title.push_str(&rest);
    }
    Some(TitledMatch {
        ordinal: caps.name("num").map(|m| OrdinalValue::new(m.as_str())),
        title: if title.is_empty() { None } else { Some(title) },
    })
}

pub fn numbered_item_ordinal(p: &str) -> Option<OrdinalValue> {
    NUMBERED_DOT_RE
        .captures(p)
        .or_else(|| NUMBERED_PAREN_RE.captures(p))
        .map(|caps| OrdinalValue::new(&caps["num"]))
}

pub fn letter_item_ordinal(p: &str) -> Option<OrdinalValue> {
    LETTER_RE
        .captures(p)
        .map(|caps| OrdinalValue::new(&caps["num"]))
}

pub fn is_dash_item(p: &str) -> bool {
    DASH_RE.is_match(p)
}

/// Heading test without lookahead.
pub fn heading_shape(p: &str) -> bool {
    let p = p.trim();
    let Some(first) = p.chars().next() else {
        return false;
    };
    if first.is_lowercase() {
        return false;
    }
    if p.chars().count() > MAX_HEADING_CHARS {
        return false;
    }
    if looks_like_section(p)
        || numbered_item_ordinal(p).is_some()
        || letter_item_ordinal(p).is_some()
        || is_dash_item(p)
    {
        return false;
    }
    if p.ends_with('.') && !HEADING_ALLOWED_PERIOD_RE.is_match(p) {
        return false;
    }
    if HEADING_CONTINUATION_RE.is_match(p) {
        return false;
    }
    !table_shape(p, true)
}

fn rest_lines(p: &str) -> String {
    p.lines()
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn single_line(p: &str) -> String {
    p.split_whitespace().collect::<Vec<_>>().join(" ")
}
