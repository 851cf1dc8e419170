//! Sentinel rewriting applied before citation tagging.
//!
//! Two constructs confuse the tagger: hyphenated compounds joined by a
//! conjunction (`skatte- och avgiftslagen`) and law-suffix words that make a
//! name (`…lagen`, `…balken`). Both are rewritten with private-use characters
//! so that the grammar sees one token, and restored afterwards.

use regex::Regex;
use std::sync::LazyLock;

/// Replaces the space inside a joined compound.
pub const COMPOUND_JOINER: char = '\u{E000}';
/// Marks the start of a law-name suffix.
pub const SUFFIX_MARK: char = '\u{E001}';

static COMPOUND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+-) (och|eller|till) (\w+)").unwrap());
static SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\B(lagens?|balkens?|förordningens?|formens?|ordningens?|kungörelsens?|stadgans?)\b",
    )
    .unwrap()
});

pub fn escape(text: &str) -> String {
    let joined = COMPOUND_RE.replace_all(text, |caps: &regex::Captures| {
        format!(
            "{}{COMPOUND_JOINER}{}{COMPOUND_JOINER}{}",
            &caps[1], &caps[2], &caps[3]
        )
    });
    SUFFIX_RE
        .replace_all(&joined, |caps: &regex::Captures| {
            format!("{SUFFIX_MARK}{}", &caps[1])
        })
        .into_owned()
}

pub fn descape(text: &str) -> String {
    text.chars()
        .filter(|c| *c != SUFFIX_MARK)
        .map(|c| if c == COMPOUND_JOINER { ' ' } else { c })
        .collect()
}
