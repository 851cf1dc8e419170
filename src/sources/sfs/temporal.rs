//! In-line temporal markers such as `/Upphör att gälla U:2012-07-01/`.

use crate::document::Validity;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"/(?:Rubriken )?(?P<kind>[Uu]pphör att gälla U|[Tt]räder i kraft I):(?P<when>\d{4}-\d{2}-\d{2}|den dag (?:som )?regeringen (?:bestämmer|föreskriver))/",
    )
    .expect("MARKER_RE should compile")
});
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Expires,
    EntryIntoForce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerPoint {
    On(NaiveDate),
    ByAuthority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporalMarker {
    pub kind: MarkerKind,
    pub point: MarkerPoint,
}

impl TemporalMarker {
    fn apply(&self, validity: &mut Validity) {
        match (self.kind, self.point) {
            (MarkerKind::Expires, MarkerPoint::On(date)) => validity.expires = Some(date),
            (MarkerKind::Expires, MarkerPoint::ByAuthority) => validity.expires_by_authority = true,
            (MarkerKind::EntryIntoForce, MarkerPoint::On(date)) => {
                validity.entry_into_force = Some(date)
            }
            (MarkerKind::EntryIntoForce, MarkerPoint::ByAuthority) => {
                validity.entry_by_authority = true
            }
        }
    }
}

pub fn find_markers(text: &str) -> Vec<TemporalMarker> {
    MARKER_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let kind = if caps["kind"].to_lowercase().starts_with("upphör") {
                MarkerKind::Expires
            } else {
                MarkerKind::EntryIntoForce
            };
            let when = &caps["when"];
            let point = if when.starts_with("den dag") {
                MarkerPoint::ByAuthority
            } else {
                match NaiveDate::parse_from_str(when, "%Y-%m-%d") {
                    Ok(date) => MarkerPoint::On(date),
                    Err(err) => {
                        tracing::warn!("[Parser] ignoring invalid marker date {}: {}", when, err);
                        return None;
                    }
                }
            };
            Some(TemporalMarker { kind, point })
        })
        .collect()
}

pub fn has_marker(text: &str) -> bool {
    MARKER_RE.is_match(text)
}

pub fn strip_markers(text: &str) -> String {
    if !MARKER_RE.is_match(text) {
        return text.to_string();
    }
    let stripped = MARKER_RE.replace_all(text, "");
    let lines: Vec<String> = stripped
        .lines()
        .map(|line| WHITESPACE_RE.replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();
    lines.join("\n")
}

/// Replaces each marker with spaces of the same width, keeping the character
/// columns of the surrounding text.
pub fn blank_markers(text: &str) -> String {
    MARKER_RE
        .replace_all(text, |caps: &regex::Captures| {
            " ".repeat(caps[0].chars().count())
        })
        .into_owned()
}

/// Removes markers from `text` and returns the remaining text together with
/// the validity they describe.
/// Markers with unusable dates are still removed from the text.
pub fn extract_validity(text: &str) -> (String, Option<Validity>) {
    if !has_marker(text) {
        return (text.to_string(), None);
    }
    let validity = validity_from_markers(&find_markers(text));
    (strip_markers(text), validity)
}

pub fn validity_from_markers(markers: &[TemporalMarker]) -> Option<Validity> {
    let mut validity = Validity::default();
    for marker in markers {
        marker.apply(&mut validity);
    }
    validity.into_option()
}
