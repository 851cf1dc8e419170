//! Header block ("SFS nr: …" lines) and the revocation checks that run
//! before the body is parsed.

use crate::document::Validity;
use crate::error::{CursorError, DocumentError};
use crate::sources::common::normalize_text;
use crate::sources::sfs::named_laws::AuthorityTable;
use crate::sources::sfs::reader::TextCursor;
use crate::sources::sfs::registry::RegistryEntry;
use crate::types::DocumentMetadata;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

pub const HEADER_START: &str = "SFS nr:";
pub const REVOKED_BODY_MARKER: &str = "Författningen har upphävts";

static FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<key>SFS nr|Rubrik|Departement/ myndighet|Departement/myndighet|Departement|Utfärdad|Ändrad|Ikraft|Upphävd|Övrigt|Omtryck|Tidsbegränsad)\s*:\s*(?P<value>.*)$").unwrap()
});
static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap());
static SFS_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:bih\. ?)?\d{4}:\d+(?: s\. ?\d+)?").unwrap());

pub fn is_header(paragraph: &str) -> bool {
    paragraph.trim_start().starts_with(HEADER_START)
}

/// Reads the header paragraph, if the input starts with one, leaving the
/// cursor at the body.
pub fn read_header(
    cursor: &mut TextCursor,
    authorities: &AuthorityTable,
) -> Result<Option<DocumentMetadata>, CursorError> {
    if !is_header(&cursor.peek_paragraph(1)) {
        return Ok(None);
    }
    let mut header = cursor.sub_cursor(|c| Ok(c.read_paragraph()))?;
    Ok(Some(parse_header(&mut header, authorities)))
}

/// Parses `Key: value` lines. Lines without a known key continue the
/// previous value.
pub fn parse_header(cursor: &mut TextCursor, authorities: &AuthorityTable) -> DocumentMetadata {
    let mut fields: Vec<(String, String)> = Vec::new();
    let linesep = cursor.linesep().to_string();
    for line in cursor.chunks(&linesep) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(caps) = FIELD_RE.captures(line) {
            fields.push((caps["key"].to_string(), caps["value"].trim().to_string()));
        } else if let Some((_, value)) = fields.last_mut() {
            value.push(' ');
            value.push_str(line);
        } else {
            tracing::debug!("[Parser] ignoring header line {:?}", line);
        }
    }

    let mut metadata = DocumentMetadata::default();
    for (key, value) in fields {
        let value = normalize_text(&value);
        if value.is_empty() {
            continue;
        }
        match key.as_str() {
            "SFS nr" => metadata.sfs_id = Some(value),
            "Rubrik" => metadata.title = Some(value),
            "Departement/myndighet" | "Departement/ myndighet" | "Departement" => {
                metadata.authority_uri = authorities.lookup(&value).map(str::to_string);
                if metadata.authority_uri.is_none() {
                    tracing::warn!("[Parser] unknown authority {:?}", value);
                }
                metadata.department = Some(value);
            }
            "Utfärdad" => metadata.issued = first_date(&value),
            "Ändrad" => {
                metadata.amended_through = SFS_ID_RE.find(&value).map(|m| m.as_str().to_string())
            }
            "Ikraft" => metadata.in_force = first_date(&value),
            "Upphävd" => metadata.revoked_on = first_date(&value),
            "Tidsbegränsad" => metadata.expires = first_date(&value),
            _ => {
                metadata.notes.push(value);
            }
        }
    }
    metadata
}

fn first_date(value: &str) -> Option<NaiveDate> {
    let found = DATE_RE.find(value)?;
    match NaiveDate::parse_from_str(found.as_str(), "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(err) => {
            tracing::warn!("[Parser] invalid header date {:?}: {}", value, err);
            None
        }
    }
}

/// Decides whether the body is parsed at all. On success returns the
/// validity the act itself carries (a revocation still in the future).
pub fn check_applicability(
    sfs_id: &str,
    metadata: &DocumentMetadata,
    registry_entry: Option<&RegistryEntry>,
    body: &str,
    reference_date: NaiveDate,
) -> Result<Option<Validity>, DocumentError> {
    let registry_revoked = registry_entry.and_then(|entry| entry.revoked_on);
    if let Some(revoked_on) = registry_revoked {
        if revoked_on < reference_date {
            return Err(DocumentError::Revoked {
                sfs_id: sfs_id.to_string(),
                revoked_on: Some(revoked_on),
            });
        }
    }
    if let Some(revoked_on) = metadata.revoked_on {
        if revoked_on < reference_date {
            return Err(DocumentError::Revoked {
                sfs_id: sfs_id.to_string(),
                revoked_on: Some(revoked_on),
            });
        }
    }

    let body = body.trim();
    if body.starts_with(REVOKED_BODY_MARKER) {
        return Err(DocumentError::Revoked {
            sfs_id: sfs_id.to_string(),
            revoked_on: registry_revoked.or(metadata.revoked_on),
        });
    }
    if body.is_empty() {
        return Err(DocumentError::NotApplicable {
            reason: format!("{sfs_id} has no body text"),
        });
    }

    let validity = Validity {
        entry_into_force: metadata.in_force,
        expires: registry_revoked.or(metadata.revoked_on).or(metadata.expires),
        ..Validity::default()
    };
    Ok(validity.into_option())
}
