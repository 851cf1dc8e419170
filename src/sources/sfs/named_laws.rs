//! Read-only name tables: statute names to SFS ids, and issuing
//! authorities to URIs.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub const EMBEDDED_NAMED_LAWS: &str = include_str!("../../../assets/named_laws.json");
pub const EMBEDDED_AUTHORITIES: &str = include_str!("../../../assets/authorities.json");

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
struct RawTable(HashMap<String, String>);

fn read_table<P: AsRef<Path>>(path: P, what: &str) -> Result<HashMap<String, String>, String> {
    let content = fs::read_to_string(path.as_ref())
        .map_err(|e| format!("Failed to read {what} table: {e}"))?;
    parse_table(&content, what)
}

fn parse_table(content: &str, what: &str) -> Result<HashMap<String, String>, String> {
    let table: RawTable = serde_json::from_str(content)
        .map_err(|e| format!("Failed to parse {what} table: {e}"))?;
    Ok(table.0)
}

/// Statute names such as "brottsbalken", keyed lower-case.
#[derive(Debug, Clone, Default)]
pub struct NamedLawTable {
    entries: HashMap<String, String>,
}

impl NamedLawTable {
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_lowercase(), v.into()))
                .collect(),
        }
    }

    pub fn from_json(content: &str) -> Result<Self, String> {
        Ok(Self::from_entries(parse_table(content, "named law")?))
    }

    pub fn embedded() -> Result<Self, String> {
        Self::from_json(EMBEDDED_NAMED_LAWS)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        Ok(Self::from_entries(read_table(path, "named law")?))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// SFS id for a statute name. Genitive forms ("brottsbalkens") fall back
    /// to the base form.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        let key = name.trim().to_lowercase();
        if let Some(id) = self.entries.get(&key) {
            return Some(id);
        }
        key.strip_suffix('s')
            .and_then(|base| self.entries.get(base))
            .map(String::as_str)
    }
}

/// Issuing authorities ("Justitiedepartementet") to their URIs.
#[derive(Debug, Clone, Default)]
pub struct AuthorityTable {
    entries: HashMap<String, String>,
}

impl AuthorityTable {
    pub fn from_json(content: &str) -> Result<Self, String> {
        Ok(Self {
            entries: parse_table(content, "authority")?,
        })
    }

    pub fn embedded() -> Result<Self, String> {
        Self::from_json(EMBEDDED_AUTHORITIES)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        Ok(Self {
            entries: read_table(path, "authority")?,
        })
    }

    /// Exact match first, then a case-insensitive one. Header values often
    /// carry a unit suffix ("Justitiedepartementet L5"), so the leading
    /// word is tried last.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        if let Some(uri) = self.entries.get(name) {
            return Some(uri);
        }
        let lowered = name.to_lowercase();
        let first_word = lowered.split_whitespace().next().unwrap_or("");
        self.entries
            .iter()
            .find(|(key, _)| key.to_lowercase() == lowered)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|(key, _)| key.to_lowercase() == first_word)
            })
            .map(|(_, uri)| uri.as_str())
    }
}
