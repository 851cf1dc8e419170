//! Loader for the citation grammar asset.

use crate::error::ResolveError;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

pub const EMBEDDED_GRAMMAR: &str = include_str!("../../../assets/sfs.grammar");

/// Capture names the resolver understands.
pub const COMPONENT_NAMES: &[&str] = &[
    "law",
    "same_law",
    "named_law",
    "lawref",
    "chapter",
    "section",
    "section_list",
    "element",
    "piece",
    "item",
];

static DEFINITION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<name>[A-Za-z][A-Za-z0-9]*)\s*=\s*(?P<body>.*)$").unwrap());
static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@version\s+(?P<version>\d+)\s*$").unwrap());
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(?P<name>[A-Za-z][A-Za-z0-9]*Ref(?:ID)?)\}").unwrap());

#[derive(Debug, Clone)]
struct Definition {
    name: String,
    body: String,
    line: usize,
}

impl Definition {
    fn is_fragment(&self) -> bool {
        self.name.ends_with("RefID")
    }
}

#[derive(Debug, Clone)]
pub struct GrammarRule {
    pub name: String,
    pub regex: Regex,
}

/// Compiled top-level rules, in declaration order.
#[derive(Debug, Clone)]
pub struct CitationGrammar {
    version: u32,
    rules: Vec<GrammarRule>,
}

impl CitationGrammar {
    pub fn embedded() -> Result<Self, ResolveError> {
        Self::parse(EMBEDDED_GRAMMAR)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read grammar {}: {e}", path.display()))?;
        Self::parse(&content)
            .map_err(|e| format!("Failed to compile grammar {}: {e}", path.display()))
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn rules(&self) -> &[GrammarRule] {
        &self.rules
    }

    pub fn parse(source: &str) -> Result<Self, ResolveError> {
        let mut version = 0;
        let mut definitions: Vec<Definition> = Vec::new();

        for (idx, raw) in source.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim_end();
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if line.starts_with(char::is_whitespace) {
                let Some(current) = definitions.last_mut() else {
                    return Err(grammar_error(line_no, "continuation line before any rule"));
                };
                current.body.push_str(trimmed);
                continue;
            }
            if let Some(caps) = VERSION_RE.captures(line) {
                version = caps["version"]
                    .parse()
                    .map_err(|_| grammar_error(line_no, "version is not a number"))?;
                continue;
            }
            let Some(caps) = DEFINITION_RE.captures(line) else {
                return Err(grammar_error(line_no, format!("cannot parse {line:?}")));
            };
            let name = caps["name"].to_string();
            if !name.ends_with("Ref") && !name.ends_with("RefID") {
                return Err(grammar_error(
                    line_no,
                    format!("rule {name} must end in Ref or RefID"),
                ));
            }
            if definitions.iter().any(|d| d.name == name) {
                return Err(grammar_error(line_no, format!("rule {name} defined twice")));
            }
            definitions.push(Definition {
                name,
                body: caps["body"].trim().to_string(),
                line: line_no,
            });
        }

        let by_name: HashMap<&str, &Definition> =
            definitions.iter().map(|d| (d.name.as_str(), d)).collect();
        let mut rules = Vec::new();
        for definition in definitions.iter().filter(|d| !d.is_fragment()) {
            let mut stack = Vec::new();
            let pattern = expand(definition, &by_name, &mut stack)?;
            let regex = Regex::new(&pattern)
                .map_err(|e| grammar_error(definition.line, e.to_string()))?;
            check_capture_names(definition, &regex)?;
            rules.push(GrammarRule {
                name: definition.name.clone(),
                regex,
            });
        }
        if rules.is_empty() {
            return Err(grammar_error(0, "grammar has no top-level rules"));
        }
        tracing::debug!(
            "[Parser] compiled citation grammar v{} with {} rules",
            version,
            rules.len()
        );
        Ok(Self { version, rules })
    }
}

fn grammar_error(line: usize, message: impl Into<String>) -> ResolveError {
    ResolveError::Grammar {
        line,
        message: message.into(),
    }
}

fn expand<'a>(
    definition: &'a Definition,
    by_name: &HashMap<&str, &'a Definition>,
    stack: &mut Vec<&'a str>,
) -> Result<String, ResolveError> {
    if stack.contains(&definition.name.as_str()) {
        return Err(grammar_error(
            definition.line,
            format!("rule {} refers to itself", definition.name),
        ));
    }
    stack.push(&definition.name);

    let mut out = String::with_capacity(definition.body.len());
    let mut last = 0;
    for caps in PLACEHOLDER_RE.captures_iter(&definition.body) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let name = &caps["name"];
        let Some(&fragment) = by_name.get(name) else {
            return Err(grammar_error(
                definition.line,
                format!("unknown rule {{{name}}}"),
            ));
        };
        if !fragment.is_fragment() {
            return Err(grammar_error(
                definition.line,
                format!("{{{name}}} is a top-level rule and cannot be embedded"),
            ));
        }
        out.push_str(&definition.body[last..whole.start()]);
        out.push_str("(?:");
        out.push_str(&expand(fragment, by_name, stack)?);
        out.push(')');
        last = whole.end();
    }
    out.push_str(&definition.body[last..]);

    stack.pop();
    Ok(out)
}

fn check_capture_names(definition: &Definition, regex: &Regex) -> Result<(), ResolveError> {
    let known: HashSet<&str> = COMPONENT_NAMES.iter().copied().collect();
    for name in regex.capture_names().flatten() {
        if !known.contains(name) {
            return Err(grammar_error(
                definition.line,
                format!("unknown component {name} in {}", definition.name),
            ));
        }
    }
    Ok(())
}
