use crate::sources::configs::ParserConfig;
use crate::sources::sfs::cross_references::ReferenceResolver;
use crate::sources::sfs::grammar::CitationGrammar;
use crate::sources::sfs::named_laws::{AuthorityTable, NamedLawTable};
use std::sync::Arc;

/// Compiled grammar and lookup tables, loaded once and shared read-only
/// between documents.
#[derive(Debug, Clone)]
pub struct ParserResources {
    pub grammar: Arc<CitationGrammar>,
    pub named_laws: Arc<NamedLawTable>,
    pub authorities: Arc<AuthorityTable>,
}

impl ParserResources {
    /// Embedded assets unless the config points at files.
    pub fn load(config: &ParserConfig) -> Result<Self, String> {
        let grammar = match &config.grammar_path {
            Some(path) => CitationGrammar::load_from_file(path)?,
            None => CitationGrammar::embedded().map_err(|e| e.to_string())?,
        };
        let named_laws = match &config.named_laws_path {
            Some(path) => NamedLawTable::load_from_file(path)?,
            None => NamedLawTable::embedded()?,
        };
        let authorities = match &config.authorities_path {
            Some(path) => AuthorityTable::load_from_file(path)?,
            None => AuthorityTable::embedded()?,
        };
        tracing::debug!(
            "[Parser] loaded grammar v{} ({} rules), {} named laws",
            grammar.version(),
            grammar.rules().len(),
            named_laws.len()
        );
        Ok(Self {
            grammar: Arc::new(grammar),
            named_laws: Arc::new(named_laws),
            authorities: Arc::new(authorities),
        })
    }

    pub fn embedded() -> Result<Self, String> {
        Self::load(&ParserConfig::default())
    }

    pub fn resolver(&self, config: &ParserConfig) -> ReferenceResolver {
        ReferenceResolver::new(
            Arc::clone(&self.grammar),
            Arc::clone(&self.named_laws),
            config.base_uri_prefix.clone(),
        )
    }
}
