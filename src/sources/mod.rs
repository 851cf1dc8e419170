use crate::error::DocumentError;
use crate::runtime::types::ParserResources;
use crate::sources::configs::ParserConfig;
use crate::sources::sfs::registry::Registry;
use crate::types::{DocumentInput, ParsedDocument, SourceKind};

pub mod common;
pub mod configs;
pub mod sfs;

pub trait SourceAdapter: Send + Sync {
    fn parse(
        &self,
        input: &DocumentInput,
        resources: &ParserResources,
        registry: &Registry,
        config: &ParserConfig,
    ) -> Result<ParsedDocument, DocumentError>;

    fn unit_label(&self, input: &DocumentInput) -> String;
}

pub fn adapter_for(source: SourceKind) -> &'static (dyn SourceAdapter + Send + Sync) {
    match source {
        SourceKind::Sfs => &sfs::adapter::SFS_ADAPTER,
    }
}
