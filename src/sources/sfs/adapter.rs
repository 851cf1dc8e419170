//! Single-document pipeline: header, applicability checks, body structure,
//! fragment ids with citations and terms, registry links.

use crate::document::PredicateRef;
use crate::error::DocumentError;
use crate::runtime::types::ParserResources;
use crate::sources::configs::ParserConfig;
use crate::sources::sfs::definitions::DefinitionFinder;
use crate::sources::sfs::fragments::FragmentIdAssigner;
use crate::sources::sfs::header::{check_applicability, read_header};
use crate::sources::sfs::parser::parse_body;
use crate::sources::sfs::reader::TextCursor;
use crate::sources::sfs::registry::{link_registry, Registry};
use crate::sources::SourceAdapter;
use crate::types::{DocumentInput, DocumentMetadata, DocumentStatus, ParsedDocument};

pub struct SfsAdapter;

pub static SFS_ADAPTER: SfsAdapter = SfsAdapter;

impl SourceAdapter for SfsAdapter {
    fn parse(
        &self,
        input: &DocumentInput,
        resources: &ParserResources,
        registry: &Registry,
        config: &ParserConfig,
    ) -> Result<ParsedDocument, DocumentError> {
        parse_document(input, resources, registry, config)
    }

    fn unit_label(&self, input: &DocumentInput) -> String {
        match &input.sfs_id {
            Some(id) => format!("SFS {id}"),
            None => "SFS (id from header)".to_string(),
        }
    }
}

/// Parses one statute. Revoked and inapplicable documents come back as
/// metadata-only output; other failures are errors.
pub fn parse_document(
    input: &DocumentInput,
    resources: &ParserResources,
    registry: &Registry,
    config: &ParserConfig,
) -> Result<ParsedDocument, DocumentError> {
    let mut cursor = TextCursor::new(&input.text, config.reader_options());
    let mut metadata =
        read_header(&mut cursor, &resources.authorities)?.unwrap_or_default();

    let sfs_id = match metadata.sfs_id.clone().or_else(|| input.sfs_id.clone()) {
        Some(id) => id,
        None => {
            return Ok(short_circuit(
                String::new(),
                metadata,
                DocumentError::NotApplicable {
                    reason: "no SFS number in header or input".to_string(),
                },
            ))
        }
    };
    metadata.sfs_id = Some(sfs_id.clone());
    metadata.registry = registry.get(&sfs_id).cloned();
    let uri = config.document_uri(&sfs_id);

    let act_validity = match check_applicability(
        &sfs_id,
        &metadata,
        metadata.registry.as_ref(),
        cursor.remaining(),
        config.reference_date(),
    ) {
        Ok(validity) => validity,
        Err(err) if err.is_short_circuit() => return Ok(short_circuit(uri, metadata, err)),
        Err(err) => return Err(err),
    };

    let mut body = parse_body(cursor)?.with_validity(act_validity);

    let resolver = resources.resolver(config);
    let predicate = PredicateRef::new(config.reference_predicate.clone());
    FragmentIdAssigner::new(
        &resolver,
        DefinitionFinder::new(config.concept_base.clone()),
        uri.clone(),
        Some(predicate),
    )
    .with_skipped_labels(config.skipped_labels())
    .assign(&mut body)?;

    link_registry(&mut body, registry, &resolver, &uri)?;

    tracing::info!(
        "[Parser] {}: parsed {} top-level units",
        sfs_id,
        body.children().len()
    );
    Ok(ParsedDocument {
        uri,
        metadata,
        status: DocumentStatus::Parsed,
        body: Some(body),
    })
}

fn short_circuit(uri: String, metadata: DocumentMetadata, err: DocumentError) -> ParsedDocument {
    tracing::info!("[Parser] {}", err);
    let status = match err {
        DocumentError::Revoked { revoked_on, .. } => DocumentStatus::Revoked { revoked_on },
        other => DocumentStatus::NotApplicable {
            reason: other.to_string(),
        },
    };
    ParsedDocument {
        uri,
        metadata,
        status,
        body: None,
    }
}
