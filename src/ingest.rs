//! Batch driver. Documents are parsed in parallel; a failing document is
//! logged and counted and never stops the batch.

use crate::runtime::logging::{log_event, LogLevel};
use crate::runtime::types::ParserResources;
use crate::sources::adapter_for;
use crate::sources::configs::ParserConfig;
use crate::sources::sfs::registry::Registry;
use crate::types::{DocumentInput, DocumentStatus, ParsedDocument};
use rayon::prelude::*;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentFailure {
    pub label: String,
    pub error: String,
}

#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub parsed: usize,
    pub revoked: usize,
    pub not_applicable: usize,
    pub failed: usize,
    pub documents: Vec<ParsedDocument>,
    pub failures: Vec<DocumentFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.parsed + self.revoked + self.not_applicable + self.failed
    }

    fn record(&mut self, label: String, outcome: Result<ParsedDocument, String>) {
        match outcome {
            Ok(document) => {
                match document.status {
                    DocumentStatus::Parsed => self.parsed += 1,
                    DocumentStatus::Revoked { .. } => self.revoked += 1,
                    DocumentStatus::NotApplicable { .. } => self.not_applicable += 1,
                }
                self.documents.push(document);
            }
            Err(error) => {
                self.failed += 1;
                self.failures.push(DocumentFailure { label, error });
            }
        }
    }
}

pub fn ingest_batch(
    inputs: &[DocumentInput],
    resources: &ParserResources,
    registry: &Registry,
    config: &ParserConfig,
) -> BatchReport {
    log_event(
        LogLevel::Info,
        &format!("Starting batch of {} documents", inputs.len()),
        None,
    );

    let outcomes: Vec<(String, Result<ParsedDocument, String>)> = inputs
        .par_iter()
        .map(|input| {
            let adapter = adapter_for(input.source);
            let label = adapter.unit_label(input);
            let outcome = adapter
                .parse(input, resources, registry, config)
                .map_err(|err| err.to_string());
            if let Err(err) = &outcome {
                log_event(
                    LogLevel::Error,
                    &format!("{label} failed"),
                    Some(serde_json::json!({ "error": err })),
                );
            }
            (label, outcome)
        })
        .collect();

    let mut report = BatchReport::default();
    for (label, outcome) in outcomes {
        report.record(label, outcome);
    }

    log_event(
        LogLevel::Info,
        "Batch complete",
        Some(serde_json::json!({
            "parsed": report.parsed,
            "revoked": report.revoked,
            "notApplicable": report.not_applicable,
            "failed": report.failed,
        })),
    );
    report
}
