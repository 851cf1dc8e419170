pub mod document;
pub mod error;
pub mod ingest;
pub mod runtime;
pub mod sources;
pub mod types;
