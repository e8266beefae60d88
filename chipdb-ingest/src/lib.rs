//! chipdb-ingest library interface for testing
//!
//! Exposes the ingestion pipeline so integration tests can drive it
//! against temporary stores and input files.

pub mod pipeline;

pub use pipeline::{
    ingest_file, FileFailure, FileReport, IngestOptions, IngestPipeline, IngestSummary,
    UnrecognizedLine,
};
