//! Hot path operations - zero allocation, zero panic
//!
//! This module contains latency-critical code:
//! - Message ingestion (scan, decode, count)

pub mod ingest;

pub use ingest::{IngestSummary, Ingestor, MessageOutcome};
