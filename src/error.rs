//! Error types for tracekit

use thiserror::Error;

/// Errors that can occur at the crate's JSON boundaries.
///
/// Scoring, classification, and synthesis are total functions: a missing or
/// malformed component degrades precision, never aborts. Errors exist only
/// where JSON enters or leaves the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to parse component bag: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid interaction events: {0}")]
    InvalidEvents(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
