//! Tracekit - On-device signal fusion engine for client fingerprinting
//!
//! Tracekit combines many weak, independently-collected client signals into
//! one bounded confidence score and one reproducible weighted digest through
//! a deterministic pipeline: context classification → trust weighting →
//! confidence scoring → digest synthesis.
//!
//! ## Modules
//!
//! - **Core Engine**: classify the execution context, adapt per-signal trust
//!   weights, score confidence, synthesize the digest
//! - **Behavior Module**: reduce a 3000 ms window of raw interaction events
//!   to stable behavioral feature groups

pub mod behavior;
pub mod confidence;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod schema;
pub mod synthesizer;
pub mod weights;

pub use confidence::{score_confidence, ConfidenceResult};
pub use context::{classify, EnvironmentMarkers, ExecutionContext, NetworkQuality, WebViewVariant};
pub use error::EngineError;
pub use pipeline::{
    enrich_components, fingerprint_components, parse_components, FingerprintEngine,
    FingerprintReport,
};
pub use synthesizer::synthesize_fingerprint;
pub use weights::{adapt_weights, baseline_weights, weight_for, WeightTable};

// Behavioral exports
pub use behavior::{BehaviorCollector, BehavioralSummary, InteractionSource};

// Schema exports
pub use schema::ComponentBag;

/// Engine version embedded in enriched bags and reports
pub const TRACEKIT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name for enriched-bag metadata
pub const ENGINE_NAME: &str = "tracekit";
