//! Time-windowed behavioral feature extraction
//!
//! Collects raw interaction events (touch, scroll, device motion) over a
//! fixed 3000 ms window and reduces them to stable numeric feature groups.
//!
//! Pipeline: InteractionSource → BehaviorCollector (Idle → Collecting →
//! Reducing → Idle) → BehavioralSummary

pub mod collector;
pub mod features;
pub mod types;

pub use collector::{
    BeginOutcome, BehaviorCollector, CollectorState, InteractionSource, SourceGuard,
};
pub use features::extract_features;
pub use types::{
    BehavioralSummary, InteractionEvent, InteractionKind, InteractionRhythm, MotionSample,
    MotionSignature, SampleWindow, ScrollAxis, ScrollBehavior, ScrollSample, TimingStats,
    TouchPatterns, TouchPoint, WindowInfo, WindowQualityFlag, COLLECTION_WINDOW_MS,
};
