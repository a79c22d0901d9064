//! Per-signal trust weighting
//!
//! The weight table maps a signal-source key to a positive multiplier used
//! both by the fingerprint synthesizer (token multiplicity) and, indirectly,
//! by readers of an enriched bag. Weights default to 1.0 for keys missing
//! from the table.
//!
//! Embedded WebViews suppress canvas/audio entropy (privacy-preserving
//! rendering paths, shared GPU process) while exposing bridge metadata that
//! is unavailable anywhere else, so the adapted table shifts trust toward
//! where entropy actually lives in that context.

use crate::context::ExecutionContext;
use crate::schema;
use std::collections::BTreeMap;

/// Mapping from signal-source key to trust multiplier.
pub type WeightTable = BTreeMap<String, f64>;

/// Overrides applied when the pass runs inside the target bridge-hosted
/// view. Key-wise replacement: a key listed here wins outright; keys absent
/// keep their baseline value.
const TARGET_CONTEXT_OVERRIDES: &[(&str, f64)] = &[
    // Degraded inside an embedded WebView.
    (schema::CANVAS, 0.3),
    (schema::AUDIO, 0.2),
    (schema::FONTS, 0.4),
    (schema::PLUGINS, 0.1),
    // Uniquely reliable or uniquely available in the target context.
    (schema::TELEGRAM_WEB_APP, 2.5),
    (schema::WEB_VIEW, 2.0),
    (schema::BEHAVIORAL, 1.8),
    (schema::HAPTIC, 1.7),
    (schema::NETWORK, 1.6),
    // Stable device/locale identifiers.
    (schema::TOUCH_SUPPORT, 1.5),
    (schema::PLATFORM, 1.4),
    (schema::TIMEZONE, 1.3),
    (schema::VENDOR, 1.2),
    (schema::LANGUAGES, 1.2),
];

/// Baseline trust table: every well-known signal source at 1.0.
pub fn baseline_weights() -> WeightTable {
    schema::known_keys()
        .iter()
        .map(|key| (key.to_string(), 1.0))
        .collect()
}

/// Produce the context-adjusted table.
///
/// Outside the target context the baseline is returned unchanged. Inside
/// it, the fixed override set is overlaid key-wise.
pub fn adapt_weights(baseline: &WeightTable, context: &ExecutionContext) -> WeightTable {
    let mut adapted = baseline.clone();
    if !context.is_target_web_view {
        return adapted;
    }

    for (key, weight) in TARGET_CONTEXT_OVERRIDES {
        adapted.insert(key.to_string(), *weight);
    }
    adapted
}

/// Weight for a key, defaulting to 1.0 when absent from the table.
pub fn weight_for(table: &WeightTable, key: &str) -> f64 {
    table.get(key).copied().unwrap_or(1.0)
}
