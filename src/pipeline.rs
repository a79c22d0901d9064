//! Pipeline orchestration
//!
//! This module provides the public API for tracekit: enriching a component
//! bag with derived metadata, scoring confidence, and synthesizing the
//! fingerprint digest, plus the stateful engine that owns the behavioral
//! collector.

use crate::behavior::{BehaviorCollector, BehavioralSummary, InteractionSource};
use crate::confidence::{score_confidence, ConfidenceResult};
use crate::context::{classify, EnvironmentMarkers, ExecutionContext};
use crate::error::EngineError;
use crate::schema::{self, ComponentBag};
use crate::synthesizer::synthesize_fingerprint;
use crate::weights::{adapt_weights, baseline_weights, WeightTable};
use crate::{ENGINE_NAME, TRACEKIT_VERSION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Result of one full fingerprinting pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FingerprintReport {
    /// Synthesized fingerprint digest.
    pub digest: String,
    /// Confidence and stability scoring.
    pub confidence: ConfidenceResult,
    /// Classified execution context.
    pub context: ExecutionContext,
    /// Wall-clock time the pass completed.
    pub computed_at: DateTime<Utc>,
}

/// Parse a component bag from JSON. The top level must be an object.
pub fn parse_components(json: &str) -> Result<ComponentBag, EngineError> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| EngineError::ParseError(format!("Failed to parse component bag: {e}")))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(EngineError::ParseError(format!(
            "Component bag must be a JSON object, got {other}"
        ))),
    }
}

/// Produce an enriched copy of the bag carrying the weight table and
/// execution context under the reserved `_meta` key.
///
/// The input bag is never mutated; probe-supplied entries are carried over
/// unchanged.
pub fn enrich_components(
    components: &ComponentBag,
    markers: &EnvironmentMarkers,
) -> ComponentBag {
    enrich_with(components, markers, &baseline_weights())
}

fn enrich_with(
    components: &ComponentBag,
    markers: &EnvironmentMarkers,
    baseline: &WeightTable,
) -> ComponentBag {
    let context = classify(markers, components);
    let weights = adapt_weights(baseline, &context);

    let mut enriched = components.clone();
    enriched.insert(
        schema::META_KEY.to_string(),
        json!({
            "context": context,
            "weights": weights,
            "engine": { "name": ENGINE_NAME, "version": TRACEKIT_VERSION },
            "computedAt": Utc::now().to_rfc3339(),
        }),
    );
    enriched
}

/// One-shot pass from component-bag JSON to report JSON (stateless).
///
/// # Example
/// ```ignore
/// let report_json = fingerprint_components(bag_json, &markers)?;
/// ```
pub fn fingerprint_components(
    components_json: &str,
    markers: &EnvironmentMarkers,
) -> Result<String, EngineError> {
    let components = parse_components(components_json)?;
    let report = FingerprintEngine::new().fingerprint(&components, markers);
    serde_json::to_string_pretty(&report).map_err(EngineError::JsonError)
}

/// Stateful engine owning the baseline weight table and the process-wide
/// behavioral collector.
///
/// Scoring and synthesis are pure reads over whatever is in the bag at call
/// time; the collector is the only mutable state, gated by its own
/// Idle/Collecting tag.
pub struct FingerprintEngine {
    baseline: WeightTable,
    collector: BehaviorCollector,
}

impl Default for FingerprintEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FingerprintEngine {
    /// Engine with the standard baseline weights and 3000 ms window.
    pub fn new() -> Self {
        Self {
            baseline: baseline_weights(),
            collector: BehaviorCollector::new(),
        }
    }

    /// Engine with a caller-tuned baseline table.
    pub fn with_baseline(baseline: WeightTable) -> Self {
        Self {
            baseline,
            collector: BehaviorCollector::new(),
        }
    }

    /// The owned behavioral collector, for callers driving begin/record/
    /// finish themselves.
    pub fn collector(&mut self) -> &mut BehaviorCollector {
        &mut self.collector
    }

    /// Drive one behavioral collection pass.
    pub fn collect_behavior<S: InteractionSource>(&mut self, source: &mut S) -> BehavioralSummary {
        self.collector.collect(source)
    }

    /// Context-adjusted weight table for a classified context.
    pub fn weights_for(&self, context: &ExecutionContext) -> WeightTable {
        adapt_weights(&self.baseline, context)
    }

    /// Enriched copy of the bag using this engine's baseline.
    pub fn enrich(&self, components: &ComponentBag, markers: &EnvironmentMarkers) -> ComponentBag {
        enrich_with(components, markers, &self.baseline)
    }

    /// Confidence for the bag under its classified context.
    pub fn confidence(
        &self,
        components: &ComponentBag,
        markers: &EnvironmentMarkers,
    ) -> ConfidenceResult {
        let context = classify(markers, components);
        score_confidence(components, &context)
    }

    /// Run a full pass: classify, adapt weights, score, synthesize.
    pub fn fingerprint(
        &self,
        components: &ComponentBag,
        markers: &EnvironmentMarkers,
    ) -> FingerprintReport {
        let context = classify(markers, components);
        let weights = adapt_weights(&self.baseline, &context);
        let confidence = score_confidence(components, &context);
        let digest = synthesize_fingerprint(components, &weights, &context);

        FingerprintReport {
            digest,
            confidence,
            context,
            computed_at: Utc::now(),
        }
    }

    /// Collect a behavioral window first, fold the summary into the bag
    /// under the `behavioral` key, then run a full pass on the result.
    pub fn fingerprint_with_behavior<S: InteractionSource>(
        &mut self,
        components: &ComponentBag,
        markers: &EnvironmentMarkers,
        source: &mut S,
    ) -> FingerprintReport {
        let summary = self.collector.collect(source);
        let mut bag = components.clone();
        if let Ok(value) = serde_json::to_value(&summary) {
            bag.insert(schema::BEHAVIORAL.to_string(), value);
        }
        self.fingerprint(&bag, markers)
    }
}
