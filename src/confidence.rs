//! Confidence scoring
//!
//! Computes a bounded confidence score and an independent stability score
//! for one fingerprinting pass. Every factor is gated on a structural
//! precondition of its source component, not mere key presence; a missing
//! or malformed component contributes zero, never an error.

use crate::context::{behavioral_has_data, ExecutionContext};
use crate::schema::{self, ComponentBag};
use serde::{Deserialize, Serialize};

/// Fixed starting score before any signal is considered.
const BASE_SCORE: f64 = 0.5;

/// Ceiling inside the target bridge context.
const TARGET_CEILING: f64 = 0.9;

/// Ceiling outside the target context.
const BROWSER_CEILING: f64 = 0.85;

/// Hard clamp applied to the final score, regardless of intermediate
/// arithmetic.
const SCORE_FLOOR: f64 = 0.1;
const SCORE_CAP: f64 = 0.9;

/// Result of confidence scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceResult {
    /// Bounded confidence in the fingerprint, always within `[0.1, 0.9]`.
    pub score: f64,
    /// Whether target-context scoring applied.
    pub context_adjusted: bool,
    /// Contribution from windowed behavioral features.
    pub behavioral_factor: f64,
    /// Contribution from WebView self-identification.
    pub web_view_factor: f64,
    /// Contribution from bridge-attributed haptics.
    pub haptic_factor: f64,
    /// Contribution from network connection/entropy data.
    pub network_factor: f64,
    /// Expected fingerprint stability across sessions, within `[0, 1]`.
    pub stability_score: f64,
}

/// Score a component bag under a classified execution context.
///
/// Algorithm: base 0.5, a platform-family nudge, four structurally-gated
/// factors, an independent stability ratio, then a context-specific combine
/// capped at 0.9 (target) or 0.85 (browser) and hard-clamped into
/// `[0.1, 0.9]`.
pub fn score_confidence(components: &ComponentBag, context: &ExecutionContext) -> ConfidenceResult {
    let base = BASE_SCORE + platform_nudge(components);

    let behavioral_factor = if components
        .get(schema::BEHAVIORAL)
        .map(behavioral_has_data)
        .unwrap_or(false)
    {
        0.2
    } else {
        0.0
    };

    let embedded_as_target = components.get(schema::WEB_VIEW).map(|value| {
        schema::field_bool(value, "isWebView")
            && schema::field_str(value, "variant") == Some("telegram")
    });
    let web_view_factor = if embedded_as_target.unwrap_or(false) {
        0.25
    } else {
        0.0
    };

    let bridge_haptics = components.get(schema::HAPTIC).map(|value| {
        schema::field_bool(value, "available")
            && schema::field_str(value, "source") == Some("telegram")
    });
    let haptic_factor = if bridge_haptics.unwrap_or(false) { 0.15 } else { 0.0 };

    let network_populated = components.get(schema::NETWORK).map(|value| {
        schema::has_data(value, "connection") && schema::has_data(value, "ipEntropy")
    });
    let network_factor = if network_populated.unwrap_or(false) { 0.1 } else { 0.0 };

    let stability_score = stability(components, context);

    let combined = if context.is_target_web_view {
        let mut score =
            (base + behavioral_factor + web_view_factor + haptic_factor + network_factor)
                .min(TARGET_CEILING);
        if context.has_behavioral_data && context.has_haptic_feedback {
            score += 0.05;
        }
        score
    } else {
        (base + (behavioral_factor + network_factor) * 0.5).min(BROWSER_CEILING)
    };

    ConfidenceResult {
        score: combined.clamp(SCORE_FLOOR, SCORE_CAP),
        context_adjusted: context.is_target_web_view,
        behavioral_factor,
        web_view_factor,
        haptic_factor,
        network_factor,
        stability_score,
    }
}

/// Platform-family nudge: the iOS family carries the richest bridge support
/// (+0.1); Android is the secondary family (+0.05).
fn platform_nudge(components: &ComponentBag) -> f64 {
    let platform = match components.get(schema::PLATFORM) {
        Some(value) => schema::component_text(value).to_ascii_lowercase(),
        None => return 0.0,
    };

    if platform.contains("iphone") || platform.contains("ipad") || platform.contains("ipod") {
        0.1
    } else if platform.contains("android") {
        0.05
    } else {
        0.0
    }
}

/// Stability ratio over structurally present identity signals.
///
/// Each present signal adds one unit to both the numerator and the
/// denominator; the target context adds a 1.5-unit denominator share and
/// earns up to 1.5 numerator units (1.0 for a known host version, 0.5 for
/// haptic feedback). An empty ratio defaults to 0.5.
fn stability(components: &ComponentBag, context: &ExecutionContext) -> f64 {
    let mut numerator: f64 = 0.0;
    let mut denominator: f64 = 0.0;

    let mut tally = |present: bool| {
        if present {
            numerator += 1.0;
            denominator += 1.0;
        }
    };

    tally(schema::is_present(components, schema::PLATFORM));
    tally(schema::is_present(components, schema::TIMEZONE));
    tally(
        schema::is_present(components, schema::HARDWARE_CONCURRENCY)
            && schema::is_present(components, schema::DEVICE_MEMORY),
    );
    tally(schema::is_present(components, schema::LANGUAGES));

    if context.is_target_web_view {
        denominator += 1.5;
        if context.host_version.is_some() {
            numerator += 1.0;
        }
        if context.has_haptic_feedback {
            numerator += 0.5;
        }
    }

    if denominator > 0.0 {
        (numerator / denominator).clamp(0.0, 1.0)
    } else {
        0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{classify, EnvironmentMarkers};
    use serde_json::json;

    fn target_context(bag: &ComponentBag) -> ExecutionContext {
        classify(&EnvironmentMarkers::new("telegram", true), bag)
    }

    fn browser_context(bag: &ComponentBag) -> ExecutionContext {
        classify(
            &EnvironmentMarkers::new("Mozilla/5.0 Chrome/120.0 Safari/537.36", false),
            bag,
        )
    }

    #[test]
    fn test_empty_bag_browser_scores_exactly_half() {
        let bag = ComponentBag::new();
        let result = score_confidence(&bag, &browser_context(&bag));
        assert_eq!(result.score, 0.5);
        assert!(!result.context_adjusted);
        assert_eq!(result.behavioral_factor, 0.0);
        assert_eq!(result.web_view_factor, 0.0);
        assert_eq!(result.haptic_factor, 0.0);
        assert_eq!(result.network_factor, 0.0);
    }

    #[test]
    fn test_empty_bag_stability_defaults_to_half() {
        let bag = ComponentBag::new();
        let result = score_confidence(&bag, &browser_context(&bag));
        assert_eq!(result.stability_score, 0.5);
    }

    #[test]
    fn test_touch_only_target_pass() {
        // iPhone platform + timezone + behavioral touch data, target context:
        // base 0.6, behavioral 0.2, everything else 0 => 0.8.
        let mut bag = ComponentBag::new();
        bag.insert("platform".to_string(), json!("iPhone"));
        bag.insert("timezone".to_string(), json!("exists"));
        bag.insert(
            "behavioral".to_string(),
            json!({"touchPatterns": {"touchFrequency": 2.0}}),
        );

        let context = target_context(&bag);
        let result = score_confidence(&bag, &context);

        assert_eq!(result.behavioral_factor, 0.2);
        assert_eq!(result.web_view_factor, 0.0);
        assert!((result.score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_fully_loaded_target_bag_caps_at_hard_limit() {
        let mut bag = ComponentBag::new();
        bag.insert("platform".to_string(), json!("iPhone"));
        bag.insert("timezone".to_string(), json!("Europe/Prague"));
        bag.insert("languages".to_string(), json!([["en-US"]]));
        bag.insert("hardwareConcurrency".to_string(), json!(8));
        bag.insert("deviceMemory".to_string(), json!(4));
        bag.insert(
            "behavioral".to_string(),
            json!({"touchPatterns": {"touchFrequency": 2.0}, "motionSignature": {"tremor": 0.1}}),
        );
        bag.insert("webView".to_string(), json!({"isWebView": true, "variant": "telegram"}));
        bag.insert("haptic".to_string(), json!({"available": true, "source": "telegram"}));
        bag.insert(
            "network".to_string(),
            json!({"connection": {"effectiveType": "4g"}, "ipEntropy": "9f3a"}),
        );

        let context = target_context(&bag);
        let result = score_confidence(&bag, &context);

        assert_eq!(result.behavioral_factor, 0.2);
        assert_eq!(result.web_view_factor, 0.25);
        assert_eq!(result.haptic_factor, 0.15);
        assert_eq!(result.network_factor, 0.1);
        // 0.6 + 0.7 saturates the target ceiling, the dual-signal bonus
        // would push past it, and the hard clamp holds the cap.
        assert_eq!(result.score, 0.9);
    }

    #[test]
    fn test_browser_context_halves_portable_factors() {
        let mut bag = ComponentBag::new();
        bag.insert(
            "behavioral".to_string(),
            json!({"touchPatterns": {"touchFrequency": 2.0}}),
        );
        bag.insert(
            "network".to_string(),
            json!({"connection": {"effectiveType": "4g"}, "ipEntropy": "9f3a"}),
        );

        let result = score_confidence(&bag, &browser_context(&bag));
        // 0.5 + (0.2 + 0.1) * 0.5
        assert!((result.score - 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_webview_factor_requires_target_variant() {
        let mut bag = ComponentBag::new();
        bag.insert("webView".to_string(), json!({"isWebView": true, "variant": "android"}));
        let result = score_confidence(&bag, &target_context(&bag));
        assert_eq!(result.web_view_factor, 0.0);
    }

    #[test]
    fn test_haptic_factor_requires_bridge_attribution() {
        let mut bag = ComponentBag::new();
        bag.insert("haptic".to_string(), json!({"available": true, "source": "navigator"}));
        let result = score_confidence(&bag, &target_context(&bag));
        assert_eq!(result.haptic_factor, 0.0);
    }

    #[test]
    fn test_network_factor_requires_both_halves() {
        let mut bag = ComponentBag::new();
        bag.insert("network".to_string(), json!({"connection": {"effectiveType": "4g"}}));
        let result = score_confidence(&bag, &target_context(&bag));
        assert_eq!(result.network_factor, 0.0);
    }

    #[test]
    fn test_android_platform_takes_secondary_nudge() {
        let mut bag = ComponentBag::new();
        bag.insert("platform".to_string(), json!({"value": "Android 13"}));
        let result = score_confidence(&bag, &browser_context(&bag));
        assert!((result.score - 0.55).abs() < 1e-9);
    }

    #[test]
    fn test_target_stability_with_full_bridge_signals() {
        let mut bag = ComponentBag::new();
        bag.insert("platform".to_string(), json!("iPhone"));
        bag.insert("timezone".to_string(), json!("Europe/Prague"));
        bag.insert("languages".to_string(), json!(["en"]));
        bag.insert("hardwareConcurrency".to_string(), json!(6));
        bag.insert("deviceMemory".to_string(), json!(4));
        bag.insert(
            "telegramWebApp".to_string(),
            json!({"present": true, "version": "7.2"}),
        );
        bag.insert("haptic".to_string(), json!({"available": true, "source": "telegram"}));

        let context = target_context(&bag);
        let result = score_confidence(&bag, &context);
        // 4 + 1.5 earned of 4 + 1.5 possible.
        assert!((result.stability_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_target_stability_penalizes_missing_bridge_version() {
        let mut bag = ComponentBag::new();
        bag.insert("platform".to_string(), json!("iPhone"));
        bag.insert("timezone".to_string(), json!("Europe/Prague"));

        let context = classify(&EnvironmentMarkers::new("telegram", false), &bag);
        assert!(context.host_version.is_none());

        let result = score_confidence(&bag, &context);
        // 2 earned of 3.5 possible.
        assert!((result.stability_score - 2.0 / 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_score_bounds_hold_for_arbitrary_shapes() {
        let mut bag = ComponentBag::new();
        bag.insert("platform".to_string(), json!(["not", "a", "string"]));
        bag.insert("webView".to_string(), json!(3.14));
        bag.insert("haptic".to_string(), json!([true]));
        bag.insert("network".to_string(), json!("offline"));
        bag.insert("behavioral".to_string(), json!(false));

        for context in [target_context(&bag), browser_context(&bag)] {
            let result = score_confidence(&bag, &context);
            assert!(result.score >= 0.1 && result.score <= 0.9);
            assert!(result.stability_score >= 0.0 && result.stability_score <= 1.0);
        }
    }

    #[test]
    fn test_joint_hardware_condition() {
        // Under the target context the denominator carries the fixed 1.5
        // bridge share, which makes the joint condition observable.
        let mut bag = ComponentBag::new();
        bag.insert("platform".to_string(), json!("Linux x86_64"));
        bag.insert("hardwareConcurrency".to_string(), json!(16));

        let context = classify(&EnvironmentMarkers::new("telegram", false), &bag);

        // deviceMemory missing: 1 earned of 2.5 possible.
        let result = score_confidence(&bag, &context);
        assert!((result.stability_score - 1.0 / 2.5).abs() < 1e-9);

        // Both halves present: 2 earned of 3.5 possible.
        bag.insert("deviceMemory".to_string(), json!(8));
        let result = score_confidence(&bag, &context);
        assert!((result.stability_score - 2.0 / 3.5).abs() < 1e-9);
    }
}
