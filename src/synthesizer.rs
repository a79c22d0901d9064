//! Weighted fingerprint synthesis
//!
//! Serializes the component bag into an ordered token list, biases it by
//! trust weight through token multiplicity, folds in context metadata, and
//! reduces the whole string to a compact hex digest.
//!
//! The multiplicity construction (repeating a token `round(weight * 10)`
//! times) is a deliberate low-complexity substitute for a weighted hash:
//! higher-trust sources dominate the digest by volume. The digest is NOT
//! collision-resistant and must not be treated as a cryptographic hash.

use crate::context::ExecutionContext;
use crate::schema::{self, ComponentBag};
use crate::weights::{weight_for, WeightTable};

/// Delimiter between tokens; not expected inside component values.
const TOKEN_DELIMITER: &str = "|";

/// Synthesize the fingerprint digest for a component bag.
///
/// For a fixed bag, weight table, and context the output is byte-for-byte
/// identical across calls and across processes; the bag's sorted key order
/// is part of that guarantee. Reserved keys contribute no tokens.
pub fn synthesize_fingerprint(
    components: &ComponentBag,
    weights: &WeightTable,
    context: &ExecutionContext,
) -> String {
    let mut tokens: Vec<String> = Vec::new();

    for (key, value) in components {
        if schema::is_reserved(key) {
            continue;
        }

        let token = format!("{key}:{}", schema::component_text(value));
        let repetitions = token_repetitions(weight_for(weights, key));
        for _ in 0..repetitions {
            tokens.push(token.clone());
        }
    }

    // Context tokens follow every component token, in fixed order.
    tokens.push(format!("target:{}", context.is_target_web_view));
    tokens.push(format!(
        "version:{}",
        context.host_version.as_deref().unwrap_or("unknown")
    ));
    tokens.push(format!("bridgeVariant:{}", context.web_view_variant.label()));

    fold_digest(&tokens.join(TOKEN_DELIMITER))
}

/// Token count for a trust weight: `max(1, round(weight * 10))`.
fn token_repetitions(weight: f64) -> usize {
    ((weight * 10.0).round() as i64).max(1) as usize
}

/// Rolling multiply-shift-accumulate fold over UTF-16 code units,
/// `h = (h << 5) - h + unit` in wrapping 32-bit signed arithmetic, rendered
/// as the hex of the absolute value.
///
/// UTF-16 units keep the fold aligned with the web-side collaborators'
/// view of string contents.
pub(crate) fn fold_digest(joined: &str) -> String {
    let mut hash: i32 = 0;
    for unit in joined.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit));
    }
    format!("{:x}", hash.unsigned_abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{classify, EnvironmentMarkers};
    use crate::weights::{adapt_weights, baseline_weights};
    use serde_json::json;

    fn sample_bag() -> ComponentBag {
        let mut bag = ComponentBag::new();
        bag.insert("platform".to_string(), json!("iPhone"));
        bag.insert("timezone".to_string(), json!("Europe/Prague"));
        bag.insert("canvas".to_string(), json!({"value": "c4nv45"}));
        bag.insert("languages".to_string(), json!([["en-US", "cs"]]));
        bag
    }

    fn target_context(bag: &ComponentBag) -> ExecutionContext {
        classify(
            &EnvironmentMarkers::new("telegram", true).with_host_version("7.2"),
            bag,
        )
    }

    #[test]
    fn test_digest_is_deterministic_across_calls() {
        let bag = sample_bag();
        let context = target_context(&bag);
        let weights = adapt_weights(&baseline_weights(), &context);

        let first = synthesize_fingerprint(&bag, &weights, &context);
        let second = synthesize_fingerprint(&bag, &weights, &context);
        assert_eq!(first, second);
    }

    #[test]
    fn test_digest_is_insertion_order_independent() {
        let bag = sample_bag();

        let mut reversed = ComponentBag::new();
        for (key, value) in bag.iter().rev() {
            reversed.insert(key.clone(), value.clone());
        }

        let context = target_context(&bag);
        let weights = baseline_weights();
        assert_eq!(
            synthesize_fingerprint(&bag, &weights, &context),
            synthesize_fingerprint(&reversed, &weights, &context),
        );
    }

    #[test]
    fn test_reserved_keys_contribute_nothing() {
        let bag = sample_bag();
        let context = target_context(&bag);
        let weights = baseline_weights();
        let clean = synthesize_fingerprint(&bag, &weights, &context);

        let mut with_meta = bag.clone();
        with_meta.insert("_meta".to_string(), json!({"weights": {"canvas": 0.3}}));
        with_meta.insert("_scratch".to_string(), json!(42));
        assert_eq!(clean, synthesize_fingerprint(&with_meta, &weights, &context));
    }

    #[test]
    fn test_weight_changes_shift_the_digest() {
        let bag = sample_bag();
        let context = target_context(&bag);

        let baseline = baseline_weights();
        let mut boosted = baseline.clone();
        boosted.insert("platform".to_string(), 2.0);

        assert_ne!(
            synthesize_fingerprint(&bag, &baseline, &context),
            synthesize_fingerprint(&bag, &boosted, &context),
        );
    }

    #[test]
    fn test_context_tokens_shift_the_digest() {
        let bag = sample_bag();
        let weights = baseline_weights();

        let target = target_context(&bag);
        let browser = classify(
            &EnvironmentMarkers::new("Mozilla/5.0 Chrome/120.0 Safari/537.36", false),
            &bag,
        );

        assert_ne!(
            synthesize_fingerprint(&bag, &weights, &target),
            synthesize_fingerprint(&bag, &weights, &browser),
        );
    }

    #[test]
    fn test_empty_bag_still_produces_a_digest() {
        let bag = ComponentBag::new();
        let context = target_context(&bag);
        let digest = synthesize_fingerprint(&bag, &baseline_weights(), &context);
        assert!(!digest.is_empty());
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_token_repetitions() {
        assert_eq!(token_repetitions(1.0), 10);
        assert_eq!(token_repetitions(2.5), 25);
        assert_eq!(token_repetitions(0.3), 3);
        assert_eq!(token_repetitions(0.01), 1);
        assert_eq!(token_repetitions(0.0), 1);
    }

    #[test]
    fn test_fold_digest_known_values() {
        assert_eq!(fold_digest(""), "0");
        // h = 97
        assert_eq!(fold_digest("a"), "61");
        // h = 97 * 31 + 98 = 3105
        assert_eq!(fold_digest("ab"), "c21");
    }

    #[test]
    fn test_fold_digest_wraps_instead_of_overflowing() {
        let long = "x".repeat(10_000);
        let digest = fold_digest(&long);
        assert!(!digest.is_empty());
    }

    #[test]
    fn test_fold_digest_handles_non_ascii_units() {
        // Multi-byte characters fold by UTF-16 unit, not by byte.
        assert_ne!(fold_digest("č"), fold_digest("c"));
        let emoji = fold_digest("🙂");
        assert!(emoji.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
