//! Execution-context classification
//!
//! Classifies the runtime environment a fingerprinting pass is executing in
//! (embedded bridge-hosted view vs. ordinary browser) from cheap environment
//! markers, and derives the contextual capability flags the scorer and
//! synthesizer consume.
//!
//! Classification is a pure function: no I/O, no failure modes. Absence of
//! every marker yields the `None` variant, not an error.

use crate::schema::{self, ComponentBag};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// WebView flavor detected for the current pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebViewVariant {
    /// The target bridge-hosted view (Telegram Mini App).
    Telegram,
    /// iOS WKWebView without a host bridge.
    Wk,
    /// Android system WebView.
    Android,
    /// Embedded view of unrecognized flavor.
    Unknown,
    /// Ordinary browser, no embedding detected.
    None,
}

impl WebViewVariant {
    /// Stable lowercase label used in digest tokens.
    pub fn label(&self) -> &'static str {
        match self {
            WebViewVariant::Telegram => "telegram",
            WebViewVariant::Wk => "wk",
            WebViewVariant::Android => "android",
            WebViewVariant::Unknown => "unknown",
            WebViewVariant::None => "none",
        }
    }
}

/// Coarse network quality derived from the network probe's connection info.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkQuality {
    Poor,
    Good,
    Excellent,
    Unknown,
}

/// Environment markers a host application can observe before any probe runs:
/// the user-agent string and whether the host injected its bridge object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentMarkers {
    /// Raw user-agent string; matched case-insensitively.
    pub user_agent: String,
    /// Whether a host-injected application bridge object is present.
    pub has_bridge_object: bool,
    /// Host application version, when the embedder exposes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_version: Option<String>,
}

impl EnvironmentMarkers {
    /// Markers from an explicit user agent and bridge flag.
    pub fn new(user_agent: impl Into<String>, has_bridge_object: bool) -> Self {
        Self {
            user_agent: user_agent.into(),
            has_bridge_object,
            host_version: None,
        }
    }

    /// Attach a host version reported by the embedder.
    pub fn with_host_version(mut self, version: impl Into<String>) -> Self {
        self.host_version = Some(version.into());
        self
    }

    /// Derive markers from the component bag alone, for callers with no
    /// out-of-band environment handle. Bridge presence comes from the
    /// `telegramWebApp` component (honoring an explicit `present: false`).
    pub fn from_components(components: &ComponentBag) -> Self {
        let bridge = components.get(schema::TELEGRAM_WEB_APP);
        let has_bridge_object = match bridge {
            None | Some(Value::Null) => false,
            Some(value) => schema::field(value, "present")
                .and_then(Value::as_bool)
                .unwrap_or(true),
        };
        let host_version = bridge
            .and_then(|value| schema::field_str(value, "version"))
            .map(str::to_string);

        Self {
            user_agent: String::new(),
            has_bridge_object,
            host_version,
        }
    }
}

/// Immutable classification result for one fingerprinting pass.
///
/// Derived once from the markers and the component bag, never mutated
/// afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    /// Whether the pass runs inside the target bridge-hosted view.
    pub is_target_web_view: bool,
    /// Host application version, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_version: Option<String>,
    /// Detected WebView flavor.
    pub web_view_variant: WebViewVariant,
    /// Whether the haptic probe reports feedback availability.
    pub has_haptic_feedback: bool,
    /// Whether the behavioral component carries touch or motion features.
    pub has_behavioral_data: bool,
    /// Network quality class from the network probe.
    pub network_quality: NetworkQuality,
}

/// Classify the execution context from environment markers and the bag.
///
/// Decision policy, first match wins (case-insensitive substring tests):
/// bridge-object presence or a `telegram` UA marker selects the target
/// context; `; wv` selects the Android system WebView; an iOS UA missing
/// its `safari` token selects WKWebView; a bare `webview` marker is an
/// unrecognized embedding; anything else is an ordinary browser.
pub fn classify(markers: &EnvironmentMarkers, components: &ComponentBag) -> ExecutionContext {
    let ua = markers.user_agent.to_ascii_lowercase();

    let web_view_variant = if markers.has_bridge_object || ua.contains("telegram") {
        WebViewVariant::Telegram
    } else if ua.contains("; wv") {
        WebViewVariant::Android
    } else if (ua.contains("iphone") || ua.contains("ipad")) && !ua.contains("safari") {
        WebViewVariant::Wk
    } else if ua.contains("webview") {
        WebViewVariant::Unknown
    } else {
        WebViewVariant::None
    };

    let is_target_web_view = web_view_variant == WebViewVariant::Telegram;

    let host_version = markers.host_version.clone().or_else(|| {
        components
            .get(schema::TELEGRAM_WEB_APP)
            .and_then(|value| schema::field_str(value, "version"))
            .map(str::to_string)
    });

    let has_haptic_feedback = components
        .get(schema::HAPTIC)
        .map(|value| schema::field_bool(value, "available"))
        .unwrap_or(false);

    let has_behavioral_data = components
        .get(schema::BEHAVIORAL)
        .map(behavioral_has_data)
        .unwrap_or(false);

    let network_quality = components
        .get(schema::NETWORK)
        .map(network_quality_of)
        .unwrap_or(NetworkQuality::Unknown);

    ExecutionContext {
        is_target_web_view,
        host_version,
        web_view_variant,
        has_haptic_feedback,
        has_behavioral_data,
        network_quality,
    }
}

/// Whether a behavioral component carries touch-pattern or motion-signature
/// data. Shared by the classifier and the confidence scorer.
pub(crate) fn behavioral_has_data(component: &Value) -> bool {
    schema::has_data(component, "touchPatterns") || schema::has_data(component, "motionSignature")
}

fn network_quality_of(component: &Value) -> NetworkQuality {
    let effective_type = schema::field(component, "connection")
        .and_then(|conn| schema::field_str(conn, "effectiveType"));

    match effective_type {
        Some("4g") => NetworkQuality::Excellent,
        Some("3g") => NetworkQuality::Good,
        Some("2g") | Some("slow-2g") => NetworkQuality::Poor,
        _ => NetworkQuality::Unknown,
    }
}
