//! Behavioral data types
//!
//! This module defines the raw interaction events collected during a sample
//! window and the derived feature records the reducer emits. Wire field
//! names are camelCase because the summary is re-embedded into the
//! web-shaped component bag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed collection window duration in milliseconds.
pub const COLLECTION_WINDOW_MS: f64 = 3000.0;

/// Inter-arrival gaps longer than this count as pauses (milliseconds).
pub const PAUSE_THRESHOLD_MS: f64 = 500.0;

/// Cap on events contributing to the rhythm sequence code.
pub const SEQUENCE_CODE_MAX_EVENTS: usize = 20;

/// Below this event count the window is flagged as thin.
pub const LOW_EVENT_COUNT: usize = 5;

/// Raw interaction event kinds captured during a collection window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Touchstart,
    Touchmove,
    Touchend,
    Scroll,
    Devicemotion,
}

impl InteractionKind {
    /// Whether this is one of the touch event kinds.
    pub fn is_touch(&self) -> bool {
        matches!(
            self,
            InteractionKind::Touchstart | InteractionKind::Touchmove | InteractionKind::Touchend
        )
    }

    /// First letter of the event name; used by the rhythm sequence code.
    pub fn code(&self) -> char {
        match self {
            InteractionKind::Touchstart
            | InteractionKind::Touchmove
            | InteractionKind::Touchend => 't',
            InteractionKind::Scroll => 's',
            InteractionKind::Devicemotion => 'd',
        }
    }
}

/// One touch contact point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TouchPoint {
    /// Stable identifier of the contact across start/move/end.
    pub id: u32,
    /// X position in pixels.
    pub x: f64,
    /// Y position in pixels.
    pub y: f64,
    /// Contact pressure (0-1), when the device reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    /// Contact area in square pixels, when the device reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
}

/// Scroll position sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollSample {
    pub x: f64,
    pub y: f64,
}

/// Device-motion acceleration sample (m/s² per axis).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A timestamped interaction event with its kind-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionEvent {
    /// High-resolution timestamp in milliseconds (collaborator clock).
    pub timestamp_ms: f64,
    /// Event kind.
    pub kind: InteractionKind,
    /// Touch points (present for touch kinds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub touches: Option<Vec<TouchPoint>>,
    /// Scroll position (present for scroll events).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scroll: Option<ScrollSample>,
    /// Acceleration sample (present for device-motion events).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motion: Option<MotionSample>,
}

impl InteractionEvent {
    /// A touch event carrying the given contact points.
    pub fn touch(kind: InteractionKind, timestamp_ms: f64, touches: Vec<TouchPoint>) -> Self {
        Self {
            timestamp_ms,
            kind,
            touches: Some(touches),
            scroll: None,
            motion: None,
        }
    }

    /// A scroll position sample.
    pub fn scroll(timestamp_ms: f64, x: f64, y: f64) -> Self {
        Self {
            timestamp_ms,
            kind: InteractionKind::Scroll,
            touches: None,
            scroll: Some(ScrollSample { x, y }),
            motion: None,
        }
    }

    /// A device-motion acceleration sample.
    pub fn motion(timestamp_ms: f64, x: f64, y: f64, z: f64) -> Self {
        Self {
            timestamp_ms,
            kind: InteractionKind::Devicemotion,
            touches: None,
            scroll: None,
            motion: Some(MotionSample { x, y, z }),
        }
    }
}

/// Ordered sequence of raw events bounded to one collection window.
///
/// Lifecycle: created on collection start, appended to while collection is
/// active, frozen and reduced on close, then discarded. Never retained
/// after feature extraction.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    opened_at_ms: f64,
    duration_ms: f64,
    events: Vec<InteractionEvent>,
}

impl SampleWindow {
    /// Open a window at the given high-resolution timestamp.
    pub fn new(opened_at_ms: f64, duration_ms: f64) -> Self {
        Self {
            opened_at_ms,
            duration_ms,
            events: Vec::new(),
        }
    }

    /// Append an event. Events are never dropped, reordered, or
    /// deduplicated while the window is open.
    pub fn push(&mut self, event: InteractionEvent) {
        self.events.push(event);
    }

    /// All events in arrival order.
    pub fn events(&self) -> &[InteractionEvent] {
        &self.events
    }

    pub fn opened_at_ms(&self) -> f64 {
        self.opened_at_ms
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    /// Timestamp at which the collection timer expires.
    pub fn deadline_ms(&self) -> f64 {
        self.opened_at_ms + self.duration_ms
    }

    /// Window length in seconds, for rate normalization.
    pub fn window_seconds(&self) -> f64 {
        self.duration_ms / 1000.0
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Touch-pattern feature group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TouchPatterns {
    /// Mean pressure over contacts reporting one.
    pub avg_pressure: f64,
    /// Mean contact area over contacts reporting one.
    pub avg_area: f64,
    /// Mean move velocity in px/s across contacts sharing an identifier.
    pub avg_velocity: f64,
    /// Mean touch duration in ms, pairing starts with ends by index.
    pub avg_duration_ms: f64,
    /// Touch starts per second of window.
    pub touch_frequency: f64,
    /// Direction-reversal share of the move trajectory, 0-1.
    pub gesture_complexity: f64,
    /// Mean of per-axis coordinate variances across all contact points.
    pub positional_variance: f64,
}

/// Dominant scroll axis classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollAxis {
    Vertical,
    Horizontal,
    Both,
    None,
}

/// Scroll-behavior feature group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollBehavior {
    /// Mean scroll speed in px/s.
    pub avg_speed: f64,
    /// Mean absolute acceleration in px/s².
    pub avg_acceleration: f64,
    /// Mean speed of the first third minus the last third, floored at 0.
    pub deceleration: f64,
    /// Mean speed over peak speed, 0-1.
    pub momentum: f64,
    /// Axis that dominates total displacement by more than 2x.
    pub dominant_axis: ScrollAxis,
    /// 1 - min(1, stdev(speeds) / mean(speed)).
    pub consistency: f64,
}

/// Inter-event timing feature group over all touch events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingStats {
    /// Mean inter-event interval in ms.
    pub avg_interval_ms: f64,
    /// Standard deviation of inter-event intervals in ms.
    pub interval_stddev_ms: f64,
}

/// Interaction-rhythm feature group over touchstart inter-arrivals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRhythm {
    /// 1000 / mean inter-arrival interval.
    pub taps_per_second: f64,
    /// 1 - min(1, stdev / mean) over inter-arrival intervals.
    pub consistency: f64,
    /// Subsequence of intervals exceeding the pause threshold, in ms.
    pub pause_patterns: Vec<f64>,
    /// First letter of each event kind in window order.
    pub sequence_code: String,
}

/// Motion-signature feature group from device-motion samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionSignature {
    /// Mean absolute successive acceleration difference, axis-averaged.
    pub tremor: f64,
    /// Inverse tremor proxy, 0-1.
    pub stability: f64,
    /// Inverse dispersion proxy, 0-1.
    pub precision: f64,
    /// Inverse jerk proxy, 0-1.
    pub flow: f64,
    /// Normalized dispersion proxy, 0-1.
    pub entropy: f64,
}

/// Advisory quality flags for a reduced window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowQualityFlag {
    /// No events arrived during the window.
    EmptyWindow,
    /// Fewer events than the thin-window threshold.
    LowEventCount,
    /// Only one event kind observed.
    SingleEventKind,
}

/// Metadata about a closed collection window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowInfo {
    /// Unique identifier of this window.
    pub window_id: Uuid,
    /// Wall-clock time the window was reduced.
    pub collected_at: DateTime<Utc>,
    /// Window duration in ms.
    pub duration_ms: f64,
    /// Number of events collected.
    pub event_count: usize,
}

/// Derived behavioral features for one collection window.
///
/// Each feature group is `null` when its prerequisite raw data is absent.
/// `collection_in_progress` reports the concurrent-collection conflict as a
/// data condition, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehavioralSummary {
    /// True when a collection request found another window already open.
    pub collection_in_progress: bool,
    /// Window metadata; absent for conflict/unavailable summaries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<WindowInfo>,
    /// Advisory quality flags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quality_flags: Vec<WindowQualityFlag>,
    pub touch_patterns: Option<TouchPatterns>,
    pub scroll_behavior: Option<ScrollBehavior>,
    pub timing: Option<TimingStats>,
    pub interaction_rhythm: Option<InteractionRhythm>,
    pub motion_signature: Option<MotionSignature>,
}

impl BehavioralSummary {
    /// Summary for a collection request rejected because a window is
    /// already open: all feature groups null, conflict flag set.
    pub fn conflict() -> Self {
        Self {
            collection_in_progress: true,
            ..Self::unavailable()
        }
    }

    /// Summary with no behavioral data at all.
    pub fn unavailable() -> Self {
        Self {
            collection_in_progress: false,
            window: None,
            quality_flags: Vec::new(),
            touch_patterns: None,
            scroll_behavior: None,
            timing: None,
            interaction_rhythm: None,
            motion_signature: None,
        }
    }

    /// Whether any feature group was derived.
    pub fn has_features(&self) -> bool {
        self.touch_patterns.is_some()
            || self.scroll_behavior.is_some()
            || self.timing.is_some()
            || self.interaction_rhythm.is_some()
            || self.motion_signature.is_some()
    }
}
