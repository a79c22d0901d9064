//! Behavioral feature derivation
//!
//! Reduces a frozen sample window to the five feature groups. Each group is
//! computed independently and returns `None` when its prerequisite event
//! kind is absent from the window; sub-statistics that cannot be measured
//! from the available data fall back to 0 rather than failing.

use crate::behavior::types::{
    BehavioralSummary, InteractionEvent, InteractionKind, InteractionRhythm, MotionSignature,
    SampleWindow, ScrollAxis, ScrollBehavior, TimingStats, TouchPatterns, TouchPoint, WindowInfo,
    WindowQualityFlag, LOW_EVENT_COUNT, PAUSE_THRESHOLD_MS, SEQUENCE_CODE_MAX_EVENTS,
};
use chrono::Utc;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Tremor above this many m/s² of successive jitter reads as fully unstable.
const TREMOR_FULL_SCALE: f64 = 10.0;

/// Jerk normalization scale for the flow proxy.
const JERK_FULL_SCALE: f64 = 10.0;

/// Dispersion normalization scale for the entropy proxy.
const ENTROPY_FULL_SCALE: f64 = 5.0;

/// Reduce a frozen window to its behavioral summary.
pub fn extract_features(window: &SampleWindow) -> BehavioralSummary {
    BehavioralSummary {
        collection_in_progress: false,
        window: Some(WindowInfo {
            window_id: Uuid::new_v4(),
            collected_at: Utc::now(),
            duration_ms: window.duration_ms(),
            event_count: window.len(),
        }),
        quality_flags: quality_flags(window),
        touch_patterns: touch_patterns(window),
        scroll_behavior: scroll_behavior(window),
        timing: timing_stats(window),
        interaction_rhythm: interaction_rhythm(window),
        motion_signature: motion_signature(window),
    }
}

/// Advisory flags describing how much the window can be trusted.
fn quality_flags(window: &SampleWindow) -> Vec<WindowQualityFlag> {
    let mut flags = Vec::new();

    if window.is_empty() {
        flags.push(WindowQualityFlag::EmptyWindow);
        return flags;
    }

    if window.len() < LOW_EVENT_COUNT {
        flags.push(WindowQualityFlag::LowEventCount);
    }

    let distinct_kinds = [
        InteractionKind::Touchstart,
        InteractionKind::Touchmove,
        InteractionKind::Touchend,
        InteractionKind::Scroll,
        InteractionKind::Devicemotion,
    ]
    .iter()
    .filter(|kind| window.events().iter().any(|e| e.kind == **kind))
    .count();
    if distinct_kinds == 1 {
        flags.push(WindowQualityFlag::SingleEventKind);
    }

    flags
}

/// Touch-pattern features. `None` when no touch events were collected.
fn touch_patterns(window: &SampleWindow) -> Option<TouchPatterns> {
    let touch_events: Vec<&InteractionEvent> = window
        .events()
        .iter()
        .filter(|e| e.kind.is_touch())
        .collect();
    if touch_events.is_empty() {
        return None;
    }

    let mut pressures = Vec::new();
    let mut areas = Vec::new();
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for event in &touch_events {
        for point in event.touches.iter().flatten() {
            if let Some(pressure) = point.pressure.filter(|p| *p > 0.0) {
                pressures.push(pressure);
            }
            if let Some(area) = point.area.filter(|a| *a > 0.0) {
                areas.push(area);
            }
            xs.push(point.x);
            ys.push(point.y);
        }
    }

    let moves: Vec<&InteractionEvent> = touch_events
        .iter()
        .copied()
        .filter(|e| e.kind == InteractionKind::Touchmove)
        .collect();

    let starts: Vec<f64> = touch_events
        .iter()
        .filter(|e| e.kind == InteractionKind::Touchstart)
        .map(|e| e.timestamp_ms)
        .collect();
    let ends: Vec<f64> = touch_events
        .iter()
        .filter(|e| e.kind == InteractionKind::Touchend)
        .map(|e| e.timestamp_ms)
        .collect();

    // Pair the i-th start with the i-th end; unmatched tails drop out.
    let durations: Vec<f64> = starts
        .iter()
        .zip(ends.iter())
        .map(|(start, end)| end - start)
        .filter(|d| *d >= 0.0)
        .collect();

    let touch_frequency = if window.window_seconds() > 0.0 {
        starts.len() as f64 / window.window_seconds()
    } else {
        0.0
    };

    Some(TouchPatterns {
        avg_pressure: mean(&pressures),
        avg_area: mean(&areas),
        avg_velocity: mean(&move_velocities(&moves)),
        avg_duration_ms: mean(&durations),
        touch_frequency,
        gesture_complexity: gesture_complexity(&moves),
        positional_variance: (variance(&xs) + variance(&ys)) / 2.0,
    })
}

/// Velocities (px/s) between consecutive touch-move events, matched by
/// contact identifier.
fn move_velocities(moves: &[&InteractionEvent]) -> Vec<f64> {
    let mut velocities = Vec::new();
    for pair in moves.windows(2) {
        let dt_ms = pair[1].timestamp_ms - pair[0].timestamp_ms;
        if dt_ms <= 0.0 {
            continue;
        }
        for point in pair[1].touches.iter().flatten() {
            if let Some(prev) = find_point(pair[0], point.id) {
                let distance = ((point.x - prev.x).powi(2) + (point.y - prev.y).powi(2)).sqrt();
                velocities.push(distance / dt_ms * 1000.0);
            }
        }
    }
    velocities
}

fn find_point(event: &InteractionEvent, id: u32) -> Option<&TouchPoint> {
    event.touches.iter().flatten().find(|p| p.id == id)
}

/// Share of the move trajectory that reverses direction (>90° turns),
/// clamped to [0, 1].
fn gesture_complexity(moves: &[&InteractionEvent]) -> f64 {
    let mut trajectories: BTreeMap<u32, Vec<(f64, f64)>> = BTreeMap::new();
    for event in moves {
        for point in event.touches.iter().flatten() {
            trajectories.entry(point.id).or_default().push((point.x, point.y));
        }
    }

    let mut segments = 0usize;
    let mut reversals = 0usize;
    for positions in trajectories.values() {
        let deltas: Vec<(f64, f64)> = positions
            .windows(2)
            .map(|pair| (pair[1].0 - pair[0].0, pair[1].1 - pair[0].1))
            .collect();
        segments += deltas.len();
        for pair in deltas.windows(2) {
            let dot = pair[0].0 * pair[1].0 + pair[0].1 * pair[1].1;
            if dot < 0.0 {
                reversals += 1;
            }
        }
    }

    if segments == 0 {
        return 0.0;
    }
    (reversals as f64 / segments as f64).clamp(0.0, 1.0)
}

/// Scroll-behavior features. `None` when no scroll samples were collected.
fn scroll_behavior(window: &SampleWindow) -> Option<ScrollBehavior> {
    let samples: Vec<(f64, f64, f64)> = window
        .events()
        .iter()
        .filter_map(|e| e.scroll.map(|s| (e.timestamp_ms, s.x, s.y)))
        .collect();
    if samples.is_empty() {
        return None;
    }

    let mut speeds = Vec::new();
    let mut speed_dts = Vec::new();
    let mut total_x = 0.0;
    let mut total_y = 0.0;
    for pair in samples.windows(2) {
        let (t0, x0, y0) = pair[0];
        let (t1, x1, y1) = pair[1];
        let dt_ms = t1 - t0;
        if dt_ms <= 0.0 {
            continue;
        }
        let dx = x1 - x0;
        let dy = y1 - y0;
        total_x += dx.abs();
        total_y += dy.abs();
        speeds.push((dx.powi(2) + dy.powi(2)).sqrt() / dt_ms * 1000.0);
        speed_dts.push(dt_ms / 1000.0);
    }

    let accelerations: Vec<f64> = speeds
        .windows(2)
        .zip(speed_dts.iter().skip(1))
        .filter(|(_, dt)| **dt > 0.0)
        .map(|(pair, dt)| (pair[1] - pair[0]).abs() / dt)
        .collect();

    let avg_speed = mean(&speeds);
    let max_speed = speeds.iter().copied().fold(0.0_f64, f64::max);

    let deceleration = if speeds.len() >= 3 {
        let third = speeds.len() / 3;
        let early = mean(&speeds[..third]);
        let late = mean(&speeds[speeds.len() - third..]);
        (early - late).max(0.0)
    } else {
        0.0
    };

    let dominant_axis = if total_x == 0.0 && total_y == 0.0 {
        ScrollAxis::None
    } else if total_y > 2.0 * total_x {
        ScrollAxis::Vertical
    } else if total_x > 2.0 * total_y {
        ScrollAxis::Horizontal
    } else {
        ScrollAxis::Both
    };

    let consistency = if avg_speed > 0.0 {
        1.0 - (stddev(&speeds) / avg_speed).min(1.0)
    } else {
        0.0
    };

    Some(ScrollBehavior {
        avg_speed,
        avg_acceleration: mean(&accelerations),
        deceleration,
        momentum: if max_speed > 0.0 { avg_speed / max_speed } else { 0.0 },
        dominant_axis,
        consistency,
    })
}

/// Inter-event timing over all touch events (any kind). `None` when fewer
/// than two touch events were collected.
fn timing_stats(window: &SampleWindow) -> Option<TimingStats> {
    let timestamps: Vec<f64> = window
        .events()
        .iter()
        .filter(|e| e.kind.is_touch())
        .map(|e| e.timestamp_ms)
        .collect();
    let intervals = intervals_of(&timestamps);
    if intervals.is_empty() {
        return None;
    }

    Some(TimingStats {
        avg_interval_ms: mean(&intervals),
        interval_stddev_ms: stddev(&intervals),
    })
}

/// Interaction rhythm over touchstart inter-arrivals. `None` when fewer
/// than two touch starts were collected.
fn interaction_rhythm(window: &SampleWindow) -> Option<InteractionRhythm> {
    let starts: Vec<f64> = window
        .events()
        .iter()
        .filter(|e| e.kind == InteractionKind::Touchstart)
        .map(|e| e.timestamp_ms)
        .collect();
    let intervals = intervals_of(&starts);
    if intervals.is_empty() {
        return None;
    }

    let avg_interval = mean(&intervals);
    let taps_per_second = if avg_interval > 0.0 { 1000.0 / avg_interval } else { 0.0 };
    let consistency = if avg_interval > 0.0 {
        1.0 - (stddev(&intervals) / avg_interval).min(1.0)
    } else {
        0.0
    };

    let pause_patterns: Vec<f64> = intervals
        .iter()
        .copied()
        .filter(|i| *i > PAUSE_THRESHOLD_MS)
        .collect();

    let sequence_code: String = window
        .events()
        .iter()
        .take(SEQUENCE_CODE_MAX_EVENTS)
        .map(|e| e.kind.code())
        .collect();

    Some(InteractionRhythm {
        taps_per_second,
        consistency,
        pause_patterns,
        sequence_code,
    })
}

/// Motion signature from device-motion samples. `None` when none were
/// collected.
fn motion_signature(window: &SampleWindow) -> Option<MotionSignature> {
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    let mut zs = Vec::new();
    for event in window.events() {
        if let Some(motion) = event.motion {
            xs.push(motion.x);
            ys.push(motion.y);
            zs.push(motion.z);
        }
    }
    if xs.is_empty() {
        return None;
    }

    let tremor = (mean_abs_successive_diff(&xs)
        + mean_abs_successive_diff(&ys)
        + mean_abs_successive_diff(&zs))
        / 3.0;

    let dispersion = (stddev(&xs) + stddev(&ys) + stddev(&zs)) / 3.0;

    let jerk = (mean_abs_second_diff(&xs) + mean_abs_second_diff(&ys) + mean_abs_second_diff(&zs))
        / 3.0;

    Some(MotionSignature {
        tremor,
        stability: (1.0 - (tremor / TREMOR_FULL_SCALE).min(1.0)).clamp(0.0, 1.0),
        precision: (1.0 / (1.0 + dispersion)).clamp(0.0, 1.0),
        flow: (1.0 - (jerk / JERK_FULL_SCALE).min(1.0)).clamp(0.0, 1.0),
        entropy: (dispersion / ENTROPY_FULL_SCALE).clamp(0.0, 1.0),
    })
}

/// Non-negative gaps between consecutive timestamps.
fn intervals_of(timestamps: &[f64]) -> Vec<f64> {
    timestamps
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .filter(|gap| *gap >= 0.0)
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

fn stddev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

fn mean_abs_successive_diff(values: &[f64]) -> f64 {
    let diffs: Vec<f64> = values.windows(2).map(|p| (p[1] - p[0]).abs()).collect();
    mean(&diffs)
}

fn mean_abs_second_diff(values: &[f64]) -> f64 {
    let first: Vec<f64> = values.windows(2).map(|p| p[1] - p[0]).collect();
    let second: Vec<f64> = first.windows(2).map(|p| (p[1] - p[0]).abs()).collect();
    mean(&second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::types::COLLECTION_WINDOW_MS;

    fn window_with(events: Vec<InteractionEvent>) -> SampleWindow {
        let mut window = SampleWindow::new(0.0, COLLECTION_WINDOW_MS);
        for event in events {
            window.push(event);
        }
        window
    }

    fn point(id: u32, x: f64, y: f64) -> TouchPoint {
        TouchPoint {
            id,
            x,
            y,
            pressure: None,
            area: None,
        }
    }

    #[test]
    fn test_no_touch_events_yields_null_touch_patterns() {
        let window = window_with(vec![InteractionEvent::scroll(10.0, 0.0, 100.0)]);
        let summary = extract_features(&window);
        assert!(summary.touch_patterns.is_none());
        assert!(summary.timing.is_none());
        assert!(summary.interaction_rhythm.is_none());
    }

    #[test]
    fn test_no_scroll_samples_yields_null_scroll_behavior() {
        let window = window_with(vec![InteractionEvent::touch(
            InteractionKind::Touchstart,
            10.0,
            vec![point(0, 5.0, 5.0)],
        )]);
        let summary = extract_features(&window);
        assert!(summary.scroll_behavior.is_none());
        assert!(summary.motion_signature.is_none());
        assert!(summary.touch_patterns.is_some());
    }

    #[test]
    fn test_empty_window_has_no_features_and_is_flagged() {
        let summary = extract_features(&window_with(vec![]));
        assert!(!summary.has_features());
        assert!(summary.quality_flags.contains(&WindowQualityFlag::EmptyWindow));
        assert!(!summary.collection_in_progress);
    }

    #[test]
    fn test_touch_velocity_from_matched_points() {
        // Two moves of the same contact, 30px in 100ms => 300 px/s.
        let window = window_with(vec![
            InteractionEvent::touch(InteractionKind::Touchmove, 100.0, vec![point(7, 0.0, 0.0)]),
            InteractionEvent::touch(InteractionKind::Touchmove, 200.0, vec![point(7, 0.0, 30.0)]),
        ]);
        let patterns = extract_features(&window).touch_patterns.unwrap();
        assert!((patterns.avg_velocity - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_touch_velocity_ignores_unmatched_points() {
        let window = window_with(vec![
            InteractionEvent::touch(InteractionKind::Touchmove, 100.0, vec![point(1, 0.0, 0.0)]),
            InteractionEvent::touch(InteractionKind::Touchmove, 200.0, vec![point(2, 50.0, 50.0)]),
        ]);
        let patterns = extract_features(&window).touch_patterns.unwrap();
        assert_eq!(patterns.avg_velocity, 0.0);
    }

    #[test]
    fn test_touch_duration_pairs_by_index() {
        let window = window_with(vec![
            InteractionEvent::touch(InteractionKind::Touchstart, 100.0, vec![point(0, 0.0, 0.0)]),
            InteractionEvent::touch(InteractionKind::Touchend, 250.0, vec![point(0, 0.0, 0.0)]),
            InteractionEvent::touch(InteractionKind::Touchstart, 400.0, vec![point(1, 0.0, 0.0)]),
            InteractionEvent::touch(InteractionKind::Touchend, 500.0, vec![point(1, 0.0, 0.0)]),
        ]);
        let patterns = extract_features(&window).touch_patterns.unwrap();
        // (150 + 100) / 2
        assert!((patterns.avg_duration_ms - 125.0).abs() < 1e-9);
        // 2 starts over a 3-second window.
        assert!((patterns.touch_frequency - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_pressure_mean_skips_zero_readings() {
        let mut with_pressure = point(0, 1.0, 1.0);
        with_pressure.pressure = Some(0.6);
        let mut zero_pressure = point(1, 2.0, 2.0);
        zero_pressure.pressure = Some(0.0);

        let window = window_with(vec![InteractionEvent::touch(
            InteractionKind::Touchstart,
            10.0,
            vec![with_pressure, zero_pressure],
        )]);
        let patterns = extract_features(&window).touch_patterns.unwrap();
        assert!((patterns.avg_pressure - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_gesture_complexity_counts_reversals() {
        // Right, right, then hard left: one reversal over three segments.
        let window = window_with(vec![
            InteractionEvent::touch(InteractionKind::Touchmove, 0.0, vec![point(0, 0.0, 0.0)]),
            InteractionEvent::touch(InteractionKind::Touchmove, 50.0, vec![point(0, 10.0, 0.0)]),
            InteractionEvent::touch(InteractionKind::Touchmove, 100.0, vec![point(0, 20.0, 0.0)]),
            InteractionEvent::touch(InteractionKind::Touchmove, 150.0, vec![point(0, 5.0, 0.0)]),
        ]);
        let patterns = extract_features(&window).touch_patterns.unwrap();
        assert!((patterns.gesture_complexity - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_scroll_constant_speed_is_fully_consistent() {
        let window = window_with(vec![
            InteractionEvent::scroll(0.0, 0.0, 0.0),
            InteractionEvent::scroll(100.0, 0.0, 50.0),
            InteractionEvent::scroll(200.0, 0.0, 100.0),
            InteractionEvent::scroll(300.0, 0.0, 150.0),
        ]);
        let scroll = extract_features(&window).scroll_behavior.unwrap();
        assert!((scroll.avg_speed - 500.0).abs() < 1e-9);
        assert!((scroll.consistency - 1.0).abs() < 1e-9);
        assert!((scroll.momentum - 1.0).abs() < 1e-9);
        assert_eq!(scroll.avg_acceleration, 0.0);
        assert_eq!(scroll.dominant_axis, ScrollAxis::Vertical);
    }

    #[test]
    fn test_scroll_deceleration_floors_at_zero() {
        // Speeding up: early third slower than late third.
        let window = window_with(vec![
            InteractionEvent::scroll(0.0, 0.0, 0.0),
            InteractionEvent::scroll(100.0, 0.0, 10.0),
            InteractionEvent::scroll(200.0, 0.0, 40.0),
            InteractionEvent::scroll(300.0, 0.0, 100.0),
        ]);
        let scroll = extract_features(&window).scroll_behavior.unwrap();
        assert_eq!(scroll.deceleration, 0.0);
    }

    #[test]
    fn test_scroll_axis_classification() {
        let horizontal = window_with(vec![
            InteractionEvent::scroll(0.0, 0.0, 0.0),
            InteractionEvent::scroll(100.0, 120.0, 10.0),
        ]);
        assert_eq!(
            extract_features(&horizontal).scroll_behavior.unwrap().dominant_axis,
            ScrollAxis::Horizontal
        );

        let diagonal = window_with(vec![
            InteractionEvent::scroll(0.0, 0.0, 0.0),
            InteractionEvent::scroll(100.0, 60.0, 80.0),
        ]);
        assert_eq!(
            extract_features(&diagonal).scroll_behavior.unwrap().dominant_axis,
            ScrollAxis::Both
        );

        let stationary = window_with(vec![
            InteractionEvent::scroll(0.0, 5.0, 5.0),
            InteractionEvent::scroll(100.0, 5.0, 5.0),
        ]);
        assert_eq!(
            extract_features(&stationary).scroll_behavior.unwrap().dominant_axis,
            ScrollAxis::None
        );
    }

    #[test]
    fn test_timing_stats_over_all_touch_kinds() {
        let window = window_with(vec![
            InteractionEvent::touch(InteractionKind::Touchstart, 0.0, vec![point(0, 0.0, 0.0)]),
            InteractionEvent::touch(InteractionKind::Touchmove, 40.0, vec![point(0, 1.0, 1.0)]),
            InteractionEvent::touch(InteractionKind::Touchend, 120.0, vec![point(0, 1.0, 1.0)]),
        ]);
        let timing = extract_features(&window).timing.unwrap();
        // Intervals 40 and 80.
        assert!((timing.avg_interval_ms - 60.0).abs() < 1e-9);
        assert!((timing.interval_stddev_ms - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_rhythm_rate_pauses_and_sequence() {
        let window = window_with(vec![
            InteractionEvent::touch(InteractionKind::Touchstart, 0.0, vec![point(0, 0.0, 0.0)]),
            InteractionEvent::scroll(100.0, 0.0, 10.0),
            InteractionEvent::touch(InteractionKind::Touchstart, 250.0, vec![point(1, 0.0, 0.0)]),
            InteractionEvent::motion(300.0, 0.1, 0.1, 9.8),
            InteractionEvent::touch(InteractionKind::Touchstart, 1000.0, vec![point(2, 0.0, 0.0)]),
        ]);
        let rhythm = extract_features(&window).interaction_rhythm.unwrap();
        // Start intervals: 250, 750; mean 500 => 2 taps/s.
        assert!((rhythm.taps_per_second - 2.0).abs() < 1e-9);
        assert_eq!(rhythm.pause_patterns, vec![750.0]);
        assert_eq!(rhythm.sequence_code, "tstdt");
    }

    #[test]
    fn test_single_touchstart_yields_null_rhythm() {
        let window = window_with(vec![InteractionEvent::touch(
            InteractionKind::Touchstart,
            10.0,
            vec![point(0, 0.0, 0.0)],
        )]);
        assert!(extract_features(&window).interaction_rhythm.is_none());
    }

    #[test]
    fn test_motion_signature_steady_samples() {
        let window = window_with(vec![
            InteractionEvent::motion(0.0, 0.0, 0.0, 9.8),
            InteractionEvent::motion(100.0, 0.0, 0.0, 9.8),
            InteractionEvent::motion(200.0, 0.0, 0.0, 9.8),
        ]);
        let motion = extract_features(&window).motion_signature.unwrap();
        assert_eq!(motion.tremor, 0.0);
        assert_eq!(motion.stability, 1.0);
        assert_eq!(motion.precision, 1.0);
        assert_eq!(motion.flow, 1.0);
        assert_eq!(motion.entropy, 0.0);
    }

    #[test]
    fn test_motion_signature_bounds_hold_for_violent_motion() {
        let window = window_with(vec![
            InteractionEvent::motion(0.0, -50.0, 80.0, -90.0),
            InteractionEvent::motion(10.0, 70.0, -60.0, 95.0),
            InteractionEvent::motion(20.0, -80.0, 90.0, -85.0),
        ]);
        let motion = extract_features(&window).motion_signature.unwrap();
        assert!(motion.tremor > 0.0);
        for proxy in [motion.stability, motion.precision, motion.flow, motion.entropy] {
            assert!((0.0..=1.0).contains(&proxy));
        }
    }

    #[test]
    fn test_quality_flags_thin_and_monotone_windows() {
        let window = window_with(vec![
            InteractionEvent::scroll(0.0, 0.0, 0.0),
            InteractionEvent::scroll(100.0, 0.0, 10.0),
        ]);
        let summary = extract_features(&window);
        assert!(summary.quality_flags.contains(&WindowQualityFlag::LowEventCount));
        assert!(summary.quality_flags.contains(&WindowQualityFlag::SingleEventKind));
    }
}
