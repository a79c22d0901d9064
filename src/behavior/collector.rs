//! Behavioral collection state machine
//!
//! Collection runs through an explicit state holder: callers own a
//! `BehaviorCollector` and pass it where collection happens, with no hidden
//! global state. The `Idle`/`Collecting` gate enforces the
//! one-collection-at-a-time contract without locking; the conflict path is a
//! data condition, never an error.

use crate::behavior::features::extract_features;
use crate::behavior::types::{
    BehavioralSummary, InteractionEvent, SampleWindow, COLLECTION_WINDOW_MS,
};

/// Collection lifecycle tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    /// No window open; a collection request may start one.
    Idle,
    /// A window is open and appending events.
    Collecting,
    /// The window is frozen and being reduced to features.
    Reducing,
}

/// Outcome of a collection request.
#[derive(Debug)]
pub enum BeginOutcome {
    /// A new window was opened.
    Started,
    /// A window is already open. Carries the conflict summary: all feature
    /// groups null, `collection_in_progress` set. The open window is left
    /// untouched.
    AlreadyCollecting(BehavioralSummary),
}

/// A source of interaction events the collector can subscribe to for one
/// window: the crate-side stand-in for passive listener registration.
pub trait InteractionSource {
    /// Register listeners. Called once per collection window.
    fn subscribe(&mut self);

    /// Deregister listeners. Guaranteed to be called exactly once per
    /// `subscribe`, however the collection terminates.
    fn unsubscribe(&mut self);

    /// Deliver the next event, suspending as needed, or `None` once the
    /// deadline has passed.
    fn next_event(&mut self, deadline_ms: f64) -> Option<InteractionEvent>;

    /// Current high-resolution timestamp in milliseconds.
    fn now_ms(&mut self) -> f64;
}

/// Scoped subscription to an [`InteractionSource`].
///
/// Deregistration runs exactly once, on explicit [`detach`](Self::detach)
/// or on drop (including during unwinding).
pub struct SourceGuard<'a, S: InteractionSource> {
    source: &'a mut S,
    detached: bool,
}

impl<'a, S: InteractionSource> SourceGuard<'a, S> {
    /// Subscribe to the source for the lifetime of the guard.
    pub fn attach(source: &'a mut S) -> Self {
        source.subscribe();
        Self {
            source,
            detached: false,
        }
    }

    /// The subscribed source.
    pub fn source(&mut self) -> &mut S {
        self.source
    }

    /// Unsubscribe now. Further calls (and the drop) are no-ops.
    pub fn detach(&mut self) {
        if !self.detached {
            self.detached = true;
            self.source.unsubscribe();
        }
    }
}

impl<S: InteractionSource> Drop for SourceGuard<'_, S> {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Owner of the in-progress sample window and the collection gate.
#[derive(Debug)]
pub struct BehaviorCollector {
    state: CollectorState,
    window: Option<SampleWindow>,
    window_ms: f64,
}

impl Default for BehaviorCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl BehaviorCollector {
    /// Collector with the standard 3000 ms window.
    pub fn new() -> Self {
        Self::with_window_ms(COLLECTION_WINDOW_MS)
    }

    /// Collector with a custom window duration.
    pub fn with_window_ms(window_ms: f64) -> Self {
        Self {
            state: CollectorState::Idle,
            window: None,
            window_ms,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CollectorState {
        self.state
    }

    /// Whether a window is currently open.
    pub fn is_collecting(&self) -> bool {
        self.state == CollectorState::Collecting
    }

    /// Open a collection window at the given timestamp.
    ///
    /// While a window is already open this returns the conflict summary
    /// immediately and does not disturb the in-progress window.
    pub fn begin(&mut self, now_ms: f64) -> BeginOutcome {
        if self.state != CollectorState::Idle {
            return BeginOutcome::AlreadyCollecting(BehavioralSummary::conflict());
        }
        self.window = Some(SampleWindow::new(now_ms, self.window_ms));
        self.state = CollectorState::Collecting;
        BeginOutcome::Started
    }

    /// Append an event to the open window. Ignored unless collecting.
    pub fn record(&mut self, event: InteractionEvent) {
        if self.state != CollectorState::Collecting {
            return;
        }
        if let Some(window) = self.window.as_mut() {
            window.push(event);
        }
    }

    /// Close the window: freeze, reduce each feature group independently,
    /// discard the window, and return to `Idle`.
    ///
    /// Calling this with no open window yields the empty summary.
    pub fn finish(&mut self) -> BehavioralSummary {
        if self.state != CollectorState::Collecting {
            return BehavioralSummary::unavailable();
        }
        self.state = CollectorState::Reducing;
        let summary = match self.window.take() {
            Some(window) => extract_features(&window),
            None => BehavioralSummary::unavailable(),
        };
        self.state = CollectorState::Idle;
        summary
    }

    /// Drive one full collection pass against an event source: subscribe,
    /// pump events until the window deadline, then reduce.
    ///
    /// Deregistration is guaranteed exactly once via the scoped guard, even
    /// if the source panics mid-window.
    pub fn collect<S: InteractionSource>(&mut self, source: &mut S) -> BehavioralSummary {
        let opened_at = source.now_ms();
        match self.begin(opened_at) {
            BeginOutcome::AlreadyCollecting(summary) => return summary,
            BeginOutcome::Started => {}
        }

        let deadline = opened_at + self.window_ms;
        {
            let mut subscription = SourceGuard::attach(source);
            while let Some(event) = subscription.source().next_event(deadline) {
                self.record(event);
            }
        }

        self.finish()
    }
}
