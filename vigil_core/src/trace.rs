// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for a proctoring session.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! [`Session`](crate::session::Session) calls as it processes observations.
//! All method bodies default to no-ops, so implementing only the events you
//! care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! Sinks for development (pretty printing, binary recording, Chrome trace
//! export) live in `vigil_debug`.

use crate::presence::PresenceTransition;
use crate::risk::{EventLogEntry, RiskBand};
use crate::time::HostTime;
use crate::visibility::VisibilityState;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which monitor an event concerns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MonitorKind {
    /// Camera capture and the face detector behind it.
    Camera,
    /// Microphone capture and the analyser behind it.
    Audio,
    /// The page visibility listener.
    Visibility,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted for every detection frame the session processes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameObservedEvent {
    /// Count of frames observed so far, starting at zero.
    pub frame_index: u64,
    /// Host time of the detection result.
    pub at: HostTime,
    /// Faces in the frame.
    pub face_count: u32,
}

/// Emitted when the face disappears or comes back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PresenceTransitionEvent {
    /// Host time of the frame that caused the transition.
    pub at: HostTime,
    /// What changed.
    pub transition: PresenceTransition,
}

/// Emitted for every audio snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AudioTickEvent {
    /// Host time of the snapshot.
    pub at: HostTime,
    /// Mean magnitude, 0–255.
    pub mean: f64,
    /// Whether the mean exceeded the threshold.
    pub exceeded: bool,
}

/// Emitted for every visibility-change notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisibilityChangeEvent {
    /// Host time of the notification.
    pub at: HostTime,
    /// New state.
    pub state: VisibilityState,
}

/// Emitted after the score changes.
#[derive(Clone, Copy, Debug)]
pub struct RiskIncreaseEvent<'a> {
    /// The log entry created for the increment.
    pub entry: &'a EventLogEntry,
    /// Band after the increment.
    pub band: RiskBand,
}

/// Emitted when a monitor could not start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonitorFailureEvent {
    /// Host time the failure was reported.
    pub at: HostTime,
    /// Which monitor is unavailable.
    pub monitor: MonitorKind,
}

/// Emitted once when the session stops.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionStopEvent {
    /// Host time of the stop.
    pub at: HostTime,
    /// Final score.
    pub score: u64,
    /// Increments applied over the session.
    pub events: u64,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from a session.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called for each processed detection frame.
    fn on_frame_observed(&mut self, e: &FrameObservedEvent) {
        _ = e;
    }

    /// Called when face presence changes.
    fn on_presence_transition(&mut self, e: &PresenceTransitionEvent) {
        _ = e;
    }

    /// Called for each audio snapshot.
    fn on_audio_tick(&mut self, e: &AudioTickEvent) {
        _ = e;
    }

    /// Called for each visibility change.
    fn on_visibility_change(&mut self, e: &VisibilityChangeEvent) {
        _ = e;
    }

    /// Called after each score increase.
    fn on_risk_increase(&mut self, e: &RiskIncreaseEvent<'_>) {
        _ = e;
    }

    /// Called when a monitor fails to start.
    fn on_monitor_failure(&mut self, e: &MonitorFailureEvent) {
        _ = e;
    }

    /// Called when the session stops.
    fn on_session_stop(&mut self, e: &SessionStopEvent) {
        _ = e;
    }
}

impl<S: TraceSink + ?Sized> TraceSink for &mut S {
    fn on_frame_observed(&mut self, e: &FrameObservedEvent) {
        (**self).on_frame_observed(e);
    }

    fn on_presence_transition(&mut self, e: &PresenceTransitionEvent) {
        (**self).on_presence_transition(e);
    }

    fn on_audio_tick(&mut self, e: &AudioTickEvent) {
        (**self).on_audio_tick(e);
    }

    fn on_visibility_change(&mut self, e: &VisibilityChangeEvent) {
        (**self).on_visibility_change(e);
    }

    fn on_risk_increase(&mut self, e: &RiskIncreaseEvent<'_>) {
        (**self).on_risk_increase(e);
    }

    fn on_monitor_failure(&mut self, e: &MonitorFailureEvent) {
        (**self).on_monitor_failure(e);
    }

    fn on_session_stop(&mut self, e: &SessionStopEvent) {
        (**self).on_session_stop(e);
    }
}

/// Fans every event out to both sinks, first `A` then `B`.
impl<A: TraceSink, B: TraceSink> TraceSink for (A, B) {
    fn on_frame_observed(&mut self, e: &FrameObservedEvent) {
        self.0.on_frame_observed(e);
        self.1.on_frame_observed(e);
    }

    fn on_presence_transition(&mut self, e: &PresenceTransitionEvent) {
        self.0.on_presence_transition(e);
        self.1.on_presence_transition(e);
    }

    fn on_audio_tick(&mut self, e: &AudioTickEvent) {
        self.0.on_audio_tick(e);
        self.1.on_audio_tick(e);
    }

    fn on_visibility_change(&mut self, e: &VisibilityChangeEvent) {
        self.0.on_visibility_change(e);
        self.1.on_visibility_change(e);
    }

    fn on_risk_increase(&mut self, e: &RiskIncreaseEvent<'_>) {
        self.0.on_risk_increase(e);
        self.1.on_risk_increase(e);
    }

    fn on_monitor_failure(&mut self, e: &MonitorFailureEvent) {
        self.0.on_monitor_failure(e);
        self.1.on_monitor_failure(e);
    }

    fn on_session_stop(&mut self, e: &SessionStopEvent) {
        self.0.on_session_stop(e);
        self.1.on_session_stop(e);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around a borrowed [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method dispatches straight to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: &'a mut dyn TraceSink,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

macro_rules! dispatch {
    ($self:ident, $method:ident, $e:expr) => {{
        #[cfg(feature = "trace")]
        $self.sink.$method($e);
        #[cfg(not(feature = "trace"))]
        {
            _ = $e;
        }
    }};
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`FrameObservedEvent`].
    #[inline]
    pub fn frame_observed(&mut self, e: &FrameObservedEvent) {
        dispatch!(self, on_frame_observed, e);
    }

    /// Emits a [`PresenceTransitionEvent`].
    #[inline]
    pub fn presence_transition(&mut self, e: &PresenceTransitionEvent) {
        dispatch!(self, on_presence_transition, e);
    }

    /// Emits an [`AudioTickEvent`].
    #[inline]
    pub fn audio_tick(&mut self, e: &AudioTickEvent) {
        dispatch!(self, on_audio_tick, e);
    }

    /// Emits a [`VisibilityChangeEvent`].
    #[inline]
    pub fn visibility_change(&mut self, e: &VisibilityChangeEvent) {
        dispatch!(self, on_visibility_change, e);
    }

    /// Emits a [`RiskIncreaseEvent`].
    #[inline]
    pub fn risk_increase(&mut self, e: &RiskIncreaseEvent<'_>) {
        dispatch!(self, on_risk_increase, e);
    }

    /// Emits a [`MonitorFailureEvent`].
    #[inline]
    pub fn monitor_failure(&mut self, e: &MonitorFailureEvent) {
        dispatch!(self, on_monitor_failure, e);
    }

    /// Emits a [`SessionStopEvent`].
    #[inline]
    pub fn session_stop(&mut self, e: &SessionStopEvent) {
        dispatch!(self, on_session_stop, e);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::RiskReason;

    #[test]
    fn noop_sink_accepts_everything() {
        let mut sink = NoopSink;
        sink.on_frame_observed(&FrameObservedEvent {
            frame_index: 0,
            at: HostTime(0),
            face_count: 1,
        });
        let entry = EventLogEntry {
            sequence: 0,
            at: HostTime(5),
            amount: 20,
            total: 20,
            reason: RiskReason::TabHidden,
        };
        sink.on_risk_increase(&RiskIncreaseEvent {
            entry: &entry,
            band: RiskBand::Low,
        });
        sink.on_session_stop(&SessionStopEvent {
            at: HostTime(10),
            score: 20,
            events: 1,
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            failures: Vec<MonitorKind>,
        }
        impl TraceSink for RecordingSink {
            fn on_monitor_failure(&mut self, e: &MonitorFailureEvent) {
                self.failures.push(e.monitor);
            }
        }

        let mut sink = RecordingSink {
            failures: Vec::new(),
        };
        {
            let mut tracer = Tracer::new(&mut sink);
            tracer.monitor_failure(&MonitorFailureEvent {
                at: HostTime(1),
                monitor: MonitorKind::Camera,
            });
        }
        assert_eq!(sink.failures, [MonitorKind::Camera]);
    }

    #[test]
    fn pair_forwards_to_both() {
        use alloc::vec::Vec;

        #[derive(Default)]
        struct Stops(Vec<u64>);
        impl TraceSink for Stops {
            fn on_session_stop(&mut self, e: &SessionStopEvent) {
                self.0.push(e.score);
            }
        }

        let mut a = Stops::default();
        let mut b = Stops::default();
        let mut pair = (&mut a, &mut b);
        pair.on_session_stop(&SessionStopEvent {
            at: HostTime(9),
            score: 45,
            events: 3,
        });
        assert_eq!(a.0, [45]);
        assert_eq!(b.0, [45]);
    }
}
