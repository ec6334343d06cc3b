// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A proctoring session: one accumulator, three monitors, one display.
//!
//! [`Session`] is the single owner of mutable risk state. Backends feed it
//! observations from whatever drives them (detector callbacks, animation
//! ticks, DOM events); each monitor turns its observation into an optional
//! increment, and the session applies it, redraws the display, and traces the
//! result.
//!
//! Sessions have an explicit lifecycle. [`Session::stop`] ends monitoring:
//! every later observation is ignored, so a backend that is slow to tear
//! down its drivers cannot change the final score.

use alloc::vec::Vec;

use crate::audio::{AudioMonitor, AudioObservation};
use crate::config::ProctorConfig;
use crate::display::{RiskDisplay, RiskSnapshot};
use crate::presence::{PresenceMonitor, PresenceObservation};
use crate::risk::{EventLog, RiskAccumulator, RiskBand, RiskIncrement, RiskReason, RiskUpdate};
use crate::source::{FaceResults, FrameSource, SpectrumSource};
use crate::time::{HostTime, Timebase};
use crate::trace::{
    AudioTickEvent, FrameObservedEvent, MonitorFailureEvent, MonitorKind, NoopSink,
    PresenceTransitionEvent, RiskIncreaseEvent, SessionStopEvent, TraceSink, Tracer,
    VisibilityChangeEvent,
};
use crate::visibility::{VisibilityMonitor, VisibilityState};

/// Monitors that reported a start-up failure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Unavailable {
    camera: bool,
    audio: bool,
    visibility: bool,
}

impl Unavailable {
    fn slot(&mut self, monitor: MonitorKind) -> &mut bool {
        match monitor {
            MonitorKind::Camera => &mut self.camera,
            MonitorKind::Audio => &mut self.audio,
            MonitorKind::Visibility => &mut self.visibility,
        }
    }

    const fn get(&self, monitor: MonitorKind) -> bool {
        match monitor {
            MonitorKind::Camera => self.camera,
            MonitorKind::Audio => self.audio,
            MonitorKind::Visibility => self.visibility,
        }
    }
}

/// Owns the risk accumulator and routes monitor output into it.
#[derive(Debug)]
pub struct Session<D, S = NoopSink> {
    accumulator: RiskAccumulator,
    presence: PresenceMonitor,
    visibility: VisibilityMonitor,
    audio: AudioMonitor,
    display: D,
    sink: S,
    running: bool,
    frames_observed: u64,
    unavailable: Unavailable,
    spectrum: Vec<u8>,
}

impl<D: RiskDisplay> Session<D> {
    /// Starts a session without tracing.
    ///
    /// `timebase` is the backend's tick unit; it converts the config's
    /// millisecond windows. The display is painted with the initial state.
    #[must_use]
    pub fn new(config: ProctorConfig, timebase: Timebase, display: D) -> Self {
        Self::with_sink(config, timebase, display, NoopSink)
    }
}

impl<D: RiskDisplay, S: TraceSink> Session<D, S> {
    /// Starts a session that reports to `sink`.
    #[must_use]
    pub fn with_sink(config: ProctorConfig, timebase: Timebase, mut display: D, sink: S) -> Self {
        let accumulator = RiskAccumulator::new(config.bands, config.log_capacity);
        display.reset(&RiskSnapshot {
            score: accumulator.score(),
            band: accumulator.band(),
            events: 0,
        });
        Self {
            accumulator,
            presence: PresenceMonitor::new(config.presence, timebase),
            visibility: VisibilityMonitor::new(config.visibility),
            audio: AudioMonitor::new(config.audio, timebase),
            display,
            sink,
            running: true,
            frames_observed: 0,
            unavailable: Unavailable::default(),
            spectrum: Vec::with_capacity(config.audio.frequency_bin_count()),
        }
    }

    /// Adds `amount` with `reason`, redraws, and traces.
    ///
    /// Returns `None` only after [`stop`](Self::stop).
    pub fn increase_risk(
        &mut self,
        amount: u32,
        reason: impl Into<RiskReason>,
        at: HostTime,
    ) -> Option<RiskUpdate> {
        if !self.running {
            return None;
        }
        Some(self.apply(RiskIncrement::new(amount, reason.into()), at))
    }

    /// Processes one frame of detector output.
    pub fn on_face_results(&mut self, results: &FaceResults, at: HostTime) -> Option<RiskUpdate> {
        if !self.running {
            return None;
        }
        let PresenceObservation {
            face_count,
            transition,
            increment,
        } = self.presence.observe(results, at);

        let mut tracer = Tracer::new(&mut self.sink);
        tracer.frame_observed(&FrameObservedEvent {
            frame_index: self.frames_observed,
            at,
            face_count: u32::try_from(face_count).unwrap_or(u32::MAX),
        });
        if let Some(transition) = transition {
            tracer.presence_transition(&PresenceTransitionEvent { at, transition });
        }
        self.frames_observed += 1;

        increment.map(|inc| self.apply(inc, at))
    }

    /// Drains every frame `source` has ready. Returns how many were processed.
    pub fn pump_frames(&mut self, source: &mut dyn FrameSource) -> usize {
        let mut processed = 0;
        while self.running {
            let Some(frame) = source.next_frame() else {
                break;
            };
            self.on_face_results(&frame.results, frame.at);
            processed += 1;
        }
        processed
    }

    /// Processes one visibility-change notification.
    pub fn on_visibility_change(
        &mut self,
        state: VisibilityState,
        at: HostTime,
    ) -> Option<RiskUpdate> {
        if !self.running {
            return None;
        }
        Tracer::new(&mut self.sink).visibility_change(&VisibilityChangeEvent { at, state });
        self.visibility.observe(state).map(|inc| self.apply(inc, at))
    }

    /// Processes one frequency snapshot.
    ///
    /// Ignored once the audio monitor has been reported unavailable.
    pub fn on_audio_tick(&mut self, bins: &[u8], at: HostTime) -> Option<RiskUpdate> {
        if !self.running || self.unavailable.audio {
            return None;
        }
        let AudioObservation {
            mean,
            exceeded,
            increment,
        } = self.audio.observe(bins, at);
        Tracer::new(&mut self.sink).audio_tick(&AudioTickEvent { at, mean, exceeded });
        increment.map(|inc| self.apply(inc, at))
    }

    /// Reads one snapshot from `source` and processes it.
    pub fn sample_audio(
        &mut self,
        source: &mut dyn SpectrumSource,
        at: HostTime,
    ) -> Option<RiskUpdate> {
        if !self.running || self.unavailable.audio {
            return None;
        }
        let mut bins = core::mem::take(&mut self.spectrum);
        bins.resize(source.bin_count(), 0);
        source.read_byte_frequencies(&mut bins);
        let update = self.on_audio_tick(&bins, at);
        self.spectrum = bins;
        update
    }

    /// Records that `monitor` could not start. The session keeps running on
    /// the remaining monitors.
    pub fn report_failure(&mut self, monitor: MonitorKind, at: HostTime) {
        let slot = self.unavailable.slot(monitor);
        if *slot {
            return;
        }
        *slot = true;
        Tracer::new(&mut self.sink).monitor_failure(&MonitorFailureEvent { at, monitor });
    }

    /// Returns `false` if `monitor` reported a start-up failure.
    #[must_use]
    pub const fn is_available(&self, monitor: MonitorKind) -> bool {
        !self.unavailable.get(monitor)
    }

    /// Ends monitoring. Returns `false` if the session was already stopped.
    pub fn stop(&mut self, at: HostTime) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        Tracer::new(&mut self.sink).session_stop(&SessionStopEvent {
            at,
            score: self.accumulator.score(),
            events: self.accumulator.increments(),
        });
        true
    }

    fn apply(&mut self, increment: RiskIncrement, at: HostTime) -> RiskUpdate {
        let update = self.accumulator.apply(increment, at);
        self.display.show(&update);
        Tracer::new(&mut self.sink).risk_increase(&RiskIncreaseEvent {
            entry: &update.entry,
            band: update.band,
        });
        update
    }

    /// `true` until [`stop`](Self::stop) is called.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Current score.
    #[must_use]
    pub const fn score(&self) -> u64 {
        self.accumulator.score()
    }

    /// Current band.
    #[must_use]
    pub const fn band(&self) -> RiskBand {
        self.accumulator.band()
    }

    /// Score, band, and increment count.
    #[must_use]
    pub const fn snapshot(&self) -> RiskSnapshot {
        RiskSnapshot {
            score: self.accumulator.score(),
            band: self.accumulator.band(),
            events: self.accumulator.increments(),
        }
    }

    /// The event log, newest first.
    #[must_use]
    pub const fn log(&self) -> &EventLog {
        self.accumulator.log()
    }

    /// Whether a face is currently missing.
    #[must_use]
    pub const fn is_face_absent(&self) -> bool {
        self.presence.is_face_absent()
    }

    /// Detection frames processed so far.
    #[must_use]
    pub const fn frames_observed(&self) -> u64 {
        self.frames_observed
    }

    /// The display.
    #[must_use]
    pub const fn display(&self) -> &D {
        &self.display
    }

    /// Consumes the session and returns the display and sink.
    pub fn into_parts(self) -> (D, S) {
        (self.display, self.sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::DetectionFrame;
    use alloc::collections::VecDeque;
    use alloc::string::String;
    use alloc::vec;

    #[derive(Debug, Default)]
    struct RecordingDisplay {
        resets: Vec<RiskSnapshot>,
        shown_scores: Vec<u64>,
        shown_colors: Vec<&'static str>,
        lines: VecDeque<String>,
    }

    impl RiskDisplay for RecordingDisplay {
        fn reset(&mut self, snapshot: &RiskSnapshot) {
            self.resets.push(*snapshot);
            self.lines.clear();
        }

        fn show(&mut self, update: &RiskUpdate) {
            self.shown_scores.push(update.score);
            self.shown_colors.push(update.band.css_color());
            self.lines.push_front(String::from(update.entry.reason.as_str()));
            if update.evicted.is_some() {
                self.lines.pop_back();
            }
        }
    }

    struct QueueFrames(VecDeque<DetectionFrame>);

    impl FrameSource for QueueFrames {
        fn next_frame(&mut self) -> Option<DetectionFrame> {
            self.0.pop_front()
        }
    }

    struct FlatSpectrum {
        level: u8,
        bins: usize,
    }

    impl SpectrumSource for FlatSpectrum {
        fn bin_count(&self) -> usize {
            self.bins
        }

        fn read_byte_frequencies(&mut self, out: &mut [u8]) {
            out.fill(self.level);
        }
    }

    const MS: u64 = 1000;

    fn session() -> Session<RecordingDisplay> {
        Session::new(ProctorConfig::exam(), Timebase::MICROS, RecordingDisplay::default())
    }

    #[test]
    fn starts_green_at_zero() {
        let s = session();
        assert_eq!(s.display().resets.len(), 1, "painted once at start");
        assert_eq!(s.display().resets[0].score, 0);
        assert_eq!(s.display().resets[0].band, RiskBand::Low);
        assert!(s.is_running());
    }

    #[test]
    fn display_tracks_running_sum_and_color() {
        let mut s = session();
        for (i, amount) in [10_u32, 15, 5, 25, 5].into_iter().enumerate() {
            s.increase_risk(amount, "step", HostTime(i as u64));
        }
        let d = s.display();
        assert_eq!(d.shown_scores, [10, 25, 30, 55, 60]);
        assert_eq!(d.shown_colors, ["green", "green", "orange", "orange", "red"]);
        assert_eq!(s.score(), 60);
    }

    #[test]
    fn monitors_share_one_score() {
        let mut s = session();
        s.on_visibility_change(VisibilityState::Hidden, HostTime(0));
        s.on_face_results(&FaceResults::with_face_count(2), HostTime(MS));
        s.on_audio_tick(&[61; 256], HostTime(2 * MS));
        assert_eq!(s.score(), 20 + 25 + 10);
        assert_eq!(s.band(), RiskBand::Medium);
        assert_eq!(
            s.display().lines,
            [
                "Suspicious audio detected",
                "Multiple faces detected",
                "Tab switched or window minimized",
            ]
        );
    }

    #[test]
    fn pump_frames_drains_queue() {
        let mut s = session();
        let mut frames = QueueFrames(
            (0..=31_u64)
                .map(|i| DetectionFrame {
                    at: HostTime(i * 100 * MS),
                    results: FaceResults::missing(),
                })
                .collect(),
        );
        assert_eq!(s.pump_frames(&mut frames), 32);
        assert_eq!(s.frames_observed(), 32);
        assert!(s.is_face_absent());
        // Alert at 3100ms (re-armed); next would be at 6200ms.
        assert_eq!(s.score(), 15);
        assert_eq!(s.pump_frames(&mut frames), 0);
    }

    #[test]
    fn sample_audio_reads_full_spectrum() {
        let mut s = session();
        let mut quiet = FlatSpectrum { level: 60, bins: 256 };
        let mut loud = FlatSpectrum { level: 61, bins: 256 };
        assert!(s.sample_audio(&mut quiet, HostTime(0)).is_none());
        let update = s.sample_audio(&mut loud, HostTime(16 * MS)).unwrap();
        assert_eq!(update.entry.amount, 10);
    }

    #[test]
    fn audio_failure_disables_audio_only() {
        let mut s = session();
        s.report_failure(MonitorKind::Audio, HostTime(0));
        assert!(!s.is_available(MonitorKind::Audio));
        assert!(s.is_available(MonitorKind::Camera));

        let mut loud = FlatSpectrum { level: 255, bins: 256 };
        for i in 0..100 {
            assert!(s.sample_audio(&mut loud, HostTime(i * 16 * MS)).is_none());
        }
        assert_eq!(s.score(), 0);
        s.on_visibility_change(VisibilityState::Hidden, HostTime(2_000 * MS));
        assert_eq!(s.score(), 20, "other monitors keep working");
    }

    #[test]
    fn visibility_failure_keeps_session_running() {
        let mut s = session();
        s.report_failure(MonitorKind::Visibility, HostTime(0));
        assert!(!s.is_available(MonitorKind::Visibility));
        assert!(s.is_available(MonitorKind::Camera));
        assert!(s.is_available(MonitorKind::Audio));
        assert!(s.is_running(), "a missing listener does not end the session");

        s.on_face_results(&FaceResults::with_face_count(2), HostTime(MS));
        s.on_audio_tick(&[61; 256], HostTime(2 * MS));
        assert_eq!(s.score(), 25 + 10);
    }

    #[test]
    fn stop_freezes_the_score() {
        let mut s = session();
        s.increase_risk(25, RiskReason::MultipleFaces, HostTime(0));
        assert!(s.stop(HostTime(MS)));
        assert!(!s.stop(HostTime(2 * MS)), "stop is idempotent");

        assert!(s.increase_risk(5, "late", HostTime(3 * MS)).is_none());
        assert!(s.on_visibility_change(VisibilityState::Hidden, HostTime(3 * MS)).is_none());
        assert!(s.on_audio_tick(&[255; 4], HostTime(3 * MS)).is_none());
        let mut frames = QueueFrames(VecDeque::from(vec![DetectionFrame {
            at: HostTime(4 * MS),
            results: FaceResults::with_face_count(2),
        }]));
        assert_eq!(s.pump_frames(&mut frames), 0);
        assert_eq!(s.score(), 25);
        assert_eq!(s.snapshot().events, 1);
    }

    #[test]
    fn capped_log_evicts_from_display() {
        let mut cfg = ProctorConfig::exam();
        cfg.log_capacity = Some(3);
        let mut s = Session::new(cfg, Timebase::MICROS, RecordingDisplay::default());
        for i in 0..5 {
            s.on_visibility_change(VisibilityState::Hidden, HostTime(i));
        }
        assert_eq!(s.log().len(), 3);
        assert_eq!(s.display().lines.len(), 3);
        assert_eq!(s.score(), 100);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn traces_transitions_and_stop() {
        use crate::presence::PresenceTransition;

        #[derive(Default)]
        struct Sink {
            transitions: Vec<PresenceTransition>,
            increases: Vec<u64>,
            stops: u32,
        }
        impl TraceSink for Sink {
            fn on_presence_transition(&mut self, e: &PresenceTransitionEvent) {
                self.transitions.push(e.transition);
            }
            fn on_risk_increase(&mut self, e: &RiskIncreaseEvent<'_>) {
                self.increases.push(e.entry.total);
            }
            fn on_session_stop(&mut self, _e: &SessionStopEvent) {
                self.stops += 1;
            }
        }

        let mut s = Session::with_sink(
            ProctorConfig::exam(),
            Timebase::MICROS,
            crate::display::NullDisplay,
            Sink::default(),
        );
        s.on_face_results(&FaceResults::missing(), HostTime(0));
        s.on_face_results(&FaceResults::with_face_count(2), HostTime(MS));
        s.stop(HostTime(2 * MS));
        s.stop(HostTime(3 * MS));

        let (_, sink) = s.into_parts();
        assert_eq!(
            sink.transitions,
            [PresenceTransition::FaceLost, PresenceTransition::FaceRegained]
        );
        assert_eq!(sink.increases, [25]);
        assert_eq!(sink.stops, 1);
    }
}
