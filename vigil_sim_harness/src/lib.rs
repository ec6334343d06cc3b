// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted sources and a scenario runner for exercising sessions without a
//! browser.
//!
//! - [`ScriptedFrames`]: a [`FrameSource`] over pre-built detection frames,
//!   released up to a moving clock.
//! - [`ScriptedSpectrum`]: a [`SpectrumSource`] with a flat, settable level.
//! - [`Scenario`]: a timeline of face counts, audio levels, visibility changes
//!   and monitor failures, played into a [`Session`] on a fixed tick.
//! - [`RiskTally`] and [`ScenarioReport`]: what came out.

#![no_std]

extern crate alloc;

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use vigil_core::config::ProctorConfig;
use vigil_core::display::{NullDisplay, RiskDisplay};
use vigil_core::risk::{EventLog, RiskBand, RiskReason};
use vigil_core::session::Session;
use vigil_core::source::{DetectionFrame, FaceResults, FrameSource, SpectrumSource};
use vigil_core::time::{Duration, HostTime, Timebase};
use vigil_core::trace::{MonitorKind, TraceSink};
use vigil_core::visibility::VisibilityState;

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Pre-built detection frames, handed out in order.
///
/// Frames stamped after the release point are held back, which mimics a
/// detector that delivers results between ticks. Without a release point
/// every frame is available immediately.
#[derive(Clone, Debug, Default)]
pub struct ScriptedFrames {
    frames: VecDeque<DetectionFrame>,
    released: Option<HostTime>,
}

impl ScriptedFrames {
    /// Wraps the given frames. They should be in time order.
    #[must_use]
    pub fn new(frames: impl IntoIterator<Item = DetectionFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            released: None,
        }
    }

    /// One frame every `interval`, starting at `start`, with the given face
    /// counts.
    #[must_use]
    pub fn from_counts(
        start: HostTime,
        interval: Duration,
        counts: impl IntoIterator<Item = usize>,
    ) -> Self {
        let mut at = start;
        Self::new(counts.into_iter().map(|count| {
            let frame = DetectionFrame {
                at,
                results: FaceResults::with_face_count(count),
            };
            at = at + interval;
            frame
        }))
    }

    /// Makes frames stamped at or before `now` available.
    pub fn release_until(&mut self, now: HostTime) {
        self.released = Some(now);
    }

    /// Frames not yet handed out, released or not.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for ScriptedFrames {
    fn next_frame(&mut self) -> Option<DetectionFrame> {
        let front = self.frames.front()?;
        if self.released.is_some_and(|until| front.at > until) {
            return None;
        }
        self.frames.pop_front()
    }
}

/// A spectrum where every bin holds the same level.
#[derive(Clone, Copy, Debug)]
pub struct ScriptedSpectrum {
    bins: usize,
    level: u8,
}

impl ScriptedSpectrum {
    /// Creates a silent spectrum with `bins` bins.
    #[must_use]
    pub const fn new(bins: usize) -> Self {
        Self { bins, level: 0 }
    }

    /// Sets the level returned for every bin.
    pub fn set_level(&mut self, level: u8) {
        self.level = level;
    }
}

impl SpectrumSource for ScriptedSpectrum {
    fn bin_count(&self) -> usize {
        self.bins
    }

    fn read_byte_frequencies(&mut self, out: &mut [u8]) {
        out.fill(self.level);
    }
}

// ---------------------------------------------------------------------------
// Tally
// ---------------------------------------------------------------------------

/// Increments counted by reason.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RiskTally {
    /// "Face not detected" alerts.
    pub face_not_detected: u64,
    /// "Multiple faces detected" alerts.
    pub multiple_faces: u64,
    /// "Tab switched or window minimized" alerts.
    pub tab_hidden: u64,
    /// "Suspicious audio detected" alerts.
    pub suspicious_audio: u64,
    /// Caller-supplied reasons.
    pub other: u64,
}

impl RiskTally {
    /// Counts the entries still held in `log`.
    #[must_use]
    pub fn from_log(log: &EventLog) -> Self {
        let mut tally = Self::default();
        for entry in log.iter() {
            tally.record(&entry.reason);
        }
        tally
    }

    /// Counts one increment.
    pub fn record(&mut self, reason: &RiskReason) {
        let slot = match reason {
            RiskReason::FaceNotDetected => &mut self.face_not_detected,
            RiskReason::MultipleFaces => &mut self.multiple_faces,
            RiskReason::TabHidden => &mut self.tab_hidden,
            RiskReason::SuspiciousAudio => &mut self.suspicious_audio,
            RiskReason::Other(_) => &mut self.other,
        };
        *slot += 1;
    }

    /// Sum of all counts.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.face_not_detected
            + self.multiple_faces
            + self.tab_hidden
            + self.suspicious_audio
            + self.other
    }
}

/// Outcome of [`Scenario::run`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScenarioReport {
    /// Final score.
    pub score: u64,
    /// Final band.
    pub band: RiskBand,
    /// Increments applied, including any evicted from a capped log.
    pub increments: u64,
    /// Increments by reason, from the entries still in the log.
    pub tally: RiskTally,
    /// Detection frames the session processed.
    pub frames_observed: u64,
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
struct Span<T> {
    start_ms: u64,
    end_ms: u64,
    value: T,
}

fn value_at<T: Copy>(spans: &[Span<T>], ms: u64, default: T) -> T {
    // Later spans override earlier ones.
    spans
        .iter()
        .rev()
        .find(|s| s.start_ms <= ms && ms < s.end_ms)
        .map_or(default, |s| s.value)
}

/// A scripted session timeline.
///
/// Times are milliseconds from session start. Span ranges are half-open,
/// `[from, to)`. Outside any face span the camera sees exactly one face;
/// outside any audio span the microphone is silent.
#[derive(Clone, Debug)]
pub struct Scenario {
    duration_ms: u64,
    tick_ms: u64,
    frame_interval_ms: u64,
    timebase: Timebase,
    faces: Vec<Span<usize>>,
    audio: Vec<Span<u8>>,
    visibility: Vec<(u64, VisibilityState)>,
    failures: Vec<(u64, MonitorKind)>,
}

impl Scenario {
    /// A scenario of `duration_ms` with a 16 ms tick, 33 ms detection
    /// interval, and nanosecond timebase.
    #[must_use]
    pub fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            tick_ms: 16,
            frame_interval_ms: 33,
            timebase: Timebase::NANOS,
            faces: Vec::new(),
            audio: Vec::new(),
            visibility: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Sets the tick interval.
    #[must_use]
    pub fn tick_ms(mut self, ms: u64) -> Self {
        self.tick_ms = ms.max(1);
        self
    }

    /// Sets the interval between detection results.
    #[must_use]
    pub fn frame_interval_ms(mut self, ms: u64) -> Self {
        self.frame_interval_ms = ms.max(1);
        self
    }

    /// Sets the timebase. Sessions passed to [`run`](Self::run) must use the
    /// same one.
    #[must_use]
    pub fn timebase(mut self, timebase: Timebase) -> Self {
        self.timebase = timebase;
        self
    }

    /// The camera sees `count` faces during `[from_ms, to_ms)`.
    #[must_use]
    pub fn faces(mut self, from_ms: u64, to_ms: u64, count: usize) -> Self {
        self.faces.push(Span {
            start_ms: from_ms,
            end_ms: to_ms,
            value: count,
        });
        self
    }

    /// Every frequency bin reads `level` during `[from_ms, to_ms)`.
    #[must_use]
    pub fn audio(mut self, from_ms: u64, to_ms: u64, level: u8) -> Self {
        self.audio.push(Span {
            start_ms: from_ms,
            end_ms: to_ms,
            value: level,
        });
        self
    }

    /// The page changes visibility at `at_ms`.
    #[must_use]
    pub fn visibility(mut self, at_ms: u64, state: VisibilityState) -> Self {
        self.visibility.push((at_ms, state));
        self.visibility.sort_by_key(|&(at, _)| at);
        self
    }

    /// `monitor` fails to start at `at_ms`.
    #[must_use]
    pub fn fail(mut self, at_ms: u64, monitor: MonitorKind) -> Self {
        self.failures.push((at_ms, monitor));
        self.failures.sort_by_key(|&(at, _)| at);
        self
    }

    fn at(&self, ms: u64) -> HostTime {
        HostTime(0) + Duration::from_millis(ms, self.timebase)
    }

    /// Every detection frame the camera would deliver.
    #[must_use]
    pub fn frames(&self) -> ScriptedFrames {
        let count = self.duration_ms / self.frame_interval_ms + 1;
        ScriptedFrames::from_counts(
            self.at(0),
            Duration::from_millis(self.frame_interval_ms, self.timebase),
            (0..count).map(|k| value_at(&self.faces, k * self.frame_interval_ms, 1)),
        )
    }

    /// Plays the timeline into `session` and stops it at the end.
    ///
    /// On each tick, in order: due failures, due visibility changes, released
    /// detection frames, one audio snapshot.
    pub fn run<D: RiskDisplay, S: TraceSink>(&self, session: &mut Session<D, S>) -> ScenarioReport {
        let mut frames = self.frames();
        let mut spectrum = ScriptedSpectrum::new(64);
        let mut visibility = self.visibility.iter().peekable();
        let mut failures = self.failures.iter().peekable();

        let mut ms = 0;
        while ms <= self.duration_ms {
            let now = self.at(ms);
            while let Some(&(_, monitor)) = failures.next_if(|(at, _)| *at <= ms) {
                session.report_failure(monitor, now);
            }
            while let Some(&(_, state)) = visibility.next_if(|(at, _)| *at <= ms) {
                _ = session.on_visibility_change(state, now);
            }
            frames.release_until(now);
            session.pump_frames(&mut frames);
            spectrum.set_level(value_at(&self.audio, ms, 0));
            _ = session.sample_audio(&mut spectrum, now);
            ms += self.tick_ms;
        }
        session.stop(self.at(self.duration_ms));

        let snapshot = session.snapshot();
        ScenarioReport {
            score: snapshot.score,
            band: snapshot.band,
            increments: snapshot.events,
            tally: RiskTally::from_log(session.log()),
            frames_observed: session.frames_observed(),
        }
    }

    /// Runs against a fresh untraced session with no display.
    #[must_use]
    pub fn run_headless(&self, config: ProctorConfig) -> ScenarioReport {
        let mut session = Session::new(config, self.timebase, NullDisplay);
        self.run(&mut session)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_frames_wait_for_release() {
        let mut frames = ScriptedFrames::from_counts(
            HostTime(0),
            Duration(10),
            [1, 0, 2],
        );
        frames.release_until(HostTime(10));
        assert_eq!(frames.next_frame().map(|f| f.results.face_count()), Some(1));
        assert_eq!(frames.next_frame().map(|f| f.results.face_count()), Some(0));
        assert!(frames.next_frame().is_none(), "third frame is at 20");
        assert_eq!(frames.remaining(), 1);
        frames.release_until(HostTime(20));
        assert_eq!(frames.next_frame().map(|f| f.at), Some(HostTime(20)));
    }

    #[test]
    fn continuous_absence_alerts_once_per_window() {
        // Frames at multiples of 33 ms: alerts at 3003, 6006, 9009.
        let report = Scenario::new(10_000)
            .faces(0, 9_500, 0)
            .run_headless(ProctorConfig::exam());
        assert_eq!(report.tally.face_not_detected, 3);
        assert_eq!(report.score, 45);
        assert_eq!(report.band, RiskBand::Medium);
    }

    #[test]
    fn short_absence_is_free() {
        let report = Scenario::new(5_000)
            .faces(1_000, 3_900, 0)
            .run_headless(ProctorConfig::exam());
        assert_eq!(report.score, 0);
        assert_eq!(report.frames_observed, 5_000 / 33 + 1);
    }

    #[test]
    fn every_crowded_frame_counts() {
        // Frames at 0, 33, 66, 99.
        let report = Scenario::new(200)
            .faces(0, 100, 2)
            .run_headless(ProctorConfig::exam());
        assert_eq!(report.tally.multiple_faces, 4);
        assert_eq!(report.score, 100);
        assert_eq!(report.band, RiskBand::High);
    }

    #[test]
    fn tab_switches_count_only_when_hidden() {
        let report = Scenario::new(4_000)
            .visibility(1_000, VisibilityState::Hidden)
            .visibility(2_000, VisibilityState::Visible)
            .visibility(3_000, VisibilityState::Hidden)
            .run_headless(ProctorConfig::exam());
        assert_eq!(report.tally.tab_hidden, 2);
        assert_eq!(report.score, 40);
    }

    #[test]
    fn loud_audio_fires_every_tick() {
        // Ticks at 0, 16, .., 96 fall inside [0, 100).
        let report = Scenario::new(500)
            .audio(0, 100, 61)
            .run_headless(ProctorConfig::exam());
        assert_eq!(report.tally.suspicious_audio, 7);
        assert_eq!(report.score, 70);
    }

    #[test]
    fn threshold_level_is_quiet() {
        let report = Scenario::new(500)
            .audio(0, 500, 60)
            .run_headless(ProctorConfig::exam());
        assert_eq!(report.score, 0);
    }

    #[test]
    fn failed_microphone_ignores_audio() {
        let report = Scenario::new(500)
            .fail(0, MonitorKind::Audio)
            .audio(0, 500, 255)
            .run_headless(ProctorConfig::exam());
        assert_eq!(report.score, 0);
        assert_eq!(report.band, RiskBand::Low);
    }

    #[test]
    fn bounded_preset_throttles_repeats() {
        // 250 ms audio cooldown over one second of noise: 0, 256, 512, 768.
        let report = Scenario::new(2_000)
            .audio(0, 1_000, 200)
            .run_headless(ProctorConfig::bounded());
        assert_eq!(report.tally.suspicious_audio, 4);
        assert_eq!(report.increments, 4);
    }

    #[test]
    fn headless_runs_are_deterministic() {
        let scenario = Scenario::new(8_000)
            .faces(500, 4_000, 0)
            .faces(6_000, 6_100, 3)
            .audio(7_000, 7_050, 90)
            .visibility(2_000, VisibilityState::Hidden);
        let a = scenario.run_headless(ProctorConfig::exam());
        let b = scenario.run_headless(ProctorConfig::exam());
        assert_eq!(a, b);
        assert_eq!(a.tally.total(), a.increments);
    }
}
