// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are printed in milliseconds using a [`Timebase`].
//!
//! Per-frame and per-tick events are noisy; they are only printed when
//! [`verbose`](PrettyPrintSink::verbose) is set.

use std::io::Write;

use vigil_core::presence::PresenceTransition;
use vigil_core::time::{HostTime, Timebase};
use vigil_core::trace::{
    AudioTickEvent, FrameObservedEvent, MonitorFailureEvent, PresenceTransitionEvent,
    RiskIncreaseEvent, SessionStopEvent, TraceSink, VisibilityChangeEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
    verbose: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self::with_writer(Box::new(std::io::stderr()), timebase)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self {
            writer,
            timebase,
            verbose: false,
        }
    }

    /// Also prints every observed frame and audio tick.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn ms(&self, t: HostTime) -> f64 {
        self.timebase.ticks_to_nanos(t.ticks()) as f64 / 1_000_000.0
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_frame_observed(&mut self, e: &FrameObservedEvent) {
        if !self.verbose {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[frame] #{} at {:.1}ms faces={}",
            e.frame_index,
            self.ms(e.at),
            e.face_count,
        );
    }

    fn on_presence_transition(&mut self, e: &PresenceTransitionEvent) {
        let what = match e.transition {
            PresenceTransition::FaceLost => "face lost",
            PresenceTransition::FaceRegained => "face regained",
        };
        let _ = writeln!(self.writer, "[presence] {what} at {:.1}ms", self.ms(e.at));
    }

    fn on_audio_tick(&mut self, e: &AudioTickEvent) {
        if !self.verbose && !e.exceeded {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[audio] at {:.1}ms mean={:.1}{}",
            self.ms(e.at),
            e.mean,
            if e.exceeded { " LOUD" } else { "" },
        );
    }

    fn on_visibility_change(&mut self, e: &VisibilityChangeEvent) {
        let _ = writeln!(
            self.writer,
            "[visibility] {:?} at {:.1}ms",
            e.state,
            self.ms(e.at),
        );
    }

    fn on_risk_increase(&mut self, e: &RiskIncreaseEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[risk] #{} at {:.1}ms +{} -> {} ({}) {}",
            e.entry.sequence,
            self.ms(e.entry.at),
            e.entry.amount,
            e.entry.total,
            e.band.as_str(),
            e.entry.reason,
        );
    }

    fn on_monitor_failure(&mut self, e: &MonitorFailureEvent) {
        let _ = writeln!(
            self.writer,
            "[failure] {:?} unavailable at {:.1}ms",
            e.monitor,
            self.ms(e.at),
        );
    }

    fn on_session_stop(&mut self, e: &SessionStopEvent) {
        let _ = writeln!(
            self.writer,
            "[stop] at {:.1}ms score={} events={}",
            self.ms(e.at),
            e.score,
            e.events,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::risk::{EventLogEntry, RiskBand, RiskReason};
    use vigil_core::trace::MonitorKind;

    fn output(sink: PrettyPrintSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn risk_line_shows_total_and_reason() {
        let mut sink = PrettyPrintSink::with_writer(Vec::new(), Timebase::MICROS);
        let entry = EventLogEntry {
            sequence: 1,
            at: HostTime(3_250_000),
            amount: 15,
            total: 35,
            reason: RiskReason::FaceNotDetected,
        };
        sink.on_risk_increase(&RiskIncreaseEvent {
            entry: &entry,
            band: RiskBand::Medium,
        });
        assert_eq!(
            output(sink),
            "[risk] #1 at 3250.0ms +15 -> 35 (medium) Face not detected\n"
        );
    }

    #[test]
    fn quiet_mode_skips_per_frame_noise() {
        let mut sink = PrettyPrintSink::with_writer(Vec::new(), Timebase::NANOS);
        sink.on_frame_observed(&FrameObservedEvent {
            frame_index: 0,
            at: HostTime(0),
            face_count: 1,
        });
        sink.on_audio_tick(&AudioTickEvent {
            at: HostTime(0),
            mean: 10.0,
            exceeded: false,
        });
        sink.on_monitor_failure(&MonitorFailureEvent {
            at: HostTime(2_000_000),
            monitor: MonitorKind::Camera,
        });
        assert_eq!(output(sink), "[failure] Camera unavailable at 2.0ms\n");
    }

    #[test]
    fn verbose_mode_prints_frames() {
        let mut sink = PrettyPrintSink::with_writer(Vec::new(), Timebase::NANOS).verbose(true);
        sink.on_frame_observed(&FrameObservedEvent {
            frame_index: 4,
            at: HostTime(1_500_000),
            face_count: 2,
        });
        assert_eq!(output(sink), "[frame] #4 at 1.5ms faces=2\n");
    }
}
