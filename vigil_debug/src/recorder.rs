// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records, each starting with a tag byte.
//! [`decode`] reads them back as an iterator of [`RecordedEvent`].
//!
//! Risk reasons are stored as a tag byte; caller-supplied reasons carry a
//! `u32` length and their UTF-8 text.

use vigil_core::presence::PresenceTransition;
use vigil_core::risk::{EventLogEntry, RiskBand, RiskReason};
use vigil_core::time::HostTime;
use vigil_core::trace::{
    AudioTickEvent, FrameObservedEvent, MonitorFailureEvent, MonitorKind,
    PresenceTransitionEvent, RiskIncreaseEvent, SessionStopEvent, TraceSink,
    VisibilityChangeEvent,
};
use vigil_core::visibility::VisibilityState;

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_FRAME_OBSERVED: u8 = 1;
const TAG_PRESENCE_TRANSITION: u8 = 2;
const TAG_AUDIO_TICK: u8 = 3;
const TAG_VISIBILITY_CHANGE: u8 = 4;
const TAG_RISK_INCREASE: u8 = 5;
const TAG_MONITOR_FAILURE: u8 = 6;
const TAG_SESSION_STOP: u8 = 7;

const REASON_FACE_NOT_DETECTED: u8 = 0;
const REASON_MULTIPLE_FACES: u8 = 1;
const REASON_TAB_HIDDEN: u8 = 2;
const REASON_SUSPICIOUS_AUDIO: u8 = 3;
const REASON_OTHER: u8 = 4;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    fn write_band(&mut self, band: RiskBand) {
        self.write_u8(match band {
            RiskBand::Low => 0,
            RiskBand::Medium => 1,
            RiskBand::High => 2,
        });
    }

    fn write_monitor(&mut self, monitor: MonitorKind) {
        self.write_u8(match monitor {
            MonitorKind::Camera => 0,
            MonitorKind::Audio => 1,
            MonitorKind::Visibility => 2,
        });
    }

    fn write_reason(&mut self, reason: &RiskReason) {
        match reason {
            RiskReason::FaceNotDetected => self.write_u8(REASON_FACE_NOT_DETECTED),
            RiskReason::MultipleFaces => self.write_u8(REASON_MULTIPLE_FACES),
            RiskReason::TabHidden => self.write_u8(REASON_TAB_HIDDEN),
            RiskReason::SuspiciousAudio => self.write_u8(REASON_SUSPICIOUS_AUDIO),
            RiskReason::Other(text) => {
                self.write_u8(REASON_OTHER);
                let bytes = text.as_bytes();
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "reason text capped at u32::MAX bytes for recording"
                )]
                let len = bytes.len().min(u32::MAX as usize) as u32;
                self.write_u32(len);
                self.buf.extend_from_slice(&bytes[..len as usize]);
            }
        }
    }
}

impl TraceSink for RecorderSink {
    fn on_frame_observed(&mut self, e: &FrameObservedEvent) {
        self.write_u8(TAG_FRAME_OBSERVED);
        self.write_u64(e.frame_index);
        self.write_u64(e.at.ticks());
        self.write_u32(e.face_count);
    }

    fn on_presence_transition(&mut self, e: &PresenceTransitionEvent) {
        self.write_u8(TAG_PRESENCE_TRANSITION);
        self.write_u64(e.at.ticks());
        self.write_u8(match e.transition {
            PresenceTransition::FaceLost => 0,
            PresenceTransition::FaceRegained => 1,
        });
    }

    fn on_audio_tick(&mut self, e: &AudioTickEvent) {
        self.write_u8(TAG_AUDIO_TICK);
        self.write_u64(e.at.ticks());
        self.write_f64(e.mean);
        self.write_u8(u8::from(e.exceeded));
    }

    fn on_visibility_change(&mut self, e: &VisibilityChangeEvent) {
        self.write_u8(TAG_VISIBILITY_CHANGE);
        self.write_u64(e.at.ticks());
        self.write_u8(u8::from(e.state == VisibilityState::Hidden));
    }

    fn on_risk_increase(&mut self, e: &RiskIncreaseEvent<'_>) {
        self.write_u8(TAG_RISK_INCREASE);
        self.write_u64(e.entry.sequence);
        self.write_u64(e.entry.at.ticks());
        self.write_u32(e.entry.amount);
        self.write_u64(e.entry.total);
        self.write_band(e.band);
        self.write_reason(&e.entry.reason);
    }

    fn on_monitor_failure(&mut self, e: &MonitorFailureEvent) {
        self.write_u8(TAG_MONITOR_FAILURE);
        self.write_u64(e.at.ticks());
        self.write_monitor(e.monitor);
    }

    fn on_session_stop(&mut self, e: &SessionStopEvent) {
        self.write_u8(TAG_SESSION_STOP);
        self.write_u64(e.at.ticks());
        self.write_u64(e.score);
        self.write_u64(e.events);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`FrameObservedEvent`].
    FrameObserved(FrameObservedEvent),
    /// A [`PresenceTransitionEvent`].
    PresenceTransition(PresenceTransitionEvent),
    /// An [`AudioTickEvent`].
    AudioTick(AudioTickEvent),
    /// A [`VisibilityChangeEvent`].
    VisibilityChange(VisibilityChangeEvent),
    /// An owned [`RiskIncreaseEvent`].
    RiskIncrease {
        /// The log entry.
        entry: EventLogEntry,
        /// Band after the increment.
        band: RiskBand,
    },
    /// A [`MonitorFailureEvent`].
    MonitorFailure(MonitorFailureEvent),
    /// A [`SessionStopEvent`].
    SessionStop(SessionStopEvent),
}

impl RecordedEvent {
    /// Host time the event refers to.
    #[must_use]
    pub fn at(&self) -> HostTime {
        match self {
            Self::FrameObserved(e) => e.at,
            Self::PresenceTransition(e) => e.at,
            Self::AudioTick(e) => e.at,
            Self::VisibilityChange(e) => e.at,
            Self::RiskIncrease { entry, .. } => entry.at,
            Self::MonitorFailure(e) => e.at,
            Self::SessionStop(e) => e.at,
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first truncated record or unknown tag.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take(&mut self, n: usize) -> Option<&[u8]> {
        let end = self.pos.checked_add(n)?;
        let bytes = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn read_u32(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes(self.take(4)?.try_into().ok()?))
    }

    fn read_u64(&mut self) -> Option<u64> {
        Some(u64::from_le_bytes(self.take(8)?.try_into().ok()?))
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_band(&mut self) -> Option<RiskBand> {
        Some(match self.read_u8()? {
            0 => RiskBand::Low,
            1 => RiskBand::Medium,
            _ => RiskBand::High,
        })
    }

    fn read_monitor(&mut self) -> Option<MonitorKind> {
        Some(match self.read_u8()? {
            0 => MonitorKind::Camera,
            1 => MonitorKind::Audio,
            _ => MonitorKind::Visibility,
        })
    }

    fn read_reason(&mut self) -> Option<RiskReason> {
        Some(match self.read_u8()? {
            REASON_FACE_NOT_DETECTED => RiskReason::FaceNotDetected,
            REASON_MULTIPLE_FACES => RiskReason::MultipleFaces,
            REASON_TAB_HIDDEN => RiskReason::TabHidden,
            REASON_SUSPICIOUS_AUDIO => RiskReason::SuspiciousAudio,
            REASON_OTHER => {
                let len = self.read_u32()? as usize;
                let text = String::from_utf8(self.take(len)?.to_vec()).ok()?;
                RiskReason::from(text)
            }
            _ => return None,
        })
    }

    fn decode_frame_observed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameObserved(FrameObservedEvent {
            frame_index: self.read_u64()?,
            at: self.read_time()?,
            face_count: self.read_u32()?,
        }))
    }

    fn decode_presence_transition(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PresenceTransition(PresenceTransitionEvent {
            at: self.read_time()?,
            transition: match self.read_u8()? {
                0 => PresenceTransition::FaceLost,
                _ => PresenceTransition::FaceRegained,
            },
        }))
    }

    fn decode_audio_tick(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::AudioTick(AudioTickEvent {
            at: self.read_time()?,
            mean: f64::from_bits(self.read_u64()?),
            exceeded: self.read_u8()? != 0,
        }))
    }

    fn decode_visibility_change(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::VisibilityChange(VisibilityChangeEvent {
            at: self.read_time()?,
            state: VisibilityState::from_hidden(self.read_u8()? != 0),
        }))
    }

    fn decode_risk_increase(&mut self) -> Option<RecordedEvent> {
        let sequence = self.read_u64()?;
        let at = self.read_time()?;
        let amount = self.read_u32()?;
        let total = self.read_u64()?;
        let band = self.read_band()?;
        let reason = self.read_reason()?;
        Some(RecordedEvent::RiskIncrease {
            entry: EventLogEntry {
                sequence,
                at,
                amount,
                total,
                reason,
            },
            band,
        })
    }

    fn decode_monitor_failure(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::MonitorFailure(MonitorFailureEvent {
            at: self.read_time()?,
            monitor: self.read_monitor()?,
        }))
    }

    fn decode_session_stop(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::SessionStop(SessionStopEvent {
            at: self.read_time()?,
            score: self.read_u64()?,
            events: self.read_u64()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_FRAME_OBSERVED => self.decode_frame_observed(),
            TAG_PRESENCE_TRANSITION => self.decode_presence_transition(),
            TAG_AUDIO_TICK => self.decode_audio_tick(),
            TAG_VISIBILITY_CHANGE => self.decode_visibility_change(),
            TAG_RISK_INCREASE => self.decode_risk_increase(),
            TAG_MONITOR_FAILURE => self.decode_monitor_failure(),
            TAG_SESSION_STOP => self.decode_session_stop(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(reason: RiskReason) -> EventLogEntry {
        EventLogEntry {
            sequence: 3,
            at: HostTime(4_500_000),
            amount: 15,
            total: 55,
            reason,
        }
    }

    #[test]
    fn risk_increase_keeps_custom_reason_text() {
        let mut rec = RecorderSink::new();
        let custom = entry(RiskReason::from("Phone visible"));
        rec.on_risk_increase(&RiskIncreaseEvent {
            entry: &custom,
            band: RiskBand::Medium,
        });
        let standard = entry(RiskReason::FaceNotDetected);
        rec.on_risk_increase(&RiskIncreaseEvent {
            entry: &standard,
            band: RiskBand::Medium,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(
            events,
            [
                RecordedEvent::RiskIncrease {
                    entry: custom,
                    band: RiskBand::Medium,
                },
                RecordedEvent::RiskIncrease {
                    entry: standard,
                    band: RiskBand::Medium,
                },
            ]
        );
    }

    #[test]
    fn mixed_session_decodes_in_order() {
        let mut rec = RecorderSink::new();
        rec.on_monitor_failure(&MonitorFailureEvent {
            at: HostTime(0),
            monitor: MonitorKind::Audio,
        });
        rec.on_frame_observed(&FrameObservedEvent {
            frame_index: 0,
            at: HostTime(33_000),
            face_count: 0,
        });
        rec.on_presence_transition(&PresenceTransitionEvent {
            at: HostTime(33_000),
            transition: PresenceTransition::FaceLost,
        });
        rec.on_audio_tick(&AudioTickEvent {
            at: HostTime(40_000),
            mean: 61.25,
            exceeded: true,
        });
        rec.on_visibility_change(&VisibilityChangeEvent {
            at: HostTime(50_000),
            state: VisibilityState::Hidden,
        });
        rec.on_session_stop(&SessionStopEvent {
            at: HostTime(60_000),
            score: 30,
            events: 2,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 6);
        assert!(matches!(
            events[0],
            RecordedEvent::MonitorFailure(MonitorFailureEvent {
                monitor: MonitorKind::Audio,
                ..
            })
        ));
        match &events[3] {
            RecordedEvent::AudioTick(e) => {
                assert_eq!(e.mean, 61.25);
                assert!(e.exceeded);
            }
            other => panic!("expected AudioTick, got {other:?}"),
        }
        assert_eq!(events[4].at(), HostTime(50_000));
        assert!(matches!(
            events[5],
            RecordedEvent::SessionStop(SessionStopEvent { score: 30, .. })
        ));
    }

    #[test]
    fn truncated_record_stops_iteration() {
        let mut rec = RecorderSink::new();
        rec.on_session_stop(&SessionStopEvent {
            at: HostTime(1),
            score: 2,
            events: 3,
        });
        rec.on_session_stop(&SessionStopEvent {
            at: HostTime(4),
            score: 5,
            events: 6,
        });
        let bytes = rec.into_bytes();
        let events: Vec<_> = decode(&bytes[..bytes.len() - 1]).collect();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        assert_eq!(decode(&[]).count(), 0);
    }
}
