// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Each monitor gets its own track (`tid`). Risk increases additionally feed
//! a `"C"` counter so the score shows up as a graph over the session.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use vigil_core::time::{HostTime, Timebase};
use vigil_core::trace::MonitorKind;

use crate::recorder::{RecordedEvent, decode};

const TID_SESSION: u32 = 0;
const TID_CAMERA: u32 = 1;
const TID_AUDIO: u32 = 2;
const TID_VISIBILITY: u32 = 3;

fn monitor_tid(monitor: MonitorKind) -> u32 {
    match monitor {
        MonitorKind::Camera => TID_CAMERA,
        MonitorKind::Audio => TID_AUDIO,
        MonitorKind::Visibility => TID_VISIBILITY,
    }
}

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Timestamps are converted to microseconds using the provided [`Timebase`].
pub fn export(bytes: &[u8], timebase: Timebase, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        let ts = to_us(recorded.at(), timebase);
        match recorded {
            RecordedEvent::FrameObserved(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Frame",
                    "cat": "Camera",
                    "ts": ts,
                    "pid": 0,
                    "tid": TID_CAMERA,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "faces": e.face_count,
                    }
                }));
            }
            RecordedEvent::PresenceTransition(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.transition),
                    "cat": "Camera",
                    "ts": ts,
                    "pid": 0,
                    "tid": TID_CAMERA,
                    "s": "t",
                }));
            }
            RecordedEvent::AudioTick(e) => {
                events.push(json!({
                    "ph": "C",
                    "name": "AudioMean",
                    "cat": "Audio",
                    "ts": ts,
                    "pid": 0,
                    "tid": TID_AUDIO,
                    "args": { "mean": e.mean }
                }));
            }
            RecordedEvent::VisibilityChange(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.state),
                    "cat": "Visibility",
                    "ts": ts,
                    "pid": 0,
                    "tid": TID_VISIBILITY,
                    "s": "t",
                }));
            }
            RecordedEvent::RiskIncrease { entry, band } => {
                events.push(json!({
                    "ph": "i",
                    "name": entry.reason.as_str(),
                    "cat": "Risk",
                    "ts": ts,
                    "pid": 0,
                    "tid": TID_SESSION,
                    "s": "p",
                    "args": {
                        "sequence": entry.sequence,
                        "amount": entry.amount,
                        "total": entry.total,
                        "band": band.as_str(),
                    }
                }));
                events.push(json!({
                    "ph": "C",
                    "name": "Score",
                    "cat": "Risk",
                    "ts": ts,
                    "pid": 0,
                    "tid": TID_SESSION,
                    "args": { "score": entry.total }
                }));
            }
            RecordedEvent::MonitorFailure(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "MonitorUnavailable",
                    "cat": "Session",
                    "ts": ts,
                    "pid": 0,
                    "tid": monitor_tid(e.monitor),
                    "s": "g",
                    "args": { "monitor": format!("{:?}", e.monitor) }
                }));
            }
            RecordedEvent::SessionStop(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "SessionStop",
                    "cat": "Session",
                    "ts": ts,
                    "pid": 0,
                    "tid": TID_SESSION,
                    "s": "g",
                    "args": {
                        "score": e.score,
                        "events": e.events,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn to_us(t: HostTime, timebase: Timebase) -> f64 {
    timebase.ticks_to_nanos(t.ticks()) as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use vigil_core::risk::{EventLogEntry, RiskBand, RiskReason};
    use vigil_core::trace::{MonitorFailureEvent, RiskIncreaseEvent, TraceSink};

    #[test]
    fn risk_increase_emits_instant_and_counter() {
        let mut rec = RecorderSink::new();
        rec.on_monitor_failure(&MonitorFailureEvent {
            at: HostTime(0),
            monitor: MonitorKind::Audio,
        });
        let entry = EventLogEntry {
            sequence: 0,
            at: HostTime(2_000),
            amount: 20,
            total: 20,
            reason: RiskReason::TabHidden,
        };
        rec.on_risk_increase(&RiskIncreaseEvent {
            entry: &entry,
            band: RiskBand::Low,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), Timebase::MICROS, &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.len(), 3);

        assert_eq!(parsed[0]["name"], "MonitorUnavailable");
        assert_eq!(parsed[0]["tid"], TID_AUDIO);

        assert_eq!(parsed[1]["ph"], "i");
        assert_eq!(parsed[1]["name"], "Tab switched or window minimized");
        assert_eq!(parsed[1]["ts"], 2000.0);
        assert_eq!(parsed[1]["args"]["band"], "low");

        assert_eq!(parsed[2]["ph"], "C");
        assert_eq!(parsed[2]["args"]["score"], 20);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], Timebase::NANOS, &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert!(parsed.is_empty());
    }
}
