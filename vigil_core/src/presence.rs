// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Face presence monitoring.
//!
//! [`PresenceMonitor`] consumes one [`FaceResults`] per camera frame and
//! tracks two states:
//!
//! ```text
//!            0 faces                      ≥1 face
//!   Present ─────────► Absent { since } ─────────► Present
//!                        │      ▲
//!                        └──────┘  0 faces and now - since > window:
//!                                  alert, since = now
//! ```
//!
//! The absence alert re-arms instead of latching: while the face stays away,
//! it fires once per window. Frames with more than one face alert
//! immediately, on every such frame unless a cooldown is configured.

use crate::config::PresenceConfig;
use crate::risk::{RiskIncrement, RiskReason};
use crate::source::FaceResults;
use crate::time::{Duration, HostTime, Timebase};

/// A change in face presence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PresenceTransition {
    /// The first frame without a face after one or more frames with a face
    /// (or at session start).
    FaceLost,
    /// The first frame with a face after an absence.
    FaceRegained,
}

/// Everything one frame produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PresenceObservation {
    /// Number of faces in the frame.
    pub face_count: usize,
    /// State change caused by this frame, if any.
    pub transition: Option<PresenceTransition>,
    /// Risk to add, if any.
    pub increment: Option<RiskIncrement>,
}

/// Debounced face-absence and multiple-face detector.
#[derive(Clone, Debug)]
pub struct PresenceMonitor {
    config: PresenceConfig,
    absence_window: Duration,
    multiple_faces_cooldown: Option<Duration>,
    absent_since: Option<HostTime>,
    last_multiple_faces_alert: Option<HostTime>,
}

impl PresenceMonitor {
    /// Creates a monitor whose windows are measured in `timebase` ticks.
    #[must_use]
    pub fn new(config: PresenceConfig, timebase: Timebase) -> Self {
        Self {
            absence_window: Duration::from_millis(config.absence_window_ms, timebase),
            multiple_faces_cooldown: config
                .multiple_faces_cooldown_ms
                .map(|ms| Duration::from_millis(ms, timebase)),
            config,
            absent_since: None,
            last_multiple_faces_alert: None,
        }
    }

    /// Processes one frame's detector output.
    pub fn observe(&mut self, results: &FaceResults, at: HostTime) -> PresenceObservation {
        let face_count = results.face_count();
        if face_count == 0 {
            return self.observe_absent(at);
        }

        let transition = self
            .absent_since
            .take()
            .map(|_| PresenceTransition::FaceRegained);

        let increment = if face_count > 1 && self.multiple_faces_ready(at) {
            self.last_multiple_faces_alert = Some(at);
            Some(RiskIncrement::new(
                self.config.multiple_faces_increment,
                RiskReason::MultipleFaces,
            ))
        } else {
            None
        };

        PresenceObservation {
            face_count,
            transition,
            increment,
        }
    }

    fn observe_absent(&mut self, at: HostTime) -> PresenceObservation {
        let Some(since) = self.absent_since else {
            self.absent_since = Some(at);
            return PresenceObservation {
                face_count: 0,
                transition: Some(PresenceTransition::FaceLost),
                increment: None,
            };
        };

        let increment = if at.saturating_duration_since(since) > self.absence_window {
            self.absent_since = Some(at);
            Some(RiskIncrement::new(
                self.config.absence_increment,
                RiskReason::FaceNotDetected,
            ))
        } else {
            None
        };

        PresenceObservation {
            face_count: 0,
            transition: None,
            increment,
        }
    }

    fn multiple_faces_ready(&self, at: HostTime) -> bool {
        match (self.multiple_faces_cooldown, self.last_multiple_faces_alert) {
            (Some(cooldown), Some(last)) => at.saturating_duration_since(last) >= cooldown,
            _ => true,
        }
    }

    /// Returns `true` while no face has been seen since the last absence
    /// began.
    #[must_use]
    pub const fn is_face_absent(&self) -> bool {
        self.absent_since.is_some()
    }

    /// Start of the current absence window, if a face is absent.
    #[must_use]
    pub const fn absent_since(&self) -> Option<HostTime> {
        self.absent_since
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProctorConfig;
    use alloc::vec::Vec;

    const MS: u64 = 1000; // µs ticks per millisecond

    fn monitor() -> PresenceMonitor {
        PresenceMonitor::new(ProctorConfig::exam().presence, Timebase::MICROS)
    }

    fn at_ms(ms: u64) -> HostTime {
        HostTime(ms * MS)
    }

    /// Feeds zero-face frames every `step_ms` from 0 to `end_ms` inclusive
    /// and returns the times (ms) of the absence alerts.
    fn absent_alerts(m: &mut PresenceMonitor, step_ms: u64, end_ms: u64) -> Vec<u64> {
        (0..=end_ms / step_ms)
            .map(|i| i * step_ms)
            .filter(|&t| m.observe(&FaceResults::missing(), at_ms(t)).increment.is_some())
            .collect()
    }

    #[test]
    fn absence_alerts_rearm_every_window() {
        let mut m = monitor();
        let alerts = absent_alerts(&mut m, 100, 9000);
        assert!(alerts.iter().all(|&t| t > 3000), "nothing before 3s: {alerts:?}");
        let in_window = |lo: u64, hi: u64| alerts.iter().filter(|&&t| t > lo && t <= hi).count();
        assert_eq!(in_window(3000, 6000), 1, "alerts: {alerts:?}");
        assert_eq!(in_window(6000, 9000), 1, "alerts: {alerts:?}");
    }

    #[test]
    fn exactly_window_does_not_alert() {
        let mut m = monitor();
        assert!(m.observe(&FaceResults::missing(), at_ms(0)).increment.is_none());
        assert!(
            m.observe(&FaceResults::missing(), at_ms(3000)).increment.is_none(),
            "elapsed must strictly exceed the window"
        );
        let alert = m.observe(&FaceResults::missing(), at_ms(3001)).increment.unwrap();
        assert_eq!(alert.amount, 15);
        assert_eq!(alert.reason, RiskReason::FaceNotDetected);
        assert_eq!(m.absent_since(), Some(at_ms(3001)), "window re-armed");
    }

    #[test]
    fn face_reappearing_resets_window() {
        let mut m = monitor();
        let first = m.observe(&FaceResults::with_faces(Vec::new()), at_ms(0));
        assert_eq!(first.transition, Some(PresenceTransition::FaceLost));
        m.observe(&FaceResults::missing(), at_ms(2900));

        let back = m.observe(&FaceResults::with_face_count(1), at_ms(2950));
        assert_eq!(back.transition, Some(PresenceTransition::FaceRegained));
        assert!(!m.is_face_absent());

        m.observe(&FaceResults::missing(), at_ms(3000));
        assert!(
            m.observe(&FaceResults::missing(), at_ms(5900)).increment.is_none(),
            "absence restarted at 3000ms"
        );
        assert!(m.observe(&FaceResults::missing(), at_ms(6001)).increment.is_some());
    }

    #[test]
    fn multiple_faces_alert_every_frame() {
        let mut m = monitor();
        let n = 7;
        let alerts = (0..n)
            .filter_map(|i| {
                m.observe(&FaceResults::with_face_count(2), at_ms(i * 33))
                    .increment
            })
            .collect::<Vec<_>>();
        assert_eq!(alerts.len() as u64, n);
        assert!(alerts.iter().all(|a| a.amount == 25 && a.reason == RiskReason::MultipleFaces));
    }

    #[test]
    fn single_face_never_alerts() {
        let mut m = monitor();
        for i in 0..100 {
            let obs = m.observe(&FaceResults::with_face_count(1), at_ms(i * 100));
            assert_eq!(obs.increment, None);
            assert_eq!(obs.transition, None);
        }
    }

    #[test]
    fn multiple_faces_cooldown() {
        let mut cfg = ProctorConfig::exam().presence;
        cfg.multiple_faces_cooldown_ms = Some(300);
        let mut m = PresenceMonitor::new(cfg, Timebase::MICROS);

        let fired: Vec<u64> = (0..20)
            .map(|i| i * 50)
            .filter(|&t| {
                m.observe(&FaceResults::with_face_count(3), at_ms(t))
                    .increment
                    .is_some()
            })
            .collect();
        assert_eq!(fired, [0, 300, 600, 900]);
    }
}
