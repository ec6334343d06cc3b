// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The running risk score, its display bands, and the event log.
//!
//! [`RiskAccumulator`] is the only writer of the score. Monitors produce
//! [`RiskIncrement`]s; the [`Session`](crate::session::Session) feeds them to
//! [`RiskAccumulator::increase`], which returns a [`RiskUpdate`] describing
//! everything a display needs to redraw.

use alloc::borrow::Cow;
use alloc::collections::VecDeque;
use alloc::string::String;
use core::fmt;

use crate::config::RiskBands;
use crate::time::HostTime;

/// Why risk was added.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RiskReason {
    /// No face was visible for longer than the absence window.
    FaceNotDetected,
    /// More than one face was visible in a frame.
    MultipleFaces,
    /// The page was hidden (tab switch or minimized window).
    TabHidden,
    /// Microphone energy exceeded the audio threshold.
    SuspiciousAudio,
    /// A caller-supplied reason.
    Other(Cow<'static, str>),
}

impl RiskReason {
    /// Returns the log text for this reason.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::FaceNotDetected => "Face not detected",
            Self::MultipleFaces => "Multiple faces detected",
            Self::TabHidden => "Tab switched or window minimized",
            Self::SuspiciousAudio => "Suspicious audio detected",
            Self::Other(text) => text,
        }
    }
}

impl fmt::Display for RiskReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&'static str> for RiskReason {
    fn from(text: &'static str) -> Self {
        Self::Other(Cow::Borrowed(text))
    }
}

impl From<String> for RiskReason {
    fn from(text: String) -> Self {
        Self::Other(Cow::Owned(text))
    }
}

/// A request to add risk, produced by a monitor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RiskIncrement {
    /// Amount to add.
    pub amount: u32,
    /// Why.
    pub reason: RiskReason,
}

impl RiskIncrement {
    /// Creates an increment.
    #[must_use]
    pub const fn new(amount: u32, reason: RiskReason) -> Self {
        Self { amount, reason }
    }
}

/// Display band for a score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RiskBand {
    /// Below the medium breakpoint.
    Low,
    /// From the medium breakpoint up to (not including) the high one.
    Medium,
    /// At or above the high breakpoint.
    High,
}

impl RiskBand {
    /// Classifies `score` against `bands`.
    #[must_use]
    pub const fn for_score(score: u64, bands: RiskBands) -> Self {
        if score < bands.medium_at {
            Self::Low
        } else if score < bands.high_at {
            Self::Medium
        } else {
            Self::High
        }
    }

    /// CSS colour for the indicator background.
    #[must_use]
    pub const fn css_color(self) -> &'static str {
        match self {
            Self::Low => "green",
            Self::Medium => "orange",
            Self::High => "red",
        }
    }

    /// Short label for text output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// One entry in the event log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventLogEntry {
    /// Position in the session's increment sequence, starting at zero.
    pub sequence: u64,
    /// Host time of the increment.
    pub at: HostTime,
    /// Amount that was added.
    pub amount: u32,
    /// Score after the increment.
    pub total: u64,
    /// Why.
    pub reason: RiskReason,
}

/// Newest-first event log with an optional capacity.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    entries: VecDeque<EventLogEntry>,
    capacity: Option<usize>,
}

impl EventLog {
    /// Creates an empty log. `None` never evicts.
    #[must_use]
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Inserts `entry` at the head. Returns the evicted oldest entry when the
    /// log was full.
    pub fn push_front(&mut self, entry: EventLogEntry) -> Option<EventLogEntry> {
        self.entries.push_front(entry);
        match self.capacity {
            Some(cap) if self.entries.len() > cap => self.entries.pop_back(),
            _ => None,
        }
    }

    /// Iterates newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &EventLogEntry> {
        self.entries.iter()
    }

    /// Returns the newest entry.
    #[must_use]
    pub fn latest(&self) -> Option<&EventLogEntry> {
        self.entries.front()
    }

    /// Number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been logged (or everything evicted).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of one [`RiskAccumulator::increase`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RiskUpdate {
    /// Score after the increment.
    pub score: u64,
    /// Band for the new score.
    pub band: RiskBand,
    /// The new log entry (now at the head of the log).
    pub entry: EventLogEntry,
    /// The oldest entry, if it was evicted to make room.
    pub evicted: Option<EventLogEntry>,
}

/// Owns the risk score and the event log.
#[derive(Clone, Debug)]
pub struct RiskAccumulator {
    score: u64,
    bands: RiskBands,
    log: EventLog,
    next_sequence: u64,
}

impl RiskAccumulator {
    /// Creates an accumulator at score zero.
    #[must_use]
    pub fn new(bands: RiskBands, log_capacity: Option<usize>) -> Self {
        Self {
            score: 0,
            bands,
            log: EventLog::new(log_capacity),
            next_sequence: 0,
        }
    }

    /// Adds `amount` to the score and logs `reason`.
    ///
    /// Never fails. Amounts are not validated; the score saturates at
    /// `u64::MAX` rather than wrapping.
    pub fn increase(&mut self, amount: u32, reason: RiskReason, at: HostTime) -> RiskUpdate {
        self.score = self.score.saturating_add(u64::from(amount));
        let band = self.band();

        let entry = EventLogEntry {
            sequence: self.next_sequence,
            at,
            amount,
            total: self.score,
            reason,
        };
        self.next_sequence += 1;
        let evicted = self.log.push_front(entry.clone());

        RiskUpdate {
            score: self.score,
            band,
            entry,
            evicted,
        }
    }

    /// Applies a monitor's increment.
    pub fn apply(&mut self, increment: RiskIncrement, at: HostTime) -> RiskUpdate {
        self.increase(increment.amount, increment.reason, at)
    }

    /// Current score.
    #[must_use]
    pub const fn score(&self) -> u64 {
        self.score
    }

    /// Band for the current score.
    #[must_use]
    pub const fn band(&self) -> RiskBand {
        RiskBand::for_score(self.score, self.bands)
    }

    /// The event log, newest first.
    #[must_use]
    pub const fn log(&self) -> &EventLog {
        &self.log
    }

    /// Total increments applied, including evicted ones.
    #[must_use]
    pub const fn increments(&self) -> u64 {
        self.next_sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn acc() -> RiskAccumulator {
        RiskAccumulator::new(RiskBands::STANDARD, None)
    }

    #[test]
    fn score_is_running_sum() {
        let mut a = acc();
        let amounts = [15_u32, 25, 20, 10, 10, 1];
        let mut expected = 0_u64;
        for (i, amount) in amounts.into_iter().enumerate() {
            expected += u64::from(amount);
            let update = a.increase(amount, RiskReason::TabHidden, HostTime(i as u64));
            assert_eq!(update.score, expected);
            assert_eq!(update.entry.total, expected);
        }
        assert_eq!(a.score(), 81);
        assert_eq!(a.increments(), 6);
    }

    #[test]
    fn band_breakpoints() {
        let bands = RiskBands::STANDARD;
        assert_eq!(RiskBand::for_score(0, bands), RiskBand::Low);
        assert_eq!(RiskBand::for_score(29, bands), RiskBand::Low);
        assert_eq!(RiskBand::for_score(30, bands), RiskBand::Medium);
        assert_eq!(RiskBand::for_score(59, bands), RiskBand::Medium);
        assert_eq!(RiskBand::for_score(60, bands), RiskBand::High);
        assert_eq!(RiskBand::for_score(u64::MAX, bands), RiskBand::High);
    }

    #[test]
    fn band_follows_each_increment() {
        let mut a = acc();
        assert_eq!(a.increase(25, RiskReason::MultipleFaces, HostTime(0)).band, RiskBand::Low);
        assert_eq!(a.increase(15, RiskReason::FaceNotDetected, HostTime(1)).band, RiskBand::Medium);
        let high = a.increase(20, RiskReason::TabHidden, HostTime(2));
        assert_eq!(high.score, 60);
        assert_eq!(high.band, RiskBand::High);
        assert_eq!(high.band.css_color(), "red");
    }

    #[test]
    fn log_is_newest_first() {
        let mut a = acc();
        a.increase(10, RiskReason::SuspiciousAudio, HostTime(100));
        a.increase(20, RiskReason::TabHidden, HostTime(200));
        a.increase(5, "Manual flag".into(), HostTime(300));

        let reasons: Vec<_> = a.log().iter().map(|e| e.reason.as_str()).collect();
        assert_eq!(
            reasons,
            ["Manual flag", "Tab switched or window minimized", "Suspicious audio detected"]
        );
        assert_eq!(a.log().latest().map(|e| e.sequence), Some(2));
    }

    #[test]
    fn capped_log_evicts_oldest() {
        let mut a = RiskAccumulator::new(RiskBands::STANDARD, Some(2));
        assert!(a.increase(1, RiskReason::TabHidden, HostTime(0)).evicted.is_none());
        assert!(a.increase(1, RiskReason::TabHidden, HostTime(1)).evicted.is_none());
        let third = a.increase(1, RiskReason::TabHidden, HostTime(2));
        assert_eq!(third.evicted.map(|e| e.sequence), Some(0));
        assert_eq!(a.log().len(), 2);
        assert_eq!(a.score(), 3, "eviction never lowers the score");
    }

    #[test]
    fn score_saturates() {
        let mut a = acc();
        for i in 0..3 {
            a.increase(u32::MAX, RiskReason::TabHidden, HostTime(i));
        }
        a.score = u64::MAX - 1;
        assert_eq!(a.increase(10, RiskReason::TabHidden, HostTime(9)).score, u64::MAX);
    }

    #[test]
    fn reason_text() {
        assert_eq!(RiskReason::FaceNotDetected.as_str(), "Face not detected");
        assert_eq!(RiskReason::MultipleFaces.as_str(), "Multiple faces detected");
        assert_eq!(RiskReason::from(String::from("x")).as_str(), "x");
    }
}
