// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Microphone energy monitoring.
//!
//! Every animation tick the backend reads the analyser's byte frequency
//! snapshot and hands it to [`AudioMonitor::observe`]. The monitor reduces
//! the snapshot to its arithmetic mean and alerts when the mean strictly
//! exceeds the configured threshold.

use crate::config::AudioConfig;
use crate::risk::{RiskIncrement, RiskReason};
use crate::time::{Duration, HostTime, Timebase};

/// Arithmetic mean of a magnitude snapshot; `0.0` for an empty one.
#[must_use]
pub fn mean_magnitude(bins: &[u8]) -> f64 {
    if bins.is_empty() {
        return 0.0;
    }
    let sum: u64 = bins.iter().map(|&b| u64::from(b)).sum();
    sum as f64 / bins.len() as f64
}

/// Result of one audio tick.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioObservation {
    /// Mean magnitude of the snapshot.
    pub mean: f64,
    /// Whether the mean exceeded the threshold (regardless of cooldown).
    pub exceeded: bool,
    /// Risk to add, if any.
    pub increment: Option<RiskIncrement>,
}

/// Threshold detector over frequency snapshots.
#[derive(Clone, Debug)]
pub struct AudioMonitor {
    config: AudioConfig,
    cooldown: Option<Duration>,
    last_alert: Option<HostTime>,
}

impl AudioMonitor {
    /// Creates a monitor whose cooldown is measured in `timebase` ticks.
    #[must_use]
    pub fn new(config: AudioConfig, timebase: Timebase) -> Self {
        Self {
            cooldown: config
                .cooldown_ms
                .map(|ms| Duration::from_millis(ms, timebase)),
            config,
            last_alert: None,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &AudioConfig {
        &self.config
    }

    /// Processes one snapshot.
    pub fn observe(&mut self, bins: &[u8], at: HostTime) -> AudioObservation {
        let mean = mean_magnitude(bins);
        let exceeded = mean > self.config.threshold;
        let ready = match (self.cooldown, self.last_alert) {
            (Some(cooldown), Some(last)) => at.saturating_duration_since(last) >= cooldown,
            _ => true,
        };

        let increment = if exceeded && ready {
            self.last_alert = Some(at);
            Some(RiskIncrement::new(
                self.config.increment,
                RiskReason::SuspiciousAudio,
            ))
        } else {
            None
        };

        AudioObservation {
            mean,
            exceeded,
            increment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProctorConfig;
    use alloc::vec;

    fn monitor() -> AudioMonitor {
        AudioMonitor::new(ProctorConfig::exam().audio, Timebase::MICROS)
    }

    #[test]
    fn mean_of_snapshot() {
        assert_eq!(mean_magnitude(&[]), 0.0);
        assert_eq!(mean_magnitude(&[0, 255]), 127.5);
        assert_eq!(mean_magnitude(&[60; 256]), 60.0);
    }

    #[test]
    fn threshold_is_strict() {
        let mut m = monitor();
        let at_60 = m.observe(&[60; 256], HostTime(0));
        assert!(!at_60.exceeded);
        assert_eq!(at_60.increment, None, "mean 60 must not alert");

        let at_61 = m.observe(&[61; 256], HostTime(16_000));
        let inc = at_61.increment.unwrap();
        assert_eq!(inc.amount, 10);
        assert_eq!(inc.reason, RiskReason::SuspiciousAudio);
    }

    #[test]
    fn uneven_spectrum_uses_mean() {
        let mut m = monitor();
        // Half the bins at 122, half at 0: mean 61.
        let mut bins = vec![0_u8; 256];
        bins[..128].fill(122);
        assert!(m.observe(&bins, HostTime(0)).increment.is_some());
    }

    #[test]
    fn alerts_every_loud_tick_without_cooldown() {
        let mut m = monitor();
        let fired = (0..30_u64)
            .filter(|i| m.observe(&[200; 256], HostTime(i * 16_667)).increment.is_some())
            .count();
        assert_eq!(fired, 30);
    }

    #[test]
    fn cooldown_spaces_alerts() {
        let mut cfg = ProctorConfig::exam().audio;
        cfg.cooldown_ms = Some(100);
        let mut m = AudioMonitor::new(cfg, Timebase::MICROS);
        // 60 ticks at 20ms: alerts at 0, 100, ..., 1100.
        let fired = (0..60_u64)
            .filter(|i| m.observe(&[90; 8], HostTime(i * 20_000)).increment.is_some())
            .count();
        assert_eq!(fired, 12);
    }
}
