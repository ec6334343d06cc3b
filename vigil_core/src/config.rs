// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thresholds, increments, and presets for a proctoring session.
//!
//! Every monitor takes its own config struct; [`ProctorConfig`] bundles them.
//! Times are in milliseconds and converted to host ticks when the monitors
//! are built, so the same config works for every backend timebase.
//!
//! Two presets are provided:
//!
//! - [`ProctorConfig::exam`]: the classic behaviour. Unbounded event log,
//!   multiple-face and audio alerts fire on every qualifying frame.
//! - [`ProctorConfig::bounded`]: same thresholds, but with a capped log and
//!   cooldowns on the per-frame alerts.

/// Score breakpoints for the three display bands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RiskBands {
    /// Scores at or above this value are [`Medium`](crate::risk::RiskBand::Medium).
    pub medium_at: u64,
    /// Scores at or above this value are [`High`](crate::risk::RiskBand::High).
    pub high_at: u64,
}

impl RiskBands {
    /// Green below 30, orange below 60, red from 60.
    pub const STANDARD: Self = Self {
        medium_at: 30,
        high_at: 60,
    };
}

impl Default for RiskBands {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Configuration for the [`PresenceMonitor`](crate::presence::PresenceMonitor).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PresenceConfig {
    /// Continuous absence required before an alert, in milliseconds. The
    /// elapsed time must strictly exceed this.
    pub absence_window_ms: u64,
    /// Risk added per absence alert.
    pub absence_increment: u32,
    /// Risk added per multiple-face alert.
    pub multiple_faces_increment: u32,
    /// Minimum spacing between multiple-face alerts. `None` alerts on every
    /// frame that shows more than one face.
    pub multiple_faces_cooldown_ms: Option<u64>,
}

/// Configuration for the [`AudioMonitor`](crate::audio::AudioMonitor).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AudioConfig {
    /// Analyser transform size. The analyser exposes `fft_size / 2` bins.
    pub fft_size: u32,
    /// Mean byte magnitude (0–255) that must be strictly exceeded.
    pub threshold: f64,
    /// Risk added per audio alert.
    pub increment: u32,
    /// Minimum spacing between audio alerts. `None` alerts on every tick.
    pub cooldown_ms: Option<u64>,
}

impl AudioConfig {
    /// Number of frequency bins the analyser reports.
    #[must_use]
    pub const fn frequency_bin_count(&self) -> usize {
        (self.fft_size / 2) as usize
    }
}

/// Configuration for the [`VisibilityMonitor`](crate::visibility::VisibilityMonitor).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisibilityConfig {
    /// Risk added each time the page becomes hidden.
    pub hidden_increment: u32,
}

/// Options handed to the external face-landmark detector.
///
/// Core does not run the detector; backends forward these values verbatim.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectorConfig {
    /// Maximum number of faces the detector reports per frame.
    pub max_num_faces: u32,
    /// Whether to request refined (iris/lip) landmarks.
    pub refine_landmarks: bool,
    /// Minimum confidence for a new detection.
    pub min_detection_confidence: f64,
    /// Minimum confidence to keep tracking an existing face.
    pub min_tracking_confidence: f64,
}

/// Camera capture size requested from the frame-delivery helper.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Capture width in pixels.
    pub width: u32,
    /// Capture height in pixels.
    pub height: u32,
}

/// Complete configuration for a [`Session`](crate::session::Session).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProctorConfig {
    /// Band breakpoints.
    pub bands: RiskBands,
    /// Maximum retained log entries. `None` keeps every entry.
    pub log_capacity: Option<usize>,
    /// Presence monitor settings.
    pub presence: PresenceConfig,
    /// Audio monitor settings.
    pub audio: AudioConfig,
    /// Visibility monitor settings.
    pub visibility: VisibilityConfig,
    /// Face detector options.
    pub detector: DetectorConfig,
    /// Camera capture size.
    pub capture: CaptureConfig,
}

impl ProctorConfig {
    /// The classic exam configuration.
    #[must_use]
    pub const fn exam() -> Self {
        Self {
            bands: RiskBands::STANDARD,
            log_capacity: None,
            presence: PresenceConfig {
                absence_window_ms: 3000,
                absence_increment: 15,
                multiple_faces_increment: 25,
                multiple_faces_cooldown_ms: None,
            },
            audio: AudioConfig {
                fft_size: 512,
                threshold: 60.0,
                increment: 10,
                cooldown_ms: None,
            },
            visibility: VisibilityConfig {
                hidden_increment: 20,
            },
            detector: DetectorConfig {
                max_num_faces: 2,
                refine_landmarks: true,
                min_detection_confidence: 0.5,
                min_tracking_confidence: 0.5,
            },
            capture: CaptureConfig {
                width: 640,
                height: 480,
            },
        }
    }

    /// [`exam`](Self::exam) with a 500-entry log and alert cooldowns, for
    /// long sessions.
    #[must_use]
    pub const fn bounded() -> Self {
        let mut cfg = Self::exam();
        cfg.log_capacity = Some(500);
        cfg.presence.multiple_faces_cooldown_ms = Some(300);
        cfg.audio.cooldown_ms = Some(250);
        cfg
    }
}

impl Default for ProctorConfig {
    fn default() -> Self {
        Self::exam()
    }
}
