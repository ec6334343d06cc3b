// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for vigil.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`RafLoop`]: `requestAnimationFrame` tick source
//! - [`DomRiskDisplay`]: score readout, band colour, and event log in the DOM
//! - [`VisibilityListener`]: `visibilitychange` subscription
//! - [`MediaCapture`]: `getUserMedia` streams with an explicit stop
//! - [`AnalyserSpectrum`]: Web Audio analyser as a
//!   [`SpectrumSource`](vigil_core::source::SpectrumSource)
//! - [`FaceMeshTracker`]: `MediaPipe` `FaceMesh` + `Camera`, queued as a
//!   [`FrameSource`](vigil_core::source::FrameSource)

#![no_std]

extern crate alloc;

mod audio;
mod display;
mod face_mesh;
mod media;
mod raf;
mod visibility;

pub use audio::{AnalyserSpectrum, open_microphone};
pub use display::DomRiskDisplay;
pub use face_mesh::{FaceMeshFrames, FaceMeshTracker};
pub use media::MediaCapture;
pub use raf::RafLoop;
pub use visibility::VisibilityListener;
pub use vigil_core::display::RiskDisplay;

use vigil_core::time::{HostTime, Timebase};

/// Returns the current host time from `performance.now()`.
///
/// The returned [`HostTime`] is in microsecond ticks. Use [`timebase`] to
/// convert to nanoseconds.
#[must_use]
pub fn now() -> HostTime {
    ms_to_host_time(raf::performance_now())
}

/// Returns the web [`Timebase`]: 1 tick = 1 µs = 1000 ns.
#[must_use]
pub fn timebase() -> Timebase {
    Timebase::MICROS
}

/// Converts a `DOMHighResTimeStamp` (ms) to microsecond ticks.
#[expect(
    clippy::cast_possible_truncation,
    reason = "high-res timestamps are small positive f64; µs fits in u64"
)]
pub(crate) fn ms_to_host_time(ms: f64) -> HostTime {
    HostTime((ms.max(0.0) * 1000.0) as u64)
}
