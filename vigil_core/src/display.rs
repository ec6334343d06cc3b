// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display contract for backends.
//!
//! A backend provides the following pieces:
//!
//! - **Tick source**: produces [`AnimationTick`]s (e.g. from
//!   `requestAnimationFrame`). Not abstracted by a trait; setup and lifecycle
//!   are platform-specific.
//!
//! - **Time**: `now() -> HostTime` and `timebase() -> Timebase` free
//!   functions.
//!
//! - **Sources**: implementations of [`FrameSource`] and [`SpectrumSource`].
//!
//! - **Display**: an implementation of [`RiskDisplay`] that renders the
//!   score, band colour, and event log.
//!
//! # Crate boundaries
//!
//! `vigil_core` owns the data model, the monitors, and this contract.
//! Backend crates depend on `vigil_core` and provide platform glue.
//! Application code depends on both and wires them together in a tick
//! handler.
//!
//! [`AnimationTick`]: crate::timing::AnimationTick
//! [`FrameSource`]: crate::source::FrameSource
//! [`SpectrumSource`]: crate::source::SpectrumSource

use crate::risk::{RiskBand, RiskUpdate};

/// Score and band at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RiskSnapshot {
    /// Current score.
    pub score: u64,
    /// Current band.
    pub band: RiskBand,
    /// Increments applied so far.
    pub events: u64,
}

/// Renders risk state.
///
/// DOM-based and text-based displays implement this trait, which also makes
/// recording test doubles trivial.
///
/// # Tick handler pseudocode
///
/// ```rust,ignore
/// fn on_tick(tick: AnimationTick) {
///     // Detection results queued since the last tick.
///     session.pump_frames(&mut frames);
///     // One analyser snapshot per tick.
///     session.sample_audio(&mut spectrum, tick.now);
///     // Every increment calls `display.show(&update)` inside the session.
/// }
/// ```
pub trait RiskDisplay {
    /// Paints the full state, replacing whatever is shown. Called once when a
    /// session starts.
    fn reset(&mut self, snapshot: &RiskSnapshot);

    /// Applies one increment: new score, new band, a new log entry at the
    /// head, and possibly an evicted entry at the tail.
    fn show(&mut self, update: &RiskUpdate);
}

impl<D: RiskDisplay + ?Sized> RiskDisplay for &mut D {
    fn reset(&mut self, snapshot: &RiskSnapshot) {
        (**self).reset(snapshot);
    }

    fn show(&mut self, update: &RiskUpdate) {
        (**self).show(update);
    }
}

/// A display that draws nothing. Useful for headless sessions.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullDisplay;

impl RiskDisplay for NullDisplay {
    fn reset(&mut self, snapshot: &RiskSnapshot) {
        _ = snapshot;
    }

    fn show(&mut self, update: &RiskUpdate) {
        _ = update;
    }
}
