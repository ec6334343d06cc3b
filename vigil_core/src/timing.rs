// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Animation ticks delivered by backend tick sources.

use crate::time::HostTime;

/// One animation-frame opportunity delivered by the backend.
///
/// The web backend produces one per `requestAnimationFrame` callback. The
/// tick rate follows the host's paint cadence and is not capped; consumers
/// that want a lower rate apply their own cooldowns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnimationTick {
    /// Host time when the tick was generated.
    pub now: HostTime,
    /// Monotonically increasing tick counter, starting at zero.
    pub frame_index: u64,
}
