// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Page visibility monitoring.

use crate::config::VisibilityConfig;
use crate::risk::{RiskIncrement, RiskReason};

/// Visibility of the page as reported by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VisibilityState {
    /// The page is on screen.
    Visible,
    /// The tab is in the background or the window is minimized.
    Hidden,
}

impl VisibilityState {
    /// Maps the DOM `document.hidden` flag.
    #[must_use]
    pub const fn from_hidden(hidden: bool) -> Self {
        if hidden { Self::Hidden } else { Self::Visible }
    }
}

/// Reports every transition to [`VisibilityState::Hidden`].
///
/// Stateless: each hidden notification counts, however quickly they follow
/// one another. Becoming visible again is not an event.
#[derive(Clone, Copy, Debug)]
pub struct VisibilityMonitor {
    config: VisibilityConfig,
}

impl VisibilityMonitor {
    /// Creates a monitor.
    #[must_use]
    pub const fn new(config: VisibilityConfig) -> Self {
        Self { config }
    }

    /// Processes one visibility-change notification.
    #[must_use]
    pub fn observe(&self, state: VisibilityState) -> Option<RiskIncrement> {
        match state {
            VisibilityState::Hidden => Some(RiskIncrement::new(
                self.config.hidden_increment,
                RiskReason::TabHidden,
            )),
            VisibilityState::Visible => None,
        }
    }
}
