// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic host time and timebase conversion.
//!
//! [`HostTime`] is a point in time in backend-defined monotonic ticks. The web
//! backend uses microseconds derived from `performance.now()`; native tools
//! and tests usually use [`Timebase::NANOS`] or [`Timebase::MICROS`].
//!
//! [`Timebase`] is the rational factor from ticks to nanoseconds
//! (`nanos = ticks * numer / denom`). Monitors are configured in milliseconds
//! and convert once, at construction, with [`Duration::from_millis`].
//!
//! Arithmetic that can overflow goes through `u128` intermediates.

use core::fmt;
use core::ops::{Add, Sub};

/// A point in time expressed as backend-native monotonic ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Returns the raw tick value.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Returns the time elapsed since `earlier`, or zero if `earlier` is
    /// later than `self`.
    ///
    /// Host clocks are monotonic, but detector callbacks and animation ticks
    /// are stamped independently and can arrive slightly out of order.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }

    /// Converts this time to whole milliseconds using the given timebase.
    #[inline]
    #[must_use]
    pub const fn to_millis(self, timebase: Timebase) -> u64 {
        timebase.ticks_to_nanos(self.0) / 1_000_000
    }
}

impl Add<Duration> for HostTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Duration) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for HostTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Self) -> Duration {
        self.saturating_duration_since(rhs)
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({})", self.0)
    }
}

/// Rational conversion factor from ticks to nanoseconds.
///
/// `nanoseconds = ticks * numer / denom`
///
/// The instance for the browser is returned by
/// `vigil_backend_web::timebase()`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timebase {
    /// Numerator of the ticks-to-nanoseconds ratio.
    pub numer: u32,
    /// Denominator of the ticks-to-nanoseconds ratio.
    pub denom: u32,
}

impl Timebase {
    /// Ticks are nanoseconds.
    pub const NANOS: Self = Self { numer: 1, denom: 1 };

    /// Ticks are microseconds (the web backend's unit).
    pub const MICROS: Self = Self {
        numer: 1000,
        denom: 1,
    };

    /// Creates a new timebase with the given numerator and denominator.
    ///
    /// # Panics
    ///
    /// Panics if `denom` is zero.
    #[inline]
    #[must_use]
    pub const fn new(numer: u32, denom: u32) -> Self {
        assert!(denom != 0, "timebase denominator must not be zero");
        Self { numer, denom }
    }

    /// Converts a tick count to nanoseconds.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "u128 intermediate avoids overflow; truncation back to u64 is intentional"
    )]
    pub const fn ticks_to_nanos(self, ticks: u64) -> u64 {
        (ticks as u128 * self.numer as u128 / self.denom as u128) as u64
    }

    /// Converts nanoseconds to a tick count.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "u128 intermediate avoids overflow; truncation back to u64 is intentional"
    )]
    pub const fn nanos_to_ticks(self, nanos: u64) -> u64 {
        (nanos as u128 * self.denom as u128 / self.numer as u128) as u64
    }
}

impl fmt::Debug for Timebase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timebase({}/{})", self.numer, self.denom)
    }
}

/// A duration in the same tick units as [`HostTime`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// A zero-length duration.
    pub const ZERO: Self = Self(0);

    /// Returns the raw tick value.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Creates a duration of `millis` milliseconds in `timebase` ticks.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: u64, timebase: Timebase) -> Self {
        Self(timebase.nanos_to_ticks(millis.saturating_mul(1_000_000)))
    }

    /// Converts this duration to whole milliseconds.
    #[inline]
    #[must_use]
    pub const fn to_millis(self, timebase: Timebase) -> u64 {
        timebase.ticks_to_nanos(self.0) / 1_000_000
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_in_microsecond_ticks() {
        let window = Duration::from_millis(3000, Timebase::MICROS);
        assert_eq!(window.ticks(), 3_000_000, "3s is 3e6 µs ticks");
        assert_eq!(window.to_millis(Timebase::MICROS), 3000);
    }

    #[test]
    fn millis_in_nanosecond_ticks() {
        let window = Duration::from_millis(250, Timebase::NANOS);
        assert_eq!(window.ticks(), 250_000_000);
        assert_eq!(HostTime(1_500_000_000).to_millis(Timebase::NANOS), 1500);
    }

    #[test]
    fn out_of_order_stamps_saturate() {
        let later = HostTime(2_000);
        let earlier = HostTime(1_000);
        assert_eq!(later - earlier, Duration(1_000));
        assert_eq!(earlier - later, Duration::ZERO, "never underflows");
    }

    #[test]
    fn large_values_do_not_overflow() {
        let tb = Timebase::new(125, 3);
        // Would overflow u64 without the u128 intermediate.
        let _ = tb.ticks_to_nanos(u64::MAX / 2);
        assert_eq!(HostTime(u64::MAX) + Duration(10), HostTime(u64::MAX));
    }
}
