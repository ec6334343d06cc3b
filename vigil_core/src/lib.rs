// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Risk accumulation and sensor monitors for exam proctoring.
//!
//! `vigil_core` holds everything about a proctoring session that does not
//! touch a browser: the running risk score, the monitors that turn raw sensor
//! observations into risk increments, and the session that wires them
//! together. It is `no_std` compatible (with `alloc`).
//!
//! # Architecture
//!
//! Each monitor turns one kind of observation into an optional
//! [`RiskIncrement`](risk::RiskIncrement). The session is the only owner of
//! mutable score state:
//!
//! ```text
//!   FrameSource ──► PresenceMonitor ───┐
//!                                      │
//!   visibilitychange ──► VisibilityMonitor ──► Session ──► RiskAccumulator
//!                                      │                        │
//!   SpectrumSource ──► AudioMonitor ───┘                        ▼
//!                                                   RiskUpdate ──► RiskDisplay
//! ```
//!
//! **[`risk`]**: the score, its colour bands, and the newest-first event log.
//!
//! **[`presence`]**: face absence debounce and multiple-face detection.
//!
//! **[`visibility`]**: tab hidden detection.
//!
//! **[`audio`]**: mean frequency magnitude thresholding.
//!
//! **[`session`]**: owns the accumulator and monitors; entry point for
//! backends.
//!
//! **[`source`]** and **[`display`]**: the capability traits backends
//! implement (frame delivery, spectrum reads, score rendering).
//!
//! **[`config`]**: thresholds, increments, and presets.
//!
//! **[`time`]**: monotonic host time and timebase conversion.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types, with a
//! zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod audio;
pub mod config;
pub mod display;
pub mod presence;
pub mod risk;
pub mod session;
pub mod source;
pub mod time;
pub mod timing;
pub mod trace;
pub mod visibility;
