// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for vigil sessions.
//!
//! This crate provides [`TraceSink`](vigil_core::trace::TraceSink)
//! implementations for development and post-session review:
//!
//! - [`pretty::PrettyPrintSink`]: one line per event.
//! - [`recorder::RecorderSink`]: compact binary recording, read back with
//!   [`recorder::decode`].
//! - [`chrome::export`]: Chrome Trace Event Format JSON from recorded bytes.

pub mod chrome;
pub mod pretty;
pub mod recorder;
