// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted proctoring session that exercises the tracing and diagnostics
//! pipeline.
//!
//! Plays a 12 second timeline (an absence, a second face, a tab switch, a
//! burst of noise) into a session traced by both a
//! [`PrettyPrintSink`](vigil_debug::pretty::PrettyPrintSink) and a
//! [`RecorderSink`](vigil_debug::recorder::RecorderSink), then exports a
//! Chrome trace JSON file.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use vigil_core::config::ProctorConfig;
use vigil_core::display::{RiskDisplay, RiskSnapshot};
use vigil_core::risk::RiskUpdate;
use vigil_core::session::Session;
use vigil_core::time::Timebase;
use vigil_core::visibility::VisibilityState;

use vigil_debug::pretty::PrettyPrintSink;
use vigil_debug::recorder::{RecordedEvent, RecorderSink, decode};
use vigil_sim_harness::Scenario;

const DURATION_MS: u64 = 12_000;

/// Prints the readout the browser would show.
struct StdoutDisplay;

impl RiskDisplay for StdoutDisplay {
    fn reset(&mut self, snapshot: &RiskSnapshot) {
        println!("risk {} [{}]", snapshot.score, snapshot.band.css_color());
    }

    fn show(&mut self, update: &RiskUpdate) {
        println!(
            "risk {} [{}] <- {}",
            update.score,
            update.band.css_color(),
            update.entry.reason,
        );
    }
}

fn main() -> io::Result<()> {
    let timebase = Timebase::NANOS;

    // -- sinks -------------------------------------------------------------
    let mut pretty = PrettyPrintSink::with_writer(io::stdout(), timebase);
    let mut recorder = RecorderSink::new();

    // -- timeline ----------------------------------------------------------
    let scenario = Scenario::new(DURATION_MS)
        .timebase(timebase)
        .faces(2_000, 6_500, 0)
        .faces(8_000, 8_100, 2)
        .visibility(9_000, VisibilityState::Hidden)
        .visibility(9_500, VisibilityState::Visible)
        .audio(10_000, 10_040, 140);

    let mut session = Session::with_sink(
        ProctorConfig::exam(),
        timebase,
        StdoutDisplay,
        (&mut pretty, &mut recorder),
    );
    let report = scenario.run(&mut session);
    drop(session);

    println!(
        "final score {} ({}), {} increments over {} frames",
        report.score,
        report.band.as_str(),
        report.increments,
        report.frames_observed,
    );

    let bytes = recorder.into_bytes();
    let risk_events = decode(&bytes)
        .filter(|e| matches!(e, RecordedEvent::RiskIncrease { .. }))
        .count();

    // -- export Chrome trace -----------------------------------------------
    let path = "trace.json";
    let mut writer = BufWriter::new(File::create(path)?);
    vigil_debug::chrome::export(&bytes, timebase, &mut writer)?;
    writer.flush()?;

    println!("Wrote {path} ({risk_events} risk events)");
    Ok(())
}
