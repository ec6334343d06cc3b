// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM rendering of the risk score and event log.

use alloc::format;
use alloc::string::{String, ToString};

use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement};

use vigil_core::display::{RiskDisplay, RiskSnapshot};
use vigil_core::risk::{RiskBand, RiskUpdate};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "Date")]
    type LocalDate;

    #[wasm_bindgen(constructor, js_class = "Date")]
    fn new() -> LocalDate;

    // User's default locale.
    #[wasm_bindgen(method, js_class = "Date", js_name = "toLocaleTimeString")]
    fn locale_time(this: &LocalDate) -> String;
}

/// Renders risk state into a score element and a list element.
///
/// The score element shows the number and takes the band colour as its
/// background. Each increment becomes an `<li>` at the head of the list,
/// labelled with the wall-clock time it was displayed.
#[derive(Debug)]
pub struct DomRiskDisplay {
    document: Document,
    score: HtmlElement,
    log: Element,
}

impl DomRiskDisplay {
    /// Creates a display from already-resolved elements.
    #[must_use]
    pub fn new(document: Document, score: HtmlElement, log: Element) -> Self {
        Self {
            document,
            score,
            log,
        }
    }

    fn paint_score(&self, score: u64, band: RiskBand) -> Result<(), JsValue> {
        self.score.set_text_content(Some(&score.to_string()));
        self.score
            .style()
            .set_property("background-color", band.css_color())
    }

    fn prepend_entry(&self, reason: &str) -> Result<(), JsValue> {
        let item = self.document.create_element("li")?;
        let time = LocalDate::new().locale_time();
        item.set_text_content(Some(&entry_text(&time, reason)));
        self.log.prepend_with_node_1(&item)
    }

    fn drop_oldest(&self) {
        if let Some(last) = self.log.last_element_child() {
            last.remove();
        }
    }
}

impl RiskDisplay for DomRiskDisplay {
    fn reset(&mut self, snapshot: &RiskSnapshot) {
        self.log.set_inner_html("");
        if let Err(err) = self.paint_score(snapshot.score, snapshot.band) {
            web_sys::console::error_2(&"risk display: paint failed".into(), &err);
        }
    }

    fn show(&mut self, update: &RiskUpdate) {
        if let Err(err) = self.paint_score(update.score, update.band) {
            web_sys::console::error_2(&"risk display: paint failed".into(), &err);
        }
        if let Err(err) = self.prepend_entry(update.entry.reason.as_str()) {
            web_sys::console::error_2(&"risk display: log append failed".into(), &err);
        }
        if update.evicted.is_some() {
            self.drop_oldest();
        }
    }
}

/// Log line text: `[<local time>] <reason>`.
fn entry_text(time: &str, reason: &str) -> String {
    format!("[{time}] {reason}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::risk::RiskReason;

    #[test]
    fn entry_text_brackets_time_before_reason() {
        assert_eq!(
            entry_text("10:42:07 AM", RiskReason::FaceNotDetected.as_str()),
            "[10:42:07 AM] Face not detected",
            "log lines lead with the bracketed local time",
        );
    }

    #[test]
    fn entry_text_keeps_custom_reason_verbatim() {
        assert_eq!(entry_text("09:00", "note: [x]"), "[09:00] note: [x]");
    }
}
