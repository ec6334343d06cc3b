// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `visibilitychange` subscription.

use alloc::boxed::Box;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Event};

use vigil_core::visibility::VisibilityState;

const EVENT: &str = "visibilitychange";

/// Forwards `document.hidden` to a callback on every `visibilitychange`.
///
/// The listener is removed when this value is dropped.
pub struct VisibilityListener {
    document: Document,
    closure: Closure<dyn FnMut(Event)>,
}

impl VisibilityListener {
    /// Registers `callback` on `document`.
    pub fn new(
        document: Document,
        mut callback: impl FnMut(VisibilityState) + 'static,
    ) -> Result<Self, JsValue> {
        let doc = document.clone();
        let closure = Closure::wrap(Box::new(move |_: Event| {
            callback(VisibilityState::from_hidden(doc.hidden()));
        }) as Box<dyn FnMut(Event)>);
        document.add_event_listener_with_callback(EVENT, closure.as_ref().unchecked_ref())?;
        Ok(Self { document, closure })
    }

}

impl Drop for VisibilityListener {
    fn drop(&mut self) {
        // Nothing useful to do if removal fails while tearing down.
        _ = self
            .document
            .remove_event_listener_with_callback(EVENT, self.closure.as_ref().unchecked_ref());
    }
}

impl core::fmt::Debug for VisibilityListener {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VisibilityListener").finish_non_exhaustive()
    }
}
