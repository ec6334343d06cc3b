// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `requestAnimationFrame` tick source.
//!
//! [`RafLoop`] drives the audio sampler and the detection-queue drain. Each
//! callback receives a [`DOMHighResTimeStamp`][mdn] (milliseconds from
//! `performance.now()`), which is converted to microsecond [`HostTime`] ticks.
//!
//! The browser suspends animation frames while the page is hidden, so ticks
//! pause exactly when the visibility monitor reports a hidden page.
//!
//! [mdn]: https://developer.mozilla.org/en-US/docs/Web/API/DOMHighResTimeStamp
//! [`HostTime`]: vigil_core::time::HostTime

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use vigil_core::timing::AnimationTick;

// Direct global bindings instead of `web_sys::Window` methods; avoids
// fetching (and unwrapping) the Window/Performance objects on every frame.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);
}

/// A `requestAnimationFrame` loop that emits [`AnimationTick`] events.
///
/// Create with [`RafLoop::new`], then call [`start`](Self::start). The loop
/// re-registers itself each frame until [`stop`](Self::stop) is called or the
/// `RafLoop` is dropped.
pub struct RafLoop {
    inner: Rc<RafInner>,
}

type RafClosure = Closure<dyn FnMut(f64)>;

struct RafInner {
    /// The JS closure registered with `requestAnimationFrame`.
    ///
    /// Kept in its own `RefCell` so the closure can re-register itself
    /// without conflicting with `callback`.
    closure: RefCell<Option<RafClosure>>,

    /// The user-supplied tick handler.
    callback: RefCell<Box<dyn FnMut(AnimationTick)>>,

    /// Becomes `AnimationTick::frame_index`.
    frame_counter: Cell<u64>,

    running: Cell<bool>,

    /// ID of the pending `requestAnimationFrame` request.
    raf_id: Cell<i32>,
}

impl RafLoop {
    /// Creates a loop that is **not yet running**.
    pub fn new(callback: impl FnMut(AnimationTick) + 'static) -> Self {
        Self {
            inner: Rc::new(RafInner {
                closure: RefCell::new(None),
                callback: RefCell::new(Box::new(callback)),
                frame_counter: Cell::new(0),
                running: Cell::new(false),
                raf_id: Cell::new(0),
            }),
        }
    }

    /// Starts the loop. No-op if already running.
    pub fn start(&self) {
        if self.inner.running.get() {
            return;
        }
        self.inner.running.set(true);

        if self.inner.closure.borrow().is_none() {
            let inner = Rc::clone(&self.inner);
            let closure = Closure::wrap(Box::new(move |timestamp_ms: f64| {
                if !inner.running.get() {
                    return;
                }

                let frame_index = inner.frame_counter.get();
                inner.frame_counter.set(frame_index + 1);

                inner.callback.borrow_mut()(AnimationTick {
                    now: crate::ms_to_host_time(timestamp_ms),
                    frame_index,
                });

                // The callback may have stopped the loop.
                if inner.running.get()
                    && let Some(ref closure) = *inner.closure.borrow()
                {
                    let id = request_animation_frame(closure.as_ref().unchecked_ref());
                    inner.raf_id.set(id);
                }
            }) as Box<dyn FnMut(f64)>);
            *self.inner.closure.borrow_mut() = Some(closure);
        }

        if let Some(ref closure) = *self.inner.closure.borrow() {
            let id = request_animation_frame(closure.as_ref().unchecked_ref());
            self.inner.raf_id.set(id);
        }
    }

    /// Stops the loop and cancels the pending frame. Can be restarted.
    pub fn stop(&self) {
        if !self.inner.running.get() {
            return;
        }
        self.inner.running.set(false);
        cancel_animation_frame(self.inner.raf_id.get());
    }

    /// Returns `true` if the loop is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }
}

impl Drop for RafLoop {
    fn drop(&mut self) {
        self.stop();
        // The closure holds an `Rc` to `inner`; dropping it breaks the cycle.
        self.inner.closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for RafLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RafLoop")
            .field("running", &self.inner.running.get())
            .field("frame_counter", &self.inner.frame_counter.get())
            .finish()
    }
}
