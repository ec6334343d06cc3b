// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `MediaPipe` `FaceMesh` and `Camera` utilities.
//!
//! Both libraries are expected as page globals (`FaceMesh`, `Camera`), loaded
//! from their CDN scripts before the wasm module starts. The camera helper
//! feeds video frames to the detector; the detector calls back with results
//! at its own pace. Results are stamped with [`now`](crate::now) and queued,
//! and the tick handler drains the queue through [`FaceMeshFrames`].

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use js_sys::{Array, Object, Promise, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlVideoElement;

use vigil_core::config::{CaptureConfig, DetectorConfig};
use vigil_core::source::{DetectionFrame, FaceLandmarks, FaceResults, FrameSource, Landmark};

/// Where the detector loads its model and wasm files from.
const ASSET_ROOT: &str = "https://cdn.jsdelivr.net/npm/@mediapipe/face_mesh/";

/// Frames held before the oldest is dropped. Only reached if ticks stall
/// while the camera keeps delivering.
const QUEUE_CAPACITY: usize = 64;

mod js {
    use wasm_bindgen::prelude::*;
    use web_sys::HtmlVideoElement;

    #[wasm_bindgen]
    extern "C" {
        #[derive(Clone, Debug)]
        pub(super) type FaceMesh;

        #[wasm_bindgen(constructor, catch)]
        pub(super) fn new(config: &JsValue) -> Result<FaceMesh, JsValue>;

        #[wasm_bindgen(method, js_name = "setOptions")]
        pub(super) fn set_options(this: &FaceMesh, options: &JsValue);

        #[wasm_bindgen(method, js_name = "onResults")]
        pub(super) fn on_results(this: &FaceMesh, callback: &JsValue);

        #[wasm_bindgen(method, catch)]
        pub(super) fn send(this: &FaceMesh, input: &JsValue) -> Result<js_sys::Promise, JsValue>;

        #[wasm_bindgen(method)]
        pub(super) fn close(this: &FaceMesh) -> js_sys::Promise;

        #[derive(Clone, Debug)]
        pub(super) type Camera;

        #[wasm_bindgen(constructor, catch)]
        pub(super) fn new(video: &HtmlVideoElement, options: &JsValue) -> Result<Camera, JsValue>;

        #[wasm_bindgen(method, catch)]
        pub(super) fn start(this: &Camera) -> Result<js_sys::Promise, JsValue>;

        #[wasm_bindgen(method)]
        pub(super) fn stop(this: &Camera) -> js_sys::Promise;
    }
}

type FrameQueue = Rc<RefCell<VecDeque<DetectionFrame>>>;

/// A running `FaceMesh` detector fed by the `MediaPipe` camera helper.
///
/// Holds the JS callbacks alive. Call [`stop`](Self::stop) to halt the camera
/// loop and release the detector.
pub struct FaceMeshTracker {
    mesh: js::FaceMesh,
    camera: js::Camera,
    _locate_file: Closure<dyn Fn(String) -> String>,
    _on_results: Closure<dyn FnMut(JsValue)>,
    _on_frame: Closure<dyn FnMut() -> Promise>,
}

/// Detection results queued by a [`FaceMeshTracker`].
#[derive(Clone, Debug, Default)]
pub struct FaceMeshFrames {
    queue: FrameQueue,
}

impl FaceMeshFrames {
    /// Frames waiting to be drained.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl FrameSource for FaceMeshFrames {
    fn next_frame(&mut self) -> Option<DetectionFrame> {
        self.queue.borrow_mut().pop_front()
    }
}

impl FaceMeshTracker {
    /// Creates the detector, wires it to `video`, and starts the camera.
    ///
    /// Fails if either library is missing or the camera helper cannot start.
    pub async fn start(
        video: &HtmlVideoElement,
        detector: &DetectorConfig,
        capture: &CaptureConfig,
    ) -> Result<(Self, FaceMeshFrames), JsValue> {
        let locate_file = Closure::wrap(
            Box::new(|file: String| format!("{ASSET_ROOT}{file}")) as Box<dyn Fn(String) -> String>
        );
        let config = Object::new();
        Reflect::set(&config, &"locateFile".into(), locate_file.as_ref())?;
        let mesh = js::FaceMesh::new(&config)?;
        let options = detector_options(detector)?;
        mesh.set_options(&options);

        let frames = FaceMeshFrames::default();
        let queue = Rc::clone(&frames.queue);
        let on_results = Closure::wrap(Box::new(move |results: JsValue| {
            let frame = DetectionFrame {
                at: crate::now(),
                results: parse_results(&results),
            };
            push_capped(&mut queue.borrow_mut(), frame, QUEUE_CAPACITY);
        }) as Box<dyn FnMut(JsValue)>);
        mesh.on_results(on_results.as_ref());

        let sender = mesh.clone();
        let input = Object::new();
        Reflect::set(&input, &"image".into(), video.as_ref())?;
        let on_frame = Closure::wrap(Box::new(move || {
            sender
                .send(&input)
                .unwrap_or_else(|err| Promise::reject(&err))
        }) as Box<dyn FnMut() -> Promise>);

        let options = Object::new();
        Reflect::set(&options, &"onFrame".into(), on_frame.as_ref())?;
        Reflect::set(&options, &"width".into(), &capture.width.into())?;
        Reflect::set(&options, &"height".into(), &capture.height.into())?;
        let camera = js::Camera::new(video, &options)?;
        JsFuture::from(camera.start()?).await?;

        Ok((
            Self {
                mesh,
                camera,
                _locate_file: locate_file,
                _on_results: on_results,
                _on_frame: on_frame,
            },
            frames,
        ))
    }

    /// Stops the camera loop and closes the detector.
    ///
    /// The JS callbacks stay registered until `close()` settles, so a frame
    /// already in flight still lands on a live `onResults` closure.
    pub fn stop(self) {
        _ = self.camera.stop();
        let closing = self.mesh.close();
        wasm_bindgen_futures::spawn_local(async move {
            // Rejection only means the detector was already gone.
            _ = JsFuture::from(closing).await;
            drop(self);
        });
    }
}

impl core::fmt::Debug for FaceMeshTracker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FaceMeshTracker").finish_non_exhaustive()
    }
}

/// A `setOptions` value.
#[derive(Clone, Copy, Debug, PartialEq)]
enum OptionValue {
    Number(f64),
    Flag(bool),
}

fn detector_fields(detector: &DetectorConfig) -> [(&'static str, OptionValue); 4] {
    [
        ("maxNumFaces", OptionValue::Number(f64::from(detector.max_num_faces))),
        ("refineLandmarks", OptionValue::Flag(detector.refine_landmarks)),
        (
            "minDetectionConfidence",
            OptionValue::Number(detector.min_detection_confidence),
        ),
        (
            "minTrackingConfidence",
            OptionValue::Number(detector.min_tracking_confidence),
        ),
    ]
}

fn detector_options(detector: &DetectorConfig) -> Result<Object, JsValue> {
    let options = Object::new();
    for (key, value) in detector_fields(detector) {
        let value = match value {
            OptionValue::Number(n) => JsValue::from_f64(n),
            OptionValue::Flag(b) => JsValue::from_bool(b),
        };
        Reflect::set(&options, &JsValue::from_str(key), &value)?;
    }
    Ok(options)
}

/// Reads `results.multiFaceLandmarks`. An absent list means no face.
fn parse_results(results: &JsValue) -> FaceResults {
    let Some(list) = Reflect::get(results, &"multiFaceLandmarks".into())
        .ok()
        .and_then(|v| v.dyn_into::<Array>().ok())
    else {
        return FaceResults::missing();
    };
    FaceResults::with_faces(list.iter().map(parse_face).collect())
}

fn parse_face(face: JsValue) -> FaceLandmarks {
    let points = face
        .dyn_into::<Array>()
        .map(|points| {
            points
                .iter()
                .map(|p| Landmark {
                    x: number(&p, "x"),
                    y: number(&p, "y"),
                    z: number(&p, "z"),
                })
                .collect()
        })
        .unwrap_or_else(|_| Vec::new());
    FaceLandmarks::new(points)
}

fn number(obj: &JsValue, key: &str) -> f64 {
    Reflect::get(obj, &JsValue::from_str(key))
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0)
}

fn push_capped(queue: &mut VecDeque<DetectionFrame>, frame: DetectionFrame, capacity: usize) {
    if queue.len() >= capacity {
        queue.pop_front();
    }
    queue.push_back(frame);
}
