// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `getUserMedia` capture.

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlVideoElement, MediaStream, MediaStreamConstraints, MediaStreamTrack};

/// A granted media stream.
///
/// Tracks keep running until [`stop`](Self::stop) is called; dropping the
/// value alone leaves the camera light on.
#[derive(Clone, Debug)]
pub struct MediaCapture {
    stream: MediaStream,
}

impl MediaCapture {
    /// Asks the user for camera and/or microphone access.
    ///
    /// Rejects with the browser's error (typically `NotAllowedError` or
    /// `NotFoundError`) when access is denied or no device exists.
    pub async fn request(video: bool, audio: bool) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let devices = window.navigator().media_devices()?;

        let constraints = MediaStreamConstraints::new();
        constraints.set_video(&JsValue::from_bool(video));
        constraints.set_audio(&JsValue::from_bool(audio));

        let promise = devices.get_user_media_with_constraints(&constraints)?;
        let stream = JsFuture::from(promise).await?.dyn_into::<MediaStream>()?;
        Ok(Self { stream })
    }

    /// Camera with audio, as the exam view requests it.
    pub async fn camera() -> Result<Self, JsValue> {
        Self::request(true, true).await
    }

    /// Microphone only.
    pub async fn microphone() -> Result<Self, JsValue> {
        Self::request(false, true).await
    }

    /// The underlying stream.
    #[must_use]
    pub fn stream(&self) -> &MediaStream {
        &self.stream
    }

    /// Plays the stream in `video`.
    pub fn attach(&self, video: &HtmlVideoElement) {
        video.set_src_object(Some(&self.stream));
    }

    /// Stops every track in the stream.
    pub fn stop(&self) {
        for track in self.stream.get_tracks().iter() {
            if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                track.stop();
            }
        }
    }
}
