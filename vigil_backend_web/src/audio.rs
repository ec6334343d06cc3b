// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web Audio analyser as a spectrum source.

use wasm_bindgen::prelude::*;
use web_sys::{AnalyserNode, AudioContext, MediaStream, MediaStreamAudioSourceNode};

use vigil_core::config::AudioConfig;
use vigil_core::source::SpectrumSource;

use crate::media::MediaCapture;

/// `MediaStream -> MediaStreamAudioSourceNode -> AnalyserNode`.
///
/// The analyser is not connected to the destination, so nothing is played
/// back.
#[derive(Debug)]
pub struct AnalyserSpectrum {
    context: AudioContext,
    analyser: AnalyserNode,
    _source: MediaStreamAudioSourceNode,
}

impl AnalyserSpectrum {
    /// Builds the analyser graph over `stream`.
    pub fn new(stream: &MediaStream, config: &AudioConfig) -> Result<Self, JsValue> {
        let context = AudioContext::new()?;
        let source = context.create_media_stream_source(stream)?;
        let analyser = context.create_analyser()?;
        analyser.set_fft_size(config.fft_size);
        source.connect_with_audio_node(&analyser)?;
        Ok(Self {
            context,
            analyser,
            _source: source,
        })
    }

    /// Closes the audio context. Further reads return silence.
    pub fn close(&self) {
        // The returned promise only reports completion.
        _ = self.context.close();
    }
}

impl SpectrumSource for AnalyserSpectrum {
    fn bin_count(&self) -> usize {
        self.analyser.frequency_bin_count() as usize
    }

    fn read_byte_frequencies(&mut self, out: &mut [u8]) {
        self.analyser.get_byte_frequency_data(out);
    }
}

/// Requests the microphone and builds an analyser over it.
///
/// On failure the error is written to the console and `None` is returned;
/// the caller should report the audio monitor as unavailable and carry on.
pub async fn open_microphone(config: &AudioConfig) -> Option<(MediaCapture, AnalyserSpectrum)> {
    let capture = match MediaCapture::microphone().await {
        Ok(capture) => capture,
        Err(err) => {
            web_sys::console::error_2(&"Microphone access denied".into(), &err);
            return None;
        }
    };
    match AnalyserSpectrum::new(capture.stream(), config) {
        Ok(spectrum) => Some((capture, spectrum)),
        Err(err) => {
            web_sys::console::error_2(&"Audio analyser setup failed".into(), &err);
            capture.stop();
            None
        }
    }
}
