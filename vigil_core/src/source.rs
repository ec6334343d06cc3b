// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sensor capabilities implemented by backends.
//!
//! - [`FrameSource`]: delivers face-detection results, one per camera frame.
//! - [`SpectrumSource`]: reads the current byte frequency snapshot of an
//!   audio analyser.
//!
//! The browser backend implements both on top of `MediaPipe` and Web Audio;
//! `vigil_sim_harness` provides scripted versions for tests.

use alloc::vec::Vec;

use kurbo::{Point, Rect};

use crate::time::HostTime;

/// A single normalized landmark (0..1 in image space, `z` relative depth).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    /// Horizontal position, 0 at the left edge.
    pub x: f64,
    /// Vertical position, 0 at the top edge.
    pub y: f64,
    /// Depth relative to the face centre.
    pub z: f64,
}

/// The landmark set for one detected face.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FaceLandmarks {
    /// Landmarks in detector order.
    pub points: Vec<Landmark>,
}

impl FaceLandmarks {
    /// Creates a landmark set.
    #[must_use]
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    /// Normalized bounding box of the landmarks, or `None` if there are none.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        let mut iter = self.points.iter().map(|p| Point::new(p.x, p.y));
        let first = iter.next()?;
        Some(iter.fold(Rect::from_points(first, first), |r, p| r.union_pt(p)))
    }
}

/// Detector output for one frame.
///
/// `multi_face_landmarks` is `None` when the detector omitted the list;
/// monitors treat that exactly like an empty list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FaceResults {
    /// One landmark set per detected face.
    pub multi_face_landmarks: Option<Vec<FaceLandmarks>>,
}

impl FaceResults {
    /// Results with no face list at all.
    #[must_use]
    pub const fn missing() -> Self {
        Self {
            multi_face_landmarks: None,
        }
    }

    /// Results with the given faces.
    #[must_use]
    pub fn with_faces(faces: Vec<FaceLandmarks>) -> Self {
        Self {
            multi_face_landmarks: Some(faces),
        }
    }

    /// Results with `count` faces that carry no landmarks.
    ///
    /// Useful when only presence matters (scripted sources, tests).
    #[must_use]
    pub fn with_face_count(count: usize) -> Self {
        Self::with_faces(core::iter::repeat_with(FaceLandmarks::default).take(count).collect())
    }

    /// Number of detected faces; zero when the list is missing.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.multi_face_landmarks.as_ref().map_or(0, Vec::len)
    }

    /// Iterates the detected faces.
    pub fn faces(&self) -> impl Iterator<Item = &FaceLandmarks> {
        self.multi_face_landmarks.iter().flatten()
    }
}

/// Detection result for one delivered frame, stamped with its host time.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionFrame {
    /// When the detector reported the result.
    pub at: HostTime,
    /// What it found.
    pub results: FaceResults,
}

/// Delivers face-detection results frame by frame.
///
/// Implementations either pull from a queue filled by an asynchronous
/// detector callback or synthesize results from a script.
pub trait FrameSource {
    /// Returns the next pending frame's result, or `None` if no frame is
    /// ready yet.
    fn next_frame(&mut self) -> Option<DetectionFrame>;
}

/// Reads byte-quantized frequency magnitudes from an audio analyser.
pub trait SpectrumSource {
    /// Number of frequency bins per snapshot.
    fn bin_count(&self) -> usize;

    /// Fills `out` (of length [`bin_count`](Self::bin_count)) with the
    /// current magnitudes, each 0–255.
    fn read_byte_frequencies(&mut self, out: &mut [u8]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn missing_list_counts_as_zero() {
        assert_eq!(FaceResults::missing().face_count(), 0);
        assert_eq!(FaceResults::with_faces(Vec::new()).face_count(), 0);
        assert_eq!(FaceResults::with_face_count(2).face_count(), 2);
        assert_eq!(FaceResults::missing().faces().count(), 0);
    }

    #[test]
    fn bounds_cover_all_points() {
        let face = FaceLandmarks::new(vec![
            Landmark { x: 0.4, y: 0.3, z: 0.0 },
            Landmark { x: 0.6, y: 0.2, z: 0.1 },
            Landmark { x: 0.5, y: 0.7, z: -0.1 },
        ]);
        let b = face.bounds().unwrap();
        assert!((b.x0 - 0.4).abs() < 1e-9 && (b.x1 - 0.6).abs() < 1e-9, "x: {b:?}");
        assert!((b.y0 - 0.2).abs() < 1e-9 && (b.y1 - 0.7).abs() < 1e-9, "y: {b:?}");
        assert!(FaceLandmarks::default().bounds().is_none());
    }
}
