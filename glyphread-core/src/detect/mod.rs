//! The detection capability the HTTP layer depends on.
//!
//! A [`Detector`] is built once at startup and shared read-only by every request.

pub mod onnx;

use std::sync::Arc;

use image::DynamicImage;
use ndarray::{Array1, Array2};

use crate::{analysis::labels::LabelSet, error::GlyphError};

pub use onnx::OnnxDetector;

/// Index-aligned detections of one image.
///
/// Row `i` of `xywh` is `[center_x, center_y, width, height]` in source pixels;
/// `conf[i]` and `cls[i]` belong to the same box.
#[derive(Debug, Clone, PartialEq)]
pub struct Boxes {
    pub xywh: Array2<f32>,
    pub conf: Array1<f32>,
    pub cls: Array1<f32>,
}

impl Boxes {
    pub fn new(xywh: Array2<f32>, conf: Array1<f32>, cls: Array1<f32>) -> Self {
        Self { xywh, conf, cls }
    }

    pub fn len(&self) -> usize {
        self.xywh.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Detector output for one image of a batch.
#[derive(Debug, Clone)]
pub struct DetectionSet {
    /// `None` when nothing was detected.
    pub boxes: Option<Boxes>,
    /// Mapping used to resolve `cls` values to labels.
    pub names: Arc<LabelSet>,
}

impl DetectionSet {
    pub fn empty(names: Arc<LabelSet>) -> Self {
        Self { boxes: None, names }
    }
}

pub trait Detector: Send + Sync {
    /// Runs detection over `batch`, returning one result set per image, in order.
    fn detect(&self, batch: &[DynamicImage]) -> Result<Vec<DetectionSet>, GlyphError>;
}
