use std::path::Path;

use derive_builder::Builder;
use ndarray::{ArrayBase, Dim, OwnedRepr};
use snafu::ResultExt;

use crate::{
    consts::{
        BACKGROUND_FILL_VALUE, BATCH_SIZE, CXYWH_OFFSET, INPUT_CHANNELS, MAX_DETECTIONS,
        NMS_IOU_THRESHOLD, PROBA_THRESHOLD, REQUIRED_SIZE,
    },
    error::{GlyphError, ModelReadSnafu},
    inference::model::Model,
};

/// A YOLO detection export whose weights are read from disk at startup.
pub struct Yolo {
    weights: Vec<u8>,
    config: YoloConfig,
}

pub type YoloInput = ArrayBase<OwnedRepr<f32>, Dim<[usize; 4]>>;
pub type YoloOutput = ArrayBase<OwnedRepr<f32>, Dim<[usize; 3]>>;

#[derive(Debug, Clone, Builder)]
#[builder(default, build_fn(validate = "Self::validate"))]
pub struct YoloConfig {
    /// Side of the square input tensor.
    pub input_size: usize,
    pub batch_size: usize,
    pub input_channels: usize,
    pub background_fill_value: f32,
    pub cxywh_size: usize,
    pub proba_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl Default for YoloConfig {
    fn default() -> Self {
        Self {
            input_size: REQUIRED_SIZE,
            batch_size: BATCH_SIZE,
            input_channels: INPUT_CHANNELS,
            background_fill_value: BACKGROUND_FILL_VALUE,
            cxywh_size: CXYWH_OFFSET,
            proba_threshold: PROBA_THRESHOLD,
            iou_threshold: NMS_IOU_THRESHOLD,
            max_detections: MAX_DETECTIONS,
        }
    }
}

impl YoloConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.input_size == Some(0) {
            return Err("input_size must be greater than zero".into());
        }
        if self.max_detections == Some(0) {
            return Err("max_detections must be greater than zero".into());
        }
        Ok(())
    }
}

impl Yolo {
    pub fn new(weights: Vec<u8>, config: YoloConfig) -> Self {
        Self { weights, config }
    }

    pub fn from_path<P: AsRef<Path>>(path: P, config: YoloConfig) -> Result<Self, GlyphError> {
        let path = path.as_ref();
        let weights = std::fs::read(path).context(ModelReadSnafu {
            path: path.to_string_lossy(),
        })?;

        Ok(Self::new(weights, config))
    }
}

impl Model for Yolo {
    type Input = YoloInput;

    type Output = YoloOutput;
    type Config = YoloConfig;

    const INPUT_NAME: &'static str = "images";

    const OUTPUT_NAME: &'static str = "output0";

    const MODEL_NAME: &'static str = "yolo-glyphs";

    fn load(&self) -> &[u8] {
        &self.weights
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }
}
