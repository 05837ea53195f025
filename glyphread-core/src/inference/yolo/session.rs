use std::{cmp::Ordering, sync::Arc};

use glam::Vec2;
use image::{DynamicImage, GenericImageView, imageops::FilterType};
use ndarray::prelude::*;
use ort::{
    session::{Session, builder::SessionBuilder},
    value::TensorRef,
};
use snafu::{OptionExt, ResultExt, ensure};
use tracing::*;

use crate::{
    analysis::{bbox::Bbox, labels::LabelSet},
    consts::NAMES_METADATA_KEY,
    detect::{Boxes, DetectionSet},
    error::*,
    inference::{
        model::{Model, OnnxSession},
        yolo::model::{Yolo, YoloConfig, YoloOutput},
    },
};

pub struct YoloSession<M: Model> {
    session: Session,
    model: M,
    labels: Arc<LabelSet>,
}

/// Geometry of one letterboxed image, used to map boxes back to source pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub image_size: Vec2,
    pub resized: (u32, u32),
    pub pad: (u32, u32),
    pub gain: f32,
}

impl Letterbox {
    /// Fits a `width x height` image into a `target x target` square, centred.
    pub fn fit(width: u32, height: u32, target: usize) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let target = target as u32;

        let gain = f32::min(
            target as f32 / width as f32,
            target as f32 / height as f32,
        );
        let w_new = ((width as f32 * gain).round() as u32).clamp(1, target);
        let h_new = ((height as f32 * gain).round() as u32).clamp(1, target);

        Self {
            image_size: Vec2::new(width as f32, height as f32),
            resized: (w_new, h_new),
            pad: ((target - w_new) / 2, (target - h_new) / 2),
            gain,
        }
    }

    /// Maps a box from input-tensor space back to source image pixels.
    pub fn to_image(&self, bbox: Bbox) -> Bbox {
        bbox.translate(-Vec2::new(self.pad.0 as f32, self.pad.1 as f32))
            .scale(1. / self.gain)
            .clamp(Vec2::ZERO, self.image_size)
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    bbox: Bbox,
    proba: f32,
    class_id: usize,
}

impl YoloSession<Yolo> {
    /// Commits the model and resolves its labels.
    ///
    /// Without explicit `labels`, the `names` entry of the model metadata is used.
    pub fn new(
        session: SessionBuilder,
        model: Yolo,
        labels: Option<LabelSet>,
    ) -> Result<Self, GlyphError> {
        let session = session
            .commit_from_memory(model.load())
            .context(OrtInitSnafu { stage: "commit" })?;

        let labels = match labels {
            Some(labels) => labels,
            None => {
                let metadata = session
                    .metadata()
                    .context(OrtInitSnafu { stage: "metadata" })?;
                let names = metadata
                    .custom(NAMES_METADATA_KEY)
                    .context(OrtInitSnafu {
                        stage: "metadata-names",
                    })?
                    .context(MissingLabelsSnafu)?;
                LabelSet::from_names_metadata(&names)?
            }
        };

        debug!(
            model = Yolo::MODEL_NAME,
            labels = labels.len(),
            "yolo session committed"
        );

        Ok(Self {
            session,
            model,
            labels: Arc::new(labels),
        })
    }

    pub fn labels(&self) -> &Arc<LabelSet> {
        &self.labels
    }

    pub fn detect(&mut self, image: &DynamicImage) -> Result<DetectionSet, GlyphError> {
        let (width, height) = image.dimensions();
        let letterbox = Letterbox::fit(width, height, self.model.config().input_size);

        self.run(image, letterbox)
    }

    /// Runs one blank frame so a broken model or a label/class mismatch surfaces at startup.
    pub fn warm_up(&mut self) -> Result<(), GlyphError> {
        let size = self.model.config().input_size as u32;
        let blank = DynamicImage::new_rgb8(size, size);

        self.detect(&blank).map(|_| ())
    }
}

impl OnnxSession<Yolo> for YoloSession<Yolo> {
    type Output = DetectionSet;
    type Extra = Letterbox;

    fn preprocess(
        &self,
        image: &DynamicImage,
        extra: &Letterbox,
    ) -> Result<<Yolo as Model>::Input, GlyphError> {
        let model_config = self.model.config();
        let (w_new, h_new) = extra.resized;
        let (pad_x, pad_y) = (extra.pad.0 as usize, extra.pad.1 as usize);

        let resized_img = image
            .resize_exact(w_new, h_new, FilterType::Triangle)
            .to_rgb8();

        let mut input_tensor = Array4::from_elem(
            [
                model_config.batch_size,
                model_config.input_channels,
                model_config.input_size,
                model_config.input_size,
            ],
            model_config.background_fill_value,
        );

        for (x, y, pixel) in resized_img.enumerate_pixels() {
            let x = x as usize + pad_x;
            let y = y as usize + pad_y;
            let [r, g, b] = pixel.0;
            input_tensor[[0, 0, y, x]] = r as f32 / 255.0;
            input_tensor[[0, 1, y, x]] = g as f32 / 255.0;
            input_tensor[[0, 2, y, x]] = b as f32 / 255.0;
        }

        Ok(input_tensor)
    }

    fn postprocess(
        &self,
        output: <Yolo as Model>::Output,
        extra: Self::Extra,
    ) -> Result<Self::Output, GlyphError> {
        decode(self.model.config(), &self.labels, output, extra)
    }

    fn infer(
        &mut self,
        input: <Yolo as Model>::Input,
        input_name: &str,
        output_name: &str,
    ) -> Result<<Yolo as Model>::Output, GlyphError> {
        let output = self
            .session
            .run(ort::inputs![
                input_name => TensorRef::from_array_view(&input).context(TensorSnafu{stage: "input"})?
            ])
            .context(InferenceSnafu {})?;

        let tensor = output
            .get(output_name)
            .context(NotFoundOutputSnafu { output_name })?
            .try_extract_array::<f32>()
            .context(TensorSnafu { stage: "extract" })?;

        let output = tensor
            .into_dimensionality::<Ix3>()
            .context(ShapeSnafu { stage: "output" })?
            .to_owned();

        Ok(output)
    }
}

/// Turns a raw `[1, 4 + C, N]` head output into one result set in source pixels.
///
/// Boxes come out in descending score order.
fn decode(
    config: &YoloConfig,
    labels: &Arc<LabelSet>,
    output: YoloOutput,
    letterbox: Letterbox,
) -> Result<DetectionSet, GlyphError> {
    let output = output.slice(s![0, .., ..]);

    let classes = output.nrows().saturating_sub(config.cxywh_size);
    ensure!(
        classes == labels.len(),
        LabelMismatchSnafu {
            classes,
            labels: labels.len(),
        }
    );

    let mut candidates = Vec::new();
    for prediction in output.axis_iter(Axis(1)) {
        let scores = prediction.slice(s![config.cxywh_size..]);

        let Some((class_id, &proba)) = scores
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        else {
            continue;
        };

        if proba.is_nan() || proba <= config.proba_threshold {
            continue;
        }

        let bbox = Bbox::from_center_size(
            Vec2::new(prediction[0_usize], prediction[1_usize]),
            Vec2::new(prediction[2_usize], prediction[3_usize]),
        );

        candidates.push(Candidate {
            bbox,
            proba,
            class_id,
        });
    }

    nms(&mut candidates, config.iou_threshold);
    candidates.truncate(config.max_detections);

    if candidates.is_empty() {
        return Ok(DetectionSet::empty(labels.clone()));
    }

    let count = candidates.len();
    let mut xywh = Vec::with_capacity(count * 4);
    let mut conf = Vec::with_capacity(count);
    let mut cls = Vec::with_capacity(count);
    for candidate in candidates {
        let bbox = letterbox.to_image(candidate.bbox);
        let center = bbox.center();
        let size = bbox.size();

        xywh.extend([center.x, center.y, size.x, size.y]);
        conf.push(candidate.proba);
        cls.push(candidate.class_id as f32);
    }

    let xywh = Array2::from_shape_vec((count, 4), xywh).context(ShapeSnafu { stage: "boxes" })?;

    Ok(DetectionSet {
        boxes: Some(Boxes::new(xywh, Array1::from(conf), Array1::from(cls))),
        names: labels.clone(),
    })
}

/// Class-aware non-maximum suppression; survivors stay sorted by score, highest first.
fn nms(candidates: &mut Vec<Candidate>, iou_threshold: f32) {
    candidates.sort_by(|a, b| b.proba.partial_cmp(&a.proba).unwrap_or(Ordering::Equal));

    if candidates.len() < 2 {
        return;
    }

    let mut keep_flags = vec![true; candidates.len()];

    for current_index in 0..candidates.len() {
        let current = candidates[current_index];

        for kept_index in 0..current_index {
            if !keep_flags[kept_index] || candidates[kept_index].class_id != current.class_id {
                continue;
            }

            if current.bbox.iou(&candidates[kept_index].bbox) > iou_threshold {
                keep_flags[current_index] = false;
                break;
            }
        }
    }

    let mut flags = keep_flags.into_iter();
    candidates.retain(|_| flags.next().unwrap_or(false));
}
