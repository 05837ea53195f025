//! Turns detector result sets into a left-to-right reading.

pub mod element;

use snafu::{OptionExt, ensure};

use crate::{detect::DetectionSet, error::*};

pub use element::{DetectionBox, DetectionResponse};

impl DetectionResponse {
    /// Flattens, orders and reads `sets` in one pass.
    pub fn from_sets<I>(sets: I) -> Result<Self, GlyphError>
    where
        I: IntoIterator<Item = DetectionSet>,
    {
        let mut predictions = flatten(sets)?;
        sort_left_to_right(&mut predictions);
        let detected_text = read_text(&predictions);

        Ok(Self {
            predictions,
            detected_text,
        })
    }
}

/// One [`DetectionBox`] per detected box, in detector emission order.
///
/// Sets without boxes contribute nothing.
pub fn flatten<I>(sets: I) -> Result<Vec<DetectionBox>, GlyphError>
where
    I: IntoIterator<Item = DetectionSet>,
{
    let mut predictions = Vec::new();

    for set in sets {
        let Some(boxes) = set.boxes else {
            continue;
        };

        ensure!(
            boxes.xywh.nrows() == boxes.conf.len() && boxes.conf.len() == boxes.cls.len(),
            MisalignedOutputSnafu {
                boxes: boxes.xywh.nrows(),
                confidences: boxes.conf.len(),
                classes: boxes.cls.len(),
            }
        );
        ensure!(
            boxes.xywh.ncols() == 4,
            BoxShapeSnafu {
                columns: boxes.xywh.ncols(),
            }
        );

        let rows = boxes.xywh.rows().into_iter();
        for ((xywh, &confidence), &cls) in rows.zip(&boxes.conf).zip(&boxes.cls) {
            ensure!(cls.is_finite() && cls >= 0.0, InvalidClassSnafu { value: cls });
            let class_id = cls as usize;

            for (field, &value) in ["x", "y", "width", "height"].into_iter().zip(xywh.iter()) {
                ensure!(value.is_finite(), NonFiniteSnafu { field, value });
            }
            ensure!(
                confidence.is_finite(),
                NonFiniteSnafu {
                    field: "confidence",
                    value: confidence,
                }
            );

            let class_label = set
                .names
                .get(class_id)
                .context(UnknownClassSnafu { class_id })?
                .to_owned();

            predictions.push(DetectionBox {
                x: xywh[0_usize],
                y: xywh[1_usize],
                width: xywh[2_usize],
                height: xywh[3_usize],
                confidence,
                class_label,
                class_id,
                detection_id: None,
            });
        }
    }

    Ok(predictions)
}

/// Orders boxes by center x; boxes sharing an x keep their relative order.
pub fn sort_left_to_right(predictions: &mut [DetectionBox]) {
    predictions.sort_by(|a, b| a.x.total_cmp(&b.x));
}

pub fn read_text(predictions: &[DetectionBox]) -> String {
    predictions
        .iter()
        .map(|prediction| prediction.class_label.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ndarray::{Array1, Array2};

    use super::*;
    use crate::{analysis::labels::LabelSet, detect::Boxes};

    fn names(labels: &[&str]) -> Arc<LabelSet> {
        Arc::new(LabelSet::new(labels.iter().map(|l| l.to_string()).collect()))
    }

    /// One set from `(x, class_id, confidence)` triples; y, width and height are fixed.
    fn set(labels: &[&str], detections: &[(f32, usize, f32)]) -> DetectionSet {
        let n = detections.len();
        let xywh = Array2::from_shape_fn((n, 4), |(i, j)| match j {
            0 => detections[i].0,
            1 => 40.0,
            _ => 12.0,
        });
        let conf = detections.iter().map(|d| d.2).collect::<Array1<f32>>();
        let cls = detections.iter().map(|d| d.1 as f32).collect::<Array1<f32>>();

        DetectionSet {
            boxes: Some(Boxes::new(xywh, conf, cls)),
            names: names(labels),
        }
    }

    #[test]
    fn test_reads_left_to_right() {
        let labels = ["A", "B", "C"];
        let detections = [(50.0, 1, 0.9), (10.0, 0, 0.8), (30.0, 2, 0.7)];
        let response = DetectionResponse::from_sets([set(&labels, &detections)]).unwrap();

        let xs: Vec<f32> = response.predictions.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![10.0, 30.0, 50.0]);
        let classes: Vec<&str> = response
            .predictions
            .iter()
            .map(|p| p.class_label.as_str())
            .collect();
        assert_eq!(classes, vec!["A", "C", "B"]);
        assert_eq!(response.detected_text, "ACB");
    }

    #[test]
    fn test_order_and_text_invariants() {
        let labels = ["h", "e", "l", "o"];
        let detections = [
            (88.5, 3, 0.91),
            (12.0, 0, 0.88),
            (61.0, 2, 0.52),
            (35.25, 1, 0.77),
            (47.0, 2, 0.66),
        ];
        let response = DetectionResponse::from_sets([set(&labels, &detections)]).unwrap();

        assert!(response.predictions.windows(2).all(|w| w[0].x <= w[1].x));
        assert_eq!(response.detected_text, read_text(&response.predictions));
        assert_eq!(response.detected_text, "hello");
        assert_eq!(response.predictions.len(), detections.len());

        for prediction in &response.predictions {
            assert!(prediction.detection_id.is_none());
            assert!((0.0..=1.0).contains(&prediction.confidence));
            assert_eq!(labels[prediction.class_id], prediction.class_label);
        }
    }

    #[test]
    fn test_ties_keep_emission_order() {
        let labels = ["A", "B", "C"];
        let response = DetectionResponse::from_sets([set(
            &labels,
            &[(20.0, 2, 0.9), (5.0, 0, 0.8), (20.0, 1, 0.7), (20.0, 0, 0.6)],
        )])
        .unwrap();

        assert_eq!(response.detected_text, "ACBA");
    }

    #[test]
    fn test_multi_character_labels_are_joined_verbatim() {
        let labels = ["th", "E", " "];
        let detections = [(3.0, 1, 0.5), (1.0, 0, 0.5), (2.0, 2, 0.5)];
        let response = DetectionResponse::from_sets([set(&labels, &detections)]).unwrap();

        assert_eq!(response.detected_text, "th E");
    }

    #[test]
    fn test_empty_sets() {
        let empty = DetectionResponse::from_sets([DetectionSet::empty(names(&["A"]))]).unwrap();
        assert!(empty.predictions.is_empty());
        assert_eq!(empty.detected_text, "");

        let none = DetectionResponse::from_sets(Vec::<DetectionSet>::new()).unwrap();
        assert_eq!(none, empty);
    }

    #[test]
    fn test_flatten_copies_geometry() {
        let boxes = flatten([set(&["A"], &[(17.5, 0, 0.25)])]).unwrap();
        assert_eq!(
            boxes,
            vec![DetectionBox {
                x: 17.5,
                y: 40.0,
                width: 12.0,
                height: 12.0,
                confidence: 0.25,
                class_label: "A".into(),
                class_id: 0,
                detection_id: None,
            }]
        );
    }

    #[test]
    fn test_misaligned_output() {
        let mut misaligned = set(&["A"], &[(1.0, 0, 0.5), (2.0, 0, 0.5)]);
        if let Some(boxes) = misaligned.boxes.as_mut() {
            boxes.conf = Array1::from(vec![0.5]);
        }

        let err = flatten([misaligned]).unwrap_err();
        assert!(matches!(
            err,
            GlyphError::MisalignedOutput {
                boxes: 2,
                confidences: 1,
                classes: 2
            }
        ));
    }

    #[test]
    fn test_unknown_class() {
        let err = flatten([set(&["A"], &[(1.0, 4, 0.5)])]).unwrap_err();
        assert!(matches!(err, GlyphError::UnknownClass { class_id: 4 }));
    }

    #[test]
    fn test_non_finite_geometry() {
        let labels = ["A", "B"];
        let detections = [(3.0, 0, 0.5), (f32::NAN, 1, 0.5), (1.0, 0, 0.5)];

        let err = DetectionResponse::from_sets([set(&labels, &detections)]).unwrap_err();
        assert!(matches!(err, GlyphError::NonFinite { ref field, .. } if field == "x"));

        let err = flatten([set(&labels, &[(1.0, 0, f32::INFINITY)])]).unwrap_err();
        assert!(matches!(err, GlyphError::NonFinite { ref field, .. } if field == "confidence"));
    }

    #[test]
    fn test_sort_tolerates_nan() {
        let mut boxes = flatten([set(&["A"], &[(1.0, 0, 0.5); 40])]).unwrap();
        for (i, prediction) in boxes.iter_mut().enumerate() {
            prediction.x = if i % 3 == 0 { f32::NAN } else { (40 - i) as f32 };
        }

        sort_left_to_right(&mut boxes);
        let finite: Vec<f32> = boxes.iter().map(|p| p.x).filter(|x| !x.is_nan()).collect();
        assert!(finite.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_negative_class() {
        let mut negative = set(&["A"], &[(1.0, 0, 0.5)]);
        if let Some(boxes) = negative.boxes.as_mut() {
            boxes.cls = Array1::from(vec![-1.0]);
        }

        assert!(matches!(
            flatten([negative]).unwrap_err(),
            GlyphError::InvalidClass { .. }
        ));
    }
}
