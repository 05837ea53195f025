use snafu::prelude::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum GlyphError {
    #[snafu(display("Ort Session init stage `{}` error: {}", stage, source))]
    OrtInit {
        source: ort::error::Error,
        stage: String,
    },
    #[snafu(display("Build Tensor for `{}` error: {}", stage, source))]
    Tensor {
        source: ort::error::Error,
        stage: String,
    },
    #[snafu(display("Onnx Inference error: {}", source))]
    Inference { source: ort::error::Error },
    #[snafu(display("Onnx Output can not found {}", output_name))]
    NotFoundOutput { output_name: String },
    #[snafu(display("Ndarray Shape error at stage `{}`: {}", stage, source))]
    Shape {
        source: ndarray::ShapeError,
        stage: String,
    },
    #[snafu(display("Read model `{}` error: {}", path, source))]
    ModelRead {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Read labels `{}` error: {}", path, source))]
    LabelRead {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Parse labels error: {}", message))]
    LabelParse { message: String },
    #[snafu(display("Model carries no `names` metadata and no labels file was given"))]
    MissingLabels,
    #[snafu(display("Model predicts {} classes but {} labels are known", classes, labels))]
    LabelMismatch { classes: usize, labels: usize },
    #[snafu(display(
        "Detector output misaligned: {} boxes, {} confidences, {} classes",
        boxes,
        confidences,
        classes
    ))]
    MisalignedOutput {
        boxes: usize,
        confidences: usize,
        classes: usize,
    },
    #[snafu(display("Detector boxes have {} columns, expected 4", columns))]
    BoxShape { columns: usize },
    #[snafu(display("Detector emitted invalid class value {}", value))]
    InvalidClass { value: f32 },
    #[snafu(display("Class id {} has no label", class_id))]
    UnknownClass { class_id: usize },
    #[snafu(display("Detector emitted non-finite {} {}", field, value))]
    NonFinite { field: String, value: f32 },
}
