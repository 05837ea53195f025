use serde::Serialize;

/// One detected glyph, in source image pixels.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct DetectionBox {
    /// Center x.
    pub x: f32,
    /// Center y.
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    #[serde(rename = "class")]
    pub class_label: String,
    pub class_id: usize,
    /// Always serialized as `null`.
    pub detection_id: Option<String>,
}

#[derive(Clone, Serialize, Debug, PartialEq, Default)]
pub struct DetectionResponse {
    /// Ordered by ascending `x`.
    pub predictions: Vec<DetectionBox>,
    /// Labels of `predictions` concatenated in order.
    pub detected_text: String,
}
