/// The number of values representing bounding box coordinates in YOLO format.
///
/// YOLO format uses 4 values: [center_x, center_y, width, height].
/// Class scores start at this offset in every candidate column of the output tensor.
pub const CXYWH_OFFSET: usize = 4;

/// Side length of the square input the detector expects.
pub const REQUIRED_SIZE: usize = 640;

/// Number of color channels in the input image.
pub const INPUT_CHANNELS: usize = 3;

/// Batch size for a single model call.
pub const BATCH_SIZE: usize = 1;

/// Letterbox padding value (114/255), the gray the detector was trained with.
pub const BACKGROUND_FILL_VALUE: f32 = 114.0 / 255.0;

/// Minimum class score for a candidate to become a detection.
pub const PROBA_THRESHOLD: f32 = 0.25;

/// IoU above which a lower-scored box of the same class is suppressed.
pub const NMS_IOU_THRESHOLD: f32 = 0.7;

/// Upper bound on detections kept per image after NMS.
pub const MAX_DETECTIONS: usize = 300;

/// Multipart field that carries the uploaded image.
pub const IMAGE_FIELD: &str = "image";

pub const DEFAULT_MODEL_PATH: &str = "best.onnx";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;

/// Largest accepted request body (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// ONNX custom metadata key holding the id→name mapping.
pub const NAMES_METADATA_KEY: &str = "names";
