pub mod model;
pub mod session;

pub use model::{Yolo, YoloConfig, YoloConfigBuilder, YoloInput, YoloOutput};
pub use session::{Letterbox, YoloSession};
