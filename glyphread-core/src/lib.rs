pub mod analysis;
pub mod consts;
pub mod detect;
pub mod error;
pub mod inference;
pub mod reading;
pub mod server;

// Re-export commonly used types
pub use detect::{DetectionSet, Detector, OnnxDetector};
pub use reading::{DetectionBox, DetectionResponse};
pub use server::{AppState, ServerConfig, router, serve};
