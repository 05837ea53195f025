use std::sync::Arc;

use crate::detect::Detector;

/// Shared state for the axum handlers.
///
/// The detector is constructed once before serving and only read afterwards.
#[derive(Clone)]
pub struct AppState {
    pub detector: Arc<dyn Detector>,
}

impl AppState {
    pub fn new(detector: Arc<dyn Detector>) -> Self {
        Self { detector }
    }
}
