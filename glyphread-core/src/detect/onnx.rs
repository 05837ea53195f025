use std::{
    path::Path,
    sync::{Mutex, MutexGuard, PoisonError},
};

use image::DynamicImage;
use tracing::*;

use crate::{
    analysis::labels::LabelSet,
    detect::{DetectionSet, Detector},
    error::GlyphError,
    inference::{
        model::session_builder,
        yolo::{Yolo, YoloConfig, YoloSession},
    },
};

/// YOLO detector backed by ONNX Runtime.
///
/// The session needs exclusive access to run, so concurrent requests take turns on the mutex.
pub struct OnnxDetector {
    session: Mutex<YoloSession<Yolo>>,
}

impl OnnxDetector {
    /// Loads the model at `model_path` and runs a warm-up frame through it.
    ///
    /// Any failure here is meant to stop the process before it starts serving.
    pub fn load<P: AsRef<Path>>(
        model_path: P,
        labels_path: Option<&Path>,
        config: YoloConfig,
    ) -> Result<Self, GlyphError> {
        let model_path = model_path.as_ref();
        info!("Loading detector from {}", model_path.display());

        let model = Yolo::from_path(model_path, config)?;
        let labels = labels_path.map(LabelSet::from_file).transpose()?;

        let mut session = YoloSession::new(session_builder()?, model, labels)?;
        session.warm_up()?;

        info!(labels = session.labels().len(), "Detector ready");

        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl Detector for OnnxDetector {
    fn detect(&self, batch: &[DynamicImage]) -> Result<Vec<DetectionSet>, GlyphError> {
        let mut session = lock_session(&self.session);

        batch.iter().map(|image| session.detect(image)).collect()
    }
}

/// Takes the session even if an earlier request panicked while holding it.
///
/// A run holds no state across calls, so the next request starts clean.
fn lock_session<T>(session: &Mutex<T>) -> MutexGuard<'_, T> {
    session.lock().unwrap_or_else(|poisoned| {
        warn!("Recovering inference session after a panicked request");
        session.clear_poison();
        PoisonError::into_inner(poisoned)
    })
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;

    #[test]
    fn test_lock_survives_panicked_holder() {
        let session = Arc::new(Mutex::new(0_u32));

        let holder = session.clone();
        let result = thread::spawn(move || {
            let _guard = holder.lock().unwrap();
            panic!("inference panicked");
        })
        .join();
        assert!(result.is_err());
        assert!(session.is_poisoned());

        *lock_session(&session) += 1;
        assert!(!session.is_poisoned());
        assert_eq!(*lock_session(&session), 1);
    }
}
