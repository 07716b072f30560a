//! Collaborator trait definitions
//!
//! Implementations are constructed once at startup and shared read-only
//! between requests, hence the `Send + Sync` bounds.

use std::path::Path;

use bodyfit_types::{FaceAttributes, LandmarkSet, Result};

/// Pose landmark detector
pub trait PoseDetector: Send + Sync {
    /// Detect body landmarks. `Ok(None)` means no person was found.
    fn detect(&self, image_path: &Path) -> Result<Option<LandmarkSet>>;
}

/// Face attribute estimator (apparent age and gender)
pub trait FaceAttributeEstimator: Send + Sync {
    /// Estimate face attributes. `Ok(None)` means no face was found.
    fn estimate(&self, image_path: &Path) -> Result<Option<FaceAttributes>>;
}

/// Generative text estimator used to refine height and weight
pub trait TextEstimator: Send + Sync {
    /// Send a prompt and return the raw text reply
    fn refine(&self, prompt: &str) -> Result<String>;
}
