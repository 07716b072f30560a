//! Verification Service - is this photo good enough to measure from?

use std::path::Path;

use bodyfit_domain::ports::PoseDetector;
use bodyfit_domain::service::{evaluate, QualityThresholds};
use bodyfit_types::Verdict;
use bodyfit_vision::{load_image, DEFAULT_MAX_DIMENSION};
use tracing::info;

use super::ServiceError;
use crate::scanner::validate_image;

pub struct VerificationService {
    pose: Box<dyn PoseDetector>,
    thresholds: QualityThresholds,
    max_dimension: u32,
}

impl VerificationService {
    pub fn new(pose: Box<dyn PoseDetector>) -> Self {
        Self {
            pose,
            thresholds: QualityThresholds::default(),
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }

    pub fn with_thresholds(mut self, thresholds: QualityThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    /// Decode, downscale, detect and run the quality gate.
    ///
    /// Bad photos come back as a verdict; only unreadable files and detector
    /// faults are errors.
    pub fn verify(&self, image_path: &Path) -> Result<Verdict, ServiceError> {
        validate_image(image_path)?;

        let prepared = load_image(image_path, Some(self.max_dimension))?;
        let brightness = prepared.brightness();
        let scratch = prepared.persist_temp("verify")?;

        let landmarks = self.pose.detect(scratch.path())?;
        let verdict = evaluate(landmarks.as_ref(), brightness, &self.thresholds);

        info!(
            image = %image_path.display(),
            status = verdict.status.label(),
            brightness,
            "verification complete"
        );
        Ok(verdict)
    }
}
