//! Measurement Service - age, gender, height and weight from one photo
//!
//! Workflow:
//! 1. Validate the request (image and user id present)
//! 2. Decode the image and write a scratch copy for the detectors
//! 3. Face attributes, then pose landmarks
//! 4. Calibrate and derive geometric measurements
//! 5. Ask the text estimator to refine height and weight
//! 6. Parse the reply and round to two decimals
//!
//! The scratch copy is removed when the request finishes, whatever the outcome.

use std::path::{Path, PathBuf};

use bodyfit_domain::ports::{FaceAttributeEstimator, PoseDetector, TextEstimator};
use bodyfit_domain::service::CalibrationEngine;
use bodyfit_types::{DerivedMeasurements, Error, MeasurementResult};
use bodyfit_vision::{build_measurement_prompt, load_image, parse_estimator_reply, PromptContext};
use tracing::{debug, info};

use super::ServiceError;
use crate::scanner::validate_image;

pub const MISSING_IMAGE: &str = "The image is missing!";
pub const MISSING_USER_ID: &str = "The user-id is missing!";
pub const NO_FACE: &str = "No face detected in the image";
pub const NO_LANDMARKS: &str = "No landmarks found please try again!";

/// One measurement request
#[derive(Debug, Clone, Default)]
pub struct MeasureRequest {
    pub image_path: Option<PathBuf>,
    pub user_id: Option<String>,
    /// Free-text warning from an earlier verification, forwarded to the estimator
    pub warning: Option<String>,
}

impl MeasureRequest {
    pub fn new(image_path: impl Into<PathBuf>, user_id: impl Into<String>) -> Self {
        Self {
            image_path: Some(image_path.into()),
            user_id: Some(user_id.into()),
            warning: None,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    /// Image is checked before user id
    pub fn validate(&self) -> Result<(&Path, &str), Error> {
        let image = self
            .image_path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| Error::missing_field("image", MISSING_IMAGE))?;
        let user_id = self
            .user_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| Error::missing_field("user_id", MISSING_USER_ID))?;
        Ok((image, user_id))
    }
}

pub struct MeasurementService {
    face: Box<dyn FaceAttributeEstimator>,
    pose: Box<dyn PoseDetector>,
    estimator: Box<dyn TextEstimator>,
    engine: CalibrationEngine,
}

impl MeasurementService {
    pub fn new(
        face: Box<dyn FaceAttributeEstimator>,
        pose: Box<dyn PoseDetector>,
        estimator: Box<dyn TextEstimator>,
    ) -> Self {
        Self {
            face,
            pose,
            estimator,
            engine: CalibrationEngine::default(),
        }
    }

    pub fn with_engine(mut self, engine: CalibrationEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn measure(&self, request: &MeasureRequest) -> Result<MeasurementResult, ServiceError> {
        let (image_path, user_id) = request.validate()?;
        validate_image(image_path)?;

        let prepared = load_image(image_path, None)?;
        let metadata = prepared.metadata();
        let scratch = prepared.persist_temp(user_id)?;
        debug!(user_id, scratch = %scratch.path().display(), "prepared scratch image");

        let face = self
            .face
            .estimate(scratch.path())?
            .ok_or_else(|| Error::DetectionFailure(NO_FACE.to_string()))?;

        let landmarks = self
            .pose
            .detect(scratch.path())?
            .ok_or_else(|| Error::DetectionFailure(NO_LANDMARKS.to_string()))?;

        let measurements = self.engine.measure(&landmarks, &metadata).map_err(Error::from)?;
        debug!(
            height_cm = measurements.height_cm,
            shoulder_width_m = measurements.shoulder_width_m,
            "geometric measurements"
        );

        let prompt = build_measurement_prompt(&PromptContext {
            face,
            measurements,
            image_height: metadata.pixel_height,
            warning: request.warning.clone(),
        });

        let reply = self.estimator.refine(&prompt)?;
        let body = parse_estimator_reply(&reply)?;

        let result = MeasurementResult {
            age: face.age,
            gender: face.gender,
            height_cm: round2(body.height_cm),
            weight: round2(body.weight_kg),
        };
        info!(user_id, height_cm = result.height_cm, weight = result.weight, "measurement complete");

        Ok(result)
    }
}

/// Detect landmarks on `image_path` and derive the measurement set
pub fn derive_geometry(
    pose: &dyn PoseDetector,
    engine: &CalibrationEngine,
    image_path: &Path,
) -> Result<DerivedMeasurements, ServiceError> {
    validate_image(image_path)?;
    let prepared = load_image(image_path, None)?;
    let scratch = prepared.persist_temp("geometry")?;

    let landmarks = pose
        .detect(scratch.path())?
        .ok_or_else(|| Error::DetectionFailure(NO_LANDMARKS.to_string()))?;

    Ok(engine.measure(&landmarks, &prepared.metadata()).map_err(Error::from)?)
}

/// Two decimals, exact ties to even
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
