//! Build collaborator trait objects from configuration

use std::path::Path;
use std::time::Duration;

use bodyfit_domain::ports::{FaceAttributeEstimator, PoseDetector, TextEstimator};
use bodyfit_types::{ConfigError, FaceAttributes, Result};
use bodyfit_vision::{
    ChatCompletionsEstimator, CommandEstimator, CommandFaceEstimator, CommandPoseDetector,
    FixedFaceAttributes, LandmarkFileDetector,
};
use tracing::debug;

use crate::config::{Config, EstimatorBackend};

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingSetting(name.to_string()).into())
}

/// Landmark file takes precedence over the configured pose command
pub fn pose_detector(config: &Config, landmarks_file: Option<&Path>) -> Result<Box<dyn PoseDetector>> {
    if let Some(path) = landmarks_file {
        debug!(path = %path.display(), "using landmark file");
        return Ok(Box::new(LandmarkFileDetector::new(path)));
    }
    let command = required(&config.pose_command, "pose_command")?;
    Ok(Box::new(CommandPoseDetector::new(command)))
}

/// Fixed attributes (from the command line) take precedence over the face command
pub fn face_estimator(
    config: &Config,
    fixed: Option<FaceAttributes>,
) -> Result<Box<dyn FaceAttributeEstimator>> {
    if let Some(attributes) = fixed {
        return Ok(Box::new(FixedFaceAttributes::new(attributes)));
    }
    let command = required(&config.face_command, "face_command")?;
    Ok(Box::new(CommandFaceEstimator::new(command)))
}

pub fn text_estimator(config: &Config) -> Result<Box<dyn TextEstimator>> {
    match config.backend {
        EstimatorBackend::Openai => {
            let estimator = ChatCompletionsEstimator::new(
                config.api_base_url.clone(),
                config.api_key()?,
                config.model.clone(),
                Duration::from_secs(config.timeout_secs),
            )?;
            Ok(Box::new(estimator))
        }
        EstimatorBackend::Command => {
            let command = required(&config.estimator_command, "estimator_command")?;
            Ok(Box::new(CommandEstimator::new(command)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bodyfit_types::{Error, Gender};

    #[test]
    fn test_missing_pose_command() {
        let config = Config::default();
        assert!(matches!(
            pose_detector(&config, None),
            Err(Error::Config(ConfigError::MissingSetting(_)))
        ));
    }

    #[test]
    fn test_landmark_file_needs_no_command() {
        let config = Config::default();
        assert!(pose_detector(&config, Some(Path::new("landmarks.json"))).is_ok());
    }

    #[test]
    fn test_fixed_face_needs_no_command() {
        let config = Config::default();
        let fixed = FaceAttributes {
            age: 30,
            gender: Gender::Male,
        };
        assert!(face_estimator(&config, Some(fixed)).is_ok());
        assert!(face_estimator(&config, None).is_err());
    }

    #[test]
    fn test_command_backend_requires_command() {
        let mut config = Config {
            backend: EstimatorBackend::Command,
            ..Config::default()
        };
        assert!(text_estimator(&config).is_err());

        config.estimator_command = Some("cat".to_string());
        assert!(text_estimator(&config).is_ok());
    }
}
