//! Use cases: measurement, verification and geometry inspection

pub mod collaborators;
pub mod measurement_service;
pub mod verification_service;

pub use collaborators::{face_estimator, pose_detector, text_estimator};
pub use measurement_service::{derive_geometry, MeasureRequest, MeasurementService};
pub use verification_service::VerificationService;

use bodyfit_types::{Error, ErrorPayload};
use thiserror::Error;

/// Errors returned by the application services
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The caller sent something unusable (missing field, missing or bad file)
    #[error("Invalid request: {0}")]
    InvalidRequest(Error),

    /// A detector found no person or no face
    #[error("{0}")]
    NotDetected(Error),

    /// Landmarks were found but the geometry is degenerate
    #[error("{0}")]
    Calibration(Error),

    /// The estimator could not be reached or its reply was unusable
    #[error("{0}")]
    Estimation(Error),

    #[error("{0}")]
    Pipeline(Error),
}

impl From<Error> for ServiceError {
    fn from(err: Error) -> Self {
        match err {
            Error::InputValidation { .. }
            | Error::FileNotFound(_)
            | Error::InvalidImageFormat(_)
            | Error::Image(_) => ServiceError::InvalidRequest(err),
            Error::DetectionFailure(_) => ServiceError::NotDetected(err),
            Error::Calibration(_) => ServiceError::Calibration(err),
            Error::Estimation(_) | Error::EstimatorUnavailable(_) => ServiceError::Estimation(err),
            _ => ServiceError::Pipeline(err),
        }
    }
}

impl ServiceError {
    pub fn inner(&self) -> &Error {
        match self {
            ServiceError::InvalidRequest(e)
            | ServiceError::NotDetected(e)
            | ServiceError::Calibration(e)
            | ServiceError::Estimation(e)
            | ServiceError::Pipeline(e) => e,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            ServiceError::InvalidRequest(_) => 2,
            other => other.inner().exit_code(),
        }
    }

    /// `{status: "error", message}` body for this failure
    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload::from_error(self.inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bodyfit_types::CalibrationError;

    #[test]
    fn test_error_classification() {
        let err: ServiceError = Error::missing_field("image", "The image is missing!").into();
        assert!(matches!(err, ServiceError::InvalidRequest(_)));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.payload().message, "The image is missing!");

        let err: ServiceError = Error::from(CalibrationError::EmptyImage).into();
        assert!(matches!(err, ServiceError::Calibration(_)));
        assert_eq!(err.exit_code(), 1);

        let err: ServiceError = Error::EstimatorUnavailable("timeout".to_string()).into();
        assert!(matches!(err, ServiceError::Estimation(_)));
        assert_eq!(err.payload().message, "Weight estimation failed");
    }

    #[test]
    fn test_malformed_image_is_invalid_request() {
        let err: ServiceError = Error::InvalidImageFormat("x.jpg: bad header".to_string()).into();
        assert_eq!(err.exit_code(), 2);
    }
}
