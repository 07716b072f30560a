//! Error types for bodyfit

use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration not found")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing setting: {0}")]
    MissingSetting(String),
}

/// Degenerate geometry that makes pixel-to-centimetre calibration impossible
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    #[error("Shoulder is not below the nose (head span {head_pixel_height:.2}px), cannot calibrate")]
    NonPositiveHeadSpan { head_pixel_height: f64 },

    #[error("Image height must be positive")]
    EmptyImage,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Calibration failed: {0}")]
    Calibration(#[from] CalibrationError),

    #[error("{message}")]
    InputValidation { field: String, message: String },

    #[error("Detection failed: {0}")]
    DetectionFailure(String),

    #[error("Invalid landmarks: {0}")]
    InvalidLandmarks(String),

    #[error("Estimation failed: {0}")]
    Estimation(String),

    #[error("Estimator unavailable: {0}")]
    EstimatorUnavailable(String),

    #[error("Collaborator failed: {0}")]
    Collaborator(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid image format: {0}")]
    InvalidImageFormat(String),
}

impl Error {
    /// Build an input validation error for a named request field
    pub fn missing_field(field: &str, message: &str) -> Self {
        Error::InputValidation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    /// Process exit code for this error (2 for caller mistakes, 1 otherwise)
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InputValidation { .. } | Error::FileNotFound(_) => 2,
            _ => 1,
        }
    }

    /// Message shown to the end user in an error payload
    pub fn user_message(&self) -> String {
        match self {
            Error::InputValidation { message, .. } => message.clone(),
            Error::DetectionFailure(msg) => msg.clone(),
            Error::Estimation(_) => "Failed to extract height/weight from estimator reply".to_string(),
            Error::EstimatorUnavailable(_) => "Weight estimation failed".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_validation_exit_code() {
        let err = Error::missing_field("user_id", "The user-id is missing!");
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.user_message(), "The user-id is missing!");
    }

    #[test]
    fn test_estimation_message_hides_reply() {
        let err = Error::Estimation("raw reply: height: 178cm".to_string());
        assert_eq!(err.exit_code(), 1);
        assert!(!err.user_message().contains("178"));
    }

    #[test]
    fn test_calibration_converts() {
        let err: Error = CalibrationError::NonPositiveHeadSpan { head_pixel_height: 0.0 }.into();
        assert!(matches!(err, Error::Calibration(_)));
    }
}
