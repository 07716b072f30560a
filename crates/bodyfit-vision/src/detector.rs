//! Pose and face collaborators backed by external commands or fixed inputs.
//!
//! Command detectors are invoked as `<command...> --image <path>` and must
//! print one JSON object on stdout. Log lines around the object are ignored.

use std::path::{Path, PathBuf};
use std::process::Command;

use bodyfit_domain::ports::{FaceAttributeEstimator, PoseDetector};
use bodyfit_types::{Error, FaceAttributes, Gender, LandmarkSet, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::extract_json_from_response;

#[derive(Debug, Deserialize)]
struct PoseDetectionOutput {
    detected: bool,
    #[serde(default)]
    landmarks: Option<LandmarkSet>,
}

#[derive(Debug, Deserialize)]
struct FaceDetectionOutput {
    detected: bool,
    #[serde(default)]
    age: Option<f64>,
    #[serde(default)]
    gender: Option<i64>,
}

/// Run `command --image <path>` and parse its stdout as JSON
fn run_detector<T: DeserializeOwned>(command: &str, image_path: &Path) -> Result<T> {
    let mut parts = shell_words::split(command)
        .map_err(|e| Error::Collaborator(format!("invalid detector command '{}': {}", command, e)))?;
    if parts.is_empty() {
        return Err(Error::Collaborator("detector command is empty".to_string()));
    }

    let program = parts.remove(0);
    let mut cmd = Command::new(&program);
    cmd.args(&parts);
    cmd.arg("--image");
    cmd.arg(image_path);

    debug!(program = %program, args = ?parts, image = %image_path.display(), "running detector");

    let output = cmd
        .output()
        .map_err(|e| Error::Collaborator(format!("{} failed to start: {}", program, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Collaborator(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    if stdout.trim().is_empty() {
        return Err(Error::Collaborator(format!("{} produced no output", program)));
    }

    let json_str = extract_json_from_response(stdout.as_ref());
    serde_json::from_str(&json_str)
        .map_err(|e| Error::Collaborator(format!("{} output is not valid JSON: {} - {}", program, e, json_str)))
}

/// Pose detector that shells out to a landmark model
pub struct CommandPoseDetector {
    command: String,
}

impl CommandPoseDetector {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl PoseDetector for CommandPoseDetector {
    fn detect(&self, image_path: &Path) -> Result<Option<LandmarkSet>> {
        let parsed: PoseDetectionOutput = run_detector(&self.command, image_path)?;
        if !parsed.detected {
            debug!("pose detector found no person");
            return Ok(None);
        }
        parsed
            .landmarks
            .map(Some)
            .ok_or_else(|| Error::InvalidLandmarks("detected=true but no landmarks".to_string()))
    }
}

/// Face attribute estimator that shells out to an age/gender model
pub struct CommandFaceEstimator {
    command: String,
}

impl CommandFaceEstimator {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl FaceAttributeEstimator for CommandFaceEstimator {
    fn estimate(&self, image_path: &Path) -> Result<Option<FaceAttributes>> {
        let parsed: FaceDetectionOutput = run_detector(&self.command, image_path)?;
        if !parsed.detected {
            debug!("face estimator found no face");
            return Ok(None);
        }

        let age = parsed
            .age
            .filter(|a| a.is_finite() && *a >= 0.0)
            .ok_or_else(|| Error::Collaborator("face output has no valid age".to_string()))?;
        let gender = parsed
            .gender
            .ok_or_else(|| Error::Collaborator("face output has no gender".to_string()))?;

        Ok(Some(FaceAttributes {
            age: age as u32,
            gender: Gender::from_signal(gender),
        }))
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LandmarkFile {
    Bare(LandmarkSet),
    Wrapped(PoseDetectionOutput),
}

/// Reads precomputed landmarks from a JSON file, ignoring the image.
///
/// Accepts either a bare array of 33 landmarks or the command detector's
/// `{"detected": ..., "landmarks": [...]}` object.
pub struct LandmarkFileDetector {
    path: PathBuf,
}

impl LandmarkFileDetector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PoseDetector for LandmarkFileDetector {
    fn detect(&self, _image_path: &Path) -> Result<Option<LandmarkSet>> {
        if !self.path.exists() {
            return Err(Error::FileNotFound(self.path.display().to_string()));
        }
        let content = std::fs::read_to_string(&self.path)?;
        let parsed: LandmarkFile = serde_json::from_str(&content).map_err(|e| {
            Error::InvalidLandmarks(format!("{}: {}", self.path.display(), e))
        })?;

        match parsed {
            LandmarkFile::Bare(set) => Ok(Some(set)),
            LandmarkFile::Wrapped(output) if output.detected => output
                .landmarks
                .map(Some)
                .ok_or_else(|| Error::InvalidLandmarks("detected=true but no landmarks".to_string())),
            LandmarkFile::Wrapped(_) => Ok(None),
        }
    }
}

/// Face estimator that always returns the same attributes (supplied by the caller)
pub struct FixedFaceAttributes {
    attributes: FaceAttributes,
}

impl FixedFaceAttributes {
    pub fn new(attributes: FaceAttributes) -> Self {
        Self { attributes }
    }
}

impl FaceAttributeEstimator for FixedFaceAttributes {
    fn estimate(&self, _image_path: &Path) -> Result<Option<FaceAttributes>> {
        Ok(Some(self.attributes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bodyfit_types::{Joint, Landmark, LANDMARK_COUNT};
    use std::io::Write;

    fn landmarks_json() -> String {
        let points: Vec<serde_json::Value> = (0..LANDMARK_COUNT)
            .map(|i| serde_json::json!({"x": 0.5, "y": i as f64 / 40.0, "visibility": 0.9}))
            .collect();
        serde_json::to_string(&points).unwrap()
    }

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_landmark_file_bare_array() {
        let file = write_temp(&landmarks_json());
        let detector = LandmarkFileDetector::new(file.path());
        let set = detector.detect(Path::new("ignored.jpg")).unwrap().unwrap();
        assert!((set.get(Joint::LeftAnkle).y - 27.0 / 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_landmark_file_wrapped() {
        let file = write_temp(&format!("{{\"detected\": true, \"landmarks\": {}}}", landmarks_json()));
        let detector = LandmarkFileDetector::new(file.path());
        assert!(detector.detect(Path::new("ignored.jpg")).unwrap().is_some());
    }

    #[test]
    fn test_landmark_file_not_detected() {
        let file = write_temp(r#"{"detected": false}"#);
        let detector = LandmarkFileDetector::new(file.path());
        assert!(detector.detect(Path::new("ignored.jpg")).unwrap().is_none());
    }

    #[test]
    fn test_landmark_file_wrong_count() {
        let file = write_temp(r#"[{"x": 0.1, "y": 0.2, "visibility": 1.0}]"#);
        let detector = LandmarkFileDetector::new(file.path());
        assert!(matches!(
            detector.detect(Path::new("ignored.jpg")),
            Err(Error::InvalidLandmarks(_))
        ));
    }

    #[test]
    fn test_landmark_file_missing() {
        let detector = LandmarkFileDetector::new("/no/such/landmarks.json");
        assert!(matches!(
            detector.detect(Path::new("ignored.jpg")),
            Err(Error::FileNotFound(_))
        ));
    }

    #[test]
    fn test_fixed_face_attributes() {
        let attrs = FaceAttributes {
            age: 40,
            gender: Gender::Male,
        };
        let estimator = FixedFaceAttributes::new(attrs);
        assert_eq!(estimator.estimate(Path::new("x.jpg")).unwrap(), Some(attrs));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_face_estimator_parses_output() {
        // the trailing --image <path> lands in $0 and $1 of the script
        let estimator = CommandFaceEstimator::new(
            r#"sh -c 'echo "model loaded"; echo "{\"detected\": true, \"age\": 27.8, \"gender\": 0}"'"#,
        );
        let attrs = estimator.estimate(Path::new("photo.jpg")).unwrap().unwrap();
        assert_eq!(attrs.age, 27);
        assert_eq!(attrs.gender, Gender::Female);
    }

    #[cfg(unix)]
    #[test]
    fn test_command_face_estimator_no_face() {
        let estimator = CommandFaceEstimator::new(r#"sh -c 'echo "{\"detected\": false}"'"#);
        assert!(estimator.estimate(Path::new("photo.jpg")).unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_pose_detector_failure_is_error() {
        let detector = CommandPoseDetector::new("sh -c 'echo boom >&2; exit 1'");
        assert!(matches!(
            detector.detect(Path::new("photo.jpg")),
            Err(Error::Collaborator(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_pose_detector_empty_output_is_error() {
        let detector = CommandPoseDetector::new("true");
        assert!(matches!(
            detector.detect(Path::new("photo.jpg")),
            Err(Error::Collaborator(_))
        ));
    }
}
