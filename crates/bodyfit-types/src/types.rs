//! Core types for landmark-driven body measurement

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Number of landmarks produced by the pose model (full-body topology)
pub const LANDMARK_COUNT: usize = 33;

/// Named body joints used by the measurement and verification pipelines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    Nose,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Joint {
    /// Every named joint, in landmark index order
    pub const ALL: [Joint; 13] = [
        Joint::Nose,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
    ];

    /// Position of this joint in the detector's landmark array
    pub fn index(self) -> usize {
        match self {
            Joint::Nose => 0,
            Joint::LeftShoulder => 11,
            Joint::RightShoulder => 12,
            Joint::LeftElbow => 13,
            Joint::RightElbow => 14,
            Joint::LeftWrist => 15,
            Joint::RightWrist => 16,
            Joint::LeftHip => 23,
            Joint::RightHip => 24,
            Joint::LeftKnee => 25,
            Joint::RightKnee => 26,
            Joint::LeftAnkle => 27,
            Joint::RightAnkle => 28,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Joint::Nose => "nose",
            Joint::LeftShoulder => "left shoulder",
            Joint::RightShoulder => "right shoulder",
            Joint::LeftElbow => "left elbow",
            Joint::RightElbow => "right elbow",
            Joint::LeftWrist => "left wrist",
            Joint::RightWrist => "right wrist",
            Joint::LeftHip => "left hip",
            Joint::RightHip => "right hip",
            Joint::LeftKnee => "left knee",
            Joint::RightKnee => "right knee",
            Joint::LeftAnkle => "left ankle",
            Joint::RightAnkle => "right ankle",
        }
    }
}

/// A detected keypoint: normalized position (origin top-left, y down) and visibility
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub visibility: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, visibility: f64) -> Self {
        Self { x, y, visibility }
    }
}

/// Fixed-length landmark snapshot for a single image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Landmark>", into = "Vec<Landmark>")]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    /// A set where every landmark has the same value (useful as a base to edit)
    pub fn filled(landmark: Landmark) -> Self {
        Self {
            points: vec![landmark; LANDMARK_COUNT],
        }
    }

    pub fn get(&self, joint: Joint) -> Landmark {
        self.points[joint.index()]
    }

    pub fn set(&mut self, joint: Joint, landmark: Landmark) {
        self.points[joint.index()] = landmark;
    }

    pub fn with(mut self, joint: Joint, landmark: Landmark) -> Self {
        self.set(joint, landmark);
        self
    }
}

impl TryFrom<Vec<Landmark>> for LandmarkSet {
    type Error = Error;

    fn try_from(points: Vec<Landmark>) -> Result<Self, Self::Error> {
        if points.len() != LANDMARK_COUNT {
            return Err(Error::InvalidLandmarks(format!(
                "expected {} landmarks, got {}",
                LANDMARK_COUNT,
                points.len()
            )));
        }
        Ok(Self { points })
    }
}

impl From<LandmarkSet> for Vec<Landmark> {
    fn from(set: LandmarkSet) -> Self {
        set.points
    }
}

/// Pixel dimensions of the decoded source image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub pixel_width: u32,
    pub pixel_height: u32,
}

impl ImageMetadata {
    pub fn new(pixel_width: u32, pixel_height: u32) -> Self {
        Self {
            pixel_width,
            pixel_height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Interpret the face model's binary signal (0 = female, anything else = male)
    pub fn from_signal(signal: i64) -> Self {
        if signal == 0 {
            Gender::Female
        } else {
            Gender::Male
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            other => Err(format!("unknown gender '{}' (expected male or female)", other)),
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Apparent age and gender from the face estimator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceAttributes {
    pub age: u32,
    pub gender: Gender,
}

/// Geometric quantities derived from one landmark snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedMeasurements {
    pub height_cm: f64,
    pub shoulder_width_m: f64,
    pub hip_width_m: f64,
    pub ankle_width_m: f64,
    pub body_ratio: f64,
    pub bend_angle_degrees: f64,
    /// Vertical nose-to-ankle span in pixels
    pub nose_to_ankle_px: f64,
}

/// Verdict severity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Note,
    Warning,
    Error,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::Note => "note",
            Status::Warning => "warning",
            Status::Error => "error",
        }
    }
}

/// Whether the user should retake the photo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Retry {
    Yes,
    No,
    Optional,
}

impl Retry {
    pub fn label(&self) -> &'static str {
        match self {
            Retry::Yes => "yes",
            Retry::No => "no",
            Retry::Optional => "optional",
        }
    }
}

/// Outcome of the photo quality gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub status: Status,
    pub reason: String,
    pub retry: Retry,
}

impl Verdict {
    pub fn new(status: Status, reason: impl Into<String>, retry: Retry) -> Self {
        Self {
            status,
            reason: reason.into(),
            retry,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// Final measurement returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementResult {
    pub age: u32,
    pub gender: Gender,
    pub height_cm: f64,
    /// Weight in kilograms
    pub weight: f64,
}

/// Error body returned instead of a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub status: Status,
    pub message: String,
}

impl ErrorPayload {
    pub fn from_error(err: &Error) -> Self {
        Self {
            status: Status::Error,
            message: err.user_message(),
        }
    }
}

/// One verified image in a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationEntry {
    pub image_path: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub verdict: Option<Verdict>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Batch verification report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    pub entries: Vec<VerificationEntry>,
    pub total_processed: usize,
    /// Images whose verdict is `success`
    pub passed: usize,
    /// Images that produced a non-success verdict
    pub rejected: usize,
    /// Images that could not be verified at all
    pub failed: usize,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

impl BatchResults {
    /// Number of entries whose verdict has the given status
    pub fn count_status(&self, status: Status) -> usize {
        self.entries
            .iter()
            .filter(|e| e.verdict.as_ref().map(|v| v.status) == Some(status))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_indices_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for joint in Joint::ALL {
            assert!(joint.index() < LANDMARK_COUNT);
            assert!(seen.insert(joint.index()), "duplicate index for {:?}", joint);
        }
    }

    #[test]
    fn test_landmark_set_rejects_wrong_length() {
        let result = LandmarkSet::try_from(vec![Landmark::default(); 12]);
        assert!(matches!(result, Err(Error::InvalidLandmarks(_))));
    }

    #[test]
    fn test_landmark_set_deserialize() {
        let points: Vec<serde_json::Value> = (0..LANDMARK_COUNT)
            .map(|i| serde_json::json!({"x": i as f64 / 100.0, "y": 0.5, "visibility": 0.9}))
            .collect();
        let set: LandmarkSet = serde_json::from_value(serde_json::Value::Array(points)).unwrap();
        assert!((set.get(Joint::LeftShoulder).x - 0.11).abs() < 1e-9);
        assert!((set.get(Joint::RightAnkle).x - 0.28).abs() < 1e-9);
    }

    #[test]
    fn test_landmark_set_deserialize_short_array_fails() {
        let json = r#"[{"x": 0.1, "y": 0.2, "visibility": 1.0}]"#;
        assert!(serde_json::from_str::<LandmarkSet>(json).is_err());
    }

    #[test]
    fn test_gender_signal() {
        assert_eq!(Gender::from_signal(0), Gender::Female);
        assert_eq!(Gender::from_signal(1), Gender::Male);
        assert_eq!("Female".parse::<Gender>().unwrap(), Gender::Female);
        assert!("x".parse::<Gender>().is_err());
    }

    #[test]
    fn test_verdict_serializes_lowercase() {
        let verdict = Verdict::new(Status::Warning, "too close", Retry::Optional);
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["status"], "warning");
        assert_eq!(json["retry"], "optional");
    }

    #[test]
    fn test_measurement_result_field_names() {
        let result = MeasurementResult {
            age: 30,
            gender: Gender::Male,
            height_cm: 178.5,
            weight: 72.2,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["gender"], "male");
        assert_eq!(json["weight"], 72.2);
    }

    #[test]
    fn test_status_severity_order() {
        assert!(Status::Success < Status::Note);
        assert!(Status::Note < Status::Warning);
        assert!(Status::Warning < Status::Error);
    }
}
