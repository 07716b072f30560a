//! Photo quality gate
//!
//! Classifies one landmark snapshot into a single [`Verdict`]. Rules run in a
//! fixed order and the first one that fires decides the outcome, so the caller
//! always gets the most actionable reason instead of a list of violations.
//!
//! Order:
//! 1. no landmarks detected
//! 2. brightness
//! 3. lower body cropped (hips hidden, shoulders visible)
//! 4. camera too close (body ratio)
//! 5. bend at the hip
//! 6. key joints not visible
//! 7. sitting / inverted pose
//! 8. shoulders not level

use bodyfit_types::{Joint, LandmarkSet, Retry, Status, Verdict};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::{body_ratio, hip_bend_angle, pair_visibility};

/// Tunable thresholds for every rule.
///
/// Defaults are empirically tuned values; keep them in config rather than
/// hard-coding new ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityThresholds {
    /// Mean grayscale brightness below this is too dark
    pub brightness_min: f64,
    /// Mean grayscale brightness above this is too bright
    pub brightness_max: f64,
    /// Hip-pair visibility below this counts as cropped lower body...
    pub cropped_hip_visibility: f64,
    /// ...when shoulder-pair visibility is above this
    pub cropped_shoulder_visibility: f64,
    /// Body ratio above this means the camera is too close
    pub max_body_ratio: f64,
    /// Hip angles at or above this are upright
    pub upright_angle: f64,
    /// Below this a bend is a warning rather than a note
    pub mild_bend_angle: f64,
    /// Below this a bend is an error
    pub severe_bend_angle: f64,
    /// Minimum visibility for nose, left shoulder and both ankles
    pub core_visibility: f64,
    /// Minimum visibility for right shoulder and right wrist
    pub upper_right_visibility: f64,
    /// Maximum normalized height difference between the shoulders
    pub shoulder_level_tolerance: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            brightness_min: 50.0,
            brightness_max: 200.0,
            cropped_hip_visibility: 0.3,
            cropped_shoulder_visibility: 0.5,
            max_body_ratio: 9.1,
            upright_angle: 171.0,
            mild_bend_angle: 150.0,
            severe_bend_angle: 130.0,
            core_visibility: 0.45,
            upper_right_visibility: 0.5,
            shoulder_level_tolerance: 0.05,
        }
    }
}

/// Inputs shared by every rule
pub struct GateContext<'a> {
    pub landmarks: &'a LandmarkSet,
    pub brightness: f64,
    pub thresholds: &'a QualityThresholds,
}

/// A named rule: returns a verdict when it fires
pub struct Rule {
    pub name: &'static str,
    pub check: fn(&GateContext<'_>) -> Option<Verdict>,
}

/// Rules after detection, in priority order
pub const RULES: &[Rule] = &[
    Rule { name: "brightness", check: check_brightness },
    Rule { name: "full_body", check: check_full_body },
    Rule { name: "camera_distance", check: check_camera_distance },
    Rule { name: "hip_bend", check: check_hip_bend },
    Rule { name: "visibility", check: check_visibility },
    Rule { name: "sitting", check: check_sitting },
    Rule { name: "shoulder_level", check: check_shoulder_level },
];

/// Run the gate. `landmarks` is `None` when the detector found nobody.
pub fn evaluate(
    landmarks: Option<&LandmarkSet>,
    brightness: f64,
    thresholds: &QualityThresholds,
) -> Verdict {
    let Some(landmarks) = landmarks else {
        debug!(rule = "detection", "no landmarks detected");
        return Verdict::new(Status::Error, "could not find a face!", Retry::Yes);
    };

    let ctx = GateContext {
        landmarks,
        brightness,
        thresholds,
    };

    for rule in RULES {
        if let Some(verdict) = (rule.check)(&ctx) {
            debug!(rule = rule.name, status = verdict.status.label(), "quality rule fired");
            return verdict;
        }
    }

    Verdict::new(Status::Success, "Image satisfies all the requirements", Retry::No)
}

/// Map a hip angle onto the bend bands. NaN (degenerate pose) never fires.
pub fn classify_bend(angle: f64, thresholds: &QualityThresholds) -> Option<Verdict> {
    if angle < thresholds.severe_bend_angle {
        Some(Verdict::new(
            Status::Error,
            "You seem too bent, this will lead to an inaccurate height prediction!",
            Retry::Yes,
        ))
    } else if angle < thresholds.mild_bend_angle {
        Some(Verdict::new(
            Status::Warning,
            "You seem slightly bent, this could lead to an inaccurate height prediction!",
            Retry::Optional,
        ))
    } else if angle < thresholds.upright_angle {
        Some(Verdict::new(
            Status::Note,
            "You seem a little bent, this could lead to a minor inaccuracy in the height prediction!",
            Retry::Optional,
        ))
    } else {
        None
    }
}

fn check_brightness(ctx: &GateContext<'_>) -> Option<Verdict> {
    let t = ctx.thresholds;
    if ctx.brightness < t.brightness_min || ctx.brightness > t.brightness_max {
        return Some(Verdict::new(
            Status::Note,
            "The image is either too bright or too dark!",
            Retry::Optional,
        ));
    }
    None
}

fn check_full_body(ctx: &GateContext<'_>) -> Option<Verdict> {
    let t = ctx.thresholds;
    let hip_vis = pair_visibility(ctx.landmarks, Joint::LeftHip, Joint::RightHip);
    let shoulder_vis = pair_visibility(ctx.landmarks, Joint::LeftShoulder, Joint::RightShoulder);
    if hip_vis < t.cropped_hip_visibility && shoulder_vis > t.cropped_shoulder_visibility {
        return Some(Verdict::new(
            Status::Error,
            "please upload full body image!",
            Retry::Yes,
        ));
    }
    None
}

fn check_camera_distance(ctx: &GateContext<'_>) -> Option<Verdict> {
    if body_ratio(ctx.landmarks) > ctx.thresholds.max_body_ratio {
        return Some(Verdict::new(
            Status::Warning,
            "The image seems to be a little too close!",
            Retry::Optional,
        ));
    }
    None
}

fn check_hip_bend(ctx: &GateContext<'_>) -> Option<Verdict> {
    classify_bend(hip_bend_angle(ctx.landmarks), ctx.thresholds)
}

fn check_visibility(ctx: &GateContext<'_>) -> Option<Verdict> {
    let t = ctx.thresholds;
    let required = [
        (Joint::Nose, t.core_visibility),
        (Joint::LeftShoulder, t.core_visibility),
        (Joint::LeftAnkle, t.core_visibility),
        (Joint::RightAnkle, t.core_visibility),
        (Joint::RightShoulder, t.upper_right_visibility),
        (Joint::RightWrist, t.upper_right_visibility),
    ];

    required
        .iter()
        .find(|(joint, min)| ctx.landmarks.get(*joint).visibility < *min)
        .map(|(joint, _)| {
            Verdict::new(
                Status::Error,
                format!(
                    "the image seems incomplete! The {} is not clearly visible.",
                    joint.label()
                ),
                Retry::Yes,
            )
        })
}

fn check_sitting(ctx: &GateContext<'_>) -> Option<Verdict> {
    let shoulder_y = ctx.landmarks.get(Joint::LeftShoulder).y;
    let knee_y = ctx.landmarks.get(Joint::LeftKnee).y;
    let ankle_y = ctx.landmarks.get(Joint::LeftAnkle).y;
    if shoulder_y > knee_y || shoulder_y > ankle_y {
        return Some(Verdict::new(
            Status::Error,
            "you seem to have a sitting position. This could lead to inaccurate results!",
            Retry::Yes,
        ));
    }
    None
}

fn check_shoulder_level(ctx: &GateContext<'_>) -> Option<Verdict> {
    let left = ctx.landmarks.get(Joint::LeftShoulder).y;
    let right = ctx.landmarks.get(Joint::RightShoulder).y;
    if (left - right).abs() > ctx.thresholds.shoulder_level_tolerance {
        return Some(Verdict::new(
            Status::Error,
            "you seem to have a little bend position. This could lead to inaccurate results!",
            Retry::Yes,
        ));
    }
    None
}
