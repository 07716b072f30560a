//! Geometry helpers over normalized landmark coordinates

use bodyfit_types::{Joint, Landmark, LandmarkSet};

/// Convert a normalized coordinate to pixels along an image axis
pub fn to_pixels(normalized: f64, extent: u32) -> f64 {
    normalized * extent as f64
}

/// Mean visibility of a joint pair
pub fn pair_visibility(set: &LandmarkSet, a: Joint, b: Joint) -> f64 {
    (set.get(a).visibility + set.get(b).visibility) / 2.0
}

/// Horizontal normalized separation of a joint pair
pub fn horizontal_span(set: &LandmarkSet, a: Joint, b: Joint) -> f64 {
    (set.get(a).x - set.get(b).x).abs()
}

/// Nose-to-ankle span divided by nose-to-shoulder span.
///
/// Ratios are unit free, so normalized coordinates give the same value as pixels.
/// A shoulder level with the nose yields an infinite (or NaN) ratio.
pub fn body_ratio(set: &LandmarkSet) -> f64 {
    let nose_y = set.get(Joint::Nose).y;
    let ankle_y = set.get(Joint::LeftAnkle).y;
    let shoulder_y = set.get(Joint::LeftShoulder).y;
    (ankle_y - nose_y) / (shoulder_y - nose_y)
}

/// Interior angle at `vertex` between the rays towards `a` and `c`, in degrees.
///
/// The cosine is clamped to [-1, 1] before `acos`. A zero-length ray gives NaN.
pub fn interior_angle(a: Landmark, vertex: Landmark, c: Landmark) -> f64 {
    let v1 = (a.x - vertex.x, a.y - vertex.y);
    let v2 = (c.x - vertex.x, c.y - vertex.y);
    let dot = v1.0 * v2.0 + v1.1 * v2.1;
    let norms = (v1.0.powi(2) + v1.1.powi(2)).sqrt() * (v2.0.powi(2) + v2.1.powi(2)).sqrt();
    let cos_theta = (dot / norms).clamp(-1.0, 1.0);
    cos_theta.acos().to_degrees()
}

/// Bend at the left hip between the shoulder-hip and knee-hip vectors (180 = upright)
pub fn hip_bend_angle(set: &LandmarkSet) -> f64 {
    interior_angle(
        set.get(Joint::LeftShoulder),
        set.get(Joint::LeftHip),
        set.get(Joint::LeftKnee),
    )
}
