//! Pixel-to-centimetre calibration and body measurements
//!
//! The only physical scale reference is an assumed nose-to-shoulder length.
//! Everything else is measured relative to it, so the subject is expected to
//! stand upright and face the camera (checked by the quality gate, not here).

use bodyfit_types::{CalibrationError, DerivedMeasurements, ImageMetadata, Joint, LandmarkSet};

use crate::geometry::{body_ratio, hip_bend_angle, horizontal_span, to_pixels};

/// Average nose-to-shoulder span used as the scale reference (cm)
pub const HEAD_LENGTH_CM: f64 = 20.5;

/// Scale derived from one landmark snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub scale_cm_per_pixel: f64,
    /// Vertical nose-to-ankle span in pixels
    pub nose_to_ankle_px: f64,
    /// Geometric stature estimate
    pub height_cm: f64,
}

impl Calibration {
    pub fn height_m(&self) -> f64 {
        self.height_cm / 100.0
    }

    /// Width of a joint pair in metres.
    ///
    /// The normalized horizontal separation is scaled by the subject's own
    /// height, not by the image width, so camera zoom cancels out.
    pub fn pair_width_m(&self, set: &LandmarkSet, left: Joint, right: Joint) -> f64 {
        horizontal_span(set, left, right) * self.height_m()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationEngine {
    head_length_cm: f64,
}

impl Default for CalibrationEngine {
    fn default() -> Self {
        Self::new(HEAD_LENGTH_CM)
    }
}

impl CalibrationEngine {
    pub fn new(head_length_cm: f64) -> Self {
        Self { head_length_cm }
    }

    /// Compute the cm-per-pixel scale and the geometric height
    pub fn calibrate(
        &self,
        set: &LandmarkSet,
        meta: &ImageMetadata,
    ) -> Result<Calibration, CalibrationError> {
        if meta.pixel_height == 0 {
            return Err(CalibrationError::EmptyImage);
        }

        let nose_y_px = to_pixels(set.get(Joint::Nose).y, meta.pixel_height);
        let shoulder_y_px = to_pixels(set.get(Joint::LeftShoulder).y, meta.pixel_height);
        let ankle_y_px = to_pixels(set.get(Joint::LeftAnkle).y, meta.pixel_height);

        let head_pixel_height = shoulder_y_px - nose_y_px;
        // NaN must fail here too, hence no `<=` shortcut
        if !(head_pixel_height > 0.0) {
            return Err(CalibrationError::NonPositiveHeadSpan { head_pixel_height });
        }

        let scale_cm_per_pixel = self.head_length_cm / head_pixel_height;
        let nose_to_ankle_px = ankle_y_px - nose_y_px;

        Ok(Calibration {
            scale_cm_per_pixel,
            nose_to_ankle_px,
            height_cm: nose_to_ankle_px * scale_cm_per_pixel,
        })
    }

    /// Full derived measurement set for one snapshot
    pub fn measure(
        &self,
        set: &LandmarkSet,
        meta: &ImageMetadata,
    ) -> Result<DerivedMeasurements, CalibrationError> {
        let calibration = self.calibrate(set, meta)?;

        Ok(DerivedMeasurements {
            height_cm: calibration.height_cm,
            shoulder_width_m: calibration.pair_width_m(set, Joint::LeftShoulder, Joint::RightShoulder),
            hip_width_m: calibration.pair_width_m(set, Joint::LeftHip, Joint::RightHip),
            ankle_width_m: calibration.pair_width_m(set, Joint::LeftAnkle, Joint::RightAnkle),
            body_ratio: body_ratio(set),
            bend_angle_degrees: hip_bend_angle(set),
            nose_to_ankle_px: calibration.nose_to_ankle_px,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bodyfit_types::Landmark;

    fn standing(nose_y: f64, shoulder_y: f64, ankle_y: f64) -> LandmarkSet {
        LandmarkSet::filled(Landmark::new(0.5, 0.5, 1.0))
            .with(Joint::Nose, Landmark::new(0.5, nose_y, 1.0))
            .with(Joint::LeftShoulder, Landmark::new(0.6, shoulder_y, 1.0))
            .with(Joint::RightShoulder, Landmark::new(0.4, shoulder_y, 1.0))
            .with(Joint::LeftHip, Landmark::new(0.55, 0.5, 1.0))
            .with(Joint::RightHip, Landmark::new(0.45, 0.5, 1.0))
            .with(Joint::LeftKnee, Landmark::new(0.55, 0.7, 1.0))
            .with(Joint::LeftAnkle, Landmark::new(0.54, ankle_y, 1.0))
            .with(Joint::RightAnkle, Landmark::new(0.46, ankle_y, 1.0))
    }

    #[test]
    fn test_calibrate_reference_values() {
        let engine = CalibrationEngine::default();
        let meta = ImageMetadata::new(600, 1000);
        let cal = engine.calibrate(&standing(0.1, 0.2, 0.9), &meta).unwrap();
        assert!((cal.scale_cm_per_pixel - 0.205).abs() < 1e-9);
        assert!((cal.nose_to_ankle_px - 800.0).abs() < 1e-9);
        assert!((cal.height_cm - 164.0).abs() < 1e-9);
    }

    #[test]
    fn test_shoulder_level_with_nose_fails() {
        let engine = CalibrationEngine::default();
        let meta = ImageMetadata::new(600, 1000);
        let err = engine.calibrate(&standing(0.3, 0.3, 0.9), &meta).unwrap_err();
        assert!(matches!(err, CalibrationError::NonPositiveHeadSpan { .. }));
    }

    #[test]
    fn test_shoulder_above_nose_fails() {
        let engine = CalibrationEngine::default();
        let meta = ImageMetadata::new(600, 1000);
        assert!(engine.calibrate(&standing(0.3, 0.25, 0.9), &meta).is_err());
    }

    #[test]
    fn test_zero_height_image_fails() {
        let engine = CalibrationEngine::default();
        let meta = ImageMetadata::new(600, 0);
        assert_eq!(
            engine.calibrate(&standing(0.1, 0.2, 0.9), &meta),
            Err(CalibrationError::EmptyImage)
        );
    }

    #[test]
    fn test_height_monotonic_in_nose_ankle_span() {
        let engine = CalibrationEngine::default();
        let meta = ImageMetadata::new(600, 1000);
        let mut previous = f64::NEG_INFINITY;
        for step in 0..20 {
            let ankle_y = 0.5 + step as f64 * 0.02;
            let cal = engine.calibrate(&standing(0.1, 0.2, ankle_y), &meta).unwrap();
            assert!(cal.height_cm > previous);
            previous = cal.height_cm;
        }
    }

    #[test]
    fn test_widths_scale_with_height() {
        let engine = CalibrationEngine::default();
        let set = standing(0.1, 0.2, 0.9);
        let m = engine.measure(&set, &ImageMetadata::new(600, 1000)).unwrap();
        // 1.64 m tall, shoulders 0.2 apart, hips 0.1, ankles 0.08
        assert!((m.shoulder_width_m - 0.328).abs() < 1e-9);
        assert!((m.hip_width_m - 0.164).abs() < 1e-9);
        assert!((m.ankle_width_m - 0.1312).abs() < 1e-9);
    }

    #[test]
    fn test_widths_invariant_under_image_rescale() {
        let engine = CalibrationEngine::default();
        let set = standing(0.12, 0.21, 0.93);
        let small = engine.measure(&set, &ImageMetadata::new(480, 640)).unwrap();
        let large = engine.measure(&set, &ImageMetadata::new(1920, 2560)).unwrap();
        assert!((small.height_cm - large.height_cm).abs() < 1e-9);
        assert!((small.shoulder_width_m - large.shoulder_width_m).abs() < 1e-9);
        assert!((small.hip_width_m - large.hip_width_m).abs() < 1e-9);
        assert!((small.ankle_width_m - large.ankle_width_m).abs() < 1e-9);
    }

    #[test]
    fn test_measure_includes_ratio_and_angle() {
        let engine = CalibrationEngine::default();
        let m = engine
            .measure(&standing(0.1, 0.2, 0.9), &ImageMetadata::new(600, 1000))
            .unwrap();
        assert!((m.body_ratio - 8.0).abs() < 1e-9);
        assert!(m.bend_angle_degrees > 150.0 && m.bend_angle_degrees <= 180.0);
    }

    #[test]
    fn test_custom_head_length() {
        let engine = CalibrationEngine::new(41.0);
        let cal = engine
            .calibrate(&standing(0.1, 0.2, 0.9), &ImageMetadata::new(600, 1000))
            .unwrap();
        assert!((cal.height_cm - 328.0).abs() < 1e-9);
    }
}
