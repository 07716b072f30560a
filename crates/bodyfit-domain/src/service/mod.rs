//! Domain services

pub mod calibration;
pub mod quality_gate;

pub use calibration::{Calibration, CalibrationEngine, HEAD_LENGTH_CM};
pub use quality_gate::{classify_bend, evaluate, QualityThresholds, RULES};
