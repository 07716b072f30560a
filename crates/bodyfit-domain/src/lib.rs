//! Domain layer - landmark geometry, calibration and the photo quality gate

pub mod geometry;
pub mod ports;
pub mod service;
