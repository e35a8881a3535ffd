//! Joint identifiers and detected landmarks

use gonio_core::Side;

/// Anatomical landmark identifier for the leg skeleton
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Joint {
    LeftHip,
    LeftKnee,
    LeftAnkle,
    RightHip,
    RightKnee,
    RightAnkle,
}

impl Joint {
    /// All joints in order
    pub fn all() -> &'static [Joint] {
        &[
            Joint::LeftHip,
            Joint::LeftKnee,
            Joint::LeftAnkle,
            Joint::RightHip,
            Joint::RightKnee,
            Joint::RightAnkle,
        ]
    }

    /// The (proximal, vertex, distal) triple for a knee angle on one side.
    pub fn knee_triple(side: Side) -> (Joint, Joint, Joint) {
        match side {
            Side::Left => (Joint::LeftHip, Joint::LeftKnee, Joint::LeftAnkle),
            Side::Right => (Joint::RightHip, Joint::RightKnee, Joint::RightAnkle),
        }
    }
}

/// A detected landmark: normalized position plus detector confidence.
///
/// Ephemeral - produced once per camera frame and discarded after angle
/// extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JointPoint {
    /// Normalized x in [0, 1]
    pub x: f64,
    /// Normalized y in [0, 1]
    pub y: f64,
    /// Detector confidence in [0, 1]
    pub confidence: f64,
}

impl JointPoint {
    pub fn new(x: f64, y: f64, confidence: f64) -> Self {
        Self { x, y, confidence }
    }
}
