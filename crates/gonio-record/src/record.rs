//! Persisted measurement record

use gonio_core::{ImageId, RecordId, Timestamp};

/// One completed knee ROM measurement.
///
/// ROM is always derived from the two extrema, never stored redundantly.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasuredRecord {
    pub id: RecordId,
    pub measured_at: Timestamp,
    /// Minimum joint angle observed (most bent), degrees.
    pub flexion_angle: f64,
    /// Maximum joint angle observed (most straight), degrees.
    pub extension_angle: f64,
    /// Session length, whole minutes.
    pub measured_minutes: u32,
    /// Self-reported pain score (0-10 scale).
    pub pain_level: f64,
    pub flexion_image: Option<ImageId>,
    pub extension_image: Option<ImageId>,
}

impl MeasuredRecord {
    pub fn new(
        id: RecordId,
        measured_at: Timestamp,
        flexion_angle: f64,
        extension_angle: f64,
    ) -> Self {
        MeasuredRecord {
            id,
            measured_at,
            flexion_angle,
            extension_angle,
            measured_minutes: 0,
            pain_level: 0.0,
            flexion_image: None,
            extension_image: None,
        }
    }

    pub fn with_images(mut self, flexion: ImageId, extension: ImageId) -> Self {
        self.flexion_image = Some(flexion);
        self.extension_image = Some(extension);
        self
    }

    pub fn with_pain_level(mut self, pain_level: f64) -> Self {
        self.pain_level = pain_level;
        self
    }

    pub fn with_measured_minutes(mut self, minutes: u32) -> Self {
        self.measured_minutes = minutes;
        self
    }

    /// Range of motion in degrees.
    pub fn rom(&self) -> f64 {
        self.extension_angle - self.flexion_angle
    }
}
