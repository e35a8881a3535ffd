//! Record-to-record change analysis
//!
//! History trends classify the change between the latest and previous
//! records. Angle deltas are signed improvements (+ = better), pain deltas
//! are signed worsening (+ = worse).

use crate::MeasuredRecord;

/// Angle change beyond which a trend is flagged, degrees.
pub const ROM_ALERT_DEG: f64 = 5.0;

/// Pain change thresholds.
pub const PAIN_SAFE: f64 = 1.3;
pub const PAIN_ALERT: f64 = 2.0;

/// Classification of an angle change between two records.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RomChangeState {
    /// Change within the alert threshold.
    Normal { delta: f64 },
    /// Dropped by the alert threshold or more (worse).
    Warning { delta: f64 },
    /// Rose by the alert threshold or more (improved).
    Better { delta: f64 },
}

impl RomChangeState {
    pub fn calculate(latest_angle: f64, previous_angle: f64) -> Self {
        let delta = latest_angle - previous_angle;
        if delta >= ROM_ALERT_DEG {
            RomChangeState::Better { delta }
        } else if delta <= -ROM_ALERT_DEG {
            RomChangeState::Warning { delta }
        } else {
            RomChangeState::Normal { delta }
        }
    }

    pub fn delta(&self) -> f64 {
        match *self {
            RomChangeState::Normal { delta }
            | RomChangeState::Warning { delta }
            | RomChangeState::Better { delta } => delta,
        }
    }
}

/// Classification of a pain-score change between two records.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PainChangeState {
    Normal { delta: f64 },
    /// Rose past the safe threshold.
    Warning { delta: f64 },
    /// Dropped past the safe threshold.
    Better { delta: f64 },
    /// Rose past the alert threshold; a clinic visit is recommended.
    VisitRecommended { delta: f64 },
}

impl PainChangeState {
    pub fn calculate(latest_pain: f64, previous_pain: f64) -> Self {
        let delta = latest_pain - previous_pain;
        if delta >= PAIN_ALERT {
            PainChangeState::VisitRecommended { delta }
        } else if delta >= PAIN_SAFE {
            PainChangeState::Warning { delta }
        } else if delta <= -PAIN_SAFE {
            PainChangeState::Better { delta }
        } else {
            PainChangeState::Normal { delta }
        }
    }

    pub fn delta(&self) -> f64 {
        match *self {
            PainChangeState::Normal { delta }
            | PainChangeState::Warning { delta }
            | PainChangeState::Better { delta }
            | PainChangeState::VisitRecommended { delta } => delta,
        }
    }
}

/// Combined change between two records.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChangeResult {
    pub flexion: RomChangeState,
    pub extension: RomChangeState,
    pub pain: PainChangeState,
}

/// Compare the latest record against the previous one.
pub fn analyze_record_change(latest: &MeasuredRecord, previous: &MeasuredRecord) -> ChangeResult {
    ChangeResult {
        flexion: RomChangeState::calculate(latest.flexion_angle, previous.flexion_angle),
        extension: RomChangeState::calculate(latest.extension_angle, previous.extension_angle),
        pain: PainChangeState::calculate(latest.pain_level, previous.pain_level),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gonio_core::{RecordId, Timestamp};

    fn record(flexion: f64, extension: f64, pain: f64) -> MeasuredRecord {
        MeasuredRecord::new(RecordId::new(0), Timestamp::ZERO, flexion, extension)
            .with_pain_level(pain)
    }

    #[test]
    fn test_rom_change_classification() {
        assert!(matches!(
            RomChangeState::calculate(175.0, 168.0),
            RomChangeState::Better { .. }
        ));
        assert!(matches!(
            RomChangeState::calculate(160.0, 168.0),
            RomChangeState::Warning { .. }
        ));
        assert!(matches!(
            RomChangeState::calculate(170.0, 168.0),
            RomChangeState::Normal { .. }
        ));
    }

    #[test]
    fn test_pain_change_classification() {
        assert!(matches!(
            PainChangeState::calculate(7.0, 4.0),
            PainChangeState::VisitRecommended { .. }
        ));
        assert!(matches!(
            PainChangeState::calculate(5.5, 4.0),
            PainChangeState::Warning { .. }
        ));
        assert!(matches!(
            PainChangeState::calculate(2.0, 4.0),
            PainChangeState::Better { .. }
        ));
        assert!(matches!(
            PainChangeState::calculate(4.5, 4.0),
            PainChangeState::Normal { .. }
        ));
    }

    #[test]
    fn test_analyze_carries_deltas() {
        let latest = record(90.0, 175.0, 3.0);
        let previous = record(100.0, 168.0, 5.0);
        let change = analyze_record_change(&latest, &previous);

        assert_eq!(change.flexion.delta(), -10.0);
        assert_eq!(change.extension.delta(), 7.0);
        assert_eq!(change.pain.delta(), -2.0);
        assert!(matches!(change.pain, PainChangeState::Better { .. }));
    }
}
