//! Ready-pose hold detector
//!
//! Consumes one angle sample per frame while measurement is inactive. A
//! sample inside the acceptance band starts a hold; holding continuously for
//! the full duration fires a one-shot auto-start. Progress is computed
//! lazily from the stored hold-start instant on each incoming sample, so
//! there is no separate timer task to cancel or race against.

use std::time::Instant;

use gonio_core::{READY_BAND_MAX_DEG, READY_BAND_MIN_DEG, READY_HOLD};

/// Detector state
#[derive(Clone, Copy, Debug)]
enum ReadyState {
    Idle,
    Holding { since: Instant },
}

/// Ready-pose hold detector
#[derive(Debug)]
pub struct ReadyPoseDetector {
    state: ReadyState,
}

impl ReadyPoseDetector {
    pub fn new() -> Self {
        ReadyPoseDetector {
            state: ReadyState::Idle,
        }
    }

    /// Feed one angle sample. Returns `true` when the hold completed and
    /// measurement should auto-start.
    ///
    /// The signal cannot repeat: completion transitions back to idle, and a
    /// new hold must be built up from scratch.
    pub fn sample(&mut self, angle_deg: f64) -> bool {
        self.sample_at(angle_deg, Instant::now())
    }

    /// `sample` with an explicit clock, for deterministic callers and tests.
    pub fn sample_at(&mut self, angle_deg: f64, now: Instant) -> bool {
        let in_band = (READY_BAND_MIN_DEG..=READY_BAND_MAX_DEG).contains(&angle_deg);

        match self.state {
            ReadyState::Idle => {
                if in_band {
                    tracing::debug!(angle_deg, "ready pose entered, hold started");
                    self.state = ReadyState::Holding { since: now };
                }
                false
            }
            ReadyState::Holding { since } => {
                if !in_band {
                    tracing::debug!(angle_deg, "left ready band, hold reset");
                    self.state = ReadyState::Idle;
                    return false;
                }
                if now.duration_since(since) >= READY_HOLD {
                    tracing::info!("ready pose held, auto-starting measurement");
                    self.state = ReadyState::Idle;
                    return true;
                }
                false
            }
        }
    }

    /// Hold progress in [0, 1]; 0 while idle.
    pub fn progress(&self) -> f64 {
        self.progress_at(Instant::now())
    }

    pub fn progress_at(&self, now: Instant) -> f64 {
        match self.state {
            ReadyState::Idle => 0.0,
            ReadyState::Holding { since } => {
                let elapsed = now.duration_since(since).as_secs_f64();
                (elapsed / READY_HOLD.as_secs_f64()).min(1.0)
            }
        }
    }

    pub fn is_holding(&self) -> bool {
        matches!(self.state, ReadyState::Holding { .. })
    }

    /// Fully clear the detector. Must be called when measurement starts by
    /// any path or when the camera session ends.
    pub fn reset(&mut self) {
        self.state = ReadyState::Idle;
    }
}

impl Default for ReadyPoseDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_hold_for_full_duration_fires_once() {
        let mut det = ReadyPoseDetector::new();
        let t0 = Instant::now();

        assert!(!det.sample_at(170.0, t0));
        assert!(det.is_holding());
        assert!(!det.sample_at(172.0, t0 + Duration::from_millis(1000)));
        assert!(det.sample_at(171.0, t0 + Duration::from_millis(2000)));

        // Back to idle; the signal does not repeat without a fresh hold
        assert!(!det.is_holding());
        assert!(!det.sample_at(171.0, t0 + Duration::from_millis(2001)));
        assert!(det.is_holding());
        assert!(!det.sample_at(171.0, t0 + Duration::from_millis(3000)));
    }

    #[test]
    fn test_excursion_at_1900ms_resets() {
        let mut det = ReadyPoseDetector::new();
        let t0 = Instant::now();

        det.sample_at(160.0, t0);
        assert!(!det.sample_at(140.0, t0 + Duration::from_millis(1900)));
        assert!(!det.is_holding());
        assert_eq!(det.progress_at(t0 + Duration::from_millis(1900)), 0.0);

        // Re-entering the band starts over; elapsed time does not carry
        assert!(!det.sample_at(160.0, t0 + Duration::from_millis(1950)));
        assert!(!det.sample_at(160.0, t0 + Duration::from_millis(2100)));
    }

    #[test]
    fn test_progress_is_clamped() {
        let mut det = ReadyPoseDetector::new();
        let t0 = Instant::now();
        det.sample_at(165.0, t0);

        let p = det.progress_at(t0 + Duration::from_millis(1000));
        assert!((p - 0.5).abs() < 1e-9);
        assert_eq!(det.progress_at(t0 + Duration::from_millis(5000)), 1.0);
    }

    #[test]
    fn test_band_boundaries() {
        let mut det = ReadyPoseDetector::new();
        let t0 = Instant::now();
        det.sample_at(150.0, t0);
        assert!(det.is_holding());
        det.reset();
        det.sample_at(180.0, t0);
        assert!(det.is_holding());
        det.reset();
        det.sample_at(149.9, t0);
        assert!(!det.is_holding());
    }

    #[test]
    fn test_reset_clears_hold() {
        let mut det = ReadyPoseDetector::new();
        let t0 = Instant::now();
        det.sample_at(170.0, t0);
        det.reset();
        assert!(!det.sample_at(170.0, t0 + Duration::from_millis(2500)));
    }
}
