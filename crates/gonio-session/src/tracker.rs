//! Measurement session extremum tracking
//!
//! While a session is active, every accepted frame may update the flexion
//! (minimum) and extension (maximum) extrema. Both rules run unconditionally
//! each frame; a single sample can update either, both, or neither.
//!
//! Outlier rejection: an improving sample whose jump from the comparison
//! baseline is >= the band is not accepted, but it becomes the baseline for
//! the next improving sample. A single-frame detection glitch therefore
//! never lands, while a genuine sustained change passes on the following
//! frame.

use std::time::{Duration, Instant};

use gonio_core::{GonioError, GonioResult, OUTLIER_BAND_DEG};
use gonio_pose::Snapshot;

/// An extremum angle paired with the snapshot captured when it was recorded.
#[derive(Clone, Debug)]
pub struct Extremum {
    pub angle: f64,
    pub snapshot: Snapshot,
}

/// One extremum tracking rule (min for flexion, max for extension).
#[derive(Clone, Debug, Default)]
struct ExtremumRule {
    stored: Option<Extremum>,
    /// Last improving sample rejected as an outlier.
    rejected: Option<f64>,
}

impl ExtremumRule {
    fn offer(&mut self, angle: f64, snapshot: &Snapshot, improves: impl Fn(f64, f64) -> bool) {
        let Some(stored) = &self.stored else {
            // First-sample seeding captures the snapshot immediately
            self.stored = Some(Extremum {
                angle,
                snapshot: snapshot.clone(),
            });
            return;
        };

        if !improves(angle, stored.angle) {
            return;
        }

        let baseline = self.rejected.unwrap_or(stored.angle);
        if (angle - baseline).abs() < OUTLIER_BAND_DEG {
            self.stored = Some(Extremum {
                angle,
                snapshot: snapshot.clone(),
            });
            self.rejected = None;
        } else {
            tracing::debug!(angle, baseline, "extremum candidate rejected as outlier");
            self.rejected = Some(angle);
        }
    }

    fn clear(&mut self) {
        self.stored = None;
        self.rejected = None;
    }
}

/// Finalized result of a stopped session.
#[derive(Clone, Debug)]
pub struct MeasurementOutcome {
    pub flexion: Extremum,
    pub extension: Extremum,
    pub duration: Duration,
}

impl MeasurementOutcome {
    /// Range of motion in degrees.
    pub fn rom(&self) -> f64 {
        self.extension.angle - self.flexion.angle
    }
}

/// Measurement session tracker
#[derive(Debug, Default)]
pub struct MeasurementSession {
    active: bool,
    started_at: Option<Instant>,
    flexion: ExtremumRule,
    extension: ExtremumRule,
}

impl MeasurementSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Begin a session. Rejected if one is already active; the running
    /// session's extrema are left untouched.
    pub fn start(&mut self) -> GonioResult<()> {
        self.start_at(Instant::now())
    }

    pub fn start_at(&mut self, now: Instant) -> GonioResult<()> {
        if self.active {
            return Err(GonioError::AlreadyMeasuring);
        }
        self.flexion.clear();
        self.extension.clear();
        self.active = true;
        self.started_at = Some(now);
        tracing::info!("measurement session started");
        Ok(())
    }

    /// Feed one accepted frame. Ignored while inactive.
    ///
    /// The snapshot is cloned here, synchronously: the camera's frame buffer
    /// is single-slot and will be overwritten before the next scheduling
    /// opportunity.
    pub fn update(&mut self, angle: f64, snapshot: &Snapshot) {
        if !self.active {
            return;
        }
        self.flexion.offer(angle, snapshot, |a, stored| a < stored);
        self.extension.offer(angle, snapshot, |a, stored| a > stored);
    }

    /// End the session. Rejected if inactive. Produces a finalized outcome
    /// only when both extrema were recorded; a session that processed no
    /// frames fails with `NoSamples` rather than producing placeholder
    /// angles.
    pub fn stop(&mut self) -> GonioResult<MeasurementOutcome> {
        self.stop_at(Instant::now())
    }

    pub fn stop_at(&mut self, now: Instant) -> GonioResult<MeasurementOutcome> {
        if !self.active {
            return Err(GonioError::NotMeasuring);
        }
        self.active = false;
        let duration = self
            .started_at
            .take()
            .map(|t| now.duration_since(t))
            .unwrap_or(Duration::ZERO);

        match (self.flexion.stored.take(), self.extension.stored.take()) {
            (Some(flexion), Some(extension)) => {
                tracing::info!(
                    flexion = flexion.angle,
                    extension = extension.angle,
                    "measurement finalized"
                );
                Ok(MeasurementOutcome {
                    flexion,
                    extension,
                    duration,
                })
            }
            _ => {
                tracing::warn!("measurement stopped without samples, no record produced");
                self.flexion.clear();
                self.extension.clear();
                Err(GonioError::NoSamples)
            }
        }
    }

    /// Current flexion extremum, if any.
    pub fn flexion(&self) -> Option<&Extremum> {
        self.flexion.stored.as_ref()
    }

    /// Current extension extremum, if any.
    pub fn extension(&self) -> Option<&Extremum> {
        self.extension.stored.as_ref()
    }
}
