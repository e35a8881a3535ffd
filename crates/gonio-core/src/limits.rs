//! Measurement constants shared across the stack

use std::time::Duration;

/// Minimum per-joint confidence for a landmark to participate in angle
/// extraction.
pub const CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Acceptance band for the ready pose (leg extended while seated), degrees.
pub const READY_BAND_MIN_DEG: f64 = 150.0;
pub const READY_BAND_MAX_DEG: f64 = 180.0;

/// How long the ready pose must be held continuously before measurement
/// auto-starts.
pub const READY_HOLD: Duration = Duration::from_secs(2);

/// Single-frame extremum updates larger than this are treated as detection
/// glitches and rejected.
pub const OUTLIER_BAND_DEG: f64 = 30.0;

/// How long a mirror waits after the link becomes reachable before querying
/// status, so it does not race the authority's own post-activation broadcast.
pub const RECONNECT_SETTLE: Duration = Duration::from_secs(2);
