//! GONIO Session - measurement lifecycle state machines
//!
//! Two pieces, both fed from the camera frame callback:
//! - `ReadyPoseDetector`: watches for a held straight-leg pose and fires a
//!   one-shot auto-start signal
//! - `MeasurementSession`: tracks flexion/extension extrema with
//!   outlier rejection while a measurement is active

pub mod ready;
pub mod tracker;

pub use ready::*;
pub use tracker::*;
