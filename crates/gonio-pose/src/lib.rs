//! GONIO Pose - landmarks and angle extraction
//!
//! Consumes the per-frame joint mapping produced by an on-device pose
//! detector and derives the knee vertex angle. This crate is pure: no
//! detector internals, no camera pipeline, no state.

pub mod angle;
pub mod frame;
pub mod joint;

pub use angle::*;
pub use frame::*;
pub use joint::*;
