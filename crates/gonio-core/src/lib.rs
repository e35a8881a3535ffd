//! GONIO Core - Fundamental types and primitives
//!
//! This crate defines the core types used throughout the GONIO measurement
//! stack:
//! - Identifiers (DeviceId, RecordId, SeqNo)
//! - Timestamps
//! - Measurement constants (confidence threshold, ready band, outlier band)
//! - Error taxonomy

pub mod error;
pub mod id;
pub mod limits;
pub mod time;

pub use error::*;
pub use id::*;
pub use limits::*;
pub use time::*;

/// Which leg's knee is being measured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Side {
    #[default]
    Right,
    Left,
}

impl Side {
    pub fn to_byte(self) -> u8 {
        match self {
            Side::Right => 0,
            Side::Left => 1,
        }
    }

    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Side::Right),
            1 => Some(Side::Left),
            _ => None,
        }
    }
}
