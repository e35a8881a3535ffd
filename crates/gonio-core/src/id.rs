//! Identity types for GONIO
//!
//! All identifiers are 64-bit for wire efficiency.

use std::fmt;

/// Device identity - distinguishes the authority (phone) from mirrors (watch)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DeviceId(pub u64);

impl DeviceId {
    pub const ZERO: DeviceId = DeviceId(0);

    #[inline]
    pub fn new(id: u64) -> Self {
        DeviceId(id)
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    #[inline]
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        DeviceId(u64::from_le_bytes(bytes))
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Device({:016x})", self.0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Persisted measurement record identity
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct RecordId(pub u64);

impl RecordId {
    #[inline]
    pub fn new(id: u64) -> Self {
        RecordId(id)
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    #[inline]
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        RecordId(u64::from_le_bytes(bytes))
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record({:016x})", self.0)
    }
}

/// Stored snapshot image identity
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ImageId(pub u64);

impl ImageId {
    #[inline]
    pub fn new(id: u64) -> Self {
        ImageId(id)
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    #[inline]
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        ImageId(u64::from_le_bytes(bytes))
    }
}

impl fmt::Debug for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Image({:016x})", self.0)
    }
}

/// Monotonic sequence number for broadcasts and intents
///
/// The authority is the sole writer of snapshot sequence numbers; mirrors
/// drop any snapshot whose sequence is not newer than the last applied one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct SeqNo(pub u64);

impl SeqNo {
    pub const ZERO: SeqNo = SeqNo(0);

    #[inline]
    pub fn new(seq: u64) -> Self {
        SeqNo(seq)
    }

    /// Return the next sequence number, advancing self.
    #[inline]
    pub fn bump(&mut self) -> SeqNo {
        self.0 += 1;
        *self
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    #[inline]
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        SeqNo(u64::from_le_bytes(bytes))
    }
}

impl fmt::Debug for SeqNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seq({})", self.0)
    }
}

impl fmt::Display for SeqNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
