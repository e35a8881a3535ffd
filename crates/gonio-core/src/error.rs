//! Error types for the GONIO stack

use thiserror::Error;

/// Core GONIO errors
#[derive(Error, Debug)]
pub enum GonioError {
    // Wire errors
    #[error("Invalid wire format: {0}")]
    InvalidWireFormat(String),

    #[error("Buffer too short: expected {expected}, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },

    #[error("Unsupported wire version: {0}")]
    UnsupportedVersion(u8),

    // Precondition violations (intent rejected, no state change)
    #[error("Measurement already in progress")]
    AlreadyMeasuring,

    #[error("No measurement in progress")]
    NotMeasuring,

    #[error("Camera session is not ready")]
    CameraNotReady,

    // Session errors
    #[error("Session produced no samples")]
    NoSamples,

    #[error("Snapshot unavailable for extremum")]
    SnapshotUnavailable,

    // Collaborator errors
    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Image store error: {0}")]
    ImageStoreError(String),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Link unreachable")]
    Unreachable,
}

/// Result type for GONIO operations
pub type GonioResult<T> = Result<T, GonioError>;
