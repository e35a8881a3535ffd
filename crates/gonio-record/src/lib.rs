//! GONIO Record - persisted measurements and trend analysis
//!
//! The measurement core produces at most one record per stopped session.
//! This crate holds the record model, the change analysis used for history
//! trends, and the storage traits the runtime persists through. Storage
//! engine internals stay with the collaborator; the in-memory
//! implementations here back tests and the simulator.

pub mod analysis;
pub mod images;
pub mod mock;
pub mod record;
pub mod repository;

pub use analysis::*;
pub use images::*;
pub use mock::*;
pub use record::*;
pub use repository::*;
