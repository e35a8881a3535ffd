//! GONIO Test - protocol testing utilities
//!
//! An in-memory stand-in for the phone/watch link plus the end-to-end
//! scenarios that drive a full node and mirror across it.

pub mod link;
pub mod scenario;

pub use link::*;
