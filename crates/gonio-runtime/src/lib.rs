//! GONIO Runtime - the measurement node
//!
//! Hosts the single mutable owner of measurement state on the phone side.
//! Camera frames and inbound watch messages arrive on different execution
//! contexts; both funnel through one lock so every transition is serialized.

pub mod node;
pub mod transport;

pub use node::*;
pub use transport::*;
