//! GONIO Sync - two-role state mirror
//!
//! The phone is the **authority**: the only writer of measurement state.
//! The watch is a **mirror**: a read-mostly replica that requests
//! transitions and optimistically previews them until the next
//! authoritative broadcast lands.
//!
//! Neither role touches a transport. They consume and produce
//! `gonio_wire::Message` values; the runtime decides how those reach the
//! other device.

pub mod authority;
pub mod mirror;

pub use authority::*;
pub use mirror::*;
