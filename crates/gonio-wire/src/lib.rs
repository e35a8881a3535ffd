//! GONIO Wire - Binary message format
//!
//! Two message shapes cross the phone/watch link: intents (mirror to
//! authority) and state snapshots (authority to mirror), plus the
//! acknowledgement an intent earns. Every message carries an explicit
//! version byte and a tag; unknown tags decode to `Message::Unknown` so the
//! receiver can log and drop rather than fail.

pub mod message;

pub use message::*;
