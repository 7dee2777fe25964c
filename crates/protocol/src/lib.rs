//! Wire types for the Nubrick channel bridge.
//!
//! This crate contains the serde-serializable shapes exchanged between the
//! bridge and the host shell:
//!
//! - **Outbound**: per-channel messages ([`OutboundMessage`]) carrying phase,
//!   size, UI event and tooltip payloads
//! - **Inbound**: method calls issued by the shell ([`MethodCall`]) and their
//!   typed arguments
//! - **Crash reports**: exception records and their lenient JSON parsing
//!
//! Types here are pure data. Session state and delivery live in
//! `nubrick-runtime` and `nubrick-bridge`.

pub mod call;
pub mod crash;
pub mod message;
pub mod phase;

pub use call::*;
pub use crash::*;
pub use message::*;
pub use phase::*;
