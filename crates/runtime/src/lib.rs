//! Nubrick runtime - session registry and channel delivery
//!
//! This crate provides the stateful plumbing underneath the bridge manager:
//!
//! - **Registry**: one keyed [`SessionStore`] per session kind, with epoch
//!   tickets so late async completions cannot resurrect removed sessions
//! - **Dispatcher**: a cloneable [`Dispatcher`] that enqueues outbound channel
//!   messages, drained in order by a single [`DeliveryLoop`]
//! - **Transport**: the fire-and-forget [`Transport`] seam to the host shell
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────┐
//! │  nubrick-bridge   │  connect / disconnect / SDK callbacks
//! └─────────┬─────────┘
//!           │ Ticket, Dispatcher::send
//! ┌─────────▼─────────┐
//! │  nubrick-runtime  │  This crate
//! │  ┌─────────────┐  │
//! │  │ Registry    │  │  check-then-set by epoch
//! │  └─────────────┘  │
//! │  ┌─────────────┐  │
//! │  │ Dispatcher  │──┼──► mpsc ──► DeliveryLoop ──► Transport
//! │  └─────────────┘  │
//! └───────────────────┘
//! ```

pub mod dispatcher;
pub mod error;
pub mod registry;
pub mod transport;

pub use dispatcher::{DeliveryLoop, Dispatcher};
pub use error::{Error, Result};
pub use registry::{SessionStore, Ticket};
pub use transport::{MemoryTransport, MemoryTransportReceiver, Transport};
