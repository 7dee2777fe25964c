//! Host transport seam.
//!
//! The shell's channel mechanism is treated as a fire-and-forget sink: the
//! [`DeliveryLoop`](crate::DeliveryLoop) hands it one [`OutboundMessage`] at a
//! time and never retries. [`MemoryTransport`] forwards messages into an
//! in-process queue for tests and harnesses.

use std::time::Duration;

use nubrick_protocol::OutboundMessage;
use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// Outbound side of the host shell's channel mechanism.
///
/// Owned exclusively by the delivery loop, so implementations only need to be
/// `Send`.
pub trait Transport: Send + 'static {
	/// Delivers one message. Errors are logged by the caller and dropped.
	fn send(&mut self, message: OutboundMessage) -> Result<()>;
}

impl<F> Transport for F
where
	F: FnMut(OutboundMessage) -> Result<()> + Send + 'static,
{
	fn send(&mut self, message: OutboundMessage) -> Result<()> {
		self(message)
	}
}

/// In-memory transport backed by an unbounded queue.
pub struct MemoryTransport {
	tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl MemoryTransport {
	/// Creates the transport and the receiver that observes its messages.
	pub fn new() -> (Self, MemoryTransportReceiver) {
		let (tx, rx) = mpsc::unbounded_channel();
		(Self { tx }, MemoryTransportReceiver { rx })
	}
}

impl Transport for MemoryTransport {
	fn send(&mut self, message: OutboundMessage) -> Result<()> {
		self.tx.send(message).map_err(|_| Error::ChannelClosed)
	}
}

/// Receiving end of a [`MemoryTransport`].
pub struct MemoryTransportReceiver {
	rx: mpsc::UnboundedReceiver<OutboundMessage>,
}

impl MemoryTransportReceiver {
	/// Waits for the next message; `None` once the transport is dropped.
	pub async fn recv(&mut self) -> Option<OutboundMessage> {
		self.rx.recv().await
	}

	/// Waits up to `timeout` for the next message.
	pub async fn recv_timeout(&mut self, timeout: Duration) -> Option<OutboundMessage> {
		tokio::time::timeout(timeout, self.rx.recv())
			.await
			.ok()
			.flatten()
	}

	/// Returns an already queued message without waiting.
	pub fn try_recv(&mut self) -> Option<OutboundMessage> {
		self.rx.try_recv().ok()
	}

	/// Takes every message queued so far.
	pub fn drain(&mut self) -> Vec<OutboundMessage> {
		std::iter::from_fn(|| self.try_recv()).collect()
	}
}
