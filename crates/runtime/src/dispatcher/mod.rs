//! Outbound channel dispatch.
//!
//! Completion tasks and SDK callbacks may run on any task or thread, but the
//! host transport must be driven from a single context. The [`Dispatcher`]
//! is the producer half: it builds the channel name and payload and enqueues
//! the message. The [`DeliveryLoop`] is the only consumer and the only owner
//! of the [`Transport`], so messages reach the shell one at a time and in
//! enqueue order.
//!
//! # Message Flow
//!
//! 1. Caller invokes `send()` with a channel id, method and payload
//! 2. Dispatcher builds `"<namespace>/Embedding/<channel id>"` and enqueues
//! 3. Delivery loop dequeues and calls `Transport::send` exactly once
//! 4. Delivery errors are logged and dropped; nothing is retried

use std::sync::Arc;

use nubrick_protocol::{Method, OutboundMessage, Phase, channel_name};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::transport::Transport;

/// Producer handle for outbound channel messages. Cheap to clone.
#[derive(Clone)]
pub struct Dispatcher {
	namespace: Arc<str>,
	outbound_tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl Dispatcher {
	/// Creates a dispatcher and the delivery loop that drains it.
	pub fn new(namespace: &str, transport: impl Transport) -> (Self, DeliveryLoop) {
		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
		let dispatcher = Self {
			namespace: Arc::from(namespace),
			outbound_tx,
		};
		let delivery = DeliveryLoop {
			outbound_rx,
			transport: Box::new(transport),
		};
		(dispatcher, delivery)
	}

	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	/// Full channel name for a session id.
	pub fn channel(&self, channel_id: &str) -> String {
		channel_name(&self.namespace, channel_id)
	}

	/// Enqueues one message. Never blocks; a stopped loop drops the message.
	pub fn send(&self, channel_id: &str, method: Method, payload: Value) {
		self.enqueue(OutboundMessage {
			channel: self.channel(channel_id),
			method,
			payload,
		});
	}

	/// Serializes `payload` and enqueues it.
	pub fn send_payload<P: Serialize>(&self, channel_id: &str, method: Method, payload: &P) {
		match serde_json::to_value(payload) {
			Ok(value) => self.send(channel_id, method, value),
			Err(e) => {
				tracing::error!(channel_id, method = %method, error = %e, "Failed to serialize payload");
			}
		}
	}

	/// Enqueues a `phase-update`. [`Phase::Loading`] has no wire form and is skipped.
	pub fn send_phase(&self, channel_id: &str, phase: Phase) {
		match OutboundMessage::phase(self.channel(channel_id), phase) {
			Some(message) => self.enqueue(message),
			None => tracing::trace!(channel_id, "loading phase not sent"),
		}
	}

	/// Returns true once the delivery loop has stopped.
	pub fn is_closed(&self) -> bool {
		self.outbound_tx.is_closed()
	}

	fn enqueue(&self, message: OutboundMessage) {
		tracing::debug!(channel = %message.channel, method = %message.method, "Queueing message");
		if self.outbound_tx.send(message).is_err() {
			tracing::debug!("Delivery loop stopped, message dropped");
		}
	}
}

impl std::fmt::Debug for Dispatcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Dispatcher")
			.field("namespace", &self.namespace)
			.field("closed", &self.is_closed())
			.finish()
	}
}

/// Single consumer that owns the transport.
pub struct DeliveryLoop {
	outbound_rx: mpsc::UnboundedReceiver<OutboundMessage>,
	transport: Box<dyn Transport>,
}

impl DeliveryLoop {
	/// Delivers messages until every [`Dispatcher`] clone is dropped.
	///
	/// Returns the number of messages the transport accepted.
	pub async fn run(mut self) -> usize {
		let mut delivered = 0;
		while let Some(message) = self.outbound_rx.recv().await {
			let channel = message.channel.clone();
			let method = message.method;
			match self.transport.send(message) {
				Ok(()) => delivered += 1,
				Err(e) => {
					tracing::warn!(%channel, %method, error = %e, "Transport rejected message");
				}
			}
		}
		tracing::debug!(delivered, "Delivery loop finished");
		delivered
	}

	/// Runs the loop on a new tokio task.
	pub fn spawn(self) -> JoinHandle<usize> {
		tokio::spawn(self.run())
	}
}

#[cfg(test)]
mod tests;
