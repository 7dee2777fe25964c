//! Channel-bound sink for SDK render callbacks.

use std::sync::Arc;

use nubrick_protocol::{Method, NextTooltip, SizeUpdate, UiEvent};
use nubrick_runtime::Dispatcher;
use serde_json::Value;

/// Forwards callbacks from a rendered embedding or tooltip to its channel.
///
/// Handed to the SDK when rendering. Each callback becomes exactly one
/// outbound message, enqueued in call order.
#[derive(Clone)]
pub struct EmbeddingEvents {
	channel_id: Arc<str>,
	dispatcher: Dispatcher,
}

impl EmbeddingEvents {
	pub(crate) fn new(channel_id: &str, dispatcher: Dispatcher) -> Self {
		Self {
			channel_id: Arc::from(channel_id),
			dispatcher,
		}
	}

	pub fn channel_id(&self) -> &str {
		&self.channel_id
	}

	/// A UI interaction inside the rendered content.
	pub fn on_event(&self, event: &UiEvent) {
		self.dispatcher
			.send_payload(&self.channel_id, Method::OnEvent, event);
	}

	/// The rendered content changed its intrinsic size.
	pub fn on_size_change(&self, width: f64, height: f64) {
		self.dispatcher.send_payload(
			&self.channel_id,
			Method::SizeUpdate,
			&SizeUpdate { width, height },
		);
	}

	/// The tooltip flow advanced to `page_id`.
	pub fn on_next_tooltip(&self, page_id: &str) {
		self.dispatcher.send_payload(
			&self.channel_id,
			Method::OnNextTooltip,
			&NextTooltip {
				page_id: page_id.to_string(),
			},
		);
	}

	/// The tooltip flow was dismissed.
	pub fn on_dismiss(&self) {
		self.dispatcher
			.send(&self.channel_id, Method::OnDismissTooltip, Value::Null);
	}
}

impl std::fmt::Debug for EmbeddingEvents {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EmbeddingEvents")
			.field("channel_id", &self.channel_id)
			.finish()
	}
}
