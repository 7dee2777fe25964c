//! Session state stored per channel id.

use std::sync::Arc;

use crate::events::EmbeddingEvents;
use crate::sdk::{RemoteConfigVariant, Renderable, TooltipAccessor};

/// A resolved embedding, or a tooltip block registered synchronously.
#[derive(Clone)]
pub struct EmbeddingSession {
	pub renderable: Renderable,
	pub event_bridge: Option<EventBridge>,
}

/// Remote-config subscription.
///
/// Registered as a placeholder (`variant == None`) when the connect starts,
/// filled in when the fetch resolves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteConfigSession {
	pub variant: Option<RemoteConfigVariant>,
	pub experiment_id: Option<String>,
}

impl RemoteConfigSession {
	pub fn is_resolved(&self) -> bool {
		self.variant.is_some()
	}
}

/// Event sink for a tooltip embedding.
#[derive(Clone)]
pub struct EventBridge {
	accessor: Arc<dyn TooltipAccessor>,
}

impl EventBridge {
	pub fn new(accessor: Arc<dyn TooltipAccessor>) -> Self {
		Self { accessor }
	}

	pub fn renderable(&self) -> Renderable {
		self.accessor.renderable()
	}

	/// Forwards `event` into the SDK. Returns whether the SDK accepted it.
	pub fn dispatch(&self, event: &str) -> bool {
		match self.accessor.dispatch(event) {
			Ok(()) => true,
			Err(e) => {
				tracing::debug!(event, error = %e, "Tooltip dispatch failed");
				false
			}
		}
	}
}

impl std::fmt::Debug for EventBridge {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EventBridge").finish_non_exhaustive()
	}
}

impl std::fmt::Debug for EmbeddingSession {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EmbeddingSession")
			.field("renderable", &self.renderable)
			.field("has_event_bridge", &self.event_bridge.is_some())
			.finish()
	}
}

/// Everything the host needs to draw a channel's content.
#[derive(Debug, Clone)]
pub struct RenderTarget {
	pub renderable: Renderable,
	/// Sink for the SDK's render callbacks on this channel.
	pub events: EmbeddingEvents,
	pub event_bridge: Option<EventBridge>,
}
