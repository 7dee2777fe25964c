//! Tooltips: trigger fetch, tooltip embeddings and their event bridges.

use super::BridgeManager;
use crate::error::TooltipError;
use crate::session::{EmbeddingSession, EventBridge};

impl BridgeManager {
	/// Fetches the tooltip body matching trigger `name`.
	pub async fn connect_tooltip(&self, name: &str) -> Result<String, TooltipError> {
		if name.is_empty() {
			return Err(TooltipError::EmptyName);
		}
		let sdk = self.sdk().ok_or(TooltipError::NotInitialized)?;
		match sdk.fetch_tooltip(name).await {
			Ok(Some(body)) => Ok(body),
			Ok(None) => Err(TooltipError::NotFound),
			Err(e) => {
				tracing::debug!(name, error = %e, "Tooltip fetch failed");
				Err(TooltipError::NotFound)
			}
		}
	}

	/// Renders `root_block` and binds it to `channel_id`.
	///
	/// Registers both the embedding session and the tooltip event bridge
	/// before returning. Sends no phase message. Returns `false` when nothing
	/// was registered.
	pub fn connect_tooltip_embedding(&self, channel_id: &str, root_block: &str) -> bool {
		if channel_id.is_empty() {
			return false;
		}
		let Some(sdk) = self.sdk() else {
			tracing::warn!(channel_id, "Tooltip embedding without SDK client");
			return false;
		};

		let accessor = sdk.render_tooltip(root_block, self.events(channel_id));
		let bridge = EventBridge::new(accessor);
		self.inner.embeddings.register(
			channel_id,
			EmbeddingSession {
				renderable: bridge.renderable(),
				event_bridge: Some(bridge.clone()),
			},
		);
		self.inner.tooltips.register(channel_id, bridge);
		tracing::debug!(channel_id, "Tooltip embedding connected");
		true
	}

	/// Forwards an opaque event string to the tooltip on `channel_id`.
	pub fn dispatch_tooltip_event(&self, channel_id: &str, event: &str) -> bool {
		if channel_id.is_empty() || event.is_empty() {
			return false;
		}
		match self.inner.tooltips.get(channel_id) {
			Some(bridge) => bridge.dispatch(event),
			None => {
				tracing::debug!(channel_id, "No tooltip bridge for event");
				false
			}
		}
	}

	pub fn disconnect_tooltip(&self, channel_id: &str) {
		self.inner.tooltips.remove(channel_id);
		self.inner.embeddings.remove(channel_id);
	}
}
