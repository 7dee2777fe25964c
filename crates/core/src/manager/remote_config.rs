//! Remote-config sessions and embeddings derived from them.

use std::future;

use nubrick_protocol::Phase;

use super::{BridgeManager, ConnectFuture};
use crate::sdk::phase_of;
use crate::session::RemoteConfigSession;

impl BridgeManager {
	/// Subscribes `channel_id` to the variant of `experiment_id`.
	///
	/// Empty ids and a missing SDK settle as [`Phase::NotFound`] without
	/// registering. Otherwise a placeholder is registered before this returns
	/// so a disconnect that races the fetch has something to remove. The
	/// resolved variant is only written into that same placeholder; if it was
	/// removed or replaced in the meantime the variant is discarded. The phase
	/// is returned to the caller rather than sent on the channel.
	pub fn connect_remote_config(&self, channel_id: &str, experiment_id: &str) -> ConnectFuture<Phase> {
		if channel_id.is_empty() || experiment_id.is_empty() {
			tracing::debug!(channel_id, experiment_id, "Remote config connect rejected: empty id");
			return Box::pin(future::ready(Phase::NotFound));
		}
		let Some(sdk) = self.sdk() else {
			tracing::warn!(channel_id, "Remote config connect without SDK client");
			return Box::pin(future::ready(Phase::NotFound));
		};

		let ticket = self
			.inner
			.remote_configs
			.register(channel_id, RemoteConfigSession::default());
		tracing::debug!(channel_id, experiment_id, epoch = ticket.epoch(), "Fetching remote config");

		let manager = self.clone();
		let experiment_id = experiment_id.to_string();
		Box::pin(async move {
			let channel_id = ticket.id();
			let result = sdk.fetch_remote_config(&experiment_id).await;
			let phase = phase_of(&result);

			match result {
				Ok(variant) => {
					let committed = manager.inner.remote_configs.update(&ticket, |session| {
						session.experiment_id = variant.experiment_id.clone();
						session.variant = Some(variant);
					});
					if !committed {
						tracing::debug!(channel_id, "Remote config resolved after disconnect");
					}
				}
				Err(e) => tracing::debug!(channel_id, error = %e, "Remote config fetch failed"),
			}
			phase
		})
	}

	pub fn disconnect_remote_config(&self, channel_id: &str) {
		self.inner.remote_configs.remove(channel_id);
	}

	/// Reads `key` from the resolved variant of `channel_id`.
	pub fn get_remote_config_value(&self, channel_id: &str, key: &str) -> Option<String> {
		if channel_id.is_empty() || key.is_empty() {
			return None;
		}
		self.inner
			.remote_configs
			.get(channel_id)?
			.variant?
			.get(key)
	}

	/// Connects an embedding for the component id stored under `key`.
	///
	/// Silently does nothing unless the config session exists, is resolved,
	/// maps `key` to a value and knows its experiment id. The lookup and the
	/// embedding reservation happen before this returns; the future yields the
	/// embedding connect's result when it ran.
	pub fn connect_embedding_in_remote_config_value(
		&self,
		channel_id: &str,
		key: &str,
		embedding_channel_id: &str,
	) -> ConnectFuture<Option<Phase>> {
		match self.resolve_component(channel_id, key) {
			Some((experiment_id, component_id)) => {
				tracing::debug!(channel_id, key, embedding_channel_id, %component_id, "Connecting derived embedding");
				self.connect_embedding(embedding_channel_id, &experiment_id, Some(&component_id))
			}
			None => Box::pin(future::ready(None)),
		}
	}

	/// `(experiment id, component id)` stored under `key` of a resolved session.
	fn resolve_component(&self, channel_id: &str, key: &str) -> Option<(String, String)> {
		if channel_id.is_empty() {
			return None;
		}
		let session = self.inner.remote_configs.get(channel_id)?;
		let component_id = session.variant?.get(key)?;
		Some((session.experiment_id?, component_id))
	}
}
