//! Embedding sessions for [`BridgeManager`].

use std::future;

use nubrick_protocol::{Method, Phase};

use super::{BridgeManager, ConnectFuture};
use crate::sdk::phase_of;
use crate::session::EmbeddingSession;

impl BridgeManager {
	/// Resolves an embedding and reports its phase on the channel.
	///
	/// Empty ids and a missing SDK settle as [`Phase::NotFound`] without
	/// contacting the SDK or registering anything. Otherwise the channel is
	/// reserved before this returns, and the returned future performs the
	/// fetch. On success the session is committed before `phase-update` is
	/// sent, followed by `size-update` when the SDK knows the intrinsic size.
	///
	/// The future yields `None` when the completion was stale: the channel was
	/// disconnected or reconnected while the fetch was in flight. Nothing is
	/// committed or sent in that case.
	pub fn connect_embedding(
		&self,
		channel_id: &str,
		experiment_id: &str,
		component_id: Option<&str>,
	) -> ConnectFuture<Option<Phase>> {
		if channel_id.is_empty() || experiment_id.is_empty() {
			tracing::debug!(channel_id, experiment_id, "Embedding connect rejected: empty id");
			return Box::pin(future::ready(Some(self.settle_early(channel_id))));
		}
		let Some(sdk) = self.sdk() else {
			tracing::warn!(channel_id, "Embedding connect without SDK client");
			return Box::pin(future::ready(Some(self.settle_early(channel_id))));
		};

		let ticket = self.inner.embeddings.reserve(channel_id);
		tracing::debug!(channel_id, experiment_id, ?component_id, epoch = ticket.epoch(), "Connecting embedding");

		let manager = self.clone();
		let experiment_id = experiment_id.to_string();
		let component_id = component_id.map(str::to_string);
		Box::pin(async move {
			let inner = &manager.inner;
			let channel_id = ticket.id();
			let result = sdk
				.fetch_embedding(&experiment_id, component_id.as_deref())
				.await;
			let phase = phase_of(&result);

			match result {
				Ok(renderable) => {
					let size = sdk.initial_size(&renderable);
					let session = EmbeddingSession {
						renderable,
						event_bridge: None,
					};
					if !inner.embeddings.commit(&ticket, session) {
						tracing::debug!(channel_id, "Stale embedding completion dropped");
						return None;
					}
					inner.dispatcher.send_phase(channel_id, phase);
					if let Some(size) = size {
						inner
							.dispatcher
							.send_payload(channel_id, Method::SizeUpdate, &size);
					}
				}
				Err(e) => {
					if !inner.embeddings.is_live(&ticket) {
						tracing::debug!(channel_id, error = %e, "Stale embedding failure dropped");
						return None;
					}
					inner.embeddings.release(&ticket);
					tracing::debug!(channel_id, error = %e, %phase, "Embedding connect failed");
					inner.dispatcher.send_phase(channel_id, phase);
				}
			}
			Some(phase)
		})
	}

	/// Removes the embedding session; a pending connect for it will not commit.
	pub fn disconnect_embedding(&self, channel_id: &str) {
		self.inner.embeddings.remove(channel_id);
	}

	fn settle_early(&self, channel_id: &str) -> Phase {
		if !channel_id.is_empty() {
			self.inner.dispatcher.send_phase(channel_id, Phase::NotFound);
		}
		Phase::NotFound
	}
}
