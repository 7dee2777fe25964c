//! The channel session manager.
//!
//! [`BridgeManager`] owns one [`SessionStore`] per session kind, the installed
//! [`Sdk`], and the [`Dispatcher`] feeding the host transport. Operations are
//! grouped by session kind in the submodules:
//!
//! - `embedding`: connect/disconnect of SDK-resolved embeddings
//! - `remote_config`: remote-config subscriptions and derived embeddings
//! - `tooltip`: tooltip fetch, tooltip embeddings and their event bridges
//! - `crash`: crash report forwarding
//!
//! Each store has its own id space, so the same channel id may be used for an
//! embedding and a remote-config subscription without interference.
//!
//! Async connects take their registry ticket when called, not when first
//! polled, and hand back an owned [`ConnectFuture`]. A disconnect issued after
//! the call returns therefore always sees the pending session, even if the
//! future is spawned and scheduled later.

mod crash;
mod embedding;
mod remote_config;
mod tooltip;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use nubrick_runtime::{Dispatcher, SessionStore, Transport};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tokio::task::JoinHandle;

use crate::config::BridgeConfig;
use crate::events::EmbeddingEvents;
use crate::sdk::Sdk;
use crate::session::{EmbeddingSession, EventBridge, RemoteConfigSession, RenderTarget};

/// Settlement of a connect whose registration already happened.
pub type ConnectFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

struct Inner {
	config: BridgeConfig,
	sdk: RwLock<Option<Arc<dyn Sdk>>>,
	dispatcher: Dispatcher,
	embeddings: SessionStore<EmbeddingSession>,
	remote_configs: SessionStore<RemoteConfigSession>,
	tooltips: SessionStore<EventBridge>,
}

/// Registry of keyed sessions bridging the SDK to the host shell.
///
/// Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct BridgeManager {
	inner: Arc<Inner>,
}

impl BridgeManager {
	/// Creates a manager that sends through an existing dispatcher.
	pub fn new(config: BridgeConfig, dispatcher: Dispatcher) -> Self {
		Self {
			inner: Arc::new(Inner {
				config,
				sdk: RwLock::new(None),
				dispatcher,
				embeddings: SessionStore::new("embedding"),
				remote_configs: SessionStore::new("remote-config"),
				tooltips: SessionStore::new("tooltip"),
			}),
		}
	}

	/// Creates a manager and spawns the delivery loop for `transport`.
	///
	/// The loop ends once the manager, its clones and every handed-out
	/// [`EmbeddingEvents`] are dropped; the handle yields the delivered count.
	pub fn start(config: BridgeConfig, transport: impl Transport) -> (Self, JoinHandle<usize>) {
		let (dispatcher, delivery) = Dispatcher::new(&config.namespace, transport);
		let handle = delivery.spawn();
		(Self::new(config, dispatcher), handle)
	}

	pub fn config(&self) -> &BridgeConfig {
		&self.inner.config
	}

	pub fn dispatcher(&self) -> &Dispatcher {
		&self.inner.dispatcher
	}

	/// Installs the SDK client. A second install is ignored.
	pub fn set_sdk(&self, sdk: Arc<dyn Sdk>) -> bool {
		let mut slot = self.inner.sdk.write();
		if slot.is_some() {
			tracing::warn!("SDK client is already set");
			return false;
		}
		tracing::info!(version = %sdk.version(), "SDK client installed");
		*slot = Some(sdk);
		true
	}

	pub fn sdk(&self) -> Option<Arc<dyn Sdk>> {
		self.inner.sdk.read().clone()
	}

	pub fn sdk_version(&self) -> Option<String> {
		self.sdk().map(|sdk| sdk.version())
	}

	pub fn user_id(&self) -> Option<String> {
		self.sdk()?.user_id()
	}

	pub fn set_user_properties(&self, properties: Map<String, Value>) {
		if let Some(sdk) = self.sdk() {
			sdk.set_user_properties(properties);
		}
	}

	pub fn user_properties(&self) -> Option<HashMap<String, String>> {
		self.sdk()?.user_properties()
	}

	/// Dispatches a named trigger into the experiment engine.
	pub fn dispatch_trigger(&self, name: &str) {
		if name.is_empty() {
			return;
		}
		match self.sdk() {
			Some(sdk) => sdk.dispatch(name),
			None => tracing::debug!(name, "Trigger dropped, no SDK client"),
		}
	}

	/// Looks up what the host should draw for `channel_id`.
	pub fn render(&self, channel_id: &str) -> Option<RenderTarget> {
		if channel_id.is_empty() {
			return None;
		}
		let session = self.inner.embeddings.get(channel_id)?;
		let event_bridge = session
			.event_bridge
			.or_else(|| self.inner.tooltips.get(channel_id));
		Some(RenderTarget {
			renderable: session.renderable,
			events: self.events(channel_id),
			event_bridge,
		})
	}

	pub fn embedding_session(&self, channel_id: &str) -> Option<EmbeddingSession> {
		self.inner.embeddings.get(channel_id)
	}

	pub fn remote_config_session(&self, channel_id: &str) -> Option<RemoteConfigSession> {
		self.inner.remote_configs.get(channel_id)
	}

	pub fn has_tooltip_bridge(&self, channel_id: &str) -> bool {
		self.inner.tooltips.contains(channel_id)
	}

	/// Channel ids with a live embedding session.
	pub fn embedding_ids(&self) -> Vec<String> {
		self.inner.embeddings.ids()
	}

	/// Channel ids with a remote-config session (resolved or not).
	pub fn remote_config_ids(&self) -> Vec<String> {
		self.inner.remote_configs.ids()
	}

	pub(crate) fn events(&self, channel_id: &str) -> EmbeddingEvents {
		EmbeddingEvents::new(channel_id, self.inner.dispatcher.clone())
	}
}

impl std::fmt::Debug for BridgeManager {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BridgeManager")
			.field("namespace", &self.inner.config.namespace)
			.field("sdk", &self.inner.sdk.read().is_some())
			.field("embeddings", &self.inner.embeddings.len())
			.field("remote_configs", &self.inner.remote_configs.len())
			.field("tooltips", &self.inner.tooltips.len())
			.finish()
	}
}
