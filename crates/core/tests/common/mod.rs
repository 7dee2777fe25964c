#![allow(dead_code)]

use std::sync::Arc;

use nubrick_bridge::{BridgeConfig, BridgeManager, Catalog, CatalogSdk, OutboundMessage, Phase};
use nubrick_runtime::{MemoryTransport, MemoryTransportReceiver};
use tokio::task::JoinHandle;

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_test_writer()
		.with_max_level(tracing::Level::DEBUG)
		.try_init();
}

/// A manager wired to an in-memory transport and a catalog SDK.
pub struct Harness {
	pub manager: BridgeManager,
	pub sdk: Arc<CatalogSdk>,
	pub rx: MemoryTransportReceiver,
	delivery: JoinHandle<usize>,
}

impl Harness {
	pub fn new(catalog: Catalog) -> Self {
		let harness = Self::without_sdk(catalog);
		harness.manager.set_sdk(harness.sdk.clone());
		harness
	}

	/// Same as [`Harness::new`] but leaves the SDK uninstalled.
	pub fn without_sdk(catalog: Catalog) -> Self {
		init_tracing();
		let (transport, rx) = MemoryTransport::new();
		let (manager, delivery) = BridgeManager::start(BridgeConfig::default(), transport);
		Self {
			manager,
			sdk: Arc::new(CatalogSdk::new(catalog)),
			rx,
			delivery,
		}
	}

	/// Spawns `connect_embedding` so the test can interleave with it.
	pub fn spawn_embedding(
		&self,
		channel_id: &str,
		experiment_id: &str,
	) -> JoinHandle<Option<Phase>> {
		let manager = self.manager.clone();
		let channel_id = channel_id.to_string();
		let experiment_id = experiment_id.to_string();
		tokio::spawn(async move {
			manager
				.connect_embedding(&channel_id, &experiment_id, None)
				.await
		})
	}

	pub fn spawn_remote_config(&self, channel_id: &str, experiment_id: &str) -> JoinHandle<Phase> {
		let manager = self.manager.clone();
		let channel_id = channel_id.to_string();
		let experiment_id = experiment_id.to_string();
		tokio::spawn(async move {
			manager
				.connect_remote_config(&channel_id, &experiment_id)
				.await
		})
	}

	/// Stops delivery and returns every message the transport received.
	pub async fn finish(self) -> Vec<OutboundMessage> {
		let Harness {
			manager,
			sdk,
			mut rx,
			delivery,
		} = self;
		drop(manager);
		drop(sdk);
		delivery.await.expect("delivery loop panicked");
		rx.drain()
	}
}

/// `(channel, method, payload)` triples for compact assertions.
pub fn summarize(messages: &[OutboundMessage]) -> Vec<(String, String, serde_json::Value)> {
	messages
		.iter()
		.map(|m| (m.channel.clone(), m.method.to_string(), m.payload.clone()))
		.collect()
}
