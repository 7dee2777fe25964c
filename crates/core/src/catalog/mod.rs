//! In-memory SDK backed by a static catalog.
//!
//! Stands in for the real experiment engine in tests and in the CLI host.
//! Fetches resolve from a [`Catalog`] of experiments, remote-config values and
//! tooltip bodies. Individual ids can be held so their fetches stay pending
//! until released, which makes disconnect and reconnect races reproducible.
//!
//! # Example
//!
//! ```ignore
//! let sdk = Arc::new(CatalogSdk::new(Catalog::default().with_embedding("exp", json!({"id": "c"}))));
//! sdk.hold("exp");
//! let connect = tokio::spawn({
//!     let manager = manager.clone();
//!     async move { manager.connect_embedding("ch", "exp", None).await }
//! });
//! sdk.wait_for_fetches(1).await;
//! manager.disconnect_embedding("ch");
//! sdk.release("exp");
//! assert_eq!(connect.await?, None);
//! ```
//!
//! Tooltip events understood by rendered tooltips:
//!
//! | event | effect |
//! |---|---|
//! | `next:<page id>` | `on-next-tooltip` |
//! | `dismiss` | `on-dismiss-tooltip` |
//! | `event:<name>` | `on-event` with that name |
//! | `raise:<message>` | dispatch fails with `message` |
//!
//! Anything else is accepted and only recorded.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use nubrick_protocol::{SizeUpdate, TrackCrashEvent, UiEvent};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::watch;

use crate::events::EmbeddingEvents;
use crate::sdk::{RemoteConfigVariant, Renderable, Sdk, SdkError, SdkFuture, TooltipAccessor};

/// Static content served by [`CatalogSdk`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Catalog {
	pub version: String,
	pub user_id: Option<String>,
	/// Experiment id to embedding content.
	pub embeddings: HashMap<String, EmbeddingEntry>,
	/// Experiment id to assigned variant.
	pub remote_configs: HashMap<String, RemoteConfigVariant>,
	/// Trigger name to tooltip body.
	pub tooltips: HashMap<String, String>,
	/// Ids whose fetches fail with a transient error.
	pub failing: Vec<String>,
	/// Artificial per-id fetch latency.
	pub latency_ms: HashMap<String, u64>,
}

impl Default for Catalog {
	fn default() -> Self {
		Self {
			version: env!("CARGO_PKG_VERSION").to_string(),
			user_id: None,
			embeddings: HashMap::new(),
			remote_configs: HashMap::new(),
			tooltips: HashMap::new(),
			failing: Vec::new(),
			latency_ms: HashMap::new(),
		}
	}
}

/// Content of one embedding experiment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddingEntry {
	/// Served when no component id is requested.
	pub body: Option<Value>,
	/// Component id to component content.
	pub components: HashMap<String, Value>,
}

impl Catalog {
	pub fn with_embedding(mut self, experiment_id: &str, body: Value) -> Self {
		self.embeddings
			.entry(experiment_id.to_string())
			.or_default()
			.body = Some(body);
		self
	}

	pub fn with_component(mut self, experiment_id: &str, component_id: &str, body: Value) -> Self {
		self.embeddings
			.entry(experiment_id.to_string())
			.or_default()
			.components
			.insert(component_id.to_string(), body);
		self
	}

	pub fn with_remote_config<'a>(
		mut self,
		experiment_id: &str,
		values: impl IntoIterator<Item = (&'a str, &'a str)>,
	) -> Self {
		let variant = RemoteConfigVariant {
			experiment_id: Some(experiment_id.to_string()),
			values: values
				.into_iter()
				.map(|(k, v)| (k.to_string(), v.to_string()))
				.collect(),
		};
		self.remote_configs.insert(experiment_id.to_string(), variant);
		self
	}

	pub fn with_tooltip(mut self, trigger: &str, body: &str) -> Self {
		self.tooltips.insert(trigger.to_string(), body.to_string());
		self
	}

	pub fn with_failing(mut self, id: &str) -> Self {
		self.failing.push(id.to_string());
		self
	}

	pub fn with_user_id(mut self, user_id: &str) -> Self {
		self.user_id = Some(user_id.to_string());
		self
	}
}

/// Calls observed by a [`CatalogSdk`].
#[derive(Debug, Default)]
struct Recorded {
	triggers: Vec<String>,
	crashes: Vec<TrackCrashEvent>,
	tooltip_events: Vec<(String, String)>,
	user_properties: HashMap<String, String>,
}

/// [`Sdk`] implementation serving a [`Catalog`].
pub struct CatalogSdk {
	catalog: Catalog,
	gates: Mutex<HashMap<String, watch::Sender<bool>>>,
	fetches: watch::Sender<usize>,
	recorded: Arc<Mutex<Recorded>>,
}

impl CatalogSdk {
	pub fn new(catalog: Catalog) -> Self {
		Self {
			catalog,
			gates: Mutex::new(HashMap::new()),
			fetches: watch::Sender::new(0),
			recorded: Arc::new(Mutex::new(Recorded::default())),
		}
	}

	pub fn catalog(&self) -> &Catalog {
		&self.catalog
	}

	/// Keeps fetches for `id` pending until [`release`](Self::release).
	pub fn hold(&self, id: &str) {
		self.gates
			.lock()
			.entry(id.to_string())
			.or_insert_with(|| watch::Sender::new(false));
	}

	/// Lets pending and future fetches for `id` resolve.
	pub fn release(&self, id: &str) {
		if let Some(gate) = self.gates.lock().remove(id) {
			gate.send_replace(true);
		}
	}

	/// Number of fetches started so far.
	pub fn fetch_count(&self) -> usize {
		*self.fetches.borrow()
	}

	/// Waits until at least `count` fetches have started.
	pub async fn wait_for_fetches(&self, count: usize) {
		let mut rx = self.fetches.subscribe();
		let _ = rx.wait_for(|started| *started >= count).await;
	}

	pub fn dispatched_triggers(&self) -> Vec<String> {
		self.recorded.lock().triggers.clone()
	}

	pub fn crash_reports(&self) -> Vec<TrackCrashEvent> {
		self.recorded.lock().crashes.clone()
	}

	/// `(channel id, event)` pairs dispatched into rendered tooltips.
	pub fn tooltip_events(&self) -> Vec<(String, String)> {
		self.recorded.lock().tooltip_events.clone()
	}

	async fn gate(&self, id: &str) -> Result<(), SdkError> {
		let pending = self.gates.lock().get(id).map(watch::Sender::subscribe);
		self.fetches.send_modify(|started| *started += 1);

		if let Some(mut open) = pending {
			tracing::trace!(id, "Fetch held");
			let _ = open.wait_for(|open| *open).await;
		}
		if let Some(ms) = self.catalog.latency_ms.get(id) {
			tokio::time::sleep(Duration::from_millis(*ms)).await;
		}
		if self.catalog.failing.iter().any(|failing| failing == id) {
			return Err(SdkError::Failed(format!("fetch failed for {id}")));
		}
		Ok(())
	}

	fn lookup_embedding(
		&self,
		experiment_id: &str,
		component_id: Option<&str>,
	) -> Result<Renderable, SdkError> {
		let entry = self
			.catalog
			.embeddings
			.get(experiment_id)
			.ok_or(SdkError::NotFound)?;
		let body = match component_id {
			Some(component_id) => entry.components.get(component_id),
			None => entry.body.as_ref(),
		};
		body.cloned()
			.map(Renderable::component)
			.ok_or(SdkError::NotFound)
	}
}

impl From<Catalog> for CatalogSdk {
	fn from(catalog: Catalog) -> Self {
		Self::new(catalog)
	}
}

impl Sdk for CatalogSdk {
	fn version(&self) -> String {
		self.catalog.version.clone()
	}

	fn fetch_embedding(
		&self,
		experiment_id: &str,
		component_id: Option<&str>,
	) -> SdkFuture<'_, Renderable> {
		let experiment_id = experiment_id.to_string();
		let component_id = component_id.map(str::to_string);
		Box::pin(async move {
			self.gate(&experiment_id).await?;
			self.lookup_embedding(&experiment_id, component_id.as_deref())
		})
	}

	fn initial_size(&self, renderable: &Renderable) -> Option<SizeUpdate> {
		let component = renderable.as_component()?;
		Some(SizeUpdate {
			width: component.get("width")?.as_f64()?,
			height: component.get("height")?.as_f64()?,
		})
	}

	fn fetch_remote_config(&self, experiment_id: &str) -> SdkFuture<'_, RemoteConfigVariant> {
		let experiment_id = experiment_id.to_string();
		Box::pin(async move {
			self.gate(&experiment_id).await?;
			self.catalog
				.remote_configs
				.get(&experiment_id)
				.cloned()
				.ok_or(SdkError::NotFound)
		})
	}

	fn fetch_tooltip(&self, trigger: &str) -> SdkFuture<'_, Option<String>> {
		let trigger = trigger.to_string();
		Box::pin(async move {
			self.gate(&trigger).await?;
			Ok(self.catalog.tooltips.get(&trigger).cloned())
		})
	}

	fn render_tooltip(
		&self,
		root_block: &str,
		events: EmbeddingEvents,
	) -> Arc<dyn TooltipAccessor> {
		Arc::new(CatalogTooltip {
			renderable: Renderable::block(root_block),
			events,
			recorded: Arc::clone(&self.recorded),
		})
	}

	fn dispatch(&self, name: &str) {
		self.recorded.lock().triggers.push(name.to_string());
	}

	fn send_crash(&self, event: TrackCrashEvent) {
		self.recorded.lock().crashes.push(event);
	}

	fn user_id(&self) -> Option<String> {
		self.catalog.user_id.clone()
	}

	fn set_user_properties(&self, properties: Map<String, Value>) {
		let mut recorded = self.recorded.lock();
		for (key, value) in properties {
			let value = match value {
				Value::String(s) => s,
				other => other.to_string(),
			};
			recorded.user_properties.insert(key, value);
		}
	}

	fn user_properties(&self) -> Option<HashMap<String, String>> {
		Some(self.recorded.lock().user_properties.clone())
	}
}

impl std::fmt::Debug for CatalogSdk {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CatalogSdk")
			.field("version", &self.catalog.version)
			.field("fetches", &self.fetch_count())
			.finish_non_exhaustive()
	}
}

/// Tooltip rendered by [`CatalogSdk`].
///
/// Holds the shared call log rather than the SDK itself so that dropping the
/// manager's tooltip entry releases its [`EmbeddingEvents`].
struct CatalogTooltip {
	renderable: Renderable,
	events: EmbeddingEvents,
	recorded: Arc<Mutex<Recorded>>,
}

impl TooltipAccessor for CatalogTooltip {
	fn renderable(&self) -> Renderable {
		self.renderable.clone()
	}

	fn dispatch(&self, event: &str) -> Result<(), SdkError> {
		self.recorded
			.lock()
			.tooltip_events
			.push((self.events.channel_id().to_string(), event.to_string()));

		if let Some(page_id) = event.strip_prefix("next:") {
			self.events.on_next_tooltip(page_id);
		} else if event == "dismiss" {
			self.events.on_dismiss();
		} else if let Some(name) = event.strip_prefix("event:") {
			self.events.on_event(&UiEvent::named(name));
		} else if let Some(message) = event.strip_prefix("raise:") {
			return Err(SdkError::Failed(message.to_string()));
		}
		Ok(())
	}
}
