//! SDK seam.
//!
//! The experiment engine, remote-config fetcher and UI renderer are external.
//! The bridge only needs the async fetches and a few synchronous queries
//! captured by [`Sdk`]. Async methods return boxed futures so the trait stays
//! object safe; implementations should copy borrowed arguments into the
//! future before boxing it.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use nubrick_protocol::{Phase, SizeUpdate, TrackCrashEvent};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::events::EmbeddingEvents;

/// Failure reported by an SDK fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SdkError {
	/// The experiment, component or tooltip does not exist.
	#[error("not found")]
	NotFound,
	/// Any other failure (network, decoding, server).
	#[error("{0}")]
	Failed(String),
}

impl SdkError {
	/// Terminal phase for this failure.
	pub fn phase(&self) -> Phase {
		match self {
			SdkError::NotFound => Phase::NotFound,
			SdkError::Failed(_) => Phase::Failed,
		}
	}
}

/// Maps a settled SDK result onto the wire vocabulary.
pub fn phase_of<T>(result: &Result<T, SdkError>) -> Phase {
	match result {
		Ok(_) => Phase::Completed,
		Err(e) => e.phase(),
	}
}

/// Boxed future returned by async SDK methods.
pub type SdkFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SdkError>> + Send + 'a>>;

/// Opaque handle to something the host can render.
#[derive(Debug, Clone, PartialEq)]
pub enum Renderable {
	/// A resolved embedding component.
	Component(Arc<Value>),
	/// A tooltip UI block, as serialized by the shell.
	Block(Arc<str>),
}

impl Renderable {
	pub fn component(value: Value) -> Self {
		Renderable::Component(Arc::new(value))
	}

	pub fn block(root_block: &str) -> Self {
		Renderable::Block(Arc::from(root_block))
	}

	pub fn as_component(&self) -> Option<&Value> {
		match self {
			Renderable::Component(value) => Some(value),
			Renderable::Block(_) => None,
		}
	}
}

/// Resolved remote-configuration snapshot for one experiment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfigVariant {
	#[serde(default)]
	pub experiment_id: Option<String>,
	#[serde(default)]
	pub values: HashMap<String, String>,
}

impl RemoteConfigVariant {
	pub fn get(&self, key: &str) -> Option<String> {
		self.values.get(key).cloned()
	}
}

/// Live tooltip rendered by the SDK, accepting dispatched events.
pub trait TooltipAccessor: Send + Sync {
	fn renderable(&self) -> Renderable;

	/// Forwards one event into the rendered tooltip.
	fn dispatch(&self, event: &str) -> Result<(), SdkError>;
}

/// The SDK surface consumed by the bridge.
pub trait Sdk: Send + Sync {
	/// Native SDK version string.
	fn version(&self) -> String;

	/// Resolves an embedding, optionally scoped to one component.
	fn fetch_embedding(
		&self,
		experiment_id: &str,
		component_id: Option<&str>,
	) -> SdkFuture<'_, Renderable>;

	/// Intrinsic size of a resolved embedding, if known up front.
	fn initial_size(&self, renderable: &Renderable) -> Option<SizeUpdate>;

	/// Fetches the remote-config variant assigned to this user.
	fn fetch_remote_config(&self, experiment_id: &str) -> SdkFuture<'_, RemoteConfigVariant>;

	/// Fetches tooltip content for a trigger; `Ok(None)` means nothing matched.
	fn fetch_tooltip(&self, trigger: &str) -> SdkFuture<'_, Option<String>>;

	/// Renders a tooltip block. Callbacks flow back through `events`.
	fn render_tooltip(&self, root_block: &str, events: EmbeddingEvents)
	-> Arc<dyn TooltipAccessor>;

	/// Dispatches a named trigger event into the experiment engine.
	fn dispatch(&self, name: &str);

	/// Forwards a crash report.
	fn send_crash(&self, event: TrackCrashEvent);

	fn user_id(&self) -> Option<String>;

	fn set_user_properties(&self, properties: Map<String, Value>);

	fn user_properties(&self) -> Option<HashMap<String, String>>;
}
