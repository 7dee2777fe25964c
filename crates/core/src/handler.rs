//! Method-call routing for the host shell.
//!
//! Translates [`MethodCall`]s into [`BridgeManager`] operations. Every call
//! performs its registry work before [`MethodRouter::call`] returns, so calls
//! issued in order act on the registry in order. Embedding connects then
//! settle on tasks owned by the router and report on the channel; the call
//! itself answers `"ok"`. Remote-config and tooltip connects answer with a
//! [`Reply::Pending`] future the caller awaits or spawns.

use std::future::Future;

use nubrick_protocol::{
	BridgeMethod, ChannelArgs, ConnectEmbeddingArgs, ConnectRemoteConfigArgs,
	ConnectTooltipEmbeddingArgs, EmbeddingInRemoteConfigArgs, MethodCall, NameArgs,
	RecordCrashArgs, RemoteConfigValueArgs, TooltipDispatchArgs,
};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::task::JoinSet;

use crate::error::{BridgeError, Result};
use crate::manager::{BridgeManager, ConnectFuture};

const OK: &str = "ok";

/// Result of a routed call.
pub enum Reply {
	/// Answered synchronously.
	Ready(Value),
	/// Answered once the SDK settles.
	Pending(ConnectFuture<Value>),
}

impl std::fmt::Debug for Reply {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Reply::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
			Reply::Pending(_) => f.write_str("Pending"),
		}
	}
}

/// Dispatches shell method calls to a [`BridgeManager`].
pub struct MethodRouter {
	manager: BridgeManager,
	tasks: Mutex<JoinSet<()>>,
}

impl MethodRouter {
	pub fn new(manager: BridgeManager) -> Self {
		Self {
			manager,
			tasks: Mutex::new(JoinSet::new()),
		}
	}

	pub fn manager(&self) -> &BridgeManager {
		&self.manager
	}

	/// Handles one call and waits for its JSON result.
	pub async fn handle(&self, call: &MethodCall) -> Result<Value> {
		match self.call(call)? {
			Reply::Ready(value) => Ok(value),
			Reply::Pending(pending) => Ok(pending.await),
		}
	}

	/// Starts one call without waiting on the SDK.
	pub fn call(&self, call: &MethodCall) -> Result<Reply> {
		let method = BridgeMethod::from_name(&call.method)
			.ok_or_else(|| BridgeError::MethodNotImplemented(call.method.clone()))?;
		tracing::debug!(method = %call.method, "Handling method call");

		let manager = &self.manager;
		let value: Value = match method {
			BridgeMethod::GetSdkVersion => manager.sdk_version().into(),
			BridgeMethod::GetUserId => manager.user_id().into(),
			BridgeMethod::SetUserProperties => {
				let properties = match &call.arguments {
					Value::Object(map) => map.clone(),
					Value::Null => Map::new(),
					_ => {
						return Err(BridgeError::InvalidArgument(
							"user properties must be an object".into(),
						));
					}
				};
				manager.set_user_properties(properties);
				OK.into()
			}
			BridgeMethod::GetUserProperties => serde_json::to_value(manager.user_properties())?,
			BridgeMethod::ConnectEmbedding => {
				let args: ConnectEmbeddingArgs = call.parse_arguments()?;
				let pending = manager.connect_embedding(
					&args.channel_id,
					&args.experiment_id,
					args.component_id.as_deref(),
				);
				self.spawn(async move {
					pending.await;
				});
				OK.into()
			}
			BridgeMethod::DisconnectEmbedding => {
				let args: ChannelArgs = call.parse_arguments()?;
				manager.disconnect_embedding(&args.channel_id);
				OK.into()
			}
			BridgeMethod::ConnectRemoteConfig => {
				let args: ConnectRemoteConfigArgs = call.parse_arguments()?;
				let pending = manager.connect_remote_config(&args.channel_id, &args.experiment_id);
				return Ok(Reply::Pending(Box::pin(async move {
					Value::from(pending.await.wire_value())
				})));
			}
			BridgeMethod::DisconnectRemoteConfig => {
				let args: ChannelArgs = call.parse_arguments()?;
				manager.disconnect_remote_config(&args.channel_id);
				OK.into()
			}
			BridgeMethod::GetRemoteConfigValue => {
				let args: RemoteConfigValueArgs = call.parse_arguments()?;
				manager
					.get_remote_config_value(&args.channel_id, &args.key)
					.into()
			}
			BridgeMethod::ConnectEmbeddingInRemoteConfigValue => {
				let args: EmbeddingInRemoteConfigArgs = call.parse_arguments()?;
				let pending = manager.connect_embedding_in_remote_config_value(
					&args.channel_id,
					&args.key,
					&args.embedding_channel_id,
				);
				self.spawn(async move {
					pending.await;
				});
				OK.into()
			}
			BridgeMethod::ConnectTooltip => {
				let args: NameArgs = call.parse_arguments()?;
				let manager = manager.clone();
				return Ok(Reply::Pending(Box::pin(async move {
					match manager.connect_tooltip(&args.name).await {
						Ok(body) => Value::from(body),
						Err(e) => Value::from(e.to_wire_string()),
					}
				})));
			}
			BridgeMethod::ConnectTooltipEmbedding => {
				let args: ConnectTooltipEmbeddingArgs = call.parse_arguments()?;
				manager.connect_tooltip_embedding(&args.channel_id, &args.root_block);
				OK.into()
			}
			BridgeMethod::CallTooltipEmbeddingDispatch => {
				let args: TooltipDispatchArgs = call.parse_arguments()?;
				manager.dispatch_tooltip_event(&args.channel_id, &args.event);
				OK.into()
			}
			BridgeMethod::DisconnectTooltip => {
				let args: ChannelArgs = call.parse_arguments()?;
				manager.disconnect_tooltip(&args.channel_id);
				OK.into()
			}
			BridgeMethod::Dispatch => {
				let args: NameArgs = call.parse_arguments()?;
				manager.dispatch_trigger(&args.name);
				OK.into()
			}
			BridgeMethod::RecordCrash => {
				let args: RecordCrashArgs = call.parse_arguments()?;
				manager.record_crash(
					&args.exceptions,
					args.flutter_sdk_version,
					args.severity.as_deref(),
				);
				OK.into()
			}
		};
		Ok(Reply::Ready(value))
	}

	/// Number of router tasks not yet reaped by [`drain`](Self::drain).
	pub fn pending(&self) -> usize {
		self.tasks.lock().len()
	}

	/// Waits for every router task to finish.
	pub async fn drain(&self) {
		let mut tasks = std::mem::take(&mut *self.tasks.lock());
		while let Some(joined) = tasks.join_next().await {
			if let Err(e) = joined {
				tracing::warn!(error = %e, "Router task failed");
			}
		}
	}

	/// Runs `task` on the router, so [`drain`](Self::drain) waits for it.
	pub fn spawn<F>(&self, task: F)
	where
		F: Future<Output = ()> + Send + 'static,
	{
		let mut tasks = self.tasks.lock();
		// reap finished tasks so long sessions don't accumulate handles
		while tasks.try_join_next().is_some() {}
		tasks.spawn(task);
	}
}

impl std::fmt::Debug for MethodRouter {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MethodRouter")
			.field("manager", &self.manager)
			.field("pending", &self.pending())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use nubrick_runtime::MemoryTransport;
	use serde_json::json;

	use super::*;
	use crate::catalog::{Catalog, CatalogSdk};
	use crate::config::BridgeConfig;

	fn router() -> MethodRouter {
		let (transport, _rx) = MemoryTransport::new();
		let (manager, _delivery) = BridgeManager::start(BridgeConfig::default(), transport);
		MethodRouter::new(manager)
	}

	#[tokio::test]
	async fn unknown_method_is_not_implemented() {
		let err = router()
			.handle(&MethodCall::new("launchRockets", Value::Null))
			.await
			.unwrap_err();
		assert!(matches!(err, BridgeError::MethodNotImplemented(name) if name == "launchRockets"));
	}

	#[tokio::test]
	async fn connect_tooltip_reports_errors_inline() {
		let router = router();
		let call = |name: &str| MethodCall::new("connectTooltip", json!({"name": name}));

		assert_eq!(
			router.handle(&call("")).await.unwrap(),
			json!("error: the name is empty")
		);
		assert_eq!(
			router.handle(&call("onboarding")).await.unwrap(),
			json!("error: the client is not initialized")
		);

		router.manager().set_sdk(Arc::new(CatalogSdk::new(
			Catalog::default().with_tooltip("onboarding", "{}"),
		)));
		assert_eq!(router.handle(&call("onboarding")).await.unwrap(), json!("{}"));
		assert_eq!(
			router.handle(&call("other")).await.unwrap(),
			json!("error: not found")
		);
	}

	#[tokio::test]
	async fn version_is_null_without_sdk() {
		let router = router();
		let call = MethodCall::new("getNubrickSDKVersion", Value::Null);
		assert_eq!(router.handle(&call).await.unwrap(), Value::Null);

		router
			.manager()
			.set_sdk(Arc::new(CatalogSdk::new(Catalog::default())));
		assert_eq!(
			router.handle(&call).await.unwrap(),
			json!(env!("CARGO_PKG_VERSION"))
		);
	}

	#[tokio::test]
	async fn user_properties_must_be_an_object() {
		let err = router()
			.handle(&MethodCall::new("setUserProperties", json!([1, 2])))
			.await
			.unwrap_err();
		assert!(matches!(err, BridgeError::InvalidArgument(_)));
	}

	#[tokio::test]
	async fn malformed_arguments_are_json_errors() {
		let err = router()
			.handle(&MethodCall::new("connectEmbedding", json!({"channelId": 7})))
			.await
			.unwrap_err();
		assert!(matches!(err, BridgeError::Json(_)));
	}

	#[tokio::test]
	async fn drain_waits_for_spawned_connects() {
		let router = router();
		let sdk = Arc::new(CatalogSdk::new(
			Catalog::default().with_embedding("exp", json!({"id": "c"})),
		));
		router.manager().set_sdk(sdk.clone());
		sdk.hold("exp");

		let call = MethodCall::new(
			"connectEmbedding",
			json!({"channelId": "ch", "experimentId": "exp"}),
		);
		assert_eq!(router.handle(&call).await.unwrap(), json!("ok"));
		assert_eq!(router.pending(), 1);

		sdk.wait_for_fetches(1).await;
		sdk.release("exp");
		router.drain().await;
		assert_eq!(router.pending(), 0);
		assert!(router.manager().embedding_session("ch").is_some());
	}

	mod ordering {
		use nubrick_runtime::MemoryTransportReceiver;
		use tokio::task::JoinHandle;

		use super::*;

		struct Fixture {
			router: MethodRouter,
			rx: MemoryTransportReceiver,
			delivery: JoinHandle<usize>,
		}

		impl Fixture {
			fn new() -> Self {
				let (transport, rx) = MemoryTransport::new();
				let (manager, delivery) = BridgeManager::start(BridgeConfig::default(), transport);
				manager.set_sdk(Arc::new(CatalogSdk::new(
					Catalog::default()
						.with_embedding("exp", json!({"id": "root"}))
						.with_remote_config("exp-rc", [("hero", "banner")])
						.with_component("exp-rc", "banner", json!({"id": "banner"})),
				)));
				Self {
					router: MethodRouter::new(manager),
					rx,
					delivery,
				}
			}

			fn ok(&self, method: &str, arguments: Value) {
				let reply = self.router.call(&MethodCall::new(method, arguments)).unwrap();
				assert!(matches!(reply, Reply::Ready(ref value) if value == "ok"));
			}

			/// Drains the router, stops delivery and returns the channels written to.
			async fn finish(mut self) -> Vec<String> {
				self.router.drain().await;
				drop(self.router);
				self.delivery.await.unwrap();
				self.rx.drain().into_iter().map(|m| m.channel).collect()
			}
		}

		#[tokio::test]
		async fn disconnect_right_after_connect_wins() {
			let fx = Fixture::new();
			fx.ok("connectEmbedding", json!({"channelId": "e1", "experimentId": "exp"}));
			fx.ok("disconnectEmbedding", json!({"channelId": "e1"}));

			fx.router.drain().await;
			assert!(fx.router.manager().embedding_ids().is_empty());
			assert!(fx.finish().await.is_empty());
		}

		#[tokio::test]
		async fn derived_connect_is_cancelled_by_disconnect() {
			let fx = Fixture::new();
			let connect = MethodCall::new(
				"connectRemoteConfig",
				json!({"channelId": "c1", "experimentId": "exp-rc"}),
			);
			assert_eq!(fx.router.handle(&connect).await.unwrap(), json!("completed"));

			fx.ok(
				"connectEmbeddingInRemoteConfigValue",
				json!({"channelId": "c1", "key": "hero", "embeddingChannelId": "e1"}),
			);
			fx.ok("disconnectEmbedding", json!({"channelId": "e1"}));

			fx.router.drain().await;
			assert!(fx.router.manager().embedding_ids().is_empty());
			assert!(fx.finish().await.is_empty());
		}

		#[tokio::test]
		async fn derived_lookup_happens_at_call_time() {
			let fx = Fixture::new();
			let connect = MethodCall::new(
				"connectRemoteConfig",
				json!({"channelId": "c1", "experimentId": "exp-rc"}),
			);
			fx.router.handle(&connect).await.unwrap();

			fx.ok(
				"connectEmbeddingInRemoteConfigValue",
				json!({"channelId": "c1", "key": "hero", "embeddingChannelId": "e1"}),
			);
			fx.ok("disconnectRemoteConfig", json!({"channelId": "c1"}));

			fx.router.drain().await;
			assert_eq!(fx.router.manager().embedding_ids(), vec!["e1".to_string()]);
			assert_eq!(fx.finish().await, vec!["Nubrick/Embedding/e1".to_string()]);
		}

		#[tokio::test]
		async fn remote_config_placeholder_exists_before_reply_settles() {
			let fx = Fixture::new();
			let reply = fx
				.router
				.call(&MethodCall::new(
					"connectRemoteConfig",
					json!({"channelId": "c1", "experimentId": "exp-rc"}),
				))
				.unwrap();
			assert_eq!(fx.router.manager().remote_config_ids(), vec!["c1".to_string()]);

			fx.ok("disconnectRemoteConfig", json!({"channelId": "c1"}));
			let Reply::Pending(pending) = reply else {
				panic!("remote config connect answered synchronously");
			};
			assert_eq!(pending.await, json!("completed"));
			assert!(fx.router.manager().remote_config_ids().is_empty());
		}

		#[tokio::test]
		async fn empty_experiment_registers_nothing() {
			let fx = Fixture::new();
			let call = MethodCall::new(
				"connectRemoteConfig",
				json!({"channelId": "c1", "experimentId": ""}),
			);
			assert_eq!(fx.router.handle(&call).await.unwrap(), json!("not-found"));
			assert!(fx.router.manager().remote_config_ids().is_empty());
		}
	}
}
