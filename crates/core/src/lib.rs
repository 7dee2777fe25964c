//! nubrick-bridge: channel session manager for the Nubrick SDK.
//!
//! Exposes the SDK's embeddings, remote-config subscriptions and tooltips to a
//! host shell over per-channel messages. Every session is keyed by a channel
//! id chosen by the shell:
//!
//! ```text
//! shell call ──► BridgeManager ──► SessionStore (ticket)
//!                     │
//!                     ▼
//!                Sdk fetch (async) ──► ticket still live? ──► commit
//!                                                │
//!                                                ▼
//!                                Dispatcher ──► DeliveryLoop ──► Transport
//! ```
//!
//! A connect that is disconnected or superseded while its fetch is in flight
//! never commits and never sends. Outcomes are reported as `phase-update`
//! messages (`completed`, `not-found`, `failed`); loading is implied by the
//! absence of one.
//!
//! # Example
//!
//! ```ignore
//! use nubrick_bridge::{BridgeConfig, BridgeManager, Catalog, CatalogSdk};
//! use nubrick_runtime::MemoryTransport;
//!
//! let (transport, mut rx) = MemoryTransport::new();
//! let (manager, _delivery) = BridgeManager::start(BridgeConfig::default(), transport);
//! manager.set_sdk(Arc::new(CatalogSdk::new(catalog)));
//!
//! manager.connect_embedding("banner", "exp-1", None).await;
//! let message = rx.recv().await.unwrap();
//! assert_eq!(message.channel, "Nubrick/Embedding/banner");
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod handler;
pub mod manager;
pub mod sdk;
pub mod session;

pub use catalog::{Catalog, CatalogSdk, EmbeddingEntry};
pub use config::BridgeConfig;
pub use error::{BridgeError, Result, TooltipError};
pub use events::EmbeddingEvents;
pub use handler::{MethodRouter, Reply};
pub use manager::{BridgeManager, ConnectFuture};
pub use nubrick_protocol::{
	CrashSeverity, ExceptionRecord, Method, MethodCall, OutboundMessage, Phase, SizeUpdate,
	StackFrame, TrackCrashEvent, UiEvent,
};
pub use sdk::{
	RemoteConfigVariant, Renderable, Sdk, SdkError, SdkFuture, TooltipAccessor, phase_of,
};
pub use session::{EmbeddingSession, EventBridge, RemoteConfigSession, RenderTarget};
