//! Inbound method calls issued by the host shell.
//!
//! String arguments default to empty when absent so that the bridge applies
//! its usual empty-input handling instead of failing deserialization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A method invocation from the shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
	pub method: String,
	#[serde(default)]
	pub arguments: Value,
}

impl MethodCall {
	pub fn new(method: impl Into<String>, arguments: Value) -> Self {
		Self {
			method: method.into(),
			arguments,
		}
	}

	/// Deserializes the arguments into a typed struct.
	///
	/// A `null` argument value is treated as an empty object.
	pub fn parse_arguments<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
		match &self.arguments {
			Value::Null => serde_json::from_value(Value::Object(Map::new())),
			other => serde_json::from_value(other.clone()),
		}
	}
}

/// Methods understood by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BridgeMethod {
	GetSdkVersion,
	GetUserId,
	SetUserProperties,
	GetUserProperties,
	ConnectEmbedding,
	DisconnectEmbedding,
	ConnectRemoteConfig,
	DisconnectRemoteConfig,
	GetRemoteConfigValue,
	ConnectEmbeddingInRemoteConfigValue,
	ConnectTooltip,
	ConnectTooltipEmbedding,
	CallTooltipEmbeddingDispatch,
	DisconnectTooltip,
	Dispatch,
	RecordCrash,
}

impl BridgeMethod {
	pub const ALL: [BridgeMethod; 16] = [
		BridgeMethod::GetSdkVersion,
		BridgeMethod::GetUserId,
		BridgeMethod::SetUserProperties,
		BridgeMethod::GetUserProperties,
		BridgeMethod::ConnectEmbedding,
		BridgeMethod::DisconnectEmbedding,
		BridgeMethod::ConnectRemoteConfig,
		BridgeMethod::DisconnectRemoteConfig,
		BridgeMethod::GetRemoteConfigValue,
		BridgeMethod::ConnectEmbeddingInRemoteConfigValue,
		BridgeMethod::ConnectTooltip,
		BridgeMethod::ConnectTooltipEmbedding,
		BridgeMethod::CallTooltipEmbeddingDispatch,
		BridgeMethod::DisconnectTooltip,
		BridgeMethod::Dispatch,
		BridgeMethod::RecordCrash,
	];

	pub fn name(self) -> &'static str {
		match self {
			BridgeMethod::GetSdkVersion => "getNubrickSDKVersion",
			BridgeMethod::GetUserId => "getUserId",
			BridgeMethod::SetUserProperties => "setUserProperties",
			BridgeMethod::GetUserProperties => "getUserProperties",
			BridgeMethod::ConnectEmbedding => "connectEmbedding",
			BridgeMethod::DisconnectEmbedding => "disconnectEmbedding",
			BridgeMethod::ConnectRemoteConfig => "connectRemoteConfig",
			BridgeMethod::DisconnectRemoteConfig => "disconnectRemoteConfig",
			BridgeMethod::GetRemoteConfigValue => "getRemoteConfigValue",
			BridgeMethod::ConnectEmbeddingInRemoteConfigValue => {
				"connectEmbeddingInRemoteConfigValue"
			}
			BridgeMethod::ConnectTooltip => "connectTooltip",
			BridgeMethod::ConnectTooltipEmbedding => "connectTooltipEmbedding",
			BridgeMethod::CallTooltipEmbeddingDispatch => "callTooltipEmbeddingDispatch",
			BridgeMethod::DisconnectTooltip => "disconnectTooltip",
			BridgeMethod::Dispatch => "dispatch",
			BridgeMethod::RecordCrash => "recordCrash",
		}
	}

	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|m| m.name() == name)
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelArgs {
	#[serde(default)]
	pub channel_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectEmbeddingArgs {
	#[serde(default)]
	pub channel_id: String,
	#[serde(default)]
	pub experiment_id: String,
	#[serde(default)]
	pub component_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRemoteConfigArgs {
	#[serde(default)]
	pub channel_id: String,
	#[serde(default)]
	pub experiment_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfigValueArgs {
	#[serde(default)]
	pub channel_id: String,
	#[serde(default)]
	pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingInRemoteConfigArgs {
	#[serde(default)]
	pub channel_id: String,
	#[serde(default)]
	pub key: String,
	#[serde(default)]
	pub embedding_channel_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameArgs {
	#[serde(default)]
	pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectTooltipEmbeddingArgs {
	#[serde(default)]
	pub channel_id: String,
	/// Serialized root UI block of the tooltip.
	#[serde(default)]
	pub root_block: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipDispatchArgs {
	#[serde(default)]
	pub channel_id: String,
	#[serde(default)]
	pub event: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordCrashArgs {
	/// Raw records, parsed leniently by [`crate::parse_exception_records`].
	#[serde(default)]
	pub exceptions: Vec<Value>,
	#[serde(default)]
	pub flutter_sdk_version: Option<String>,
	#[serde(default)]
	pub severity: Option<String>,
}
