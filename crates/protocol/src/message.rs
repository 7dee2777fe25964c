//! Outbound channel messages.
//!
//! Every session owns one channel named `"<namespace>/Embedding/<channel id>"`.
//! Messages on it carry a fixed method name and a payload whose shape is
//! determined by that method.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::phase::Phase;

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "Nubrick";

/// Builds the channel name for a session.
pub fn channel_name(namespace: &str, channel_id: &str) -> String {
	format!("{namespace}/Embedding/{channel_id}")
}

/// Method names used on session channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
	/// Terminal phase of a connect, payload is the phase string.
	PhaseUpdate,
	/// Intrinsic size, payload is [`SizeUpdate`].
	SizeUpdate,
	/// UI interaction, payload is [`UiEvent`].
	OnEvent,
	/// Tooltip advanced, payload is [`NextTooltip`].
	OnNextTooltip,
	/// Tooltip dismissed, payload is `null`.
	OnDismissTooltip,
}

impl Method {
	pub fn as_str(self) -> &'static str {
		match self {
			Method::PhaseUpdate => "phase-update",
			Method::SizeUpdate => "size-update",
			Method::OnEvent => "on-event",
			Method::OnNextTooltip => "on-next-tooltip",
			Method::OnDismissTooltip => "on-dismiss-tooltip",
		}
	}
}

impl std::fmt::Display for Method {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One message handed to the host transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
	/// Full channel name, see [`channel_name`].
	pub channel: String,
	pub method: Method,
	pub payload: Value,
}

impl OutboundMessage {
	/// Builds a `phase-update` message, or `None` for phases with no wire value.
	pub fn phase(channel: String, phase: Phase) -> Option<Self> {
		let value = phase.wire_value()?;
		Some(Self {
			channel,
			method: Method::PhaseUpdate,
			payload: Value::String(value.to_string()),
		})
	}

	/// Returns the phase carried by a `phase-update` message.
	pub fn as_phase(&self) -> Option<Phase> {
		match self.method {
			Method::PhaseUpdate => self.payload.as_str().and_then(Phase::from_wire),
			_ => None,
		}
	}
}

/// Payload of `size-update`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeUpdate {
	pub width: f64,
	pub height: f64,
}

/// Payload of `on-event`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiEvent {
	pub name: Option<String>,
	#[serde(default)]
	pub deep_link: Option<String>,
	#[serde(default)]
	pub payload: Option<Vec<EventProperty>>,
}

impl UiEvent {
	pub fn named(name: impl Into<String>) -> Self {
		Self {
			name: Some(name.into()),
			..Default::default()
		}
	}
}

/// A typed key/value attached to a [`UiEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventProperty {
	pub name: String,
	pub value: String,
	#[serde(rename = "type")]
	pub kind: String,
}

/// Payload of `on-next-tooltip`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextTooltip {
	pub page_id: String,
}
