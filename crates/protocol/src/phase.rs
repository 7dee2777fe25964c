//! Connect phases and their wire vocabulary.

use serde::{Deserialize, Serialize};

/// Status of an asynchronous SDK operation.
///
/// Only terminal phases have a wire representation. [`Phase::Loading`] is a
/// valid domain state but is never sent: the shell infers loading from the
/// absence of a terminal `phase-update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
	/// Fetch is still in flight.
	Loading,
	/// Fetch resolved and the session was committed.
	Completed,
	/// The requested experiment, component or id does not exist.
	NotFound,
	/// Any other failure.
	Failed,
}

impl Phase {
	/// Returns the string sent over the wire, or `None` for [`Phase::Loading`].
	pub fn wire_value(self) -> Option<&'static str> {
		match self {
			Phase::Loading => None,
			Phase::Completed => Some("completed"),
			Phase::NotFound => Some("not-found"),
			Phase::Failed => Some("failed"),
		}
	}

	/// Parses a wire value back into a phase.
	pub fn from_wire(value: &str) -> Option<Self> {
		match value {
			"completed" => Some(Phase::Completed),
			"not-found" => Some(Phase::NotFound),
			"failed" => Some(Phase::Failed),
			_ => None,
		}
	}
}

impl std::fmt::Display for Phase {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.wire_value().unwrap_or("loading"))
	}
}
