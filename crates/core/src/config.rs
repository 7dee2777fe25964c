//! Bridge configuration.

use nubrick_protocol::{DEFAULT_CRASH_PLATFORM, DEFAULT_NAMESPACE};
use serde::{Deserialize, Serialize};

/// Settings for one [`BridgeManager`](crate::BridgeManager).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeConfig {
	/// Channel name prefix, `"<namespace>/Embedding/<channel id>"`.
	pub namespace: String,
	/// Platform tag attached to crash reports.
	pub crash_platform: String,
}

impl Default for BridgeConfig {
	fn default() -> Self {
		Self {
			namespace: DEFAULT_NAMESPACE.to_string(),
			crash_platform: DEFAULT_CRASH_PLATFORM.to_string(),
		}
	}
}

impl BridgeConfig {
	pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
		self.namespace = namespace.into();
		self
	}
}
