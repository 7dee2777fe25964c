use std::path::PathBuf;

use nubrick_bridge::BridgeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HostError>;

#[derive(Debug, Error)]
pub enum HostError {
	#[error("failed to read config {path}")]
	ConfigRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid config {path}")]
	ConfigParse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("delivery loop failed: {0}")]
	Delivery(#[from] tokio::task::JoinError),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

/// Error code reported in the result line of a failed method call.
pub fn bridge_error_code(err: &BridgeError) -> &'static str {
	match err {
		BridgeError::MethodNotImplemented(_) => "METHOD_NOT_IMPLEMENTED",
		BridgeError::InvalidArgument(_) | BridgeError::Json(_) => "INVALID_INPUT",
	}
}
