//! Error types for the bridge runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the bridge runtime.
#[derive(Debug, Error)]
pub enum Error {
	/// The receiving side of a channel has gone away.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,

	/// The host transport rejected a message.
	#[error("Transport error: {0}")]
	Transport(String),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns true if the failure means the peer is gone for good.
	pub fn is_closed(&self) -> bool {
		match self {
			Error::ChannelClosed => true,
			Error::Io(e) => e.kind() == std::io::ErrorKind::BrokenPipe,
			_ => false,
		}
	}
}
