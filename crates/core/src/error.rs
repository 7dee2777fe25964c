//! Error types for the bridge manager.

use thiserror::Error;

/// Result type alias for method-call routing.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Failure of a shell method call before any bridge operation ran.
///
/// Bridge operations themselves report outcomes as phases or, for tooltips,
/// as a [`TooltipError`] folded into the result string.
#[derive(Debug, Error)]
pub enum BridgeError {
	/// Argument failed validation.
	#[error("invalid argument: {0}")]
	InvalidArgument(String),

	/// The shell called a method this bridge does not implement.
	#[error("method not implemented: {0}")]
	MethodNotImplemented(String),

	/// Argument (de)serialization failed.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

/// Why a tooltip fetch produced no body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TooltipError {
	#[error("the name is empty")]
	EmptyName,

	#[error("the client is not initialized")]
	NotInitialized,

	/// The SDK had nothing for the trigger, or the fetch failed.
	#[error("not found")]
	NotFound,
}

impl TooltipError {
	/// The string handed back to the shell in place of the tooltip body.
	pub fn to_wire_string(&self) -> String {
		format!("error: {self}")
	}
}
