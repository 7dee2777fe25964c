//! Host-shell harness for the Nubrick bridge.
//!
//! Plays the role of the cross-platform shell: method calls arrive as NDJSON
//! on stdin, results and outbound channel messages leave as NDJSON on stdout.
//! The SDK is a [`CatalogSdk`](nubrick_bridge::CatalogSdk) loaded from the
//! host config file.

pub mod cli;
pub mod error;
pub mod host;
pub mod logging;
