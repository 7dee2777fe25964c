//! NDJSON host loop.
//!
//! Reads one method call per line from the input and writes one JSON line per
//! result or outbound channel message to the output. Both kinds share the
//! output stream and are told apart by `kind`.
//!
//! # Protocol
//!
//! ## Request Format
//!
//! | Field | Type | Description |
//! |-------|------|-------------|
//! | `id` | `string?` | Echoed in the result line |
//! | `method` | `string` | Bridge method name (e.g. `"connectEmbedding"`) |
//! | `arguments` | `object?` | Method arguments, camelCase |
//!
//! ```json
//! {"id": "1", "method": "connectEmbedding", "arguments": {"channelId": "e1", "experimentId": "exp-1"}}
//! ```
//!
//! ## Output Format
//!
//! ```json
//! {"kind":"result","id":"1","ok":true,"method":"connectEmbedding","data":"ok"}
//! {"kind":"message","channel":"Nubrick/Embedding/e1","method":"phase-update","payload":"completed"}
//! {"kind":"result","id":"2","ok":false,"method":"nope","error":{"code":"METHOD_NOT_IMPLEMENTED","message":"..."}}
//! ```
//!
//! Calls that wait on the SDK (`connectRemoteConfig`, `connectTooltip`) do not
//! block the input: their registry work happens when the line is read, and the
//! result line is written once the fetch settles. Match results to requests by
//! `id`. Result lines and message lines are written by different tasks, so
//! their relative order is not fixed. Messages for one channel keep their
//! order.
//!
//! ## Host Commands
//!
//! | Method | Description |
//! |--------|-------------|
//! | `ping` | Answers immediately |
//! | `drain` | Waits for every pending connect and result to settle |
//! | `quit` | Stops reading input |
//!
//! On end of input or `quit`, pending connects are drained and every queued
//! result and message is flushed before the host returns.

#[cfg(test)]
mod tests;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use nubrick_bridge::{
	BridgeConfig, BridgeManager, Catalog, CatalogSdk, ConnectFuture, MethodCall, MethodRouter,
	Reply,
};
use nubrick_protocol::OutboundMessage;
use nubrick_runtime::Transport;
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::error::{HostError, Result, bridge_error_code};

/// Host config file: bridge settings plus the catalog served as the SDK.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostConfig {
	#[serde(default)]
	pub bridge: BridgeConfig,
	#[serde(default)]
	pub catalog: Catalog,
}

impl HostConfig {
	pub fn load(path: &Path) -> Result<Self> {
		let raw = std::fs::read_to_string(path).map_err(|source| HostError::ConfigRead {
			path: path.to_path_buf(),
			source,
		})?;
		serde_json::from_str(&raw).map_err(|source| HostError::ConfigParse {
			path: path.to_path_buf(),
			source,
		})
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostOptions {
	/// Install the catalog SDK before reading input.
	pub install_sdk: bool,
}

impl Default for HostOptions {
	fn default() -> Self {
		Self { install_sdk: true }
	}
}

/// One request line.
#[derive(Debug, Deserialize)]
pub struct HostRequest {
	#[serde(default)]
	pub id: Option<String>,
	pub method: String,
	#[serde(default)]
	pub arguments: Value,
}

/// One output line.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HostLine {
	Result(HostResponse),
	Message(OutboundMessage),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostResponse {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	pub ok: bool,
	pub method: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<ResponseError>,
}

#[derive(Debug, Serialize)]
pub struct ResponseError {
	pub code: String,
	pub message: String,
}

impl HostResponse {
	fn success(id: Option<String>, method: &str, data: Value) -> Self {
		Self {
			id,
			ok: true,
			method: method.to_string(),
			data: Some(data),
			error: None,
		}
	}

	fn error(id: Option<String>, method: &str, code: &str, message: &str) -> Self {
		Self {
			id,
			ok: false,
			method: method.to_string(),
			data: None,
			error: Some(ResponseError {
				code: code.to_string(),
				message: message.to_string(),
			}),
		}
	}
}

/// Line writer shared by the request loop and the delivery loop.
pub struct SharedWriter<W> {
	inner: Arc<Mutex<W>>,
}

impl<W> Clone for SharedWriter<W> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<W: Write> SharedWriter<W> {
	pub fn new(writer: W) -> Self {
		Self {
			inner: Arc::new(Mutex::new(writer)),
		}
	}

	pub fn lock(&self) -> MutexGuard<'_, W> {
		self.inner.lock()
	}

	/// Writes `line` as one JSON line and flushes.
	pub fn write_line(&self, line: &HostLine) -> std::io::Result<()> {
		let json = serde_json::to_string(line)?;
		let mut writer = self.lock();
		writeln!(writer, "{json}")?;
		writer.flush()
	}
}

/// [`Transport`] writing channel messages as `kind: "message"` lines.
pub struct LineTransport<W> {
	out: SharedWriter<W>,
}

impl<W> LineTransport<W> {
	pub fn new(out: SharedWriter<W>) -> Self {
		Self { out }
	}
}

impl<W: Write + Send + 'static> Transport for LineTransport<W> {
	fn send(&mut self, message: OutboundMessage) -> nubrick_runtime::Result<()> {
		self.out.write_line(&HostLine::Message(message))?;
		Ok(())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostSummary {
	/// Non-empty input lines read.
	pub requests: usize,
	/// Channel messages written.
	pub delivered: usize,
}

/// Serves stdin/stdout until end of input or `quit`.
pub async fn serve_stdio(config: HostConfig, options: HostOptions) -> Result<HostSummary> {
	let input = BufReader::new(tokio::io::stdin());
	run_host(config, options, input, SharedWriter::new(std::io::stdout())).await
}

/// Runs the host loop over arbitrary input and output.
pub async fn run_host<R, W>(
	config: HostConfig,
	options: HostOptions,
	input: R,
	out: SharedWriter<W>,
) -> Result<HostSummary>
where
	R: AsyncBufRead + Unpin,
	W: Write + Send + 'static,
{
	let HostConfig { bridge, catalog } = config;
	tracing::info!(namespace = %bridge.namespace, sdk = options.install_sdk, "Starting bridge host");

	let (manager, delivery) = BridgeManager::start(bridge, LineTransport::new(out.clone()));
	if options.install_sdk {
		manager.set_sdk(Arc::new(CatalogSdk::new(catalog)));
	}
	let router = MethodRouter::new(manager);

	let mut lines = input.lines();
	let mut requests = 0;
	loop {
		let line = match lines.next_line().await {
			Ok(Some(line)) => line,
			Ok(None) => break,
			Err(e) => {
				tracing::error!(error = %e, "input read failed");
				break;
			}
		};
		let line = line.trim();
		if line.is_empty() {
			continue;
		}
		requests += 1;

		let request: HostRequest = match serde_json::from_str(line) {
			Ok(request) => request,
			Err(e) => {
				let response = HostResponse::error(None, "unknown", "PARSE_ERROR", &e.to_string());
				out.write_line(&HostLine::Result(response))?;
				continue;
			}
		};

		let response = match request.method.as_str() {
			"ping" => HostResponse::success(request.id, "ping", Value::from("pong")),
			"drain" => {
				router.drain().await;
				HostResponse::success(request.id, "drain", Value::Null)
			}
			"quit" => {
				out.write_line(&HostLine::Result(HostResponse::success(
					request.id,
					"quit",
					Value::Null,
				)))?;
				break;
			}
			_ => match start(&router, request) {
				Started::Answered(response) => response,
				Started::Pending { id, method, reply } => {
					let out = out.clone();
					router.spawn(async move {
						let response = HostResponse::success(id, &method, reply.await);
						if let Err(e) = out.write_line(&HostLine::Result(response)) {
							tracing::error!(%method, error = %e, "result write failed");
						}
					});
					continue;
				}
			},
		};
		out.write_line(&HostLine::Result(response))?;
	}

	router.drain().await;
	drop(router);
	let delivered = delivery.await?;
	Ok(HostSummary {
		requests,
		delivered,
	})
}

/// Outcome of reading one bridge call off the input.
enum Started {
	Answered(HostResponse),
	Pending {
		id: Option<String>,
		method: String,
		reply: ConnectFuture<Value>,
	},
}

fn start(router: &MethodRouter, request: HostRequest) -> Started {
	let call = MethodCall::new(request.method, request.arguments);
	match router.call(&call) {
		Ok(Reply::Ready(data)) => Started::Answered(HostResponse::success(request.id, &call.method, data)),
		Ok(Reply::Pending(reply)) => Started::Pending {
			id: request.id,
			method: call.method,
			reply,
		},
		Err(e) => {
			tracing::debug!(method = %call.method, error = %e, "Method call failed");
			Started::Answered(HostResponse::error(
				request.id,
				&call.method,
				bridge_error_code(&e),
				&e.to_string(),
			))
		}
	}
}
