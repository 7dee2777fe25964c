use std::collections::HashMap;

use serde_json::json;

use super::*;

fn catalog() -> Catalog {
	Catalog::default()
		.with_embedding("exp-1", json!({"id": "hero", "width": 100.0, "height": 50.0}))
		.with_remote_config("exp-rc", [("key", "abc")])
		.with_tooltip("onboarding", "{\"pages\":[]}")
		.with_user_id("user-1")
}

async fn run(input: &str, options: HostOptions) -> (HostSummary, Vec<Value>) {
	run_with(catalog(), input, options).await
}

async fn run_with(catalog: Catalog, input: &str, options: HostOptions) -> (HostSummary, Vec<Value>) {
	let config = HostConfig {
		bridge: BridgeConfig::default(),
		catalog,
	};
	let out = SharedWriter::new(Vec::new());
	let summary = run_host(config, options, BufReader::new(input.as_bytes()), out.clone())
		.await
		.unwrap();
	let bytes = out.lock().clone();
	let lines = String::from_utf8(bytes)
		.unwrap()
		.lines()
		.map(|line| serde_json::from_str(line).unwrap())
		.collect();
	(summary, lines)
}

fn results(lines: &[Value]) -> Vec<&Value> {
	lines.iter().filter(|l| l["kind"] == "result").collect()
}

/// Result `data` keyed by request id.
fn data_by_id(lines: &[Value]) -> HashMap<String, Value> {
	results(lines)
		.into_iter()
		.filter_map(|r| Some((r["id"].as_str()?.to_string(), r["data"].clone())))
		.collect()
}

fn messages(lines: &[Value]) -> Vec<&Value> {
	lines.iter().filter(|l| l["kind"] == "message").collect()
}

#[tokio::test]
async fn embedding_connect_streams_messages() {
	let input = r#"{"id":"1","method":"connectEmbedding","arguments":{"channelId":"e1","experimentId":"exp-1"}}
{"id":"2","method":"drain"}
"#;
	let (summary, lines) = run(input, HostOptions::default()).await;
	assert_eq!(summary.requests, 2);
	assert_eq!(summary.delivered, 2);

	let results = results(&lines);
	assert_eq!(results[0]["id"], "1");
	assert_eq!(results[0]["ok"], true);
	assert_eq!(results[0]["data"], "ok");

	let messages = messages(&lines);
	assert_eq!(messages.len(), 2);
	assert_eq!(messages[0]["channel"], "Nubrick/Embedding/e1");
	assert_eq!(messages[0]["method"], "phase-update");
	assert_eq!(messages[0]["payload"], "completed");
	assert_eq!(messages[1]["method"], "size-update");
	assert_eq!(messages[1]["payload"], json!({"width": 100.0, "height": 50.0}));
}

#[tokio::test]
async fn awaited_methods_return_values() {
	let input = r#"{"id":"1","method":"connectRemoteConfig","arguments":{"channelId":"c1","experimentId":"exp-rc"}}
{"id":"d","method":"drain"}
{"id":"2","method":"getRemoteConfigValue","arguments":{"channelId":"c1","key":"key"}}
{"id":"3","method":"connectTooltip","arguments":{"name":"onboarding"}}
{"id":"4","method":"connectTooltip","arguments":{"name":""}}
{"id":"5","method":"getUserId"}
"#;
	let (_, lines) = run(input, HostOptions::default()).await;
	let data = data_by_id(&lines);
	assert_eq!(data.len(), 6);
	assert_eq!(data["1"], "completed");
	assert_eq!(data["2"], "abc");
	assert_eq!(data["3"], "{\"pages\":[]}");
	assert_eq!(data["4"], "error: the name is empty");
	assert_eq!(data["5"], "user-1");
	assert!(messages(&lines).is_empty());
}

#[tokio::test]
async fn slow_fetch_does_not_block_input() {
	let mut catalog = catalog();
	catalog.latency_ms.insert("exp-rc".into(), 50);
	let input = r#"{"id":"1","method":"connectRemoteConfig","arguments":{"channelId":"c1","experimentId":"exp-rc"}}
{"id":"2","method":"ping"}
"#;
	let (_, lines) = run_with(catalog, input, HostOptions::default()).await;
	let ids: Vec<_> = results(&lines).iter().map(|r| r["id"].clone()).collect();
	assert_eq!(ids, vec![json!("2"), json!("1")]);
	assert_eq!(data_by_id(&lines)["1"], "completed");
}

#[tokio::test]
async fn disconnect_while_fetch_pending_discards_variant() {
	let mut catalog = catalog();
	catalog.latency_ms.insert("exp-rc".into(), 20);
	let input = r#"{"id":"1","method":"connectRemoteConfig","arguments":{"channelId":"c1","experimentId":"exp-rc"}}
{"id":"2","method":"disconnectRemoteConfig","arguments":{"channelId":"c1"}}
{"id":"3","method":"drain"}
{"id":"4","method":"getRemoteConfigValue","arguments":{"channelId":"c1","key":"key"}}
"#;
	let (_, lines) = run_with(catalog, input, HostOptions::default()).await;
	let data = data_by_id(&lines);
	assert_eq!(data["1"], "completed");
	assert_eq!(data["2"], "ok");
	assert_eq!(data["4"], Value::Null);
}

#[tokio::test]
async fn disconnect_right_after_embedding_connect_sends_nothing() {
	let input = r#"{"id":"1","method":"connectEmbedding","arguments":{"channelId":"e1","experimentId":"exp-1"}}
{"id":"2","method":"disconnectEmbedding","arguments":{"channelId":"e1"}}
"#;
	let (summary, lines) = run(input, HostOptions::default()).await;
	assert_eq!(summary.delivered, 0);
	assert!(messages(&lines).is_empty());
}

#[tokio::test]
async fn errors_are_reported_per_line() {
	let input = r#"not json
{"id":"2","method":"launchRockets"}
{"id":"3","method":"connectEmbedding","arguments":{"channelId":7}}
{"id":"4","method":"ping"}
"#;
	let (summary, lines) = run(input, HostOptions::default()).await;
	assert_eq!(summary.requests, 4);

	let results = results(&lines);
	assert_eq!(results[0]["error"]["code"], "PARSE_ERROR");
	assert_eq!(results[1]["error"]["code"], "METHOD_NOT_IMPLEMENTED");
	assert_eq!(results[1]["id"], "2");
	assert_eq!(results[2]["error"]["code"], "INVALID_INPUT");
	assert_eq!(results[3]["data"], "pong");
}

#[tokio::test]
async fn quit_stops_reading() {
	let input = r#"{"method":"quit"}
{"method":"connectEmbedding","arguments":{"channelId":"e1","experimentId":"exp-1"}}
"#;
	let (summary, lines) = run(input, HostOptions::default()).await;
	assert_eq!(summary.requests, 1);
	assert_eq!(summary.delivered, 0);
	assert_eq!(lines.len(), 1);
	assert_eq!(lines[0]["method"], "quit");
}

#[tokio::test]
async fn without_sdk_connects_settle_not_found() {
	let input = r#"{"method":"connectEmbedding","arguments":{"channelId":"e1","experimentId":"exp-1"}}
{"method":"connectTooltip","arguments":{"name":"onboarding"}}
"#;
	let (_, lines) = run(input, HostOptions { install_sdk: false }).await;
	let messages = messages(&lines);
	assert_eq!(messages.len(), 1);
	assert_eq!(messages[0]["payload"], "not-found");
	assert_eq!(
		results(&lines)[1]["data"],
		"error: the client is not initialized"
	);
}

#[test]
fn config_file_round_trip() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("host.json");
	std::fs::write(
		&path,
		r#"{"bridge":{"namespace":"Nativebrik"},"catalog":{"tooltips":{"t":"{}"}}}"#,
	)
	.unwrap();

	let config = HostConfig::load(&path).unwrap();
	assert_eq!(config.bridge.namespace, "Nativebrik");
	assert_eq!(config.bridge.crash_platform, "flutter");
	assert_eq!(config.catalog.tooltips["t"], "{}");

	let missing = HostConfig::load(&dir.path().join("missing.json")).unwrap_err();
	assert!(matches!(missing, HostError::ConfigRead { .. }));

	std::fs::write(&path, "{").unwrap();
	assert!(matches!(
		HostConfig::load(&path).unwrap_err(),
		HostError::ConfigParse { .. }
	));
}
