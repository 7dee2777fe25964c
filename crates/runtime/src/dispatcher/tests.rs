use std::time::Duration;

use nubrick_protocol::{Method, NextTooltip, Phase, SizeUpdate};
use serde_json::json;

use super::*;
use crate::error::Error;
use crate::transport::MemoryTransport;

#[tokio::test]
async fn messages_are_delivered_in_enqueue_order() {
	let (transport, mut rx) = MemoryTransport::new();
	let (dispatcher, delivery) = Dispatcher::new("Nubrick", transport);
	let handle = delivery.spawn();

	dispatcher.send_phase("e1", Phase::Completed);
	dispatcher.send_payload(
		"e1",
		Method::SizeUpdate,
		&SizeUpdate {
			width: 320.0,
			height: 100.0,
		},
	);
	dispatcher.send("e1", Method::OnDismissTooltip, json!(null));
	drop(dispatcher);

	assert_eq!(handle.await.unwrap(), 3);

	let messages = rx.drain();
	let methods: Vec<_> = messages.iter().map(|m| m.method).collect();
	assert_eq!(
		methods,
		vec![Method::PhaseUpdate, Method::SizeUpdate, Method::OnDismissTooltip]
	);
	assert!(messages.iter().all(|m| m.channel == "Nubrick/Embedding/e1"));
	assert_eq!(messages[0].payload, json!("completed"));
	assert_eq!(messages[1].payload, json!({"width": 320.0, "height": 100.0}));
}

#[tokio::test]
async fn loading_phase_is_never_sent() {
	let (transport, mut rx) = MemoryTransport::new();
	let (dispatcher, delivery) = Dispatcher::new("Nubrick", transport);
	let handle = delivery.spawn();

	dispatcher.send_phase("e1", Phase::Loading);
	dispatcher.send_phase("e1", Phase::NotFound);
	drop(dispatcher);
	handle.await.unwrap();

	let messages = rx.drain();
	assert_eq!(messages.len(), 1);
	assert_eq!(messages[0].as_phase(), Some(Phase::NotFound));
}

#[tokio::test]
async fn channel_uses_configured_namespace() {
	let (transport, mut rx) = MemoryTransport::new();
	let (dispatcher, delivery) = Dispatcher::new("Nativebrik", transport);
	let handle = delivery.spawn();

	dispatcher.send_payload(
		"t1",
		Method::OnNextTooltip,
		&NextTooltip {
			page_id: "p2".into(),
		},
	);

	let message = rx.recv_timeout(Duration::from_secs(1)).await.unwrap();
	assert_eq!(message.channel, "Nativebrik/Embedding/t1");
	assert_eq!(message.payload, json!({"pageId": "p2"}));

	drop(dispatcher);
	handle.await.unwrap();
}

#[tokio::test]
async fn transport_failures_are_swallowed() {
	let mut calls = 0;
	let transport = move |message: OutboundMessage| -> crate::Result<()> {
		calls += 1;
		if calls == 1 {
			Err(Error::Transport(format!("no listener on {}", message.channel)))
		} else {
			Ok(())
		}
	};
	let (dispatcher, delivery) = Dispatcher::new("Nubrick", transport);
	let handle = delivery.spawn();

	dispatcher.send("gone", Method::OnEvent, json!({"name": "tap"}));
	dispatcher.send("live", Method::OnEvent, json!({"name": "tap"}));
	drop(dispatcher);

	assert_eq!(handle.await.unwrap(), 1);
}

#[tokio::test]
async fn sending_after_loop_stops_is_a_noop() {
	let (transport, _rx) = MemoryTransport::new();
	let (dispatcher, delivery) = Dispatcher::new("Nubrick", transport);
	drop(delivery);

	assert!(dispatcher.is_closed());
	dispatcher.send("e1", Method::OnDismissTooltip, json!(null));
}

#[tokio::test]
async fn clones_share_one_queue() {
	let (transport, mut rx) = MemoryTransport::new();
	let (dispatcher, delivery) = Dispatcher::new("Nubrick", transport);
	let handle = delivery.spawn();

	let mut tasks = Vec::new();
	for i in 0..8 {
		let dispatcher = dispatcher.clone();
		tasks.push(tokio::spawn(async move {
			dispatcher.send(&format!("c{i}"), Method::OnDismissTooltip, json!(null));
		}));
	}
	for task in tasks {
		task.await.unwrap();
	}
	drop(dispatcher);

	assert_eq!(handle.await.unwrap(), 8);
	assert_eq!(rx.drain().len(), 8);
}
