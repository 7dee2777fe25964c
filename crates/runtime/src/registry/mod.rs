//! Keyed session stores with epoch-guarded commits.
//!
//! Uses [`DashMap`] for concurrent access from completion tasks. Every
//! registration or reservation stamps the slot with a fresh epoch and hands
//! back a [`Ticket`]; [`SessionStore::commit`] and [`SessionStore::update`]
//! only write while the slot still carries that epoch. A `remove` drops the
//! slot, and a newer `register`/`reserve` restamps it, so both invalidate any
//! ticket issued before them.
//!
//! Closures passed to `update` run under the shard lock and must not touch
//! the same store.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

/// Proof of a registration, checked when an async completion commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
	id: Arc<str>,
	epoch: u64,
}

impl Ticket {
	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn epoch(&self) -> u64 {
		self.epoch
	}
}

struct Slot<T> {
	epoch: u64,
	state: Option<T>,
}

/// Registry of one session kind, keyed by channel id.
pub struct SessionStore<T> {
	kind: &'static str,
	slots: DashMap<Arc<str>, Slot<T>>,
	next_epoch: AtomicU64,
}

impl<T> SessionStore<T> {
	/// Creates an empty store; `kind` only appears in logs.
	pub fn new(kind: &'static str) -> Self {
		Self {
			kind,
			slots: DashMap::new(),
			next_epoch: AtomicU64::new(1),
		}
	}

	pub fn kind(&self) -> &'static str {
		self.kind
	}

	fn bump(&self) -> u64 {
		self.next_epoch.fetch_add(1, Ordering::SeqCst)
	}

	/// Inserts `state`, fully replacing any previous session under `id`.
	pub fn register(&self, id: &str, state: T) -> Ticket {
		let id: Arc<str> = Arc::from(id);
		let epoch = self.bump();
		self.slots.insert(
			Arc::clone(&id),
			Slot {
				epoch,
				state: Some(state),
			},
		);
		tracing::trace!(kind = self.kind, channel_id = %id, epoch, "registered session");
		Ticket { id, epoch }
	}

	/// Claims `id` for a pending connect without touching its current state.
	pub fn reserve(&self, id: &str) -> Ticket {
		let id: Arc<str> = Arc::from(id);
		let epoch = self.bump();
		self.slots
			.entry(Arc::clone(&id))
			.and_modify(|slot| slot.epoch = epoch)
			.or_insert(Slot { epoch, state: None });
		tracing::trace!(kind = self.kind, channel_id = %id, epoch, "reserved session");
		Ticket { id, epoch }
	}

	/// Replaces the state if `ticket` is still current. Returns whether it was applied.
	pub fn commit(&self, ticket: &Ticket, state: T) -> bool {
		match self.slots.get_mut(ticket.id()) {
			Some(mut slot) if slot.epoch == ticket.epoch => {
				slot.state = Some(state);
				true
			}
			_ => {
				tracing::debug!(
					kind = self.kind,
					channel_id = %ticket.id,
					epoch = ticket.epoch,
					"stale commit dropped"
				);
				false
			}
		}
	}

	/// Mutates existing state if `ticket` is still current. Returns whether it was applied.
	pub fn update<F>(&self, ticket: &Ticket, f: F) -> bool
	where
		F: FnOnce(&mut T),
	{
		if let Some(mut slot) = self.slots.get_mut(ticket.id()) {
			if slot.epoch == ticket.epoch {
				if let Some(state) = slot.state.as_mut() {
					f(state);
					return true;
				}
			}
		}
		tracing::debug!(
			kind = self.kind,
			channel_id = %ticket.id,
			epoch = ticket.epoch,
			"stale update dropped"
		);
		false
	}

	/// Drops a reservation that never received state.
	///
	/// Slots that hold state, or were restamped since, are left alone.
	pub fn release(&self, ticket: &Ticket) {
		self.slots
			.remove_if(ticket.id(), |_, slot| slot.epoch == ticket.epoch && slot.state.is_none());
	}

	/// Removes the session under `id`, invalidating outstanding tickets.
	pub fn remove(&self, id: &str) -> Option<T> {
		let removed = self.slots.remove(id).and_then(|(_, slot)| slot.state);
		tracing::trace!(kind = self.kind, channel_id = id, existed = removed.is_some(), "removed session");
		removed
	}

	/// Returns true if `ticket` is the latest claim on its id.
	pub fn is_live(&self, ticket: &Ticket) -> bool {
		self.slots
			.get(ticket.id())
			.is_some_and(|slot| slot.epoch == ticket.epoch)
	}

	/// Returns true if a session with state exists under `id`.
	pub fn contains(&self, id: &str) -> bool {
		self.slots.get(id).is_some_and(|slot| slot.state.is_some())
	}

	/// Number of sessions holding state.
	pub fn len(&self) -> usize {
		self.slots.iter().filter(|slot| slot.state.is_some()).count()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Sorted ids of sessions holding state.
	pub fn ids(&self) -> Vec<String> {
		let mut ids: Vec<String> = self
			.slots
			.iter()
			.filter(|slot| slot.state.is_some())
			.map(|slot| slot.key().to_string())
			.collect();
		ids.sort();
		ids
	}
}

impl<T: Clone> SessionStore<T> {
	/// Synchronous lookup.
	pub fn get(&self, id: &str) -> Option<T> {
		self.slots.get(id).and_then(|slot| slot.state.clone())
	}
}
