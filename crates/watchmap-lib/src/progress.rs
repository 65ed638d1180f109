//! Durable watched flags.
//!
//! [`ProgressStore`] is the only component that talks to the persistence backend.
//! Everything else reads watched state through [`WatchedState`].
//!
//! Every mutation follows the same order: update memory, persist, then notify listeners.

use std::collections::HashMap;
use serde::{Serialize, Deserialize};

use crate::catalog::ItemId;

mod backend;
pub use backend::KeyValueBackend;
pub use backend::MemoryBackend;
pub use backend::FileBackend;

type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Mapping from item id to its watched flag. Absent ids are unwatched.
///
/// Ids that are not in the catalog are kept as-is so a catalog change doesn't lose progress.
/// The order ids were last set in is kept too, and persisted as the key order of the JSON object,
/// so "most recently watched" survives a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "JsonObject", into = "JsonObject")]
pub struct WatchedState {
	flags: HashMap<ItemId, bool>,
	/// Every id in `flags`, least recently set first.
	order: Vec<ItemId>,
}

impl WatchedState {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_watched(&self, id: &str) -> bool {
		self.flags.get(id).copied().unwrap_or(false)
	}

	/// Setting an id, to either value, makes it the most recent.
	pub fn set(&mut self, id: impl Into<ItemId>, watched: bool) {
		let id = id.into();
		if self.flags.insert(id.clone(), watched).is_some() {
			self.order.retain(|o| *o != id);
		}
		self.order.push(id);
	}

	pub fn clear(&mut self) {
		self.flags.clear();
		self.order.clear();
	}

	pub fn is_empty(&self) -> bool {
		self.flags.is_empty()
	}

	pub fn len(&self) -> usize {
		self.flags.len()
	}

	/// Ids currently flagged as watched, least recently set first.
	pub fn watched_ids(&self) -> impl Iterator<Item = &ItemId> {
		self.order.iter().filter(|id| self.is_watched(id))
	}

	/// Ids currently flagged as watched, most recently set first.
	pub fn recently_watched(&self) -> impl Iterator<Item = &ItemId> {
		self.order.iter().rev().filter(|id| self.is_watched(id))
	}

	/// Every entry, least recently set first.
	pub fn iter(&self) -> impl Iterator<Item = (&ItemId, bool)> {
		self.order.iter().map(|id| (id, self.is_watched(id)))
	}
}

impl FromIterator<(ItemId, bool)> for WatchedState {
	fn from_iter<T: IntoIterator<Item = (ItemId, bool)>>(iter: T) -> Self {
		let mut state = Self::default();
		for (id, watched) in iter {
			state.set(id, watched);
		}
		state
	}
}

impl TryFrom<JsonObject> for WatchedState {
	type Error = String;

	fn try_from(object: JsonObject) -> Result<Self, Self::Error> {
		object.into_iter()
			.map(|(id, value)| match value {
				serde_json::Value::Bool(watched) => Ok((id, watched)),
				other => Err(format!("expected a boolean for \"{}\", found {}", id, other)),
			})
			.collect()
	}
}

impl From<WatchedState> for JsonObject {
	fn from(state: WatchedState) -> Self {
		let WatchedState { mut flags, order } = state;
		order.into_iter()
			.filter_map(|id| flags.remove(&id).map(|w| (id, serde_json::Value::Bool(w))))
			.collect()
	}
}

/// What a mutation changed, passed to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
	/// A single item was set or toggled.
	Changed { id: ItemId, watched: bool },
	/// Several items were set in one batch.
	Batch { ids: Vec<ItemId>, watched: bool },
	/// All progress was removed.
	Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&ProgressEvent, &WatchedState)>;

pub struct ProgressStore<B: KeyValueBackend> {
	backend: B,
	key: String,
	state: WatchedState,
	listeners: Vec<(SubscriptionId, Listener)>,
	next_subscription: u64,
}

impl<B: KeyValueBackend + std::fmt::Debug> std::fmt::Debug for ProgressStore<B> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ProgressStore")
			.field("backend", &self.backend)
			.field("key", &self.key)
			.field("state", &self.state)
			.field("listeners", &self.listeners.len())
			.finish()
	}
}

impl<B: KeyValueBackend> ProgressStore<B> {
	/// Reads the persisted mapping stored under `key`.
	///
	/// Never fails: a missing key, an unreadable backend or malformed data all produce empty progress.
	pub fn load(backend: B, key: impl Into<String>) -> Self {
		let key = key.into();
		let state = match backend.get(&key) {
			Ok(Some(raw)) => match serde_json::from_str::<WatchedState>(&raw) {
				Ok(state) => {
					log::debug!("Loaded progress for {} items from \"{}\"", state.len(), key);
					state
				},
				Err(e) => {
					log::warn!("Discarding malformed progress under \"{}\": {}", key, e);
					WatchedState::default()
				},
			},
			Ok(None) => {
				log::debug!("No saved progress under \"{}\", starting fresh", key);
				WatchedState::default()
			},
			Err(e) => {
				log::warn!("Failed to read progress under \"{}\", starting fresh: {}", key, e);
				WatchedState::default()
			},
		};

		Self {
			backend,
			key,
			state,
			listeners: Default::default(),
			next_subscription: 0,
		}
	}

	pub fn backend(&self) -> &B {
		&self.backend
	}

	pub fn key(&self) -> &str {
		&self.key
	}

	pub fn state(&self) -> &WatchedState {
		&self.state
	}

	pub fn is_watched(&self, id: &str) -> bool {
		self.state.is_watched(id)
	}

	/// Persists the current mapping without notifying anyone.
	pub fn save(&mut self) -> crate::Result<()> {
		let raw = serde_json::to_string(&self.state)?;
		self.backend.set(&self.key, &raw)?;
		log::debug!("Saved progress under \"{}\"", self.key);
		Ok(())
	}

	pub fn set_watched(&mut self, id: impl Into<ItemId>, watched: bool) -> crate::Result<()> {
		let id = id.into();
		self.state.set(id.clone(), watched);
		let res = self.save();
		self.notify(&ProgressEvent::Changed { id, watched });
		res
	}

	/// Flips the flag for `id` and returns the new value.
	pub fn toggle(&mut self, id: impl Into<ItemId>) -> crate::Result<bool> {
		let id = id.into();
		let watched = !self.state.is_watched(&id);
		self.set_watched(id, watched)?;
		Ok(watched)
	}

	/// Sets every id in `ids` with a single write and a single notification.
	pub fn set_many(&mut self, ids: impl IntoIterator<Item = impl Into<ItemId>>, watched: bool) -> crate::Result<()> {
		let ids: Vec<ItemId> = ids.into_iter().map(Into::into).collect();
		for id in &ids {
			self.state.set(id.clone(), watched);
		}
		let res = self.save();
		self.notify(&ProgressEvent::Batch { ids, watched });
		res
	}

	/// Forgets all progress, in memory and in the backend.
	pub fn clear(&mut self) -> crate::Result<()> {
		self.state.clear();
		let res = self.backend.delete(&self.key);
		if res.is_ok() {
			log::debug!("Removed saved progress under \"{}\"", self.key);
		}
		self.notify(&ProgressEvent::Cleared);
		res
	}

	/// Registers a listener called after every mutation, in registration order.
	pub fn subscribe(&mut self, listener: impl FnMut(&ProgressEvent, &WatchedState) + 'static) -> SubscriptionId {
		let id = SubscriptionId(self.next_subscription);
		self.next_subscription += 1;
		self.listeners.push((id, Box::new(listener)));
		id
	}

	/// Returns `false` if the subscription was already removed.
	pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
		let before = self.listeners.len();
		self.listeners.retain(|(i, _)| *i != id);
		self.listeners.len() != before
	}

	pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
		self.listeners.iter().any(|(i, _)| *i == id)
	}

	pub fn listener_count(&self) -> usize {
		self.listeners.len()
	}

	fn notify(&mut self, event: &ProgressEvent) {
		log::trace!("Notifying {} listeners of {:?}", self.listeners.len(), event);
		for (_, listener) in self.listeners.iter_mut() {
			listener(event, &self.state);
		}
	}
}
