//! Visibility and unlock rules.
//!
//! Everything here is a pure function of the [`GraphIndex`] and a [`WatchedState`] snapshot.
//! Nothing is cached, callers build a fresh [`Evaluator`] after every change.
//!
//! - A requirement is *satisfied* when it names a catalog item that is watched.
//! - An item is *visible* when it is the start item, is watched, or all its prerequisites are satisfied.
//! - An item is *unlocked* when it is in phase 1, or its phase is unlocked and all prerequisites are satisfied.
//!
//! Visibility ignores phase gating, items in a locked phase can be previewed but not interacted with.

use serde::{Serialize, Deserialize};

use crate::graph_index::{GraphIndex, IndexedItem};
use crate::progress::WatchedState;

/// The three states a drawn node can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeState {
	Locked,
	/// Interactive but not yet watched.
	Unlocked,
	Watched,
}

impl NodeState {
	/// Style class used by drawing surfaces. `Unlocked` has none.
	pub fn class(&self) -> Option<&'static str> {
		match self {
			NodeState::Locked => Some("locked"),
			NodeState::Unlocked => None,
			NodeState::Watched => Some("watched"),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSummary {
	pub watched: usize,
	pub total: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
	index: &'a GraphIndex,
	watched: &'a WatchedState,
}

impl<'a> Evaluator<'a> {
	pub fn new(index: &'a GraphIndex, watched: &'a WatchedState) -> Self {
		Self { index, watched }
	}

	pub fn index(&self) -> &'a GraphIndex {
		self.index
	}

	pub fn is_watched(&self, id: &str) -> bool {
		self.watched.is_watched(id)
	}

	/// Unknown ids are never satisfied, even if stale progress says they were watched.
	fn is_satisfied(&self, id: &str) -> bool {
		self.index.contains(id) && self.watched.is_watched(id)
	}

	fn prerequisites_satisfied(&self, item: &IndexedItem) -> bool {
		item.prerequisites.iter().all(|p| self.is_satisfied(p))
	}

	pub fn is_phase_unlocked(&self, item: &IndexedItem) -> bool {
		self.is_phase_ordinal_unlocked(item.phase_ordinal())
	}

	/// Phase 1 is always open. Any other phase needs a gatekeeper that is watched.
	pub fn is_phase_ordinal_unlocked(&self, phase_ordinal: u32) -> bool {
		if phase_ordinal == 1 {
			return true
		}
		self.index.phase_gatekeeper(phase_ordinal)
			.map(|g| self.is_satisfied(g))
			.unwrap_or(false)
	}

	pub fn is_unlocked(&self, item: &IndexedItem) -> bool {
		if item.phase_ordinal() == 1 {
			return true
		}
		if !self.is_phase_unlocked(item) {
			return false
		}
		/* A cycle could only ever be satisfied by marking everything at once */
		if item.on_cycle() {
			return false
		}
		self.prerequisites_satisfied(item)
	}

	pub fn is_visible(&self, item: &IndexedItem) -> bool {
		if self.index.start_id() == Some(item.id()) {
			return true
		}
		if self.watched.is_watched(item.id()) {
			return true
		}
		self.prerequisites_satisfied(item)
	}

	/// Highest phase ordinal with an open phase. Never less than 1.
	pub fn highest_unlocked_phase(&self) -> u32 {
		self.index.items()
			.filter(|i| self.is_phase_unlocked(i))
			.map(|i| i.phase_ordinal())
			.max()
			.unwrap_or(1)
			.max(1)
	}

	pub fn node_state(&self, item: &IndexedItem) -> NodeState {
		if self.watched.is_watched(item.id()) {
			NodeState::Watched
		} else if self.is_unlocked(item) {
			NodeState::Unlocked
		} else {
			NodeState::Locked
		}
	}

	/// Visible items in catalog order.
	pub fn visible_items(&self) -> impl Iterator<Item = &'a IndexedItem> + 'a {
		let this = *self;
		self.index.items().filter(move |i| this.is_visible(i))
	}

	/// Unlocked items in catalog order.
	pub fn unlocked_items(&self) -> impl Iterator<Item = &'a IndexedItem> + 'a {
		let this = *self;
		self.index.items().filter(move |i| this.is_unlocked(i))
	}

	/// Stale progress for items no longer in the catalog is not counted.
	pub fn progress_summary(&self) -> ProgressSummary {
		ProgressSummary {
			watched: self.index.items().filter(|i| self.watched.is_watched(i.id())).count(),
			total: self.index.len(),
		}
	}
}
