//! Derived, read-only view over a [`Catalog`].
//!
//! Built once at startup. Holds the reverse edges (`unlocks`), normalized phase ordinals
//! and cycle membership so evaluation and edge drawing never rescan the catalog.

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use petgraph::prelude::*;

use crate::catalog::*;

/// An item together with everything derived from it at index time.
#[derive(Debug, Clone)]
pub struct IndexedItem {
	item: Item,
	phase_ordinal: u32,
	unlocks: Vec<ItemId>,
	on_cycle: bool,
}

impl IndexedItem {
	pub fn item(&self) -> &Item {
		&self.item
	}

	pub fn id(&self) -> &ItemId {
		&self.item.id
	}

	pub fn phase_ordinal(&self) -> u32 {
		self.phase_ordinal
	}

	/// Ids of items that list this one as a prerequisite, in catalog order.
	pub fn unlocks(&self) -> &[ItemId] {
		&self.unlocks
	}

	/// Items on a prerequisite cycle can never be unlocked through their prerequisites.
	pub fn on_cycle(&self) -> bool {
		self.on_cycle
	}
}

impl AsRef<Item> for IndexedItem {
	fn as_ref(&self) -> &Item {
		&self.item
	}
}

impl std::ops::Deref for IndexedItem {
	type Target = Item;

	fn deref(&self) -> &Self::Target {
		&self.item
	}
}

#[derive(Debug, Clone)]
pub struct GraphIndex {
	items: Vec<IndexedItem>,
	lookup: HashMap<ItemId, usize>,
	/// Edges point from a prerequisite to the item that requires it. Node weights are positions in `items`.
	graph: DiGraph<usize, ()>,
	start: Option<ItemId>,
	phase_unlocks: BTreeMap<u32, ItemId>,
}

impl GraphIndex {
	/// # Errors
	/// - [`Validation`](crate::error::Error::Validation) when two items share an id or the start item does not exist.
	pub fn new(catalog: Catalog) -> crate::Result<Self> {
		let Catalog { start, phase_unlocks, items } = catalog;

		let mut lookup = HashMap::<ItemId, usize>::with_capacity(items.len());
		let mut graph = DiGraph::<usize, ()>::with_capacity(items.len(), items.len());
		for (i, item) in items.iter().enumerate() {
			if lookup.insert(item.id.clone(), i).is_some() {
				return Err(crate::Error::Validation(format!("duplicate item id \"{}\"", item.id)))
			}
			graph.add_node(i);
		}

		let start = match start {
			Some(id) if !lookup.contains_key(&id) => {
				return Err(crate::Error::Validation(format!("start item \"{}\" is not in the catalog", id)))
			},
			Some(id) => Some(id),
			None => items.first().map(|i| i.id.clone()),
		};

		for (ordinal, gatekeeper) in &phase_unlocks {
			if !lookup.contains_key(gatekeeper) {
				log::warn!("Phase {} gatekeeper \"{}\" is not in the catalog, the phase will stay locked", ordinal, gatekeeper);
			}
		}

		for (i, item) in items.iter().enumerate() {
			for prerequisite in &item.prerequisites {
				match lookup.get(prerequisite) {
					/* `update_edge` so a repeated prerequisite doesn't produce a duplicate arrow */
					Some(&p) => { graph.update_edge(NodeIndex::new(p), NodeIndex::new(i), ()); },
					None => log::warn!("\"{}\" requires unknown item \"{}\", it will stay locked", item.id, prerequisite),
				}
			}
		}

		let mut on_cycle = vec![false; items.len()];
		for component in petgraph::algo::tarjan_scc(&graph) {
			let cyclic = component.len() > 1 || graph.contains_edge(component[0], component[0]);
			if cyclic {
				for n in component {
					log::warn!("\"{}\" is part of a prerequisite cycle", items[graph[n]].id);
					on_cycle[graph[n]] = true;
				}
			}
		}

		let ids: Vec<ItemId> = items.iter().map(|i| i.id.clone()).collect();
		let items = items.into_iter().enumerate().map(|(i, item)| {
			let mut dependents: Vec<usize> = graph.neighbors_directed(NodeIndex::new(i), Outgoing)
				.map(|n| graph[n])
				.collect();
			dependents.sort_unstable();
			let phase_ordinal = parse_phase_ordinal(&item.phase).unwrap_or_else(|e| {
				log::warn!("{} for \"{}\", treating it as phase 1", e, item.id);
				1
			});
			IndexedItem {
				unlocks: dependents.into_iter().map(|d| ids[d].clone()).collect(),
				phase_ordinal,
				on_cycle: on_cycle[i],
				item,
			}
		}).collect::<Vec<_>>();

		let index = Self { items, lookup, graph, start, phase_unlocks };

		log::debug!("Indexed {} items with {} prerequisite edges", index.items.len(), index.graph.edge_count());
		Ok(index)
	}

	pub fn get(&self, id: &str) -> Option<&IndexedItem> {
		self.lookup.get(id).map(|&i| &self.items[i])
	}

	pub fn contains(&self, id: &str) -> bool {
		self.lookup.contains_key(id)
	}

	/// All items in catalog order.
	pub fn items(&self) -> impl Iterator<Item = &IndexedItem> + '_ {
		self.items.iter()
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// The item that is always visible. `None` only for an empty catalog.
	pub fn start_id(&self) -> Option<&ItemId> {
		self.start.as_ref()
	}

	/// Gatekeeper item id for a phase ordinal.
	pub fn phase_gatekeeper(&self, phase_ordinal: u32) -> Option<&ItemId> {
		self.phase_unlocks.get(&phase_ordinal)
	}
}

/// Why a phase label has no usable ordinal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhaseLabelError {
	#[error("no phase number in \"{0}\"")]
	NoDigits(String),
	#[error("phase number in \"{0}\" is too large")]
	Overflow(String),
}

/// Extracts the ordinal from a phase label.
///
/// Text labels use their first run of digits (`"Phase 3"` → 3). Ordinals below 1 are raised to 1.
pub fn parse_phase_ordinal(label: &PhaseLabel) -> Result<u32, PhaseLabelError> {
	static DIGITS: OnceLock<regex::Regex> = OnceLock::new();

	let ordinal = match label {
		PhaseLabel::Number(n) => *n,
		PhaseLabel::Text(s) => {
			let re = DIGITS.get_or_init(|| regex::Regex::new(r"\d+").expect("phase digit pattern should compile."));
			let digits = re.find(s).ok_or_else(|| PhaseLabelError::NoDigits(s.clone()))?;
			digits.as_str().parse::<u32>().map_err(|_| PhaseLabelError::Overflow(s.clone()))?
		},
	};
	Ok(ordinal.max(1))
}
