//! The static catalog of watchable items.
//!
//! The catalog is read once at startup and never changes afterwards.
//! Anything derived from it (reverse edges, phase ordinals) lives in [`GraphIndex`](crate::GraphIndex).

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

/// Identity of a catalog item.
pub type ItemId = String;

/// How an item names its phase. Both `3` and `"Phase 3"` appear in catalogs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PhaseLabel {
	Number(u32),
	Text(String),
}

impl Default for PhaseLabel {
	fn default() -> Self {
		PhaseLabel::Number(1)
	}
}

impl std::fmt::Display for PhaseLabel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			PhaseLabel::Number(n) => write!(f, "Phase {}", n),
			PhaseLabel::Text(s) => write!(f, "{}", s),
		}
	}
}

/// A single watchable entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
	pub id: ItemId,
	pub title: String,
	#[serde(default)]
	pub release: Option<String>,
	#[serde(default)]
	pub prerequisites: Vec<ItemId>,
	#[serde(default)]
	pub phase: PhaseLabel,
	pub grid_x: i32,
	pub grid_y: i32,
	/// Artwork filename, relative to the configured image directory.
	#[serde(default)]
	pub image: Option<String>,
}

impl AsRef<Item> for Item {
	fn as_ref(&self) -> &Item {
		self
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
	/// Item that is always shown. Defaults to the first item.
	#[serde(default)]
	pub start: Option<ItemId>,
	/// Phase ordinal to the gatekeeper item whose watched flag opens that phase.
	#[serde(default)]
	pub phase_unlocks: BTreeMap<u32, ItemId>,
	pub items: Vec<Item>,
}

impl Catalog {
	pub fn new(items: Vec<Item>) -> Self {
		Self { items, ..Default::default() }
	}

	pub fn with_start(mut self, start: impl Into<ItemId>) -> Self {
		self.start = Some(start.into());
		self
	}

	pub fn with_phase_unlock(mut self, phase: u32, gatekeeper: impl Into<ItemId>) -> Self {
		self.phase_unlocks.insert(phase, gatekeeper.into());
		self
	}

	/// # Errors
	/// - [`SerdeJSON`](crate::error::Error::SerdeJSON) when the document is not a valid catalog.
	pub fn from_json_str(s: &str) -> crate::Result<Self> {
		Ok(serde_json::from_str(s)?)
	}

	/// # Errors
	/// - [`IO`](crate::error::Error::IO) when opening or reading from the file.
	/// - [`SerdeJSON`](crate::error::Error::SerdeJSON) when deserializing the file.
	pub fn load_from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
		log::debug!("Loading catalog from {}", path.as_ref().display());
		let file = std::fs::File::open(path)?;
		let catalog: Catalog = serde_json::from_reader(std::io::BufReader::new(file))?;
		log::info!("Loaded catalog with {} items", catalog.items.len());
		Ok(catalog)
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn phase_accepts_text_and_number() {
		let catalog = Catalog::from_json_str(r#"{
			"start": "a",
			"phaseUnlocks": { "2": "a" },
			"items": [
				{ "id": "a", "title": "A", "phase": "Phase 1", "gridX": 0, "gridY": 1 },
				{ "id": "b", "title": "B", "phase": 2, "prerequisites": ["a"], "gridX": -1, "gridY": 2, "image": "b.jpg" }
			]
		}"#).unwrap();

		assert_eq!(catalog.items[0].phase, PhaseLabel::Text("Phase 1".into()));
		assert_eq!(catalog.items[1].phase, PhaseLabel::Number(2));
		assert_eq!(catalog.items[1].image.as_deref(), Some("b.jpg"));
		assert_eq!(catalog.phase_unlocks.get(&2).map(String::as_str), Some("a"));
	}

	#[test]
	fn missing_optional_fields_default() {
		let catalog = Catalog::from_json_str(r#"{ "items": [ { "id": "a", "title": "A", "gridX": 3, "gridY": 4 } ] }"#).unwrap();
		let item = &catalog.items[0];
		assert!(item.prerequisites.is_empty());
		assert_eq!(item.phase, PhaseLabel::Number(1));
		assert!(catalog.start.is_none());
	}
}
