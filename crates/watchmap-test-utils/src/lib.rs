//! Various helper functions for testing
//!
//! functions in this module should use results and not use any panics to avoid confusion in callers

use std::collections::{BTreeMap, HashSet, VecDeque};

use kurbo::{Point, Size};
use watchmap::catalog::{Catalog, Item, ItemId, PhaseLabel};
use watchmap::render::{ArtworkError, Edge, Surface};
use watchmap::NodeState;

/// Builds a catalog item with the fields tests care about.
pub fn item(id: &str, prerequisites: &[&str], phase: u32, grid_x: i32, grid_y: i32) -> Item {
	Item {
		id: id.to_string(),
		title: id.to_string(),
		release: None,
		prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
		phase: PhaseLabel::Text(format!("Phase {}", phase)),
		grid_x,
		grid_y,
		image: None,
	}
}

fn film(id: &str, title: &str, release: &str, prerequisites: &[&str], phase: u32, grid_x: i32, grid_y: i32) -> Item {
	Item {
		title: title.to_string(),
		release: Some(release.to_string()),
		image: Some(format!("{}.jpg", id)),
		..item(id, prerequisites, phase, grid_x, grid_y)
	}
}

/// The first three phases of the franchise, the catalog the map was built around.
///
/// Phase 2 opens once `avengers1` is watched, phase 3 once `antman` is watched.
pub fn sample_catalog() -> Catalog {
	Catalog::new(vec![
		film("ironman1", "Iron Man", "2008-05-02", &[], 1, 0, 1),
		film("ironman2", "Iron Man 2", "2010-05-07", &["ironman1"], 1, 0, 2),
		film("hulk", "The Incredible Hulk", "2008-06-13", &["ironman2"], 1, -1, 3),
		film("thor1", "Thor", "2011-05-06", &["ironman2"], 1, 0, 3),
		film("cap1", "Captain America: The First Avenger", "2011-07-22", &["ironman2"], 1, 1, 3),
		film("avengers1", "The Avengers", "2012-05-04", &["thor1", "cap1", "hulk"], 1, 0, 4),

		film("ironman3", "Iron Man 3", "2013-05-03", &["avengers1"], 2, 0, 5),
		film("thor2", "Thor: The Dark World", "2013-11-08", &["avengers1"], 2, 1, 5),
		film("cap2", "Captain America: The Winter Soldier", "2014-04-04", &["avengers1"], 2, 0, 6),
		film("guardians1", "Guardians of the Galaxy", "2014-08-01", &[], 2, -1, 6),
		film("ageofultron", "Avengers: Age of Ultron", "2015-05-01", &["ironman3", "thor2", "cap2", "guardians1"], 2, 0, 7),
		film("antman", "Ant-Man", "2015-07-17", &["ageofultron"], 2, 0, 8),

		film("civilwar", "Captain America: Civil War", "2016-05-06", &["ageofultron", "antman"], 3, 0, 9),
		film("doctorstrange", "Doctor Strange", "2016-11-04", &[], 3, 1, 9),
		film("guardians2", "Guardians of the Galaxy Vol. 2", "2017-05-05", &["guardians1"], 3, -1, 10),
		film("spiderman1", "Spider-Man: Homecoming", "2017-07-07", &["civilwar"], 3, 1, 10),
		film("thor3", "Thor: Ragnarok", "2017-11-03", &["ageofultron"], 3, 0, 11),
		film("blackpanther", "Black Panther", "2018-02-16", &["civilwar"], 3, -1, 11),
		film("infinitywar", "Avengers: Infinity War", "2018-04-27", &["thor3", "blackpanther", "spiderman1", "guardians2", "doctorstrange"], 3, 0, 12),
		film("antmanwasp", "Ant-Man and the Wasp", "2018-07-06", &["infinitywar"], 3, 1, 13),
		film("captainmarvel", "Captain Marvel", "2019-03-08", &[], 3, -1, 13),
		film("endgame", "Avengers: Endgame", "2019-04-26", &["infinitywar", "antmanwasp", "captainmarvel"], 3, 0, 14),
		film("farfromhome", "Spider-Man: Far From Home", "2019-07-02", &["endgame"], 3, 0, 15),
	])
	.with_start("ironman1")
	.with_phase_unlock(2, "avengers1")
	.with_phase_unlock(3, "antman")
}

/// Creates a temporary directory removed when the returned guard is dropped.
pub fn temp_data_dir() -> std::io::Result<tempfile::TempDir> {
	tempfile::Builder::new().prefix("watchmap-test").tempdir()
}

/// One call made on a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
	Resize(Size),
	Create(ItemId),
	Remove(ItemId),
	AttachArtwork(ItemId),
	RemoveArtwork(ItemId),
	Place(ItemId, Point),
	SetState(ItemId, NodeState, bool),
	ClearEdges,
	DrawEdge(ItemId, ItemId),
	Scroll(Point),
}

#[derive(Debug, Clone)]
pub struct RecordedNode {
	pub id: ItemId,
	pub origin: Point,
	pub state: Option<NodeState>,
	pub interactive: bool,
	pub has_artwork: bool,
}

/// A [`Surface`] that records every call and keeps a model of what is drawn.
#[derive(Debug, Default)]
pub struct RecordingSurface {
	ops: Vec<SurfaceOp>,
	nodes: BTreeMap<usize, RecordedNode>,
	edges: Vec<Edge>,
	size: Option<Size>,
	scroll: Option<Point>,
	next_handle: usize,
	/// File names whose artwork fails to load.
	broken_artwork: HashSet<String>,
}

impl RecordingSurface {
	pub fn new() -> Self {
		Self::default()
	}

	/// Artwork with this file name fails to load.
	pub fn with_broken_artwork(mut self, file_name: &str) -> Self {
		self.broken_artwork.insert(file_name.to_string());
		self
	}

	pub fn ops(&self) -> &[SurfaceOp] {
		&self.ops
	}

	/// Returns and forgets the calls recorded so far.
	pub fn take_ops(&mut self) -> Vec<SurfaceOp> {
		std::mem::take(&mut self.ops)
	}

	/// Ids of the nodes currently drawn, sorted.
	pub fn live_ids(&self) -> Vec<ItemId> {
		let mut ids: Vec<_> = self.nodes.values().map(|n| n.id.clone()).collect();
		ids.sort();
		ids
	}

	pub fn node(&self, id: &str) -> Option<&RecordedNode> {
		self.nodes.values().find(|n| n.id == id)
	}

	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	pub fn size(&self) -> Option<Size> {
		self.size
	}

	pub fn scroll(&self) -> Option<Point> {
		self.scroll
	}

	fn id_of(&self, handle: usize) -> ItemId {
		self.nodes.get(&handle).map(|n| n.id.clone()).unwrap_or_default()
	}
}

impl Surface for RecordingSurface {
	type Handle = usize;

	fn resize(&mut self, size: Size) {
		self.size = Some(size);
		self.ops.push(SurfaceOp::Resize(size));
	}

	fn create_node(&mut self, item: &Item) -> Self::Handle {
		let handle = self.next_handle;
		self.next_handle += 1;
		self.nodes.insert(handle, RecordedNode {
			id: item.id.clone(),
			origin: Point::ZERO,
			state: None,
			interactive: false,
			has_artwork: false,
		});
		self.ops.push(SurfaceOp::Create(item.id.clone()));
		handle
	}

	fn remove_node(&mut self, handle: Self::Handle) {
		if let Some(node) = self.nodes.remove(&handle) {
			self.ops.push(SurfaceOp::Remove(node.id));
		}
	}

	fn attach_artwork(&mut self, handle: &mut Self::Handle, path: &std::path::Path) -> Result<(), ArtworkError> {
		let id = self.id_of(*handle);
		self.ops.push(SurfaceOp::AttachArtwork(id));
		let file_name = path.file_name().and_then(|f| f.to_str()).unwrap_or_default();
		if self.broken_artwork.contains(file_name) {
			return Err(ArtworkError::NotFound(path.to_path_buf()))
		}
		if let Some(node) = self.nodes.get_mut(&*handle) {
			node.has_artwork = true;
		}
		Ok(())
	}

	fn remove_artwork(&mut self, handle: &mut Self::Handle) {
		let id = self.id_of(*handle);
		self.ops.push(SurfaceOp::RemoveArtwork(id));
		if let Some(node) = self.nodes.get_mut(&*handle) {
			node.has_artwork = false;
		}
	}

	fn place_node(&mut self, handle: &mut Self::Handle, origin: Point) {
		let id = self.id_of(*handle);
		self.ops.push(SurfaceOp::Place(id, origin));
		if let Some(node) = self.nodes.get_mut(&*handle) {
			node.origin = origin;
		}
	}

	fn set_node_state(&mut self, handle: &mut Self::Handle, state: NodeState, interactive: bool) {
		let id = self.id_of(*handle);
		self.ops.push(SurfaceOp::SetState(id, state, interactive));
		if let Some(node) = self.nodes.get_mut(&*handle) {
			node.state = Some(state);
			node.interactive = interactive;
		}
	}

	fn clear_edges(&mut self) {
		self.edges.clear();
		self.ops.push(SurfaceOp::ClearEdges);
	}

	fn draw_edge(&mut self, edge: &Edge) {
		self.ops.push(SurfaceOp::DrawEdge(edge.from.clone(), edge.to.clone()));
		self.edges.push(edge.clone());
	}

	fn scroll_into_view(&mut self, target: Point) {
		self.scroll = Some(target);
		self.ops.push(SurfaceOp::Scroll(target));
	}
}

/// Answers confirmation prompts from a script, recording what was asked.
#[derive(Debug, Default)]
pub struct ScriptedConfirm {
	answers: VecDeque<bool>,
	pub asked: Vec<ItemId>,
}

impl ScriptedConfirm {
	pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
		Self { answers: answers.into_iter().collect(), asked: vec![] }
	}
}

impl watchmap::controller::Confirm for ScriptedConfirm {
	/// Declines once the script runs out.
	fn confirm(&mut self, item: &Item, _currently_watched: bool) -> bool {
		self.asked.push(item.id.clone());
		self.answers.pop_front().unwrap_or(false)
	}
}
