//! Incremental node map rendering.
//!
//! # Pass order
//! 1. Evaluate the visible set and its grid bounds.
//! 1. Resize the surface for the new bounds.
//! 1. Remove nodes that are no longer visible.
//! 1. Create nodes that just became visible, move and restyle the rest in place.
//! 1. Rebuild every edge from the final node positions.
//! 1. Scroll the focus item into view.
//!
//! Nodes are reused across passes so their surface identity survives progress changes.
//! Edges are cheap and rebuilt from scratch every pass.

use std::collections::{BTreeMap, HashSet};

use kurbo::{Point, Size};

use crate::catalog::ItemId;
use crate::graph_index::{GraphIndex, IndexedItem};
use crate::layout::{compute_bounds, GridBounds, LayoutMetrics};
use crate::progress::WatchedState;
use crate::unlock::{Evaluator, NodeState};

mod surface;
pub use surface::Surface;
pub use surface::Edge;
pub use surface::ArtworkError;

pub mod edges;

mod svg;
pub use svg::SvgSurface;
pub use svg::SvgHandle;

#[derive(Debug)]
struct RenderedNode<H> {
	handle: H,
	origin: Point,
	state: NodeState,
	interactive: bool,
}

/// What a single [`Renderer::render`] call changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderPass {
	pub created: Vec<ItemId>,
	/// Nodes that were moved or restyled.
	pub updated: Vec<ItemId>,
	pub removed: Vec<ItemId>,
	pub edges: usize,
	pub surface_size: Option<Size>,
	pub scroll_target: Option<ItemId>,
}

impl RenderPass {
	/// `true` when no node was created, changed or removed.
	pub fn is_unchanged(&self) -> bool {
		self.created.is_empty() && self.updated.is_empty() && self.removed.is_empty()
	}
}

pub struct Renderer<S: Surface> {
	surface: S,
	metrics: LayoutMetrics,
	image_dir: Option<std::path::PathBuf>,
	nodes: BTreeMap<ItemId, RenderedNode<S::Handle>>,
	edges: Vec<Edge>,
	bounds: Option<GridBounds>,
}

impl<S: Surface + std::fmt::Debug> std::fmt::Debug for Renderer<S> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Renderer")
			.field("surface", &self.surface)
			.field("metrics", &self.metrics)
			.field("image_dir", &self.image_dir)
			.field("nodes", &self.nodes.keys().collect::<Vec<_>>())
			.field("edges", &self.edges.len())
			.field("bounds", &self.bounds)
			.finish()
	}
}

impl<S: Surface> Renderer<S> {
	pub fn new(surface: S, metrics: LayoutMetrics) -> Self {
		Self {
			surface,
			metrics,
			image_dir: None,
			nodes: Default::default(),
			edges: Default::default(),
			bounds: None,
		}
	}

	/// Artwork filenames are resolved against `image_dir`.
	pub fn with_image_dir(mut self, image_dir: impl Into<std::path::PathBuf>) -> Self {
		self.image_dir = Some(image_dir.into());
		self
	}

	pub fn surface(&self) -> &S {
		&self.surface
	}

	pub fn surface_mut(&mut self) -> &mut S {
		&mut self.surface
	}

	pub fn metrics(&self) -> &LayoutMetrics {
		&self.metrics
	}

	/// Bounds of the last pass, `None` before the first pass or when nothing was visible.
	pub fn bounds(&self) -> Option<&GridBounds> {
		self.bounds.as_ref()
	}

	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	pub fn rendered_ids(&self) -> impl Iterator<Item = &ItemId> {
		self.nodes.keys()
	}

	pub fn is_rendered(&self, id: &str) -> bool {
		self.nodes.contains_key(id)
	}

	/// Whether clicks on `id` are currently wired. `false` for nodes that aren't drawn.
	pub fn is_interactive(&self, id: &str) -> bool {
		self.nodes.get(id).map(|n| n.interactive).unwrap_or(false)
	}

	pub fn node_state(&self, id: &str) -> Option<NodeState> {
		self.nodes.get(id).map(|n| n.state)
	}

	/// Reconciles the surface with the current progress.
	///
	/// `focus` is the item the user just acted on, it takes precedence when choosing what to scroll to.
	pub fn render(&mut self, index: &GraphIndex, watched: &WatchedState, focus: Option<&str>) -> RenderPass {
		let eval = Evaluator::new(index, watched);
		let visible: Vec<&IndexedItem> = eval.visible_items().collect();
		let mut pass = RenderPass::default();

		let Some(bounds) = compute_bounds(visible.iter().copied()) else {
			/* Only reachable with an empty catalog, the start item is always visible otherwise */
			for (id, node) in std::mem::take(&mut self.nodes) {
				self.surface.remove_node(node.handle);
				pass.removed.push(id);
			}
			self.surface.clear_edges();
			self.edges.clear();
			self.bounds = None;
			log::debug!("Nothing visible, cleared {} nodes", pass.removed.len());
			return pass
		};

		let size = self.metrics.required_surface_size(&bounds);
		self.surface.resize(size);
		pass.surface_size = Some(size);
		self.bounds = Some(bounds);

		let visible_ids: HashSet<&str> = visible.iter().map(|i| i.id().as_str()).collect();

		let stale: Vec<ItemId> = self.nodes.keys()
			.filter(|id| !visible_ids.contains(id.as_str()))
			.cloned()
			.collect();
		for id in stale {
			if let Some(node) = self.nodes.remove(&id) {
				log::trace!("Removing node {}", id);
				self.surface.remove_node(node.handle);
				pass.removed.push(id);
			}
		}

		for item in &visible {
			let origin = self.metrics.to_pixel(item, &bounds);
			let state = eval.node_state(item);
			let interactive = eval.is_unlocked(item);

			match self.nodes.get_mut(item.id()) {
				Some(node) => {
					let mut changed = false;
					if node.origin != origin {
						self.surface.place_node(&mut node.handle, origin);
						node.origin = origin;
						changed = true;
					}
					if node.state != state || node.interactive != interactive {
						self.surface.set_node_state(&mut node.handle, state, interactive);
						node.state = state;
						node.interactive = interactive;
						changed = true;
					}
					if changed {
						log::trace!("Updated node {} at {:?} as {:?}", item.id(), origin, state);
						pass.updated.push(item.id().clone());
					}
				},
				None => {
					let mut handle = self.surface.create_node(item.item());
					if let Some(image) = &item.image {
						let path = match &self.image_dir {
							Some(dir) => dir.join(image),
							None => std::path::PathBuf::from(image),
						};
						if let Err(e) = self.surface.attach_artwork(&mut handle, &path) {
							log::debug!("Dropping artwork for {}: {}", item.id(), e);
							self.surface.remove_artwork(&mut handle);
						}
					}
					self.surface.place_node(&mut handle, origin);
					self.surface.set_node_state(&mut handle, state, interactive);
					log::trace!("Created node {} at {:?} as {:?}", item.id(), origin, state);
					self.nodes.insert(item.id().clone(), RenderedNode { handle, origin, state, interactive });
					pass.created.push(item.id().clone());
				},
			}
		}

		self.rebuild_edges(index, &visible, &visible_ids, &bounds);
		pass.edges = self.edges.len();

		/* Prefer what the user just touched, then the latest watched item, then the start */
		let target = focus
			.filter(|id| visible_ids.contains(id))
			.or_else(|| watched.recently_watched().map(String::as_str).find(|id| visible_ids.contains(id)))
			.or_else(|| index.start_id().map(String::as_str).filter(|id| visible_ids.contains(id)));
		if let Some(item) = target.and_then(|id| index.get(id)) {
			self.surface.scroll_into_view(self.metrics.node_center(item, &bounds));
			pass.scroll_target = Some(item.id().clone());
		}

		log::debug!(
			"Render pass: {} created, {} updated, {} removed, {} edges",
			pass.created.len(), pass.updated.len(), pass.removed.len(), pass.edges
		);
		pass
	}

	fn rebuild_edges(&mut self, index: &GraphIndex, visible: &[&IndexedItem], visible_ids: &HashSet<&str>, bounds: &GridBounds) {
		self.surface.clear_edges();
		self.edges.clear();

		for parent in visible {
			let from = self.metrics.node_rect(parent, bounds);
			for child_id in parent.unlocks() {
				if !visible_ids.contains(child_id.as_str()) {
					continue
				}
				let Some(child) = index.get(child_id) else { continue };
				let to = self.metrics.node_rect(child, bounds);
				match edges::trim_connector(&from, &to) {
					Some(line) => {
						let edge = Edge { from: parent.id().clone(), to: child_id.clone(), line };
						self.surface.draw_edge(&edge);
						self.edges.push(edge);
					},
					None => log::trace!("Skipping edge {} -> {}, nodes overlap", parent.id(), child_id),
				}
			}
		}
	}
}
