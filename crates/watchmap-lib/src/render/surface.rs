use kurbo::{Line, Point, Size};

use crate::catalog::{Item, ItemId};
use crate::unlock::NodeState;

#[derive(Debug, thiserror::Error)]
pub enum ArtworkError {
	#[error("artwork not found at {0}")]
	NotFound(std::path::PathBuf),
	#[error("artwork at {0} could not be loaded: {1}")]
	Unreadable(std::path::PathBuf, String),
}

/// A directed connector between two drawn nodes, already trimmed to the node outlines.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
	pub from: ItemId,
	pub to: ItemId,
	pub line: Line,
}

/// The drawing target a [`Renderer`](super::Renderer) reconciles against.
///
/// A surface never decides what to draw, it only applies the operations it is given.
/// `Handle` is the surface's identity for one node. The renderer keeps handles alive
/// for as long as the item stays visible, so surfaces may attach transitions to them.
pub trait Surface {
	type Handle;

	/// Called at the start of every pass, before any node is placed.
	fn resize(&mut self, size: Size);

	fn create_node(&mut self, item: &Item) -> Self::Handle;
	fn remove_node(&mut self, handle: Self::Handle);

	/// # Errors
	/// When the artwork can't be shown. The renderer then calls [`Surface::remove_artwork`] and keeps the node.
	fn attach_artwork(&mut self, handle: &mut Self::Handle, path: &std::path::Path) -> Result<(), ArtworkError>;
	fn remove_artwork(&mut self, handle: &mut Self::Handle);

	/// Moves the node's top-left corner to `origin`.
	fn place_node(&mut self, handle: &mut Self::Handle, origin: Point);
	/// `interactive` controls whether clicks on the node are wired.
	fn set_node_state(&mut self, handle: &mut Self::Handle, state: NodeState, interactive: bool);

	fn clear_edges(&mut self);
	fn draw_edge(&mut self, edge: &Edge);

	/// Brings `target` into view.
	fn scroll_into_view(&mut self, target: Point);
}
