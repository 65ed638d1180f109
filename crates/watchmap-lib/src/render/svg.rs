//! A [`Surface`] that produces a standalone SVG document.

use std::collections::BTreeMap;
use std::fmt::Write;

use kurbo::{Line, Point, Size};

use super::surface::*;
use crate::catalog::{Item, ItemId};
use crate::unlock::NodeState;

#[derive(Debug, Clone)]
struct SvgNode {
	id: ItemId,
	title: String,
	origin: Point,
	state: NodeState,
	interactive: bool,
	artwork: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SvgHandle(u64);

#[derive(Debug, Clone)]
pub struct SvgSurface {
	node_size: Size,
	size: Size,
	nodes: BTreeMap<SvgHandle, SvgNode>,
	edges: Vec<Line>,
	scroll: Option<Point>,
	next_handle: u64,
}

impl SvgSurface {
	pub fn new(node_size: Size) -> Self {
		Self {
			node_size,
			size: Size::ZERO,
			nodes: Default::default(),
			edges: Default::default(),
			scroll: None,
			next_handle: 0,
		}
	}

	pub fn size(&self) -> Size {
		self.size
	}

	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn edge_count(&self) -> usize {
		self.edges.len()
	}

	/// Last position passed to [`Surface::scroll_into_view`].
	pub fn scroll_position(&self) -> Option<Point> {
		self.scroll
	}

	/// Serializes the current surface contents.
	pub fn to_svg(&self) -> String {
		let width = fmt_f64(self.size.width);
		let height = fmt_f64(self.size.height);

		let mut svg = String::new();
		let _ = writeln!(
			svg,
			"<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">"
		);
		svg.push_str("<defs><marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M0,0 L10,5 L0,10 z\"/></marker></defs>\n");

		svg.push_str("<g class=\"edges\">\n");
		for line in &self.edges {
			let _ = writeln!(
				svg,
				"<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" marker-end=\"url(#arrow)\"/>",
				fmt_f64(line.p0.x), fmt_f64(line.p0.y), fmt_f64(line.p1.x), fmt_f64(line.p1.y)
			);
		}
		svg.push_str("</g>\n");

		svg.push_str("<g class=\"nodes\">\n");
		for node in self.nodes.values() {
			let mut class = String::from("node");
			if let Some(c) = node.state.class() {
				class.push(' ');
				class.push_str(c);
			}
			if node.interactive {
				class.push_str(" clickable");
			}
			let _ = write!(
				svg,
				"<g class=\"{}\" data-id=\"{}\" transform=\"translate({} {})\">",
				class, escape(&node.id), fmt_f64(node.origin.x), fmt_f64(node.origin.y)
			);
			let _ = write!(
				svg,
				"<rect width=\"{}\" height=\"{}\" rx=\"8\"/>",
				fmt_f64(self.node_size.width), fmt_f64(self.node_size.height)
			);
			if let Some(href) = &node.artwork {
				let _ = write!(
					svg,
					"<image href=\"{}\" width=\"{}\" height=\"{}\"/>",
					escape(href), fmt_f64(self.node_size.width), fmt_f64(self.node_size.height)
				);
			}
			let _ = write!(svg, "<title>{}</title>", escape(&node.title));
			if node.state == NodeState::Watched {
				svg.push_str("<text class=\"checkmark\">\u{2714}</text>");
			}
			svg.push_str("</g>\n");
		}
		svg.push_str("</g>\n");
		svg.push_str("</svg>\n");
		svg
	}

	/// # Errors
	/// - [`IO`](crate::error::Error::IO) when writing the file.
	pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> crate::Result<()> {
		std::fs::write(path.as_ref(), self.to_svg())?;
		log::info!("Wrote map to {}", path.as_ref().display());
		Ok(())
	}
}

impl Surface for SvgSurface {
	type Handle = SvgHandle;

	fn resize(&mut self, size: Size) {
		self.size = size;
	}

	fn create_node(&mut self, item: &Item) -> Self::Handle {
		let handle = SvgHandle(self.next_handle);
		self.next_handle += 1;
		self.nodes.insert(handle, SvgNode {
			id: item.id.clone(),
			title: item.title.clone(),
			origin: Point::ZERO,
			state: NodeState::Locked,
			interactive: false,
			artwork: None,
		});
		handle
	}

	fn remove_node(&mut self, handle: Self::Handle) {
		self.nodes.remove(&handle);
	}

	fn attach_artwork(&mut self, handle: &mut Self::Handle, path: &std::path::Path) -> Result<(), ArtworkError> {
		if !path.is_file() {
			return Err(ArtworkError::NotFound(path.to_path_buf()))
		}
		let href = path.to_str()
			.ok_or_else(|| ArtworkError::Unreadable(path.to_path_buf(), "path is not valid unicode".into()))?;
		if let Some(node) = self.nodes.get_mut(&*handle) {
			node.artwork = Some(href.to_string());
		}
		Ok(())
	}

	fn remove_artwork(&mut self, handle: &mut Self::Handle) {
		if let Some(node) = self.nodes.get_mut(&*handle) {
			node.artwork = None;
		}
	}

	fn place_node(&mut self, handle: &mut Self::Handle, origin: Point) {
		if let Some(node) = self.nodes.get_mut(&*handle) {
			node.origin = origin;
		}
	}

	fn set_node_state(&mut self, handle: &mut Self::Handle, state: NodeState, interactive: bool) {
		if let Some(node) = self.nodes.get_mut(&*handle) {
			node.state = state;
			node.interactive = interactive;
		}
	}

	fn clear_edges(&mut self) {
		self.edges.clear();
	}

	fn draw_edge(&mut self, edge: &Edge) {
		self.edges.push(edge.line);
	}

	fn scroll_into_view(&mut self, target: Point) {
		self.scroll = Some(target);
	}
}

fn fmt_f64(v: f64) -> String {
	if v.fract() == 0.0 {
		format!("{}", v as i64)
	} else {
		format!("{:.2}", v)
	}
}

fn escape(s: &str) -> String {
	let mut out = String::with_capacity(s.len());
	for c in s.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&apos;"),
			c => out.push(c),
		}
	}
	out
}
