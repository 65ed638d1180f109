//! Grid to pixel transform.
//!
//! Coordinates are normalized against the bounds of the currently visible items, so the
//! top-left visible node always sits at the surface origin no matter which part of the grid is shown.

use kurbo::{Point, Rect, Size};
use serde::{Serialize, Deserialize};

use crate::catalog::Item;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutMetrics {
	/// Pixels between adjacent grid columns.
	pub h_spacing: f64,
	/// Pixels between adjacent grid rows.
	pub v_spacing: f64,
	pub node_width: f64,
	pub node_height: f64,
}

impl Default for LayoutMetrics {
	fn default() -> Self {
		Self {
			h_spacing: 150.0,
			v_spacing: 250.0,
			node_width: 120.0,
			node_height: 178.0,
		}
	}
}

/// Inclusive grid extent of a set of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridBounds {
	pub min_x: i32,
	pub max_x: i32,
	pub min_y: i32,
	pub max_y: i32,
}

impl GridBounds {
	fn of(item: &Item) -> Self {
		Self { min_x: item.grid_x, max_x: item.grid_x, min_y: item.grid_y, max_y: item.grid_y }
	}

	fn include(&mut self, item: &Item) {
		self.min_x = self.min_x.min(item.grid_x);
		self.max_x = self.max_x.max(item.grid_x);
		self.min_y = self.min_y.min(item.grid_y);
		self.max_y = self.max_y.max(item.grid_y);
	}

	/// Column steps between the outermost nodes, zero for a single column.
	pub fn columns(&self) -> i32 {
		self.max_x - self.min_x
	}

	/// Row steps between the outermost nodes.
	pub fn rows(&self) -> i32 {
		self.max_y - self.min_y
	}
}

/// Returns `None` for an empty set.
pub fn compute_bounds<'i, I>(items: impl IntoIterator<Item = &'i I>) -> Option<GridBounds>
where I: AsRef<Item> + 'i,
{
	let mut iter = items.into_iter();
	let mut bounds = GridBounds::of(iter.next()?.as_ref());
	for item in iter {
		bounds.include(item.as_ref());
	}
	Some(bounds)
}

impl LayoutMetrics {
	/// Top-left pixel position of `item`'s node.
	pub fn to_pixel(&self, item: &Item, bounds: &GridBounds) -> Point {
		Point::new(
			f64::from(item.grid_x - bounds.min_x) * self.h_spacing,
			f64::from(item.grid_y - bounds.min_y) * self.v_spacing,
		)
	}

	/// Surface size needed to fit every node inside `bounds`.
	pub fn required_surface_size(&self, bounds: &GridBounds) -> Size {
		Size::new(
			f64::from(bounds.columns()) * self.h_spacing + self.node_width,
			f64::from(bounds.rows()) * self.v_spacing + self.node_height,
		)
	}

	pub fn node_size(&self) -> Size {
		Size::new(self.node_width, self.node_height)
	}

	pub fn node_rect(&self, item: &Item, bounds: &GridBounds) -> Rect {
		Rect::from_origin_size(self.to_pixel(item, bounds), self.node_size())
	}

	pub fn node_center(&self, item: &Item, bounds: &GridBounds) -> Point {
		self.node_rect(item, bounds).center()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn item(x: i32, y: i32) -> Item {
		Item {
			id: format!("{}:{}", x, y),
			title: String::new(),
			release: None,
			prerequisites: vec![],
			phase: Default::default(),
			grid_x: x,
			grid_y: y,
			image: None,
		}
	}

	#[test]
	fn bounds_and_surface() {
		let items = vec![item(-1, 3), item(0, 1), item(1, 3)];
		let bounds = compute_bounds(&items).unwrap();
		assert_eq!(bounds, GridBounds { min_x: -1, max_x: 1, min_y: 1, max_y: 3 });

		let metrics = LayoutMetrics::default();
		assert_eq!(metrics.to_pixel(&items[0], &bounds), Point::new(0.0, 500.0));
		assert_eq!(metrics.to_pixel(&items[2], &bounds), Point::new(300.0, 500.0));
		assert_eq!(metrics.required_surface_size(&bounds), Size::new(420.0, 678.0));
	}

	#[test]
	fn empty_set_has_no_bounds() {
		let items: Vec<Item> = vec![];
		assert!(compute_bounds(&items).is_none());
	}
}
