//! Connector geometry.

use kurbo::{Line, Rect, Vec2};

/// Distance from the centre of `rect` to its outline, travelling along `dir`.
fn half_extent_along(rect: &Rect, dir: Vec2) -> f64 {
	let tx = if dir.x != 0.0 { rect.width() / 2.0 / dir.x.abs() } else { f64::INFINITY };
	let ty = if dir.y != 0.0 { rect.height() / 2.0 / dir.y.abs() } else { f64::INFINITY };
	tx.min(ty) * dir.hypot()
}

/// A line from the centre of `from` to the centre of `to`, cut back at both ends so it
/// starts and stops on the node outlines.
///
/// Returns `None` when the nodes overlap so much that nothing of the line would remain.
pub fn trim_connector(from: &Rect, to: &Rect) -> Option<Line> {
	let a = from.center();
	let b = to.center();
	let d = b - a;
	let len = d.hypot();
	if len <= f64::EPSILON {
		return None
	}

	let start = half_extent_along(from, d);
	let end = half_extent_along(to, d);
	if start + end >= len {
		return None
	}

	let u = d / len;
	Some(Line::new(a + u * start, b - u * end))
}

#[cfg(test)]
mod tests {
	use super::*;
	use kurbo::{Point, Size};

	fn node(x: f64, y: f64) -> Rect {
		Rect::from_origin_size(Point::new(x, y), Size::new(120.0, 178.0))
	}

	#[test]
	fn vertical_connector_stops_at_outlines() {
		let line = trim_connector(&node(0.0, 0.0), &node(0.0, 250.0)).unwrap();
		assert!((line.p0 - Point::new(60.0, 178.0)).hypot() < 1e-9);
		assert!((line.p1 - Point::new(60.0, 250.0)).hypot() < 1e-9);
	}

	#[test]
	fn diagonal_connector_is_shorter_than_centres() {
		let from = node(0.0, 0.0);
		let to = node(150.0, 250.0);
		let line = trim_connector(&from, &to).unwrap();
		let full = (to.center() - from.center()).hypot();
		assert!(line.length() < full);
		assert!(!from.contains(line.p0 + (line.p1 - line.p0) * 0.01));
		assert!(!to.contains(line.p1 - (line.p1 - line.p0) * 0.01));
	}

	#[test]
	fn overlapping_nodes_have_no_connector() {
		assert!(trim_connector(&node(0.0, 0.0), &node(10.0, 10.0)).is_none());
		assert!(trim_connector(&node(0.0, 0.0), &node(0.0, 0.0)).is_none());
	}
}
