//! Docking-point resolution and link curve construction.
//!
//! Everything here is a pure function of its arguments, so the same inputs always yield
//! the same path and the same marker position.

use super::types::{Point, Side};

/// Extra control-point distance so short links still bow out of their sides.
const CONTROL_BASE: f64 = 30.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeSize {
	pub width: f64,
	pub height: f64,
}

impl Default for NodeSize {
	fn default() -> Self {
		Self {
			width: 180.0,
			height: 80.0,
		}
	}
}

/// Midpoint of `side` for a node whose top-left corner is at `position`.
pub fn anchor(position: Point, side: Side, size: NodeSize) -> Point {
	let (dx, dy) = match side {
		Side::Top => (size.width / 2.0, 0.0),
		Side::Right => (size.width, size.height / 2.0),
		Side::Bottom => (size.width / 2.0, size.height),
		Side::Left => (0.0, size.height / 2.0),
	};
	position.translate(dx, dy)
}

pub fn docking_points(position: Point, size: NodeSize) -> [(Side, Point); 4] {
	Side::ALL.map(|side| (side, anchor(position, side, size)))
}

/// Unit outward normal of a side, in canvas space (y grows downwards).
fn normal(side: Side) -> (f64, f64) {
	match side {
		Side::Top => (0.0, -1.0),
		Side::Right => (1.0, 0.0),
		Side::Bottom => (0.0, 1.0),
		Side::Left => (-1.0, 0.0),
	}
}

/// A cubic Bézier segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurvePath {
	pub start: Point,
	pub control_start: Point,
	pub control_end: Point,
	pub end: Point,
}

impl CurvePath {
	/// Straight segment expressed as a cubic, used for the in-progress connection.
	pub fn straight(start: Point, end: Point) -> Self {
		Self {
			start,
			control_start: start,
			control_end: end,
			end,
		}
	}

	/// Anchor for the relation-text marker: the average of the two endpoints.
	pub fn midpoint(&self) -> Point {
		Point::new((self.start.x + self.end.x) / 2.0, (self.start.y + self.end.y) / 2.0)
	}

	pub fn point_at(&self, t: f64) -> Point {
		let mt = 1.0 - t;
		let (a, b, c, d) = (mt * mt * mt, 3.0 * mt * mt * t, 3.0 * mt * t * t, t * t * t);
		Point::new(
			a * self.start.x + b * self.control_start.x + c * self.control_end.x + d * self.end.x,
			a * self.start.y + b * self.control_start.y + c * self.control_end.y + d * self.end.y,
		)
	}
}

/// Curve between two resolved anchors. Each control point leaves its endpoint along
/// that side's outward normal by `min(|dx|, |dy|) * 0.5 + 30`.
pub fn link_path(start: Point, start_side: Side, end: Point, end_side: Side) -> CurvePath {
	let (dx, dy) = (end.x - start.x, end.y - start.y);
	let offset = dx.abs().min(dy.abs()) * 0.5 + CONTROL_BASE;
	let (sx, sy) = normal(start_side);
	let (ex, ey) = normal(end_side);
	CurvePath {
		start,
		control_start: start.translate(sx * offset, sy * offset),
		control_end: end.translate(ex * offset, ey * offset),
		end,
	}
}

/// Resolve both anchors from node positions and build the curve.
pub fn link_between(
	source: Point,
	source_side: Side,
	target: Point,
	target_side: Side,
	size: NodeSize,
) -> CurvePath {
	link_path(
		anchor(source, source_side, size),
		source_side,
		anchor(target, target_side, size),
		target_side,
	)
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;

	#[test]
	fn anchors_sit_on_edge_midpoints() {
		let size = NodeSize::default();
		let p = Point::new(100.0, 200.0);
		assert_eq!(anchor(p, Side::Top, size), Point::new(190.0, 200.0));
		assert_eq!(anchor(p, Side::Right, size), Point::new(280.0, 240.0));
		assert_eq!(anchor(p, Side::Bottom, size), Point::new(190.0, 280.0));
		assert_eq!(anchor(p, Side::Left, size), Point::new(100.0, 240.0));
	}

	#[test]
	fn right_to_left_curve() {
		// D1 at (50,50) right side to D2 at (270,50) left side: dy = 0, so offset = 30.
		let path = link_between(
			Point::new(50.0, 50.0),
			Side::Right,
			Point::new(270.0, 50.0),
			Side::Left,
			NodeSize::default(),
		);
		assert_eq!(path.start, Point::new(230.0, 90.0));
		assert_eq!(path.end, Point::new(270.0, 90.0));
		assert_eq!(path.control_start, Point::new(260.0, 90.0));
		assert_eq!(path.control_end, Point::new(240.0, 90.0));
		assert_eq!(path.midpoint(), Point::new(250.0, 90.0));
	}

	#[test]
	fn vertical_sides_bow_vertically() {
		let path = link_path(Point::new(0.0, 100.0), Side::Top, Point::new(40.0, 0.0), Side::Bottom);
		// offset = min(40, 100) * 0.5 + 30 = 50
		assert_eq!(path.control_start, Point::new(0.0, 50.0));
		assert_eq!(path.control_end, Point::new(40.0, 50.0));
	}

	#[test]
	fn curve_passes_through_endpoints() {
		let path = link_path(Point::new(3.0, 4.0), Side::Bottom, Point::new(90.0, 12.0), Side::Left);
		assert_eq!(path.point_at(0.0), path.start);
		assert_eq!(path.point_at(1.0), path.end);
	}

	#[test]
	fn straight_segment_controls_sit_on_endpoints() {
		let path = CurvePath::straight(Point::new(0.0, 0.0), Point::new(10.0, 5.5));
		assert_eq!(path.control_start, path.start);
		assert_eq!(path.control_end, path.end);
		assert_eq!(path.point_at(0.5), Point::new(5.0, 2.75));
	}

	fn side() -> impl Strategy<Value = Side> {
		prop_oneof![Just(Side::Top), Just(Side::Right), Just(Side::Bottom), Just(Side::Left)]
	}

	proptest! {
		#[test]
		fn geometry_is_reproducible(
			sx in 0.0f64..5000.0, sy in 0.0f64..5000.0,
			tx in 0.0f64..5000.0, ty in 0.0f64..5000.0,
			a in side(), b in side(),
		) {
			let size = NodeSize::default();
			let (s, t) = (Point::new(sx, sy), Point::new(tx, ty));
			prop_assert_eq!(anchor(s, a, size), anchor(s, a, size));
			let first = link_between(s, a, t, b, size);
			let second = link_between(s, a, t, b, size);
			prop_assert_eq!(first, second);
			prop_assert_eq!(first.midpoint(), second.midpoint());
		}

		#[test]
		fn control_points_leave_along_side_normals(
			sx in 0.0f64..2000.0, sy in 0.0f64..2000.0,
			tx in 0.0f64..2000.0, ty in 0.0f64..2000.0,
			a in side(), b in side(),
		) {
			let path = link_path(Point::new(sx, sy), a, Point::new(tx, ty), b);
			let (nx, ny) = normal(a);
			let (cx, cy) = (path.control_start.x - sx, path.control_start.y - sy);
			// control offset is always at least the base distance, in the normal direction
			prop_assert!(cx * nx + cy * ny >= CONTROL_BASE - 1e-9);
			prop_assert!((cx * ny - cy * nx).abs() < 1e-9);
		}
	}
}
