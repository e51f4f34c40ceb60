use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::geometry::CurvePath;
use super::scene::{LinkCurve, NodeBox, Scene};
use super::types::Point;

const BACKGROUND: &str = "#1a1a2e";
const LINK_STROKE: &str = "rgba(100, 180, 255, 0.8)";
const TITLE_CHARS: usize = 22;

/// Pan/zoom of the drawing surface. Model coordinates stay in canvas space.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

impl ViewTransform {
	pub fn screen_to_canvas(&self, sx: f64, sy: f64) -> Point {
		Point::new((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	/// Zoom by `factor` around the screen point `(sx, sy)`.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let new_k = (self.k * factor).clamp(0.2, 4.0);
		let ratio = new_k / self.k;
		self.x = sx - (sx - self.x) * ratio;
		self.y = sy - (sy - self.y) * ratio;
		self.k = new_k;
	}
}

pub fn render(scene: &Scene, view: &ViewTransform, width: f64, height: f64, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, width, height);
	ctx.save();
	let _ = ctx.translate(view.x, view.y);
	let _ = ctx.scale(view.k, view.k);
	for link in &scene.links {
		draw_link(link, scene.marker_radius(), view.k, ctx);
	}
	if let Some(draft) = &scene.draft {
		draw_draft(draft, view.k, ctx);
	}
	for node in &scene.nodes {
		draw_node(node, view.k, ctx);
	}
	ctx.restore();
}

fn trace(path: &CurvePath, ctx: &CanvasRenderingContext2d) {
	ctx.begin_path();
	ctx.move_to(path.start.x, path.start.y);
	ctx.bezier_curve_to(
		path.control_start.x,
		path.control_start.y,
		path.control_end.x,
		path.control_end.y,
		path.end.x,
		path.end.y,
	);
}

fn draw_link(link: &LinkCurve, marker_radius: f64, k: f64, ctx: &CanvasRenderingContext2d) {
	let path = &link.path;
	ctx.set_stroke_style_str(LINK_STROKE);
	ctx.set_line_width(if link.marker.selected { 3.0 } else { 1.5 } / k.max(0.5));
	trace(path, ctx);
	ctx.stroke();

	// arrowhead along the last control leg
	let (dx, dy) = (path.end.x - path.control_end.x, path.end.y - path.control_end.y);
	let len = (dx * dx + dy * dy).sqrt();
	if len > 0.001 {
		let (ux, uy, size) = (dx / len, dy / len, 8.0);
		let (bx, by) = (path.end.x - ux * size, path.end.y - uy * size);
		let (px, py) = (-uy * size * 0.5, ux * size * 0.5);
		ctx.set_fill_style_str(LINK_STROKE);
		ctx.begin_path();
		ctx.move_to(path.end.x, path.end.y);
		ctx.line_to(bx + px, by + py);
		ctx.line_to(bx - px, by - py);
		ctx.close_path();
		ctx.fill();
	}

	for badge in &link.badges {
		ctx.set_fill_style_str(&badge.color);
		ctx.begin_path();
		let _ = ctx.arc(badge.at.x, badge.at.y, 5.0, 0.0, 2.0 * PI);
		ctx.fill();
	}

	let marker = &link.marker;
	ctx.begin_path();
	let _ = ctx.arc(marker.at.x, marker.at.y, marker_radius, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(if marker.selected { "#ffd166" } else { "#24304d" });
	ctx.fill();
	ctx.set_stroke_style_str(LINK_STROKE);
	ctx.set_line_width(1.0);
	ctx.stroke();
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	match &marker.text {
		Some(text) => {
			ctx.set_fill_style_str("white");
			ctx.set_font("11px sans-serif");
			let _ = ctx.fill_text(text, marker.at.x, marker.at.y - marker_radius - 8.0);
			let _ = ctx.fill_text("✎", marker.at.x, marker.at.y);
		}
		None => {
			ctx.set_fill_style_str("rgba(255, 255, 255, 0.6)");
			ctx.set_font("13px sans-serif");
			let _ = ctx.fill_text("+", marker.at.x, marker.at.y);
		}
	}
}

fn draw_draft(path: &CurvePath, k: f64, ctx: &CanvasRenderingContext2d) {
	let (dash, gap) = (6.0 / k, 4.0 / k);
	ctx.set_stroke_style_str("rgba(133, 153, 0, 0.9)");
	ctx.set_line_width(2.0 / k.max(0.5));
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&JsValue::from_f64(dash),
		&JsValue::from_f64(gap),
	));
	trace(path, ctx);
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_node(node: &NodeBox, k: f64, ctx: &CanvasRenderingContext2d) {
	let (x, y, w, h) = (node.origin.x, node.origin.y, node.size.width, node.size.height);

	if node.dragging {
		ctx.set_global_alpha(0.85);
	}
	ctx.set_fill_style_str("#f7f7fb");
	ctx.fill_rect(x, y, w, h);
	ctx.set_global_alpha(1.0);

	let (border, width) = match (node.selected, node.dragging) {
		(_, true) => ("#ff7f0e", 2.5),
		(true, false) => ("#1f77b4", 2.5),
		_ => ("#9aa0b4", 1.0),
	};
	ctx.set_stroke_style_str(border);
	ctx.set_line_width(width / k.max(0.5));
	ctx.stroke_rect(x, y, w, h);

	let title: String = if node.title.chars().count() > TITLE_CHARS {
		node.title.chars().take(TITLE_CHARS - 1).chain(['…']).collect()
	} else {
		node.title.clone()
	};
	ctx.set_fill_style_str("#1a1a2e");
	ctx.set_text_align("left");
	ctx.set_text_baseline("alphabetic");
	ctx.set_font("bold 13px sans-serif");
	let _ = ctx.fill_text(&title, x + 10.0, y + 26.0);

	ctx.set_font("11px monospace");
	ctx.set_fill_style_str("#5b6078");
	if let Some(hash) = &node.short_hash {
		let _ = ctx.fill_text(hash, x + 10.0, y + h - 12.0);
	}
	ctx.set_text_align("right");
	let _ = ctx.fill_text(
		&format!("↙{} ↗{}", node.incoming, node.outgoing),
		x + w - 10.0,
		y + h - 12.0,
	);

	for dock in &node.docking {
		ctx.begin_path();
		let _ = ctx.arc(dock.at.x, dock.at.y, 5.0, 0.0, 2.0 * PI);
		ctx.set_fill_style_str("#859900");
		ctx.fill();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn zoom_keeps_pointer_fixed() {
		let mut view = ViewTransform::default();
		let before = view.screen_to_canvas(300.0, 200.0);
		view.zoom_at(300.0, 200.0, 1.1);
		let after = view.screen_to_canvas(300.0, 200.0);
		assert!((before.x - after.x).abs() < 1e-9);
		assert!((before.y - after.y).abs() < 1e-9);
	}

	#[test]
	fn zoom_is_bounded() {
		let mut view = ViewTransform::default();
		for _ in 0..50 {
			view.zoom_at(0.0, 0.0, 0.5);
		}
		assert_eq!(view.k, 0.2);
	}
}
