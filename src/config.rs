//! Runtime configuration, read from an inline JSON block in the host page.

use log::{Level, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::components::doc_canvas::Point;

/// Id of the `<script type="application/json">` element holding [`AppConfig`].
pub const CONFIG_ELEMENT_ID: &str = "doc-canvas-config";

const PALETTE: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to parse config block: {0}")]
	Parse(#[from] serde_json::Error),
}

/// Top-level application settings.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
	/// Base URL of the knowledge-base API, without a trailing slash.
	pub api_base: String,
	pub log_level: String,
	pub canvas: CanvasConfig,
}

/// Fixed geometry and presentation constants of the canvas.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
	pub node_width: f64,
	pub node_height: f64,
	pub grid_columns: usize,
	pub grid_pitch_x: f64,
	pub grid_pitch_y: f64,
	pub grid_origin_x: f64,
	pub grid_origin_y: f64,
	/// Pointer distance within which a docking point counts as hit.
	pub dock_radius: f64,
	pub marker_radius: f64,
	pub max_relation_chars: usize,
	pub palette: Vec<String>,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			api_base: "/api".into(),
			log_level: "debug".into(),
			canvas: CanvasConfig::default(),
		}
	}
}

impl Default for CanvasConfig {
	fn default() -> Self {
		Self {
			node_width: 180.0,
			node_height: 80.0,
			grid_columns: 4,
			grid_pitch_x: 220.0,
			grid_pitch_y: 120.0,
			grid_origin_x: 50.0,
			grid_origin_y: 50.0,
			dock_radius: 8.0,
			marker_radius: 10.0,
			max_relation_chars: 100,
			palette: PALETTE.iter().map(|c| (*c).to_owned()).collect(),
		}
	}
}

impl AppConfig {
	/// Parse a config block. Missing fields take their defaults.
	pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
		let mut config: AppConfig = serde_json::from_str(raw)?;
		config.api_base = config.api_base.trim_end_matches('/').to_owned();
		if config.canvas.palette.is_empty() {
			config.canvas.palette = CanvasConfig::default().palette;
		}
		if config.canvas.grid_columns == 0 {
			config.canvas.grid_columns = 1;
		}
		Ok(config)
	}

	/// Read the config block from the current document, falling back to defaults.
	///
	/// A relative `apiBase` is resolved against the page origin.
	pub fn from_page() -> Self {
		let window = web_sys::window();
		let raw = window
			.as_ref()
			.and_then(|w| w.document())
			.and_then(|d| d.get_element_by_id(CONFIG_ELEMENT_ID))
			.and_then(|el| el.text_content());
		let mut config = match raw {
			Some(raw) if !raw.trim().is_empty() => Self::from_json(&raw).unwrap_or_else(|e| {
				warn!("{e}; using default configuration");
				Self::default()
			}),
			_ => Self::default(),
		};
		if let Some(origin) = window.and_then(|w| w.location().origin().ok()) {
			config.api_base = absolute_base(&config.api_base, &origin);
		}
		config
	}

	pub fn level(&self) -> Level {
		self.log_level.parse().unwrap_or(Level::Debug)
	}
}

fn absolute_base(base: &str, origin: &str) -> String {
	if base.contains("://") {
		return base.to_owned();
	}
	let origin = origin.trim_end_matches('/');
	let path = base.strip_prefix('/').unwrap_or(base);
	format!("{origin}/{path}").trim_end_matches('/').to_owned()
}

impl CanvasConfig {
	/// Grid fallback slot for the node at `index` in the document list.
	pub fn grid_slot(&self, index: usize) -> Point {
		let columns = self.grid_columns.max(1);
		let (col, row) = (index % columns, index / columns);
		Point::new(
			self.grid_origin_x + col as f64 * self.grid_pitch_x,
			self.grid_origin_y + row as f64 * self.grid_pitch_y,
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn grid_wraps_after_four_columns() {
		let c = CanvasConfig::default();
		assert_eq!(c.grid_slot(0), Point::new(50.0, 50.0));
		assert_eq!(c.grid_slot(1), Point::new(270.0, 50.0));
		assert_eq!(c.grid_slot(3), Point::new(710.0, 50.0));
		assert_eq!(c.grid_slot(4), Point::new(50.0, 170.0));
	}

	#[test]
	fn partial_config_keeps_defaults() {
		let config =
			AppConfig::from_json(r#"{ "apiBase": "https://kb.example/api/", "canvas": { "gridColumns": 2 } }"#)
				.unwrap();
		assert_eq!(config.api_base, "https://kb.example/api");
		assert_eq!(config.canvas.grid_columns, 2);
		assert_eq!(config.canvas.node_width, 180.0);
		assert_eq!(config.canvas.palette.len(), 10);
		assert_eq!(config.level(), Level::Debug);
	}

	#[test]
	fn malformed_config_is_an_error() {
		assert!(matches!(AppConfig::from_json("{ nope"), Err(ConfigError::Parse(_))));
	}

	#[test]
	fn relative_base_is_resolved_against_origin() {
		assert_eq!(absolute_base("/api", "https://kb.example"), "https://kb.example/api");
		assert_eq!(absolute_base("api/v2", "http://localhost:8080/"), "http://localhost:8080/api/v2");
		assert_eq!(absolute_base("", "https://kb.example"), "https://kb.example");
		assert_eq!(absolute_base("https://other.example/api", "https://kb.example"), "https://other.example/api");
	}

	#[test]
	fn degenerate_values_are_repaired() {
		let config = AppConfig::from_json(r#"{ "canvas": { "gridColumns": 0, "palette": [] } }"#).unwrap();
		assert_eq!(config.canvas.grid_columns, 1);
		assert!(!config.canvas.palette.is_empty());
	}
}
