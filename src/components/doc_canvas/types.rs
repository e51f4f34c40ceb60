use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical document identifier. Always compared as a string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

/// Canonical link identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(String);

macro_rules! string_id {
	($name:ident) => {
		impl $name {
			pub fn new(id: impl Into<String>) -> Self {
				Self(id.into())
			}

			pub fn as_str(&self) -> &str {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(&self.0)
			}
		}

		impl From<&str> for $name {
			fn from(id: &str) -> Self {
				Self(id.to_owned())
			}
		}

		impl From<String> for $name {
			fn from(id: String) -> Self {
				Self(id)
			}
		}
	};
}

string_id!(DocumentId);
string_id!(LinkId);

/// A canvas-space coordinate. Node positions are the top-left corner of the node box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Clamp both axes to `>= 0`.
	pub fn clamped(self) -> Self {
		Self {
			x: self.x.max(0.0),
			y: self.y.max(0.0),
		}
	}

	pub fn offset_from(self, origin: Point) -> Self {
		Self {
			x: self.x - origin.x,
			y: self.y - origin.y,
		}
	}

	pub fn translate(self, dx: f64, dy: f64) -> Self {
		Self {
			x: self.x + dx,
			y: self.y + dy,
		}
	}

	pub fn distance(self, other: Point) -> f64 {
		let (dx, dy) = (self.x - other.x, self.y - other.y);
		(dx * dx + dy * dy).sqrt()
	}
}

/// Edge of a node box a link attaches to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
	Top,
	Right,
	Bottom,
	Left,
}

impl Side {
	/// All four docking sides, clockwise from the top.
	pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

	pub fn as_str(self) -> &'static str {
		match self {
			Side::Top => "top",
			Side::Right => "right",
			Side::Bottom => "bottom",
			Side::Left => "left",
		}
	}
}

impl fmt::Display for Side {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One document placed on the canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentNode {
	pub id: DocumentId,
	pub title: String,
	pub short_hash: Option<String>,
}

/// A directed, side-anchored link between two documents.
#[derive(Clone, Debug, PartialEq)]
pub struct Link {
	pub id: LinkId,
	pub source: DocumentId,
	pub target: DocumentId,
	pub source_side: Side,
	pub target_side: Side,
	pub relation_text: String,
	pub created_by: Option<String>,
}

/// A completed connection gesture, not yet persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkDraft {
	pub source: DocumentId,
	pub source_side: Side,
	pub target: DocumentId,
	pub target_side: Side,
}

/// The identity acting on the canvas.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
	/// `None` when the session could not be resolved.
	#[serde(default, alias = "_id")]
	pub id: Option<String>,
	#[serde(default)]
	pub is_org_admin: bool,
}

impl Actor {
	/// Org admins may edit any link; everyone else only the links they created.
	pub fn may_edit(&self, link: &Link) -> bool {
		if self.is_org_admin {
			return true;
		}
		match (&self.id, &link.created_by) {
			(Some(me), Some(author)) => me == author,
			_ => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn link_by(author: Option<&str>) -> Link {
		Link {
			id: "l1".into(),
			source: "a".into(),
			target: "b".into(),
			source_side: Side::Right,
			target_side: Side::Left,
			relation_text: String::new(),
			created_by: author.map(str::to_owned),
		}
	}

	#[test]
	fn author_and_admin_may_edit() {
		let author = Actor {
			id: Some("u1".into()),
			is_org_admin: false,
		};
		let admin = Actor {
			id: Some("u9".into()),
			is_org_admin: true,
		};
		assert!(author.may_edit(&link_by(Some("u1"))));
		assert!(admin.may_edit(&link_by(Some("u1"))));
		assert!(admin.may_edit(&link_by(None)));
	}

	#[test]
	fn strangers_and_anonymous_may_not_edit() {
		let stranger = Actor {
			id: Some("u2".into()),
			is_org_admin: false,
		};
		assert!(!stranger.may_edit(&link_by(Some("u1"))));
		assert!(!stranger.may_edit(&link_by(None)));
		assert!(!Actor::default().may_edit(&link_by(Some("u1"))));
	}

	#[test]
	fn clamp_keeps_canvas_non_negative() {
		assert_eq!(Point::new(-4.0, 12.5).clamped(), Point::new(0.0, 12.5));
		assert_eq!(Point::new(3.0, -0.1).clamped(), Point::new(3.0, 0.0));
	}

	#[test]
	fn sides_serialize_lowercase() {
		assert_eq!(serde_json::to_string(&Side::Bottom).unwrap(), "\"bottom\"");
		let side: Side = serde_json::from_str("\"left\"").unwrap();
		assert_eq!(side, Side::Left);
	}
}
