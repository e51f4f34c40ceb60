//! Pure projection of the model and interaction state into drawable primitives.

use super::geometry::{self, CurvePath, NodeSize};
use super::interaction::{HitTarget, InteractionState};
use super::model::GraphModel;
use super::types::{DocumentId, DocumentNode, LinkId, Point, Side};

/// Badge colour for a peer document: the character codes of the first two characters
/// of its short hash, summed, modulo the palette size.
pub fn badge_color<'a>(short_hash: &str, palette: &'a [String]) -> &'a str {
	if palette.is_empty() {
		return "#7f7f7f";
	}
	let sum: u32 = short_hash.chars().take(2).map(u32::from).sum();
	&palette[sum as usize % palette.len()]
}

#[derive(Clone, Debug, PartialEq)]
pub struct DockingPoint {
	pub side: Side,
	pub at: Point,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeBox {
	pub id: DocumentId,
	pub title: String,
	pub short_hash: Option<String>,
	pub origin: Point,
	pub size: NodeSize,
	pub selected: bool,
	pub dragging: bool,
	pub docking: Vec<DockingPoint>,
	pub incoming: usize,
	pub outgoing: usize,
}

impl NodeBox {
	fn contains(&self, p: Point) -> bool {
		p.x >= self.origin.x
			&& p.x <= self.origin.x + self.size.width
			&& p.y >= self.origin.y
			&& p.y <= self.origin.y + self.size.height
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Badge {
	pub at: Point,
	pub label: String,
	pub color: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
	pub at: Point,
	/// `None` renders the placeholder for links without relation text.
	pub text: Option<String>,
	pub selected: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinkCurve {
	pub id: LinkId,
	pub path: CurvePath,
	pub marker: Marker,
	/// Near the source end, coloured after the target, and vice versa.
	pub badges: [Badge; 2],
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
	pub nodes: Vec<NodeBox>,
	pub links: Vec<LinkCurve>,
	/// The dashed in-progress connection, if one is being drawn.
	pub draft: Option<CurvePath>,
	dock_radius: f64,
	marker_radius: f64,
}

const BADGE_LABEL_CHARS: usize = 6;

fn badge(node: &DocumentNode, at: Point, palette: &[String]) -> Badge {
	let key = node.short_hash.as_deref().unwrap_or(node.id.as_str());
	Badge {
		at,
		label: key.chars().take(BADGE_LABEL_CHARS).collect(),
		color: badge_color(key, palette).to_owned(),
	}
}

/// Build everything to draw for the current frame.
pub fn project(model: &GraphModel, state: &InteractionState) -> Scene {
	let config = model.config();
	let size = NodeSize {
		width: config.node_width,
		height: config.node_height,
	};
	let selection = model.selection();
	let dragging = match state {
		InteractionState::DraggingNode { node, .. } => Some(node),
		_ => None,
	};

	let nodes = model
		.nodes()
		.iter()
		.filter_map(|node| {
			let origin = model.position(&node.id)?;
			Some(NodeBox {
				id: node.id.clone(),
				title: node.title.clone(),
				short_hash: node.short_hash.clone(),
				origin,
				size,
				selected: selection.node.as_ref() == Some(&node.id),
				dragging: dragging == Some(&node.id),
				docking: geometry::docking_points(origin, size)
					.into_iter()
					.map(|(side, at)| DockingPoint { side, at })
					.collect(),
				incoming: model.incoming(&node.id).count(),
				outgoing: model.outgoing(&node.id).count(),
			})
		})
		.collect();

	let links = model
		.links()
		.iter()
		.filter_map(|link| {
			let (source, target) = model.nodes_referencing_link(&link.id)?;
			let path = geometry::link_between(
				model.position(&source.id)?,
				link.source_side,
				model.position(&target.id)?,
				link.target_side,
				size,
			);
			let text = match state {
				InteractionState::EditingLinkText { link: editing, draft } if *editing == link.id => {
					Some(draft.clone())
				}
				_ => Some(link.relation_text.clone()),
			}
			.filter(|t| !t.is_empty());
			Some(LinkCurve {
				id: link.id.clone(),
				marker: Marker {
					at: path.midpoint(),
					text,
					selected: selection.link.as_ref() == Some(&link.id),
				},
				badges: [
					badge(target, path.point_at(0.15), &config.palette),
					badge(source, path.point_at(0.85), &config.palette),
				],
				path,
			})
		})
		.collect();

	let draft = match state {
		InteractionState::DrawingConnection { anchor, pointer, .. } => Some(CurvePath::straight(*anchor, *pointer)),
		_ => None,
	};

	Scene {
		nodes,
		links,
		draft,
		dock_radius: config.dock_radius,
		marker_radius: config.marker_radius,
	}
}

impl Scene {
	/// Radius of the relation markers, both drawn and clickable.
	pub fn marker_radius(&self) -> f64 {
		self.marker_radius
	}

	/// Resolve what lies under `p`. Docking points beat node bodies, nodes beat link
	/// markers, and later (topmost) nodes beat earlier ones.
	pub fn hit_test(&self, p: Point) -> HitTarget {
		for node in self.nodes.iter().rev() {
			if let Some(dock) = node.docking.iter().find(|d| d.at.distance(p) <= self.dock_radius) {
				return HitTarget::DockingPoint(node.id.clone(), dock.side);
			}
			if node.contains(p) {
				return HitTarget::NodeBody(node.id.clone());
			}
		}
		self.links
			.iter()
			.rev()
			.find(|l| l.marker.at.distance(p) <= self.marker_radius)
			.map(|l| HitTarget::LinkMarker(l.id.clone()))
			.unwrap_or(HitTarget::Background)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::api::{DocumentSummary, EndpointRef, RawId, RawLink};
	use crate::config::CanvasConfig;

	fn doc(id: &str, hash: Option<&str>) -> DocumentSummary {
		DocumentSummary {
			id: RawId::Text(id.into()),
			title: format!("Doc {id}"),
			short_hash: hash.map(str::to_owned),
		}
	}

	fn link(id: &str, source: EndpointRef, target: &str, text: Option<&str>) -> RawLink {
		RawLink {
			id: Some(RawId::Text(id.into())),
			source_document: source,
			target_document: EndpointRef::Id(RawId::Text(target.into())),
			source_side: Side::Right,
			target_side: Side::Left,
			relation_text: text.map(str::to_owned),
			created_by: None,
		}
	}

	fn model(source: EndpointRef) -> GraphModel {
		let mut model = GraphModel::default();
		model.load(
			&[doc("d1", Some("ab12")), doc("d2", Some("c3d4"))],
			&[link("l1", source, "d2", None)],
			&[],
		);
		model
	}

	#[test]
	fn palette_index_is_char_sum_of_first_two() {
		let palette = CanvasConfig::default().palette;
		// 'a' (97) + 'b' (98) = 195, 195 % 10 = 5
		assert_eq!(badge_color("ab12", &palette), palette[5]);
		assert_eq!(badge_color("ab99", &palette), badge_color("ab12", &palette));
		// a single character is summed alone
		assert_eq!(badge_color("a", &palette), palette[7]);
		assert_eq!(badge_color("", &palette), palette[0]);
	}

	#[test]
	fn projection_snapshot() {
		let scene = project(&model(EndpointRef::Id(RawId::Text("d1".into()))), &InteractionState::Idle);
		let palette = CanvasConfig::default().palette;

		assert_eq!(scene.nodes.len(), 2);
		assert_eq!(scene.nodes[0].origin, Point::new(50.0, 50.0));
		assert_eq!((scene.nodes[0].incoming, scene.nodes[0].outgoing), (0, 1));
		assert_eq!((scene.nodes[1].incoming, scene.nodes[1].outgoing), (1, 0));
		assert_eq!(
			scene.nodes[1].docking[3],
			DockingPoint {
				side: Side::Left,
				at: Point::new(270.0, 90.0)
			}
		);

		let curve = &scene.links[0];
		assert_eq!(
			curve.path,
			CurvePath {
				start: Point::new(230.0, 90.0),
				control_start: Point::new(260.0, 90.0),
				control_end: Point::new(240.0, 90.0),
				end: Point::new(270.0, 90.0),
			}
		);
		assert_eq!(
			curve.marker,
			Marker {
				at: Point::new(250.0, 90.0),
				text: None,
				selected: false
			}
		);
		assert_eq!(curve.badges[0].label, "c3d4");
		assert_eq!(curve.badges[0].color, badge_color("c3d4", &palette));
		assert_eq!(curve.badges[1].label, "ab12");
		assert_eq!(scene.draft, None);
	}

	#[test]
	fn populated_and_bare_endpoints_project_identically() {
		let bare = project(&model(EndpointRef::Id(RawId::Text("d1".into()))), &InteractionState::Idle);
		let embedded = project(
			&model(EndpointRef::Document(doc("d1", Some("stale-hash")))),
			&InteractionState::Idle,
		);
		assert_eq!(bare, embedded);
	}

	#[test]
	fn draft_line_while_connecting() {
		let model = model(EndpointRef::Id(RawId::Text("d1".into())));
		let state = InteractionState::DrawingConnection {
			source: "d1".into(),
			source_side: Side::Bottom,
			anchor: Point::new(140.0, 130.0),
			pointer: Point::new(400.0, 300.0),
		};
		let scene = project(&model, &state);
		assert_eq!(
			scene.draft,
			Some(CurvePath::straight(Point::new(140.0, 130.0), Point::new(400.0, 300.0)))
		);
	}

	#[test]
	fn editing_shows_draft_and_dragging_highlights() {
		let mut model = model(EndpointRef::Id(RawId::Text("d1".into())));
		model.select_link(&"l1".into());
		let scene = project(
			&model,
			&InteractionState::EditingLinkText {
				link: "l1".into(),
				draft: "refines".into(),
			},
		);
		assert_eq!(scene.links[0].marker.text.as_deref(), Some("refines"));
		assert!(scene.links[0].marker.selected);

		let scene = project(
			&model,
			&InteractionState::DraggingNode {
				node: "d2".into(),
				pointer_offset: Point::default(),
				origin: Point::new(270.0, 50.0),
			},
		);
		assert!(scene.nodes[1].dragging);
		assert!(!scene.nodes[0].dragging);
	}

	#[test]
	fn hit_test_precedence() {
		let scene = project(&model(EndpointRef::Id(RawId::Text("d1".into()))), &InteractionState::Idle);
		assert_eq!(
			scene.hit_test(Point::new(231.0, 91.0)),
			HitTarget::DockingPoint("d1".into(), Side::Right)
		);
		assert_eq!(scene.hit_test(Point::new(100.0, 70.0)), HitTarget::NodeBody("d1".into()));
		assert_eq!(scene.hit_test(Point::new(250.0, 95.0)), HitTarget::LinkMarker("l1".into()));
		assert_eq!(scene.hit_test(Point::new(900.0, 900.0)), HitTarget::Background);
	}

	#[test]
	fn missing_hash_falls_back_to_id() {
		let mut model = GraphModel::default();
		model.load(
			&[doc("d1", None), doc("document-two", None)],
			&[link("l1", EndpointRef::Id(RawId::Text("d1".into())), "document-two", Some("see"))],
			&[],
		);
		let scene = project(&model, &InteractionState::Idle);
		assert_eq!(scene.links[0].badges[0].label, "docume");
		assert_eq!(scene.links[0].badges[1].label, "d1");
		assert_eq!(scene.links[0].marker.text.as_deref(), Some("see"));
	}

	#[test]
	fn marker_hit_area_follows_configured_radius() {
		let source = || EndpointRef::Id(RawId::Text("d1".into()));
		let near_marker = Point::new(250.0, 106.0);
		let scene = project(&model(source()), &InteractionState::Idle);
		assert_eq!(scene.marker_radius(), 10.0);
		assert_eq!(scene.hit_test(near_marker), HitTarget::Background);

		let mut wide = GraphModel::new(CanvasConfig {
			marker_radius: 18.0,
			..CanvasConfig::default()
		});
		wide.load(
			&[doc("d1", Some("ab12")), doc("d2", Some("c3d4"))],
			&[link("l1", source(), "d2", None)],
			&[],
		);
		let scene = project(&wide, &InteractionState::Idle);
		assert_eq!(scene.marker_radius(), 18.0);
		assert_eq!(scene.hit_test(near_marker), HitTarget::LinkMarker("l1".into()));
	}
}
