use std::collections::HashMap;

use log::debug;

use super::types::{DocumentId, DocumentNode, Link, LinkId, Point};
use crate::api::{DocumentSummary, RawLink, SavedPosition};
use crate::config::CanvasConfig;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
	pub node: Option<DocumentId>,
	pub link: Option<LinkId>,
}

/// Authoritative nodes, positions and links of the open collection.
///
/// Nodes live in document-list order; links reference them by id only. Every node has
/// exactly one position after [`GraphModel::load`].
#[derive(Clone, Debug, Default)]
pub struct GraphModel {
	config: CanvasConfig,
	nodes: Vec<DocumentNode>,
	index: HashMap<DocumentId, usize>,
	positions: HashMap<DocumentId, Point>,
	links: Vec<Link>,
	selection: Selection,
}

impl GraphModel {
	pub fn new(config: CanvasConfig) -> Self {
		Self {
			config,
			..Self::default()
		}
	}

	pub fn config(&self) -> &CanvasConfig {
		&self.config
	}

	/// Replace the whole model. Documents without a saved position get the grid slot
	/// of their index in `documents`; links with a missing endpoint (or pointing at
	/// themselves) are dropped. Repeated document ids keep their first occurrence.
	pub fn load(&mut self, documents: &[DocumentSummary], links: &[RawLink], saved: &[SavedPosition]) {
		self.nodes.clear();
		self.index.clear();
		self.positions.clear();
		self.selection = Selection::default();

		let mut slots = Vec::with_capacity(documents.len());
		for (slot, doc) in documents.iter().enumerate() {
			let id = DocumentId::new(doc.id.canonical());
			if self.index.contains_key(&id) {
				continue;
			}
			slots.push(slot);
			self.index.insert(id.clone(), self.nodes.len());
			self.nodes.push(DocumentNode {
				id,
				title: doc.title.clone(),
				short_hash: doc.short_hash.clone().filter(|h| !h.is_empty()),
			});
		}

		for pos in saved {
			let id = DocumentId::new(pos.document_id.canonical());
			if self.index.contains_key(&id) {
				self.positions.insert(id, Point::new(pos.x, pos.y).clamped());
			}
		}
		for (node, &slot) in self.nodes.iter().zip(&slots) {
			if !self.positions.contains_key(&node.id) {
				self.positions.insert(node.id.clone(), self.config.grid_slot(slot));
			}
		}

		self.reload_links(links);
	}

	/// Replace only the link set, keeping nodes and positions.
	pub fn reload_links(&mut self, links: &[RawLink]) {
		self.links.clear();
		for raw in links {
			match self.normalize(raw) {
				Some(link) => {
					self.upsert_link(link);
				}
				None => debug!("dropping link {:?}: endpoint not on canvas", raw.id),
			}
		}
		if self.selection.link.as_ref().is_some_and(|id| self.link(id).is_none()) {
			self.selection.link = None;
		}
	}

	/// Canonical form of a backend link, or `None` if it cannot be shown here.
	pub fn normalize(&self, raw: &RawLink) -> Option<Link> {
		let id = raw.id.as_ref()?.canonical();
		let (source, target) = (raw.source_document.id(), raw.target_document.id());
		if source == target || !self.contains(&source) || !self.contains(&target) {
			return None;
		}
		Some(Link {
			id: LinkId::new(id),
			source,
			target,
			source_side: raw.source_side,
			target_side: raw.target_side,
			relation_text: raw.relation_text.clone().unwrap_or_default(),
			created_by: raw.created_by.as_ref().map(|u| u.id()),
		})
	}

	pub fn contains(&self, id: &DocumentId) -> bool {
		self.index.contains_key(id)
	}

	pub fn nodes(&self) -> &[DocumentNode] {
		&self.nodes
	}

	pub fn node(&self, id: &DocumentId) -> Option<&DocumentNode> {
		self.index.get(id).map(|&i| &self.nodes[i])
	}

	pub fn position(&self, id: &DocumentId) -> Option<Point> {
		self.positions.get(id).copied()
	}

	/// Move a node. Coordinates are clamped to the non-negative quadrant.
	pub fn upsert_position(&mut self, id: &DocumentId, position: Point) -> bool {
		if !self.contains(id) {
			return false;
		}
		self.positions.insert(id.clone(), position.clamped());
		true
	}

	pub fn links(&self) -> &[Link] {
		&self.links
	}

	pub fn link(&self, id: &LinkId) -> Option<&Link> {
		self.links.iter().find(|l| &l.id == id)
	}

	/// Add a link, or replace the one with the same id.
	pub fn add_link(&mut self, link: Link) -> bool {
		if link.source == link.target || !self.contains(&link.source) || !self.contains(&link.target) {
			return false;
		}
		self.upsert_link(link);
		true
	}

	fn upsert_link(&mut self, link: Link) {
		match self.links.iter_mut().find(|l| l.id == link.id) {
			Some(existing) => *existing = link,
			None => self.links.push(link),
		}
	}

	pub fn update_link_text(&mut self, id: &LinkId, text: &str) -> bool {
		match self.links.iter_mut().find(|l| &l.id == id) {
			Some(link) => {
				link.relation_text = text.to_owned();
				true
			}
			None => false,
		}
	}

	pub fn remove_link(&mut self, id: &LinkId) -> Option<Link> {
		let at = self.links.iter().position(|l| &l.id == id)?;
		if self.selection.link.as_ref() == Some(id) {
			self.selection.link = None;
		}
		Some(self.links.remove(at))
	}

	/// The `(source, target)` documents a link joins.
	pub fn nodes_referencing_link(&self, id: &LinkId) -> Option<(&DocumentNode, &DocumentNode)> {
		let link = self.link(id)?;
		Some((self.node(&link.source)?, self.node(&link.target)?))
	}

	pub fn incoming<'a>(&'a self, id: &'a DocumentId) -> impl Iterator<Item = &'a Link> + 'a {
		self.links.iter().filter(move |l| &l.target == id)
	}

	pub fn outgoing<'a>(&'a self, id: &'a DocumentId) -> impl Iterator<Item = &'a Link> + 'a {
		self.links.iter().filter(move |l| &l.source == id)
	}

	pub fn selection(&self) -> &Selection {
		&self.selection
	}

	pub fn select_node(&mut self, id: &DocumentId) {
		self.selection = Selection {
			node: Some(id.clone()),
			link: None,
		};
	}

	pub fn select_link(&mut self, id: &LinkId) {
		self.selection = Selection {
			node: None,
			link: Some(id.clone()),
		};
	}

	pub fn clear_selection(&mut self) {
		self.selection = Selection::default();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::{EndpointRef, RawId};
	use crate::components::doc_canvas::Side;

	fn doc(id: &str, hash: Option<&str>) -> DocumentSummary {
		DocumentSummary {
			id: RawId::Text(id.into()),
			title: format!("Doc {id}"),
			short_hash: hash.map(str::to_owned),
		}
	}

	fn bare(id: &str) -> EndpointRef {
		EndpointRef::Id(RawId::Text(id.into()))
	}

	fn raw_link(id: &str, source: EndpointRef, target: EndpointRef) -> RawLink {
		RawLink {
			id: Some(RawId::Text(id.into())),
			source_document: source,
			target_document: target,
			source_side: Side::Right,
			target_side: Side::Left,
			relation_text: None,
			created_by: None,
		}
	}

	fn loaded() -> GraphModel {
		let mut model = GraphModel::default();
		model.load(
			&[doc("d1", Some("ab12")), doc("d2", None), doc("d3", Some("ff00"))],
			&[raw_link("l1", bare("d1"), bare("d2"))],
			&[],
		);
		model
	}

	#[test]
	fn grid_slot_follows_document_list_order() {
		let mut model = GraphModel::default();
		model.load(&[doc("d1", None), doc("d1", Some("dup")), doc("d2", None)], &[], &[]);
		assert_eq!(model.nodes().len(), 2);
		assert_eq!(model.node(&"d1".into()).map(|n| n.short_hash.clone()), Some(None));
		assert_eq!(model.position(&"d1".into()), Some(Point::new(50.0, 50.0)));
		assert_eq!(model.position(&"d2".into()), Some(model.config().grid_slot(2)));
		assert_eq!(model.position(&"d2".into()), Some(Point::new(490.0, 50.0)));
	}

	#[test]
	fn grid_fallback_for_unpositioned_nodes() {
		let mut model = GraphModel::default();
		model.load(&[doc("D1", None), doc("D2", None)], &[], &[]);
		assert_eq!(model.position(&"D1".into()), Some(Point::new(50.0, 50.0)));
		assert_eq!(model.position(&"D2".into()), Some(Point::new(270.0, 50.0)));
	}

	#[test]
	fn saved_positions_win_over_grid() {
		let mut model = GraphModel::default();
		model.load(
			&[doc("a", None), doc("b", None)],
			&[],
			&[
				SavedPosition {
					document_id: RawId::Text("b".into()),
					x: 400.0,
					y: 12.0,
				},
				SavedPosition {
					document_id: RawId::Text("gone".into()),
					x: 1.0,
					y: 1.0,
				},
			],
		);
		assert_eq!(model.position(&"a".into()), Some(Point::new(50.0, 50.0)));
		assert_eq!(model.position(&"b".into()), Some(Point::new(400.0, 12.0)));
		assert_eq!(model.position(&"gone".into()), None);
	}

	#[test]
	fn dangling_and_self_links_are_dropped() {
		let mut model = GraphModel::default();
		model.load(
			&[doc("a", None), doc("b", None)],
			&[
				raw_link("ok", bare("a"), bare("b")),
				raw_link("dangling", bare("a"), bare("missing")),
				raw_link("self", bare("a"), bare("a")),
			],
			&[],
		);
		let ids: Vec<_> = model.links().iter().map(|l| l.id.as_str()).collect();
		assert_eq!(ids, ["ok"]);
	}

	#[test]
	fn embedded_and_bare_endpoints_normalize_identically() {
		let embedded = EndpointRef::Document(doc("d1", Some("ab12")));
		let model = loaded();
		let a = model.normalize(&raw_link("x", embedded, bare("d2"))).unwrap();
		let b = model.normalize(&raw_link("x", bare("d1"), bare("d2"))).unwrap();
		assert_eq!(a, b);
	}

	#[test]
	fn numeric_ids_are_canonical_strings() {
		let mut model = GraphModel::default();
		model.load(
			&[
				DocumentSummary {
					id: RawId::Number(7),
					title: "Seven".into(),
					short_hash: None,
				},
				doc("8", None),
			],
			&[raw_link("l", EndpointRef::Id(RawId::Number(8)), bare("7"))],
			&[],
		);
		assert_eq!(model.links().len(), 1);
		assert_eq!(model.links()[0].source.as_str(), "8");
		assert!(model.contains(&"7".into()));
	}

	#[test]
	fn text_update_is_idempotent() {
		let mut model = loaded();
		let id = LinkId::from("l1");
		assert!(model.update_link_text(&id, "cites"));
		assert!(model.update_link_text(&id, "cites"));
		let matching: Vec<_> = model.links().iter().filter(|l| l.id == id).collect();
		assert_eq!(matching.len(), 1);
		assert_eq!(matching[0].relation_text, "cites");
	}

	#[test]
	fn add_link_replaces_same_id() {
		let mut model = loaded();
		let mut link = model.link(&"l1".into()).cloned().unwrap();
		link.relation_text = "extends".into();
		assert!(model.add_link(link));
		assert_eq!(model.links().len(), 1);
		assert_eq!(model.links()[0].relation_text, "extends");
	}

	#[test]
	fn add_link_rejects_self_links() {
		let mut model = loaded();
		let link = Link {
			id: "l2".into(),
			source: "d3".into(),
			target: "d3".into(),
			source_side: Side::Top,
			target_side: Side::Bottom,
			relation_text: String::new(),
			created_by: None,
		};
		assert!(!model.add_link(link));
		assert_eq!(model.links().len(), 1);
	}

	#[test]
	fn derivations() {
		let model = loaded();
		let (source, target) = model.nodes_referencing_link(&"l1".into()).unwrap();
		assert_eq!((source.id.as_str(), target.id.as_str()), ("d1", "d2"));
		let d1 = DocumentId::from("d1");
		let d2 = DocumentId::from("d2");
		assert_eq!(model.outgoing(&d1).count(), 1);
		assert_eq!(model.incoming(&d1).count(), 0);
		assert_eq!(model.incoming(&d2).count(), 1);
	}

	#[test]
	fn positions_are_clamped() {
		let mut model = loaded();
		assert!(model.upsert_position(&"d1".into(), Point::new(-20.0, 35.0)));
		assert_eq!(model.position(&"d1".into()), Some(Point::new(0.0, 35.0)));
		assert!(!model.upsert_position(&"nope".into(), Point::new(1.0, 1.0)));
	}

	#[test]
	fn remove_link_clears_its_selection() {
		let mut model = loaded();
		model.select_link(&"l1".into());
		assert!(model.remove_link(&"l1".into()).is_some());
		assert_eq!(model.selection(), &Selection::default());
		assert!(model.remove_link(&"l1".into()).is_none());
	}
}
