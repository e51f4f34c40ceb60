//! Pointer-driven state machine of the canvas.
//!
//! The controller never performs I/O. Gestures that must be persisted come back to the
//! caller as a [`Commit`], [`TextEdit`] or [`ConfirmedDelete`] to hand to
//! `PersistenceSync`.

use log::debug;

use super::geometry::{self, NodeSize};
use super::model::GraphModel;
use super::types::{Actor, DocumentId, LinkDraft, LinkId, Point, Side};
use crate::error::CanvasError;

const DEFAULT_TEXT_LIMIT: usize = 100;

/// What the pointer is over, resolved by the render layer's hit test.
#[derive(Clone, Debug, PartialEq)]
pub enum HitTarget {
	NodeBody(DocumentId),
	DockingPoint(DocumentId, Side),
	LinkMarker(LinkId),
	Background,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum InteractionState {
	#[default]
	Idle,
	DraggingNode {
		node: DocumentId,
		/// Pointer minus the node's top-left corner at pointer-down.
		pointer_offset: Point,
		/// Where the node was at pointer-down, restored if the drag is cancelled.
		origin: Point,
	},
	DrawingConnection {
		source: DocumentId,
		source_side: Side,
		anchor: Point,
		pointer: Point,
	},
	EditingLinkText {
		link: LinkId,
		draft: String,
	},
}

/// Pointer routing held for the length of one drag or connection draw.
///
/// Created when the gesture starts and dropped when it ends, on every path
/// (release, abort, reset, or the controller itself going away).
pub struct GestureCapture {
	release: Option<Box<dyn FnOnce()>>,
}

impl GestureCapture {
	pub fn new(release: impl FnOnce() + 'static) -> Self {
		Self {
			release: Some(Box::new(release)),
		}
	}

	/// A capture with nothing to release.
	pub fn noop() -> Self {
		Self { release: None }
	}
}

impl Drop for GestureCapture {
	fn drop(&mut self) {
		if let Some(release) = self.release.take() {
			release();
		}
	}
}

/// A finished pointer gesture that needs a backend write.
#[derive(Clone, Debug, PartialEq)]
pub enum Commit {
	SavePosition { node: DocumentId, position: Point },
	CreateLink(LinkDraft),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextEdit {
	pub link: LinkId,
	pub text: String,
}

/// Proof that the user confirmed a deletion. Only [`InteractionController::confirm_delete`]
/// hands these out.
#[derive(Debug, PartialEq, Eq)]
pub struct ConfirmedDelete(LinkId);

impl ConfirmedDelete {
	pub fn link_id(&self) -> &LinkId {
		&self.0
	}
}

pub struct InteractionController {
	state: InteractionState,
	actor: Actor,
	capture: Option<GestureCapture>,
	acquire: Box<dyn Fn() -> GestureCapture>,
	pending_delete: Option<LinkId>,
	link_in_flight: bool,
	text_limit: usize,
	node_size: NodeSize,
}

impl InteractionController {
	pub fn new(actor: Actor) -> Self {
		Self {
			state: InteractionState::Idle,
			actor,
			capture: None,
			acquire: Box::new(GestureCapture::noop),
			pending_delete: None,
			link_in_flight: false,
			text_limit: DEFAULT_TEXT_LIMIT,
			node_size: NodeSize::default(),
		}
	}

	/// Use `acquire` to start routing pointer events for each gesture.
	pub fn with_capture(mut self, acquire: impl Fn() -> GestureCapture + 'static) -> Self {
		self.acquire = Box::new(acquire);
		self
	}

	pub fn with_text_limit(mut self, chars: usize) -> Self {
		self.text_limit = chars;
		self
	}

	pub fn with_node_size(mut self, size: NodeSize) -> Self {
		self.node_size = size;
		self
	}

	pub fn state(&self) -> &InteractionState {
		&self.state
	}

	pub fn is_capturing(&self) -> bool {
		self.capture.is_some()
	}

	pub fn pending_delete(&self) -> Option<&LinkId> {
		self.pending_delete.as_ref()
	}

	pub fn link_in_flight(&self) -> bool {
		self.link_in_flight
	}

	fn begin_gesture(&mut self, state: InteractionState) {
		debug!("gesture start: {state:?}");
		self.state = state;
		self.capture = Some((self.acquire)());
	}

	fn end_gesture(&mut self) {
		self.state = InteractionState::Idle;
		self.capture = None;
	}

	pub fn pointer_down(
		&mut self,
		model: &mut GraphModel,
		target: HitTarget,
		pointer: Point,
	) -> Result<(), CanvasError> {
		if matches!(
			self.state,
			InteractionState::DraggingNode { .. } | InteractionState::DrawingConnection { .. }
		) {
			return Ok(());
		}
		match target {
			HitTarget::Background => {
				self.background_click(model);
				Ok(())
			}
			_ if matches!(self.state, InteractionState::EditingLinkText { .. }) => Ok(()),
			HitTarget::NodeBody(node) => {
				let Some(origin) = model.position(&node) else {
					return Ok(());
				};
				model.select_node(&node);
				self.begin_gesture(InteractionState::DraggingNode {
					pointer_offset: pointer.offset_from(origin),
					origin,
					node,
				});
				Ok(())
			}
			HitTarget::DockingPoint(source, source_side) => {
				if self.link_in_flight {
					debug!("ignoring connection start while a link is being created");
					return Ok(());
				}
				let Some(origin) = model.position(&source) else {
					return Ok(());
				};
				self.begin_gesture(InteractionState::DrawingConnection {
					anchor: geometry::anchor(origin, source_side, self.node_size),
					source,
					source_side,
					pointer,
				});
				Ok(())
			}
			HitTarget::LinkMarker(link) => self.open_link_editor(model, &link),
		}
	}

	/// High-frequency update during a gesture. Never produces a commit.
	pub fn pointer_move(&mut self, model: &mut GraphModel, pointer: Point) {
		match &mut self.state {
			InteractionState::DraggingNode {
				node,
				pointer_offset,
				..
			} => {
				model.upsert_position(node, pointer.offset_from(*pointer_offset));
			}
			InteractionState::DrawingConnection { pointer: current, .. } => *current = pointer,
			InteractionState::Idle | InteractionState::EditingLinkText { .. } => {}
		}
	}

	pub fn pointer_up(&mut self, model: &mut GraphModel, target: HitTarget, pointer: Point) -> Option<Commit> {
		match std::mem::take(&mut self.state) {
			InteractionState::DraggingNode {
				node,
				pointer_offset,
				..
			} => {
				self.end_gesture();
				model.upsert_position(&node, pointer.offset_from(pointer_offset));
				let position = model.position(&node)?;
				debug!("drag of {node} committed at ({}, {})", position.x, position.y);
				Some(Commit::SavePosition { node, position })
			}
			InteractionState::DrawingConnection {
				source,
				source_side,
				..
			} => {
				self.end_gesture();
				match target {
					HitTarget::DockingPoint(target, target_side) if target != source && model.contains(&target) => {
						self.link_in_flight = true;
						Some(Commit::CreateLink(LinkDraft {
							source,
							source_side,
							target,
							target_side,
						}))
					}
					_ => {
						debug!("connection from {source} aborted");
						None
					}
				}
			}
			other => {
				self.state = other;
				None
			}
		}
	}

	/// Click on empty canvas. Clears selection; leaves drags and connection draws alone.
	pub fn background_click(&mut self, model: &mut GraphModel) {
		match self.state {
			InteractionState::DraggingNode { .. } | InteractionState::DrawingConnection { .. } => {}
			InteractionState::EditingLinkText { .. } => {
				self.state = InteractionState::Idle;
				self.pending_delete = None;
				model.clear_selection();
			}
			InteractionState::Idle => model.clear_selection(),
		}
	}

	fn authorize(&self, model: &GraphModel, link: &LinkId) -> Result<(), CanvasError> {
		let found = model.link(link).ok_or_else(|| CanvasError::UnknownLink(link.clone()))?;
		if self.actor.may_edit(found) {
			Ok(())
		} else {
			Err(CanvasError::NotAuthorized(link.clone()))
		}
	}

	/// Idle → EditingLinkText, if the actor may edit this link.
	pub fn open_link_editor(&mut self, model: &mut GraphModel, link: &LinkId) -> Result<(), CanvasError> {
		if self.state != InteractionState::Idle {
			return Ok(());
		}
		self.authorize(model, link)?;
		let draft = model.link(link).map(|l| l.relation_text.clone()).unwrap_or_default();
		model.select_link(link);
		self.state = InteractionState::EditingLinkText {
			link: link.clone(),
			draft,
		};
		Ok(())
	}

	/// Replace the draft, truncated to the relation text limit.
	pub fn set_draft(&mut self, text: &str) {
		let limit = self.text_limit;
		if let InteractionState::EditingLinkText { draft, .. } = &mut self.state {
			*draft = text.chars().take(limit).collect();
		}
	}

	pub fn draft(&self) -> Option<&str> {
		match &self.state {
			InteractionState::EditingLinkText { draft, .. } => Some(draft),
			_ => None,
		}
	}

	/// The edit to send. The editor stays open until [`Self::edit_saved`].
	pub fn save_edit(&self) -> Option<TextEdit> {
		match &self.state {
			InteractionState::EditingLinkText { link, draft } => Some(TextEdit {
				link: link.clone(),
				text: draft.trim().to_owned(),
			}),
			_ => None,
		}
	}

	pub fn edit_saved(&mut self, link: &LinkId) {
		if matches!(&self.state, InteractionState::EditingLinkText { link: editing, .. } if editing == link) {
			self.state = InteractionState::Idle;
		}
	}

	pub fn cancel_edit(&mut self) {
		if matches!(self.state, InteractionState::EditingLinkText { .. }) {
			self.state = InteractionState::Idle;
			self.pending_delete = None;
		}
	}

	/// First step of a deletion. Same authorization as editing.
	pub fn request_delete(&mut self, model: &GraphModel, link: &LinkId) -> Result<(), CanvasError> {
		self.authorize(model, link)?;
		self.pending_delete = Some(link.clone());
		Ok(())
	}

	pub fn confirm_delete(&mut self) -> Option<ConfirmedDelete> {
		let link = self.pending_delete.take()?;
		if matches!(&self.state, InteractionState::EditingLinkText { link: editing, .. } if *editing == link) {
			self.state = InteractionState::Idle;
		}
		Some(ConfirmedDelete(link))
	}

	pub fn cancel_delete(&mut self) {
		self.pending_delete = None;
	}

	/// The create request started by the last connection finished, either way.
	pub fn link_settled(&mut self) {
		self.link_in_flight = false;
	}

	/// Escape: abandon the current gesture or edit without committing anything.
	/// A dragged node goes back to where the drag started.
	pub fn cancel(&mut self, model: &mut GraphModel) {
		if self.state != InteractionState::Idle {
			debug!("interaction cancelled: {:?}", self.state);
		}
		if let InteractionState::DraggingNode { node, origin, .. } = &self.state {
			model.upsert_position(node, *origin);
		}
		self.end_gesture();
		self.pending_delete = None;
	}

	/// Drop all transient state, e.g. when the collection changes or the canvas unmounts.
	pub fn reset(&mut self) {
		self.end_gesture();
		self.pending_delete = None;
		self.link_in_flight = false;
	}
}
