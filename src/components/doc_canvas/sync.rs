//! Backend writes for canvas mutations and reconciliation of their responses.
//!
//! Each user-visible action maps to at most one request, except a create whose
//! response lacks populated endpoints, which re-fetches the link list. Nothing is
//! batched or retried.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};

use super::interaction::{ConfirmedDelete, TextEdit};
use super::model::GraphModel;
use super::types::{DocumentId, LinkDraft, LinkId, Point};
use crate::api::{Backend, RawLink, SavedPosition};
use crate::error::{CanvasError, MutationKind};

/// Outcome of a fire-and-forget position write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PositionWrite {
	Saved,
	/// Matched the last persisted value; no request was sent.
	Unchanged,
	/// Logged and otherwise ignored. The local position stays.
	Failed,
	Detached,
}

/// Flips to detached when the canvas unmounts. Cheap to clone and `Send`, so it can
/// live in cleanup hooks.
#[derive(Clone, Debug, Default)]
pub struct DetachHandle(Arc<AtomicBool>);

impl DetachHandle {
	pub fn detach(&self) {
		self.0.store(true, Ordering::Release);
	}

	pub fn is_detached(&self) -> bool {
		self.0.load(Ordering::Acquire)
	}
}

pub struct PersistenceSync<B> {
	backend: Rc<B>,
	collection_id: String,
	model: Rc<RefCell<GraphModel>>,
	persisted: RefCell<HashMap<DocumentId, Point>>,
	detached: DetachHandle,
}

impl<B: Backend> PersistenceSync<B> {
	/// `saved` seeds the last-persisted positions so unchanged drags skip the network.
	pub fn new(
		backend: Rc<B>,
		collection_id: impl Into<String>,
		model: Rc<RefCell<GraphModel>>,
		saved: &[SavedPosition],
	) -> Self {
		let persisted = saved
			.iter()
			.map(|p| (DocumentId::new(p.document_id.canonical()), Point::new(p.x, p.y).clamped()))
			.collect();
		Self {
			backend,
			collection_id: collection_id.into(),
			model,
			persisted: RefCell::new(persisted),
			detached: DetachHandle::default(),
		}
	}

	pub fn detach_handle(&self) -> DetachHandle {
		self.detached.clone()
	}

	fn ensure_attached(&self) -> Result<(), CanvasError> {
		if self.detached.is_detached() {
			Err(CanvasError::Detached)
		} else {
			Ok(())
		}
	}

	/// Persist a completed drag. Failures are logged, never rolled back.
	pub async fn save_position(&self, node: DocumentId, position: Point) -> PositionWrite {
		if self.detached.is_detached() {
			return PositionWrite::Detached;
		}
		if self.persisted.borrow().get(&node) == Some(&position) {
			debug!("position of {node} unchanged, skipping save");
			return PositionWrite::Unchanged;
		}
		match self
			.backend
			.save_position(&self.collection_id, &node, position.x, position.y)
			.await
		{
			Ok(()) => {
				self.persisted.borrow_mut().insert(node, position);
				PositionWrite::Saved
			}
			Err(e) => {
				warn!("saving position of {node} failed, keeping local position: {e}");
				PositionWrite::Failed
			}
		}
	}

	/// Create a link from a completed connection gesture.
	///
	/// Nothing is added optimistically. A response with populated endpoints is merged
	/// directly; anything less triggers a full link re-fetch. Returns the new link's id
	/// when it ended up on the canvas.
	pub async fn create_link(&self, draft: LinkDraft) -> Result<Option<LinkId>, CanvasError> {
		self.ensure_attached()?;
		let created = self
			.backend
			.create_link(&self.collection_id, &draft, "")
			.await
			.map_err(CanvasError::mutation(MutationKind::CreateLink))?;
		self.ensure_attached()?;

		if created.is_fully_resolved() {
			let link = self.model.borrow().normalize(&created);
			if let Some(link) = link {
				let id = link.id.clone();
				self.model.borrow_mut().add_link(link);
				return Ok(Some(id));
			}
		}
		self.reconcile_links(&created).await
	}

	async fn reconcile_links(&self, created: &RawLink) -> Result<Option<LinkId>, CanvasError> {
		let created_id = created.id.as_ref().map(|id| LinkId::new(id.canonical()));
		match self.backend.fetch_links(&self.collection_id).await {
			Ok(links) => {
				self.ensure_attached()?;
				self.model.borrow_mut().reload_links(&links);
			}
			Err(e) => {
				self.ensure_attached()?;
				warn!("re-fetching links after create failed: {e}");
				let link = self.model.borrow().normalize(created);
				if let Some(link) = link {
					self.model.borrow_mut().add_link(link);
				}
			}
		}
		let model = self.model.borrow();
		let known = created_id.filter(|id| model.link(id).is_some());
		if known.is_none() {
			warn!("created link is not visible on this canvas after reconciliation");
		}
		Ok(known)
	}

	/// Store relation text; the server's copy replaces the local link.
	pub async fn update_link_text(&self, edit: TextEdit) -> Result<(), CanvasError> {
		self.ensure_attached()?;
		let stored = self
			.backend
			.update_link_text(&edit.link, &edit.text)
			.await
			.map_err(CanvasError::mutation(MutationKind::UpdateLinkText))?;
		self.ensure_attached()?;

		let mut model = self.model.borrow_mut();
		match model.normalize(&stored) {
			Some(link) => {
				model.add_link(link);
			}
			None => {
				let text = stored.relation_text.unwrap_or(edit.text);
				model.update_link_text(&edit.link, &text);
			}
		}
		Ok(())
	}

	/// Delete a link the user confirmed. On failure the link stays.
	pub async fn delete_link(&self, confirmed: ConfirmedDelete) -> Result<(), CanvasError> {
		self.ensure_attached()?;
		let id = confirmed.link_id().clone();
		self.backend
			.delete_link(&id)
			.await
			.map_err(CanvasError::mutation(MutationKind::DeleteLink))?;
		self.ensure_attached()?;

		let mut model = self.model.borrow_mut();
		model.remove_link(&id);
		model.clear_selection();
		Ok(())
	}
}
