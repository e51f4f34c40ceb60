//! The knowledge-base backend as seen by the canvas.

mod http;
pub mod wire;

use log::{info, warn};

pub use http::HttpBackend;
pub use wire::{CollectionDocuments, CollectionSummary, DocumentSummary, EndpointRef, RawId, RawLink, SavedPosition};

use crate::components::doc_canvas::{Actor, DocumentId, LinkDraft, LinkId};
use crate::error::{ApiError, CanvasError};

/// Backend operations the canvas consumes.
///
/// Everything except [`Backend::create_link`] is idempotent; callers never retry
/// `create_link` on an ambiguous failure.
#[allow(async_fn_in_trait)]
pub trait Backend {
	async fn fetch_collection_documents(&self, collection_id: &str) -> Result<CollectionDocuments, ApiError>;

	async fn fetch_links(&self, collection_id: &str) -> Result<Vec<RawLink>, ApiError>;

	async fn fetch_positions(&self, collection_id: &str) -> Result<Vec<SavedPosition>, ApiError>;

	/// The signed-in identity, used to gate link edits.
	async fn fetch_session(&self) -> Result<Actor, ApiError>;

	async fn save_position(
		&self,
		collection_id: &str,
		document_id: &DocumentId,
		x: f64,
		y: f64,
	) -> Result<(), ApiError>;

	async fn create_link(
		&self,
		collection_id: &str,
		draft: &LinkDraft,
		relation_text: &str,
	) -> Result<RawLink, ApiError>;

	async fn update_link_text(&self, link_id: &LinkId, relation_text: &str) -> Result<RawLink, ApiError>;

	async fn delete_link(&self, link_id: &LinkId) -> Result<(), ApiError>;
}

/// Everything the canvas needs to open one collection.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedCanvas {
	pub collection_id: String,
	pub collection: CollectionSummary,
	pub documents: Vec<DocumentSummary>,
	pub links: Vec<RawLink>,
	pub positions: Vec<SavedPosition>,
	pub actor: Actor,
}

/// Fetch a collection for display.
///
/// Only the document fetch is fatal. Links, positions and the session degrade to
/// empty values so the canvas still shows its nodes.
pub async fn load_canvas<B: Backend>(backend: &B, collection_id: &str) -> Result<LoadedCanvas, CanvasError> {
	let CollectionDocuments {
		collection,
		documents,
	} = backend
		.fetch_collection_documents(collection_id)
		.await
		.map_err(|source| CanvasError::Load {
			collection: collection_id.to_owned(),
			source,
		})?;

	let links = backend.fetch_links(collection_id).await.unwrap_or_else(|e| {
		warn!("links for collection {collection_id} unavailable, rendering without connections: {e}");
		Vec::new()
	});
	let positions = backend.fetch_positions(collection_id).await.unwrap_or_else(|e| {
		warn!("positions for collection {collection_id} unavailable, using grid placement: {e}");
		Vec::new()
	});
	let actor = backend.fetch_session().await.unwrap_or_else(|e| {
		warn!("session unavailable, link edits disabled: {e}");
		Actor::default()
	});

	info!(
		"loaded collection {collection_id}: {} documents, {} links, {} saved positions",
		documents.len(),
		links.len(),
		positions.len()
	);

	Ok(LoadedCanvas {
		collection_id: collection_id.to_owned(),
		collection,
		documents,
		links,
		positions,
		actor,
	})
}
