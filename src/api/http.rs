use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use super::Backend;
use super::wire::{
	CollectionDocuments, CreateLinkBody, ErrorBody, PositionBody, RawLink, SavedPosition, UpdateLinkBody,
};
use crate::components::doc_canvas::{Actor, DocumentId, LinkDraft, LinkId};
use crate::error::ApiError;

/// [`Backend`] over the knowledge-base REST API. Uses `fetch` in the browser.
#[derive(Clone, Debug)]
pub struct HttpBackend {
	client: Client,
	base: String,
}

impl HttpBackend {
	/// `base` must be an absolute URL such as `https://kb.example/api`.
	pub fn new(base: impl Into<String>) -> Self {
		Self {
			client: Client::new(),
			base: base.into(),
		}
	}

	fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
		let mut url =
			Url::parse(&self.base).map_err(|e| ApiError::Transport(format!("invalid api base {}: {e}", self.base)))?;
		url.path_segments_mut()
			.map_err(|()| ApiError::Transport(format!("api base {} cannot take a path", self.base)))?
			.pop_if_empty()
			.extend(segments);
		Ok(url)
	}

	async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
		let response = checked(request.send().await?).await?;
		response.json::<T>().await.map_err(|e| ApiError::Decode(e.to_string()))
	}

	async fn empty(&self, request: RequestBuilder) -> Result<(), ApiError> {
		checked(request.send().await?).await.map(drop)
	}
}

async fn checked(response: Response) -> Result<Response, ApiError> {
	let status = response.status();
	if status.is_success() {
		return Ok(response);
	}
	let message = response.json::<ErrorBody>().await.ok().and_then(ErrorBody::into_message);
	Err(ApiError::Status {
		status: status.as_u16(),
		message,
	})
}

impl Backend for HttpBackend {
	async fn fetch_collection_documents(&self, collection_id: &str) -> Result<CollectionDocuments, ApiError> {
		let url = self.url(&["collections", collection_id])?;
		self.json(self.client.get(url)).await
	}

	async fn fetch_links(&self, collection_id: &str) -> Result<Vec<RawLink>, ApiError> {
		let url = self.url(&["collections", collection_id, "links"])?;
		self.json(self.client.get(url)).await
	}

	async fn fetch_positions(&self, collection_id: &str) -> Result<Vec<SavedPosition>, ApiError> {
		let url = self.url(&["collections", collection_id, "positions"])?;
		self.json(self.client.get(url)).await
	}

	async fn fetch_session(&self) -> Result<Actor, ApiError> {
		let url = self.url(&["session"])?;
		self.json(self.client.get(url)).await
	}

	async fn save_position(
		&self,
		collection_id: &str,
		document_id: &DocumentId,
		x: f64,
		y: f64,
	) -> Result<(), ApiError> {
		let url = self.url(&["collections", collection_id, "positions", document_id.as_str()])?;
		self.empty(self.client.put(url).json(&PositionBody { x, y })).await
	}

	async fn create_link(
		&self,
		collection_id: &str,
		draft: &LinkDraft,
		relation_text: &str,
	) -> Result<RawLink, ApiError> {
		let url = self.url(&["collections", collection_id, "links"])?;
		let body = CreateLinkBody {
			source_document_id: draft.source.as_str(),
			target_document_id: draft.target.as_str(),
			source_side: draft.source_side,
			target_side: draft.target_side,
			relation_text,
		};
		self.json(self.client.post(url).json(&body)).await
	}

	async fn update_link_text(&self, link_id: &LinkId, relation_text: &str) -> Result<RawLink, ApiError> {
		let url = self.url(&["links", link_id.as_str()])?;
		self.json(self.client.patch(url).json(&UpdateLinkBody { relation_text }))
			.await
	}

	async fn delete_link(&self, link_id: &LinkId) -> Result<(), ApiError> {
		let url = self.url(&["links", link_id.as_str()])?;
		self.empty(self.client.delete(url)).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn urls_are_joined_and_escaped() {
		let backend = HttpBackend::new("https://kb.example/api/");
		let url = backend.url(&["collections", "c 1", "positions", "d/2"]).unwrap();
		assert_eq!(url.as_str(), "https://kb.example/api/collections/c%201/positions/d%2F2");
	}

	#[test]
	fn relative_base_is_rejected() {
		let backend = HttpBackend::new("/api");
		assert!(matches!(backend.url(&["session"]), Err(ApiError::Transport(_))));
	}
}
