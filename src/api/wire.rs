//! JSON shapes exchanged with the knowledge-base backend.
//!
//! The backend populates relations inconsistently: an identifier may be a string or a
//! number, spelled `id` or `_id`, and a link endpoint may be an embedded document or a
//! bare id. Everything here accepts every form; [`RawId::canonical`] and
//! [`EndpointRef::id`] are the only places that collapse them.

use serde::{Deserialize, Serialize};

use crate::components::doc_canvas::{DocumentId, Side};

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawId {
	Text(String),
	Number(i64),
}

impl RawId {
	pub fn canonical(&self) -> String {
		match self {
			RawId::Text(s) => s.clone(),
			RawId::Number(n) => n.to_string(),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
	#[serde(alias = "_id")]
	pub id: RawId,
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub short_hash: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
	#[serde(alias = "_id")]
	pub id: RawId,
	#[serde(default)]
	pub name: String,
}

/// Response of `GET /collections/{id}`.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct CollectionDocuments {
	pub collection: CollectionSummary,
	#[serde(default)]
	pub documents: Vec<DocumentSummary>,
}

/// A link endpoint, either populated or a bare reference.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum EndpointRef {
	Id(RawId),
	Document(DocumentSummary),
}

impl EndpointRef {
	pub fn id(&self) -> DocumentId {
		match self {
			EndpointRef::Id(id) => DocumentId::new(id.canonical()),
			EndpointRef::Document(doc) => DocumentId::new(doc.id.canonical()),
		}
	}

	pub fn is_populated(&self) -> bool {
		matches!(self, EndpointRef::Document(_))
	}
}

/// Author reference on a link: a bare user id or an embedded user object.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum UserRef {
	Id(RawId),
	User {
		#[serde(alias = "_id")]
		id: RawId,
	},
}

impl UserRef {
	pub fn id(&self) -> String {
		match self {
			UserRef::Id(id) | UserRef::User { id } => id.canonical(),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLink {
	#[serde(default, alias = "_id")]
	pub id: Option<RawId>,
	#[serde(alias = "source")]
	pub source_document: EndpointRef,
	#[serde(alias = "target")]
	pub target_document: EndpointRef,
	pub source_side: Side,
	pub target_side: Side,
	#[serde(default)]
	pub relation_text: Option<String>,
	#[serde(default)]
	pub created_by: Option<UserRef>,
}

impl RawLink {
	/// Whether a create response can be merged without re-fetching the link list.
	pub fn is_fully_resolved(&self) -> bool {
		self.id.is_some() && self.source_document.is_populated() && self.target_document.is_populated()
	}
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPosition {
	#[serde(alias = "document")]
	pub document_id: RawId,
	pub x: f64,
	pub y: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct PositionBody {
	pub x: f64,
	pub y: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateLinkBody<'a> {
	pub source_document_id: &'a str,
	pub target_document_id: &'a str,
	pub source_side: Side,
	pub target_side: Side,
	pub relation_text: &'a str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateLinkBody<'a> {
	pub relation_text: &'a str,
}

/// Error payload some endpoints return alongside a non-2xx status.
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
	#[serde(default)]
	pub message: Option<String>,
	#[serde(default)]
	pub error: Option<String>,
}

impl ErrorBody {
	pub fn into_message(self) -> Option<String> {
		self.message.or(self.error).filter(|m| !m.trim().is_empty())
	}
}
