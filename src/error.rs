//! Error types for the canvas and its backend collaborator.

use thiserror::Error;

use crate::components::doc_canvas::LinkId;

/// Failure talking to the knowledge-base backend.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
	/// The request never produced a response.
	#[error("request failed: {0}")]
	Transport(String),

	/// The backend answered with a non-success status.
	#[error("backend returned {status}{}", message_suffix(.message))]
	Status {
		status: u16,
		message: Option<String>,
	},

	/// The response body did not have the expected shape.
	#[error("unexpected response body: {0}")]
	Decode(String),
}

fn message_suffix(message: &Option<String>) -> String {
	message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

impl ApiError {
	/// The human-readable message the server attached, if any.
	pub fn server_message(&self) -> Option<&str> {
		match self {
			ApiError::Status {
				message: Some(m), ..
			} => Some(m),
			_ => None,
		}
	}
}

impl From<reqwest::Error> for ApiError {
	fn from(err: reqwest::Error) -> Self {
		if err.is_decode() {
			ApiError::Decode(err.to_string())
		} else {
			ApiError::Transport(err.to_string())
		}
	}
}

/// The user action a mutation failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
	CreateLink,
	UpdateLinkText,
	DeleteLink,
}

impl MutationKind {
	fn generic_message(self) -> &'static str {
		match self {
			MutationKind::CreateLink => "Could not create the link. Please try again.",
			MutationKind::UpdateLinkText => "Could not save the relation text. Please try again.",
			MutationKind::DeleteLink => "Could not delete the link. Please try again.",
		}
	}
}

/// Errors surfaced by the canvas.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CanvasError {
	/// The collection or its documents could not be fetched. Fatal to the view.
	#[error("failed to load collection {collection}: {source}")]
	Load {
		collection: String,
		#[source]
		source: ApiError,
	},

	#[error("{kind:?} failed: {source}")]
	Mutation {
		kind: MutationKind,
		#[source]
		source: ApiError,
	},

	/// The actor is neither an org admin nor the link's author.
	#[error("not authorized to change link {0}")]
	NotAuthorized(LinkId),

	#[error("link {0} is not on the canvas")]
	UnknownLink(LinkId),

	/// The canvas was unmounted before the response arrived.
	#[error("canvas is no longer mounted")]
	Detached,
}

impl CanvasError {
	pub fn mutation(kind: MutationKind) -> impl FnOnce(ApiError) -> CanvasError {
		move |source| CanvasError::Mutation { kind, source }
	}

	/// Text for the inline, dismissible error banner.
	pub fn user_message(&self) -> String {
		match self {
			CanvasError::Load { source, .. } => match source.server_message() {
				Some(m) => format!("Could not load this collection: {m}"),
				None => "Could not load this collection.".to_owned(),
			},
			CanvasError::Mutation { kind, source } => source
				.server_message()
				.map(str::to_owned)
				.unwrap_or_else(|| kind.generic_message().to_owned()),
			CanvasError::NotAuthorized(_) => {
				"Only the link's author or an organization admin can change this link.".to_owned()
			}
			CanvasError::UnknownLink(_) => "That link no longer exists.".to_owned(),
			CanvasError::Detached => String::new(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn server_message_wins_over_generic() {
		let err = CanvasError::Mutation {
			kind: MutationKind::CreateLink,
			source: ApiError::Status {
				status: 409,
				message: Some("These documents are already linked that way".into()),
			},
		};
		assert_eq!(err.user_message(), "These documents are already linked that way");
	}

	#[test]
	fn generic_message_without_server_text() {
		let err = CanvasError::mutation(MutationKind::DeleteLink)(ApiError::Transport("offline".into()));
		assert_eq!(err.user_message(), "Could not delete the link. Please try again.");
	}

	#[test]
	fn status_display_includes_message() {
		let err = ApiError::Status {
			status: 404,
			message: Some("Link not found".into()),
		};
		assert_eq!(err.to_string(), "backend returned 404: Link not found");
		let err = ApiError::Status {
			status: 500,
			message: None,
		};
		assert_eq!(err.to_string(), "backend returned 500");
	}
}
