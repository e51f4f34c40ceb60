//! Canvas of document nodes joined by side-anchored, annotated links.

mod component;
pub mod geometry;
pub mod interaction;
pub mod model;
mod render;
pub mod scene;
pub mod sync;
mod types;

pub use component::DocCanvas;
pub use geometry::{CurvePath, NodeSize};
pub use interaction::{Commit, ConfirmedDelete, GestureCapture, HitTarget, InteractionController, InteractionState, TextEdit};
pub use model::{GraphModel, Selection};
pub use render::ViewTransform;
pub use sync::{DetachHandle, PersistenceSync, PositionWrite};
pub use types::{Actor, DocumentId, DocumentNode, Link, LinkDraft, LinkId, Point, Side};
