//! Content schema: the serde types story documents deserialize into.

pub mod content;
pub mod custom;
pub mod element;
pub mod event;
pub mod ordered;
pub mod resource;
pub mod settings;
pub mod story;
pub mod value;

pub use content::{ContentError, DocumentKind, Format, GameContent};
pub use event::{GameEvent, Mutation, MutationTarget, Operation};
pub use value::{Expression, Value};
