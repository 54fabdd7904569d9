//! Validated graph structure.
//!
//! The [`GraphModel`] is the first stage of the pipeline: it validates the
//! architecture records and exposes the traversal queries the layout engine
//! needs. It is immutable once built.

mod graph_base;
mod model;

pub use graph_base::EdgeIndex;
pub use model::{Component, GraphModel, Group, ModelToken, Relationship, ValidationError};
