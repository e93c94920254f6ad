//! Source objects: plain columns, foreign-key paths and named sources.
//!
//! Raw JSON is parsed into [`SourceSpec`], named definitions are checked
//! for cycles once per table, and [`resolve`] expands indirection into a
//! flat hop list before the alias composer sees it.

mod definitions;
mod model;
mod resolve;


pub use definitions::{SEARCH_BOX, SourceDefinitions};
pub use model::{Aggregate, Direction, Hop, NamedSourceRef, PathRef, Source, SourceSpec, link};
pub use resolve::{ResolvedHop, ResolvedSource, resolve};
