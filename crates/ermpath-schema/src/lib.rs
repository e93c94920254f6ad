//! Read-only catalog metadata graph consumed by the path composer.
//!
//! ## Crate layout
//! - `error`: schema lookup errors and the route-aware `ErrorTree`.
//! - `load`: deserialization of the catalog introspection document.
//! - `node`: catalog, schema, table, column, key and foreign key nodes.
//! - `types`: column types and their comparison families.
//! - `validate`: staged structural validation over a loaded catalog.

pub mod error;
pub mod load;
pub mod node;
pub mod types;
pub mod validate;

/// Single-column key that always wins shortest-key selection.
pub const RID_COLUMN: &str = "RID";

/// Table annotation carrying the default row order.
pub const TABLE_DISPLAY_ANNOTATION: &str = "tag:isrd.isi.edu,2016:table-display";

/// Table annotation carrying named source definitions.
pub const SOURCE_DEFINITIONS_ANNOTATION: &str = "tag:isrd.isi.edu,2019:source-definitions";

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        err,
        error::{ErrorTree, SchemaError},
        node::*,
        types::{ColumnFamily, ColumnType},
    };
    pub use serde::{Deserialize, Serialize};
}
