//! ## Crate layout
//! - `core`: locators, filters, facets, path composition, sort and paging,
//!   references and data paths.
//! - `schema`: the read-only catalog metadata graph they are composed over.
//!
//! [`connect`] loads and validates a catalog introspection document and
//! opens a [`core::client::Client`] on it.

pub use ermpath_core as core;
pub use ermpath_schema as schema;

use ermpath_core::{client::Client, config::Config, transport::Transport};
use ermpath_schema::node::Catalog;
use serde_json::Value;
use std::sync::Arc;


//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use ermpath_core::Error;

/// Load catalog `id` from its introspection `document`, validate it, and
/// open a client on `service`.
pub fn connect(
    service: impl Into<String>,
    id: impl Into<String>,
    document: &Value,
    transport: Arc<dyn Transport>,
    config: Config,
) -> Result<Client, Error> {
    let catalog = Catalog::from_introspection(id, document)?;
    ermpath_schema::validate::validate(&catalog)?;

    Client::new(service, catalog, transport, config)
}

///
/// Prelude
///

pub mod prelude {
    pub use crate::connect;
    pub use ermpath_core::prelude::*;
    pub use ermpath_schema::node::{Catalog, ConstraintName, QualifiedTableName, Table};
}
