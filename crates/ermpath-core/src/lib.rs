//! Core of the ermpath client: locator parsing, the filter and facet
//! grammar, join-path composition, sort and paging, and the reference and
//! data-path builders that turn them into request paths.
//!
//! Parsing and composition are pure. I/O happens only at the
//! [`transport::Transport`] seam.

// public exports are one module level down
pub mod cache;
pub mod client;
pub mod compose;
pub mod config;
pub mod datapath;
pub mod encode;
pub mod error;
pub mod facet;
pub mod filter;
pub mod location;
pub mod obs;
pub mod reference;
pub mod search;
pub mod sort;
pub mod source;
pub mod transport;

// test
#[cfg(test)]
pub(crate) mod test_support;

pub use error::Error;

///
/// Prelude
///
/// Prelude contains the handles and value types callers build requests
/// with. Composer internals and caches stay in their modules.
///

pub mod prelude {
    pub use crate::{
        client::Client,
        config::Config,
        datapath::DataPath,
        error::{Error, ErrorStatus},
        facet::{FacetRange, FacetTerm, Facets},
        filter::{ColumnRef, FilterNode, Operator},
        location::Location,
        reference::{Interface, Page, Reference, ReferenceColumn, Row},
        sort::{PageCursor, PageDirection, SortKey, SortSpec},
        source::{Aggregate, Hop, SourceSpec},
        transport::{Method, Request, Response, Transport},
    };
}
