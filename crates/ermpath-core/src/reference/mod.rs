//! Immutable reference handle.
//!
//! A [`Reference`] binds a [`Location`] to the table it names. Every
//! transformation returns a new reference; reads compose the request path
//! and hand it to the client's transport.

mod column;
mod page;
mod read;


pub use column::ReferenceColumn;
pub use page::{Page, Row};
pub use read::DEFAULT_PAGE_SIZE;

use crate::{
    client::Client,
    compose::ROOT_ALIAS,
    error::Error,
    facet::{FacetPath, FacetRenderer, Facets},
    filter::FilterNode,
    location::Location,
    sort::{PageCursor, SortSpec, effective_sort},
    source::SourceDefinitions,
};
use derive_more::Display;
use ermpath_schema::node::Table;

///
/// Interface
///
/// Request API a path is issued against.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum Interface {
    #[display("aggregate")]
    Aggregate,
    #[display("attribute")]
    Attribute,
    #[display("attributegroup")]
    AttributeGroup,
    #[display("entity")]
    Entity,
}

impl Interface {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "aggregate" => Some(Self::Aggregate),
            "attribute" => Some(Self::Attribute),
            "attributegroup" => Some(Self::AttributeGroup),
            "entity" => Some(Self::Entity),
            _ => None,
        }
    }
}

///
/// Reference
///

#[derive(Clone)]
pub struct Reference<'a> {
    client: &'a Client,
    location: Location,
    table: &'a Table,
    defs: SourceDefinitions,
    sort: SortSpec,
}

impl<'a> Reference<'a> {
    /// Bind `location` to the client's catalog.
    ///
    /// Facets are rendered once to surface invalid ones here rather than at
    /// read time, and a paging cursor must match the effective sort.
    pub fn new(client: &'a Client, location: Location) -> Result<Self, Error> {
        let catalog = client.catalog();
        if location.catalog() != catalog.id() {
            return Err(Error::invalid_input(
                "Given catalog object is not the same catalog used in the url.",
            ));
        }

        let table = catalog.table(location.schema_name(), location.table_name())?;
        let defs = SourceDefinitions::for_table(table);
        let path = location.path();
        let sort = effective_sort(table, location.sort()).map_err(|err| err.with_path(&path, None))?;
        if let Some(cursor) = location.paging() {
            cursor
                .check_arity(&sort)
                .map_err(|err| err.with_path(&path, None))?;
        }

        let reference = Self {
            client,
            location,
            table,
            defs,
            sort,
        };
        reference.facet_path()?;

        Ok(reference)
    }

    ///
    /// ACCESSORS
    ///

    #[must_use]
    pub const fn client(&self) -> &'a Client {
        self.client
    }

    #[must_use]
    pub const fn location(&self) -> &Location {
        &self.location
    }

    #[must_use]
    pub const fn table(&self) -> &'a Table {
        self.table
    }

    #[must_use]
    pub const fn source_definitions(&self) -> &SourceDefinitions {
        &self.defs
    }

    /// Effective sort: the requested order completed to a total order.
    #[must_use]
    pub const fn sort_spec(&self) -> &SortSpec {
        &self.sort
    }

    #[must_use]
    pub fn displayname(&self) -> &str {
        &self.table.name
    }

    /// Service URI of this reference. The client's service is used when
    /// the location did not carry one.
    #[must_use]
    pub fn uri(&self) -> String {
        let service = self.location.service().unwrap_or(self.client.service());

        format!(
            "{service}/catalog/{}/{}/{}",
            self.location.catalog_with_snapshot(),
            self.location.api(),
            self.location.path()
        )
    }

    ///
    /// TRANSFORMATIONS
    ///

    /// Replace the filter. The most recent filter wins.
    #[must_use]
    pub fn filter(&self, filter: Option<FilterNode>) -> Self {
        self.with_location(self.location.with_filter(filter), self.sort.clone())
    }

    /// Replace the filter with a parsed filter segment.
    pub fn filter_str(&self, segment: &str) -> Result<Self, Error> {
        let node = self.client.parse_filter(segment).map_err(|err| {
            let path = format!(
                "{}/{segment}{}",
                self.location.with_filter(None).compact_path(),
                self.location.modifiers()
            );
            err.with_path(&path, Some(segment))
        })?;

        Ok(self.filter(Some(node)))
    }

    /// Sort by `requested`, completed to the effective sort. The location
    /// keeps the effective sort so cursors built from it round-trip.
    pub fn sort(&self, requested: &SortSpec) -> Result<Self, Error> {
        let sort = effective_sort(self.table, requested)
            .map_err(|err| err.with_path(&self.location.path(), None))?;

        Ok(self.with_location(self.location.with_sort(sort.clone()), sort))
    }

    /// Replace the search-box term; `None` clears it.
    pub fn search(&self, term: Option<&str>) -> Result<Self, Error> {
        self.bind(self.location.with_search(term)?)
    }

    pub fn with_facets(&self, facets: Option<Facets>) -> Result<Self, Error> {
        self.bind(self.location.with_facets(facets)?)
    }

    /// Page from `cursor`, which must match the effective sort.
    pub fn paging(&self, cursor: Option<PageCursor>) -> Result<Self, Error> {
        let location = match cursor {
            Some(cursor) => {
                cursor
                    .check_arity(&self.sort)
                    .map_err(|err| err.with_path(&self.location.path(), None))?;
                self.location
                    .with_sort(self.sort.clone())
                    .with_paging(Some(cursor))?
            }
            None => self.location.with_paging(None)?,
        };

        Ok(self.with_location(location, self.sort.clone()))
    }

    fn with_location(&self, location: Location, sort: SortSpec) -> Self {
        Self {
            client: self.client,
            location,
            table: self.table,
            defs: self.defs.clone(),
            sort,
        }
    }

    // Rebind after a facet change, rendering the new facets.
    fn bind(&self, location: Location) -> Result<Self, Error> {
        let reference = self.with_location(location, self.sort.clone());
        reference.facet_path()?;

        Ok(reference)
    }

    fn facet_path(&self) -> Result<Option<FacetPath>, Error> {
        let Some(facets) = self.location.facets() else {
            return Ok(None);
        };
        let renderer = FacetRenderer {
            catalog: self.client.catalog(),
            root: self.table,
            defs: &self.defs,
            config: self.client.config(),
            alias: ROOT_ALIAS,
        };

        renderer
            .render(facets)
            .map(Some)
            .map_err(|err| err.with_path(&self.location.path(), None))
    }
}
