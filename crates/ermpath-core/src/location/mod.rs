//! Structured resource locator.
//!
//! A [`Location`] names a catalog, a root table and everything that narrows
//! or orders it: filter, facets, sort and paging. Every mutator returns a
//! new value.

mod parse;

#[cfg(test)]
mod tests;

use crate::{
    encode,
    error::Error,
    facet::{Facets, encode_facets},
    filter::FilterNode,
    reference::Interface,
    sort::{PageCursor, SortSpec, validate_paging},
};

pub(crate) use parse::FACETS_PREFIX;

/// Facet parsing error for a path with two facet segments.
pub const DUPLICATE_FACETS: &str = "Cannot define two different sets of facets";

///
/// Location
///

#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    service: Option<String>,
    catalog: String,
    snapshot: Option<String>,
    api: Interface,
    schema_name: Option<String>,
    table_name: String,
    filter: Option<FilterNode>,
    facets: Option<Facets>,
    facet_blob: Option<String>,
    sort: SortSpec,
    paging: Option<PageCursor>,
    query: Option<String>,
}

impl Location {
    /// Location of a bare table.
    pub fn new(
        catalog: impl Into<String>,
        schema_name: Option<&str>,
        table_name: impl Into<String>,
    ) -> Self {
        Self {
            service: None,
            catalog: catalog.into(),
            snapshot: None,
            api: Interface::Entity,
            schema_name: schema_name.map(ToString::to_string),
            table_name: table_name.into(),
            filter: None,
            facets: None,
            facet_blob: None,
            sort: SortSpec::default(),
            paging: None,
            query: None,
        }
    }

    ///
    /// ACCESSORS
    ///

    #[must_use]
    pub fn service(&self) -> Option<&str> {
        self.service.as_deref()
    }

    #[must_use]
    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<&str> {
        self.snapshot.as_deref()
    }

    #[must_use]
    pub const fn api(&self) -> Interface {
        self.api
    }

    #[must_use]
    pub fn schema_name(&self) -> Option<&str> {
        self.schema_name.as_deref()
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    #[must_use]
    pub const fn filter(&self) -> Option<&FilterNode> {
        self.filter.as_ref()
    }

    #[must_use]
    pub const fn facets(&self) -> Option<&Facets> {
        self.facets.as_ref()
    }

    #[must_use]
    pub fn facet_blob(&self) -> Option<&str> {
        self.facet_blob.as_deref()
    }

    #[must_use]
    pub const fn sort(&self) -> &SortSpec {
        &self.sort
    }

    #[must_use]
    pub const fn paging(&self) -> Option<&PageCursor> {
        self.paging.as_ref()
    }

    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// The search-box term carried by the facets.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.facets.as_ref()?.search_term()
    }

    ///
    /// MUTATORS
    ///

    /// Replace the filter. Paging is dropped.
    #[must_use]
    pub fn with_filter(&self, filter: Option<FilterNode>) -> Self {
        Self {
            filter,
            paging: None,
            ..self.clone()
        }
    }

    /// Replace the facets. Paging is dropped; an empty set clears them.
    pub fn with_facets(&self, facets: Option<Facets>) -> Result<Self, Error> {
        let facets = facets.filter(|f| !f.is_empty());
        let facet_blob = facets.as_ref().map(encode_facets).transpose()?;

        Ok(Self {
            facets,
            facet_blob,
            paging: None,
            ..self.clone()
        })
    }

    /// Replace the search-box term, keeping every other facet.
    pub fn with_search(&self, term: Option<&str>) -> Result<Self, Error> {
        let facets = self.facets.clone().unwrap_or_default();

        self.with_facets(Some(facets.with_search_term(term)))
    }

    /// Replace the sort. Cursors of the previous sort are dropped.
    #[must_use]
    pub fn with_sort(&self, sort: SortSpec) -> Self {
        Self {
            sort,
            paging: None,
            ..self.clone()
        }
    }

    /// Replace the paging cursor, which must fit the current sort.
    pub fn with_paging(&self, paging: Option<PageCursor>) -> Result<Self, Error> {
        let (before, after) = split_paging(paging.as_ref());
        validate_paging(&self.sort, before, after).map_err(|err| err.with_path(&self.path(), None))?;

        Ok(Self {
            paging,
            ..self.clone()
        })
    }

    #[must_use]
    pub fn with_api(&self, api: Interface) -> Self {
        Self {
            api,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_service(&self, service: impl Into<String>) -> Self {
        Self {
            service: Some(service.into()),
            ..self.clone()
        }
    }

    ///
    /// SERIALIZATION
    ///

    /// `[schema:]table[/*::facets::blob][/filter]`
    #[must_use]
    pub fn compact_path(&self) -> String {
        let mut path = String::new();
        if let Some(schema) = &self.schema_name {
            path.push_str(&encode::component(schema));
            path.push(':');
        }
        path.push_str(&encode::component(&self.table_name));

        if let Some(blob) = &self.facet_blob {
            path.push('/');
            path.push_str(FACETS_PREFIX);
            path.push_str(blob);
        }
        if let Some(filter) = &self.filter {
            path.push('/');
            path.push_str(&filter.to_uri());
        }

        path
    }

    /// Compact path plus the sort and paging modifiers.
    #[must_use]
    pub fn path(&self) -> String {
        let mut path = self.compact_path();
        path.push_str(&self.modifiers());

        path
    }

    #[must_use]
    pub fn modifiers(&self) -> String {
        let mut modifiers = self.sort.to_modifier();
        if let Some(paging) = &self.paging {
            modifiers.push_str(&paging.to_modifier());
        }

        modifiers
    }

    /// `<service>/catalog/<id>[@snapshot]/<api>/<path>[?query]`
    #[must_use]
    pub fn uri(&self) -> String {
        let mut uri = format!(
            "{}/catalog/{}/{}/{}",
            self.service.as_deref().unwrap_or_default(),
            self.catalog_with_snapshot(),
            self.api,
            self.path()
        );
        if let Some(query) = &self.query {
            uri.push('?');
            uri.push_str(query);
        }

        uri
    }

    #[must_use]
    pub fn catalog_with_snapshot(&self) -> String {
        match &self.snapshot {
            Some(snapshot) => format!("{}@{snapshot}", self.catalog),
            None => self.catalog.clone(),
        }
    }
}

fn split_paging(paging: Option<&PageCursor>) -> (Option<&PageCursor>, Option<&PageCursor>) {
    use crate::sort::PageDirection;

    match paging {
        Some(cursor) if cursor.direction == PageDirection::Before => (Some(cursor), None),
        Some(cursor) => (None, Some(cursor)),
        None => (None, None),
    }
}
