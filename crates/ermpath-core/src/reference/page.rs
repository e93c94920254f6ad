use crate::{
    error::Error,
    reference::Reference,
    sort::{PageCursor, PageDirection},
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

///
/// Row
///
/// One root row. `linked` holds the row each foreign-key column points
/// at, keyed by the column's display name; null when there is none.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    pub data: Map<String, Value>,
    pub linked: BTreeMap<String, Value>,
}

///
/// Page
///

#[derive(Clone)]
pub struct Page<'a> {
    pub(super) reference: Reference<'a>,
    pub rows: Vec<Row>,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<'a> Page<'a> {
    #[must_use]
    pub const fn reference(&self) -> &Reference<'a> {
        &self.reference
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Reference to the page after this one, paged `@after` the last row.
    pub fn next(&self) -> Result<Option<Reference<'a>>, Error> {
        match self.rows.last() {
            Some(row) if self.has_next => self.paged(PageDirection::After, row).map(Some),
            _ => Ok(None),
        }
    }

    /// Reference to the page before this one, paged `@before` the first row.
    pub fn previous(&self) -> Result<Option<Reference<'a>>, Error> {
        match self.rows.first() {
            Some(row) if self.has_previous => self.paged(PageDirection::Before, row).map(Some),
            _ => Ok(None),
        }
    }

    fn paged(&self, direction: PageDirection, row: &Row) -> Result<Reference<'a>, Error> {
        let cursor = PageCursor::from_row(direction, self.reference.sort_spec(), &row.data);

        self.reference.paging(Some(cursor))
    }
}
