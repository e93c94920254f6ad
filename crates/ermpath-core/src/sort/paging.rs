use crate::{encode, error::Error, sort::SortSpec};
use derive_more::Display;
use serde_json::{Map, Value};

const NULL_TOKEN: &str = "::null::";

///
/// PageDirection
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum PageDirection {
    #[display("after")]
    After,
    #[display("before")]
    Before,
}

///
/// PageCursor
///
/// Positional snapshot of effective-sort values. Values read back from a
/// path are strings (or null); values taken from rows keep their JSON type.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PageCursor {
    pub direction: PageDirection,
    pub values: Vec<Value>,
}

impl PageCursor {
    #[must_use]
    pub const fn new(direction: PageDirection, values: Vec<Value>) -> Self {
        Self { direction, values }
    }

    /// Cursor positioned at `row` under `sort`. Missing columns read as null.
    #[must_use]
    pub fn from_row(direction: PageDirection, sort: &SortSpec, row: &Map<String, Value>) -> Self {
        let values = sort
            .iter()
            .map(|key| row.get(&key.column).cloned().unwrap_or(Value::Null))
            .collect();

        Self { direction, values }
    }

    /// Parse the inside of a `@before(...)` or `@after(...)` modifier.
    pub fn parse(direction: PageDirection, inner: &str) -> Result<Self, Error> {
        if inner.is_empty() {
            return Err(Error::invalid_page(
                format!("Paging modifier @{direction}() has no values."),
                None,
            ));
        }

        let values = inner
            .split(',')
            .map(|token| {
                if token == NULL_TOKEN {
                    Ok(Value::Null)
                } else {
                    encode::decode(token).map(Value::String)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { direction, values })
    }

    #[must_use]
    pub fn to_modifier(&self) -> String {
        let values: Vec<String> = self
            .values
            .iter()
            .map(|value| match value {
                Value::Null => NULL_TOKEN.to_string(),
                Value::String(s) => encode::component(s),
                other => encode::component(&other.to_string()),
            })
            .collect();

        format!("@{}({})", self.direction, values.join(","))
    }

    /// The cursor must carry one value per sort column.
    pub fn check_arity(&self, sort: &SortSpec) -> Result<(), Error> {
        if self.values.len() == sort.len() {
            return Ok(());
        }

        Err(Error::invalid_page(
            format!(
                "sort and {} should have the same number of columns.",
                self.direction
            ),
            None,
        ))
    }
}

/// Paging needs a non-empty sort and at most one direction. Cursor arity
/// is checked against the effective sort once the table is known.
pub fn validate_paging(
    sort: &SortSpec,
    before: Option<&PageCursor>,
    after: Option<&PageCursor>,
) -> Result<(), Error> {
    if before.is_none() && after.is_none() {
        return Ok(());
    }
    if sort.is_empty() {
        return Err(Error::invalid_page(
            "Sort modifier is required with paging.",
            None,
        ));
    }
    if before.is_some() && after.is_some() {
        return Err(Error::invalid_page(
            "Paging modifiers @before and @after cannot be used together.",
            None,
        ));
    }

    Ok(())
}
