//! Sort and paging engine.
//!
//! A requested sort is normalized into a total order by appending the
//! table's shortest key; paging cursors are positional snapshots of that
//! effective order.

mod compare;
mod paging;

#[cfg(test)]
mod tests;

use crate::{encode, error::Error};
use derive_more::Deref;
use ermpath_schema::node::Table;
use std::fmt;

pub use compare::compare_rows;
pub use paging::{PageCursor, PageDirection, validate_paging};

const DESC_SUFFIX: &str = "::desc::";

///
/// SortKey
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SortKey {
    pub column: String,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }

    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            column: self.column.clone(),
            descending: !self.descending,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode::component(&self.column))?;
        if self.descending {
            f.write_str(DESC_SUFFIX)?;
        }

        Ok(())
    }
}

///
/// SortSpec
///
/// Ordered sort keys. An empty spec means "no explicit sort".
///

#[derive(Clone, Debug, Default, Deref, Eq, Hash, PartialEq)]
pub struct SortSpec(Vec<SortKey>);

impl SortSpec {
    #[must_use]
    pub const fn new(keys: Vec<SortKey>) -> Self {
        Self(keys)
    }

    /// Parse the inside of a `@sort(...)` modifier.
    pub fn parse(inner: &str) -> Result<Self, Error> {
        if inner.is_empty() {
            return Ok(Self::default());
        }

        inner
            .split(',')
            .map(|token| {
                let (column, descending) = match token.strip_suffix(DESC_SUFFIX) {
                    Some(column) => (column, true),
                    None => (token, false),
                };
                if column.is_empty() || column.contains("::") {
                    return Err(Error::invalid_sort(
                        format!("Invalid sort modifier `{inner}`."),
                        None,
                    ));
                }

                Ok(SortKey {
                    column: encode::decode(column)?,
                    descending,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// `@sort(...)`, or nothing for an empty spec.
    #[must_use]
    pub fn to_modifier(&self) -> String {
        if self.0.is_empty() {
            return String::new();
        }
        let keys: Vec<String> = self.0.iter().map(ToString::to_string).collect();

        format!("@sort({})", keys.join(","))
    }

    /// Same columns with every direction flipped.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self(self.0.iter().map(SortKey::reversed).collect())
    }

    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.0.iter().any(|key| key.column == column)
    }

    #[must_use]
    pub fn into_keys(self) -> Vec<SortKey> {
        self.0
    }
}

impl FromIterator<SortKey> for SortSpec {
    fn from_iter<I: IntoIterator<Item = SortKey>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Normalize `requested` into a total order over `table`.
///
/// Unknown and non-sortable columns are rejected, repeated columns keep
/// their first occurrence, and missing shortest-key columns are appended
/// ascending. An empty request starts from the table's row order.
pub fn effective_sort(table: &Table, requested: &SortSpec) -> Result<SortSpec, Error> {
    let start: Vec<SortKey> = if requested.is_empty() {
        table
            .row_order
            .iter()
            .filter(|order| table.column(&order.column).is_some_and(|c| c.is_sortable()))
            .map(|order| SortKey {
                column: order.column.clone(),
                descending: order.descending,
            })
            .collect()
    } else {
        requested.0.clone()
    };

    let mut effective = SortSpec::default();
    for key in start {
        let Some(column) = table.column(&key.column) else {
            return Err(Error::invalid_sort(
                format!("Given column name `{}` in sort is not valid.", key.column),
                None,
            ));
        };
        if !column.is_sortable() {
            return Err(Error::invalid_sort(
                format!("Column {} is not sortable.", key.column),
                None,
            ));
        }
        if !effective.contains(&key.column) {
            effective.0.push(key);
        }
    }

    for column in table.shortest_key() {
        if !effective.contains(&column.name) {
            effective.0.push(SortKey::asc(column.name.as_str()));
        }
    }

    Ok(effective)
}
