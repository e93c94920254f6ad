use serde::{Deserialize, Serialize};
use std::fmt;

///
/// ConstraintName
///
/// Catalog-wide identity of a key or foreign key, `[schema, name]` on the wire.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct ConstraintName {
    pub schema: String,
    pub name: String,
}

impl ConstraintName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ConstraintName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.schema, self.name)
    }
}

impl From<(String, String)> for ConstraintName {
    fn from((schema, name): (String, String)) -> Self {
        Self { schema, name }
    }
}

impl From<ConstraintName> for (String, String) {
    fn from(c: ConstraintName) -> Self {
        (c.schema, c.name)
    }
}

///
/// QualifiedTableName
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct QualifiedTableName {
    pub schema: String,
    pub table: String,
}

impl QualifiedTableName {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for QualifiedTableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.schema, self.table)
    }
}

///
/// Key
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Key {
    pub constraint: ConstraintName,
    pub columns: Vec<String>,
}

impl Key {
    #[must_use]
    pub fn new(constraint: ConstraintName, columns: &[&str]) -> Self {
        Self {
            constraint,
            columns: columns.iter().map(ToString::to_string).collect(),
        }
    }

    #[must_use]
    pub fn covers(&self, columns: &[&str]) -> bool {
        self.columns.iter().all(|c| columns.contains(&c.as_str()))
    }
}

///
/// ColumnMapping
///
/// One column pair of a foreign key, referencing column first.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ColumnMapping {
    pub from: String,
    pub to: String,
}

///
/// ForeignKey
///
/// `table.(from...)` references `referenced_table.(to...)`. Column pairs keep
/// the declaration order of the introspection document.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ForeignKey {
    pub constraint: ConstraintName,
    pub table: QualifiedTableName,
    pub columns: Vec<ColumnMapping>,
    pub referenced_table: QualifiedTableName,
}

impl ForeignKey {
    #[must_use]
    pub fn new(
        constraint: ConstraintName,
        table: QualifiedTableName,
        pairs: &[(&str, &str)],
        referenced_table: QualifiedTableName,
    ) -> Self {
        Self {
            constraint,
            table,
            columns: pairs
                .iter()
                .map(|(from, to)| ColumnMapping {
                    from: (*from).to_string(),
                    to: (*to).to_string(),
                })
                .collect(),
            referenced_table,
        }
    }

    /// Single-column foreign keys can be shortcut by filtering the local column.
    #[must_use]
    pub const fn is_simple(&self) -> bool {
        self.columns.len() == 1
    }

    pub fn from_columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|m| m.from.as_str())
    }

    pub fn to_columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|m| m.to.as_str())
    }
}
