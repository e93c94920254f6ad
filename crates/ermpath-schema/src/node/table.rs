use crate::{
    RID_COLUMN,
    error::SchemaError,
    node::{Column, ConstraintName, ForeignKey, Key, QualifiedTableName},
    types::ColumnType,
};
use serde::{Deserialize, Serialize};

///
/// RowOrder
///
/// One entry of a table's default row order.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RowOrder {
    pub column: String,
    #[serde(default)]
    pub descending: bool,
}

///
/// Table
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Table {
    pub schema_name: String,
    pub name: String,
    pub columns: Vec<Column>,
    pub keys: Vec<Key>,
    pub foreign_keys: Vec<ForeignKey>,
    pub row_order: Vec<RowOrder>,

    /// Raw source-definitions annotation, resolved by the core crate.
    pub source_definitions: Option<serde_json::Value>,
}

impl Table {
    pub fn new(schema_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            name: name.into(),
            columns: Vec::new(),
            keys: Vec::new(),
            foreign_keys: Vec::new(),
            row_order: Vec::new(),
            source_definitions: None,
        }
    }

    #[must_use]
    pub fn with_column(mut self, name: &str, column_type: ColumnType, nullok: bool) -> Self {
        let mut column = Column::new(name, column_type, nullok);
        column.position = self.columns.len();
        self.columns.push(column);

        self
    }

    #[must_use]
    pub fn with_key(mut self, constraint: &str, columns: &[&str]) -> Self {
        let constraint = ConstraintName::new(self.schema_name.clone(), constraint);
        self.keys.push(Key::new(constraint, columns));

        self
    }

    /// Add a foreign key from this table to `referenced` (`schema:table`).
    #[must_use]
    pub fn with_foreign_key(
        mut self,
        constraint: &str,
        pairs: &[(&str, &str)],
        referenced: (&str, &str),
    ) -> Self {
        let fk = ForeignKey::new(
            ConstraintName::new(self.schema_name.clone(), constraint),
            self.qualified_name(),
            pairs,
            QualifiedTableName::new(referenced.0, referenced.1),
        );
        self.foreign_keys.push(fk);

        self
    }

    #[must_use]
    pub fn with_row_order(mut self, order: &[(&str, bool)]) -> Self {
        self.row_order = order
            .iter()
            .map(|(column, descending)| RowOrder {
                column: (*column).to_string(),
                descending: *descending,
            })
            .collect();

        self
    }

    #[must_use]
    pub fn with_source_definitions(mut self, annotation: serde_json::Value) -> Self {
        self.source_definitions = Some(annotation);

        self
    }

    #[must_use]
    pub fn qualified_name(&self) -> QualifiedTableName {
        QualifiedTableName::new(self.schema_name.clone(), self.name.clone())
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn try_column(&self, name: &str) -> Result<&Column, SchemaError> {
        self.column(name)
            .ok_or_else(|| SchemaError::column_not_found(self.qualified_name().to_string(), name))
    }

    #[must_use]
    pub fn outbound_foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    /// Whether every column of the key is declared not-null.
    #[must_use]
    pub fn key_is_not_null(&self, key: &Key) -> bool {
        key.columns
            .iter()
            .all(|name| self.column(name).is_some_and(|c| !c.nullok))
    }

    /// The minimal key used as the mandatory ordering tie-breaker.
    ///
    /// Not-null keys are preferred; a single `RID` column wins outright,
    /// otherwise fewer columns, then all integer/serial columns, then lower
    /// column positions. Tables without keys fall back to every sortable
    /// column.
    #[must_use]
    pub fn shortest_key(&self) -> Vec<&Column> {
        let not_null: Vec<&Key> = self
            .keys
            .iter()
            .filter(|key| self.key_is_not_null(key))
            .collect();
        let candidates: Vec<&Key> = if not_null.is_empty() {
            self.keys.iter().collect()
        } else {
            not_null
        };

        if candidates.is_empty() {
            return self.columns.iter().filter(|c| c.is_sortable()).collect();
        }

        if let Some(rid) = candidates
            .iter()
            .find(|key| key.columns.len() == 1 && key.columns[0].eq_ignore_ascii_case(RID_COLUMN))
        {
            return self.key_columns(rid);
        }

        let mut ranked: Vec<(&Key, usize, bool, Vec<usize>)> = candidates
            .into_iter()
            .map(|key| {
                let columns = self.key_columns(key);
                let all_int = columns.iter().all(|c| c.column_type.is_integer_like());
                let mut positions: Vec<usize> = columns.iter().map(|c| c.position).collect();
                positions.sort_unstable();

                (key, key.columns.len(), all_int, positions)
            })
            .collect();

        // stable sort keeps declaration order as the last tie-break
        ranked.sort_by(|a, b| {
            a.1.cmp(&b.1)
                .then_with(|| b.2.cmp(&a.2))
                .then_with(|| a.3.cmp(&b.3))
        });

        ranked
            .first()
            .map(|(key, ..)| self.key_columns(key))
            .unwrap_or_default()
    }

    fn key_columns(&self, key: &Key) -> Vec<&Column> {
        key.columns
            .iter()
            .filter_map(|name| self.column(name))
            .collect()
    }
}
