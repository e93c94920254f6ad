//! Deserialization of the catalog `/schema` introspection document.

use crate::{
    SOURCE_DEFINITIONS_ANNOTATION, TABLE_DISPLAY_ANNOTATION,
    error::SchemaError,
    node::{Catalog, Column, ColumnMapping, ConstraintName, ForeignKey, Key, QualifiedTableName},
    node::{RowOrder, Table},
    types::ColumnType,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

///
/// RawCatalog
///

#[derive(Deserialize)]
struct RawCatalog {
    schemas: BTreeMap<String, RawSchema>,
}

#[derive(Deserialize)]
struct RawSchema {
    #[serde(default)]
    tables: BTreeMap<String, RawTable>,
}

#[derive(Deserialize)]
struct RawTable {
    #[serde(default)]
    column_definitions: Vec<RawColumn>,
    #[serde(default)]
    keys: Vec<RawKey>,
    #[serde(default)]
    foreign_keys: Vec<RawForeignKey>,
    #[serde(default)]
    annotations: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
struct RawColumn {
    name: String,
    #[serde(rename = "type")]
    column_type: RawType,
    #[serde(default = "default_nullok")]
    nullok: bool,
}

#[derive(Deserialize)]
struct RawType {
    typename: String,
    #[serde(default)]
    is_array: bool,
    #[serde(default)]
    base_type: Option<Box<Self>>,
}

#[derive(Deserialize)]
struct RawKey {
    unique_columns: Vec<String>,
    #[serde(default)]
    names: Vec<(String, String)>,
}

#[derive(Deserialize)]
struct RawForeignKey {
    foreign_key_columns: Vec<RawColumnRef>,
    referenced_columns: Vec<RawColumnRef>,
    #[serde(default)]
    names: Vec<(String, String)>,
}

#[derive(Deserialize)]
struct RawColumnRef {
    schema_name: String,
    table_name: String,
    column_name: String,
}

const fn default_nullok() -> bool {
    true
}

impl RawType {
    // domains resolve to their base type; arrays keep their element type
    fn resolve(&self) -> ColumnType {
        let base = self.base_type.as_ref().map(|b| b.resolve());

        if self.is_array || self.typename.ends_with("[]") {
            let element = base.unwrap_or_else(|| {
                ColumnType::from_typename(self.typename.trim_end_matches("[]"))
            });
            return ColumnType::Array(Box::new(element));
        }

        match (ColumnType::from_typename(&self.typename), base) {
            (ColumnType::Other(_), Some(base)) => base,
            (ty, _) => ty,
        }
    }
}

impl Catalog {
    /// Build a catalog from the introspection document of catalog `id`.
    pub fn from_introspection(id: impl Into<String>, document: &Value) -> Result<Self, SchemaError> {
        let raw = RawCatalog::deserialize(document)
            .map_err(|e| SchemaError::introspection(e.to_string()))?;

        let mut tables = Vec::new();
        for (schema_name, schema) in raw.schemas {
            for (table_name, table) in schema.tables {
                tables.push(load_table(&schema_name, &table_name, table)?);
            }
        }

        Ok(Self::new(id, tables))
    }
}

fn load_table(schema: &str, name: &str, raw: RawTable) -> Result<Table, SchemaError> {
    let mut table = Table::new(schema, name);

    table.columns = raw
        .column_definitions
        .iter()
        .enumerate()
        .map(|(position, c)| Column {
            name: c.name.clone(),
            column_type: c.column_type.resolve(),
            nullok: c.nullok,
            position,
        })
        .collect();

    for key in raw.keys {
        let Some(constraint) = key.names.into_iter().next() else {
            return Err(SchemaError::introspection(format!(
                "key ({}) of {schema}:{name} has no constraint name",
                key.unique_columns.join(",")
            )));
        };
        table.keys.push(Key {
            constraint: constraint.into(),
            columns: key.unique_columns,
        });
    }

    for fk in raw.foreign_keys {
        table.foreign_keys.push(load_foreign_key(schema, name, fk)?);
    }

    if let Some(display) = raw.annotations.get(TABLE_DISPLAY_ANNOTATION) {
        table.row_order = load_row_order(display);
    }
    table.source_definitions = raw.annotations.get(SOURCE_DEFINITIONS_ANNOTATION).cloned();

    Ok(table)
}

fn load_foreign_key(schema: &str, name: &str, raw: RawForeignKey) -> Result<ForeignKey, SchemaError> {
    let Some(constraint) = raw.names.into_iter().next() else {
        return Err(SchemaError::introspection(format!(
            "foreign key of {schema}:{name} has no constraint name"
        )));
    };
    let constraint = ConstraintName::from(constraint);

    if raw.foreign_key_columns.len() != raw.referenced_columns.len()
        || raw.referenced_columns.is_empty()
    {
        return Err(SchemaError::introspection(format!(
            "foreign key {constraint} has mismatched column lists"
        )));
    }

    let Some(first) = raw.referenced_columns.first() else {
        return Err(SchemaError::introspection(format!(
            "foreign key {constraint} has no referenced columns"
        )));
    };
    let referenced_table = QualifiedTableName::new(&first.schema_name, &first.table_name);

    let columns = raw
        .foreign_key_columns
        .iter()
        .zip(&raw.referenced_columns)
        .map(|(from, to)| ColumnMapping {
            from: from.column_name.clone(),
            to: to.column_name.clone(),
        })
        .collect();

    Ok(ForeignKey {
        constraint,
        table: QualifiedTableName::new(schema, name),
        columns,
        referenced_table,
    })
}

// `{"*": {"row_order": ["col", {"column": "col", "descending": true}]}}`
fn load_row_order(display: &Value) -> Vec<RowOrder> {
    let Some(entries) = display
        .get("*")
        .and_then(|ctx| ctx.get("row_order"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(column) => Some(RowOrder {
                column: column.clone(),
                descending: false,
            }),
            Value::Object(_) => RowOrder::deserialize(entry).ok(),
            _ => None,
        })
        .collect()
}
