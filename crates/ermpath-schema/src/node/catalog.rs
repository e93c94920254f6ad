use crate::{
    error::SchemaError,
    node::{ConstraintName, ForeignKey, QualifiedTableName, Table},
};
use std::collections::{BTreeMap, BTreeSet};

///
/// Catalog
///
/// Immutable metadata graph for one catalog. The foreign-key constraint
/// index is built once at construction and owned by the catalog.
///

#[derive(Clone, Debug)]
pub struct Catalog {
    id: String,
    tables: BTreeMap<QualifiedTableName, Table>,
    constraints: BTreeMap<ConstraintName, (QualifiedTableName, usize)>,
}

impl Catalog {
    pub fn new(id: impl Into<String>, tables: impl IntoIterator<Item = Table>) -> Self {
        let tables: BTreeMap<_, _> = tables
            .into_iter()
            .map(|table| (table.qualified_name(), table))
            .collect();

        // first declaration wins; duplicates are reported by validation
        let mut constraints = BTreeMap::new();
        for (name, table) in &tables {
            for (index, fk) in table.foreign_keys.iter().enumerate() {
                constraints
                    .entry(fk.constraint.clone())
                    .or_insert_with(|| (name.clone(), index));
            }
        }

        Self {
            id: id.into(),
            tables,
            constraints,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    #[must_use]
    pub fn schema_names(&self) -> BTreeSet<&str> {
        self.tables.keys().map(|name| name.schema.as_str()).collect()
    }

    #[must_use]
    pub fn get(&self, name: &QualifiedTableName) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Resolve a table. A bare table name only resolves when it is unique
    /// across schemas.
    pub fn table(&self, schema: Option<&str>, table: &str) -> Result<&Table, SchemaError> {
        if let Some(schema) = schema {
            return self
                .tables
                .get(&QualifiedTableName::new(schema, table))
                .ok_or_else(|| SchemaError::table_not_found(Some(schema), table));
        }

        let matches: Vec<&Table> = self.tables.values().filter(|t| t.name == table).collect();
        match matches.as_slice() {
            [] => Err(SchemaError::table_not_found(None, table)),
            [only] => Ok(*only),
            many => Err(SchemaError::AmbiguousTable {
                table: table.to_string(),
                schemas: many.iter().map(|t| t.schema_name.clone()).collect(),
            }),
        }
    }

    #[must_use]
    pub fn foreign_key(&self, constraint: &ConstraintName) -> Option<&ForeignKey> {
        let (table, index) = self.constraints.get(constraint)?;

        self.tables.get(table)?.foreign_keys.get(*index)
    }

    pub fn try_foreign_key(&self, constraint: &ConstraintName) -> Result<&ForeignKey, SchemaError> {
        self.foreign_key(constraint)
            .ok_or_else(|| SchemaError::ConstraintNotFound {
                constraint: constraint.to_string(),
            })
    }

    /// Foreign keys referencing `table`, ordered by constraint name.
    #[must_use]
    pub fn inbound_foreign_keys(&self, table: &QualifiedTableName) -> Vec<&ForeignKey> {
        let mut fks: Vec<&ForeignKey> = self
            .tables
            .values()
            .flat_map(|t| t.foreign_keys.iter())
            .filter(|fk| &fk.referenced_table == table)
            .collect();
        fks.sort_by(|a, b| a.constraint.cmp(&b.constraint));

        fks
    }

    /// Every foreign key linking `from` and `to` in either direction.
    /// The flag is `true` when the key is declared on `from` (outbound).
    #[must_use]
    pub fn foreign_keys_between(
        &self,
        from: &QualifiedTableName,
        to: &QualifiedTableName,
    ) -> Vec<(&ForeignKey, bool)> {
        let mut links: Vec<(&ForeignKey, bool)> = Vec::new();

        if let Some(table) = self.tables.get(from) {
            links.extend(
                table
                    .foreign_keys
                    .iter()
                    .filter(|fk| &fk.referenced_table == to)
                    .map(|fk| (fk, true)),
            );
        }
        if from != to
            && let Some(table) = self.tables.get(to)
        {
            links.extend(
                table
                    .foreign_keys
                    .iter()
                    .filter(|fk| &fk.referenced_table == from)
                    .map(|fk| (fk, false)),
            );
        }

        links
    }

    pub(crate) fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}
