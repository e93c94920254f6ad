//! Explicit join paths.
//!
//! A [`DataPath`] starts at one table bound to alias `a` and grows by
//! linking further tables, each bound to the next letter. Filters apply to
//! the table most recently linked.


use crate::{
    client::Client,
    encode,
    error::Error,
    filter::{ColumnRef, FilterNode},
    reference::Interface,
    source::{Aggregate, Direction, link},
    transport::Method,
};
use ermpath_schema::node::{ConstraintName, QualifiedTableName};
use serde_json::{Map, Value};

///
/// PathTable
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PathTable {
    pub alias: String,
    pub table: QualifiedTableName,
}

///
/// DataPath
///

#[derive(Clone)]
pub struct DataPath<'a> {
    client: &'a Client,
    tables: Vec<PathTable>,
    segments: Vec<String>,
}

impl<'a> DataPath<'a> {
    /// Path rooted at `table`, bound to alias `a`.
    pub fn new(client: &'a Client, schema: Option<&str>, table: &str) -> Result<Self, Error> {
        let table = client.catalog().table(schema, table)?.qualified_name();
        let alias = alias_at(0);
        let segment = format!("{alias}:={}", table_path(&table));

        Ok(Self {
            client,
            tables: vec![PathTable { alias, table }],
            segments: vec![segment],
        })
    }

    #[must_use]
    pub fn tables(&self) -> &[PathTable] {
        &self.tables
    }

    /// Table the path currently points at.
    #[must_use]
    pub fn context(&self) -> &PathTable {
        &self.tables[self.tables.len() - 1]
    }

    /// Link `table` to the current context. The link is the one foreign
    /// key between the two tables, or the one named by `hint`.
    pub fn extend(
        &mut self,
        schema: Option<&str>,
        table: &str,
        hint: Option<&ConstraintName>,
    ) -> Result<&mut Self, Error> {
        let client = self.client;
        let catalog = client.catalog();
        let target = catalog.table(schema, table)?.qualified_name();
        let current = self.context().table.clone();

        let links: Vec<_> = catalog
            .foreign_keys_between(&current, &target)
            .into_iter()
            .filter(|(fk, _)| hint.is_none_or(|hint| fk.constraint == *hint))
            .collect();
        let (fk, outbound) = match links.as_slice() {
            [only] => *only,
            [] => {
                return Err(Error::invalid_input(format!(
                    "No foreign key links {current} to {target}."
                )));
            }
            _ => {
                return Err(Error::invalid_input(format!(
                    "More than one foreign key links {current} to {target}; name the one to use."
                )));
            }
        };
        let direction = if outbound {
            Direction::Outbound
        } else {
            Direction::Inbound
        };

        let alias = alias_at(self.tables.len());
        self.segments.push(format!("{alias}:={}", link(fk, direction)));
        self.tables.push(PathTable {
            alias,
            table: target,
        });

        Ok(self)
    }

    /// Copy of this path narrowed by `filter` at the current context.
    #[must_use]
    pub fn filter(&self, filter: &FilterNode) -> Self {
        let mut path = self.clone();
        path.segments.push(filter.to_uri());
        path
    }

    #[must_use]
    pub fn path(&self) -> String {
        self.segments.join("/")
    }

    ///
    /// REQUEST PATHS
    ///

    #[must_use]
    pub fn entity_path(&self) -> String {
        format!("/{}/{}", Interface::Entity, self.path())
    }

    pub fn attribute_path(&self, columns: &[ColumnRef]) -> Result<String, Error> {
        Ok(format!(
            "/{}/{}/{}",
            Interface::Attribute,
            self.path(),
            projection_list(columns)?
        ))
    }

    pub fn attributegroup_path(
        &self,
        keys: &[ColumnRef],
        values: &[ColumnRef],
    ) -> Result<String, Error> {
        let mut path = format!(
            "/{}/{}/{}",
            Interface::AttributeGroup,
            self.path(),
            projection_list(keys)?
        );
        if !values.is_empty() {
            path.push(';');
            path.push_str(&projection_list(values)?);
        }

        Ok(path)
    }

    pub fn aggregate_path(
        &self,
        projections: &[(&str, Aggregate, ColumnRef)],
    ) -> Result<String, Error> {
        if projections.is_empty() {
            return Err(Error::invalid_input("At least one projection is required."));
        }
        let projected: Vec<String> = projections
            .iter()
            .map(|(name, aggregate, column)| {
                format!("{}:={aggregate}({column})", encode::component(name))
            })
            .collect();

        Ok(format!(
            "/{}/{}/{}",
            Interface::Aggregate,
            self.path(),
            projected.join(",")
        ))
    }

    ///
    /// REQUESTS
    ///

    /// Entities of the current context.
    pub async fn get(&self) -> Result<Vec<Map<String, Value>>, Error> {
        let body = self
            .client
            .fetch(
                Method::Get,
                Interface::Entity,
                self.request_uri(&self.entity_path()),
            )
            .await?;

        match body {
            Value::Array(rows) => Ok(rows
                .into_iter()
                .filter_map(|row| match row {
                    Value::Object(row) => Some(row),
                    _ => None,
                })
                .collect()),
            _ => Err(Error::transport(200, "expected an array of rows")),
        }
    }

    /// Delete the entities of the current context, optionally narrowed by
    /// `filter` first.
    pub async fn delete(&self, filter: Option<&FilterNode>) -> Result<(), Error> {
        let path = match filter {
            Some(filter) => self.filter(filter),
            None => self.clone(),
        };
        self.client
            .fetch(
                Method::Delete,
                Interface::Entity,
                self.request_uri(&path.entity_path()),
            )
            .await?;

        Ok(())
    }

    fn request_uri(&self, path: &str) -> String {
        format!("{}{path}", self.client.catalog_uri())
    }
}

// a, b, ... z, then t26, t27, ...
fn alias_at(index: usize) -> String {
    match u8::try_from(index) {
        Ok(offset) if offset < 26 => char::from(b'a' + offset).to_string(),
        _ => format!("t{index}"),
    }
}

fn table_path(table: &QualifiedTableName) -> String {
    format!(
        "{}:{}",
        encode::component(&table.schema),
        encode::component(&table.table)
    )
}

fn projection_list(columns: &[ColumnRef]) -> Result<String, Error> {
    if columns.is_empty() {
        return Err(Error::invalid_input("At least one projection is required."));
    }

    Ok(columns
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(","))
}
