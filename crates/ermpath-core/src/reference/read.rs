use crate::{
    compose::{ComposedPath, Projection, ROOT_ALIAS},
    encode,
    error::Error,
    filter::ColumnRef,
    reference::{Interface, Page, Reference, ReferenceColumn, Row, column},
    sort::{PageCursor, PageDirection},
    source::{Aggregate, ResolvedSource, SourceSpec, resolve},
    transport::Method,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Rows per page when the caller has no preference.
pub const DEFAULT_PAGE_SIZE: usize = 25;

///
/// ReadPlan
///
/// Request path of one page read, and how to map its response back to rows.
///

struct ReadPlan {
    interface: Interface,
    path: String,
    linked: Vec<(String, String)>,
}

impl<'a> Reference<'a> {
    #[must_use]
    pub fn columns(&self) -> Vec<ReferenceColumn> {
        column::columns(self.table)
    }

    /// Root binding, facets and filter. The path context ends at the root
    /// alias.
    pub fn base_path(&self) -> Result<String, Error> {
        let root = format!(
            "{ROOT_ALIAS}:={}:{}",
            encode::component(&self.table.schema_name),
            encode::component(&self.table.name)
        );

        let mut segments = Vec::new();
        match self.facet_path()? {
            Some(facets) if facets.right_join => segments.push(facets.path),
            Some(facets) => {
                segments.push(root);
                if !facets.path.is_empty() {
                    segments.push(facets.path);
                }
            }
            None => segments.push(root),
        }
        if let Some(filter) = self.location.filter() {
            segments.push(filter.to_uri());
        }

        Ok(segments.join("/"))
    }

    /// Path reading one page of `limit` rows. One extra row is requested
    /// to tell whether another page follows.
    pub fn read_path(&self, limit: usize) -> Result<String, Error> {
        Ok(self.read_plan(limit)?.path)
    }

    pub async fn read(&self, limit: usize) -> Result<Page<'a>, Error> {
        let plan = self.read_plan(limit)?;
        let body = self
            .client
            .fetch(Method::Get, plan.interface, self.request_uri(&plan.path))
            .await?;

        let mut rows = match body {
            Value::Array(rows) => rows
                .into_iter()
                .map(|row| to_row(row, &plan.linked))
                .collect::<Result<Vec<_>, _>>()?,
            _ => return Err(Error::transport(200, "expected an array of rows")),
        };

        let more = rows.len() > limit;
        rows.truncate(limit);

        let (has_previous, has_next) = match self.location.paging().map(|c| c.direction) {
            None => (false, more),
            Some(PageDirection::After) => (true, more),
            Some(PageDirection::Before) => {
                rows.reverse();
                (more, true)
            }
        };

        Ok(Page {
            reference: self.clone(),
            rows,
            has_previous,
            has_next,
        })
    }

    /// Number of rows matching the facets and filter.
    pub async fn count(&self) -> Result<u64, Error> {
        let body = self
            .client
            .fetch(
                Method::Get,
                Interface::Aggregate,
                self.request_uri(&self.count_path()?),
            )
            .await?;

        body.get(0)
            .and_then(|row| row.get("cnt"))
            .and_then(Value::as_u64)
            .ok_or_else(|| Error::transport(200, "count response has no `cnt` value"))
    }

    pub fn count_path(&self) -> Result<String, Error> {
        let projection = match self.table.shortest_key().as_slice() {
            [key] => Projection {
                name: "cnt".to_string(),
                alias: ROOT_ALIAS.to_string(),
                column: key.name.clone(),
                aggregate: Some(Aggregate::CountDistinct),
            }
            .to_string(),
            _ => "cnt:=cnt(*)".to_string(),
        };

        Ok(format!("/aggregate/{}/{projection}", self.base_path()?))
    }

    /// Aggregate request over named sources. Every source needs an
    /// aggregate function.
    pub fn aggregate_path(&self, projections: &[(&str, SourceSpec)]) -> Result<String, Error> {
        let (joins, projected) = self.project(projections, true)?;

        Ok(format!("/aggregate/{}{joins}/{projected}", self.base_path()?))
    }

    /// Attribute request over named sources. Aggregates are not allowed.
    pub fn attribute_path(&self, projections: &[(&str, SourceSpec)]) -> Result<String, Error> {
        let (joins, projected) = self.project(projections, false)?;

        Ok(format!("/attribute/{}{joins}/{projected}", self.base_path()?))
    }

    /// Single-row aggregate read.
    pub async fn aggregate(
        &self,
        projections: &[(&str, SourceSpec)],
    ) -> Result<Map<String, Value>, Error> {
        let path = self.aggregate_path(projections)?;
        let body = self
            .client
            .fetch(Method::Get, Interface::Aggregate, self.request_uri(&path))
            .await?;

        match body {
            Value::Array(rows) => match rows.into_iter().next() {
                Some(Value::Object(row)) => Ok(row),
                _ => Ok(Map::new()),
            },
            _ => Err(Error::transport(200, "expected an array of rows")),
        }
    }

    fn read_plan(&self, limit: usize) -> Result<ReadPlan, Error> {
        if limit == 0 {
            return Err(Error::invalid_input("Invalid limit."));
        }

        // @before reads walk the reversed order forward from the cursor
        let (sort, cursor) = match self.location.paging() {
            Some(cursor) if cursor.direction == PageDirection::Before => (
                self.sort.reversed(),
                Some(PageCursor::new(PageDirection::After, cursor.values.clone())),
            ),
            cursor => (self.sort.clone(), cursor.cloned()),
        };
        let mut modifiers = sort.to_modifier();
        if let Some(cursor) = cursor {
            modifiers.push_str(&cursor.to_modifier());
        }
        let query = format!("?limit={}", limit + 1);
        let base = self.base_path()?;

        let linked_columns: Vec<ReferenceColumn> =
            self.columns().into_iter().filter(ReferenceColumn::is_pseudo).collect();
        if linked_columns.is_empty() {
            return Ok(ReadPlan {
                interface: Interface::Entity,
                path: format!("/entity/{base}{modifiers}{query}"),
                linked: Vec::new(),
            });
        }

        let mut sources = Vec::with_capacity(linked_columns.len());
        let mut linked = Vec::with_capacity(linked_columns.len());
        for column in &linked_columns {
            let resolved = self.resolve(&column.source())?;
            linked.push((resolved.name(), column.name().to_string()));
            sources.push(resolved);
        }
        let composed = self.client.compose(self.table, &sources)?;

        let keys: Vec<String> = self
            .sort
            .iter()
            .map(|key| ColumnRef::new(key.column.as_str()).to_string())
            .collect();
        let mut projected = vec![
            Projection {
                name: ROOT_ALIAS.to_string(),
                alias: ROOT_ALIAS.to_string(),
                column: ColumnRef::ALL_COLUMNS.to_string(),
                aggregate: Some(Aggregate::ArrayDistinct),
            }
            .to_string(),
        ];
        projected.extend(composed.projections.iter().map(ToString::to_string));

        Ok(ReadPlan {
            interface: Interface::AttributeGroup,
            path: format!(
                "/attributegroup/{base}{}/{};{}{modifiers}{query}",
                joins(&composed),
                keys.join(","),
                projected.join(",")
            ),
            linked,
        })
    }

    // Join segments (with a leading `/`) and the projection list.
    fn project(
        &self,
        projections: &[(&str, SourceSpec)],
        aggregate: bool,
    ) -> Result<(String, String), Error> {
        if projections.is_empty() {
            return Err(Error::invalid_input("At least one projection is required."));
        }

        let mut sources = Vec::with_capacity(projections.len());
        for (name, spec) in projections {
            let resolved = self.resolve(spec)?;
            match (aggregate, resolved.aggregate.is_some()) {
                (true, false) => {
                    return Err(Error::invalid_input(format!(
                        "Projection `{name}` needs an aggregate function."
                    )));
                }
                (false, true) => {
                    return Err(Error::invalid_input(format!(
                        "Projection `{name}` cannot use an aggregate function."
                    )));
                }
                _ => {}
            }
            sources.push(resolved);
        }
        let composed = self.client.compose(self.table, &sources)?;

        let projected: Vec<String> = projections
            .iter()
            .zip(&sources)
            .map(|((name, _), source)| {
                Projection {
                    name: (*name).to_string(),
                    alias: composed
                        .alias_for(&source.canonical())
                        .unwrap_or(ROOT_ALIAS)
                        .to_string(),
                    column: source.column.clone(),
                    aggregate: source.aggregate,
                }
                .to_string()
            })
            .collect();

        Ok((joins(&composed), projected.join(",")))
    }

    fn resolve(&self, spec: &SourceSpec) -> Result<ResolvedSource, Error> {
        resolve(self.client.catalog(), self.table, &self.defs, spec)
    }

    fn request_uri(&self, path: &str) -> String {
        format!(
            "{}/catalog/{}{path}",
            self.location.service().unwrap_or(self.client.service()),
            self.location.catalog_with_snapshot()
        )
    }
}

fn joins(composed: &ComposedPath) -> String {
    if composed.path.is_empty() {
        String::new()
    } else {
        format!("/{}", composed.path)
    }
}

// Attributegroup rows carry the root row in `M` and each linked row in the
// column named after its source.
fn to_row(row: Value, linked: &[(String, String)]) -> Result<Row, Error> {
    let Value::Object(mut row) = row else {
        return Err(Error::transport(200, "expected rows to be objects"));
    };
    if linked.is_empty() {
        return Ok(Row {
            data: row,
            linked: BTreeMap::new(),
        });
    }

    let first = |value: Option<Value>| match value {
        Some(Value::Array(values)) => values.into_iter().next().unwrap_or(Value::Null),
        _ => Value::Null,
    };

    let data = match first(row.remove(ROOT_ALIAS)) {
        Value::Object(data) => data,
        _ => Map::new(),
    };
    let linked = linked
        .iter()
        .map(|(source, name)| (name.clone(), first(row.remove(source))))
        .collect();

    Ok(Row { data, linked })
}
