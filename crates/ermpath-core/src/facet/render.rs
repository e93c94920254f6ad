use crate::{
    config::Config,
    encode,
    error::Error,
    facet::{FacetRange, FacetTerm, Facets},
    filter::{ColumnRef, Operator},
    search,
    source::{Direction, ResolvedHop, SEARCH_BOX, SourceDefinitions, SourceSpec, link, resolve},
};
use ermpath_schema::node::{Catalog, QualifiedTableName, Table};
use serde_json::Value;

pub const INVALID_SOURCE: &str = "Missing or invalid `source` attribute.";
pub const INVALID_CHOICE: &str = "invalid choices value.";
pub const INVALID_RANGE: &str = "invalid ranges value.";
pub const INVALID_SEARCH: &str = "invalid search value.";
pub const MISSING_CONSTRAINTS: &str = "No constraints are defined for the facet.";
pub const ONLY_ONE_NULL_FILTER: &str = "Only one null filter is allowed in the facets";
pub const INVALID_SOURCEKEY: &str = "Given sourcekey string is not valid";

///
/// FacetPath
///
/// Rendered facet filters. With a right join the path starts at the far
/// table and rebinds the root alias itself; otherwise it follows the root.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FacetPath {
    pub path: String,
    pub right_join: bool,
}

///
/// FacetRenderer
///

pub struct FacetRenderer<'a> {
    pub catalog: &'a Catalog,
    pub root: &'a Table,
    pub defs: &'a SourceDefinitions,
    pub config: &'a Config,
    pub alias: &'a str,
}

///
/// Target
///
/// Where one term's constraints land after path shortening.
///

struct Target {
    columns: Vec<ColumnRef>,
    hops: Vec<ResolvedHop>,
    table: QualifiedTableName,
}

impl FacetRenderer<'_> {
    pub fn render(&self, facets: &Facets) -> Result<FacetPath, Error> {
        let mut right_joins = Vec::new();
        let mut inner_joins = Vec::new();

        for (index, term) in facets.and.iter().enumerate() {
            let fail = |message: &str| Error::invalid_facet(format!("{message}(index={index})"), None);

            let target = self.target(term).map_err(fail)?;
            let right_join = term.has_null_choice() && !target.hops.is_empty();
            if right_join && !right_joins.is_empty() {
                return Err(fail(ONLY_ONE_NULL_FILTER));
            }

            let constraints = self.constraints(term, &target.columns).map_err(fail)?;

            if right_join {
                right_joins.push(self.reversed_path(&target, &constraints));
            } else {
                let mut segments: Vec<String> = forward_path(&target.hops);
                segments.push(constraints);
                segments.push(format!("${}", self.alias));
                inner_joins.push(segments.join("/"));
            }
        }

        let right_join = !right_joins.is_empty();
        right_joins.extend(inner_joins);

        Ok(FacetPath {
            path: right_joins.join("/"),
            right_join,
        })
    }

    fn target(&self, term: &FacetTerm) -> Result<Target, &'static str> {
        let spec = match (&term.sourcekey, &term.source) {
            (Some(key), _) if key == SEARCH_BOX => {
                let columns: Vec<ColumnRef> = match self.defs.search_columns() {
                    [] => vec![ColumnRef::all_columns()],
                    columns => columns.iter().map(|c| ColumnRef::new(c.as_str())).collect(),
                };
                return Ok(Target {
                    columns,
                    hops: Vec::new(),
                    table: self.root.qualified_name(),
                });
            }
            (Some(key), _) => {
                let spec = self.defs.get(key).ok_or(INVALID_SOURCEKEY)?;
                if spec.aggregate.is_some() {
                    return Err(INVALID_SOURCEKEY);
                }
                spec.clone()
            }
            (None, Some(source)) => SourceSpec::from_json(source).map_err(|_| INVALID_SOURCE)?,
            (None, None) => return Err(INVALID_SOURCE),
        };

        let resolved =
            resolve(self.catalog, self.root, self.defs, &spec).map_err(|_| INVALID_SOURCE)?;
        let mut target = Target {
            columns: vec![ColumnRef::new(resolved.column.as_str())],
            hops: resolved.hops,
            table: resolved.table,
        };

        if self.config.fast_filter {
            self.shorten(&mut target);
        }

        Ok(target)
    }

    // A simple last hop whose far column is the constrained not-null
    // column can be replaced by a filter on the near column.
    fn shorten(&self, target: &mut Target) {
        let [column] = target.columns.as_slice() else {
            return;
        };
        let Some(last) = target.hops.last() else {
            return;
        };
        if !last.fk.is_simple() || last.filter.is_some() {
            return;
        }
        let Some(mapping) = last.fk.columns.first() else {
            return;
        };
        let (far, near) = match last.direction {
            Direction::Outbound => (&mapping.to, &mapping.from),
            Direction::Inbound => (&mapping.from, &mapping.to),
        };
        let not_null = self
            .catalog
            .get(&target.table)
            .and_then(|table| table.column(far))
            .is_some_and(|c| !c.nullok);
        if *far != column.name || !not_null {
            return;
        }

        target.columns = vec![ColumnRef::new(near.as_str())];
        target.hops.pop();
        target.table = target
            .hops
            .last()
            .map_or_else(|| self.root.qualified_name(), |hop| hop.target.clone());
    }

    fn constraints(&self, term: &FacetTerm, columns: &[ColumnRef]) -> Result<String, &'static str> {
        let mut parts = Vec::new();

        // only search applies to every search-box column
        let column = match columns {
            [column] => Some(column),
            _ => None,
        };

        if let Some(choices) = &term.choices {
            let column = column.ok_or(INVALID_SOURCEKEY)?;
            let rendered = render_choices(choices, column);
            if rendered.is_empty() {
                return Err(INVALID_CHOICE);
            }
            parts.push(rendered);
        }
        if let Some(ranges) = &term.ranges {
            let column = column.ok_or(INVALID_SOURCEKEY)?;
            let rendered = render_ranges(ranges, column);
            if rendered.is_empty() {
                return Err(INVALID_RANGE);
            }
            parts.push(rendered);
        }
        if let Some(values) = &term.search {
            let rendered = self.render_search(values, columns).ok_or(INVALID_SEARCH)?;
            parts.push(rendered);
        }
        if term.not_null == Some(true) {
            let column = column.ok_or(INVALID_SOURCEKEY)?;
            parts.push(format!("!({column}{})", Operator::Null.token()));
        }

        if parts.is_empty() {
            return Err(MISSING_CONSTRAINTS);
        }

        Ok(disjoin(parts))
    }

    fn render_search(&self, values: &[Value], columns: &[ColumnRef]) -> Option<String> {
        let mut parts = Vec::new();

        for value in values {
            if value.is_null() {
                return None;
            }
            let term = value_to_string(value);
            let rendered = match columns {
                [column] => search::to_path(column, &term, self.config.quantified_search),
                _ => search::to_filter_any(columns, &term).map(|node| node.to_uri()),
            };
            if let Some(rendered) = rendered {
                parts.push(rendered);
            }
        }

        (!parts.is_empty()).then(|| disjoin(parts))
    }

    // Far table, its constraints, then the hops walked backwards with the
    // root alias rebound by a right outer join on the first hop.
    fn reversed_path(&self, target: &Target, constraints: &str) -> String {
        let mut segments = vec![format!(
            "{}:{}",
            encode::component(&target.table.schema),
            encode::component(&target.table.table)
        )];
        let hops = &target.hops;

        if let Some(filter) = hops.last().and_then(|hop| hop.filter.as_ref()) {
            segments.push(filter.to_uri());
        }
        segments.push(constraints.to_string());

        for index in (1..hops.len()).rev() {
            let hop = &hops[index];
            segments.push(link(&hop.fk, hop.direction.reversed()));
            if let Some(filter) = &hops[index - 1].filter {
                segments.push(filter.to_uri());
            }
        }
        if let Some(first) = hops.first() {
            segments.push(format!(
                "{}:=right{}",
                self.alias,
                link(&first.fk, first.direction.reversed())
            ));
        }

        segments.join("/")
    }
}

fn forward_path(hops: &[ResolvedHop]) -> Vec<String> {
    let mut segments = Vec::new();
    for hop in hops {
        segments.push(hop.link());
        if let Some(filter) = &hop.filter {
            segments.push(filter.to_uri());
        }
    }

    segments
}

fn render_choices(choices: &[Value], column: &ColumnRef) -> String {
    let parts: Vec<String> = choices
        .iter()
        .map(|choice| {
            if choice.is_null() {
                format!("{column}{}", Operator::Null.token())
            } else {
                format!(
                    "{column}{}{}",
                    Operator::Equal.token(),
                    encode::component(&value_to_string(choice))
                )
            }
        })
        .collect();

    parts.join(";")
}

fn render_ranges(ranges: &[FacetRange], column: &ColumnRef) -> String {
    let mut parts = Vec::new();

    for range in ranges {
        let mut bounds = Vec::new();
        if let Some(min) = range.min.as_ref().filter(|v| !v.is_null()) {
            let operator = if range.min_exclusive {
                Operator::Greater
            } else {
                Operator::GreaterOrEqual
            };
            bounds.push(bound(column, operator, min));
        }
        if let Some(max) = range.max.as_ref().filter(|v| !v.is_null()) {
            let operator = if range.max_exclusive {
                Operator::Less
            } else {
                Operator::LessOrEqual
            };
            bounds.push(bound(column, operator, max));
        }
        if !bounds.is_empty() {
            parts.push(bounds.join("&"));
        }
    }

    if parts.is_empty() {
        String::new()
    } else {
        disjoin(parts)
    }
}

fn bound(column: &ColumnRef, operator: Operator, value: &Value) -> String {
    format!(
        "{column}{}{}",
        operator.token(),
        encode::component(&value_to_string(value))
    )
}

/// Join alternatives with `;`, parenthesizing any alternative that is a
/// top-level conjunction so the result never mixes separators.
fn disjoin(parts: Vec<String>) -> String {
    if parts.len() == 1 {
        return parts.into_iter().next().unwrap_or_default();
    }

    parts
        .into_iter()
        .map(|part| {
            if has_top_level_conjunction(&part) {
                format!("({part})")
            } else {
                part
            }
        })
        .collect::<Vec<_>>()
        .join(";")
}

fn has_top_level_conjunction(part: &str) -> bool {
    let mut depth = 0usize;
    for c in part.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '&' if depth == 0 => return true,
            _ => {}
        }
    }

    false
}

pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
