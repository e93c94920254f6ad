use crate::{
    encode,
    error::Error,
    filter::{FilterNode, parse_filter_segment},
};
use derive_more::Display;
use ermpath_schema::node::{ConstraintName, ForeignKey};
use serde_json::Value;

///
/// Direction
///
/// Which side of a foreign key a hop walks from.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Direction {
    #[display("inbound")]
    Inbound,
    #[display("outbound")]
    Outbound,
}

impl Direction {
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Inbound => Self::Outbound,
            Self::Outbound => Self::Inbound,
        }
    }
}

///
/// Hop
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Hop {
    pub direction: Direction,
    pub constraint: ConstraintName,
}

impl Hop {
    #[must_use]
    pub const fn outbound(constraint: ConstraintName) -> Self {
        Self {
            direction: Direction::Outbound,
            constraint,
        }
    }

    #[must_use]
    pub const fn inbound(constraint: ConstraintName) -> Self {
        Self {
            direction: Direction::Inbound,
            constraint,
        }
    }
}

/// Link expression for walking `fk` in `direction`:
/// outbound `(from)=(s:referenced:to)`, inbound `(to)=(s:table:from)`.
#[must_use]
pub fn link(fk: &ForeignKey, direction: Direction) -> String {
    let (left, right, table): (Vec<&str>, Vec<&str>, _) = match direction {
        Direction::Outbound => (
            fk.from_columns().collect(),
            fk.to_columns().collect(),
            &fk.referenced_table,
        ),
        Direction::Inbound => (fk.to_columns().collect(), fk.from_columns().collect(), &fk.table),
    };

    let left: Vec<String> = left.into_iter().map(encode::component).collect();
    let right: Vec<String> = right
        .into_iter()
        .enumerate()
        .map(|(index, column)| {
            if index == 0 {
                format!(
                    "{}:{}:{}",
                    encode::component(&table.schema),
                    encode::component(&table.table),
                    encode::component(column)
                )
            } else {
                encode::component(column)
            }
        })
        .collect();

    format!("({})=({})", left.join(","), right.join(","))
}

///
/// Aggregate
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Aggregate {
    #[display("array")]
    Array,
    #[display("array_d")]
    ArrayDistinct,
    #[display("cnt")]
    Count,
    #[display("cnt_d")]
    CountDistinct,
    #[display("max")]
    Max,
    #[display("min")]
    Min,
}

impl Aggregate {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "array" => Some(Self::Array),
            "array_d" => Some(Self::ArrayDistinct),
            "cnt" => Some(Self::Count),
            "cnt_d" => Some(Self::CountDistinct),
            "max" => Some(Self::Max),
            "min" => Some(Self::Min),
            _ => None,
        }
    }
}

///
/// PathRef
///
/// Column reached through foreign-key hops, optionally starting from a
/// named path prefix and narrowed by a filter on the far table.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PathRef {
    pub prefix: Option<String>,
    pub hops: Vec<Hop>,
    pub column: String,
    pub filter: Option<FilterNode>,
}

///
/// NamedSourceRef
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NamedSourceRef {
    pub key: String,
}

///
/// Source
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Source {
    Column(String),
    Path(PathRef),
    Named(NamedSourceRef),
}

impl Source {
    /// The sourcekey this source depends on directly, if any.
    #[must_use]
    pub fn dependency(&self) -> Option<&str> {
        match self {
            Self::Column(_) => None,
            Self::Path(path) => path.prefix.as_deref(),
            Self::Named(named) => Some(&named.key),
        }
    }
}

///
/// SourceSpec
///
/// A requested source plus the aggregate applied to it.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SourceSpec {
    pub source: Source,
    pub aggregate: Option<Aggregate>,
}

impl SourceSpec {
    pub fn column(name: impl Into<String>) -> Self {
        Self {
            source: Source::Column(name.into()),
            aggregate: None,
        }
    }

    pub fn named(key: impl Into<String>) -> Self {
        Self {
            source: Source::Named(NamedSourceRef { key: key.into() }),
            aggregate: None,
        }
    }

    pub fn path(hops: Vec<Hop>, column: impl Into<String>) -> Self {
        Self {
            source: Source::Path(PathRef {
                prefix: None,
                hops,
                column: column.into(),
                filter: None,
            }),
            aggregate: None,
        }
    }

    #[must_use]
    pub const fn with_aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = Some(aggregate);
        self
    }

    /// Parse a source object: `"col"`, a path array, `{"source": ...}` or
    /// `{"sourcekey": "..."}`, the latter two with an optional `aggregate`.
    pub fn from_json(value: &Value) -> Result<Self, Error> {
        match value {
            Value::String(_) | Value::Array(_) => Ok(Self {
                source: parse_source(value)?,
                aggregate: None,
            }),
            Value::Object(object) => {
                let aggregate = match object.get("aggregate") {
                    None => None,
                    Some(Value::String(name)) => Some(Aggregate::from_name(name).ok_or_else(|| {
                        Error::invalid_source(format!("'{name}' is not a valid aggregate function"))
                    })?),
                    Some(_) => return Err(Error::invalid_source("aggregate must be a string")),
                };

                let source = match (object.get("source"), object.get("sourcekey")) {
                    (Some(source), _) => parse_source(source)?,
                    (None, Some(Value::String(key))) if !key.is_empty() => {
                        Source::Named(NamedSourceRef { key: key.clone() })
                    }
                    _ => return Err(Error::invalid_source("missing `source` or `sourcekey`")),
                };

                Ok(Self { source, aggregate })
            }
            _ => Err(Error::invalid_source(format!("invalid source object: {value}"))),
        }
    }
}

fn parse_source(value: &Value) -> Result<Source, Error> {
    let nodes = match value {
        Value::String(column) => return Ok(Source::Column(column.clone())),
        Value::Array(nodes) => nodes,
        other => return Err(Error::invalid_source(format!("invalid source: {other}"))),
    };

    let Some((Value::String(column), steps)) = nodes.split_last() else {
        return Err(Error::invalid_source(
            "source path must end with a column name",
        ));
    };

    let mut path = PathRef {
        prefix: None,
        hops: Vec::new(),
        column: column.clone(),
        filter: None,
    };
    for (index, step) in steps.iter().enumerate() {
        parse_step(step, index, steps.len(), &mut path)?;
    }

    if path.prefix.is_none() && path.hops.is_empty() && path.filter.is_none() {
        return Ok(Source::Column(path.column));
    }

    Ok(Source::Path(path))
}

// A prefix may only lead the path, a filter may only close it.
fn parse_step(step: &Value, index: usize, len: usize, path: &mut PathRef) -> Result<(), Error> {
    let invalid = || Error::invalid_source(format!("invalid source path node: {step}"));
    let Value::Object(object) = step else {
        return Err(invalid());
    };

    if let Some(key) = object.get("sourcekey") {
        let Value::String(key) = key else {
            return Err(invalid());
        };
        if index != 0 {
            return Err(Error::invalid_source(
                "a path prefix must be the first node of a source",
            ));
        }
        path.prefix = Some(key.clone());
        return Ok(());
    }

    if let Some(filter) = object.get("filter") {
        let Value::String(filter) = filter else {
            return Err(invalid());
        };
        if index + 1 != len {
            return Err(Error::invalid_source(
                "a filter must be the last node before the column",
            ));
        }
        let node = parse_filter_segment(filter)
            .map_err(|e| Error::invalid_source(format!("invalid source filter: {e}")))?;
        path.filter = Some(node);
        return Ok(());
    }

    let (direction, constraint) = match (object.get("inbound"), object.get("outbound")) {
        (Some(c), None) => (Direction::Inbound, c),
        (None, Some(c)) => (Direction::Outbound, c),
        _ => return Err(invalid()),
    };
    let constraint: (String, String) =
        serde_json::from_value(constraint.clone()).map_err(|_| invalid())?;

    path.hops.push(Hop {
        direction,
        constraint: constraint.into(),
    });

    Ok(())
}
