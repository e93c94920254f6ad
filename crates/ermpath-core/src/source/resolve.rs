use crate::{
    error::Error,
    filter::{ColumnRef, FilterNode},
    source::{Aggregate, Direction, PathRef, Source, SourceDefinitions, SourceSpec, link},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use ermpath_schema::node::{Catalog, ForeignKey, QualifiedTableName, Table};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

///
/// ResolvedHop
///
/// One foreign-key step with the table it lands on. A filter narrows the
/// landing table.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedHop {
    pub direction: Direction,
    pub fk: ForeignKey,
    pub target: QualifiedTableName,
    pub filter: Option<FilterNode>,
}

impl ResolvedHop {
    /// Link expression walking this hop forward.
    #[must_use]
    pub fn link(&self) -> String {
        link(&self.fk, self.direction)
    }

    /// Stable identity of the hop, used to key the join trie.
    #[must_use]
    pub fn canonical(&self) -> String {
        let mut out = format!("{}:{}", self.direction, self.fk.constraint);
        if let Some(filter) = &self.filter {
            let _ = write!(out, "[{filter}]");
        }

        out
    }
}

///
/// ResolvedSource
///
/// A source with every sourcekey and path prefix expanded into one flat
/// hop list starting at the root table.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedSource {
    /// Sourcekey the request named, if any.
    pub key: Option<String>,
    pub hops: Vec<ResolvedHop>,
    pub column: String,
    pub table: QualifiedTableName,
    pub aggregate: Option<Aggregate>,

    /// Every sourcekey the hops came from, with the number of leading hops
    /// it covers. Nested keys are listed prefix-most first.
    pub prefixes: Vec<(String, usize)>,
}

impl ResolvedSource {
    #[must_use]
    pub fn is_path(&self) -> bool {
        !self.hops.is_empty()
    }

    /// Anything other than a plain root column.
    #[must_use]
    pub fn is_pseudo(&self) -> bool {
        self.is_path() || self.aggregate.is_some()
    }

    /// Canonical text form. Two requests denoting the same join and
    /// projection always produce the same string.
    #[must_use]
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        for hop in &self.hops {
            out.push_str(&hop.canonical());
            out.push('/');
        }
        out.push_str(&ColumnRef::new(self.column.as_str()).to_string());
        if let Some(aggregate) = self.aggregate {
            let _ = write!(out, "|{aggregate}");
        }

        out
    }

    /// Projection name: the column itself for plain columns, otherwise a
    /// short digest of the canonical form.
    #[must_use]
    pub fn name(&self) -> String {
        if !self.is_pseudo() {
            return self.column.clone();
        }
        let digest = Sha256::digest(self.canonical().as_bytes());

        URL_SAFE_NO_PAD.encode(&digest[..16])
    }

    #[must_use]
    pub fn last_hop(&self) -> Option<&ResolvedHop> {
        self.hops.last()
    }
}

/// Expand `spec` against `root`, following named sources and prefixes.
pub fn resolve(
    catalog: &Catalog,
    root: &Table,
    defs: &SourceDefinitions,
    spec: &SourceSpec,
) -> Result<ResolvedSource, Error> {
    let resolver = Resolver {
        catalog,
        root,
        defs,
    };
    let mut visiting = Vec::new();
    let partial = resolver.source(&spec.source, &mut visiting)?;

    Ok(ResolvedSource {
        key: match &spec.source {
            Source::Named(named) => Some(named.key.clone()),
            _ => None,
        },
        hops: partial.hops,
        column: partial.column,
        table: partial.table,
        aggregate: spec.aggregate.or(partial.aggregate),
        prefixes: partial.prefixes,
    })
}

///
/// Partial
///

struct Partial {
    hops: Vec<ResolvedHop>,
    column: String,
    table: QualifiedTableName,
    aggregate: Option<Aggregate>,
    prefixes: Vec<(String, usize)>,
}

///
/// Resolver
///

struct Resolver<'a> {
    catalog: &'a Catalog,
    root: &'a Table,
    defs: &'a SourceDefinitions,
}

impl Resolver<'_> {
    fn source(&self, source: &Source, visiting: &mut Vec<String>) -> Result<Partial, Error> {
        match source {
            Source::Column(column) => {
                self.check_column(self.root, column)?;
                Ok(Partial {
                    hops: Vec::new(),
                    column: column.clone(),
                    table: self.root.qualified_name(),
                    aggregate: None,
                    prefixes: Vec::new(),
                })
            }
            Source::Named(named) => self.named(&named.key, visiting),
            Source::Path(path) => self.path(path, visiting),
        }
    }

    fn named(&self, key: &str, visiting: &mut Vec<String>) -> Result<Partial, Error> {
        if visiting.iter().any(|k| k == key) {
            return Err(Error::invalid_source(format!(
                "cyclic source definition: {} -> {key}",
                visiting.join(" -> ")
            )));
        }
        let spec = self
            .defs
            .get(key)
            .ok_or_else(|| Error::invalid_source(format!("Given sourcekey `{key}` is not valid")))?;

        visiting.push(key.to_string());
        let mut partial = self.source(&spec.source, visiting)?;
        visiting.pop();

        partial.prefixes.push((key.to_string(), partial.hops.len()));
        partial.aggregate = spec.aggregate.or(partial.aggregate);

        Ok(partial)
    }

    fn path(&self, path: &PathRef, visiting: &mut Vec<String>) -> Result<Partial, Error> {
        let (mut hops, mut prefixes) = match &path.prefix {
            Some(prefix) => {
                let partial = self.named(prefix, visiting)?;
                if partial.hops.is_empty() {
                    return Err(Error::invalid_source(format!(
                        "path prefix `{prefix}` must be a foreign-key path"
                    )));
                }
                (partial.hops, partial.prefixes)
            }
            None => (Vec::new(), Vec::new()),
        };
        // the prefix column is not part of the path
        prefixes.retain(|(_, len)| *len > 0);

        let mut current = hops
            .last()
            .map_or_else(|| self.root.qualified_name(), |hop| hop.target.clone());

        for hop in &path.hops {
            let fk = self.catalog.try_foreign_key(&hop.constraint)?;
            let (from, to) = match hop.direction {
                Direction::Outbound => (&fk.table, &fk.referenced_table),
                Direction::Inbound => (&fk.referenced_table, &fk.table),
            };
            if *from != current {
                return Err(Error::invalid_source(format!(
                    "{} foreign key {} does not connect to {current}",
                    hop.direction, hop.constraint
                )));
            }
            current = to.clone();
            hops.push(ResolvedHop {
                direction: hop.direction,
                fk: fk.clone(),
                target: to.clone(),
                filter: None,
            });
        }

        if let Some(filter) = &path.filter {
            let Some(last) = hops.last_mut() else {
                return Err(Error::invalid_source(
                    "a source filter requires at least one foreign-key hop",
                ));
            };
            last.filter = Some(filter.clone());
        }

        let table = self
            .catalog
            .get(&current)
            .ok_or_else(|| Error::invalid_source(format!("table {current} is not in the catalog")))?;
        self.check_column(table, &path.column)?;

        Ok(Partial {
            hops,
            column: path.column.clone(),
            table: current,
            aggregate: None,
            prefixes,
        })
    }

    fn check_column(&self, table: &Table, column: &str) -> Result<(), Error> {
        if column == ColumnRef::ALL_COLUMNS {
            return Ok(());
        }
        table.try_column(column)?;

        Ok(())
    }
}
