//! Path/alias composer.
//!
//! Requested sources are canonicalized, merged into a trie of foreign-key
//! hops, and emitted as one join path in which shared prefixes are walked
//! once. Aliases are assigned in canonical depth-first order, so the same
//! logical request always yields the same path.

mod display;
mod trie;

#[cfg(test)]
mod tests;

use crate::{
    config::Config,
    error::Error,
    filter::ColumnRef,
    obs::{self, TraceEvent},
    source::{Aggregate, Direction, ResolvedSource},
};
use ermpath_schema::node::Table;
use std::{collections::BTreeMap, fmt};

pub use display::foreign_key_displayname;

/// Alias of the root table in every composed path.
pub const ROOT_ALIAS: &str = "M";

///
/// Projection
///
/// One output column of an attribute or attributegroup request.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Projection {
    pub name: String,
    pub alias: String,
    pub column: String,
    pub aggregate: Option<Aggregate>,
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let column = ColumnRef::qualified(self.alias.as_str(), self.column.as_str());
        let name = crate::encode::component(&self.name);

        match self.aggregate {
            Some(aggregate) => write!(f, "{name}:={aggregate}({column})"),
            None => write!(f, "{name}:={column}"),
        }
    }
}

///
/// ComposedPath
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ComposedPath {
    /// Join segments relative to the root alias, ending back at `$M`.
    /// Empty when no source needs a join.
    pub path: String,

    /// Canonical source (and sourcekey) to the alias its column is read from.
    pub alias_map: BTreeMap<String, String>,

    /// One projection per distinct source, in canonical order.
    pub projections: Vec<Projection>,

    pub joins: usize,
}

impl ComposedPath {
    #[must_use]
    pub fn alias_for(&self, key: &str) -> Option<&str> {
        self.alias_map.get(key).map(String::as_str)
    }
}

/// Compose one join path for `sources`, all rooted at `root`.
pub fn compose_path(
    root: &Table,
    sources: &[ResolvedSource],
    config: &Config,
) -> Result<ComposedPath, Error> {
    let root_name = root.qualified_name();
    for source in sources {
        if let Some(first) = source.hops.first() {
            let from = match first.direction {
                Direction::Outbound => &first.fk.table,
                Direction::Inbound => &first.fk.referenced_table,
            };
            if *from != root_name {
                return Err(Error::invalid_source(format!(
                    "source `{}` does not start at {root_name}",
                    source.canonical()
                )));
            }
        }
    }

    // every use counts, before deduplication
    let mut key_uses: BTreeMap<&str, usize> = BTreeMap::new();
    for source in sources {
        for (key, _) in &source.prefixes {
            *key_uses.entry(key.as_str()).or_default() += 1;
        }
    }

    let mut distinct: Vec<&ResolvedSource> = sources.iter().collect();
    distinct.sort_by_cached_key(|s| s.canonical());
    distinct.dedup_by_key(|s| s.canonical());

    let mut trie = trie::HopTrie::default();
    for source in &distinct {
        trie.insert(source, &key_uses, config);
    }
    let emitted = trie.emit();

    let mut composed = ComposedPath {
        path: emitted.segments.join("/"),
        joins: emitted.joins,
        ..ComposedPath::default()
    };

    for source in distinct {
        let alias = trie
            .alias_at(&source.hops)
            .unwrap_or_else(|| ROOT_ALIAS.to_string());

        composed.alias_map.insert(source.canonical(), alias.clone());
        if let Some(key) = &source.key {
            composed.alias_map.insert(key.clone(), alias.clone());
        }
        for (key, len) in &source.prefixes {
            if let Some(prefix_alias) = trie.alias_at(&source.hops[..*len]) {
                composed.alias_map.entry(key.clone()).or_insert(prefix_alias);
            }
        }

        composed.projections.push(Projection {
            name: source.name(),
            alias,
            column: source.column.clone(),
            aggregate: source.aggregate,
        });
    }

    obs::record(TraceEvent::PathComposed {
        joins: composed.joins,
        aliases: emitted.aliases,
    });

    Ok(composed)
}
