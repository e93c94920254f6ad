use crate::{
    error::Error,
    obs::{self, TraceEvent},
    source::SourceSpec,
};
use ermpath_schema::node::Table;
use serde_json::Value;
use std::collections::BTreeMap;

/// Reserved sourcekey addressing the table's search box.
pub const SEARCH_BOX: &str = "search-box";

///
/// SourceDefinitions
///
/// Named sources declared on one table. Every definition depends on at
/// most one other (its sourcekey or its path prefix), so the dependency
/// graph is a set of chains. Invalid, cyclic and dangling definitions are
/// dropped when the definitions are built; the rest stay usable.
///

#[derive(Clone, Debug, Default)]
pub struct SourceDefinitions {
    sources: BTreeMap<String, SourceSpec>,
    search_columns: Vec<String>,
    rejected: BTreeMap<String, String>,
}

impl SourceDefinitions {
    /// Definitions from the table's source-definitions annotation.
    #[must_use]
    pub fn for_table(table: &Table) -> Self {
        table
            .source_definitions
            .as_ref()
            .map(Self::from_annotation)
            .unwrap_or_default()
    }

    /// Parse the annotation body: `{"sources": {...}, "search-box": {"or": [...]}}`.
    #[must_use]
    pub fn from_annotation(annotation: &Value) -> Self {
        let mut defs = Self::default();
        let Value::Object(annotation) = annotation else {
            defs.reject("sources", "source definitions must be a JSON object");
            return defs;
        };

        match annotation.get("sources") {
            Some(Value::Object(raw)) => {
                for (key, value) in raw {
                    if key == SEARCH_BOX {
                        defs.reject(key, format!("`{SEARCH_BOX}` is a reserved sourcekey"));
                        continue;
                    }
                    match SourceSpec::from_json(value) {
                        Ok(spec) => {
                            defs.sources.insert(key.clone(), spec);
                        }
                        Err(err) => defs.reject(key, err.to_string()),
                    }
                }
            }
            Some(_) => defs.reject("sources", "`sources` must be a JSON object"),
            None => {}
        }

        // dropping a key can strand the keys that depend on it
        loop {
            let broken: Vec<(String, String)> = defs
                .sources
                .keys()
                .filter_map(|key| defs.dependencies(key).err().map(|e| (key.clone(), e.to_string())))
                .collect();
            if broken.is_empty() {
                break;
            }
            for (key, reason) in broken {
                defs.sources.remove(&key);
                defs.reject(&key, reason);
            }
        }

        if let Some(search_box) = annotation.get(SEARCH_BOX) {
            match parse_search_box(search_box) {
                Ok(columns) => defs.search_columns = columns,
                Err(err) => defs.reject(SEARCH_BOX, err.to_string()),
            }
        }

        defs
    }

    /// Definitions dropped while loading, with the reason.
    #[must_use]
    pub const fn rejected(&self) -> &BTreeMap<String, String> {
        &self.rejected
    }

    fn reject(&mut self, key: &str, reason: impl Into<String>) {
        let reason = reason.into();
        obs::record(TraceEvent::SourceDropped {
            key: key.to_string(),
            reason: reason.clone(),
        });
        self.rejected.insert(key.to_string(), reason);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SourceSpec> {
        self.sources.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    /// Columns searched by the search box. Empty means every column (`*`).
    #[must_use]
    pub fn search_columns(&self) -> &[String] {
        &self.search_columns
    }

    /// `key` and every key it transitively depends on, prefix-most first.
    pub fn dependencies(&self, key: &str) -> Result<Vec<String>, Error> {
        let mut chain: Vec<String> = Vec::new();
        let mut current = key.to_string();

        loop {
            if let Some(start) = chain.iter().position(|k| *k == current) {
                let mut cycle: Vec<&str> = chain[start..].iter().map(String::as_str).collect();
                cycle.push(&current);
                return Err(Error::invalid_source(format!(
                    "cyclic source definition: {}",
                    cycle.join(" -> ")
                )));
            }

            let Some(spec) = self.sources.get(&current) else {
                return Err(match chain.last() {
                    Some(parent) => Error::invalid_source(format!(
                        "source definition `{parent}` references unknown sourcekey `{current}`"
                    )),
                    None => Error::invalid_source(format!("Given sourcekey `{current}` is not valid")),
                });
            };

            let next = spec.source.dependency().map(ToString::to_string);
            chain.push(current);
            match next {
                Some(next) => current = next,
                None => break,
            }
        }
        chain.reverse();

        Ok(chain)
    }
}

fn parse_search_box(value: &Value) -> Result<Vec<String>, Error> {
    let invalid = || Error::invalid_source("`search-box` must be {\"or\": [{\"source\": \"col\"}, ...]}");
    let Some(Value::Array(entries)) = value.get("or") else {
        return Err(invalid());
    };

    entries
        .iter()
        .map(|entry| match entry.get("source") {
            Some(Value::String(column)) => Ok(column.clone()),
            _ => Err(invalid()),
        })
        .collect()
}
