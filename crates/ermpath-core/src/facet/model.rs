use crate::source::SEARCH_BOX;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

///
/// Facets
///
/// Conjunction of per-source constraints. Only `and` is supported.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Facets {
    pub and: Vec<FacetTerm>,
}

impl Facets {
    #[must_use]
    pub const fn new(and: Vec<FacetTerm>) -> Self {
        Self { and }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.and.is_empty()
    }

    /// The search-box term, if one is set.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.and
            .iter()
            .filter(|term| term.sourcekey.as_deref() == Some(SEARCH_BOX))
            .find_map(|term| term.search.as_ref()?.first()?.as_str())
    }

    /// Copy with the search-box term replaced (or removed with `None`).
    #[must_use]
    pub fn with_search_term(&self, term: Option<&str>) -> Self {
        let mut and: Vec<FacetTerm> = self
            .and
            .iter()
            .filter(|t| t.sourcekey.as_deref() != Some(SEARCH_BOX))
            .cloned()
            .collect();

        if let Some(term) = term.filter(|t| !t.trim().is_empty()) {
            and.push(FacetTerm {
                sourcekey: Some(SEARCH_BOX.to_string()),
                search: Some(vec![Value::String(term.to_string())]),
                ..FacetTerm::default()
            });
        }

        Self { and }
    }
}

///
/// FacetTerm
///
/// One source plus any of its constraint kinds. Keys this crate does not
/// interpret (`markdown_name`, `hidden`, ...) are kept in `extra`.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct FacetTerm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sourcekey: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranges: Option<Vec<FacetRange>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_null: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FacetTerm {
    pub fn choices(column: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            source: Some(Value::String(column.into())),
            choices: Some(values),
            ..Self::default()
        }
    }

    pub fn ranges(column: impl Into<String>, ranges: Vec<FacetRange>) -> Self {
        Self {
            source: Some(Value::String(column.into())),
            ranges: Some(ranges),
            ..Self::default()
        }
    }

    pub fn search(column: impl Into<String>, terms: Vec<Value>) -> Self {
        Self {
            source: Some(Value::String(column.into())),
            search: Some(terms),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: Value) -> Self {
        self.source = Some(source);
        self
    }

    /// Whether a `null` choice is present.
    #[must_use]
    pub fn has_null_choice(&self) -> bool {
        self.choices
            .as_ref()
            .is_some_and(|choices| choices.iter().any(Value::is_null))
    }
}

///
/// FacetRange
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct FacetRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Value>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub min_exclusive: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub max_exclusive: bool,
}

impl FacetRange {
    #[must_use]
    pub const fn between(min: Option<Value>, max: Option<Value>) -> Self {
        Self {
            min,
            max,
            min_exclusive: false,
            max_exclusive: false,
        }
    }
}
