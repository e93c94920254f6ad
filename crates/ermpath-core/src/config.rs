use crate::{compose::ROOT_ALIAS, error::Error};
use serde::Deserialize;
use std::collections::BTreeMap;

///
/// Config
///
/// Composer and parser settings. Everything is optional in TOML; missing
/// keys take the defaults below.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Sourcekey to join alias overrides.
    pub forced_aliases: BTreeMap<String, String>,

    /// Shortcut a path whose last simple hop only reaches the referenced
    /// key column into a filter on the local column.
    pub fast_filter: bool,

    /// Capacity of each memoization cache. Zero disables caching.
    pub cache_capacity: usize,

    /// Render multi-term searches with the `all(...)` list syntax.
    pub quantified_search: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            forced_aliases: BTreeMap::new(),
            fast_filter: true,
            cache_capacity: 256,
            quantified_search: false,
        }
    }
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(source).map_err(|e| Error::config(e.to_string()))?;
        config.validate()?;

        Ok(config)
    }

    #[must_use]
    pub fn with_forced_alias(mut self, sourcekey: impl Into<String>, alias: impl Into<String>) -> Self {
        self.forced_aliases.insert(sourcekey.into(), alias.into());
        self
    }

    #[must_use]
    pub const fn with_fast_filter(mut self, fast_filter: bool) -> Self {
        self.fast_filter = fast_filter;
        self
    }

    #[must_use]
    pub const fn with_quantified_search(mut self, quantified_search: bool) -> Self {
        self.quantified_search = quantified_search;
        self
    }

    /// Forced aliases must be plain identifiers that cannot collide with
    /// the root alias or generated join aliases, and must be distinct.
    pub fn validate(&self) -> Result<(), Error> {
        let mut seen = BTreeMap::new();

        for (key, alias) in &self.forced_aliases {
            if alias.is_empty() || !alias.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(Error::config(format!(
                    "forced alias `{alias}` for `{key}` must be a non-empty identifier"
                )));
            }
            if alias == ROOT_ALIAS || is_generated_alias(alias) {
                return Err(Error::config(format!(
                    "forced alias `{alias}` for `{key}` is reserved"
                )));
            }
            if let Some(other) = seen.insert(alias.as_str(), key.as_str()) {
                return Err(Error::config(format!(
                    "forced alias `{alias}` is used by both `{other}` and `{key}`"
                )));
            }
        }

        Ok(())
    }
}

// `F` followed by digits.
fn is_generated_alias(alias: &str) -> bool {
    alias
        .strip_prefix('F')
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

///
/// TESTS
///
