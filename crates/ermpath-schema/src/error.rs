use std::{collections::BTreeMap, fmt};
use thiserror::Error as ThisError;

///
/// SchemaError
///

#[derive(Debug, ThisError)]
pub enum SchemaError {
    #[error("table name '{table}' is ambiguous, found in schemas: {}", .schemas.join(", "))]
    AmbiguousTable { table: String, schemas: Vec<String> },

    #[error("column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    #[error("foreign key '{constraint}' not found in catalog")]
    ConstraintNotFound { constraint: String },

    #[error("malformed introspection document: {0}")]
    Introspection(String),

    #[error("catalog failed validation:\n{0}")]
    Invalid(ErrorTree),

    #[error("table '{table}' not found{}", .schema.as_ref().map(|s| format!(" in schema '{s}'")).unwrap_or_default())]
    TableNotFound {
        schema: Option<String>,
        table: String,
    },
}

impl SchemaError {
    pub fn table_not_found(schema: Option<&str>, table: impl Into<String>) -> Self {
        Self::TableNotFound {
            schema: schema.map(ToString::to_string),
            table: table.into(),
        }
    }

    pub fn column_not_found(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn introspection(message: impl Into<String>) -> Self {
        Self::Introspection(message.into())
    }
}

///
/// ErrorTree
///
/// Route-aware error accumulator. Validation passes add messages under the
/// route of the node they inspected and report every failure at once.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ErrorTree {
    messages: Vec<String>,
    children: BTreeMap<String, Self>,
}

impl ErrorTree {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
            children: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, message: impl fmt::Display) {
        self.messages.push(message.to_string());
    }

    pub fn add_at(&mut self, route: impl Into<String>, message: impl fmt::Display) {
        self.children.entry(route.into()).or_default().add(message);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.children.values().all(Self::is_empty)
    }

    /// Flatten into `route: message` lines, routes in lexical order.
    #[must_use]
    pub fn flatten(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.flatten_into("", &mut out);

        out
    }

    fn flatten_into(&self, prefix: &str, out: &mut Vec<String>) {
        for message in &self.messages {
            if prefix.is_empty() {
                out.push(message.clone());
            } else {
                out.push(format!("{prefix}: {message}"));
            }
        }
        for (route, child) in &self.children {
            let route = if prefix.is_empty() {
                route.clone()
            } else {
                format!("{prefix}.{route}")
            };
            child.flatten_into(&route, out);
        }
    }

    pub fn result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ErrorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.flatten().join("\n"))
    }
}

/// Add a formatted message to an `ErrorTree`, optionally under a route.
#[macro_export]
macro_rules! err {
    ($errs:expr, @ $route:expr, $($arg:tt)*) => {
        $errs.add_at($route, format!($($arg)*))
    };
    ($errs:expr, $($arg:tt)*) => {
        $errs.add(format!($($arg)*))
    };
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_tree_flattens_routes_in_lexical_order() {
        let mut errs = ErrorTree::new();
        err!(errs, @ "s:b", "second");
        err!(errs, @ "s:a", "first");
        err!(errs, "root");

        assert_eq!(
            errs.flatten(),
            vec![
                "root".to_string(),
                "s:a: first".to_string(),
                "s:b: second".to_string()
            ]
        );
    }

    #[test]
    fn empty_error_tree_is_ok() {
        assert!(ErrorTree::new().result().is_ok());
    }
}
