use crate::encode;
use std::fmt;

///
/// Filter AST
///
/// Schema-agnostic representation of a path filter segment. Column names
/// are not checked against a table here; binding happens when a reference
/// renders its request path.
///

///
/// Operator
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[remain::sorted]
pub enum Operator {
    CiRegexp,
    Equal,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    Null,
    Regexp,
    TextSearch,
}

impl Operator {
    /// Every operator, in canonical order.
    pub const ALL: [Self; 9] = [
        Self::Equal,
        Self::Greater,
        Self::GreaterOrEqual,
        Self::Less,
        Self::LessOrEqual,
        Self::Regexp,
        Self::CiRegexp,
        Self::TextSearch,
        Self::Null,
    ];

    /// Wire token, including the surrounding `::`.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::CiRegexp => "::ciregexp::",
            Self::Equal => "=",
            Self::Greater => "::gt::",
            Self::GreaterOrEqual => "::geq::",
            Self::Less => "::lt::",
            Self::LessOrEqual => "::leq::",
            Self::Null => "::null::",
            Self::Regexp => "::regexp::",
            Self::TextSearch => "::ts::",
        }
    }

    /// Resolve the name between `::` delimiters. `ge`/`le` are accepted
    /// spellings of `geq`/`leq`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ciregexp" => Some(Self::CiRegexp),
            "ge" | "geq" => Some(Self::GreaterOrEqual),
            "gt" => Some(Self::Greater),
            "le" | "leq" => Some(Self::LessOrEqual),
            "lt" => Some(Self::Less),
            "null" => Some(Self::Null),
            "regexp" => Some(Self::Regexp),
            "ts" => Some(Self::TextSearch),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_unary(self) -> bool {
        matches!(self, Self::Null)
    }
}

///
/// ColumnRef
///
/// Column name with an optional table alias (`A:col`). The name `*`
/// addresses the whole row and is never encoded.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ColumnRef {
    pub alias: Option<String>,
    pub name: String,
}

impl ColumnRef {
    pub const ALL_COLUMNS: &'static str = "*";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            alias: None,
            name: name.into(),
        }
    }

    pub fn qualified(alias: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            name: name.into(),
        }
    }

    #[must_use]
    pub fn all_columns() -> Self {
        Self::new(Self::ALL_COLUMNS)
    }

    #[must_use]
    pub fn is_all_columns(&self) -> bool {
        self.name == Self::ALL_COLUMNS
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(alias) = &self.alias {
            write!(f, "{}:", encode::component(alias))?;
        }
        if self.is_all_columns() {
            f.write_str(Self::ALL_COLUMNS)
        } else {
            f.write_str(&encode::component(&self.name))
        }
    }
}

///
/// BinaryPredicate
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct BinaryPredicate {
    pub column: ColumnRef,
    pub operator: Operator,
    pub value: String,
}

///
/// UnaryPredicate
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct UnaryPredicate {
    pub column: ColumnRef,
    pub operator: Operator,
}

///
/// FilterNode
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum FilterNode {
    Binary(BinaryPredicate),
    Unary(UnaryPredicate),
    Negation(Box<Self>),
    Conjunction(Vec<Self>),
    Disjunction(Vec<Self>),
}

impl FilterNode {
    /// Predicate constructor. Unary operators drop the value.
    pub fn predicate(column: ColumnRef, operator: Operator, value: impl Into<String>) -> Self {
        if operator.is_unary() {
            Self::Unary(UnaryPredicate { column, operator })
        } else {
            Self::Binary(BinaryPredicate {
                column,
                operator,
                value: value.into(),
            })
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::predicate(ColumnRef::new(column), Operator::Equal, value)
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self::predicate(ColumnRef::new(column), Operator::Null, "")
    }

    /// Conjunction of `nodes`; a single node is returned as-is.
    #[must_use]
    pub fn and(mut nodes: Vec<Self>) -> Self {
        if nodes.len() == 1 {
            nodes.remove(0)
        } else {
            Self::Conjunction(nodes)
        }
    }

    /// Disjunction of `nodes`; a single node is returned as-is.
    #[must_use]
    pub fn or(mut nodes: Vec<Self>) -> Self {
        if nodes.len() == 1 {
            nodes.remove(0)
        } else {
            Self::Disjunction(nodes)
        }
    }

    #[must_use]
    pub fn not(node: Self) -> Self {
        Self::Negation(Box::new(node))
    }

    #[must_use]
    pub const fn is_compound(&self) -> bool {
        matches!(self, Self::Conjunction(_) | Self::Disjunction(_))
    }

    /// Canonical path encoding.
    #[must_use]
    pub fn to_uri(&self) -> String {
        self.to_string()
    }

    fn write_child(f: &mut fmt::Formatter<'_>, child: &Self) -> fmt::Result {
        if child.is_compound() {
            write!(f, "({child})")
        } else {
            write!(f, "{child}")
        }
    }

    fn write_joined(f: &mut fmt::Formatter<'_>, nodes: &[Self], separator: char) -> fmt::Result {
        for (index, node) in nodes.iter().enumerate() {
            if index > 0 {
                write!(f, "{separator}")?;
            }
            Self::write_child(f, node)?;
        }

        Ok(())
    }
}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary(p) => write!(
                f,
                "{}{}{}",
                p.column,
                p.operator.token(),
                encode::component(&p.value)
            ),
            Self::Unary(p) => write!(f, "{}{}", p.column, p.operator.token()),
            Self::Negation(inner) => write!(f, "!({inner})"),
            Self::Conjunction(nodes) => Self::write_joined(f, nodes, '&'),
            Self::Disjunction(nodes) => Self::write_joined(f, nodes, ';'),
        }
    }
}
