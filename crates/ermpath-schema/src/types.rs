use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// ColumnFamily
///
/// Comparison family used when ordering values of a column.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum ColumnFamily {
    Boolean,
    Float,
    Integer,
    Temporal,
    Text,
    Unordered,
}

///
/// ColumnType
///
/// Declared type of a column. Domain types are reduced to their base type
/// when the catalog is loaded; unknown typenames are kept verbatim.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
#[remain::sorted]
pub enum ColumnType {
    Array(Box<Self>),
    Boolean,
    Date,
    Float4,
    Float8,
    Int2,
    Int4,
    Int8,
    Json,
    Jsonb,
    Longtext,
    Markdown,
    Numeric,
    Other(String),
    Serial2,
    Serial4,
    Serial8,
    Text,
    Timestamp,
    Timestamptz,
}

impl ColumnType {
    /// Parse an introspection typename (`int4`, `text[]`, ...).
    #[must_use]
    pub fn from_typename(typename: &str) -> Self {
        if let Some(base) = typename.strip_suffix("[]") {
            return Self::Array(Box::new(Self::from_typename(base)));
        }

        match typename {
            "boolean" => Self::Boolean,
            "date" => Self::Date,
            "float4" => Self::Float4,
            "float8" => Self::Float8,
            "int2" => Self::Int2,
            "int4" => Self::Int4,
            "int8" => Self::Int8,
            "json" => Self::Json,
            "jsonb" => Self::Jsonb,
            "longtext" => Self::Longtext,
            "markdown" => Self::Markdown,
            "numeric" => Self::Numeric,
            "serial2" => Self::Serial2,
            "serial4" => Self::Serial4,
            "serial8" => Self::Serial8,
            "text" => Self::Text,
            "timestamp" => Self::Timestamp,
            "timestamptz" => Self::Timestamptz,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn typename(&self) -> String {
        match self {
            Self::Array(inner) => format!("{}[]", inner.typename()),
            Self::Boolean => "boolean".to_string(),
            Self::Date => "date".to_string(),
            Self::Float4 => "float4".to_string(),
            Self::Float8 => "float8".to_string(),
            Self::Int2 => "int2".to_string(),
            Self::Int4 => "int4".to_string(),
            Self::Int8 => "int8".to_string(),
            Self::Json => "json".to_string(),
            Self::Jsonb => "jsonb".to_string(),
            Self::Longtext => "longtext".to_string(),
            Self::Markdown => "markdown".to_string(),
            Self::Numeric => "numeric".to_string(),
            Self::Other(name) => name.clone(),
            Self::Serial2 => "serial2".to_string(),
            Self::Serial4 => "serial4".to_string(),
            Self::Serial8 => "serial8".to_string(),
            Self::Text => "text".to_string(),
            Self::Timestamp => "timestamp".to_string(),
            Self::Timestamptz => "timestamptz".to_string(),
        }
    }

    #[must_use]
    pub const fn family(&self) -> ColumnFamily {
        match self {
            Self::Boolean => ColumnFamily::Boolean,
            Self::Date | Self::Timestamp | Self::Timestamptz => ColumnFamily::Temporal,
            Self::Float4 | Self::Float8 | Self::Numeric => ColumnFamily::Float,
            Self::Int2
            | Self::Int4
            | Self::Int8
            | Self::Serial2
            | Self::Serial4
            | Self::Serial8 => ColumnFamily::Integer,
            Self::Json | Self::Jsonb => ColumnFamily::Unordered,
            Self::Array(_) | Self::Longtext | Self::Markdown | Self::Other(_) | Self::Text => {
                ColumnFamily::Text
            }
        }
    }

    /// Whether the server accepts this column in `@sort(...)`.
    #[must_use]
    pub const fn is_sortable(&self) -> bool {
        !matches!(self, Self::Json | Self::Jsonb)
    }

    /// Integer and serial columns are preferred when picking a shortest key.
    #[must_use]
    pub const fn is_integer_like(&self) -> bool {
        matches!(self.family(), ColumnFamily::Integer)
    }
}

impl From<String> for ColumnType {
    fn from(typename: String) -> Self {
        Self::from_typename(&typename)
    }
}

impl From<ColumnType> for String {
    fn from(ty: ColumnType) -> Self {
        ty.typename()
    }
}

///
/// TESTS
///
