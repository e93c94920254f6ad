//! Closed error taxonomy. Every parse or validation failure carries a
//! stable status tag and, where the offending span is known, a redirect
//! path with that span removed.

mod redirect;

#[cfg(test)]
mod tests;

use derive_more::Display;
use ermpath_schema::error::SchemaError;
use thiserror::Error as ThisError;

///
/// ErrorStatus
///
/// Machine-stable status tag surfaced to consuming UIs.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum ErrorStatus {
    #[display("Configuration Error")]
    Config,
    #[display("Invalid Facet Filters")]
    InvalidFacet,
    #[display("Invalid Filter")]
    InvalidFilter,
    #[display("Invalid Input")]
    InvalidInput,
    #[display("Invalid Page Criteria")]
    InvalidPage,
    #[display("Invalid Sort Criteria")]
    InvalidSort,
    #[display("Invalid Source Definition")]
    InvalidSource,
    #[display("Invalid URI")]
    InvalidUri,
    #[display("Request Error")]
    Request,
    #[display("Schema Error")]
    Schema,
}

///
/// Error
///

#[derive(Debug, ThisError)]
#[remain::sorted]
pub enum Error {
    #[error("{message}")]
    Config { message: String },

    #[error("{message}")]
    InvalidFacetOperator {
        message: String,
        redirect_path: Option<String>,
    },

    #[error("{message}")]
    InvalidFilterOperator {
        message: String,
        redirect_path: Option<String>,
    },

    #[error("{message}")]
    InvalidInput { message: String },

    #[error("{message}")]
    InvalidPageCriteria {
        message: String,
        redirect_path: Option<String>,
    },

    #[error("{message}")]
    InvalidSortCriteria {
        message: String,
        redirect_path: Option<String>,
    },

    #[error("{message}")]
    InvalidSource { message: String },

    #[error("{message}")]
    MalformedUri { message: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("request failed with status {status}: {message}")]
    Transport { status: u16, message: String },
}

impl Error {
    pub fn malformed_uri(message: impl Into<String>) -> Self {
        Self::MalformedUri {
            message: message.into(),
        }
    }

    /// Filter error. The redirect removes `bad_span` when it occurs in
    /// `path`, otherwise keeps only the part before the first `/`.
    pub fn invalid_filter(
        message: impl Into<String>,
        path: Option<&str>,
        bad_span: Option<&str>,
    ) -> Self {
        Self::InvalidFilterOperator {
            message: message.into(),
            redirect_path: path.map(|p| redirect::strip_filter(p, bad_span)),
        }
    }

    pub fn invalid_facet(message: impl Into<String>, path: Option<&str>) -> Self {
        Self::InvalidFacetOperator {
            message: message.into(),
            redirect_path: path.map(redirect::strip_facets),
        }
    }

    pub fn invalid_sort(message: impl Into<String>, path: Option<&str>) -> Self {
        Self::InvalidSortCriteria {
            message: message.into(),
            redirect_path: path.map(|p| redirect::strip_paging(&redirect::strip_sort(p))),
        }
    }

    pub fn invalid_page(message: impl Into<String>, path: Option<&str>) -> Self {
        Self::InvalidPageCriteria {
            message: message.into(),
            redirect_path: path.map(redirect::strip_paging),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn invalid_source(message: impl Into<String>) -> Self {
        Self::InvalidSource {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn transport(status: u16, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn status(&self) -> ErrorStatus {
        match self {
            Self::Config { .. } => ErrorStatus::Config,
            Self::InvalidFacetOperator { .. } => ErrorStatus::InvalidFacet,
            Self::InvalidFilterOperator { .. } => ErrorStatus::InvalidFilter,
            Self::InvalidInput { .. } => ErrorStatus::InvalidInput,
            Self::InvalidPageCriteria { .. } => ErrorStatus::InvalidPage,
            Self::InvalidSortCriteria { .. } => ErrorStatus::InvalidSort,
            Self::InvalidSource { .. } => ErrorStatus::InvalidSource,
            Self::MalformedUri { .. } => ErrorStatus::InvalidUri,
            Self::Schema(_) => ErrorStatus::Schema,
            Self::Transport { .. } => ErrorStatus::Request,
        }
    }

    /// Path to the last valid state, with the offending span removed.
    #[must_use]
    pub fn redirect_path(&self) -> Option<&str> {
        match self {
            Self::InvalidFacetOperator { redirect_path, .. }
            | Self::InvalidFilterOperator { redirect_path, .. }
            | Self::InvalidPageCriteria { redirect_path, .. }
            | Self::InvalidSortCriteria { redirect_path, .. } => redirect_path.as_deref(),
            _ => None,
        }
    }

    /// Attach the offending path to a filter or facet error raised before
    /// the caller knew where the segment came from.
    #[must_use]
    pub(crate) fn with_path(self, path: &str, bad_span: Option<&str>) -> Self {
        match self {
            Self::InvalidFilterOperator {
                message,
                redirect_path: None,
            } => Self::invalid_filter(message, Some(path), bad_span),
            Self::InvalidFacetOperator {
                message,
                redirect_path: None,
            } => Self::invalid_facet(message, Some(path)),
            Self::InvalidSortCriteria {
                message,
                redirect_path: None,
            } => Self::invalid_sort(message, Some(path)),
            Self::InvalidPageCriteria {
                message,
                redirect_path: None,
            } => Self::invalid_page(message, Some(path)),
            other => other,
        }
    }
}
