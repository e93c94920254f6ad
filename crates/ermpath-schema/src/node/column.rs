use crate::types::ColumnType;
use serde::{Deserialize, Serialize};

///
/// Column
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub nullok: bool,

    /// Zero-based declaration position within the table.
    pub position: usize,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType, nullok: bool) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullok,
            position: 0,
        }
    }

    #[must_use]
    pub const fn is_sortable(&self) -> bool {
        self.column_type.is_sortable()
    }
}
