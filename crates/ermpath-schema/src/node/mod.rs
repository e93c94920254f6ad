mod catalog;
mod column;
mod constraint;
mod table;

#[cfg(test)]
mod tests;

pub use catalog::Catalog;
pub use column::Column;
pub use constraint::{ColumnMapping, ConstraintName, ForeignKey, Key, QualifiedTableName};
pub use table::{RowOrder, Table};
