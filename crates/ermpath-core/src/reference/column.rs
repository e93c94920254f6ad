use crate::{
    compose::foreign_key_displayname,
    filter::ColumnRef,
    source::{Aggregate, Hop, SourceSpec},
};
use ermpath_schema::node::{ForeignKey, Table};

///
/// ReferenceColumn
///
/// Visible column of a reference: a plain table column, or an outbound
/// foreign key shown in place of the column it covers.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReferenceColumn {
    Column { name: String },
    ForeignKey { displayname: String, fk: ForeignKey },
}

impl ReferenceColumn {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Column { name } => name,
            Self::ForeignKey { displayname, .. } => displayname,
        }
    }

    #[must_use]
    pub const fn is_pseudo(&self) -> bool {
        matches!(self, Self::ForeignKey { .. })
    }

    /// Source reading the linked row: every column of the far table,
    /// aggregated so the join cannot multiply root rows.
    #[must_use]
    pub fn source(&self) -> SourceSpec {
        match self {
            Self::Column { name } => SourceSpec::column(name.as_str()),
            Self::ForeignKey { fk, .. } => SourceSpec::path(
                vec![Hop::outbound(fk.constraint.clone())],
                ColumnRef::ALL_COLUMNS,
            )
            .with_aggregate(Aggregate::ArrayDistinct),
        }
    }
}

/// Visible columns of `table` in column order. A column covered by simple
/// foreign keys is replaced by them; composite keys follow at the end.
pub(super) fn columns(table: &Table) -> Vec<ReferenceColumn> {
    let fks = table.outbound_foreign_keys();
    let mut columns = Vec::new();

    for column in &table.columns {
        let simple: Vec<&ForeignKey> = fks
            .iter()
            .filter(|fk| fk.is_simple() && fk.from_columns().next() == Some(column.name.as_str()))
            .collect();

        if simple.is_empty() {
            columns.push(ReferenceColumn::Column {
                name: column.name.clone(),
            });
        }
        columns.extend(simple.into_iter().map(|fk| foreign_key_column(table, fk)));
    }

    columns.extend(
        fks.iter()
            .filter(|fk| !fk.is_simple())
            .map(|fk| foreign_key_column(table, fk)),
    );

    columns
}

fn foreign_key_column(table: &Table, fk: &ForeignKey) -> ReferenceColumn {
    ReferenceColumn::ForeignKey {
        displayname: foreign_key_displayname(table, fk),
        fk: fk.clone(),
    }
}
