use ermpath_schema::node::{ForeignKey, Table};

/// Display name of an outbound foreign key of `table`.
///
/// Simple keys take the local column name, qualified by the referenced
/// table when the column belongs to another simple key. Composite keys take
/// the referenced table name, qualified by their sorted local columns when
/// another composite key reaches the same table.
#[must_use]
pub fn foreign_key_displayname(table: &Table, fk: &ForeignKey) -> String {
    let others = table
        .outbound_foreign_keys()
        .iter()
        .filter(|other| other.constraint != fk.constraint);

    if fk.is_simple() {
        let column = fk.from_columns().next().unwrap_or_default();
        let shared = others
            .filter(|other| other.is_simple())
            .any(|other| other.from_columns().any(|c| c == column));

        return if shared {
            format!("{} ({column})", fk.referenced_table.table)
        } else {
            column.to_string()
        };
    }

    let name = fk.referenced_table.table.clone();
    let ambiguous = others
        .filter(|other| !other.is_simple())
        .any(|other| other.referenced_table == fk.referenced_table);
    if !ambiguous {
        return name;
    }

    let mut columns: Vec<&str> = fk.from_columns().collect();
    columns.sort_unstable();

    format!("{name} ({})", columns.join(", "))
}
