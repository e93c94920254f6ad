//! Staged structural validation of a loaded catalog.

use crate::{
    err,
    error::{ErrorTree, SchemaError},
    node::{Catalog, ForeignKey, Table},
};
use std::collections::BTreeSet;

/// Run full catalog validation and report every failure at once.
pub fn validate(catalog: &Catalog) -> Result<(), SchemaError> {
    // Phase 1: table-local invariants.
    let mut errors = ErrorTree::new();
    for table in catalog.tables() {
        validate_table(table, &mut errors);
    }

    // Phase 2: cross-table invariants.
    for table in catalog.tables() {
        for fk in &table.foreign_keys {
            validate_reference(catalog, table, fk, &mut errors);
        }
    }
    validate_unique_constraints(catalog, &mut errors);

    errors.result().map_err(SchemaError::Invalid)
}

fn validate_table(table: &Table, errs: &mut ErrorTree) {
    let route = table.qualified_name().to_string();

    let mut seen = BTreeSet::new();
    for column in &table.columns {
        if !seen.insert(column.name.as_str()) {
            err!(errs, @ route.clone(), "duplicate column '{}'", column.name);
        }
    }

    for key in &table.keys {
        if key.columns.is_empty() {
            err!(errs, @ route.clone(), "key {} has no columns", key.constraint);
        }
        for column in &key.columns {
            if table.column(column).is_none() {
                err!(errs, @ route.clone(), "key {} uses unknown column '{column}'", key.constraint);
            }
        }
    }

    for fk in &table.foreign_keys {
        for from in fk.from_columns() {
            if table.column(from).is_none() {
                err!(errs, @ route.clone(), "foreign key {} uses unknown column '{from}'", fk.constraint);
            }
        }
    }
}

fn validate_reference(catalog: &Catalog, table: &Table, fk: &ForeignKey, errs: &mut ErrorTree) {
    let route = table.qualified_name().to_string();

    let Some(target) = catalog.get(&fk.referenced_table) else {
        err!(
            errs, @ route,
            "foreign key {} references unknown table {}",
            fk.constraint, fk.referenced_table
        );
        return;
    };

    let to: Vec<&str> = fk.to_columns().collect();
    for column in &to {
        if target.column(column).is_none() {
            err!(
                errs, @ route.clone(),
                "foreign key {} references unknown column {}:{column}",
                fk.constraint, fk.referenced_table
            );
        }
    }

    let forms_key = target
        .keys
        .iter()
        .any(|key| key.columns.len() == to.len() && key.covers(&to));
    if !forms_key {
        err!(
            errs, @ route,
            "foreign key {} does not reference a key of {}",
            fk.constraint, fk.referenced_table
        );
    }
}

fn validate_unique_constraints(catalog: &Catalog, errs: &mut ErrorTree) {
    let declared: usize = catalog.tables().map(|t| t.foreign_keys.len()).sum();

    if declared != catalog.constraint_count() {
        let mut seen = BTreeSet::new();
        for fk in catalog.tables().flat_map(|t| t.foreign_keys.iter()) {
            if !seen.insert(&fk.constraint) {
                err!(errs, "duplicate foreign key constraint name {}", fk.constraint);
            }
        }
    }
}
