use crate::{
    error::SchemaError,
    node::{Catalog, ConstraintName, QualifiedTableName, Table},
    types::ColumnType,
    validate::validate,
};
use proptest::prelude::*;
use serde_json::json;

fn names(table: &Table) -> Vec<&str> {
    table.shortest_key().iter().map(|c| c.name.as_str()).collect()
}

fn introspection_document() -> serde_json::Value {
    json!({
        "schemas": {
            "legacy": {
                "tables": {
                    "dataset": {
                        "column_definitions": [
                            {"name": "RID", "type": {"typename": "ermrest_rid", "base_type": {"typename": "text"}}, "nullok": false},
                            {"name": "id", "type": {"typename": "int4"}, "nullok": false},
                            {"name": "title", "type": {"typename": "text"}},
                            {"name": "tags", "type": {"typename": "text[]", "is_array": true, "base_type": {"typename": "text"}}},
                            {"name": "owner", "type": {"typename": "text"}}
                        ],
                        "keys": [
                            {"unique_columns": ["RID"], "names": [["legacy", "dataset_RID_key"]]},
                            {"unique_columns": ["id"], "names": [["legacy", "dataset_pkey"]]}
                        ],
                        "foreign_keys": [{
                            "foreign_key_columns": [{"schema_name": "legacy", "table_name": "dataset", "column_name": "owner"}],
                            "referenced_columns": [{"schema_name": "legacy", "table_name": "person", "column_name": "RID"}],
                            "names": [["legacy", "dataset_owner_fkey"]]
                        }],
                        "annotations": {
                            "tag:isrd.isi.edu,2016:table-display": {
                                "*": {"row_order": ["title", {"column": "id", "descending": true}]}
                            }
                        }
                    },
                    "person": {
                        "column_definitions": [
                            {"name": "RID", "type": {"typename": "text"}, "nullok": false},
                            {"name": "name", "type": {"typename": "text"}}
                        ],
                        "keys": [{"unique_columns": ["RID"], "names": [["legacy", "person_pkey"]]}]
                    }
                }
            }
        }
    })
}

#[test]
fn shortest_key_prefers_single_rid_column() {
    let table = Table::new("s", "t")
        .with_column("id", ColumnType::Int4, false)
        .with_column("RID", ColumnType::Text, false)
        .with_key("t_pkey", &["id"])
        .with_key("t_rid_key", &["RID"]);

    assert_eq!(names(&table), vec!["RID"]);
}

#[test]
fn shortest_key_prefers_fewer_columns_then_integer_columns() {
    let table = Table::new("s", "t")
        .with_column("a", ColumnType::Text, false)
        .with_column("b", ColumnType::Text, false)
        .with_column("code", ColumnType::Text, false)
        .with_column("num", ColumnType::Serial4, false)
        .with_key("t_ab_key", &["a", "b"])
        .with_key("t_code_key", &["code"])
        .with_key("t_num_key", &["num"]);

    assert_eq!(names(&table), vec!["num"]);
}

#[test]
fn shortest_key_ignores_nullable_keys_when_a_not_null_key_exists() {
    let table = Table::new("s", "t")
        .with_column("maybe", ColumnType::Int4, true)
        .with_column("a", ColumnType::Text, false)
        .with_column("b", ColumnType::Text, false)
        .with_key("t_maybe_key", &["maybe"])
        .with_key("t_ab_key", &["a", "b"]);

    assert_eq!(names(&table), vec!["a", "b"]);
}

#[test]
fn shortest_key_falls_back_to_lower_positions_then_declaration_order() {
    let table = Table::new("s", "t")
        .with_column("x", ColumnType::Text, false)
        .with_column("y", ColumnType::Text, false)
        .with_key("t_y_key", &["y"])
        .with_key("t_x_key", &["x"]);

    assert_eq!(names(&table), vec!["x"]);
}

#[test]
fn shortest_key_without_keys_is_every_sortable_column() {
    let table = Table::new("s", "t")
        .with_column("x", ColumnType::Text, true)
        .with_column("doc", ColumnType::Jsonb, true)
        .with_column("y", ColumnType::Int4, true);

    assert_eq!(names(&table), vec!["x", "y"]);
}

#[test]
fn bare_table_name_must_be_unique_across_schemas() {
    let catalog = Catalog::new(
        "1",
        [Table::new("a", "thing"), Table::new("b", "thing"), Table::new("a", "other")],
    );

    assert!(catalog.table(None, "other").is_ok());
    assert!(catalog.table(Some("b"), "thing").is_ok());

    let err = catalog
        .table(None, "thing")
        .expect_err("duplicated bare table name should be ambiguous");
    assert!(matches!(err, SchemaError::AmbiguousTable { ref schemas, .. } if schemas.len() == 2));

    let err = catalog
        .table(Some("a"), "missing")
        .expect_err("unknown table should fail");
    assert!(matches!(err, SchemaError::TableNotFound { .. }));
}

#[test]
fn introspection_document_loads_types_keys_and_annotations() {
    let catalog = Catalog::from_introspection("1", &introspection_document())
        .expect("introspection document should load");
    let dataset = catalog
        .table(Some("legacy"), "dataset")
        .expect("dataset should exist");

    let rid = dataset.column("RID").expect("RID column should exist");
    assert_eq!(rid.column_type, ColumnType::Text);
    let tags = dataset.column("tags").expect("tags column should exist");
    assert_eq!(tags.column_type, ColumnType::Array(Box::new(ColumnType::Text)));
    assert!(dataset.column("title").is_some_and(|c| c.nullok));

    assert_eq!(names(dataset), vec!["RID"]);
    assert_eq!(dataset.row_order.len(), 2);
    assert!(dataset.row_order[1].descending);

    let fk = catalog
        .foreign_key(&ConstraintName::new("legacy", "dataset_owner_fkey"))
        .expect("constraint index should resolve the foreign key");
    assert_eq!(fk.referenced_table, QualifiedTableName::new("legacy", "person"));
    assert!(fk.is_simple());

    let inbound = catalog.inbound_foreign_keys(&QualifiedTableName::new("legacy", "person"));
    assert_eq!(inbound.len(), 1);

    validate(&catalog).expect("loaded catalog should validate");
}

#[test]
fn introspection_rejects_foreign_keys_without_names() {
    let document = json!({
        "schemas": {"s": {"tables": {"t": {
            "column_definitions": [{"name": "x", "type": {"typename": "text"}}],
            "foreign_keys": [{
                "foreign_key_columns": [{"schema_name": "s", "table_name": "t", "column_name": "x"}],
                "referenced_columns": [{"schema_name": "s", "table_name": "u", "column_name": "y"}]
            }]
        }}}}
    });

    let err = Catalog::from_introspection("1", &document)
        .expect_err("unnamed foreign key should be rejected");
    assert!(matches!(err, SchemaError::Introspection(_)));
}

#[test]
fn validation_reports_every_broken_reference() {
    let catalog = Catalog::new(
        "1",
        [
            Table::new("s", "a")
                .with_column("id", ColumnType::Int4, false)
                .with_column("b_id", ColumnType::Int4, true)
                .with_key("a_pkey", &["id", "missing"])
                .with_foreign_key("a_b_fkey", &[("b_id", "id")], ("s", "b"))
                .with_foreign_key("a_c_fkey", &[("b_id", "id")], ("s", "c")),
            Table::new("s", "b").with_column("id", ColumnType::Int4, false),
        ],
    );

    let err = validate(&catalog).expect_err("broken catalog should fail validation");
    let SchemaError::Invalid(tree) = err else {
        panic!("validation should return an error tree");
    };
    let lines = tree.flatten();

    assert!(lines.iter().any(|l| l.contains("unknown column 'missing'")));
    assert!(lines.iter().any(|l| l.contains("does not reference a key of s:b")));
    assert!(lines.iter().any(|l| l.contains("unknown table s:c")));
}

#[test]
fn foreign_keys_between_reports_direction() {
    let catalog = Catalog::new(
        "1",
        [
            Table::new("s", "a")
                .with_column("b_id", ColumnType::Int4, true)
                .with_foreign_key("a_b_fkey", &[("b_id", "id")], ("s", "b")),
            Table::new("s", "b").with_column("id", ColumnType::Int4, false),
        ],
    );
    let a = QualifiedTableName::new("s", "a");
    let b = QualifiedTableName::new("s", "b");

    let forward = catalog.foreign_keys_between(&a, &b);
    let backward = catalog.foreign_keys_between(&b, &a);

    assert!(matches!(forward.as_slice(), [(_, true)]));
    assert!(matches!(backward.as_slice(), [(_, false)]));
}

///
/// PROPERTIES
///

fn arb_key_table() -> impl Strategy<Value = Table> {
    prop::collection::vec((any::<bool>(), 1usize..3), 1..5).prop_map(|specs| {
        let mut table = Table::new("s", "t");
        for index in 0..8 {
            let ty = if index % 2 == 0 {
                ColumnType::Int4
            } else {
                ColumnType::Text
            };
            table = table.with_column(&format!("c{index}"), ty, index % 3 == 0);
        }
        for (index, (offset, width)) in specs.into_iter().enumerate() {
            let start = index + usize::from(offset);
            let cols: Vec<String> = (start..start + width).map(|i| format!("c{}", i % 8)).collect();
            let cols: Vec<&str> = cols.iter().map(String::as_str).collect();
            table = table.with_key(&format!("k{index}"), &cols);
        }

        table
    })
}

proptest! {
    #[test]
    fn shortest_key_is_always_one_of_the_declared_keys(table in arb_key_table()) {
        let chosen = names(&table);

        prop_assert!(table.keys.iter().any(|key| key.columns.iter().map(String::as_str).eq(chosen.iter().copied())));
    }
}
