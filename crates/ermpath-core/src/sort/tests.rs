use crate::{
    error::Error,
    sort::{
        PageCursor, PageDirection, SortKey, SortSpec, compare_rows, effective_sort,
        validate_paging,
    },
    test_support::{catalog, dataset_table},
};
use ermpath_schema::{node::Table, types::ColumnType};
use proptest::prelude::*;
use serde_json::{Map, Value, json};
use std::cmp::Ordering;

fn spec(keys: &[(&str, bool)]) -> SortSpec {
    keys.iter()
        .map(|(column, descending)| SortKey {
            column: (*column).to_string(),
            descending: *descending,
        })
        .collect()
}

fn row(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture row should be an object, got {other}"),
    }
}

fn category_table() -> Table {
    catalog()
        .table(Some("s"), "category")
        .expect("category fixture should exist")
        .clone()
}

fn sort_message(err: &Error) -> &str {
    match err {
        Error::InvalidSortCriteria { message, .. } => message,
        other => panic!("expected a sort error, got {other:?}"),
    }
}

#[test]
fn composite_sort_appends_the_integer_shortest_key() {
    let effective = effective_sort(&category_table(), &spec(&[("name", false)]))
        .expect("name should be sortable");

    assert_eq!(effective.to_modifier(), "@sort(name,id)");

    let cursor = PageCursor::from_row(
        PageDirection::After,
        &effective,
        &row(json!({"id": 7, "name": "b c"})),
    );
    assert_eq!(cursor.to_modifier(), "@after(b%20c,7)");

    let decoded = PageCursor::parse(PageDirection::After, "b%20c,7").expect("cursor should parse");
    assert_eq!(decoded.values, vec![json!("b c"), json!("7")]);
    decoded
        .check_arity(&effective)
        .expect("cursor should match the effective sort");
}

#[test]
fn empty_request_falls_back_to_row_order_then_key() {
    let effective =
        effective_sort(&dataset_table(), &SortSpec::default()).expect("default should resolve");

    assert_eq!(*effective, vec![SortKey::asc("title"), SortKey::asc("id")]);
}

#[test]
fn keyless_table_sort_skips_json_columns() {
    let table = Table::new("s", "log")
        .with_column("at", ColumnType::Timestamptz, true)
        .with_column("payload", ColumnType::Json, true)
        .with_column("extra", ColumnType::Jsonb, true);

    let effective = effective_sort(&table, &SortSpec::default()).expect("default should resolve");
    assert_eq!(*effective, vec![SortKey::asc("at")]);
}

#[test]
fn repeated_columns_keep_their_first_direction() {
    let effective = effective_sort(
        &dataset_table(),
        &spec(&[("title", true), ("title", false), ("id", true)]),
    )
    .expect("sort should resolve");

    assert_eq!(*effective, vec![SortKey::desc("title"), SortKey::desc("id")]);
}

#[test]
fn unknown_and_unsortable_columns_are_rejected() {
    let unknown = effective_sort(&dataset_table(), &spec(&[("nope", false)]))
        .expect_err("unknown column should fail");
    assert_eq!(
        sort_message(&unknown),
        "Given column name `nope` in sort is not valid."
    );

    let json = effective_sort(&dataset_table(), &spec(&[("meta", false)]))
        .expect_err("jsonb column should fail");
    assert_eq!(sort_message(&json), "Column meta is not sortable.");
}

#[test]
fn sort_modifier_parses_directions_and_encoded_names() {
    let parsed = SortSpec::parse("a%20b,c::desc::").expect("modifier should parse");

    assert_eq!(*parsed, vec![SortKey::asc("a b"), SortKey::desc("c")]);
    assert_eq!(parsed.to_modifier(), "@sort(a%20b,c::desc::)");
    assert!(SortSpec::parse("").expect("empty sort is legal").is_empty());
    assert_eq!(SortSpec::default().to_modifier(), "");
}

#[test]
fn sort_modifier_with_empty_or_unknown_tokens_is_rejected() {
    for inner in ["a,,b", "a::asc::", ","] {
        let err = SortSpec::parse(inner).expect_err("bad modifier should fail");
        assert!(matches!(err, Error::InvalidSortCriteria { .. }), "{inner}");
    }
}

#[test]
fn paging_requires_a_sort_and_a_single_direction() {
    let before = PageCursor::new(PageDirection::Before, vec![json!("a")]);
    let after = PageCursor::new(PageDirection::After, vec![json!("b")]);
    let sort = spec(&[("title", false)]);

    let err = validate_paging(&SortSpec::default(), None, Some(&after))
        .expect_err("paging without sort should fail");
    assert!(matches!(err, Error::InvalidPageCriteria { .. }));

    let err = validate_paging(&sort, Some(&before), Some(&after))
        .expect_err("both directions should fail");
    assert!(matches!(err, Error::InvalidPageCriteria { .. }));

    validate_paging(&sort, None, Some(&after)).expect("one direction should pass");
    validate_paging(&SortSpec::default(), None, None).expect("no paging needs no sort");
}

#[test]
fn cursor_arity_must_match_the_sort() {
    let cursor = PageCursor::new(PageDirection::After, vec![json!("a")]);
    let err = cursor
        .check_arity(&spec(&[("title", false), ("id", false)]))
        .expect_err("short cursor should fail");

    assert_eq!(
        err.to_string(),
        "sort and after should have the same number of columns."
    );
}

#[test]
fn null_cursor_values_use_the_null_token() {
    let cursor = PageCursor::parse(PageDirection::Before, "::null::,x%2Cy")
        .expect("cursor should parse");

    assert_eq!(cursor.values, vec![Value::Null, json!("x,y")]);
    assert_eq!(cursor.to_modifier(), "@before(::null::,x%2Cy)");
    assert!(PageCursor::parse(PageDirection::Before, "").is_err());
}

#[test]
fn rows_compare_by_column_family() {
    let table = dataset_table();
    let by = |column: &str, a: Value, b: Value| {
        compare_rows(
            &table,
            &spec(&[(column, false)]),
            &row(json!({ column: a })),
            &row(json!({ column: b })),
        )
    };

    assert_eq!(by("id", json!("10"), json!(9)), Ordering::Greater);
    assert_eq!(by("title", json!("Zed"), json!("apple")), Ordering::Less);
    assert_eq!(
        by(
            "created",
            json!("2024-01-01T10:00:00+02:00"),
            json!("2024-01-01 09:00:00+00")
        ),
        Ordering::Less
    );
    assert_eq!(by("title", Value::Null, json!("a")), Ordering::Less);
}

#[test]
fn descending_keys_reverse_the_comparison_including_nulls() {
    let table = dataset_table();
    let sort = spec(&[("title", true)]);

    assert_eq!(
        compare_rows(
            &table,
            &sort,
            &row(json!({"title": null})),
            &row(json!({"title": "a"}))
        ),
        Ordering::Greater
    );
}

fn arb_sort() -> impl Strategy<Value = SortSpec> {
    let columns = prop_oneof![
        Just("id"),
        Just("title"),
        Just("category"),
        Just("owner"),
        Just("created"),
    ];

    prop::collection::vec((columns, any::<bool>()), 0..6).prop_map(|keys| {
        keys.into_iter()
            .map(|(column, descending)| SortKey {
                column: column.to_string(),
                descending,
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn effective_sort_is_idempotent(requested in arb_sort()) {
        let table = dataset_table();
        let once = effective_sort(&table, &requested).expect("fixture columns are sortable");
        let twice = effective_sort(&table, &once).expect("effective sort should re-resolve");

        prop_assert_eq!(once, twice);
    }

    #[test]
    fn rows_tied_on_the_request_are_ordered_by_key(
        requested in arb_sort(),
        a in 0i64..1000,
        b in 0i64..1000,
    ) {
        prop_assume!(a != b);
        prop_assume!(!requested.contains("id"));

        let table = dataset_table();
        let effective = effective_sort(&table, &requested).expect("fixture columns are sortable");
        let shared = json!({"title": "t", "category": 1, "owner": "o", "created": "2024-01-01"});
        let mut left = row(shared.clone());
        let mut right = row(shared);
        left.insert("id".to_string(), json!(a));
        right.insert("id".to_string(), json!(b));

        prop_assert_eq!(compare_rows(&table, &effective, &left, &right), a.cmp(&b));
    }
}
