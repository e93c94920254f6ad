use crate::{
    error::Error,
    filter::FilterNode,
    location::{DUPLICATE_FACETS, Location},
    obs::{TraceEvent, TraceSink, with_sink},
    reference::Interface,
    sort::{PageCursor, PageDirection, SortKey, SortSpec},
};
use serde_json::json;
use std::{cell::RefCell, rc::Rc};

fn parse(uri: &str) -> Location {
    Location::parse(uri)
        .expect("uri should parse")
        .expect("uri should name a location")
}

#[test]
fn bare_path_with_equality_filter() {
    let location = Location::from_path("1", "legacy:dataset/id=123").expect("path should parse");

    assert_eq!(location.schema_name(), Some("legacy"));
    assert_eq!(location.table_name(), "dataset");
    assert_eq!(location.filter(), Some(&FilterNode::eq("id", "123")));
    assert!(location.sort().is_empty());
    assert!(location.paging().is_none());
}

#[test]
fn service_uri_keeps_every_part_and_round_trips() {
    let uri = "https://example.org/ermrest/catalog/1@2TA-XYZ/attributegroup/s:dataset/\
               title=a%20b@sort(title::desc::,id)@after(x,1)?limit=25";
    let location = parse(uri);

    assert_eq!(location.service(), Some("https://example.org/ermrest"));
    assert_eq!(location.catalog(), "1");
    assert_eq!(location.snapshot(), Some("2TA-XYZ"));
    assert_eq!(location.api(), Interface::AttributeGroup);
    assert_eq!(
        **location.sort(),
        vec![SortKey::desc("title"), SortKey::asc("id")]
    );
    assert_eq!(
        location.paging(),
        Some(&PageCursor::new(
            PageDirection::After,
            vec![json!("x"), json!("1")]
        ))
    );
    assert_eq!(location.query(), Some("limit=25"));
    assert_eq!(location.uri(), uri);
}

#[test]
fn missing_api_defaults_to_entity() {
    let location = parse("https://example.org/ermrest/catalog/1/s:dataset");

    assert_eq!(location.api(), Interface::Entity);
    assert_eq!(location.compact_path(), "s:dataset");
}

#[test]
fn fragment_form_has_no_service() {
    let location = parse("https://example.org/chaise/recordset/#1/dataset/title::null::");

    assert_eq!(location.service(), None);
    assert_eq!(location.schema_name(), None);
    assert_eq!(location.table_name(), "dataset");
    assert_eq!(location.compact_path(), "dataset/title::null::");
}

#[test]
fn empty_inputs_have_no_location() {
    assert_eq!(Location::parse("").expect("empty is legal"), None);
    assert_eq!(
        Location::parse("https://example.org/chaise/#").expect("empty fragment is legal"),
        None
    );
}

#[test]
fn structurally_broken_locators_are_malformed() {
    for uri in [
        "not a locator",
        "#1/",
        "#1/a:b:c",
        "#1/s:dataset//id=1",
        "#1/s:dataset/(owner)=(s:person:name)",
        "#1/s:dataset@limit(3)",
        "#1/s:dataset@sort(id)@sort(title)",
    ] {
        let err = Location::parse(uri).expect_err("broken locator should fail");
        assert!(matches!(err, Error::MalformedUri { .. }), "{uri}: {err:?}");
    }
}

#[test]
fn empty_sort_is_legal_without_paging() {
    let location = parse("#1/s:dataset@sort()");

    assert!(location.sort().is_empty());
    assert_eq!(location.path(), "s:dataset");
}

#[test]
fn paging_without_sort_redirects_without_the_cursor() {
    let err = Location::parse("#1/s:dataset/id=1@after(3)").expect_err("paging needs sort");

    assert!(matches!(err, Error::InvalidPageCriteria { .. }));
    assert_eq!(err.redirect_path(), Some("s:dataset/id=1"));
}

#[test]
fn both_paging_directions_are_rejected() {
    let err = Location::parse("#1/s:dataset@sort(id)@before(1)@after(2)")
        .expect_err("both directions should fail");

    assert!(matches!(err, Error::InvalidPageCriteria { .. }));
    assert_eq!(err.redirect_path(), Some("s:dataset@sort(id)"));
}

#[test]
fn cursor_arity_is_left_to_binding() {
    for path in ["s:dataset@sort(title)@after(a,1)", "s:dataset@sort(title)@after(a)"] {
        let location = Location::from_path("1", path).expect("cursor arity is not checked at parse");
        assert!(location.paging().is_some(), "{path}");
    }
}

#[test]
fn bad_filter_redirect_keeps_the_rest_of_the_path() {
    let err = Location::parse("#1/s:dataset/id=1/a::bogus::b@sort(id)")
        .expect_err("unknown operator should fail");

    assert!(matches!(err, Error::InvalidFilterOperator { .. }));
    assert_eq!(err.redirect_path(), Some("s:dataset/id=1@sort(id)"));
}

#[test]
fn mixed_separators_are_rejected() {
    let err = Location::parse("#1/s:dataset/a=1&b=2;c=3").expect_err("mixed filter should fail");

    assert!(matches!(err, Error::InvalidFilterOperator { .. }));
}

#[test]
fn second_facet_segment_is_rejected() {
    let blob = parse("#1/s:dataset")
        .with_search(Some("x"))
        .expect("search should apply")
        .facet_blob()
        .expect("search should produce a blob")
        .to_string();

    let err = Location::parse(&format!("#1/s:dataset/*::facets::{blob}/*::facets::{blob}"))
        .expect_err("two facet segments should fail");

    assert!(matches!(
        err,
        Error::InvalidFacetOperator { ref message, .. } if message == DUPLICATE_FACETS
    ));
    assert_eq!(err.redirect_path(), Some("s:dataset"));
}

#[test]
fn filter_segments_are_conjoined() {
    let location = parse("#1/s:dataset/a=1/b=2");

    assert_eq!(
        location.filter(),
        Some(&FilterNode::Conjunction(vec![
            FilterNode::eq("a", "1"),
            FilterNode::eq("b", "2")
        ]))
    );
    assert_eq!(location.compact_path(), "s:dataset/a=1&b=2");
}

#[test]
fn search_is_carried_in_the_facet_blob() {
    let location = parse("#1/s:dataset/id=1")
        .with_search(Some("rna seq"))
        .expect("search should apply");

    assert_eq!(location.search_term(), Some("rna seq"));
    assert!(location.path().contains("/*::facets::"));

    let reparsed = Location::from_path("1", &location.path()).expect("path should reparse");
    assert_eq!(reparsed.search_term(), Some("rna seq"));
    assert_eq!(reparsed.filter(), location.filter());

    let cleared = location.with_search(None).expect("clearing should succeed");
    assert_eq!(cleared.facets(), None);
    assert_eq!(cleared.path(), "s:dataset/id=1");
}

#[test]
fn mutators_return_new_values_and_drop_stale_paging() {
    let base = parse("#1/s:dataset@sort(id)@after(5)");
    let resorted = base.with_sort(SortSpec::new(vec![SortKey::desc("id")]));

    assert!(base.paging().is_some());
    assert!(resorted.paging().is_none());
    assert_eq!(resorted.path(), "s:dataset@sort(id::desc::)");

    let refiltered = base.with_filter(Some(FilterNode::eq("title", "x")));
    assert_eq!(refiltered.path(), "s:dataset/title=x@sort(id)");
}

#[test]
fn with_paging_checks_the_current_sort() {
    let location = parse("#1/s:dataset");
    let cursor = PageCursor::new(PageDirection::Before, vec![json!(1)]);

    let err = location
        .with_paging(Some(cursor.clone()))
        .expect_err("paging without sort should fail");
    assert!(matches!(err, Error::InvalidPageCriteria { .. }));

    let paged = location
        .with_sort(SortSpec::new(vec![SortKey::asc("id")]))
        .with_paging(Some(cursor))
        .expect("matching cursor should apply");
    assert_eq!(paged.path(), "s:dataset@sort(id)@before(1)");
}

#[derive(Default)]
struct Recorder(RefCell<Vec<TraceEvent>>);

impl TraceSink for Recorder {
    fn on_event(&self, event: &TraceEvent) {
        self.0.borrow_mut().push(event.clone());
    }
}

#[test]
fn parsing_emits_a_location_event() {
    let recorder = Rc::new(Recorder::default());
    with_sink(recorder.clone(), || {
        Location::from_path("7", "s:dataset").expect("path should parse");
    });

    assert_eq!(
        *recorder.0.borrow(),
        vec![TraceEvent::LocationParsed {
            catalog: "7".to_string(),
            table: "dataset".to_string(),
        }]
    );
}
