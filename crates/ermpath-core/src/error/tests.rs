use crate::error::{Error, ErrorStatus};
use ermpath_schema::error::SchemaError;

#[test]
fn every_kind_has_a_stable_status() {
    let cases = [
        (Error::config("x"), ErrorStatus::Config, "Configuration Error"),
        (Error::invalid_facet("x", None), ErrorStatus::InvalidFacet, "Invalid Facet Filters"),
        (Error::invalid_filter("x", None, None), ErrorStatus::InvalidFilter, "Invalid Filter"),
        (Error::invalid_input("x"), ErrorStatus::InvalidInput, "Invalid Input"),
        (Error::invalid_page("x", None), ErrorStatus::InvalidPage, "Invalid Page Criteria"),
        (Error::invalid_sort("x", None), ErrorStatus::InvalidSort, "Invalid Sort Criteria"),
        (Error::invalid_source("x"), ErrorStatus::InvalidSource, "Invalid Source Definition"),
        (Error::malformed_uri("x"), ErrorStatus::InvalidUri, "Invalid URI"),
        (Error::transport(500, "x"), ErrorStatus::Request, "Request Error"),
        (
            Error::from(SchemaError::table_not_found(Some("s"), "t")),
            ErrorStatus::Schema,
            "Schema Error",
        ),
    ];

    for (err, status, tag) in cases {
        assert_eq!(err.status(), status);
        assert_eq!(status.to_string(), tag);
    }
}

#[test]
fn filter_redirect_strips_the_bad_span() {
    let err = Error::invalid_filter(
        "bad",
        Some("s:t/id=1/a::x::b/c=2@sort(id)"),
        Some("a::x::b"),
    );

    assert_eq!(err.redirect_path(), Some("s:t/id=1/c=2@sort(id)"));
}

#[test]
fn filter_redirect_without_a_span_keeps_the_table() {
    let err = Error::invalid_filter("bad", Some("s:t/id=1/a::x::b@sort(id)"), None);

    assert_eq!(err.redirect_path(), Some("s:t"));
}

#[test]
fn facet_redirect_keeps_filters_and_modifiers() {
    let err = Error::invalid_facet("bad", Some("s:t/*::facets::N4Ig/id=1@sort(id)@after(3)"));

    assert_eq!(err.redirect_path(), Some("s:t/id=1@sort(id)@after(3)"));
}

#[test]
fn sort_redirect_drops_sort_and_paging() {
    let err = Error::invalid_sort("bad", Some("s:t/id=1@sort(nope)@before(2)"));

    assert_eq!(err.redirect_path(), Some("s:t/id=1"));
}

#[test]
fn page_redirect_drops_only_paging() {
    let err = Error::invalid_page("bad", Some("s:t@sort(id)@after(1)"));

    assert_eq!(err.redirect_path(), Some("s:t@sort(id)"));
}

#[test]
fn with_path_fills_a_missing_redirect_only() {
    let late = Error::invalid_sort("bad", None).with_path("s:t@sort(x)", None);
    assert_eq!(late.redirect_path(), Some("s:t"));

    let early = Error::invalid_sort("bad", Some("a:b@sort(x)")).with_path("s:t@sort(x)", None);
    assert_eq!(early.redirect_path(), Some("a:b"));

    let other = Error::malformed_uri("bad").with_path("s:t", None);
    assert_eq!(other.redirect_path(), None);
}

#[test]
fn transport_message_includes_the_status() {
    assert_eq!(
        Error::transport(404, "no such table").to_string(),
        "request failed with status 404: no such table"
    );
}
