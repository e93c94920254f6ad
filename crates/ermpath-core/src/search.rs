//! Free-text search term to case-insensitive regexp filters.

use crate::{
    encode,
    filter::{ColumnRef, FilterNode, Operator},
};

/// Split a search string into terms. Quoted phrases come first, in order,
/// followed by the whitespace-separated remainder. An unmatched trailing
/// quote closes at the end of the input.
#[must_use]
pub fn terms(term: &str) -> Vec<String> {
    let mut phrases = Vec::new();
    let mut rest = String::new();
    let mut chunks = term.split('"');

    // after the first chunk, chunks alternate between inside and outside quotes
    if let Some(first) = chunks.next() {
        rest.push_str(first);
    }
    for (index, chunk) in chunks.enumerate() {
        if index % 2 == 0 {
            if !chunk.is_empty() {
                phrases.push(chunk.to_string());
            }
        } else {
            rest.push_str(chunk);
        }
    }

    phrases.extend(rest.split_whitespace().map(ToString::to_string));

    phrases
}

/// Regexp matching one term: integers and decimals match numerically
/// (leading zeros ignored), everything else literally.
#[must_use]
pub fn term_pattern(term: &str) -> String {
    if is_integer(term) {
        format!("^(.*[^0-9.])?0*{}([^0-9].*|$)", encode::regexp(term))
    } else if is_decimal(term) {
        format!("^(.*[^0-9.])?0*{}", encode::regexp(term))
    } else {
        encode::regexp(term)
    }
}

/// Filter matching every term of `term` against `column`, or `None` when
/// the search is blank.
#[must_use]
pub fn to_filter(column: &ColumnRef, term: &str) -> Option<FilterNode> {
    let nodes: Vec<FilterNode> = terms(term)
        .iter()
        .map(|t| FilterNode::predicate(column.clone(), Operator::CiRegexp, term_pattern(t)))
        .collect();

    if nodes.is_empty() {
        None
    } else {
        Some(FilterNode::and(nodes))
    }
}

/// Search over several columns: every term must match at least one of
/// them.
#[must_use]
pub fn to_filter_any(columns: &[ColumnRef], term: &str) -> Option<FilterNode> {
    if columns.is_empty() {
        return None;
    }
    let nodes: Vec<FilterNode> = terms(term)
        .iter()
        .map(|t| {
            let pattern = term_pattern(t);
            FilterNode::or(
                columns
                    .iter()
                    .map(|c| FilterNode::predicate(c.clone(), Operator::CiRegexp, pattern.clone()))
                    .collect(),
            )
        })
        .collect();

    if nodes.is_empty() {
        None
    } else {
        Some(FilterNode::and(nodes))
    }
}

/// Path form of a search. With `quantified` and more than one term this is
/// the `col::ciregexp::all(e1,e2)` list syntax.
#[must_use]
pub fn to_path(column: &ColumnRef, term: &str, quantified: bool) -> Option<String> {
    let patterns: Vec<String> = terms(term).iter().map(|t| term_pattern(t)).collect();

    match patterns.as_slice() {
        [] => None,
        [_, _, ..] if quantified => {
            let list: Vec<String> = patterns.iter().map(|p| encode::component(p)).collect();
            Some(format!(
                "{column}{}all({})",
                Operator::CiRegexp.token(),
                list.join(",")
            ))
        }
        _ => to_filter(column, term).map(|node| node.to_uri()),
    }
}

fn is_integer(term: &str) -> bool {
    !term.is_empty() && term.bytes().all(|b| b.is_ascii_digit())
}

fn is_decimal(term: &str) -> bool {
    let Some((whole, fraction)) = term.split_once('.') else {
        return false;
    };
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());

    digits(whole) && digits(fraction) && !(whole.is_empty() && fraction.is_empty())
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_phrases_precede_loose_words() {
        assert_eq!(
            terms(r#"alpha "big cat" beta"#),
            vec!["big cat".to_string(), "alpha".to_string(), "beta".to_string()]
        );
    }

    #[test]
    fn odd_quote_closes_at_end_of_input() {
        assert_eq!(
            terms(r#"one "two three"#),
            vec!["two three".to_string(), "one".to_string()]
        );
    }

    #[test]
    fn blank_search_has_no_terms() {
        assert!(terms("   ").is_empty());
        assert!(to_filter(&ColumnRef::all_columns(), "  ").is_none());
    }

    #[test]
    fn numeric_terms_match_numerically() {
        assert_eq!(term_pattern("12"), "^(.*[^0-9.])?0*12([^0-9].*|$)");
        assert_eq!(term_pattern("1.5"), "^(.*[^0-9.])?0*1\\.5");
        assert_eq!(term_pattern("1.2.3"), "1\\.2\\.3");
        assert_eq!(term_pattern("a+b"), "a\\+b");
    }

    #[test]
    fn search_filter_is_a_conjunction_of_ciregexp_terms() {
        let path = to_path(&ColumnRef::all_columns(), "foo bar", false).expect("terms present");

        assert_eq!(path, "*::ciregexp::foo&*::ciregexp::bar");
    }

    #[test]
    fn quantified_search_uses_all_list() {
        let path = to_path(&ColumnRef::qualified("M", "title"), "foo 12", true)
            .expect("terms present");

        assert_eq!(
            path,
            "M:title::ciregexp::all(foo,%5E%28.%2A%5B%5E0-9.%5D%29%3F0%2A12%28%5B%5E0-9%5D.%2A%7C%24%29)"
        );
    }

    #[test]
    fn search_box_columns_are_ored_per_term() {
        let columns = [ColumnRef::new("title"), ColumnRef::new("owner")];
        let node = to_filter_any(&columns, "a b").expect("terms present");

        assert_eq!(
            node.to_uri(),
            "(title::ciregexp::a;owner::ciregexp::a)&(title::ciregexp::b;owner::ciregexp::b)"
        );
    }

    #[test]
    fn quantified_search_with_one_term_falls_back_to_predicate() {
        let path = to_path(&ColumnRef::all_columns(), "foo", true).expect("terms present");

        assert_eq!(path, "*::ciregexp::foo");
    }
}
