use crate::{
    facet::{FacetRange, FacetTerm, Facets},
    filter::{FilterNode, Operator},
};
use serde_json::Value;

impl FilterNode {
    /// Re-express this filter as facets. Only a conjunction of root-column
    /// predicates (or same-column disjunctions of them) qualifies.
    #[must_use]
    pub fn to_facets(&self) -> Option<Facets> {
        let terms = match self {
            Self::Conjunction(nodes) => nodes.iter().map(facet_term).collect::<Option<Vec<_>>>()?,
            other => vec![facet_term(other)?],
        };

        Some(Facets::new(terms))
    }
}

fn facet_term(node: &FilterNode) -> Option<FacetTerm> {
    match node {
        FilterNode::Binary(_) | FilterNode::Unary(_) => predicate_term(node),
        FilterNode::Disjunction(nodes) => {
            let mut merged: Option<FacetTerm> = None;
            for node in nodes {
                let term = predicate_term(node)?;
                if let Some(into) = merged.as_mut() {
                    if into.source != term.source {
                        return None;
                    }
                    merge(into, term);
                } else {
                    merged = Some(term);
                }
            }
            merged
        }
        FilterNode::Negation(_) | FilterNode::Conjunction(_) => None,
    }
}

fn predicate_term(node: &FilterNode) -> Option<FacetTerm> {
    let (column, operator, value) = match node {
        FilterNode::Binary(p) => (&p.column, p.operator, Some(p.value.as_str())),
        FilterNode::Unary(p) => (&p.column, p.operator, None),
        _ => return None,
    };
    if column.alias.is_some() {
        return None;
    }

    let value = || Value::String(value.unwrap_or_default().to_string());
    let mut term = FacetTerm {
        source: Some(Value::String(column.name.clone())),
        ..FacetTerm::default()
    };

    match operator {
        Operator::Equal => term.choices = Some(vec![value()]),
        Operator::Null => term.choices = Some(vec![Value::Null]),
        Operator::CiRegexp => term.search = Some(vec![value()]),
        Operator::GreaterOrEqual => term.ranges = Some(vec![FacetRange::between(Some(value()), None)]),
        Operator::LessOrEqual => term.ranges = Some(vec![FacetRange::between(None, Some(value()))]),
        Operator::Greater => {
            term.ranges = Some(vec![FacetRange {
                min_exclusive: true,
                ..FacetRange::between(Some(value()), None)
            }]);
        }
        Operator::Less => {
            term.ranges = Some(vec![FacetRange {
                max_exclusive: true,
                ..FacetRange::between(None, Some(value()))
            }]);
        }
        Operator::Regexp | Operator::TextSearch => return None,
    }

    Some(term)
}

fn merge(into: &mut FacetTerm, from: FacetTerm) {
    if let Some(choices) = from.choices {
        into.choices.get_or_insert_with(Vec::new).extend(choices);
    }
    if let Some(ranges) = from.ranges {
        into.ranges.get_or_insert_with(Vec::new).extend(ranges);
    }
    if let Some(search) = from.search {
        into.search.get_or_insert_with(Vec::new).extend(search);
    }
}
