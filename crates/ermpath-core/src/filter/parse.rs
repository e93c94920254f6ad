use crate::{
    encode,
    error::Error,
    filter::{ColumnRef, FilterNode, Operator},
};

const MIXED_COMBINATION: &str =
    "Parser doesn't support combination of conjunction and disjunction filters.";

/// Parse one filter path segment into a filter tree.
pub fn parse_filter_segment(segment: &str) -> Result<FilterNode, Error> {
    FilterParser { path: None }.parse_level(segment, segment)
}

/// Parse a filter segment that came from `path`; errors carry a redirect
/// path with the offending span removed.
pub fn parse_filter_segment_at(segment: &str, path: &str) -> Result<FilterNode, Error> {
    FilterParser { path: Some(path) }.parse_level(segment, segment)
}

///
/// FilterParser
///
/// Recursive descent over one segment. `;` and `&` may not be mixed at the
/// same nesting level; parenthesized groups recurse.
///

struct FilterParser<'a> {
    path: Option<&'a str>,
}

///
/// Separator
///

#[derive(Clone, Copy, Eq, PartialEq)]
enum Separator {
    And,
    Or,
}

impl FilterParser<'_> {
    fn parse_level(&self, level: &str, segment: &str) -> Result<FilterNode, Error> {
        let (terms, separator) = self.split_level(level, segment)?;
        let nodes = terms
            .into_iter()
            .map(|term| self.parse_term(term, segment))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(match separator {
            None | Some(Separator::And) => FilterNode::and(nodes),
            Some(Separator::Or) => FilterNode::or(nodes),
        })
    }

    // Split on top-level separators, keeping parenthesized groups whole.
    fn split_level<'s>(
        &self,
        level: &'s str,
        segment: &str,
    ) -> Result<(Vec<&'s str>, Option<Separator>), Error> {
        let mut terms = Vec::new();
        let mut separator = None;
        let mut depth = 0usize;
        let mut start = 0;

        for (index, c) in level.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| self.unbalanced(segment))?;
                }
                ';' | '&' if depth == 0 => {
                    let current = if c == '&' {
                        Separator::And
                    } else {
                        Separator::Or
                    };
                    if separator.is_some_and(|s| s != current) {
                        return Err(self.error(MIXED_COMBINATION, segment));
                    }
                    separator = Some(current);
                    terms.push(&level[start..index]);
                    start = index + 1;
                }
                _ => {}
            }
        }
        if depth != 0 {
            return Err(self.unbalanced(segment));
        }
        terms.push(&level[start..]);

        Ok((terms, separator))
    }

    fn parse_term(&self, term: &str, segment: &str) -> Result<FilterNode, Error> {
        if let Some(rest) = term.strip_prefix('!') {
            if rest.is_empty() {
                return Err(self.unparsable(term));
            }
            return Ok(FilterNode::not(self.parse_term(rest, segment)?));
        }

        if term.starts_with('(') {
            // the group must close on the term's last character
            if !term.ends_with(')') || closing_paren(term) != Some(term.len() - 1) {
                return Err(self.unparsable(term));
            }
            let inner = &term[1..term.len() - 1];
            if inner.is_empty() {
                return Err(self.unparsable(term));
            }
            return self.parse_level(inner, segment);
        }

        self.parse_predicate(term)
    }

    fn parse_predicate(&self, term: &str) -> Result<FilterNode, Error> {
        if term.contains('=') {
            let parts: Vec<&str> = term.split('=').collect();
            let [column, value] = parts.as_slice() else {
                return Err(self.unparsable(term));
            };
            if column.is_empty() {
                return Err(self.unparsable(term));
            }
            let column = self.parse_column(column, term)?;

            return self.build_predicate(column, Operator::Equal, value, term);
        }

        let parts: Vec<&str> = term.split("::").collect();
        let [column, operator, value] = parts.as_slice() else {
            return Err(self.unparsable(term));
        };
        let Some(operator) = Operator::from_name(operator) else {
            return Err(self.unparsable(term));
        };
        if column.is_empty() || (operator.is_unary() && !value.is_empty()) {
            return Err(self.unparsable(term));
        }
        let column = self.parse_column(column, term)?;

        self.build_predicate(column, operator, value, term)
    }

    // `any(v1,v2)` and `all(v1,v2)` expand to a disjunction / conjunction.
    fn build_predicate(
        &self,
        column: ColumnRef,
        operator: Operator,
        value: &str,
        term: &str,
    ) -> Result<FilterNode, Error> {
        let quantified = [("any(", Separator::Or), ("all(", Separator::And)]
            .into_iter()
            .find_map(|(prefix, kind)| value.strip_prefix(prefix).map(|rest| (rest, kind)));

        let Some((rest, kind)) = quantified else {
            let value = encode::decode(value).map_err(|_| self.unparsable(term))?;
            return Ok(FilterNode::predicate(column, operator, value));
        };

        let Some(list) = rest.strip_suffix(')') else {
            return Err(self.unparsable(term));
        };
        if list.is_empty() || operator.is_unary() {
            return Err(self.unparsable(term));
        }
        let nodes = list
            .split(',')
            .map(|v| {
                let v = encode::decode(v).map_err(|_| self.unparsable(term))?;
                Ok(FilterNode::predicate(column.clone(), operator, v))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(match kind {
            Separator::Or => FilterNode::or(nodes),
            Separator::And => FilterNode::and(nodes),
        })
    }

    fn parse_column(&self, token: &str, term: &str) -> Result<ColumnRef, Error> {
        let decode = |s: &str| encode::decode(s).map_err(|_| self.unparsable(term));

        match token.split_once(':') {
            Some((alias, name)) if !alias.is_empty() && !name.is_empty() => {
                Ok(ColumnRef::qualified(decode(alias)?, decode(name)?))
            }
            Some(_) => Err(self.unparsable(term)),
            None => Ok(ColumnRef::new(decode(token)?)),
        }
    }

    fn unparsable(&self, term: &str) -> Error {
        Error::invalid_filter(
            format!("Couldn't parse '{term}' filter."),
            self.path,
            Some(term),
        )
    }

    fn unbalanced(&self, segment: &str) -> Error {
        self.error(
            format!("Unbalanced parentheses in '{segment}' filter."),
            segment,
        )
    }

    fn error(&self, message: impl Into<String>, segment: &str) -> Error {
        Error::invalid_filter(message, self.path, Some(segment))
    }
}

// Byte index of the parenthesis closing the one at index 0.
fn closing_paren(term: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (index, c) in term.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }

    None
}
