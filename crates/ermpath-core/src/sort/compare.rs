use crate::sort::SortSpec;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use ermpath_schema::{node::Table, types::ColumnFamily};
use serde_json::{Map, Value};
use std::cmp::Ordering;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Order two rows under `sort`, comparing each column by its family.
///
/// Nulls sort first ascending. Values that do not parse as their family
/// fall back to text comparison. Columns unknown to `table` compare as text.
#[must_use]
pub fn compare_rows(
    table: &Table,
    sort: &SortSpec,
    a: &Map<String, Value>,
    b: &Map<String, Value>,
) -> Ordering {
    for key in sort.iter() {
        let family = table
            .column(&key.column)
            .map_or(ColumnFamily::Text, |c| c.column_type.family());
        let left = a.get(&key.column).unwrap_or(&Value::Null);
        let right = b.get(&key.column).unwrap_or(&Value::Null);

        let ordering = compare_values(family, left, right);
        let ordering = if key.descending {
            ordering.reverse()
        } else {
            ordering
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

fn compare_values(family: ColumnFamily, a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => return Ordering::Equal,
        (Value::Null, _) => return Ordering::Less,
        (_, Value::Null) => return Ordering::Greater,
        _ => {}
    }

    let typed = match family {
        ColumnFamily::Boolean => both(a, b, as_bool).map(|(x, y)| x.cmp(&y)),
        ColumnFamily::Float => both(a, b, as_float).map(|(x, y)| x.total_cmp(&y)),
        ColumnFamily::Integer => both(a, b, as_integer)
            .map(|(x, y)| x.cmp(&y))
            .or_else(|| both(a, b, as_float).map(|(x, y)| x.total_cmp(&y))),
        ColumnFamily::Temporal => both(a, b, as_instant).map(|(x, y)| x.cmp(&y)),
        ColumnFamily::Text | ColumnFamily::Unordered => None,
    };

    typed.unwrap_or_else(|| as_text(a).cmp(&as_text(b)))
}

fn both<T>(a: &Value, b: &Value, parse: impl Fn(&Value) -> Option<T>) -> Option<(T, T)> {
    Some((parse(a)?, parse(b)?))
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn as_integer(value: &Value) -> Option<i128> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// Instants compare in UTC; naive timestamps and dates are taken as UTC.
fn as_instant(value: &Value) -> Option<NaiveDateTime> {
    let Value::String(s) = value else {
        return None;
    };
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.naive_utc());
    }
    if let Some(dt) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
    {
        return Some(dt);
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
