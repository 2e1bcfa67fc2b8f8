//! Query helpers: equality filters, sorting and search patterns.

use std::cmp::Ordering;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::StorageResult;
use crate::types::{Document, SortDirection, SortDirective};

/// Returns `true` if every filter field equals the document's value.
pub(crate) fn matches_filters(doc: &Document, filters: &Map<String, Value>) -> bool {
    filters
        .iter()
        .all(|(field, expected)| doc.get(field) == Some(expected))
}

/// Sorts documents in place. Later directives break ties of earlier ones,
/// and documents that compare equal keep their insertion order.
pub(crate) fn sort_documents(docs: &mut [Document], sort: &[SortDirective]) {
    if sort.is_empty() {
        return;
    }
    docs.sort_by(|a, b| {
        for directive in sort {
            let ordering = compare_values(a.get(&directive.field), b.get(&directive.field));
            let ordering = match directive.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

// Missing < null < bool < number < string < array < object
fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None => 0,
        Some(Value::Null) => 1,
        Some(Value::Bool(_)) => 2,
        Some(Value::Number(_)) => 3,
        Some(Value::String(_)) => 4,
        Some(Value::Array(_)) => 5,
        Some(Value::Object(_)) => 6,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Builds a case-insensitive pattern matching any whole word of `query`.
///
/// Returns `None` for a query with no words.
pub(crate) fn text_pattern(query: &str) -> StorageResult<Option<Regex>> {
    let words: Vec<String> = query.split_whitespace().map(regex::escape).collect();
    if words.is_empty() {
        return Ok(None);
    }
    Ok(Some(Regex::new(&format!(r"(?i)\b(?:{})\b", words.join("|")))?))
}

/// Builds a case-insensitive pattern matching values starting with `query`.
pub(crate) fn prefix_pattern(query: &str) -> StorageResult<Regex> {
    Ok(Regex::new(&format!("(?i)^{}", regex::escape(query)))?)
}

/// Returns `true` if any of `fields` holds a string matching `pattern`.
pub(crate) fn any_field_matches(doc: &Document, fields: &[String], pattern: &Regex) -> bool {
    fields.iter().any(|field| {
        doc.get(field)
            .and_then(Value::as_str)
            .is_some_and(|s| pattern.is_match(s))
    })
}
