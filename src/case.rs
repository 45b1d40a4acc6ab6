//! Field-name casing: request keys and result columns share one canonical form,
//! the first character lower-cased and the rest untouched ("UserId" -> "userId").

use serde_json::{Map, Value};

/// Lower-case the first character of an identifier. Empty input passes through.
/// e.g. "Name" -> "name", "ID" -> "iD", "X" -> "x"
pub fn to_camel_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().chain(chars).collect(),
    }
}

/// Rebuild a row with normalized keys, keeping column order.
pub fn normalize_row(row: Map<String, Value>) -> Map<String, Value> {
    row.into_iter().map(|(k, v)| (to_camel_case(&k), v)).collect()
}

/// Find the value submitted for `column`, matching the key case-insensitively.
pub fn lookup_ignore_case<'a>(fields: &'a Map<String, Value>, column: &str) -> Option<&'a Value> {
    fields.get(column).or_else(|| {
        fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(column))
            .map(|(_, v)| v)
    })
}
