//! RequestModel: the ordered field map every step of a chain reads and mutates.

mod coerce;
mod intent;

pub use coerce::{coerce_token, coerce_tokens, narrow, Narrowed};
pub use intent::{Intent, Verb};

use crate::case::to_camel_case;
use crate::error::AppError;
use axum::http::StatusCode;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Key carrying the single-item identifier.
pub const ID_FIELD: &str = "id";
/// Key carrying the batch payload.
pub const ITEMS_FIELD: &str = "items";

#[derive(Clone, Debug)]
pub struct RequestModel {
    fields: Map<String, Value>,
    headers: BTreeMap<String, String>,
    intent: Intent,
    status: StatusCode,
}

impl RequestModel {
    /// Empty model with a fixed intent. Fields are added with [`RequestModel::insert`].
    pub fn new(intent: Intent) -> Self {
        RequestModel {
            fields: Map::new(),
            headers: BTreeMap::new(),
            intent,
            status: StatusCode::OK,
        }
    }

    /// Query-style construction: each parameter is coerced; repeated parameters
    /// become arrays; empty values are skipped.
    pub fn from_query(
        verb: Verb,
        pairs: Vec<(String, String)>,
        headers: Vec<(String, String)>,
    ) -> Self {
        Self::from_fields(verb, collect_pairs(pairs), headers)
    }

    /// Form bodies follow the same rules as the query string.
    pub fn from_form(
        verb: Verb,
        pairs: Vec<(String, String)>,
        headers: Vec<(String, String)>,
    ) -> Self {
        Self::from_fields(verb, collect_pairs(pairs), headers)
    }

    /// JSON body: a top-level object whose values are kept as-is; only keys are normalized.
    pub fn from_json(
        verb: Verb,
        body: &[u8],
        headers: Vec<(String, String)>,
    ) -> Result<Self, AppError> {
        let fields = if body.iter().all(u8::is_ascii_whitespace) {
            Map::new()
        } else {
            match serde_json::from_slice::<Value>(body) {
                Ok(Value::Object(obj)) => obj.into_iter().map(|(k, v)| (to_camel_case(&k), v)).collect(),
                Ok(_) => return Err(AppError::BadRequest("body must be a JSON object".into())),
                Err(e) => return Err(AppError::BadRequest(format!("invalid JSON body: {}", e))),
            }
        };
        Ok(Self::from_fields(verb, fields, headers))
    }

    fn from_fields(verb: Verb, fields: Map<String, Value>, headers: Vec<(String, String)>) -> Self {
        let intent = Intent::infer(
            verb,
            fields.contains_key(ID_FIELD),
            fields.contains_key(ITEMS_FIELD),
        );
        let mut joined: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in headers {
            joined
                .entry(name)
                .and_modify(|existing| {
                    existing.push(';');
                    existing.push_str(&value);
                })
                .or_insert(value);
        }
        RequestModel {
            fields,
            headers: joined,
            intent,
            status: StatusCode::OK,
        }
    }

    pub fn intent(&self) -> Intent {
        self.intent
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Lookup through the canonical casing, so "PageSize" finds "pageSize".
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(&to_camel_case(key))
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(&to_camel_case(key))
    }

    pub fn insert(&mut self, key: &str, value: Value) -> Option<Value> {
        self.fields.insert(to_camel_case(key), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(&to_camel_case(key))
    }

    /// Everything left in the model, as the response payload.
    pub fn into_body(self) -> Value {
        Value::Object(self.fields)
    }
}

fn collect_pairs(pairs: Vec<(String, String)>) -> Map<String, Value> {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for (key, value) in pairs {
        if value.is_empty() {
            continue;
        }
        let key = to_camel_case(&key);
        match grouped.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => grouped.push((key, vec![value])),
        }
    }
    grouped
        .into_iter()
        .map(|(key, values)| {
            let value = if values.len() == 1 {
                coerce_token(&values[0])
            } else {
                coerce_tokens(&values)
            };
            (key, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn query_values_are_coerced_and_keys_normalized() {
        let model = RequestModel::from_query(
            Verb::Get,
            pairs(&[("Id", "7"), ("Name", "Bob"), ("active", "true")]),
            Vec::new(),
        );
        assert_eq!(model.intent(), Intent::RetrieveItem);
        assert_eq!(model.get("id"), Some(&json!(7)));
        assert_eq!(model.get("name"), Some(&json!("Bob")));
        assert_eq!(model.get("Active"), Some(&json!(true)));
        assert_eq!(model.status(), StatusCode::OK);
    }

    #[test]
    fn repeated_parameters_become_arrays_and_empty_ones_are_skipped() {
        let model = RequestModel::from_query(
            Verb::Delete,
            pairs(&[("ids", "1"), ("ids", "2"), ("note", "")]),
            Vec::new(),
        );
        assert_eq!(model.intent(), Intent::DeleteList);
        assert_eq!(model.get("ids"), Some(&json!([1, 2])));
        assert!(!model.contains_key("note"));
    }

    #[test]
    fn field_order_is_preserved() {
        let model = RequestModel::from_query(
            Verb::Get,
            pairs(&[("z", "1"), ("a", "2"), ("m", "3")]),
            Vec::new(),
        );
        let keys: Vec<&String> = model.fields().keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn json_body_keeps_native_values() {
        let body = br#"{"Name": "42", "items": [{"name": "x"}]}"#;
        let model = RequestModel::from_json(Verb::Post, body, Vec::new()).unwrap();
        assert_eq!(model.intent(), Intent::CreateList);
        assert_eq!(model.get("name"), Some(&json!("42")));
        assert_eq!(model.get("items"), Some(&json!([{"name": "x"}])));
    }

    #[test]
    fn json_body_must_be_an_object() {
        let err = RequestModel::from_json(Verb::Put, b"[1,2]", Vec::new()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        let empty = RequestModel::from_json(Verb::Patch, b"  ", Vec::new()).unwrap();
        assert_eq!(empty.intent(), Intent::UpdateList);
    }

    #[test]
    fn multi_valued_headers_are_joined() {
        let model = RequestModel::from_query(
            Verb::Get,
            Vec::new(),
            pairs(&[("accept", "a/b"), ("accept", "c/d"), ("x-trace", "1")]),
        );
        assert_eq!(model.header("Accept"), Some("a/b;c/d"));
        assert_eq!(model.headers().len(), 2);
    }

    #[test]
    fn form_fields_follow_query_rules() {
        let model = RequestModel::from_form(Verb::Patch, pairs(&[("id", "3"), ("Done", "false")]), Vec::new());
        assert_eq!(model.intent(), Intent::UpdateItem);
        assert_eq!(model.into_body(), json!({"id": 3, "done": false}));
    }
}
