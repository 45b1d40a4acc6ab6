//! Raw string tokens (query string, form fields) to typed JSON values.

use serde_json::{Number, Value};

/// Best-effort typing of a raw token: anything that parses as a JSON literal keeps
/// its JSON type (numbers, booleans, null, arrays, objects); everything else stays
/// the original string. Never fails.
pub fn coerce_token(raw: &str) -> Value {
    serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// A multi-valued parameter becomes an array of individually coerced tokens.
pub fn coerce_tokens(raw: &[String]) -> Value {
    Value::Array(raw.iter().map(|s| coerce_token(s)).collect())
}

/// Integer width a number binds with: 32 bits whenever the value fits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Narrowed {
    Int(i32),
    BigInt(i64),
    Float(f64),
}

pub fn narrow(n: &Number) -> Narrowed {
    if let Some(i) = n.as_i64() {
        match i32::try_from(i) {
            Ok(small) => Narrowed::Int(small),
            Err(_) => Narrowed::BigInt(i),
        }
    } else if let Some(u) = n.as_u64() {
        i64::try_from(u).map(Narrowed::BigInt).unwrap_or(Narrowed::Float(u as f64))
    } else {
        Narrowed::Float(n.as_f64().unwrap_or_default())
    }
}
