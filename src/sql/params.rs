//! Named parameters collected while rendering a statement, and their PostgreSQL binding.

use crate::request::{narrow, Narrowed};
use crate::sql::Dialect;
use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::{Database, Type};

/// Rendered SQL plus its parameters in binding order. Parameter names match the
/// field (column) they were taken from.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<(String, Value)>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<(String, Value)>) -> Self {
        Statement {
            sql: sql.into(),
            params,
        }
    }
}

/// Hands out placeholders while a statement is assembled.
pub struct ParamCollector {
    dialect: Dialect,
    params: Vec<(String, Value)>,
}

impl ParamCollector {
    pub fn new(dialect: Dialect) -> Self {
        ParamCollector {
            dialect,
            params: Vec::new(),
        }
    }

    /// Bind `value` under `name` and return the placeholder to splice into SQL.
    /// JSON null renders as the literal `NULL`; a name bound twice reuses its slot.
    pub fn bind(&mut self, name: &str, value: Value) -> String {
        if value.is_null() {
            return "NULL".to_string();
        }
        if let Some(pos) = self.params.iter().position(|(n, _)| n == name) {
            return self.dialect.placeholder(name, pos + 1);
        }
        self.params.push((name.to_string(), value));
        self.dialect.placeholder(name, self.params.len())
    }

    /// Like [`bind`](Self::bind), cast to `data_type` where the dialect needs it.
    pub fn bind_as(&mut self, name: &str, value: Value, data_type: Option<&str>) -> String {
        if value.is_null() {
            return "NULL".to_string();
        }
        let placeholder = self.bind(name, value);
        self.dialect.cast(placeholder, data_type)
    }

    pub fn finish(self, sql: String) -> Statement {
        Statement {
            sql,
            params: self.params,
        }
    }
}

/// A JSON value in the shape PostgreSQL binds it.
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    Bool(bool),
    Int(i32),
    BigInt(i64),
    Float(f64),
    Text(String),
    Json(Value),
}

impl BindValue {
    /// `None` for JSON null, which binds as SQL NULL.
    pub fn from_json(v: &Value) -> Option<Self> {
        Some(match v {
            Value::Null => return None,
            Value::Bool(b) => BindValue::Bool(*b),
            Value::Number(n) => match narrow(n) {
                Narrowed::Int(i) => BindValue::Int(i),
                Narrowed::BigInt(i) => BindValue::BigInt(i),
                Narrowed::Float(f) => BindValue::Float(f),
            },
            Value::String(s) => BindValue::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => BindValue::Json(v.clone()),
        })
    }
}

impl<'q> Encode<'q, Postgres> for BindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            BindValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf)?,
            BindValue::Int(n) => <i32 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            BindValue::BigInt(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            BindValue::Float(n) => <f64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            BindValue::Text(s) => <String as Encode<Postgres>>::encode_by_ref(s, buf)?,
            BindValue::Json(v) => <Value as Encode<Postgres>>::encode_by_ref(v, buf)?,
        })
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            BindValue::Text(_) => <String as Type<Postgres>>::type_info(),
            BindValue::Bool(_) => <bool as Type<Postgres>>::type_info(),
            BindValue::Int(_) => <i32 as Type<Postgres>>::type_info(),
            BindValue::BigInt(_) => <i64 as Type<Postgres>>::type_info(),
            BindValue::Float(_) => <f64 as Type<Postgres>>::type_info(),
            BindValue::Json(_) => <Value as Type<Postgres>>::type_info(),
        })
    }
}

impl Type<Postgres> for BindValue {
    fn type_info() -> PgTypeInfo {
        <String as Type<Postgres>>::type_info()
    }
}
