//! Query-string mini-language: `filter`, `orderBy` and `select`.
//!
//! filter  := field op value (connective filter)?
//! op      := eq | lt | gt | le | ge | ne          (case-insensitive)
//! orderBy := field [asc|desc] ("," field [asc|desc])*
//! select  := field ("," field)*
//!
//! Field names are checked against `^[a-zA-Z_][a-zA-Z0-9_]*$` and values are either
//! single-quoted literals or plain decimal numbers. Those checks are the only thing
//! standing between the query string and the SQL text, so nothing else reaches a
//! clause fragment.

use crate::error::AppError;
use crate::sql::Dialect;
use regex::Regex;
use std::sync::OnceLock;

fn field_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("static regex"))
}

fn number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("static regex"))
}

/// Unquoted literal the database can hold: numeric syntax and no overflow to infinity.
fn is_finite_number(value: &str) -> bool {
    number_regex().is_match(value) && value.parse::<f64>().map(f64::is_finite).unwrap_or(false)
}

pub fn is_valid_field_name(name: &str) -> bool {
    field_name_regex().is_match(name)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterToken {
    Field(String),
    Operator(&'static str),
    /// Quoted string (quotes kept) or validated number, inserted verbatim.
    Literal(String),
    Connective(&'static str),
}

/// A parsed `filter` parameter: the flat token sequence of the WHERE fragment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterClause {
    tokens: Vec<FilterToken>,
}

impl FilterClause {
    /// Parse a filter expression. Blank input yields `None`.
    pub fn parse(filter: &str) -> Result<Option<Self>, AppError> {
        let mut tokenizer = Tokenizer::new(filter.trim());
        let mut tokens = Vec::new();

        while !tokenizer.is_empty() {
            let field = tokenizer.next_token();
            if !is_valid_field_name(&field) {
                return Err(AppError::InvalidFilterField(field));
            }
            tokens.push(FilterToken::Field(field.clone()));

            let op = tokenizer.next_token().to_lowercase();
            let sql_op = match op.as_str() {
                "eq" => "=",
                "lt" => "<",
                "gt" => ">",
                "le" => "<=",
                "ge" => ">=",
                "ne" => "<>",
                _ => return Err(AppError::InvalidFilterOperator(op)),
            };
            tokens.push(FilterToken::Operator(sql_op));

            let value = tokenizer.next_token();
            if value.is_empty() {
                return Err(AppError::InvalidFilterValue(format!("missing value for {} {}", field, op)));
            }
            if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
                tokens.push(FilterToken::Literal(value));
            } else if is_finite_number(&value) {
                tokens.push(FilterToken::Literal(value));
            } else {
                return Err(AppError::InvalidFilterValue(format!(
                    "{} is not a numeric or quoted string value",
                    value
                )));
            }

            let continuation = tokenizer.next_token();
            match continuation.to_lowercase().as_str() {
                "" => break,
                "and" => tokens.push(FilterToken::Connective("AND")),
                "or" => tokens.push(FilterToken::Connective("OR")),
                _ => return Err(AppError::UnexpectedFilterToken(continuation)),
            }
            if tokenizer.is_empty() {
                return Err(AppError::UnexpectedFilterToken(continuation));
            }
        }

        if tokens.is_empty() {
            return Ok(None);
        }
        Ok(Some(FilterClause { tokens }))
    }

    pub fn tokens(&self) -> &[FilterToken] {
        &self.tokens
    }

    /// Render the WHERE fragment (without the `WHERE` keyword).
    pub fn render(&self, dialect: Dialect) -> String {
        self.tokens
            .iter()
            .map(|t| match t {
                FilterToken::Field(f) => dialect.quote(f),
                FilterToken::Operator(op) | FilterToken::Connective(op) => (*op).to_string(),
                FilterToken::Literal(v) => v.clone(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Whitespace tokenizer. A single quote opens a token that may hold spaces and the
/// next quote closes it. A backslash is dropped and the character after it is read
/// normally, so `\'` inside a quoted token still closes the token.
struct Tokenizer<'a> {
    rest: &'a str,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Tokenizer { rest: input }
    }

    fn is_empty(&self) -> bool {
        self.rest.trim_start().is_empty()
    }

    fn next_token(&mut self) -> String {
        self.rest = self.rest.trim_start();
        let mut token = String::new();
        let mut inside_quote = false;

        while let Some(c) = self.rest.chars().next() {
            match c {
                '\'' if inside_quote => {
                    token.push(c);
                    self.advance(c);
                    return token;
                }
                '\'' => inside_quote = true,
                '\\' => {
                    self.advance(c);
                    continue;
                }
                ' ' if !inside_quote => return token,
                _ => {}
            }
            token.push(c);
            self.advance(c);
        }
        token
    }

    fn advance(&mut self, c: char) {
        self.rest = &self.rest[c.len_utf8()..];
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderTerm {
    pub field: String,
    pub descending: bool,
}

impl OrderTerm {
    pub fn render(&self, dialect: Dialect) -> String {
        format!(
            "{} {}",
            dialect.quote(&self.field),
            if self.descending { "desc" } else { "asc" }
        )
    }
}

/// Parse `field [asc|desc], ...`; direction defaults to ascending.
pub fn parse_order_by(order_by: &str) -> Result<Vec<OrderTerm>, AppError> {
    let mut terms = Vec::new();
    for clause in order_by.split(',') {
        let parts: Vec<&str> = clause.split_whitespace().collect();
        let (field, descending) = match parts.as_slice() {
            [field] => (*field, false),
            [field, dir] if dir.eq_ignore_ascii_case("asc") => (*field, false),
            [field, dir] if dir.eq_ignore_ascii_case("desc") => (*field, true),
            _ => return Err(AppError::InvalidOrderByClause(clause.trim().to_string())),
        };
        if !is_valid_field_name(field) {
            return Err(AppError::InvalidOrderByClause(clause.trim().to_string()));
        }
        terms.push(OrderTerm {
            field: field.to_string(),
            descending,
        });
    }
    Ok(terms)
}

/// Parse a comma-separated projection list.
pub fn parse_select(select: &str) -> Result<Vec<String>, AppError> {
    select
        .split(',')
        .map(|f| {
            let field = f.trim();
            if is_valid_field_name(field) {
                Ok(field.to_string())
            } else {
                Err(AppError::InvalidSelectClause(field.to_string()))
            }
        })
        .collect()
}
