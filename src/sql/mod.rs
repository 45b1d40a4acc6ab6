//! SQL generation: dialects, the filter mini-language, statement builders and parameters.

mod builder;
mod dialect;
mod filter;
pub mod params;

pub use builder::*;
pub use dialect::Dialect;
pub use filter::{is_valid_field_name, parse_order_by, parse_select, FilterClause, FilterToken, OrderTerm};
pub use params::{BindValue, ParamCollector, Statement};
