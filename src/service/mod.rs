//! Table-bound CRUD execution and the column cache it reads through.

mod crud;
mod schema_cache;

pub use crud::{
    TableStep, AFFECTED_ROWS_FIELD, COUNT_FIELD, IDS_FIELD, ITEM_FIELD, PAGE_NUMBER_FIELD, PAGE_SIZE_FIELD,
    TOTAL_PAGES_FIELD, TOTAL_ROWS_FIELD,
};
pub use schema_cache::SchemaCache;
