//! Table-bound CRUD executor: turns the request intent into SQL against one table and
//! writes results back onto the request model.

use crate::case::{lookup_ignore_case, normalize_row};
use crate::chain::SharedContext;
use crate::config::{require_identifier, require_non_empty};
use crate::db::{Row, Transaction};
use crate::error::{AppError, ConfigError};
use crate::request::{Intent, RequestModel, ID_FIELD, ITEMS_FIELD};
use crate::runtime::Runtime;
use crate::service::SchemaCache;
use crate::sql::{self, page_offset, total_pages, Column, Dialect, SelectBuilder, Statement, ID_COLUMN};
use axum::http::StatusCode;
use serde_json::{Map, Value};
use std::sync::Arc;

pub const PAGE_SIZE_FIELD: &str = "pageSize";
pub const PAGE_NUMBER_FIELD: &str = "pageNumber";
pub const COUNT_FIELD: &str = "count";
pub const IDS_FIELD: &str = "ids";
pub const ITEM_FIELD: &str = "item";
pub const TOTAL_ROWS_FIELD: &str = "totalRows";
pub const TOTAL_PAGES_FIELD: &str = "totalPages";
pub const AFFECTED_ROWS_FIELD: &str = "affectedRows";

/// A step bound to one table (its name) on one logical connection.
#[derive(Clone, Debug)]
pub struct TableStep {
    name: String,
    connection: String,
}

impl TableStep {
    pub fn new(name: impl Into<String>, connection: impl Into<String>) -> Self {
        TableStep {
            name: name.into(),
            connection: connection.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connection(&self) -> &str {
        &self.connection
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.name, "TableStep", "name")?;
        require_identifier(&self.name, "TableStep", "name")?;
        require_non_empty(&self.connection, "TableStep", "connection")
    }

    pub(crate) async fn initialize(&self, context: &mut SharedContext, runtime: &Runtime) -> Result<(), AppError> {
        let database = runtime.connections.get(&self.connection)?;
        context.acquire(&self.connection, database.as_ref()).await
    }

    pub(crate) async fn terminate(&self, context: &mut SharedContext, failure: Option<&AppError>) -> Result<(), AppError> {
        context.release(&self.connection, failure).await
    }

    pub(crate) async fn handle(
        &self,
        model: &mut RequestModel,
        context: &mut SharedContext,
        runtime: &Runtime,
    ) -> Result<(), AppError> {
        let shared = context.get_mut(&self.connection)?;
        let dialect = shared.dialect();
        let mut session = TableSession {
            table: &self.name,
            connection: &self.connection,
            dialect,
            tx: shared.transaction(),
            cache: &runtime.schema_cache,
        };
        tracing::debug!(table = %self.name, intent = ?model.intent(), "table step");
        match model.intent() {
            Intent::RetrieveItem => session.retrieve_item(model).await,
            Intent::RetrieveList => session.retrieve_list(model).await,
            Intent::CreateItem => session.create_item(model).await,
            Intent::CreateList => session.create_list(model).await,
            Intent::ReplaceItem => session.update_item(model, true).await,
            Intent::UpdateItem => session.update_item(model, false).await,
            Intent::ReplaceList => session.update_list(model, true).await,
            Intent::UpdateList => session.update_list(model, false).await,
            Intent::DeleteItem => session.delete_item(model).await,
            Intent::DeleteList => session.delete_list(model).await,
        }
    }
}

struct TableSession<'a> {
    table: &'a str,
    connection: &'a str,
    dialect: Dialect,
    tx: &'a mut dyn Transaction,
    cache: &'a SchemaCache,
}

impl TableSession<'_> {
    async fn fetch(&mut self, statement: &Statement) -> Result<Vec<Row>, AppError> {
        self.tx.fetch_all(statement).await
    }

    async fn execute(&mut self, statement: &Statement) -> Result<u64, AppError> {
        self.tx.execute(statement).await
    }

    async fn columns(&mut self) -> Result<Arc<Vec<Column>>, AppError> {
        self.cache
            .columns(self.connection, self.table, self.dialect, &mut *self.tx)
            .await
    }

    /// Catalog columns when a string identity has to be cast on PostgreSQL (a `uuid`
    /// key, say); empty otherwise, so numeric identities skip the catalog.
    async fn id_columns(&mut self, ids: &[Value]) -> Result<Arc<Vec<Column>>, AppError> {
        if self.dialect == Dialect::Postgres && ids.iter().any(Value::is_string) {
            return self.columns().await;
        }
        Ok(Arc::new(Vec::new()))
    }

    async fn retrieve_item(&mut self, model: &mut RequestModel) -> Result<(), AppError> {
        let id = required(model, ID_FIELD)?;
        let columns = self.id_columns(std::slice::from_ref(&id)).await?;
        let mut params = sql::ParamCollector::new(self.dialect);
        let predicate = sql::id_predicate(&mut params, self.dialect, &id, &columns);
        let select = SelectBuilder::from_model(model, self.dialect)?
            .from_table(self.table)
            .top(1)
            .where_clause(predicate)
            .build();
        let rows = self.fetch(&params.finish(select)).await?;

        match rows.into_iter().next() {
            Some(row) => {
                model.insert(ITEM_FIELD, Value::Object(normalize_row(row)));
            }
            None => {
                model.insert(ITEM_FIELD, Value::Null);
                model.set_status(StatusCode::NOT_FOUND);
            }
        }
        Ok(())
    }

    async fn retrieve_list(&mut self, model: &mut RequestModel) -> Result<(), AppError> {
        let builder = SelectBuilder::from_model(model, self.dialect)?.from_table(self.table);

        if model.contains_key(COUNT_FIELD) {
            let total = self.count(&builder).await?;
            model.insert(TOTAL_ROWS_FIELD, Value::from(total));
            return Ok(());
        }

        let builder = if model.contains_key(PAGE_SIZE_FIELD) || model.contains_key(PAGE_NUMBER_FIELD) {
            let (page_size, page_number) = paging(model)?;
            let total = self.count(&builder).await?;
            model.insert(TOTAL_ROWS_FIELD, Value::from(total));
            model.insert(TOTAL_PAGES_FIELD, Value::from(total_pages(total, page_size)));
            let offset = page_offset(page_size, page_number).ok_or_else(|| {
                AppError::InvalidPagingParameter(format!(
                    "pageNumber {} with pageSize {} is out of range",
                    page_number, page_size
                ))
            })?;
            builder.skip(offset).fetch(page_size)
        } else {
            builder
        };

        let rows = self.fetch(&Statement::new(builder.build(), Vec::new())).await?;
        let items: Vec<Value> = rows.into_iter().map(|r| Value::Object(normalize_row(r))).collect();
        model.set_status(if items.is_empty() {
            StatusCode::NO_CONTENT
        } else {
            StatusCode::OK
        });
        model.insert(ITEMS_FIELD, Value::Array(items));
        Ok(())
    }

    async fn count(&mut self, builder: &SelectBuilder) -> Result<u64, AppError> {
        let rows = self.fetch(&Statement::new(builder.build_count(), Vec::new())).await?;
        let total = rows
            .first()
            .and_then(|row| row.values().next())
            .and_then(Value::as_u64)
            .unwrap_or(0);
        Ok(total)
    }

    async fn insert_one(&mut self, fields: &Map<String, Value>) -> Result<Value, AppError> {
        let columns = self.columns().await?;
        let values: Vec<(String, Value)> = columns
            .iter()
            .filter(|c| !c.name.eq_ignore_ascii_case(ID_COLUMN))
            .filter_map(|c| lookup_ignore_case(fields, &c.name).map(|v| (c.name.clone(), v.clone())))
            .collect();
        let rows = self
            .fetch(&sql::insert(self.dialect, self.table, &values, &columns))
            .await?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next().map(|(_, v)| v))
            .unwrap_or(Value::Null))
    }

    async fn create_item(&mut self, model: &mut RequestModel) -> Result<(), AppError> {
        let id = self.insert_one(model.fields()).await?;
        model.insert(ID_FIELD, id);
        model.set_status(StatusCode::CREATED);
        Ok(())
    }

    async fn create_list(&mut self, model: &mut RequestModel) -> Result<(), AppError> {
        let mut items = required_items(model)?;
        for item in items.iter_mut() {
            let id = self.insert_one(item).await?;
            item.insert(ID_FIELD.to_string(), id);
        }
        model.insert(ITEMS_FIELD, Value::Array(items.into_iter().map(Value::Object).collect()));
        model.set_status(StatusCode::CREATED);
        Ok(())
    }

    /// Update (or, with `replace`, fully replace) the row identified by `fields["id"]`.
    async fn update_one(&mut self, fields: &Map<String, Value>, replace: bool) -> Result<u64, AppError> {
        let id = lookup_ignore_case(fields, ID_FIELD)
            .cloned()
            .ok_or_else(|| AppError::MissingRequiredField(ID_FIELD.into()))?;
        if fields.keys().all(|k| k.eq_ignore_ascii_case(ID_FIELD)) {
            return Err(AppError::EmptyUpdatePayload);
        }

        let columns = self.columns().await?;
        let assignments: Vec<(String, Value)> = columns
            .iter()
            .filter(|c| !c.name.eq_ignore_ascii_case(ID_COLUMN))
            .filter_map(|c| match lookup_ignore_case(fields, &c.name) {
                Some(v) => Some((c.name.clone(), v.clone())),
                None if replace => Some((c.name.clone(), Value::Null)),
                None => None,
            })
            .collect();
        if assignments.is_empty() {
            return Err(AppError::EmptyUpdatePayload);
        }
        self.execute(&sql::update(self.dialect, self.table, &assignments, &id, &columns))
            .await
    }

    async fn update_item(&mut self, model: &mut RequestModel, replace: bool) -> Result<(), AppError> {
        let affected = self.update_one(model.fields(), replace).await?;
        model.insert(AFFECTED_ROWS_FIELD, Value::from(affected));
        Ok(())
    }

    async fn update_list(&mut self, model: &mut RequestModel, replace: bool) -> Result<(), AppError> {
        let items = required_items(model)?;
        let mut affected = 0;
        for (i, item) in items.iter().enumerate() {
            if lookup_ignore_case(item, ID_FIELD).is_none() {
                return Err(AppError::MissingRequiredField(format!("items[{}].id", i)));
            }
            affected += self.update_one(item, replace).await?;
        }
        model.insert(AFFECTED_ROWS_FIELD, Value::from(affected));
        Ok(())
    }

    async fn delete_item(&mut self, model: &mut RequestModel) -> Result<(), AppError> {
        let id = required(model, ID_FIELD)?;
        let columns = self.id_columns(std::slice::from_ref(&id)).await?;
        let affected = self
            .execute(&sql::delete(self.dialect, self.table, &id, &columns))
            .await?;
        model.insert(AFFECTED_ROWS_FIELD, Value::from(affected));
        Ok(())
    }

    async fn delete_list(&mut self, model: &mut RequestModel) -> Result<(), AppError> {
        let ids = match model.get(IDS_FIELD) {
            Some(Value::Array(ids)) if !ids.is_empty() => ids.clone(),
            Some(Value::Array(_)) | Some(Value::Null) | None => {
                return Err(AppError::MissingRequiredField(IDS_FIELD.into()))
            }
            Some(single) => vec![single.clone()],
        };
        let columns = self.id_columns(&ids).await?;
        let affected = self
            .execute(&sql::delete_in(self.dialect, self.table, &ids, &columns))
            .await?;
        model.insert(AFFECTED_ROWS_FIELD, Value::from(affected));
        Ok(())
    }
}

fn required(model: &RequestModel, field: &str) -> Result<Value, AppError> {
    model
        .get(field)
        .cloned()
        .ok_or_else(|| AppError::MissingRequiredField(field.into()))
}

/// The non-empty `items` array, each element an object.
fn required_items(model: &RequestModel) -> Result<Vec<Map<String, Value>>, AppError> {
    let items = match model.get(ITEMS_FIELD) {
        Some(Value::Array(items)) if !items.is_empty() => items,
        _ => return Err(AppError::MissingRequiredField(ITEMS_FIELD.into())),
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(obj) => Ok(obj.clone()),
            _ => Err(AppError::BadRequest(format!("items[{}] must be an object", i))),
        })
        .collect()
}

/// `pageSize >= 2` and `pageNumber >= 1`, both integers.
fn paging(model: &RequestModel) -> Result<(u64, u64), AppError> {
    let page_size = model.get(PAGE_SIZE_FIELD).and_then(Value::as_i64).unwrap_or(0);
    if page_size < 2 {
        return Err(AppError::InvalidPagingParameter(format!(
            "pageSize should be >= 2, but it is {}",
            display_field(model, PAGE_SIZE_FIELD)
        )));
    }
    let page_number = model.get(PAGE_NUMBER_FIELD).and_then(Value::as_i64).unwrap_or(0);
    if page_number < 1 {
        return Err(AppError::InvalidPagingParameter(format!(
            "pageNumber should be >= 1, but it is {}",
            display_field(model, PAGE_NUMBER_FIELD)
        )));
    }
    Ok((page_size as u64, page_number as u64))
}

fn display_field(model: &RequestModel, field: &str) -> String {
    model.get(field).map(Value::to_string).unwrap_or_else(|| "missing".into())
}
