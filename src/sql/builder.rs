//! Statement assembly: a SELECT builder that merges query-string clauses with
//! programmatic ones, plus INSERT / UPDATE / DELETE by identity. Identifiers come
//! from the catalog or from validated field names; values travel as parameters.

use crate::error::AppError;
use crate::request::RequestModel;
use crate::sql::{parse_order_by, parse_select, Dialect, FilterClause, OrderTerm, ParamCollector, Statement};
use serde_json::Value;

/// Identity column every table step addresses rows by.
pub const ID_COLUMN: &str = "id";

pub const FILTER_FIELD: &str = "filter";
pub const ORDER_BY_FIELD: &str = "orderBy";
pub const SELECT_FIELD: &str = "select";

#[derive(Clone, Debug)]
pub struct SelectBuilder {
    dialect: Dialect,
    projection: String,
    forced_projection: Option<Vec<String>>,
    source: String,
    top: Option<u64>,
    skip: u64,
    fetch: u64,
    where_clauses: Vec<String>,
    order_by: Vec<String>,
    parsed_where: Option<FilterClause>,
    parsed_order_by: Vec<OrderTerm>,
}

impl SelectBuilder {
    pub fn new(dialect: Dialect) -> Self {
        SelectBuilder {
            dialect,
            projection: "*".to_string(),
            forced_projection: None,
            source: String::new(),
            top: None,
            skip: 0,
            fetch: 0,
            where_clauses: Vec::new(),
            order_by: Vec::new(),
            parsed_where: None,
            parsed_order_by: Vec::new(),
        }
    }

    /// Builder seeded with the `filter`, `orderBy` and `select` fields of the request.
    /// Non-string values for those keys are ignored.
    pub fn from_model(model: &RequestModel, dialect: Dialect) -> Result<Self, AppError> {
        let mut builder = SelectBuilder::new(dialect);
        if let Some(order_by) = model.get_str(ORDER_BY_FIELD) {
            builder.parsed_order_by = parse_order_by(order_by)?;
        }
        if let Some(select) = model.get_str(SELECT_FIELD) {
            builder.forced_projection = Some(parse_select(select)?);
        }
        if let Some(filter) = model.get_str(FILTER_FIELD) {
            builder.parsed_where = FilterClause::parse(filter)?;
        }
        Ok(builder)
    }

    /// Projection used unless the request forced one with `select`.
    pub fn select(mut self, projection: impl Into<String>) -> Self {
        self.projection = projection.into();
        self
    }

    /// Table to read from; quoted at render time.
    pub fn from_table(mut self, table: &str) -> Self {
        self.source = self.dialect.quote(table);
        self
    }

    pub fn top(mut self, rows: u64) -> Self {
        self.top = Some(rows);
        self
    }

    pub fn skip(mut self, rows: u64) -> Self {
        self.skip = rows;
        self
    }

    pub fn fetch(mut self, rows: u64) -> Self {
        self.fetch = rows;
        self
    }

    pub fn where_clause(mut self, fragment: impl Into<String>) -> Self {
        self.where_clauses.push(fragment.into());
        self
    }

    pub fn order_by(mut self, fragment: impl Into<String>) -> Self {
        self.order_by.push(fragment.into());
        self
    }

    fn render_where(&self) -> Option<String> {
        let parsed = self.parsed_where.as_ref().map(|c| c.render(self.dialect));
        match (self.where_clauses.is_empty(), parsed) {
            (true, None) => None,
            (true, Some(parsed)) => Some(parsed),
            (false, None) => Some(self.where_clauses.join(" AND ")),
            (false, Some(parsed)) => Some(format!("{} AND ({})", self.where_clauses.join(" AND "), parsed)),
        }
    }

    fn projection(&self) -> String {
        match &self.forced_projection {
            Some(fields) => fields
                .iter()
                .map(|f| self.dialect.quote(f))
                .collect::<Vec<_>>()
                .join(", "),
            None => self.projection.clone(),
        }
    }

    /// Render the SELECT. When a fetch count is set and no ordering was given anywhere,
    /// the identity column orders the rows so OFFSET/FETCH is deterministic.
    pub fn build(&self) -> String {
        let mut sql = String::from("SELECT ");
        if let (Dialect::SqlServer, Some(top)) = (self.dialect, self.top) {
            sql.push_str(&format!("TOP {} ", top));
        }
        sql.push_str(&self.projection());
        sql.push_str(" FROM ");
        sql.push_str(&self.source);

        if let Some(where_clause) = self.render_where() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_clause);
        }

        let mut order: Vec<String> = self.order_by.clone();
        order.extend(self.parsed_order_by.iter().map(|t| t.render(self.dialect)));
        if self.fetch > 0 && order.is_empty() {
            order.push(self.dialect.quote(ID_COLUMN));
        }
        if !order.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }

        if self.fetch > 0 {
            sql.push(' ');
            sql.push_str(&self.dialect.paging(self.skip, self.fetch));
        }
        if let (Dialect::Postgres, Some(top)) = (self.dialect, self.top) {
            sql.push_str(&format!(" LIMIT {}", top));
        }
        sql
    }

    /// `SELECT COUNT(*)` over the same source and WHERE clause; projection, ordering
    /// and paging do not apply.
    pub fn build_count(&self) -> String {
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.source);
        if let Some(where_clause) = self.render_where() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_clause);
        }
        sql
    }
}

/// A catalog column. `data_type` is the type name placeholders are cast to, when
/// the dialect reports one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub data_type: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Column {
            name: name.into(),
            data_type: None,
        }
    }

    pub fn typed(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Column {
            name: name.into(),
            data_type: Some(data_type.into()),
        }
    }
}

fn data_type<'a>(columns: &'a [Column], name: &str) -> Option<&'a str> {
    columns
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name))
        .and_then(|c| c.data_type.as_deref())
}

/// INSERT returning the generated identity. `values` are (column, value) pairs in
/// catalog order; an empty list inserts a row of defaults. `columns` supplies the
/// placeholder casts and may be empty.
pub fn insert(dialect: Dialect, table: &str, values: &[(String, Value)], columns: &[Column]) -> Statement {
    let mut params = ParamCollector::new(dialect);
    let table = dialect.quote(table);
    let id = dialect.quote(ID_COLUMN);
    let cols: Vec<String> = values.iter().map(|(c, _)| dialect.quote(c)).collect();
    let placeholders: Vec<String> = values
        .iter()
        .map(|(c, v)| params.bind_as(c, v.clone(), data_type(columns, c)))
        .collect();

    let sql = match (dialect, values.is_empty()) {
        (Dialect::SqlServer, true) => format!("INSERT INTO {} OUTPUT INSERTED.{} DEFAULT VALUES", table, id),
        (Dialect::SqlServer, false) => format!(
            "INSERT INTO {} ({}) OUTPUT INSERTED.{} VALUES ({})",
            table,
            cols.join(", "),
            id,
            placeholders.join(", ")
        ),
        (Dialect::Postgres, true) => format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, id),
        (Dialect::Postgres, false) => format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            table,
            cols.join(", "),
            placeholders.join(", "),
            id
        ),
    };
    params.finish(sql)
}

/// UPDATE by identity. A null value in `assignments` renders as `= NULL`.
pub fn update(
    dialect: Dialect,
    table: &str,
    assignments: &[(String, Value)],
    id: &Value,
    columns: &[Column],
) -> Statement {
    let mut params = ParamCollector::new(dialect);
    let sets: Vec<String> = assignments
        .iter()
        .map(|(c, v)| format!("{} = {}", dialect.quote(c), params.bind_as(c, v.clone(), data_type(columns, c))))
        .collect();
    let id_ph = params.bind_as(ID_COLUMN, id.clone(), data_type(columns, ID_COLUMN));
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = {}",
        dialect.quote(table),
        sets.join(", "),
        dialect.quote(ID_COLUMN),
        id_ph
    );
    params.finish(sql)
}

/// `[id] = @id` with the identity cast taken from `columns`.
pub fn id_predicate(params: &mut ParamCollector, dialect: Dialect, id: &Value, columns: &[Column]) -> String {
    let id_ph = params.bind_as(ID_COLUMN, id.clone(), data_type(columns, ID_COLUMN));
    format!("{} = {}", dialect.quote(ID_COLUMN), id_ph)
}

pub fn delete(dialect: Dialect, table: &str, id: &Value, columns: &[Column]) -> Statement {
    let mut params = ParamCollector::new(dialect);
    let predicate = id_predicate(&mut params, dialect, id, columns);
    let sql = format!("DELETE FROM {} WHERE {}", dialect.quote(table), predicate);
    params.finish(sql)
}

/// One DELETE for a batch of identities: `WHERE [id] IN (@ids0, @ids1, ...)`.
pub fn delete_in(dialect: Dialect, table: &str, ids: &[Value], columns: &[Column]) -> Statement {
    let mut params = ParamCollector::new(dialect);
    let id_type = data_type(columns, ID_COLUMN);
    let placeholders: Vec<String> = ids
        .iter()
        .enumerate()
        .map(|(i, v)| params.bind_as(&format!("ids{}", i), v.clone(), id_type))
        .collect();
    let sql = format!(
        "DELETE FROM {} WHERE {} IN ({})",
        dialect.quote(table),
        dialect.quote(ID_COLUMN),
        placeholders.join(", ")
    );
    params.finish(sql)
}

pub fn columns(dialect: Dialect, table: &str) -> Statement {
    let mut params = ParamCollector::new(dialect);
    params.bind("tableName", Value::String(table.to_string()));
    params.finish(dialect.columns_query().to_string())
}

/// Rows to skip for a 1-based page, or `None` when the offset does not fit the
/// signed 64-bit OFFSET both dialects accept.
pub fn page_offset(page_size: u64, page_number: u64) -> Option<u64> {
    page_number
        .saturating_sub(1)
        .checked_mul(page_size)
        .filter(|offset| i64::try_from(*offset).is_ok())
}

pub fn total_pages(total_rows: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total_rows.div_ceil(page_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Intent, RequestModel};
    use serde_json::json;

    fn model_with(fields: &[(&str, &str)]) -> RequestModel {
        let mut model = RequestModel::new(Intent::RetrieveList);
        for (k, v) in fields {
            model.insert(k, json!(v));
        }
        model
    }

    #[test]
    fn plain_select() {
        let sql = SelectBuilder::new(Dialect::SqlServer).from_table("ToDo").build();
        assert_eq!(sql, "SELECT * FROM [ToDo]");
    }

    #[test]
    fn forced_projection_replaces_programmatic_one() {
        let model = model_with(&[("select", "a, b")]);
        let sql = SelectBuilder::from_model(&model, Dialect::SqlServer)
            .unwrap()
            .select("COUNT(*)")
            .from_table("t")
            .build();
        assert_eq!(sql, "SELECT [a], [b] FROM [t]");
    }

    #[test]
    fn parsed_filter_is_anded_with_programmatic_where() {
        let model = model_with(&[("filter", "age gt 18 or name eq 'Bob'")]);
        let sql = SelectBuilder::from_model(&model, Dialect::SqlServer)
            .unwrap()
            .from_table("people")
            .top(1)
            .where_clause("[id] = @id")
            .where_clause("[tenant] = 3")
            .build();
        assert_eq!(
            sql,
            "SELECT TOP 1 * FROM [people] WHERE [id] = @id AND [tenant] = 3 AND ([age] > 18 OR [name] = 'Bob')"
        );
    }

    #[test]
    fn parsed_order_follows_programmatic_order() {
        let model = model_with(&[("orderBy", "field1 desc, field2")]);
        let sql = SelectBuilder::from_model(&model, Dialect::SqlServer)
            .unwrap()
            .from_table("t")
            .order_by("[pinned] desc")
            .build();
        assert_eq!(sql, "SELECT * FROM [t] ORDER BY [pinned] desc, [field1] desc, [field2] asc");
    }

    #[test]
    fn paging_injects_identity_ordering_when_none_given() {
        let sql = SelectBuilder::new(Dialect::SqlServer)
            .from_table("t")
            .skip(20)
            .fetch(10)
            .build();
        assert_eq!(sql, "SELECT * FROM [t] ORDER BY [id] OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY");

        let ordered = SelectBuilder::new(Dialect::SqlServer)
            .from_table("t")
            .order_by("[name] asc")
            .fetch(5)
            .build();
        assert_eq!(ordered, "SELECT * FROM [t] ORDER BY [name] asc OFFSET 0 ROWS FETCH NEXT 5 ROWS ONLY");
    }

    #[test]
    fn count_ignores_projection_and_order() {
        let model = model_with(&[("filter", "done eq 1"), ("orderBy", "name"), ("select", "name")]);
        let builder = SelectBuilder::from_model(&model, Dialect::SqlServer).unwrap().from_table("t");
        assert_eq!(builder.build_count(), "SELECT COUNT(*) FROM [t] WHERE [done] = 1");
    }

    #[test]
    fn postgres_rendering() {
        let sql = SelectBuilder::new(Dialect::Postgres)
            .from_table("todo")
            .top(1)
            .where_clause("\"id\" = $1")
            .build();
        assert_eq!(sql, "SELECT * FROM \"todo\" WHERE \"id\" = $1 LIMIT 1");
    }

    #[test]
    fn invalid_mini_language_surfaces_from_the_builder() {
        let model = model_with(&[("select", "a b")]);
        assert!(matches!(
            SelectBuilder::from_model(&model, Dialect::SqlServer),
            Err(AppError::InvalidSelectClause(_))
        ));
        let model = model_with(&[("orderBy", "a up")]);
        assert!(matches!(
            SelectBuilder::from_model(&model, Dialect::SqlServer),
            Err(AppError::InvalidOrderByClause(_))
        ));
    }

    #[test]
    fn insert_statements() {
        let values = vec![("name".to_string(), json!("a")), ("done".to_string(), json!(false))];
        let stmt = insert(Dialect::SqlServer, "ToDo", &values, &[]);
        assert_eq!(stmt.sql, "INSERT INTO [ToDo] ([name], [done]) OUTPUT INSERTED.[id] VALUES (@name, @done)");
        assert_eq!(stmt.params, values);

        let pg = insert(Dialect::Postgres, "todo", &values, &[]);
        assert_eq!(pg.sql, "INSERT INTO \"todo\" (\"name\", \"done\") VALUES ($1, $2) RETURNING \"id\"");

        let defaults = insert(Dialect::SqlServer, "t", &[], &[]);
        assert_eq!(defaults.sql, "INSERT INTO [t] OUTPUT INSERTED.[id] DEFAULT VALUES");
    }

    #[test]
    fn update_and_delete_statements() {
        let sets = vec![("name".to_string(), json!("b")), ("note".to_string(), Value::Null)];
        let stmt = update(Dialect::SqlServer, "t", &sets, &json!(4), &[]);
        assert_eq!(stmt.sql, "UPDATE [t] SET [name] = @name, [note] = NULL WHERE [id] = @id");
        assert_eq!(stmt.params.len(), 2);

        assert_eq!(delete(Dialect::SqlServer, "t", &json!(4), &[]).sql, "DELETE FROM [t] WHERE [id] = @id");
        let batch = delete_in(Dialect::SqlServer, "t", &[json!(1), json!(2), json!(3)], &[]);
        assert_eq!(batch.sql, "DELETE FROM [t] WHERE [id] IN (@ids0, @ids1, @ids2)");
        assert_eq!(batch.params[2], ("ids2".to_string(), json!(3)));
        let pg = delete_in(Dialect::Postgres, "t", &[json!(1), json!(2)], &[]);
        assert_eq!(pg.sql, "DELETE FROM \"t\" WHERE \"id\" IN ($1, $2)");
    }

    #[test]
    fn postgres_placeholders_are_cast_to_catalog_types() {
        let columns = vec![
            Column::typed("id", "uuid"),
            Column::typed("created", "timestamptz"),
            Column::new("name"),
        ];
        let values = vec![
            ("created".to_string(), json!("2024-01-01T00:00:00Z")),
            ("name".to_string(), json!("a")),
        ];
        let stmt = insert(Dialect::Postgres, "audit", &values, &columns);
        assert_eq!(
            stmt.sql,
            "INSERT INTO \"audit\" (\"created\", \"name\") VALUES ($1::timestamptz, $2) RETURNING \"id\""
        );

        let id = json!("0b0e8f4e-5a43-4c8a-9d0c-2f6f1c7f0a11");
        let sets = vec![("created".to_string(), Value::Null), ("name".to_string(), json!("b"))];
        let stmt = update(Dialect::Postgres, "audit", &sets, &id, &columns);
        assert_eq!(stmt.sql, "UPDATE \"audit\" SET \"created\" = NULL, \"name\" = $1 WHERE \"id\" = $2::uuid");

        let stmt = delete_in(Dialect::Postgres, "audit", &[id.clone(), id], &columns);
        assert_eq!(stmt.sql, "DELETE FROM \"audit\" WHERE \"id\" IN ($1::uuid, $2::uuid)");

        let mssql = insert(Dialect::SqlServer, "audit", &values, &columns);
        assert_eq!(mssql.sql, "INSERT INTO [audit] ([created], [name]) OUTPUT INSERTED.[id] VALUES (@created, @name)");
    }

    #[test]
    fn paging_arithmetic() {
        assert_eq!(page_offset(10, 1), Some(0));
        assert_eq!(page_offset(10, 3), Some(20));
        assert_eq!(page_offset(10, i64::MAX as u64), None);
        assert_eq!(page_offset(2, (i64::MAX as u64) / 2 + 2), None);
        for (rows, pages) in [(0, 0), (1, 1), (9, 1), (10, 1), (11, 2), (100, 10)] {
            assert_eq!(total_pages(rows, 10), pages, "rows={}", rows);
        }
    }
}
