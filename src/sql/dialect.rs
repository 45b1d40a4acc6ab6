//! Dialect-specific rendering: identifier quoting, placeholders, row limits, returned identity.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Dialect {
    /// Bracket identifiers, `@name` parameters, `TOP n`, `OUTPUT INSERTED`.
    #[default]
    SqlServer,
    /// Double-quoted identifiers, `$n` parameters, `LIMIT n`, `RETURNING`.
    Postgres,
}

impl Dialect {
    /// Quote an identifier. Callers only pass names that passed field-name validation
    /// or came from the catalog; the closing delimiter is still doubled.
    pub fn quote(self, ident: &str) -> String {
        match self {
            Dialect::SqlServer => format!("[{}]", ident.replace(']', "]]")),
            Dialect::Postgres => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }

    /// Placeholder for a named parameter at 1-based `position`.
    pub fn placeholder(self, name: &str, position: usize) -> String {
        match self {
            Dialect::SqlServer => format!("@{}", name),
            Dialect::Postgres => format!("${}", position),
        }
    }

    /// Placeholder converted to the column's catalog type. Only PostgreSQL needs the
    /// explicit cast: text parameters do not coerce to `timestamptz`, `uuid` and friends.
    pub fn cast(self, placeholder: String, data_type: Option<&str>) -> String {
        match (self, data_type) {
            (Dialect::Postgres, Some(data_type)) => format!("{}::{}", placeholder, data_type),
            _ => placeholder,
        }
    }

    pub fn paging(self, skip: u64, fetch: u64) -> String {
        format!("OFFSET {} ROWS FETCH NEXT {} ROWS ONLY", skip, fetch)
    }

    /// Catalog query listing a table's columns in ordinal order. Binds `tableName`.
    /// PostgreSQL also returns each column's type name for placeholder casts.
    pub fn columns_query(self) -> &'static str {
        match self {
            Dialect::SqlServer => {
                "SELECT COLUMN_NAME FROM INFORMATION_SCHEMA.COLUMNS WHERE TABLE_NAME = @tableName ORDER BY ORDINAL_POSITION"
            }
            Dialect::Postgres => {
                "SELECT column_name::text, udt_name::text FROM information_schema.columns WHERE table_name = $1 AND table_schema = current_schema() ORDER BY ordinal_position"
            }
        }
    }
}
