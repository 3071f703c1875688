//! Dialect type re-exported from relq-types with core-specific extensions.

use std::borrow::Cow;

pub use relq_types::Dialect;

use crate::error::Result;
use crate::query::{BuiltRelationalQuery, QueryConfig};
use crate::schema::Schema;
use crate::sql::{Query, SQL};

/// Extension trait for dialect-specific SQL rendering
pub trait DialectExt {
    /// Renders a placeholder for this dialect with the given 1-based index.
    ///
    /// Returns `Cow::Borrowed("?")` for SQLite (zero allocation),
    /// `Cow::Owned` for PostgreSQL numbered placeholders.
    fn render_placeholder(&self, index: usize) -> Cow<'static, str>;

    /// Renders a SQL fragment into statement text and bind parameters.
    fn sql_to_query(&self, sql: &SQL) -> Query;

    /// Builds the relational query for `table` under `config`.
    fn build_relational_query(
        &self,
        schema: &Schema,
        table: &str,
        config: &QueryConfig,
    ) -> Result<BuiltRelationalQuery>;

    /// `json_object(` / `json_build_object(`
    fn json_object_fn(&self) -> &'static str;

    /// Opens the JSON array aggregate of a many-relation.
    fn json_array_agg_open(&self) -> &'static str;

    /// Closes the JSON array aggregate of a many-relation.
    fn json_array_agg_close(&self) -> &'static str;
}

impl DialectExt for Dialect {
    #[inline]
    fn render_placeholder(&self, index: usize) -> Cow<'static, str> {
        if self.uses_numbered_placeholders() {
            Cow::Owned(format!("${index}"))
        } else {
            Cow::Borrowed("?")
        }
    }

    fn sql_to_query(&self, sql: &SQL) -> Query {
        sql.build(*self)
    }

    fn build_relational_query(
        &self,
        schema: &Schema,
        table: &str,
        config: &QueryConfig,
    ) -> Result<BuiltRelationalQuery> {
        crate::query::build_relational_query(*self, schema, table, config)
    }

    fn json_object_fn(&self) -> &'static str {
        match self {
            Dialect::SQLite => "json_object(",
            Dialect::PostgreSQL => "json_build_object(",
        }
    }

    fn json_array_agg_open(&self) -> &'static str {
        match self {
            Dialect::SQLite => "json_group_array(",
            Dialect::PostgreSQL => "COALESCE(json_agg(",
        }
    }

    fn json_array_agg_close(&self) -> &'static str {
        match self {
            Dialect::SQLite => ")",
            Dialect::PostgreSQL => "), '[]'::json)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_placeholder() {
        assert_eq!(Dialect::SQLite.render_placeholder(3), "?");
        assert_eq!(Dialect::PostgreSQL.render_placeholder(3), "$3");
    }

    #[test]
    fn test_sql_to_query() {
        let sql = SQL::raw("SELECT ").append(SQL::param(1));
        let q = Dialect::PostgreSQL.sql_to_query(&sql);
        assert_eq!(q.text, "SELECT $1");
        assert_eq!(q.params.len(), 1);
    }
}
