//! Synchronous SQLite session using [`rusqlite`].
//!
//! # Example
//!
//! ```no_run
//! use relq::prelude::*;
//! use relq::RusqliteSession;
//! use relq::{Config, Database};
//!
//! fn main() -> relq::Result<()> {
//!     let conn = ::rusqlite::Connection::open_in_memory()?;
//!     let schema = SchemaBuilder::new().table(
//!         TableBuilder::new("users")
//!             .column("id", integer().primary_key())
//!             .column("name", text().not_null()),
//!     );
//!     let db = Database::from_builder(RusqliteSession::new(conn), schema, Config::default())?;
//!     db.create_tables()?;
//!
//!     let users = db.query("users").find_many(QueryConfig::new()).execute()?;
//!     assert!(users.is_empty());
//!     Ok(())
//! }
//! ```

use relq_core::query::RawRow;
use relq_core::row::raw_row;
use relq_core::{Dialect, Query, Result, Session};
use ::rusqlite::{Connection, params_from_iter};

/// A [`Session`] over one rusqlite connection.
///
/// Statements go through the connection's statement cache, so a prepared
/// relational query is compiled by SQLite once and reused on every execution.
#[derive(Debug)]
pub struct RusqliteSession {
    conn: Connection,
}

impl RusqliteSession {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Gives back the connection.
    pub fn into_inner(self) -> Connection {
        self.conn
    }
}

impl From<Connection> for RusqliteSession {
    fn from(conn: Connection) -> Self {
        Self::new(conn)
    }
}

impl Session for RusqliteSession {
    fn dialect(&self) -> Dialect {
        Dialect::SQLite
    }

    fn prepare(&self, query: &Query, _name: Option<&str>) -> Result<()> {
        self.conn.prepare_cached(&query.text)?;
        Ok(())
    }

    fn all(&self, query: &Query) -> Result<Vec<RawRow>> {
        let mut stmt = self.conn.prepare_cached(&query.text)?;
        let width = stmt.column_count();
        let mut rows = stmt.query(params_from_iter(query.params.iter()))?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(raw_row(row, width)?);
        }
        Ok(out)
    }

    fn execute(&self, query: &Query) -> Result<u64> {
        let changed = self
            .conn
            .execute(&query.text, params_from_iter(query.params.iter()))?;
        Ok(changed as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relq_core::Value;

    #[test]
    fn test_execute_and_all() {
        let session = RusqliteSession::new(Connection::open_in_memory().unwrap());
        session
            .execute(&Query {
                text: "CREATE TABLE t (a INTEGER, b TEXT)".into(),
                params: vec![],
            })
            .unwrap();
        let inserted = session
            .execute(&Query {
                text: "INSERT INTO t VALUES (?, ?), (?, ?)".into(),
                params: vec![Value::Integer(1), "x".into(), Value::Integer(2), Value::Null],
            })
            .unwrap();
        assert_eq!(inserted, 2);

        let rows = session
            .all(&Query {
                text: "SELECT a, b FROM t WHERE a > ? ORDER BY a".into(),
                params: vec![Value::Integer(0)],
            })
            .unwrap();
        assert_eq!(
            rows,
            vec![
                vec![Value::Integer(1), Value::from("x")],
                vec![Value::Integer(2), Value::Null],
            ]
        );
    }

    #[test]
    fn test_prepare_rejects_invalid_sql() {
        let session = RusqliteSession::new(Connection::open_in_memory().unwrap());
        let err = session
            .prepare(
                &Query {
                    text: "SELEC nothing".into(),
                    params: vec![],
                },
                Some("broken"),
            )
            .unwrap_err();
        assert!(matches!(err, relq_core::RelqError::Driver(_)));
    }
}
