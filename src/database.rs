//! The [`Database`] facade: a session paired with a finalized schema.

use std::future::Future;
use std::sync::Arc;

use relq_core::ddl::create_table_sql;
use relq_core::query::{RawRow, RelationalQueryBuilder};
use relq_core::{AsyncSession, Dialect, Query, RelqError, Result, Schema, SchemaBuilder, Session};

use crate::config::Config;

/// A session bound to a schema.
///
/// `Database` is itself a [`Session`] (or [`AsyncSession`]) that delegates to
/// the wrapped driver, so relational queries built from [`Database::query`]
/// run through it and pick up statement logging.
#[derive(Debug)]
pub struct Database<S> {
    session: S,
    schema: Arc<Schema>,
    config: Config,
}

impl<S> Database<S> {
    fn checked(
        session: S,
        session_dialect: Dialect,
        schema: Arc<Schema>,
        config: Config,
    ) -> Result<Self> {
        if session_dialect != config.dialect {
            return Err(RelqError::DialectMismatch {
                session: session_dialect,
                config: config.dialect,
            });
        }
        Ok(Self {
            session,
            schema,
            config,
        })
    }

    /// Relational queries rooted at the table registered under `table`.
    pub fn query(&self, table: &str) -> RelationalQueryBuilder<'_, Self> {
        RelationalQueryBuilder::new(self, self.config.dialect, Arc::clone(&self.schema), table)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Gives back the wrapped session.
    pub fn into_session(self) -> S {
        self.session
    }

    fn ddl(&self) -> impl Iterator<Item = Query> + '_ {
        self.schema.tables().iter().map(|table| Query {
            text: create_table_sql(self.config.dialect, table),
            params: Vec::new(),
        })
    }

    fn log(&self, query: &Query) {
        #[cfg(feature = "tracing")]
        if self.config.logger {
            tracing::info!(target: "relq", sql = %query.text, params = ?query.params, "query");
        }
        #[cfg(not(feature = "tracing"))]
        let _ = query;
    }
}

impl<S: Session> Database<S> {
    /// Wraps a blocking session. Fails when the session and `config` disagree
    /// on the dialect.
    pub fn new(session: S, schema: Arc<Schema>, config: Config) -> Result<Self> {
        let dialect = session.dialect();
        Self::checked(session, dialect, schema, config)
    }

    /// Finalizes `builder` with the configured casing and wraps `session`.
    pub fn from_builder(session: S, builder: SchemaBuilder, config: Config) -> Result<Self> {
        let schema = builder.casing(config.casing).finalize()?;
        Self::new(session, schema, config)
    }

    /// Runs `CREATE TABLE IF NOT EXISTS` for every table, in declaration order.
    pub fn create_tables(&self) -> Result<()> {
        for query in self.ddl() {
            Session::execute(self, &query)?;
        }
        Ok(())
    }
}

impl<S: AsyncSession + Sync> Database<S> {
    /// Wraps an asynchronous session.
    pub fn new_async(session: S, schema: Arc<Schema>, config: Config) -> Result<Self> {
        let dialect = AsyncSession::dialect(&session);
        Self::checked(session, dialect, schema, config)
    }

    /// Async counterpart of [`Database::create_tables`].
    pub async fn create_tables_async(&self) -> Result<()> {
        for query in self.ddl() {
            AsyncSession::execute(self, &query).await?;
        }
        Ok(())
    }
}

impl<S: Session> Session for Database<S> {
    fn dialect(&self) -> Dialect {
        self.session.dialect()
    }

    fn prepare(&self, query: &Query, name: Option<&str>) -> Result<()> {
        self.session.prepare(query, name)
    }

    fn all(&self, query: &Query) -> Result<Vec<RawRow>> {
        self.log(query);
        self.session.all(query)
    }

    fn execute(&self, query: &Query) -> Result<u64> {
        self.log(query);
        self.session.execute(query)
    }
}

impl<S: AsyncSession + Sync> AsyncSession for Database<S> {
    fn dialect(&self) -> Dialect {
        AsyncSession::dialect(&self.session)
    }

    fn prepare(
        &self,
        query: &Query,
        name: Option<&str>,
    ) -> impl Future<Output = Result<()>> + Send {
        AsyncSession::prepare(&self.session, query, name)
    }

    fn all(&self, query: &Query) -> impl Future<Output = Result<Vec<RawRow>>> + Send {
        self.log(query);
        AsyncSession::all(&self.session, query)
    }

    fn execute(&self, query: &Query) -> impl Future<Output = Result<u64>> + Send {
        self.log(query);
        AsyncSession::execute(&self.session, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relq_core::prelude::*;
    use std::sync::Mutex;

    /// Records statements and answers `all` with no rows.
    #[derive(Debug, Default)]
    struct Recorder {
        dialect: Dialect,
        seen: Mutex<Vec<String>>,
    }

    impl Session for Recorder {
        fn dialect(&self) -> Dialect {
            self.dialect
        }

        fn all(&self, query: &Query) -> Result<Vec<RawRow>> {
            self.seen.lock().unwrap().push(query.text.clone());
            Ok(Vec::new())
        }

        fn execute(&self, query: &Query) -> Result<u64> {
            self.seen.lock().unwrap().push(query.text.clone());
            Ok(0)
        }
    }

    fn schema() -> SchemaBuilder {
        SchemaBuilder::new()
            .table(
                TableBuilder::new("users")
                    .column("id", integer().primary_key())
                    .column("displayName", text()),
            )
            .table(
                TableBuilder::new("posts")
                    .column("id", integer().primary_key())
                    .column(
                        "authorId",
                        integer()
                            .not_null()
                            .references(("users", "id"), ReferenceActions::new()),
                    ),
            )
            .relations("users", [("posts", many("posts"))])
    }

    #[test]
    fn test_dialect_mismatch() {
        let config = Config {
            dialect: Dialect::PostgreSQL,
            ..Config::default()
        };
        let err = Database::from_builder(Recorder::default(), schema(), config).unwrap_err();
        assert!(matches!(
            err,
            RelqError::DialectMismatch {
                session: Dialect::SQLite,
                config: Dialect::PostgreSQL
            }
        ));
    }

    #[test]
    fn test_from_builder_applies_casing() {
        let config = Config {
            casing: relq_core::Casing::SnakeCase,
            ..Config::default()
        };
        let db = Database::from_builder(Recorder::default(), schema(), config).unwrap();
        let users = db.schema().table("users").unwrap();
        assert_eq!(users.column("displayName").unwrap().name(), "display_name");
    }

    #[test]
    fn test_create_tables_in_declaration_order() {
        let db = Database::from_builder(Recorder::default(), schema(), Config::default()).unwrap();
        db.create_tables().unwrap();

        let seen = db.session().seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].starts_with("CREATE TABLE IF NOT EXISTS \"users\""));
        assert!(seen[1].starts_with("CREATE TABLE IF NOT EXISTS \"posts\""));
    }

    #[test]
    fn test_query_runs_through_session() {
        let db = Database::from_builder(Recorder::default(), schema(), Config::default()).unwrap();
        let rows = db
            .query("users")
            .find_many(QueryConfig::new().with("posts", QueryConfig::new()))
            .execute()
            .unwrap();
        assert!(rows.is_empty());
        assert_eq!(db.session().seen.lock().unwrap().len(), 1);
    }
}
