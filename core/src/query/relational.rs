//! Lazy relational queries and their two-phase execution.

use core::marker::PhantomData;
use std::sync::Arc;

use compact_str::CompactString;
use relq_types::Dialect;
use serde::de::DeserializeOwned;

use crate::dialect::DialectExt;
use crate::error::Result;
use crate::schema::Schema;
use crate::session::{AsyncSession, PreparedQuery, RowMapper, Session};
use crate::sql::Query;

use super::config::QueryConfig;
use super::map::{RawRow, RelationalRow, map_relational_row};
use super::selection::Selection;

/// How the mapped rows of one execution are collected.
pub trait QueryMode {
    type Output<T>;

    fn collect<T>(rows: Vec<T>) -> Self::Output<T>;
}

/// Every row: `Vec<T>`, empty when nothing matched.
#[derive(Debug, Clone, Copy)]
pub struct Many;

/// The first row: `Option<T>`, `None` when nothing matched.
#[derive(Debug, Clone, Copy)]
pub struct First;

impl QueryMode for Many {
    type Output<T> = Vec<T>;

    fn collect<T>(rows: Vec<T>) -> Vec<T> {
        rows
    }
}

impl QueryMode for First {
    type Output<T> = Option<T>;

    fn collect<T>(rows: Vec<T>) -> Option<T> {
        rows.into_iter().next()
    }
}

/// Entry point of relational queries on one table.
#[derive(Debug)]
pub struct RelationalQueryBuilder<'s, S: ?Sized> {
    session: &'s S,
    dialect: Dialect,
    schema: Arc<Schema>,
    table: CompactString,
}

impl<S: ?Sized> Clone for RelationalQueryBuilder<'_, S> {
    fn clone(&self) -> Self {
        Self {
            session: self.session,
            dialect: self.dialect,
            schema: Arc::clone(&self.schema),
            table: self.table.clone(),
        }
    }
}

impl<'s, S: ?Sized> RelationalQueryBuilder<'s, S> {
    pub fn new(
        session: &'s S,
        dialect: Dialect,
        schema: Arc<Schema>,
        table: impl Into<CompactString>,
    ) -> Self {
        Self {
            session,
            dialect,
            schema,
            table: table.into(),
        }
    }

    /// Every matching row.
    pub fn find_many(&self, config: QueryConfig) -> RelationalQuery<'s, S, Many> {
        RelationalQuery::new(self, config)
    }

    /// The first matching row. Any limit in `config` is replaced by 1.
    pub fn find_first(&self, mut config: QueryConfig) -> RelationalQuery<'s, S, First> {
        config.set_limit(Some(1));
        RelationalQuery::new(self, config)
    }
}

/// A relational query, compiled only when prepared or executed.
#[derive(Debug)]
pub struct RelationalQuery<'s, S: ?Sized, M> {
    session: &'s S,
    dialect: Dialect,
    schema: Arc<Schema>,
    table: CompactString,
    config: QueryConfig,
    _mode: PhantomData<M>,
}

impl<'s, S: ?Sized, M: QueryMode> RelationalQuery<'s, S, M> {
    fn new(builder: &RelationalQueryBuilder<'s, S>, config: QueryConfig) -> Self {
        Self {
            session: builder.session,
            dialect: builder.dialect,
            schema: Arc::clone(&builder.schema),
            table: builder.table.clone(),
            config,
            _mode: PhantomData,
        }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    fn compile(&self) -> Result<(Query, Selection)> {
        let built = self
            .dialect
            .build_relational_query(&self.schema, &self.table, &self.config)?;
        Ok((self.dialect.sql_to_query(&built.sql), built.selection))
    }

    /// Renders the statement without running it.
    pub fn to_query(&self) -> Result<Query> {
        self.compile().map(|(query, _)| query)
    }

    fn mapper<T, F>(&self, selection: Selection, convert: F) -> RowMapper<'s, M::Output<T>>
    where
        F: Fn(RelationalRow) -> Result<T> + Send + Sync + 's,
    {
        let schema = Arc::clone(&self.schema);
        let table = self.table.clone();
        Box::new(move |rows: Vec<RawRow>| {
            let table = schema.require_table(&table)?;
            let mapped = rows
                .iter()
                .map(|row| map_relational_row(&schema, table, row, &selection).and_then(&convert))
                .collect::<Result<Vec<_>>>()?;
            Ok(M::collect(mapped))
        })
    }
}

fn deserialize<T: DeserializeOwned>(row: RelationalRow) -> Result<T> {
    Ok(serde_json::from_value(serde_json::Value::Object(row))?)
}

impl<'s, S: Session, M: QueryMode> RelationalQuery<'s, S, M> {
    /// Compiles the query once under `name` for repeated execution.
    pub fn prepare(self, name: &str) -> Result<PreparedQuery<'s, S, M::Output<RelationalRow>>> {
        let (query, selection) = self.compile()?;
        let mapper = self.mapper(selection, Ok);
        self.session.prepare_query(query, Some(name), mapper)
    }

    /// Like [`RelationalQuery::prepare`], deserializing rows into `T`.
    pub fn prepare_as<T>(self, name: &str) -> Result<PreparedQuery<'s, S, M::Output<T>>>
    where
        T: DeserializeOwned + 's,
    {
        let (query, selection) = self.compile()?;
        let mapper = self.mapper(selection, deserialize::<T>);
        self.session.prepare_query(query, Some(name), mapper)
    }

    /// Compiles and runs the query.
    pub fn execute(self) -> Result<M::Output<RelationalRow>> {
        let (query, selection) = self.compile()?;
        let mapper = self.mapper(selection, Ok);
        self.session.prepare_query(query, None, mapper)?.execute()
    }

    /// Compiles and runs the query, deserializing rows into `T`.
    pub fn execute_as<T>(self) -> Result<M::Output<T>>
    where
        T: DeserializeOwned + 's,
    {
        let (query, selection) = self.compile()?;
        let mapper = self.mapper(selection, deserialize::<T>);
        self.session.prepare_query(query, None, mapper)?.execute()
    }
}

impl<'s, S: AsyncSession + Sync, M: QueryMode> RelationalQuery<'s, S, M> {
    /// Compiles the query once under `name` for repeated execution.
    pub async fn prepare_async(
        self,
        name: &str,
    ) -> Result<PreparedQuery<'s, S, M::Output<RelationalRow>>> {
        let (query, selection) = self.compile()?;
        let mapper = self.mapper(selection, Ok);
        self.session.prepare_query(query, Some(name), mapper).await
    }

    /// Compiles and runs the query.
    pub async fn execute_async(self) -> Result<M::Output<RelationalRow>> {
        let (query, selection) = self.compile()?;
        let mapper = self.mapper(selection, Ok);
        self.session
            .prepare_query(query, None, mapper)
            .await?
            .execute_async()
            .await
    }

    /// Compiles and runs the query, deserializing rows into `T`.
    pub async fn execute_as_async<T>(self) -> Result<M::Output<T>>
    where
        T: DeserializeOwned + 's,
    {
        let (query, selection) = self.compile()?;
        let mapper = self.mapper(selection, deserialize::<T>);
        self.session
            .prepare_query(query, None, mapper)
            .await?
            .execute_async()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{integer, text};
    use crate::expressions::asc;
    use crate::relation::{many, one};
    use crate::schema::SchemaBuilder;
    use crate::table::TableBuilder;
    use crate::value::Value;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Session returning canned rows and recording what it was asked to run.
    #[derive(Default)]
    struct FakeSession {
        dialect: Dialect,
        rows: Vec<RawRow>,
        prepared: AtomicUsize,
        executed: AtomicUsize,
        seen: Mutex<Vec<Query>>,
    }

    impl FakeSession {
        fn with_rows(rows: Vec<RawRow>) -> Self {
            Self {
                rows,
                ..Self::default()
            }
        }
    }

    impl Session for FakeSession {
        fn dialect(&self) -> Dialect {
            self.dialect
        }

        fn prepare(&self, _query: &Query, _name: Option<&str>) -> Result<()> {
            self.prepared.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn all(&self, query: &Query) -> Result<Vec<RawRow>> {
            self.executed.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(query.clone());
            Ok(self.rows.clone())
        }

        fn execute(&self, _query: &Query) -> Result<u64> {
            Ok(0)
        }
    }

    impl AsyncSession for FakeSession {
        fn dialect(&self) -> Dialect {
            self.dialect
        }

        async fn all(&self, query: &Query) -> Result<Vec<RawRow>> {
            Session::all(self, query)
        }

        async fn execute(&self, _query: &Query) -> Result<u64> {
            Ok(0)
        }
    }

    fn schema() -> Arc<Schema> {
        SchemaBuilder::new()
            .table(
                TableBuilder::new("users")
                    .column("id", integer().primary_key())
                    .column("name", text().not_null()),
            )
            .table(
                TableBuilder::new("posts")
                    .column("id", integer().primary_key())
                    .column("authorId", integer().not_null())
                    .column("title", text().not_null()),
            )
            .relations("users", [("posts", many("posts"))])
            .relations(
                "posts",
                [("author", one("users").fields(["authorId"]).references(["id"]))],
            )
            .finalize()
            .unwrap()
    }

    fn user_rows() -> Vec<RawRow> {
        vec![
            vec![
                Value::Integer(1),
                Value::from("ann"),
                Value::from(r#"[{"id":10,"title":"a"},{"id":11,"title":"b"}]"#),
            ],
            vec![
                Value::Integer(2),
                Value::from("bob"),
                Value::from(r#"[{"id":12,"title":"c"}]"#),
            ],
            vec![Value::Integer(3), Value::from("cy"), Value::from("[]")],
        ]
    }

    fn with_posts() -> QueryConfig {
        QueryConfig::new()
            .columns(["id", "name"])
            .with("posts", QueryConfig::new().columns(["id", "title"]).order_by(asc("id")))
    }

    #[test]
    fn test_prepare_compiles_once() {
        let session = FakeSession::with_rows(user_rows());
        let users = RelationalQueryBuilder::new(&session, Dialect::SQLite, schema(), "users");

        let prepared = users.find_many(with_posts()).prepare("users_with_posts").unwrap();
        for _ in 0..3 {
            assert_eq!(prepared.execute().unwrap().len(), 3);
        }

        assert_eq!(prepared.name(), Some("users_with_posts"));
        assert_eq!(session.prepared.load(Ordering::SeqCst), 1);
        assert_eq!(session.executed.load(Ordering::SeqCst), 3);
        let seen = session.seen.lock().unwrap();
        assert!(seen.iter().all(|q| q.text == prepared.query().text));
    }

    #[test]
    fn test_children_stay_with_their_parent() {
        let session = FakeSession::with_rows(user_rows());
        let users = RelationalQueryBuilder::new(&session, Dialect::SQLite, schema(), "users");
        let rows = users.find_many(with_posts()).execute().unwrap();

        let titles: Vec<Vec<&str>> = rows
            .iter()
            .map(|row| {
                row["posts"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|p| p["title"].as_str().unwrap())
                    .collect()
            })
            .collect();
        assert_eq!(titles, vec![vec!["a", "b"], vec!["c"], vec![]]);
    }

    #[test]
    fn test_find_first_overrides_limit() {
        let session = FakeSession::with_rows(user_rows());
        let users = RelationalQueryBuilder::new(&session, Dialect::SQLite, schema(), "users");

        let query = users.find_first(QueryConfig::new().limit(50));
        assert_eq!(query.config().get_limit(), Some(1));
        assert!(query.to_query().unwrap().text.ends_with(" LIMIT 1"));

        let first = users.find_first(with_posts()).execute().unwrap().unwrap();
        assert_eq!(first["name"], json!("ann"));
    }

    #[test]
    fn test_empty_results_are_not_errors() {
        let session = FakeSession::default();
        let users = RelationalQueryBuilder::new(&session, Dialect::SQLite, schema(), "users");

        assert!(users.find_many(QueryConfig::new()).execute().unwrap().is_empty());
        assert!(users.find_first(QueryConfig::new()).execute().unwrap().is_none());
    }

    #[test]
    fn test_execute_as_deserializes() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Post {
            id: i64,
            title: String,
        }

        #[derive(Debug, Deserialize, PartialEq)]
        struct User {
            id: i64,
            name: String,
            posts: Vec<Post>,
        }

        let session = FakeSession::with_rows(user_rows());
        let users = RelationalQueryBuilder::new(&session, Dialect::SQLite, schema(), "users");
        let rows: Vec<User> = users.find_many(with_posts()).execute_as().unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[1],
            User {
                id: 2,
                name: "bob".into(),
                posts: vec![Post {
                    id: 12,
                    title: "c".into()
                }],
            }
        );
    }

    #[test]
    fn test_unknown_table_fails_at_compile() {
        let session = FakeSession::default();
        let ghosts = RelationalQueryBuilder::new(&session, Dialect::SQLite, schema(), "ghosts");
        let query = ghosts.find_many(QueryConfig::new());
        assert!(query.execute().is_err());
        assert_eq!(session.executed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_async_prepare_and_execute() {
        let session = FakeSession {
            dialect: Dialect::PostgreSQL,
            ..FakeSession::with_rows(user_rows())
        };
        let users = RelationalQueryBuilder::new(&session, Dialect::PostgreSQL, schema(), "users");

        let prepared = users
            .find_many(with_posts().r#where(crate::expressions::gt("id", 0)))
            .prepare_async("pg_users")
            .await
            .unwrap();
        assert!(prepared.query().text.contains("$1"));
        assert_eq!(prepared.execute_async().await.unwrap().len(), 3);
        assert_eq!(prepared.execute_async().await.unwrap().len(), 3);
        assert_eq!(session.executed.load(Ordering::SeqCst), 2);

        let first = users
            .find_first(QueryConfig::new().columns(["id"]))
            .execute_async()
            .await;
        assert!(first.is_err(), "canned rows are wider than the selection");
    }
}
