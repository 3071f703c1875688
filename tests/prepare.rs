#![cfg(feature = "rusqlite")]
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use relq::prelude::*;
use relq::query::RawRow;
use relq::{AsyncSession, Config, Database, Dialect, Query, RelqError, RusqliteSession, Session};
use serde_json::json;
mod common;

use common::{as_json, blog_schema, setup_db};

/// Counts driver round trips on top of a rusqlite session.
struct Counting {
    inner: RusqliteSession,
    prepared: AtomicUsize,
    executed: AtomicUsize,
}

impl Session for Counting {
    fn dialect(&self) -> Dialect {
        self.inner.dialect()
    }

    fn prepare(&self, query: &Query, name: Option<&str>) -> relq::Result<()> {
        self.prepared.fetch_add(1, Ordering::SeqCst);
        self.inner.prepare(query, name)
    }

    fn all(&self, query: &Query) -> relq::Result<Vec<RawRow>> {
        self.executed.fetch_add(1, Ordering::SeqCst);
        self.inner.all(query)
    }

    fn execute(&self, query: &Query) -> relq::Result<u64> {
        self.inner.execute(query)
    }
}

fn counting_db() -> Database<Counting> {
    let seeded = setup_db();
    let session = Counting {
        inner: seeded.into_session(),
        prepared: AtomicUsize::new(0),
        executed: AtomicUsize::new(0),
    };
    Database::from_builder(session, blog_schema(), Config::default()).unwrap()
}

#[test]
fn test_prepare_once_execute_many() {
    let db = counting_db();

    let prepared = db
        .query("users")
        .find_many(
            QueryConfig::new()
                .columns(["name"])
                .with("posts", QueryConfig::new().columns(["id"]).order_by(asc("id")))
                .order_by(asc("id")),
        )
        .prepare("users_with_posts")
        .unwrap();
    assert_eq!(prepared.name(), Some("users_with_posts"));

    let first = prepared.execute().unwrap();
    db.session()
        .inner
        .conn()
        .execute_batch(r#"INSERT INTO "posts" ("id", "authorId", "title") VALUES (4, 3, 'fourth')"#)
        .unwrap();
    let second = prepared.execute().unwrap();
    let third = prepared.execute().unwrap();

    assert_eq!(db.session().prepared.load(Ordering::SeqCst), 1);
    assert_eq!(db.session().executed.load(Ordering::SeqCst), 3);

    assert_eq!(
        as_json(first),
        json!([
            {"name": "alice", "posts": [{"id": 1}, {"id": 2}]},
            {"name": "bob", "posts": [{"id": 3}]},
            {"name": "carol", "posts": []}
        ])
    );
    assert_eq!(second, third);
    assert_eq!(
        as_json(second),
        json!([
            {"name": "alice", "posts": [{"id": 1}, {"id": 2}]},
            {"name": "bob", "posts": [{"id": 3}]},
            {"name": "carol", "posts": [{"id": 4}]}
        ])
    );
}

#[test]
fn test_prepared_queries_do_not_share_state() {
    let db = counting_db();

    let alice = db
        .query("users")
        .find_first(QueryConfig::new().columns(["name"]).r#where(eq("id", 1)))
        .prepare("alice")
        .unwrap();
    let bob = db
        .query("users")
        .find_first(QueryConfig::new().columns(["name"]).r#where(eq("id", 2)))
        .prepare("bob")
        .unwrap();

    assert_eq!(alice.query().params, vec![relq::Value::Integer(1)]);
    assert_eq!(bob.query().params, vec![relq::Value::Integer(2)]);
    for _ in 0..2 {
        assert_eq!(
            alice.execute().unwrap().map(serde_json::Value::Object),
            Some(json!({"name": "alice"}))
        );
        assert_eq!(
            bob.execute().unwrap().map(serde_json::Value::Object),
            Some(json!({"name": "bob"}))
        );
    }
    assert_eq!(db.session().prepared.load(Ordering::SeqCst), 2);
}

#[test]
fn test_prepare_as() {
    #[derive(Debug, serde::Deserialize, PartialEq)]
    struct Title {
        title: String,
    }

    let db = counting_db();
    let prepared = db
        .query("posts")
        .find_many(QueryConfig::new().columns(["title"]).order_by(desc("id")))
        .prepare_as::<Title>("titles")
        .unwrap();

    let titles = prepared.execute().unwrap();
    assert_eq!(
        titles.into_iter().map(|t| t.title).collect::<Vec<_>>(),
        ["third", "second", "first"]
    );
}

#[test]
fn test_compile_errors_surface_at_prepare() {
    let db = counting_db();

    let err = db
        .query("users")
        .find_many(QueryConfig::new().columns(["email"]))
        .prepare("bad")
        .unwrap_err();
    assert!(matches!(err, RelqError::UnknownColumn { .. }));
    assert_eq!(db.session().prepared.load(Ordering::SeqCst), 0);

    let err = db
        .query("accounts")
        .find_many(QueryConfig::new())
        .prepare("bad")
        .unwrap_err();
    assert!(matches!(err, RelqError::UnknownTable(_)));
}

/// Serves an async API from a blocking connection.
struct AsyncSqlite(Mutex<RusqliteSession>);

impl AsyncSession for AsyncSqlite {
    fn dialect(&self) -> Dialect {
        Dialect::SQLite
    }

    fn all(
        &self,
        query: &Query,
    ) -> impl std::future::Future<Output = relq::Result<Vec<RawRow>>> + Send {
        let rows = self.0.lock().unwrap().all(query);
        async move { rows }
    }

    fn execute(&self, query: &Query) -> impl std::future::Future<Output = relq::Result<u64>> + Send {
        let changed = Session::execute(&*self.0.lock().unwrap(), query);
        async move { changed }
    }
}

#[tokio::test]
async fn test_async_session() {
    let conn = ::rusqlite::Connection::open_in_memory().unwrap();
    let session = AsyncSqlite(Mutex::new(RusqliteSession::new(conn)));
    let schema = blog_schema().finalize().unwrap();
    let db = Database::new_async(session, schema, Config::default()).unwrap();
    db.create_tables_async().await.unwrap();

    db.session()
        .0
        .lock()
        .unwrap()
        .conn()
        .execute_batch(
            r#"INSERT INTO "users" ("id", "name") VALUES (1, 'alice');
               INSERT INTO "posts" ("id", "authorId", "title") VALUES (1, 1, 'hello');"#,
        )
        .unwrap();

    let users = db
        .query("users")
        .find_many(
            QueryConfig::new()
                .columns(["name"])
                .with("posts", QueryConfig::new().columns(["title"])),
        )
        .execute_async()
        .await
        .unwrap();
    assert_eq!(
        as_json(users),
        json!([{"name": "alice", "posts": [{"title": "hello"}]}])
    );

    let prepared = db
        .query("users")
        .find_first(QueryConfig::new().columns(["id"]))
        .prepare_async("first_user")
        .await
        .unwrap();
    for _ in 0..2 {
        let user = prepared.execute_async().await.unwrap();
        assert_eq!(user.map(serde_json::Value::Object), Some(json!({"id": 1})));
    }
}
