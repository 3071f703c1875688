#![allow(dead_code)]

use relq::prelude::*;
use relq::query::RelationalRow;
use relq::{Config, Database, RusqliteSession};

/// users 1..=3, posts 1..=3, comments 1..=3.
///
/// alice (1) wrote posts 1 and 2, bob (2) wrote post 3, carol (3) wrote
/// nothing. Post 2 has no editor and no comments.
const SEED: &str = r#"
INSERT INTO "users" ("id", "name", "active", "avatar", "profile") VALUES
    (1, 'alice', 1, X'CAFE', '{"theme":"dark","tags":["a","b"]}'),
    (2, 'bob', 0, NULL, NULL),
    (3, 'carol', 1, NULL, NULL);
INSERT INTO "posts" ("id", "authorId", "editorId", "title", "score") VALUES
    (1, 1, 2, 'first', 1.5),
    (2, 1, NULL, 'second', 2),
    (3, 2, 1, 'third', NULL);
INSERT INTO "comments" ("id", "postId", "body") VALUES
    (1, 1, 'nice'),
    (2, 1, 'agreed'),
    (3, 3, 'hm');
"#;

pub fn blog_schema() -> SchemaBuilder {
    SchemaBuilder::new()
        .table(
            TableBuilder::new("users")
                .column("id", integer().primary_key())
                .column("name", text().not_null().unique())
                .column("active", boolean().not_null().default(true))
                .column("avatar", blob())
                .column("profile", json()),
        )
        .table(
            TableBuilder::new("posts")
                .column("id", integer().primary_key())
                .column(
                    "authorId",
                    integer().not_null().references(
                        ("users", "id"),
                        ReferenceActions::new().on_delete(ReferentialAction::Cascade),
                    ),
                )
                .column(
                    "editorId",
                    integer().references(("users", "id"), ReferenceActions::new()),
                )
                .column("title", text().not_null())
                .column("score", real()),
        )
        .table(
            TableBuilder::new("comments")
                .column("id", integer().primary_key())
                .column(
                    "postId",
                    integer().not_null().references(
                        ("posts", "id"),
                        ReferenceActions::new().on_delete(ReferentialAction::Cascade),
                    ),
                )
                .column("body", text().not_null()),
        )
        .relations(
            "users",
            [
                ("posts", many("posts").relation_name("author")),
                ("edited", many("posts").relation_name("editor")),
            ],
        )
        .relations(
            "posts",
            [
                (
                    "author",
                    one("users")
                        .fields(["authorId"])
                        .references(["id"])
                        .relation_name("author"),
                ),
                (
                    "editor",
                    one("users")
                        .fields(["editorId"])
                        .references(["id"])
                        .relation_name("editor"),
                ),
                ("comments", many("comments")),
            ],
        )
        .relations(
            "comments",
            [("post", one("posts").fields(["postId"]).references(["id"]))],
        )
}

/// An in-memory database with the blog tables created and empty.
pub fn empty_db() -> Database<RusqliteSession> {
    let conn = ::rusqlite::Connection::open_in_memory().unwrap();
    let db = Database::from_builder(RusqliteSession::new(conn), blog_schema(), Config::default())
        .unwrap();
    db.create_tables().unwrap();
    db
}

/// An in-memory database with the blog tables created and seeded.
pub fn setup_db() -> Database<RusqliteSession> {
    let db = empty_db();
    db.session().conn().execute_batch(SEED).unwrap();
    db
}

/// Wraps rows into one JSON array for whole-result comparisons.
pub fn as_json(rows: Vec<RelationalRow>) -> serde_json::Value {
    serde_json::Value::Array(rows.into_iter().map(serde_json::Value::Object).collect())
}
