//! # relq
//!
//! A relational query builder for SQLite and PostgreSQL: declare tables and
//! relations once, then load a table together with nested relations in a
//! single statement.
//!
//! ## Quick Start
//!
//! ```rust
//! # #[cfg(feature = "rusqlite")]
//! # fn main() -> relq::Result<()> {
//! use relq::prelude::*;
//! use relq::{Config, Database, RusqliteSession};
//!
//! let schema = SchemaBuilder::new()
//!     .table(
//!         TableBuilder::new("users")
//!             .column("id", integer().primary_key())
//!             .column("name", text().not_null()),
//!     )
//!     .table(
//!         TableBuilder::new("posts")
//!             .column("id", integer().primary_key())
//!             .column("title", text().not_null())
//!             .column(
//!                 "authorId",
//!                 integer()
//!                     .not_null()
//!                     .references(("users", "id"), ReferenceActions::new()),
//!             ),
//!     )
//!     .relations("users", [("posts", many("posts"))])
//!     .relations(
//!         "posts",
//!         [("author", one("users").fields(["authorId"]).references(["id"]))],
//!     );
//!
//! let conn = ::rusqlite::Connection::open_in_memory()?;
//! let db = Database::from_builder(RusqliteSession::new(conn), schema, Config::default())?;
//! db.create_tables()?;
//!
//! let users = db
//!     .query("users")
//!     .find_many(
//!         QueryConfig::new()
//!             .with("posts", QueryConfig::new().order_by(desc("id")).limit(5))
//!             .order_by(asc("id")),
//!     )
//!     .execute()?;
//! assert!(users.is_empty());
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "rusqlite"))]
//! # fn main() {}
//! ```
//!
//! ## Database Support
//!
//! | Database   | Session                  | Feature Flag |
//! |------------|--------------------------|--------------|
//! | SQLite     | [`RusqliteSession`]      | `rusqlite`   |
//! | any        | custom [`Session`]       |              |
//! | any        | custom [`AsyncSession`]  |              |

mod config;
mod database;
pub mod driver;

// =============================================================================
// Root-level exports
// =============================================================================

pub use config::{CONFIG_FILE, Config, ConfigError};
pub use database::Database;

#[cfg(feature = "rusqlite")]
pub use driver::rusqlite::RusqliteSession;

/// Result type for relq operations
pub use relq_core::error::Result;

/// Error types
pub use relq_core::error::RelqError;

pub use relq_core::{
    AsyncSession, Casing, Column, ColumnKind, Dialect, ForeignKey, PreparedQuery, Query,
    Relation, RelationKind, Schema, Session, Table, Value,
};

/// Relational query building and row reassembly.
pub mod query {
    pub use relq_core::query::*;
}

/// Column, table and schema declaration.
pub mod schema {
    pub use relq_core::column::*;
    pub use relq_core::ddl;
    pub use relq_core::foreign_key::*;
    pub use relq_core::relation::*;
    pub use relq_core::schema::*;
    pub use relq_core::table::*;
}

/// SQL fragments and filter expressions.
pub mod sql {
    pub use relq_core::expressions::*;
    pub use relq_core::sql::*;
}

/// Commonly used items for declaring schemas and building queries.
pub mod prelude {
    pub use relq_core::prelude::*;
}
