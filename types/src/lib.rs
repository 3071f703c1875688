//! Shared type definitions for relq
//!
//! This crate provides the small vocabulary shared by the relq crates:
//!
//! - [`Dialect`] - Database dialect enum (SQLite, PostgreSQL)
//! - SQLite storage types in the [`sqlite`] module
//! - PostgreSQL column types in the [`postgres`] module
//! - [`ReferentialAction`] - `ON UPDATE` / `ON DELETE` actions for foreign keys
//!
//! # Features
//!
//! - `serde` - Enable serde serialization/deserialization

mod dialect;
pub mod postgres;
mod referential;
pub mod sqlite;

pub use dialect::Dialect;
pub use referential::ReferentialAction;

/// Prelude module for commonly used types
pub mod prelude {
    pub use crate::Dialect;
    pub use crate::ReferentialAction;
    pub use crate::postgres::PostgreSQLType;
    pub use crate::sqlite::SQLiteType;
}
