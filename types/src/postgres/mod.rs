//! PostgreSQL type definitions
//!
//! - [`PostgreSQLType`] - PostgreSQL column types

mod sql_type;

pub use sql_type::PostgreSQLType;
