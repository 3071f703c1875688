//! Relational Query API.
//!
//! Loads a table together with nested relations in a single statement.
//!
//! The pipeline: a [`QueryConfig`] describes columns, filters, pagination and
//! `.with()` relations. [`build_relational_query`] turns it into one SQL tree
//! plus a [`Selection`] tagging every selected expression. After execution
//! [`map_relational_row`] folds each flat row back into a nested
//! [`RelationalRow`], which [`RelationalQuery::execute_as`] can deserialize
//! into user types.

mod build;
mod config;
mod map;
mod relational;
mod selection;

pub use build::{BuiltRelationalQuery, build_relational_query};
pub use config::{ColumnSelection, QueryConfig};
pub use map::{RawRow, RelationalRow, map_column_value, map_relational_row};
pub use relational::{First, Many, QueryMode, RelationalQuery, RelationalQueryBuilder};
pub use selection::{FieldKind, SelectedField, Selection};
