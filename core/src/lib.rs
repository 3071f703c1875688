//! Core of relq: the column model, schema finalization, relational query
//! generation and row reassembly.
//!
//! Nothing in this crate talks to a database directly. Drivers implement
//! [`Session`] or [`AsyncSession`]; the facade crate wires them to a
//! finalized [`Schema`].

pub mod casing;
pub mod column;
pub mod ddl;
pub mod dialect;
pub mod error;
pub mod expressions;
pub mod foreign_key;
pub mod logging;
pub mod query;
pub mod relation;
pub mod row;
pub mod schema;
pub mod session;
pub mod sql;
pub mod table;
pub mod value;

pub use casing::Casing;
pub use column::{Column, ColumnBuilder, ColumnDefault, ColumnKind};
pub use dialect::{Dialect, DialectExt};
pub use error::{RelqError, Result};
pub use foreign_key::{ColumnRef, ForeignKey, ForeignKeyBuilder, ReferenceActions};
pub use query::{
    QueryConfig, RelationalQuery, RelationalQueryBuilder, RelationalRow, map_relational_row,
};
pub use relation::{Relation, RelationKind};
pub use schema::{Schema, SchemaBuilder};
pub use session::{AsyncSession, PreparedQuery, Session};
pub use sql::{Query, SQL, SQLChunk};
pub use table::{Table, TableBuilder};
pub use value::Value;

/// Commonly used items for declaring schemas and building queries.
pub mod prelude {
    pub use crate::column::{
        big_int, blob, boolean, integer, json, numeric, real, text, timestamp, uuid,
    };
    pub use crate::expressions::{
        and, asc, desc, eq, gt, gte, in_array, is_not_null, is_null, like, lt, lte, neq, not,
        not_in_array, not_like, or,
    };
    pub use crate::relation::{many, one};
    pub use crate::{
        ColumnRef, ForeignKeyBuilder, QueryConfig, ReferenceActions, SQL, SchemaBuilder,
        TableBuilder, Value,
    };
    pub use relq_types::ReferentialAction;
}
