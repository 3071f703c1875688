use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelqError {
    /// A column definition that cannot be built
    #[error("Column error: {table}.{column}: {message}")]
    ColumnDefinition {
        table: String,
        column: String,
        message: String,
    },

    /// Two tables registered under the same key
    #[error("Duplicate table: {0}")]
    DuplicateTable(String),

    /// Two columns of one table share a key or database name
    #[error("Duplicate column: {table}.{column}")]
    DuplicateColumn { table: String, column: String },

    /// Table key not present in the schema
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// Column key not present on the table
    #[error("Unknown column: {table}.{column}")]
    UnknownColumn { table: String, column: String },

    /// Relation name not declared on the table
    #[error("Unknown relation: {table}.{relation}")]
    UnknownRelation { table: String, relation: String },

    /// A foreign key target that does not exist once every table is declared
    #[error("Unresolved reference from {table}.{column} to {target_table}.{target_column}")]
    UnresolvedReference {
        table: String,
        column: String,
        target_table: String,
        target_column: String,
    },

    /// Malformed foreign key (e.g. column count mismatch)
    #[error("Invalid foreign key on {table}: {message}")]
    InvalidForeignKey { table: String, message: String },

    /// A relation whose join columns cannot be determined
    #[error("Relation error: {table}.{relation}: {message}")]
    RelationResolution {
        table: String,
        relation: String,
        message: String,
    },

    /// Error building a query from its configuration
    #[error("Query error: {0}")]
    Query(String),

    /// Error mapping raw rows into result objects
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// The session speaks another dialect than the one queries are rendered for
    #[error("Dialect mismatch: session speaks {session}, config selects {config}")]
    DialectMismatch {
        session: relq_types::Dialect,
        config: relq_types::Dialect,
    },

    /// JSON payload could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error raised by the database driver, passed through untouched
    #[error(transparent)]
    Driver(Box<dyn std::error::Error + Send + Sync>),
}

impl RelqError {
    /// Wraps a driver error without altering it.
    pub fn driver<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Driver(Box::new(err))
    }

    pub(crate) fn column(table: &str, column: &str, message: impl Into<String>) -> Self {
        Self::ColumnDefinition {
            table: table.into(),
            column: column.into(),
            message: message.into(),
        }
    }

    pub(crate) fn unknown_column(table: &str, column: &str) -> Self {
        Self::UnknownColumn {
            table: table.into(),
            column: column.into(),
        }
    }
}

#[cfg(feature = "rusqlite")]
impl From<rusqlite::Error> for RelqError {
    fn from(err: rusqlite::Error) -> Self {
        Self::driver(err)
    }
}

/// Result type for relq operations
pub type Result<T> = std::result::Result<T, RelqError>;
