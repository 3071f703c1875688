/// PostgreSQL type a column is declared with.
///
/// ```
/// use relq_types::postgres::PostgreSQLType;
///
/// assert_eq!(PostgreSQLType::DoublePrecision.to_sql_type(), "DOUBLE PRECISION");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostgreSQLType {
    Integer,
    Bigint,
    Text,
    DoublePrecision,
    Numeric,
    Boolean,
    Bytea,
    Uuid,
    /// Binary JSON; nested relation payloads are built as `json`
    Jsonb,
    Timestamptz,
}

impl PostgreSQLType {
    #[must_use]
    pub const fn to_sql_type(&self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Bigint => "BIGINT",
            Self::Text => "TEXT",
            Self::DoublePrecision => "DOUBLE PRECISION",
            Self::Numeric => "NUMERIC",
            Self::Boolean => "BOOLEAN",
            Self::Bytea => "BYTEA",
            Self::Uuid => "UUID",
            Self::Jsonb => "JSONB",
            Self::Timestamptz => "TIMESTAMPTZ",
        }
    }
}

impl core::fmt::Display for PostgreSQLType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.to_sql_type())
    }
}
