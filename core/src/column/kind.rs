//! Column data kinds.

use relq_types::postgres::PostgreSQLType;
use relq_types::sqlite::SQLiteType;
use relq_types::Dialect;

use crate::value::Value;

/// The data kind of a column.
///
/// Each kind maps to one storage type per dialect and decides how raw
/// values are decoded by the row reassembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// 32-bit integer (`INTEGER`)
    Integer,
    /// 64-bit integer (`BIGINT`; `INTEGER` on SQLite)
    BigInt,
    /// Floating point
    Real,
    /// Arbitrary precision number; may surface as text
    Numeric,
    Text,
    /// `BOOLEAN`; stored as `0`/`1` on SQLite
    Boolean,
    /// Binary data
    Blob,
    /// JSON document (`JSONB` on Postgres, `TEXT` on SQLite)
    Json,
    /// UUID (`UUID` on Postgres, `TEXT` on SQLite)
    Uuid,
    /// Timestamp with time zone (`TIMESTAMPTZ`; ISO-8601 `TEXT` on SQLite)
    Timestamp,
}

impl ColumnKind {
    pub const fn sqlite_type(&self) -> SQLiteType {
        match self {
            Self::Integer | Self::BigInt | Self::Boolean => SQLiteType::Integer,
            Self::Real => SQLiteType::Real,
            Self::Numeric => SQLiteType::Numeric,
            Self::Text | Self::Json | Self::Uuid | Self::Timestamp => SQLiteType::Text,
            Self::Blob => SQLiteType::Blob,
        }
    }

    pub const fn postgres_type(&self) -> PostgreSQLType {
        match self {
            Self::Integer => PostgreSQLType::Integer,
            Self::BigInt => PostgreSQLType::Bigint,
            Self::Real => PostgreSQLType::DoublePrecision,
            Self::Numeric => PostgreSQLType::Numeric,
            Self::Text => PostgreSQLType::Text,
            Self::Boolean => PostgreSQLType::Boolean,
            Self::Blob => PostgreSQLType::Bytea,
            Self::Json => PostgreSQLType::Jsonb,
            Self::Uuid => PostgreSQLType::Uuid,
            Self::Timestamp => PostgreSQLType::Timestamptz,
        }
    }

    /// Storage type name for `dialect`.
    pub const fn sql_type(&self, dialect: Dialect) -> &'static str {
        match dialect {
            Dialect::SQLite => self.sqlite_type().to_sql_type(),
            Dialect::PostgreSQL => self.postgres_type().to_sql_type(),
        }
    }

    /// Whether a literal value can be stored in a column of this kind.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::Integer, Value::Integer(i)) => i32::try_from(*i).is_ok(),
            (Self::BigInt, Value::Integer(_)) => true,
            (Self::Real, Value::Integer(_) | Value::Real(_)) => true,
            (Self::Numeric, Value::Integer(_) | Value::Real(_) | Value::Text(_)) => true,
            (Self::Text | Self::Uuid | Self::Timestamp, Value::Text(_)) => true,
            (Self::Boolean, Value::Bool(_)) => true,
            (Self::Boolean, Value::Integer(i)) => *i == 0 || *i == 1,
            (Self::Blob, Value::Blob(_)) => true,
            (Self::Json, Value::Json(_) | Value::Text(_)) => true,
            _ => false,
        }
    }

    /// Kind name as written in error messages.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::BigInt => "bigint",
            Self::Real => "real",
            Self::Numeric => "numeric",
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::Blob => "blob",
            Self::Json => "json",
            Self::Uuid => "uuid",
            Self::Timestamp => "timestamp",
        }
    }
}

impl core::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
