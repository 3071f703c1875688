/// SQLite storage class a column is declared with.
///
/// See <https://sqlite.org/datatype3.html>. Booleans live in `INTEGER` as
/// `0`/`1`; JSON, UUIDs and timestamps live in `TEXT`.
///
/// ```
/// use relq_types::sqlite::SQLiteType;
///
/// assert_eq!(SQLiteType::Blob.to_sql_type(), "BLOB");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SQLiteType {
    Integer,
    Text,
    Blob,
    Real,
    /// INTEGER, REAL or TEXT depending on the stored value
    Numeric,
}

impl SQLiteType {
    #[must_use]
    pub const fn to_sql_type(&self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Text => "TEXT",
            Self::Blob => "BLOB",
            Self::Real => "REAL",
            Self::Numeric => "NUMERIC",
        }
    }
}

impl core::fmt::Display for SQLiteType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.to_sql_type())
    }
}
