//! Database dialects and the SQL capabilities relq keys off them.

/// Target database of rendered SQL.
///
/// ```
/// use relq_types::Dialect;
///
/// assert!(Dialect::PostgreSQL.uses_numbered_placeholders());
/// assert!(Dialect::SQLite.requires_limit_before_offset());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Dialect {
    /// `?` placeholders, `json_object` / `json_group_array`
    #[default]
    SQLite,

    /// `$n` placeholders, `json_build_object` / `json_agg`
    #[cfg_attr(feature = "serde", serde(alias = "postgres", alias = "pg"))]
    PostgreSQL,
}

impl Dialect {
    /// `$1, $2, ...` instead of `?`
    #[inline]
    #[must_use]
    pub const fn uses_numbered_placeholders(&self) -> bool {
        matches!(self, Dialect::PostgreSQL)
    }

    /// Whether the JSON array aggregate takes its own `ORDER BY`, as in
    /// `json_agg(x ORDER BY y)`.
    #[inline]
    #[must_use]
    pub const fn orders_inside_aggregate(&self) -> bool {
        matches!(self, Dialect::PostgreSQL)
    }

    /// Whether `OFFSET` is only accepted after a `LIMIT` clause.
    #[inline]
    #[must_use]
    pub const fn requires_limit_before_offset(&self) -> bool {
        matches!(self, Dialect::SQLite)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Dialect::SQLite => "sqlite",
            Dialect::PostgreSQL => "postgresql",
        }
    }
}

impl core::fmt::Display for Dialect {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
