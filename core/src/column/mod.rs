//! Column model: builders, kinds and frozen columns.

mod builder;
mod kind;

pub use builder::*;
pub use kind::ColumnKind;

use compact_str::CompactString;
use relq_types::Dialect;

use crate::value::Value;

//------------------------------------------------------------------------------
// Typestate markers
//------------------------------------------------------------------------------

/// Marker for columns without a NOT NULL constraint
#[derive(Debug, Clone, Copy, Default)]
pub struct Nullable;

/// Marker for NOT NULL columns
#[derive(Debug, Clone, Copy, Default)]
pub struct NotNullable;

/// Marker for columns with no default
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNotSet;

/// Marker for columns with a default value or expression
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSet;

/// Marker for regular columns
#[derive(Debug, Clone, Copy, Default)]
pub struct NotPrimary;

/// Marker for primary key columns
#[derive(Debug, Clone, Copy, Default)]
pub struct IsPrimary;

pub trait NotNullState {
    const IS_NOT_NULL: bool;
}

impl NotNullState for Nullable {
    const IS_NOT_NULL: bool = false;
}

impl NotNullState for NotNullable {
    const IS_NOT_NULL: bool = true;
}

pub trait DefaultState {
    const HAS_DEFAULT: bool;
}

impl DefaultState for DefaultNotSet {
    const HAS_DEFAULT: bool = false;
}

impl DefaultState for DefaultSet {
    const HAS_DEFAULT: bool = true;
}

pub trait PrimaryKeyState {
    const IS_PRIMARY: bool;
}

impl PrimaryKeyState for NotPrimary {
    const IS_PRIMARY: bool = false;
}

impl PrimaryKeyState for IsPrimary {
    const IS_PRIMARY: bool = true;
}

//------------------------------------------------------------------------------
// Column
//------------------------------------------------------------------------------

/// A column default.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnDefault {
    /// Literal value, bound as SQL literal in DDL
    Value(Value),
    /// Raw SQL expression, emitted verbatim
    Sql(CompactString),
}

/// A frozen column, owned by exactly one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub(crate) table: CompactString,
    pub(crate) key: CompactString,
    pub(crate) name: CompactString,
    pub(crate) kind: ColumnKind,
    pub(crate) not_null: bool,
    pub(crate) default: Option<ColumnDefault>,
    pub(crate) primary_key: bool,
    pub(crate) unique: bool,
}

impl Column {
    /// Key of the owning table.
    #[inline]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Result-facing key.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Database column name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    #[inline]
    pub fn is_not_null(&self) -> bool {
        self.not_null
    }

    #[inline]
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn default(&self) -> Option<&ColumnDefault> {
        self.default.as_ref()
    }

    #[inline]
    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    #[inline]
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn sql_type(&self, dialect: Dialect) -> &'static str {
        self.kind.sql_type(dialect)
    }
}
