//! Tags describing what each selected expression of a relational query is.

use compact_str::CompactString;

use crate::column::ColumnKind;
use crate::relation::RelationKind;

/// What a selected expression holds.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// A table column; decoded according to its kind
    Column(ColumnKind),
    /// A computed field, passed through as returned by the database
    Extra,
    /// A JSON-aggregated relation payload
    Relation {
        /// Key of the related table
        target: CompactString,
        cardinality: RelationKind,
        nullable: bool,
        /// Fields of each related object
        selection: Vec<SelectedField>,
    },
}

/// One selected expression.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedField {
    /// Key in the result object
    pub key: CompactString,
    /// Alias in SQL (column name, extra name or relation alias)
    pub alias: CompactString,
    pub kind: FieldKind,
}

impl SelectedField {
    pub(crate) fn column(key: &str, alias: &str, kind: ColumnKind) -> Self {
        Self {
            key: key.into(),
            alias: alias.into(),
            kind: FieldKind::Column(kind),
        }
    }

    pub(crate) fn extra(name: &str) -> Self {
        Self {
            key: name.into(),
            alias: name.into(),
            kind: FieldKind::Extra,
        }
    }

    pub fn is_relation(&self) -> bool {
        matches!(self.kind, FieldKind::Relation { .. })
    }
}

/// Ordered selection of a query; one entry per selected expression.
pub type Selection = Vec<SelectedField>;
