//! Relation declarations and their normalized form.
//!
//! Relations are declared per table with [`one`] and [`many`] and normalized
//! when the schema is finalized: every relation ends up with explicit join
//! columns on both sides, whether they were written down or inferred from
//! the reverse side or a foreign key.

use compact_str::CompactString;

/// Cardinality of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// At most one target row, aggregated with `json_object` / `json_build_object`
    One,
    /// Any number of target rows, aggregated with `json_group_array` / `json_agg`
    Many,
}

/// A relation as declared, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationDecl {
    pub(crate) kind: RelationKind,
    pub(crate) target: CompactString,
    pub(crate) fields: Vec<CompactString>,
    pub(crate) references: Vec<CompactString>,
    pub(crate) relation_name: Option<CompactString>,
}

/// Declares a one-relation to `target`.
///
/// With [`RelationDecl::fields`] and [`RelationDecl::references`] the join
/// is explicit; without them it is taken from the matching relation on the
/// target table.
pub fn one(target: impl Into<CompactString>) -> RelationDecl {
    RelationDecl::new(RelationKind::One, target)
}

/// Declares a many-relation to `target`.
pub fn many(target: impl Into<CompactString>) -> RelationDecl {
    RelationDecl::new(RelationKind::Many, target)
}

impl RelationDecl {
    fn new(kind: RelationKind, target: impl Into<CompactString>) -> Self {
        Self {
            kind,
            target: target.into(),
            fields: Vec::new(),
            references: Vec::new(),
            relation_name: None,
        }
    }

    /// Source column keys of the join.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Target column keys matched against [`RelationDecl::fields`].
    pub fn references<I, S>(mut self, references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        self.references = references.into_iter().map(Into::into).collect();
        self
    }

    /// Disambiguates between several relations connecting the same tables.
    pub fn relation_name(mut self, name: impl Into<CompactString>) -> Self {
        self.relation_name = Some(name.into());
        self
    }

    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub(crate) fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }
}

/// A normalized relation.
///
/// The join condition is `target.references[i] = source.fields[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub(crate) name: CompactString,
    pub(crate) source: CompactString,
    pub(crate) target: CompactString,
    pub(crate) kind: RelationKind,
    pub(crate) fields: Vec<CompactString>,
    pub(crate) references: Vec<CompactString>,
    pub(crate) relation_name: Option<CompactString>,
    pub(crate) nullable: bool,
}

impl Relation {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key of the table declaring the relation.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Key of the related table.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    /// Source column keys.
    pub fn fields(&self) -> impl ExactSizeIterator<Item = &str> {
        self.fields.iter().map(CompactString::as_str)
    }

    /// Target column keys.
    pub fn references(&self) -> impl ExactSizeIterator<Item = &str> {
        self.references.iter().map(CompactString::as_str)
    }

    pub fn relation_name(&self) -> Option<&str> {
        self.relation_name.as_deref()
    }

    /// Whether a one-relation may resolve to no row.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}
