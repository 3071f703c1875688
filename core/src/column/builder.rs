//! Column builders.
//!
//! A [`ColumnBuilder`] carries its constraints twice: as plain flags in a
//! [`ColumnConfig`] (used at runtime for SQL generation and row mapping) and
//! as typestate markers in its type parameters, so `not_null()`,
//! `default(..)` and `primary_key()` return a differently typed builder.

use core::marker::PhantomData;

use compact_str::CompactString;

use super::{
    Column, ColumnDefault, ColumnKind, DefaultNotSet, DefaultSet, DefaultState, IsPrimary,
    NotNullState, NotNullable, NotPrimary, Nullable, PrimaryKeyState,
};
use crate::casing::Casing;
use crate::error::{RelqError, Result};
use crate::foreign_key::{
    ColumnRef, ColumnResolver, ForeignKey, ForeignKeyBuilder, ReferenceActions, ReferenceConfig,
};
use crate::value::Value;

/// Constraint flags collected by a builder.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnConfig {
    pub kind: ColumnKind,
    /// Explicit database name; derived from the key when `None`
    pub name: Option<CompactString>,
    pub not_null: bool,
    pub default: Option<ColumnDefault>,
    pub primary_key: bool,
    pub unique: bool,
}

/// Builder for a single column.
#[derive(Debug, Clone)]
pub struct ColumnBuilder<N = Nullable, D = DefaultNotSet, P = NotPrimary> {
    config: ColumnConfig,
    references: Vec<ReferenceConfig>,
    _marker: PhantomData<(N, D, P)>,
}

impl ColumnBuilder {
    /// Creates a nullable column without default or constraints.
    pub fn new(kind: ColumnKind) -> Self {
        Self {
            config: ColumnConfig {
                kind,
                name: None,
                not_null: false,
                default: None,
                primary_key: false,
                unique: false,
            },
            references: Vec::new(),
            _marker: PhantomData,
        }
    }
}

impl<N: NotNullState, D: DefaultState, P: PrimaryKeyState> ColumnBuilder<N, D, P> {
    pub const IS_NOT_NULL: bool = N::IS_NOT_NULL;
    pub const HAS_DEFAULT: bool = D::HAS_DEFAULT;
    pub const IS_PRIMARY: bool = P::IS_PRIMARY;
}

impl<N, D, P> ColumnBuilder<N, D, P> {
    fn retype<N2, D2, P2>(self) -> ColumnBuilder<N2, D2, P2> {
        ColumnBuilder {
            config: self.config,
            references: self.references,
            _marker: PhantomData,
        }
    }

    /// Overrides the database column name.
    pub fn name(mut self, name: impl Into<CompactString>) -> Self {
        self.config.name = Some(name.into());
        self
    }

    /// Adds a NOT NULL constraint.
    pub fn not_null(mut self) -> ColumnBuilder<NotNullable, D, P> {
        self.config.not_null = true;
        self.retype()
    }

    /// Sets a literal default value.
    pub fn default(mut self, value: impl Into<Value>) -> ColumnBuilder<N, DefaultSet, P> {
        self.config.default = Some(ColumnDefault::Value(value.into()));
        self.retype()
    }

    /// Sets a raw SQL default expression, e.g. `CURRENT_TIMESTAMP`.
    pub fn default_sql(mut self, expr: impl Into<CompactString>) -> ColumnBuilder<N, DefaultSet, P> {
        self.config.default = Some(ColumnDefault::Sql(expr.into()));
        self.retype()
    }

    /// Makes this column the primary key. Implies NOT NULL.
    pub fn primary_key(mut self) -> ColumnBuilder<NotNullable, D, IsPrimary> {
        self.config.primary_key = true;
        self.config.not_null = true;
        self.retype()
    }

    /// Adds a UNIQUE constraint.
    pub fn unique(mut self) -> Self {
        self.config.unique = true;
        self
    }

    /// Queues a foreign key to `target`.
    ///
    /// The target is not looked up here; it only has to exist once the
    /// schema is finalized.
    pub fn references(mut self, target: impl Into<ColumnRef>, actions: ReferenceActions) -> Self {
        self.references.push(ReferenceConfig {
            target: target.into(),
            actions,
        });
        self
    }

    pub fn config(&self) -> &ColumnConfig {
        &self.config
    }

    /// Queued references, in declaration order.
    pub fn reference_configs(&self) -> &[ReferenceConfig] {
        &self.references
    }

    /// Erases the typestate, attaching the column key.
    pub fn into_any(self, key: impl Into<CompactString>) -> AnyColumnBuilder {
        AnyColumnBuilder {
            key: key.into(),
            config: self.config,
            references: self.references,
        }
    }

    /// Freezes the builder into a column of `table`, keyed `key`.
    pub fn build(self, table: &str, key: &str) -> Result<Column> {
        self.into_any(key).build(table, Casing::Preserve)
    }
}

/// A column builder with its key, stripped of typestate so tables can hold
/// columns of any shape.
#[derive(Debug, Clone)]
pub struct AnyColumnBuilder {
    key: CompactString,
    config: ColumnConfig,
    references: Vec<ReferenceConfig>,
}

impl AnyColumnBuilder {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn config(&self) -> &ColumnConfig {
        &self.config
    }

    pub fn reference_configs(&self) -> &[ReferenceConfig] {
        &self.references
    }

    /// Freezes the configuration into an immutable [`Column`] owned by `table`.
    ///
    /// Fails on definitions no database would accept: an empty key or name,
    /// a default that does not fit the column kind, or a NULL default on a
    /// NOT NULL column.
    pub fn build(&self, table: &str, casing: Casing) -> Result<Column> {
        if self.key.is_empty() {
            return Err(RelqError::column(table, "", "column key is empty"));
        }
        let name: CompactString = match &self.config.name {
            Some(name) => name.clone(),
            None => casing.apply(&self.key).into(),
        };
        if name.is_empty() {
            return Err(RelqError::column(table, &self.key, "column name is empty"));
        }

        if let Some(ColumnDefault::Value(value)) = &self.config.default {
            if value.is_null() && self.config.not_null {
                return Err(RelqError::column(
                    table,
                    &self.key,
                    "NULL default on a NOT NULL column",
                ));
            }
            if !self.config.kind.accepts(value) {
                return Err(RelqError::column(
                    table,
                    &self.key,
                    format!(
                        "default value of type {} does not fit a {} column",
                        value.type_name(),
                        self.config.kind
                    ),
                ));
            }
        }

        Ok(Column {
            table: table.into(),
            key: self.key.clone(),
            name,
            kind: self.config.kind,
            not_null: self.config.not_null,
            default: self.config.default.clone(),
            primary_key: self.config.primary_key,
            unique: self.config.unique,
        })
    }

    /// Resolves every queued reference into a [`ForeignKey`] bound to
    /// `column`'s table, preserving declaration order.
    ///
    /// This is where a dangling target first surfaces, as
    /// [`RelqError::UnresolvedReference`].
    pub fn build_foreign_keys(
        &self,
        column: &Column,
        resolver: &dyn ColumnResolver,
    ) -> Result<Vec<ForeignKey>> {
        self.references
            .iter()
            .map(|reference| {
                ForeignKeyBuilder::from_reference(column.key(), reference)
                    .build(column.table(), resolver)
            })
            .collect()
    }
}

macro_rules! column_constructors {
    ($($(#[$meta:meta])* $fn_name:ident => $kind:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            pub fn $fn_name() -> ColumnBuilder {
                ColumnBuilder::new(ColumnKind::$kind)
            }
        )*
    };
}

column_constructors! {
    /// 32-bit integer column
    integer => Integer,
    /// 64-bit integer column
    big_int => BigInt,
    /// Floating point column
    real => Real,
    /// Arbitrary precision numeric column
    numeric => Numeric,
    /// Text column
    text => Text,
    /// Boolean column
    boolean => Boolean,
    /// Binary column
    blob => Blob,
    /// JSON document column
    json => Json,
    /// UUID column
    uuid => Uuid,
    /// Timestamp column
    timestamp => Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{big_int, integer, text};
    use relq_types::ReferentialAction;

    #[test]
    fn test_not_null_sets_flag_and_type() {
        let builder = text().not_null();
        assert!(ColumnBuilder::<NotNullable, DefaultNotSet, NotPrimary>::IS_NOT_NULL);
        let column = builder.build("users", "name").unwrap();
        assert!(column.is_not_null());
    }

    #[test]
    fn test_not_null_is_idempotent() {
        let column = text().not_null().not_null().build("users", "name").unwrap();
        assert!(column.is_not_null());
    }

    #[test]
    fn test_typestate_constants() {
        assert!(!ColumnBuilder::<Nullable, DefaultNotSet, NotPrimary>::IS_NOT_NULL);
        assert!(ColumnBuilder::<Nullable, DefaultSet, NotPrimary>::HAS_DEFAULT);
        assert!(ColumnBuilder::<NotNullable, DefaultNotSet, IsPrimary>::IS_PRIMARY);
    }

    #[test]
    fn test_primary_key_implies_not_null() {
        let column = integer().primary_key().build("users", "id").unwrap();
        assert!(column.is_primary_key());
        assert!(column.is_not_null());
        assert!(!column.has_default());
    }

    #[test]
    fn test_default_sets_has_default() {
        let column = integer().default(5).build("t", "n").unwrap();
        assert!(column.has_default());
        assert_eq!(column.default(), Some(&ColumnDefault::Value(Value::Integer(5))));

        let column = text()
            .default_sql("CURRENT_TIMESTAMP")
            .build("t", "created")
            .unwrap();
        assert_eq!(
            column.default(),
            Some(&ColumnDefault::Sql("CURRENT_TIMESTAMP".into()))
        );
    }

    #[test]
    fn test_mismatched_default_fails_build() {
        let err = integer().default("five").build("t", "n").unwrap_err();
        assert!(matches!(err, RelqError::ColumnDefinition { .. }));
    }

    #[test]
    fn test_integer_default_out_of_range_fails_build() {
        let err = integer().default(5_000_000_000i64).build("t", "n").unwrap_err();
        assert!(matches!(err, RelqError::ColumnDefinition { .. }));

        let column = big_int().default(5_000_000_000i64).build("t", "n").unwrap();
        assert_eq!(
            column.default(),
            Some(&ColumnDefault::Value(Value::Integer(5_000_000_000)))
        );
    }

    #[test]
    fn test_null_default_on_not_null_fails_build() {
        let err = text()
            .not_null()
            .default(None::<String>)
            .build("t", "n")
            .unwrap_err();
        assert!(matches!(err, RelqError::ColumnDefinition { .. }));
    }

    #[test]
    fn test_empty_key_fails_build() {
        assert!(text().build("t", "").is_err());
    }

    #[test]
    fn test_casing_applies_without_explicit_name() {
        let column = integer()
            .into_any("authorId")
            .build("posts", Casing::SnakeCase)
            .unwrap();
        assert_eq!(column.key(), "authorId");
        assert_eq!(column.name(), "author_id");

        let column = integer()
            .name("writer")
            .into_any("authorId")
            .build("posts", Casing::SnakeCase)
            .unwrap();
        assert_eq!(column.name(), "writer");
    }

    #[test]
    fn test_references_are_queued_in_order() {
        let builder = integer()
            .references(("users", "id"), ReferenceActions::new())
            .references(
                ("accounts", "id"),
                ReferenceActions::new().on_delete(ReferentialAction::Cascade),
            );
        let refs = builder.reference_configs();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].target, ColumnRef::new("users", "id"));
        assert_eq!(refs[1].target, ColumnRef::new("accounts", "id"));
        assert_eq!(refs[1].actions.on_delete, Some(ReferentialAction::Cascade));
    }
}
