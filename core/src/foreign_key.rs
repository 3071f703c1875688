//! Foreign keys with deferred target resolution.
//!
//! A reference is declared with a [`ColumnRef`]: an identifier for the target
//! table and column, not the column itself. Targets are looked up only when
//! the schema is finalized, so tables may reference each other in any
//! declaration order (including mutually).

use compact_str::CompactString;
use relq_types::ReferentialAction;

use crate::column::Column;
use crate::error::{RelqError, Result};

/// Identifier of a column in another (possibly not yet declared) table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub table: CompactString,
    pub column: CompactString,
}

impl ColumnRef {
    pub fn new(table: impl Into<CompactString>, column: impl Into<CompactString>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl From<(&str, &str)> for ColumnRef {
    fn from((table, column): (&str, &str)) -> Self {
        Self::new(table, column)
    }
}

impl core::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// `ON UPDATE` / `ON DELETE` actions attached to a reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReferenceActions {
    pub on_update: Option<ReferentialAction>,
    pub on_delete: Option<ReferentialAction>,
}

impl ReferenceActions {
    pub const fn new() -> Self {
        Self {
            on_update: None,
            on_delete: None,
        }
    }

    pub const fn on_update(self, action: ReferentialAction) -> Self {
        Self {
            on_update: Some(action),
            ..self
        }
    }

    pub const fn on_delete(self, action: ReferentialAction) -> Self {
        Self {
            on_delete: Some(action),
            ..self
        }
    }
}

/// A queued column-level reference, resolved at schema finalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceConfig {
    pub target: ColumnRef,
    pub actions: ReferenceActions,
}

/// Looks up columns by table and column key.
///
/// Implemented by the schema builder during finalization.
pub trait ColumnResolver {
    /// Database name of the table with the given key.
    fn table_name(&self, table: &str) -> Option<&str>;

    /// The column with the given key on the given table.
    fn column(&self, target: &ColumnRef) -> Option<&Column>;
}

/// A resolved foreign key constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    table: CompactString,
    table_name: CompactString,
    columns: Vec<CompactString>,
    column_names: Vec<CompactString>,
    foreign_table: CompactString,
    foreign_table_name: CompactString,
    foreign_columns: Vec<CompactString>,
    foreign_column_names: Vec<CompactString>,
    on_update: Option<ReferentialAction>,
    on_delete: Option<ReferentialAction>,
}

impl ForeignKey {
    /// Key of the table holding the constraint.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Local column keys.
    pub fn columns(&self) -> impl ExactSizeIterator<Item = &str> {
        self.columns.iter().map(CompactString::as_str)
    }

    /// Key of the referenced table.
    pub fn foreign_table(&self) -> &str {
        &self.foreign_table
    }

    /// Referenced column keys.
    pub fn foreign_columns(&self) -> impl ExactSizeIterator<Item = &str> {
        self.foreign_columns.iter().map(CompactString::as_str)
    }

    /// Database names of the local columns.
    pub fn column_names(&self) -> impl ExactSizeIterator<Item = &str> {
        self.column_names.iter().map(CompactString::as_str)
    }

    /// Database name of the referenced table.
    pub fn foreign_table_name(&self) -> &str {
        &self.foreign_table_name
    }

    /// Database names of the referenced columns.
    pub fn foreign_column_names(&self) -> impl ExactSizeIterator<Item = &str> {
        self.foreign_column_names.iter().map(CompactString::as_str)
    }

    pub fn on_update(&self) -> Option<ReferentialAction> {
        self.on_update
    }

    pub fn on_delete(&self) -> Option<ReferentialAction> {
        self.on_delete
    }

    /// Constraint name: `{table}_{columns}_{foreign table}_{foreign columns}_fk`.
    pub fn name(&self) -> String {
        format!(
            "{}_{}_{}_{}_fk",
            self.table_name,
            self.column_names().collect::<Vec<_>>().join("_"),
            self.foreign_table_name,
            self.foreign_column_names().collect::<Vec<_>>().join("_")
        )
    }
}

/// Builder for (possibly composite) table-level foreign keys.
///
/// ```
/// use relq_core::foreign_key::ForeignKeyBuilder;
/// use relq_types::ReferentialAction;
///
/// let fk = ForeignKeyBuilder::new(["tenant_id", "owner_id"])
///     .references("users", ["tenant_id", "id"])
///     .on_delete(ReferentialAction::Cascade);
/// # let _ = fk;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyBuilder {
    columns: Vec<CompactString>,
    foreign_table: CompactString,
    foreign_columns: Vec<CompactString>,
    actions: ReferenceActions,
}

impl ForeignKeyBuilder {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            foreign_table: CompactString::default(),
            foreign_columns: Vec::new(),
            actions: ReferenceActions::new(),
        }
    }

    pub fn references<I, S>(mut self, table: impl Into<CompactString>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        self.foreign_table = table.into();
        self.foreign_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.actions.on_update = Some(action);
        self
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.actions.on_delete = Some(action);
        self
    }

    pub(crate) fn from_reference(column: &str, reference: &ReferenceConfig) -> Self {
        Self {
            columns: vec![column.into()],
            foreign_table: reference.target.table.clone(),
            foreign_columns: vec![reference.target.column.clone()],
            actions: reference.actions,
        }
    }

    /// Resolves every column against `resolver` and freezes the constraint.
    pub fn build(&self, table: &str, resolver: &dyn ColumnResolver) -> Result<ForeignKey> {
        let invalid = |message: String| RelqError::InvalidForeignKey {
            table: table.into(),
            message,
        };
        if self.columns.is_empty() {
            return Err(invalid("foreign key has no columns".into()));
        }
        if self.columns.len() != self.foreign_columns.len() {
            return Err(invalid(format!(
                "{} local column(s) but {} referenced column(s)",
                self.columns.len(),
                self.foreign_columns.len()
            )));
        }

        let table_name = resolver
            .table_name(table)
            .ok_or_else(|| RelqError::UnknownTable(table.into()))?;

        let mut column_names = Vec::with_capacity(self.columns.len());
        let mut foreign_column_names = Vec::with_capacity(self.columns.len());
        for (local, foreign) in self.columns.iter().zip(&self.foreign_columns) {
            let local_column = resolver
                .column(&ColumnRef::new(table, local.clone()))
                .ok_or_else(|| RelqError::unknown_column(table, local))?;
            let target = ColumnRef::new(self.foreign_table.clone(), foreign.clone());
            let foreign_column =
                resolver
                    .column(&target)
                    .ok_or_else(|| RelqError::UnresolvedReference {
                        table: table.into(),
                        column: local.to_string(),
                        target_table: target.table.to_string(),
                        target_column: target.column.to_string(),
                    })?;
            column_names.push(CompactString::from(local_column.name()));
            foreign_column_names.push(CompactString::from(foreign_column.name()));
        }

        let foreign_table_name = resolver
            .table_name(&self.foreign_table)
            .ok_or_else(|| RelqError::UnknownTable(self.foreign_table.to_string()))?;

        Ok(ForeignKey {
            table: table.into(),
            table_name: table_name.into(),
            columns: self.columns.clone(),
            column_names,
            foreign_table: self.foreign_table.clone(),
            foreign_table_name: foreign_table_name.into(),
            foreign_columns: self.foreign_columns.clone(),
            foreign_column_names,
            on_update: self.actions.on_update,
            on_delete: self.actions.on_delete,
        })
    }
}
