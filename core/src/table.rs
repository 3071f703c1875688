//! Table definitions.

use compact_str::CompactString;
use hashbrown::HashMap;

use crate::casing::Casing;
use crate::column::{AnyColumnBuilder, Column, ColumnBuilder};
use crate::error::{RelqError, Result};
use crate::foreign_key::{ColumnResolver, ForeignKey, ForeignKeyBuilder};

/// Builder for a table: ordered columns, table-level foreign keys and an
/// optional composite primary key.
///
/// ```
/// use relq_core::column::{integer, text};
/// use relq_core::table::TableBuilder;
///
/// let users = TableBuilder::new("users")
///     .column("id", integer().primary_key())
///     .column("name", text().not_null());
/// # let _ = users;
/// ```
#[derive(Debug, Clone)]
pub struct TableBuilder {
    key: CompactString,
    name: Option<CompactString>,
    columns: Vec<AnyColumnBuilder>,
    foreign_keys: Vec<ForeignKeyBuilder>,
    primary_key: Vec<CompactString>,
}

impl TableBuilder {
    pub fn new(key: impl Into<CompactString>) -> Self {
        Self {
            key: key.into(),
            name: None,
            columns: Vec::new(),
            foreign_keys: Vec::new(),
            primary_key: Vec::new(),
        }
    }

    /// Overrides the database table name (defaults to the key).
    pub fn name(mut self, name: impl Into<CompactString>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds a column under `key`.
    pub fn column<N, D, P>(
        mut self,
        key: impl Into<CompactString>,
        column: ColumnBuilder<N, D, P>,
    ) -> Self {
        self.columns.push(column.into_any(key));
        self
    }

    /// Adds a table-level (possibly composite) foreign key.
    pub fn foreign_key(mut self, fk: ForeignKeyBuilder) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// Declares a composite primary key over column keys.
    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Builds every column. Foreign keys are attached later by
    /// [`TableBuilder::build_foreign_keys`], once all tables exist.
    pub(crate) fn build(&self, casing: Casing) -> Result<Table> {
        let name = self.name.clone().unwrap_or_else(|| self.key.clone());
        let mut columns = Vec::with_capacity(self.columns.len());
        let mut by_key = HashMap::with_capacity(self.columns.len());
        let mut by_name = HashMap::with_capacity(self.columns.len());

        for builder in &self.columns {
            let column = builder.build(&self.key, casing)?;
            let idx = columns.len();
            if by_key.insert(column.key.clone(), idx).is_some() {
                return Err(RelqError::DuplicateColumn {
                    table: self.key.to_string(),
                    column: column.key.to_string(),
                });
            }
            if by_name.insert(column.name.clone(), idx).is_some() {
                return Err(RelqError::DuplicateColumn {
                    table: self.key.to_string(),
                    column: column.name.to_string(),
                });
            }
            columns.push(column);
        }

        let mut table = Table {
            key: self.key.clone(),
            name,
            columns,
            by_key,
            by_name,
            foreign_keys: Vec::new(),
            primary_key: Vec::new(),
        };

        table.primary_key = if self.primary_key.is_empty() {
            table
                .columns
                .iter()
                .filter(|c| c.is_primary_key())
                .map(|c| c.key.clone())
                .collect()
        } else {
            for key in &self.primary_key {
                if table.column(key).is_none() {
                    return Err(RelqError::unknown_column(&self.key, key));
                }
            }
            self.primary_key.clone()
        };

        Ok(table)
    }

    /// Resolves column-level references (in column order) followed by
    /// table-level foreign keys.
    pub(crate) fn build_foreign_keys(
        &self,
        table: &Table,
        resolver: &dyn ColumnResolver,
    ) -> Result<Vec<ForeignKey>> {
        let mut out = Vec::new();
        for (builder, column) in self.columns.iter().zip(&table.columns) {
            out.extend(builder.build_foreign_keys(column, resolver)?);
        }
        for fk in &self.foreign_keys {
            out.push(fk.build(&self.key, resolver)?);
        }
        Ok(out)
    }
}

/// A frozen table.
#[derive(Debug, Clone)]
pub struct Table {
    key: CompactString,
    name: CompactString,
    columns: Vec<Column>,
    by_key: HashMap<CompactString, usize>,
    by_name: HashMap<CompactString, usize>,
    pub(crate) foreign_keys: Vec<ForeignKey>,
    primary_key: Vec<CompactString>,
}

impl Table {
    /// Result-facing key.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Database table name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks up a column by key, falling back to its database name.
    pub fn column(&self, key: &str) -> Option<&Column> {
        self.by_key
            .get(key)
            .or_else(|| self.by_name.get(key))
            .map(|&idx| &self.columns[idx])
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    /// Primary key column keys.
    pub fn primary_columns(&self) -> impl ExactSizeIterator<Item = &str> {
        self.primary_key.iter().map(CompactString::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{integer, text};

    #[test]
    fn test_build_preserves_column_order() {
        let table = TableBuilder::new("users")
            .column("id", integer().primary_key())
            .column("name", text().not_null())
            .column("email", text().unique())
            .build(Casing::Preserve)
            .unwrap();

        let keys: Vec<_> = table.columns().iter().map(Column::key).collect();
        assert_eq!(keys, ["id", "name", "email"]);
        assert_eq!(table.name(), "users");
        assert_eq!(table.primary_columns().collect::<Vec<_>>(), ["id"]);
        assert!(table.column("email").unwrap().is_unique());
    }

    #[test]
    fn test_column_lookup_falls_back_to_db_name() {
        let table = TableBuilder::new("posts")
            .name("blog_posts")
            .column("authorId", integer())
            .build(Casing::SnakeCase)
            .unwrap();

        assert_eq!(table.name(), "blog_posts");
        assert_eq!(table.column("authorId").unwrap().name(), "author_id");
        assert_eq!(table.column("author_id").unwrap().key(), "authorId");
        assert!(table.column("missing").is_none());
    }

    #[test]
    fn test_duplicate_column_key() {
        let err = TableBuilder::new("users")
            .column("id", integer())
            .column("id", text())
            .build(Casing::Preserve)
            .unwrap_err();
        assert!(matches!(err, RelqError::DuplicateColumn { .. }));
    }

    #[test]
    fn test_composite_primary_key() {
        let table = TableBuilder::new("memberships")
            .column("userId", integer().not_null())
            .column("groupId", integer().not_null())
            .primary_key(["userId", "groupId"])
            .build(Casing::Preserve)
            .unwrap();
        assert_eq!(
            table.primary_columns().collect::<Vec<_>>(),
            ["userId", "groupId"]
        );

        let err = TableBuilder::new("memberships")
            .column("userId", integer())
            .primary_key(["nope"])
            .build(Casing::Preserve)
            .unwrap_err();
        assert!(matches!(err, RelqError::UnknownColumn { .. }));
    }
}
