//! Per-call relational query configuration.

use compact_str::CompactString;

use crate::expressions::{Condition, OrderBy};
use crate::sql::SQL;

/// Which columns of a table to select.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ColumnSelection {
    /// Every column (default)
    #[default]
    All,
    /// Only the listed column keys
    Include(Vec<CompactString>),
    /// Every column except the listed keys
    Omit(Vec<CompactString>),
}

/// Configuration of a relational query, nested for each loaded relation.
///
/// ```
/// use relq_core::expressions::{desc, eq};
/// use relq_core::query::QueryConfig;
///
/// let config = QueryConfig::new()
///     .columns(["id", "name"])
///     .r#where(eq("id", 1))
///     .with("posts", QueryConfig::new().order_by(desc("id")).limit(5));
/// # let _ = config;
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryConfig {
    pub(crate) columns: ColumnSelection,
    pub(crate) with: Vec<(CompactString, QueryConfig)>,
    pub(crate) filter: Option<Condition>,
    pub(crate) order_by: Vec<OrderBy>,
    pub(crate) limit: Option<u32>,
    pub(crate) offset: Option<u32>,
    pub(crate) extras: Vec<(CompactString, SQL)>,
}

impl QueryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects only the given column keys.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        self.columns = ColumnSelection::Include(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Selects every column except the given keys.
    pub fn omit<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        self.columns = ColumnSelection::Omit(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Loads the relation `name` with its own nested configuration.
    ///
    /// Loading the same relation twice keeps the last configuration.
    pub fn with(mut self, name: impl Into<CompactString>, config: QueryConfig) -> Self {
        let name = name.into();
        self.with.retain(|(existing, _)| *existing != name);
        self.with.push((name, config));
        self
    }

    /// Filters rows. Calling it again replaces the previous condition.
    pub fn r#where(mut self, condition: Condition) -> Self {
        self.filter = Some(condition);
        self
    }

    /// Appends an ordering term.
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u32) -> Self {
        self.offset = Some(n);
        self
    }

    /// Adds a computed field named `name`.
    ///
    /// [`SQL::column`] references in `expr` resolve against the queried table.
    pub fn extra(mut self, name: impl Into<CompactString>, expr: SQL) -> Self {
        self.extras.push((name.into(), expr));
        self
    }

    pub fn get_limit(&self) -> Option<u32> {
        self.limit
    }

    pub fn get_offset(&self) -> Option<u32> {
        self.offset
    }

    pub(crate) fn set_limit(&mut self, limit: Option<u32>) {
        self.limit = limit;
    }
}
