//! Filter conditions and ordering for relational queries.
//!
//! Operands name columns by key on the table the query config applies to.
//! Conditions are rendered once that table's alias is known.

use compact_str::CompactString;

use crate::error::{RelqError, Result};
use crate::sql::SQL;
use crate::table::Table;
use crate::value::Value;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
}

impl CompareOp {
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => " = ",
            Self::NotEq => " <> ",
            Self::Gt => " > ",
            Self::Gte => " >= ",
            Self::Lt => " < ",
            Self::Lte => " <= ",
            Self::Like => " LIKE ",
            Self::NotLike => " NOT LIKE ",
        }
    }
}

/// A boolean filter over one table.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        column: CompactString,
        op: CompareOp,
        value: Value,
    },
    InArray {
        column: CompactString,
        values: Vec<Value>,
        negated: bool,
    },
    IsNull {
        column: CompactString,
        negated: bool,
    },
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
    /// Raw SQL; [`SQL::column`] references resolve against the filtered table
    Sql(SQL),
}

fn compare(column: impl Into<CompactString>, op: CompareOp, value: impl Into<Value>) -> Condition {
    Condition::Compare {
        column: column.into(),
        op,
        value: value.into(),
    }
}

/// `column = value`
pub fn eq(column: impl Into<CompactString>, value: impl Into<Value>) -> Condition {
    compare(column, CompareOp::Eq, value)
}

/// `column <> value`
pub fn neq(column: impl Into<CompactString>, value: impl Into<Value>) -> Condition {
    compare(column, CompareOp::NotEq, value)
}

/// `column > value`
pub fn gt(column: impl Into<CompactString>, value: impl Into<Value>) -> Condition {
    compare(column, CompareOp::Gt, value)
}

/// `column >= value`
pub fn gte(column: impl Into<CompactString>, value: impl Into<Value>) -> Condition {
    compare(column, CompareOp::Gte, value)
}

/// `column < value`
pub fn lt(column: impl Into<CompactString>, value: impl Into<Value>) -> Condition {
    compare(column, CompareOp::Lt, value)
}

/// `column <= value`
pub fn lte(column: impl Into<CompactString>, value: impl Into<Value>) -> Condition {
    compare(column, CompareOp::Lte, value)
}

/// `column LIKE pattern`
pub fn like(column: impl Into<CompactString>, pattern: impl Into<Value>) -> Condition {
    compare(column, CompareOp::Like, pattern)
}

/// `column NOT LIKE pattern`
pub fn not_like(column: impl Into<CompactString>, pattern: impl Into<Value>) -> Condition {
    compare(column, CompareOp::NotLike, pattern)
}

/// `column IN (...)`. An empty list matches nothing.
pub fn in_array<I, V>(column: impl Into<CompactString>, values: I) -> Condition
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Condition::InArray {
        column: column.into(),
        values: values.into_iter().map(Into::into).collect(),
        negated: false,
    }
}

/// `column NOT IN (...)`. An empty list matches everything.
pub fn not_in_array<I, V>(column: impl Into<CompactString>, values: I) -> Condition
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Condition::InArray {
        column: column.into(),
        values: values.into_iter().map(Into::into).collect(),
        negated: true,
    }
}

pub fn is_null(column: impl Into<CompactString>) -> Condition {
    Condition::IsNull {
        column: column.into(),
        negated: false,
    }
}

pub fn is_not_null(column: impl Into<CompactString>) -> Condition {
    Condition::IsNull {
        column: column.into(),
        negated: true,
    }
}

pub fn and(conditions: impl IntoIterator<Item = Condition>) -> Condition {
    Condition::And(conditions.into_iter().collect())
}

pub fn or(conditions: impl IntoIterator<Item = Condition>) -> Condition {
    Condition::Or(conditions.into_iter().collect())
}

pub fn not(condition: Condition) -> Condition {
    Condition::Not(Box::new(condition))
}

/// Raw SQL condition.
pub fn sql(fragment: SQL) -> Condition {
    Condition::Sql(fragment)
}

fn qualified_column(table: &Table, alias: &str, key: &str) -> Result<SQL> {
    let column = table
        .column(key)
        .ok_or_else(|| RelqError::unknown_column(table.key(), key))?;
    Ok(SQL::qualified(alias, column.name()))
}

impl Condition {
    /// Renders the condition against `table`, aliased as `alias`.
    pub fn to_sql(&self, table: &Table, alias: &str) -> Result<SQL> {
        Ok(match self {
            Condition::Compare { column, op, value } => qualified_column(table, alias, column)?
                .append(SQL::raw(op.as_sql()))
                .append(SQL::param(value.clone())),
            Condition::InArray {
                column,
                values,
                negated,
            } => {
                let column = qualified_column(table, alias, column)?;
                if values.is_empty() {
                    return Ok(SQL::raw(if *negated { "true" } else { "false" }));
                }
                let list = SQL::join(values.iter().cloned().map(SQL::param), ", ").parens();
                column
                    .append(SQL::raw(if *negated { " NOT IN " } else { " IN " }))
                    .append(list)
            }
            Condition::IsNull { column, negated } => qualified_column(table, alias, column)?
                .append(SQL::raw(if *negated {
                    " IS NOT NULL"
                } else {
                    " IS NULL"
                })),
            Condition::And(conditions) => Self::join(conditions, " AND ", "true", table, alias)?,
            Condition::Or(conditions) => Self::join(conditions, " OR ", "false", table, alias)?,
            Condition::Not(inner) => SQL::raw("NOT ").append(inner.to_sql(table, alias)?.parens()),
            Condition::Sql(fragment) => fragment.resolve_columns(table, alias)?,
        })
    }

    fn join(
        conditions: &[Condition],
        separator: &str,
        identity: &'static str,
        table: &Table,
        alias: &str,
    ) -> Result<SQL> {
        match conditions {
            [] => Ok(SQL::raw(identity)),
            [single] => single.to_sql(table, alias),
            many => {
                let parts = many
                    .iter()
                    .map(|c| c.to_sql(table, alias).map(SQL::parens))
                    .collect::<Result<Vec<_>>>()?;
                Ok(SQL::join(parts, separator))
            }
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// One `ORDER BY` term.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    expr: SQL,
    direction: Option<Direction>,
}

impl OrderBy {
    /// Orders by a raw expression; [`SQL::column`] references resolve
    /// against the ordered table.
    pub fn sql(expr: SQL) -> Self {
        Self {
            expr,
            direction: None,
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn to_sql(&self, table: &Table, alias: &str) -> Result<SQL> {
        let expr = self.expr.resolve_columns(table, alias)?;
        Ok(match self.direction {
            Some(Direction::Asc) => expr.append(SQL::raw(" ASC")),
            Some(Direction::Desc) => expr.append(SQL::raw(" DESC")),
            None => expr,
        })
    }
}

/// Ascending order on a column key.
pub fn asc(column: impl Into<CompactString>) -> OrderBy {
    OrderBy {
        expr: SQL::column(column),
        direction: Some(Direction::Asc),
    }
}

/// Descending order on a column key.
pub fn desc(column: impl Into<CompactString>) -> OrderBy {
    OrderBy {
        expr: SQL::column(column),
        direction: Some(Direction::Desc),
    }
}
