use compact_str::CompactString;
use smallvec::SmallVec;
use std::fmt::{self, Display, Write};

use crate::dialect::DialectExt;
use crate::error::{RelqError, Result};
use crate::table::Table;
use crate::value::Value;
use relq_types::Dialect;

/// A SQL chunk represents a part of an SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SQLChunk {
    /// Verbatim SQL text
    Text(CompactString),
    /// A bound parameter, rendered as a dialect placeholder
    Param(Value),
    /// A quoted identifier: `"name"`
    Identifier(CompactString),
    /// A qualified column: `"alias"."name"`
    Column {
        alias: CompactString,
        name: CompactString,
    },
    /// A column of "the current table" referenced by key, qualified once the
    /// table alias is known (see [`SQL::resolve_columns`])
    TableColumn(CompactString),
    /// A nested fragment
    SQL(Box<SQL>),
}

/// An abstract SQL expression: text interleaved with identifiers and
/// parameters. Rendered to dialect text by [`SQL::build`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SQL {
    pub chunks: SmallVec<[SQLChunk; 8]>,
}

/// Rendered statement text with its bind parameters, in placeholder order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub text: String,
    pub params: Vec<Value>,
}

impl Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)?;
        if !self.params.is_empty() {
            f.write_str(" -- params: [")?;
            for (i, p) in self.params.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{p}")?;
            }
            f.write_char(']')?;
        }
        Ok(())
    }
}

impl SQL {
    pub const fn empty() -> Self {
        Self {
            chunks: SmallVec::new_const(),
        }
    }

    /// Raw SQL text. The text is emitted verbatim.
    pub fn raw(text: impl Into<CompactString>) -> Self {
        Self::from_chunk(SQLChunk::Text(text.into()))
    }

    /// A single bound parameter.
    pub fn param(value: impl Into<Value>) -> Self {
        Self::from_chunk(SQLChunk::Param(value.into()))
    }

    /// A quoted identifier.
    pub fn ident(name: impl Into<CompactString>) -> Self {
        Self::from_chunk(SQLChunk::Identifier(name.into()))
    }

    /// A column qualified by a table alias.
    pub fn qualified(alias: impl Into<CompactString>, name: impl Into<CompactString>) -> Self {
        Self::from_chunk(SQLChunk::Column {
            alias: alias.into(),
            name: name.into(),
        })
    }

    /// A column of the table the fragment is applied to, by column key.
    ///
    /// ```
    /// use relq_core::sql::SQL;
    ///
    /// let expr = SQL::raw("lower(").append(SQL::column("name")).append(SQL::raw(")"));
    /// assert!(!expr.is_empty());
    /// ```
    pub fn column(key: impl Into<CompactString>) -> Self {
        Self::from_chunk(SQLChunk::TableColumn(key.into()))
    }

    fn from_chunk(chunk: SQLChunk) -> Self {
        let mut chunks = SmallVec::new();
        chunks.push(chunk);
        Self { chunks }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Appends another fragment, consuming both.
    pub fn append(mut self, other: SQL) -> Self {
        self.push_sql(other);
        self
    }

    pub fn push_sql(&mut self, other: SQL) {
        if other.chunks.len() == 1 {
            self.chunks.extend(other.chunks);
        } else if !other.is_empty() {
            self.chunks.push(SQLChunk::SQL(Box::new(other)));
        }
    }

    pub fn push_str(&mut self, text: &str) {
        if let Some(SQLChunk::Text(last)) = self.chunks.last_mut() {
            last.push_str(text);
        } else {
            self.chunks.push(SQLChunk::Text(text.into()));
        }
    }

    pub fn push_param(&mut self, value: impl Into<Value>) {
        self.chunks.push(SQLChunk::Param(value.into()));
    }

    pub fn push_ident(&mut self, name: &str) {
        self.chunks.push(SQLChunk::Identifier(name.into()));
    }

    pub fn push_qualified(&mut self, alias: &str, name: &str) {
        self.chunks.push(SQLChunk::Column {
            alias: alias.into(),
            name: name.into(),
        });
    }

    /// Joins fragments with a separator.
    pub fn join(parts: impl IntoIterator<Item = SQL>, separator: &str) -> Self {
        let mut out = SQL::empty();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                out.push_str(separator);
            }
            out.push_sql(part);
        }
        out
    }

    /// Wraps the fragment in parentheses.
    pub fn parens(self) -> Self {
        SQL::raw("(").append(self).append(SQL::raw(")"))
    }

    /// Replaces every [`SQLChunk::TableColumn`] with the database column of
    /// `table`, qualified by `alias`.
    pub fn resolve_columns(&self, table: &Table, alias: &str) -> Result<SQL> {
        let mut out = SQL::empty();
        for chunk in &self.chunks {
            match chunk {
                SQLChunk::TableColumn(key) => {
                    let column = table.column(key).ok_or_else(|| {
                        RelqError::unknown_column(table.key(), key)
                    })?;
                    out.push_qualified(alias, column.name());
                }
                SQLChunk::SQL(nested) => {
                    out.chunks
                        .push(SQLChunk::SQL(Box::new(nested.resolve_columns(table, alias)?)));
                }
                other => out.chunks.push(other.clone()),
            }
        }
        Ok(out)
    }

    /// Number of bound parameters in the fragment.
    pub fn param_count(&self) -> usize {
        self.chunks
            .iter()
            .map(|chunk| match chunk {
                SQLChunk::Param(_) => 1,
                SQLChunk::SQL(nested) => nested.param_count(),
                _ => 0,
            })
            .sum()
    }

    /// Serializes the fragment into parameterized text for `dialect`.
    ///
    /// Placeholders are numbered in textual order, so nested fragments
    /// never need renumbering.
    pub fn build(&self, dialect: Dialect) -> Query {
        let mut query = Query {
            text: String::with_capacity(128),
            params: Vec::with_capacity(self.param_count()),
        };
        self.write_into(dialect, &mut query);
        query
    }

    fn write_into(&self, dialect: Dialect, query: &mut Query) {
        for chunk in &self.chunks {
            match chunk {
                SQLChunk::Text(text) => query.text.push_str(text),
                SQLChunk::Param(value) => {
                    query.params.push(value.clone());
                    query
                        .text
                        .push_str(&dialect.render_placeholder(query.params.len()));
                }
                SQLChunk::Identifier(name) => write_identifier(name, &mut query.text),
                SQLChunk::Column { alias, name } => {
                    write_identifier(alias, &mut query.text);
                    query.text.push('.');
                    write_identifier(name, &mut query.text);
                }
                // Unresolved references render by key so debugging output stays readable.
                SQLChunk::TableColumn(key) => write_identifier(key, &mut query.text),
                SQLChunk::SQL(nested) => nested.write_into(dialect, query),
            }
        }
    }
}

impl Display for SQL {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build(Dialect::SQLite).text)
    }
}

/// Writes `"name"`, doubling embedded quotes.
pub(crate) fn write_identifier(name: &str, out: &mut String) {
    out.push('"');
    if name.contains('"') {
        out.push_str(&name.replace('"', "\"\""));
    } else {
        out.push_str(name);
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_follow_text_order() {
        let sql = SQL::raw("SELECT ")
            .append(SQL::qualified("t0", "id"))
            .append(SQL::raw(" FROM x WHERE a = "))
            .append(SQL::param(1))
            .append(SQL::raw(" AND b IN ("))
            .append(SQL::join([SQL::param("x"), SQL::param("y")], ", "))
            .append(SQL::raw(")"));

        let pg = sql.build(Dialect::PostgreSQL);
        assert_eq!(
            pg.text,
            r#"SELECT "t0"."id" FROM x WHERE a = $1 AND b IN ($2, $3)"#
        );
        assert_eq!(
            pg.params,
            vec![Value::Integer(1), Value::from("x"), Value::from("y")]
        );

        let lite = sql.build(Dialect::SQLite);
        assert_eq!(
            lite.text,
            r#"SELECT "t0"."id" FROM x WHERE a = ? AND b IN (?, ?)"#
        );
    }

    #[test]
    fn test_identifier_quoting() {
        let q = SQL::ident(r#"we"ird"#).build(Dialect::SQLite);
        assert_eq!(q.text, r#""we""ird""#);
    }

    #[test]
    fn test_push_str_merges_text() {
        let mut sql = SQL::raw("a");
        sql.push_str("b");
        assert_eq!(sql.chunks.len(), 1);
        assert_eq!(sql.to_string(), "ab");
    }
}
