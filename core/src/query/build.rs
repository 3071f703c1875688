//! SQL generation for the relational query API.
//!
//! The root table is selected as `t0`. Each loaded relation becomes a
//! correlated scalar subquery that aggregates the related rows into JSON,
//! recursively for nested relations. Aliases `t1`, `t2`, ... are assigned
//! depth-first.

use compact_str::CompactString;

use crate::column::{Column, ColumnKind};
use crate::dialect::{Dialect, DialectExt};
use crate::error::{RelqError, Result};
use crate::relation::{Relation, RelationKind};
use crate::schema::Schema;
use crate::sql::SQL;
use crate::table::Table;

use super::config::{ColumnSelection, QueryConfig};
use super::selection::{FieldKind, SelectedField, Selection};

/// A compiled relational query: the SQL tree plus one [`SelectedField`] per
/// selected expression, in select-list order.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltRelationalQuery {
    pub sql: SQL,
    pub selection: Selection,
}

/// Builds the relational query for the table keyed `table`.
pub fn build_relational_query(
    dialect: Dialect,
    schema: &Schema,
    table: &str,
    config: &QueryConfig,
) -> Result<BuiltRelationalQuery> {
    let table = schema.require_table(table)?;
    let mut builder = RelationalBuilder {
        dialect,
        schema,
        next_alias: 1,
    };
    builder.root(table, config)
}

struct RelationalBuilder<'s> {
    dialect: Dialect,
    schema: &'s Schema,
    next_alias: usize,
}

/// Resolves the column selection of `config` against `table`, keeping
/// declaration order.
fn selected_columns<'t>(table: &'t Table, selection: &ColumnSelection) -> Result<Vec<&'t Column>> {
    let check = |keys: &[CompactString]| {
        keys.iter()
            .map(|key| {
                table
                    .column(key)
                    .map(|c| c.key())
                    .ok_or_else(|| RelqError::unknown_column(table.key(), key))
            })
            .collect::<Result<Vec<_>>>()
    };
    Ok(match selection {
        ColumnSelection::All => table.columns().iter().collect(),
        ColumnSelection::Include(keys) => {
            let keys = check(keys)?;
            table
                .columns()
                .iter()
                .filter(|c| keys.contains(&c.key()))
                .collect()
        }
        ColumnSelection::Omit(keys) => {
            let keys = check(keys)?;
            table
                .columns()
                .iter()
                .filter(|c| !keys.contains(&c.key()))
                .collect()
        }
    })
}

fn write_u32(sql: &mut SQL, keyword: &str, n: u32) {
    sql.push_str(&format!("{keyword}{n}"));
}

/// Writes a single-quoted JSON object key.
fn push_json_key(sql: &mut SQL, key: &str) {
    sql.push_str("'");
    sql.push_str(&key.replace('\'', "''"));
    sql.push_str("', ");
}

/// Relations requested by `config`, resolved against `table`.
fn requested_relations<'a, 's>(
    schema: &'s Schema,
    table: &Table,
    config: &'a QueryConfig,
) -> Result<Vec<(&'s Relation, &'a QueryConfig)>> {
    config
        .with
        .iter()
        .map(|(name, nested)| {
            schema
                .relation(table.key(), name)
                .map(|relation| (relation, nested))
                .ok_or_else(|| RelqError::UnknownRelation {
                    table: table.key().to_string(),
                    relation: name.to_string(),
                })
        })
        .collect()
}

impl RelationalBuilder<'_> {
    fn alias(&mut self) -> CompactString {
        let alias = compact_str::format_compact!("t{}", self.next_alias);
        self.next_alias += 1;
        alias
    }

    fn root(&mut self, table: &Table, config: &QueryConfig) -> Result<BuiltRelationalQuery> {
        let alias = "t0";
        let columns = selected_columns(table, &config.columns)?;
        let relations = requested_relations(self.schema, table, config)?;

        let mut selection = Selection::with_capacity(
            columns.len() + config.extras.len() + relations.len(),
        );
        let mut select_list = Vec::with_capacity(selection.capacity());

        for column in &columns {
            select_list.push(SQL::qualified(alias, column.name()));
            selection.push(SelectedField::column(
                column.key(),
                column.name(),
                column.kind(),
            ));
        }

        for (name, expr) in &config.extras {
            select_list.push(
                expr.resolve_columns(table, alias)?
                    .parens()
                    .append(SQL::raw(" AS "))
                    .append(SQL::ident(name.clone())),
            );
            selection.push(SelectedField::extra(name));
        }

        for (relation, nested) in relations {
            let (mut subquery, field) = self.relation_subquery(relation, alias, nested)?;
            // PostgreSQL returns json; cast to text so every driver reads a string
            if self.dialect == Dialect::PostgreSQL {
                subquery.push_str("::text");
            }
            subquery.push_str(" AS ");
            subquery.push_ident(&field.alias);
            select_list.push(subquery);
            selection.push(field);
        }

        if select_list.is_empty() {
            return Err(RelqError::Query(format!(
                "no fields selected for table {}",
                table.key()
            )));
        }

        let mut sql = SQL::raw("SELECT ");
        sql.push_sql(SQL::join(select_list, ", "));
        sql.push_str(" FROM ");
        sql.push_ident(table.name());
        sql.push_str(" AS ");
        sql.push_ident(alias);

        if let Some(filter) = &config.filter {
            sql.push_str(" WHERE ");
            sql.push_sql(filter.to_sql(table, alias)?);
        }
        if !config.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_sql(self.order_by(table, alias, config)?);
        }
        if let Some(n) = config.limit {
            write_u32(&mut sql, " LIMIT ", n);
        }
        if let Some(n) = config.offset {
            if config.limit.is_none() && self.dialect.requires_limit_before_offset() {
                sql.push_str(" LIMIT -1");
            }
            write_u32(&mut sql, " OFFSET ", n);
        }

        Ok(BuiltRelationalQuery { sql, selection })
    }

    fn order_by(&self, table: &Table, alias: &str, config: &QueryConfig) -> Result<SQL> {
        let terms = config
            .order_by
            .iter()
            .map(|o| o.to_sql(table, alias))
            .collect::<Result<Vec<_>>>()?;
        Ok(SQL::join(terms, ", "))
    }

    /// Column value as embedded in a JSON object.
    ///
    /// Blobs are hex encoded and SQLite JSON text is re-parsed with `json()`
    /// so it nests as a document rather than a string. SQLite's `hex(NULL)`
    /// is `''`, so NULL blobs are kept NULL explicitly.
    fn json_column(&self, alias: &str, column: &Column) -> SQL {
        let value = SQL::qualified(alias, column.name());
        match (column.kind(), self.dialect) {
            (ColumnKind::Blob, Dialect::SQLite) => SQL::raw("CASE WHEN ")
                .append(value.clone())
                .append(SQL::raw(" IS NULL THEN NULL ELSE hex("))
                .append(value)
                .append(SQL::raw(") END")),
            (ColumnKind::Blob, Dialect::PostgreSQL) => SQL::raw("encode(")
                .append(value)
                .append(SQL::raw(", 'hex')")),
            (ColumnKind::Json, Dialect::SQLite) => {
                SQL::raw("json(").append(value).append(SQL::raw(")"))
            }
            _ => value,
        }
    }

    /// `json_object('key', value, ...)` over the selected columns, extras and
    /// nested relations of `table`.
    fn json_object(
        &mut self,
        table: &Table,
        alias: &str,
        config: &QueryConfig,
    ) -> Result<(SQL, Selection)> {
        let columns = selected_columns(table, &config.columns)?;
        let relations = requested_relations(self.schema, table, config)?;

        let mut selection = Selection::with_capacity(
            columns.len() + config.extras.len() + relations.len(),
        );
        let mut args = Vec::with_capacity(selection.capacity());

        for column in &columns {
            let mut arg = SQL::empty();
            push_json_key(&mut arg, column.key());
            arg.push_sql(self.json_column(alias, column));
            args.push(arg);
            selection.push(SelectedField::column(
                column.key(),
                column.name(),
                column.kind(),
            ));
        }

        for (name, expr) in &config.extras {
            let mut arg = SQL::empty();
            push_json_key(&mut arg, name);
            arg.push_sql(expr.resolve_columns(table, alias)?.parens());
            args.push(arg);
            selection.push(SelectedField::extra(name));
        }

        for (relation, nested) in relations {
            let (subquery, field) = self.relation_subquery(relation, alias, nested)?;
            let mut arg = SQL::empty();
            push_json_key(&mut arg, relation.name());
            // json() keeps the nested payload a document instead of a string
            if self.dialect == Dialect::SQLite {
                arg.push_sql(SQL::raw("json(").append(subquery).append(SQL::raw(")")));
            } else {
                arg.push_sql(subquery);
            }
            args.push(arg);
            selection.push(field);
        }

        let object = SQL::raw(self.dialect.json_object_fn())
            .append(SQL::join(args, ", "))
            .append(SQL::raw(")"));
        Ok((object, selection))
    }

    /// Correlated subquery loading `relation` for rows of `parent_alias`.
    fn relation_subquery(
        &mut self,
        relation: &Relation,
        parent_alias: &str,
        config: &QueryConfig,
    ) -> Result<(SQL, SelectedField)> {
        let source = self.schema.require_table(relation.source())?;
        let target = self.schema.require_table(relation.target())?;
        let alias = self.alias();
        let many = relation.kind() == RelationKind::Many;
        let has_order = !config.order_by.is_empty();

        // Aggregate input order is only guaranteed by ORDER BY inside
        // json_agg(). SQLite's json_group_array has no aggregate ORDER BY.
        let order_in_agg = many && self.dialect.orders_inside_aggregate() && has_order;

        // LIMIT / OFFSET must apply before aggregation.
        let inner_subquery = many
            && (config.limit.is_some()
                || config.offset.is_some()
                || (has_order && !order_in_agg));

        let (object, selection) = self.json_object(target, &alias, config)?;

        let mut sql = SQL::raw("(SELECT ");
        if many {
            sql.push_str(self.dialect.json_array_agg_open());
        }
        sql.push_sql(object);
        if order_in_agg {
            sql.push_str(" ORDER BY ");
            sql.push_sql(self.order_by(target, &alias, config)?);
        }
        if many {
            sql.push_str(self.dialect.json_array_agg_close());
        }

        sql.push_str(" FROM ");
        if inner_subquery {
            sql.push_str("(SELECT ");
            sql.push_ident(&alias);
            sql.push_str(".* FROM ");
        }
        sql.push_ident(target.name());
        sql.push_str(" AS ");
        sql.push_ident(&alias);
        sql.push_str(" WHERE ");

        let mut join = Vec::with_capacity(relation.fields().len());
        for (field, reference) in relation.fields().zip(relation.references()) {
            let local = source
                .column(field)
                .ok_or_else(|| RelqError::unknown_column(source.key(), field))?;
            let foreign = target
                .column(reference)
                .ok_or_else(|| RelqError::unknown_column(target.key(), reference))?;
            join.push(
                SQL::qualified(alias.clone(), foreign.name())
                    .append(SQL::raw(" = "))
                    .append(SQL::qualified(parent_alias, local.name())),
            );
        }
        sql.push_sql(SQL::join(join, " AND "));

        if let Some(filter) = &config.filter {
            sql.push_str(" AND ");
            sql.push_sql(filter.to_sql(target, &alias)?.parens());
        }
        // The derived table still sorts so LIMIT / OFFSET pick the right rows.
        if has_order && (inner_subquery || !order_in_agg) {
            sql.push_str(" ORDER BY ");
            sql.push_sql(self.order_by(target, &alias, config)?);
        }

        match relation.kind() {
            RelationKind::One => sql.push_str(" LIMIT 1"),
            RelationKind::Many => {
                if let Some(n) = config.limit {
                    write_u32(&mut sql, " LIMIT ", n);
                }
            }
        }
        if let Some(n) = config.offset {
            if many && config.limit.is_none() && self.dialect.requires_limit_before_offset() {
                sql.push_str(" LIMIT -1");
            }
            write_u32(&mut sql, " OFFSET ", n);
        }

        if inner_subquery {
            sql.push_str(") AS ");
            sql.push_ident(&alias);
        }
        sql.push_str(")");

        let field = SelectedField {
            key: relation.name().into(),
            alias: compact_str::format_compact!("__rel_{}", relation.name()),
            kind: FieldKind::Relation {
                target: target.key().into(),
                cardinality: relation.kind(),
                nullable: relation.is_nullable(),
                selection,
            },
        };
        Ok((sql, field))
    }
}
