//! `CREATE TABLE` generation for finalized tables.

use relq_types::Dialect;

use crate::column::{Column, ColumnDefault};
use crate::foreign_key::ForeignKey;
use crate::sql::write_identifier;
use crate::table::Table;
use crate::value::Value;

fn quoted(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    write_identifier(name, &mut out);
    out
}

fn quoted_list<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.map(quoted).collect::<Vec<_>>().join(", ")
}

/// Renders a literal default.
fn default_literal(dialect: Dialect, value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Bool(b) => match dialect {
            Dialect::SQLite => i64::from(*b).to_string(),
            Dialect::PostgreSQL => if *b { "TRUE" } else { "FALSE" }.to_string(),
        },
        Value::Blob(bytes) => match dialect {
            Dialect::SQLite => format!("X'{}'", hex::encode(bytes)),
            Dialect::PostgreSQL => format!("'\\x{}'", hex::encode(bytes)),
        },
        Value::Json(json) => format!("'{}'", json.to_string().replace('\'', "''")),
    }
}

/// Column definition, without leading or trailing punctuation.
pub fn column_sql(dialect: Dialect, column: &Column, inline_pk: bool) -> String {
    let sql_type = column.sql_type(dialect);
    let mut sql = format!("{} {}", quoted(column.name()), sql_type);

    if inline_pk {
        sql.push_str(" PRIMARY KEY");
    }

    match column.default() {
        Some(ColumnDefault::Value(value)) => {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default_literal(dialect, value));
        }
        Some(ColumnDefault::Sql(expr)) => {
            sql.push_str(" DEFAULT (");
            sql.push_str(expr);
            sql.push(')');
        }
        None => {}
    }

    // INTEGER PRIMARY KEY is the rowid alias on SQLite and never NULL
    let rowid_alias = inline_pk && dialect == Dialect::SQLite && sql_type == "INTEGER";
    if column.is_not_null() && !rowid_alias {
        sql.push_str(" NOT NULL");
    }

    if column.is_unique() && !inline_pk {
        sql.push_str(" UNIQUE");
    }

    sql
}

/// `CONSTRAINT ... FOREIGN KEY ... REFERENCES ...`
pub fn foreign_key_sql(fk: &ForeignKey) -> String {
    let mut sql = format!(
        "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({})",
        quoted(&fk.name()),
        quoted_list(fk.column_names()),
        quoted(fk.foreign_table_name()),
        quoted_list(fk.foreign_column_names()),
    );
    if let Some(action) = fk.on_update() {
        sql.push_str(" ON UPDATE ");
        sql.push_str(action.as_sql());
    }
    if let Some(action) = fk.on_delete() {
        sql.push_str(" ON DELETE ");
        sql.push_str(action.as_sql());
    }
    sql
}

/// `CREATE TABLE IF NOT EXISTS` for `table`.
pub fn create_table_sql(dialect: Dialect, table: &Table) -> String {
    let pk: Vec<&str> = table.primary_columns().collect();
    let mut lines = Vec::with_capacity(table.columns().len() + table.foreign_keys().len() + 1);

    for column in table.columns() {
        let inline_pk = pk.len() == 1 && pk[0] == column.key();
        lines.push(format!("\t{}", column_sql(dialect, column, inline_pk)));
    }

    if pk.len() > 1 {
        let names = pk
            .iter()
            .filter_map(|key| table.column(key))
            .map(Column::name);
        lines.push(format!("\tPRIMARY KEY ({})", quoted_list(names)));
    }

    for fk in table.foreign_keys() {
        lines.push(format!("\t{}", foreign_key_sql(fk)));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
        quoted(table.name()),
        lines.join(",\n")
    )
}
