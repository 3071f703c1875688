//! Row reassembly: flat driver rows into nested JSON objects.

use serde_json::{Map, Value as JsonValue};

use crate::column::ColumnKind;
use crate::error::{RelqError, Result};
use crate::relation::RelationKind;
use crate::schema::Schema;
use crate::table::Table;
use crate::value::Value;

use super::selection::{FieldKind, SelectedField};

/// A reassembled row: result keys to values, relations nested.
pub type RelationalRow = Map<String, JsonValue>;

/// A raw driver row: one value per selected expression.
pub type RawRow = Vec<Value>;

/// Converts one flat row into a nested [`RelationalRow`].
///
/// `row` holds one value per entry of `selection`, in order. Relation
/// payloads may arrive as JSON text or as already-decoded JSON.
pub fn map_relational_row(
    schema: &Schema,
    table: &Table,
    row: &[Value],
    selection: &[SelectedField],
) -> Result<RelationalRow> {
    if row.len() != selection.len() {
        return Err(RelqError::Mapping(format!(
            "{}: row has {} value(s) but {} field(s) were selected",
            table.key(),
            row.len(),
            selection.len()
        )));
    }

    let mut out = Map::with_capacity(selection.len());
    for (field, value) in selection.iter().zip(row) {
        let mapped = match &field.kind {
            FieldKind::Column(kind) => map_column_value(*kind, value)?,
            FieldKind::Extra => value.to_json(),
            FieldKind::Relation { .. } => {
                let payload = match value {
                    Value::Null => JsonValue::Null,
                    Value::Text(text) => serde_json::from_str(text)?,
                    Value::Json(json) => json.clone(),
                    other => {
                        return Err(RelqError::Mapping(format!(
                            "{}.{}: expected a JSON payload, got {}",
                            table.key(),
                            field.key,
                            other.type_name()
                        )));
                    }
                };
                map_relation_payload(schema, field, payload)?
            }
        };
        out.insert(field.key.to_string(), mapped);
    }
    Ok(out)
}

/// Decodes a raw column value according to the column kind.
pub fn map_column_value(kind: ColumnKind, value: &Value) -> Result<JsonValue> {
    Ok(match (kind, value) {
        (_, Value::Null) => JsonValue::Null,
        (ColumnKind::Boolean, Value::Integer(i)) => JsonValue::Bool(*i != 0),
        (ColumnKind::Json, Value::Text(text)) => serde_json::from_str(text)?,
        (ColumnKind::Blob, Value::Text(hex)) => decode_hex(hex)?,
        (ColumnKind::Real, Value::Integer(i)) => real(*i as f64),
        (_, other) => other.to_json(),
    })
}

fn real(f: f64) -> JsonValue {
    serde_json::Number::from_f64(f)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

fn decode_hex(text: &str) -> Result<JsonValue> {
    let bytes = hex::decode(text)
        .map_err(|e| RelqError::Mapping(format!("invalid hex blob: {e}")))?;
    Ok(JsonValue::Array(bytes.into_iter().map(JsonValue::from).collect()))
}

/// Decodes a column value embedded in a JSON object.
fn map_json_value(kind: ColumnKind, value: JsonValue) -> Result<JsonValue> {
    Ok(match (kind, value) {
        (_, JsonValue::Null) => JsonValue::Null,
        (ColumnKind::Boolean, JsonValue::Number(n)) => {
            JsonValue::Bool(n.as_i64().is_some_and(|i| i != 0))
        }
        (ColumnKind::Blob, JsonValue::String(hex)) => decode_hex(&hex)?,
        (_, other) => other,
    })
}

fn map_relation_payload(schema: &Schema, field: &SelectedField, payload: JsonValue) -> Result<JsonValue> {
    let FieldKind::Relation {
        target,
        cardinality,
        selection,
        ..
    } = &field.kind
    else {
        return Ok(payload);
    };

    // Nested payloads may still be JSON text when a driver loses the JSON subtype.
    let payload = match payload {
        JsonValue::String(text) => serde_json::from_str(&text)?,
        other => other,
    };

    match (cardinality, payload) {
        (RelationKind::One, JsonValue::Null) => Ok(JsonValue::Null),
        (RelationKind::Many, JsonValue::Null) => Ok(JsonValue::Array(Vec::new())),
        (RelationKind::One, JsonValue::Object(object)) => {
            map_json_object(schema, target, object, selection).map(JsonValue::Object)
        }
        (RelationKind::Many, JsonValue::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                JsonValue::Object(object) => {
                    map_json_object(schema, target, object, selection).map(JsonValue::Object)
                }
                other => Err(unexpected(&field.key, &other)),
            })
            .collect::<Result<Vec<_>>>()
            .map(JsonValue::Array),
        (_, other) => Err(unexpected(&field.key, &other)),
    }
}

fn unexpected(field: &str, value: &JsonValue) -> RelqError {
    let kind = match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    };
    RelqError::Mapping(format!("{field}: unexpected {kind} in relation payload"))
}

fn map_json_object(
    schema: &Schema,
    table: &str,
    mut object: Map<String, JsonValue>,
    selection: &[SelectedField],
) -> Result<RelationalRow> {
    if schema.table(table).is_none() {
        return Err(RelqError::UnknownTable(table.to_string()));
    }
    let mut out = Map::with_capacity(selection.len());
    for field in selection {
        let value = object.remove(field.key.as_str()).unwrap_or(JsonValue::Null);
        let mapped = match &field.kind {
            FieldKind::Column(kind) => map_json_value(*kind, value)?,
            FieldKind::Extra => value,
            FieldKind::Relation { .. } => map_relation_payload(schema, field, value)?,
        };
        out.insert(field.key.to_string(), mapped);
    }
    Ok(out)
}
