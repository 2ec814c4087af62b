//! Row to JSON mapping for SQL results
//!
//! Converts sqlx `AnyRow` instances to [`Row`] maps keyed by column name.

use crate::error::DbToolError;
use crate::types::Row;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Number, Value};
use sqlx::any::AnyRow;
use sqlx::{Column, Row as _, TypeInfo, ValueRef};

/// Convert a sqlx `AnyRow` into a column-name keyed map
///
/// Values are dispatched on their own runtime type rather than the declared
/// column type: SQLite declares computed columns (literals, parameters,
/// expressions) as `NULL`. Each kind maps to the closest JSON value and
/// BLOBs are rendered as base64 strings.
///
/// # Errors
/// Returns `DbToolError::Sqlx` if a column cannot be decoded as its reported kind.
pub fn row_to_map(row: &AnyRow) -> Result<Row, DbToolError> {
    let mut map = Row::new();

    for column in row.columns() {
        let ordinal = column.ordinal();
        let name = column.name().to_string();
        let raw = row.try_get_raw(ordinal)?;
        if raw.is_null() {
            map.insert(name, Value::Null);
            continue;
        }
        let type_info = raw.type_info().into_owned();
        let type_name = type_info.name();

        let value = match type_name {
            "BOOLEAN" | "BOOL" => row
                .try_get::<Option<bool>, _>(ordinal)?
                .map(Value::Bool)
                .unwrap_or(Value::Null),
            "SMALLINT" | "INTEGER" | "INT" | "BIGINT" => row
                .try_get::<Option<i64>, _>(ordinal)?
                .map(Value::from)
                .unwrap_or(Value::Null),
            "REAL" | "FLOAT" | "DOUBLE" => row
                .try_get::<Option<f64>, _>(ordinal)?
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            "BLOB" => row
                .try_get::<Option<Vec<u8>>, _>(ordinal)?
                .map(|bytes| Value::String(BASE64.encode(bytes)))
                .unwrap_or(Value::Null),
            // TEXT and anything else the driver can render as text
            _ => match row.try_get::<Option<String>, _>(ordinal) {
                Ok(Some(s)) => Value::String(s),
                Ok(None) => Value::Null,
                Err(e) => {
                    log::debug!("column '{}' ({}) not decodable as text: {}", name, type_name, e);
                    return Err(DbToolError::Sqlx(e));
                }
            },
        };

        map.insert(name, value);
    }

    Ok(map)
}
