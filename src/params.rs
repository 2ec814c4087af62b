//! Named statement parameters
//!
//! Statements are written with `:name` placeholders and a [`Params`] map.
//! Before execution they are compiled to the positional form of the target
//! dialect and the values are bound in placeholder order.

use crate::error::{DbToolError, Result};
use crate::types::{Params, SqlDialect};
use lazy_regex::{Lazy, Regex, lazy_regex};
use serde_json::Value;
use sqlx::Any;
use sqlx::any::AnyArguments;
use sqlx::query::Query;

// Quoted literals and `::` casts are matched first so their contents are skipped
static TOKEN_REGEX: Lazy<Regex> =
    lazy_regex!(r#"'(?:[^']|'')*'|"(?:[^"]|"")*"|`[^`]*`|::|:([A-Za-z_][A-Za-z0-9_]*)"#);

/// Statement rewritten to positional placeholders, with values in bind order
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStatement {
    pub sql: String,
    pub values: Vec<Value>,
}

/// Rewrite `:name` placeholders to the dialect's positional form
///
/// Every occurrence gets its own position, so a name used twice binds twice.
///
/// # Examples
/// ```
/// # use envdb_tools::params::compile;
/// # use envdb_tools::types::{Params, SqlDialect};
/// # use serde_json::json;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut params = Params::new();
/// params.insert("id".into(), json!(7));
/// let stmt = compile("SELECT * FROM t WHERE id = :id", &params, SqlDialect::Postgres)?;
/// assert_eq!(stmt.sql, "SELECT * FROM t WHERE id = $1");
/// assert_eq!(stmt.values, vec![json!(7)]);
/// # Ok(())
/// # }
/// ```
///
/// # Errors
/// Returns `DbToolError::InvalidArgument` if a placeholder has no value in `params`.
pub fn compile(sql: &str, params: &Params, dialect: SqlDialect) -> Result<CompiledStatement> {
    let mut out = String::with_capacity(sql.len());
    let mut values = Vec::new();
    let mut last = 0;

    for caps in TOKEN_REGEX.captures_iter(sql) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        let value = params.get(name.as_str()).ok_or_else(|| {
            DbToolError::InvalidArgument(format!("Missing value for parameter :{}", name.as_str()))
        })?;

        out.push_str(&sql[last..whole.start()]);
        values.push(value.clone());
        out.push_str(&dialect.placeholder(values.len()));
        last = whole.end();
    }

    out.push_str(&sql[last..]);

    Ok(CompiledStatement { sql: out, values })
}

/// Bind one JSON value to an `Any` query
///
/// Arrays and objects are bound as their JSON text.
///
/// # Errors
/// Returns `DbToolError::InvalidArgument` for integers above `i64::MAX`.
pub fn bind_value<'q>(
    query: Query<'q, Any, AnyArguments<'q>>,
    value: &Value,
) -> Result<Query<'q, Any, AnyArguments<'q>>> {
    match value {
        Value::Null => Ok(query.bind(None::<String>)),
        Value::Bool(b) => Ok(query.bind(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(query.bind(i))
            } else if n.is_u64() {
                Err(DbToolError::InvalidArgument(format!(
                    "Integer parameter out of range: {}",
                    n
                )))
            } else if let Some(f) = n.as_f64() {
                Ok(query.bind(f))
            } else {
                Err(DbToolError::InvalidArgument(format!(
                    "Unsupported numeric parameter: {}",
                    n
                )))
            }
        }
        Value::String(s) => Ok(query.bind(s.clone())),
        Value::Array(_) | Value::Object(_) => Ok(query.bind(value.to_string())),
    }
}

/// Build a bound `Any` query from a compiled statement
pub fn build_query(stmt: &CompiledStatement) -> Result<Query<'_, Any, AnyArguments<'_>>> {
    let mut query = sqlx::query(&stmt.sql);
    for value in &stmt.values {
        query = bind_value(query, value)?;
    }
    Ok(query)
}
