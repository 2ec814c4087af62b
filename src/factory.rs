//! Connection tool factory
//!
//! Reads `DB__<NAME>__TYPE` and builds the matching tool. No connection is
//! opened here; call `connect` or use [`with_connection`](crate::with_connection).

use crate::document::MongoTool;
use crate::error::{DbToolError, Result};
use crate::relational::RelationalTool;
use crate::settings::EnvSettings;
use crate::tool::DbTool;
use crate::types::DatabaseType;

/// Build the tool configured for `name`
///
/// # Example
/// ```
/// # use envdb_tools::{EnvSettings, create_tool, DatabaseType};
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = EnvSettings::from_map([
///     ("DB__PRIMARY__TYPE", "sqlite"),
///     ("DB__PRIMARY__URL", "sqlite:///test.db"),
/// ]);
/// let tool = create_tool("primary", settings)?;
/// assert_eq!(tool.database_type(), DatabaseType::Sqlite);
/// # Ok(())
/// # }
/// ```
///
/// # Errors
/// - `MissingType` when `DB__<NAME>__TYPE` is unset or blank
/// - `UnknownType` when the value is not one of the supported types
pub fn create_tool(name: &str, settings: EnvSettings) -> Result<DbTool> {
    let kind = settings.get_or(name, "TYPE", "");
    let kind = kind.trim();
    if kind.is_empty() {
        return Err(DbToolError::MissingType {
            key: settings.env_key(name, "TYPE"),
        });
    }

    let db_type = DatabaseType::parse(kind).ok_or_else(|| DbToolError::UnknownType {
        name: name.to_string(),
        kind: kind.to_lowercase(),
    })?;

    log::debug!("{}: building {} tool", name, db_type);

    let tool = match db_type.dialect() {
        Some(dialect) => DbTool::Relational(RelationalTool::new(name, dialect, settings)),
        None => DbTool::Document(MongoTool::new(name, settings)),
    };

    Ok(tool)
}
