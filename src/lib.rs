//! Environment-configured database connection tools
//!
//! Each logical connection name is configured through namespaced environment
//! variables (`DB__<NAME>__TYPE`, `DB__<NAME>__URL`, ...). [`create_tool`]
//! reads the type and builds a relational tool (SQLite, SQL Server,
//! PostgreSQL, MySQL) or a MongoDB tool. Tools are opened and closed
//! explicitly or through [`with_connection`].

pub mod error;
pub mod types;

// Configuration and statement utilities
pub mod dsn;
pub mod params;
pub mod row_converter;
pub mod settings;
pub mod validate;

// Tools
pub mod document;
pub mod factory;
pub mod relational;
pub mod tool;

// Re-export secrecy types for consumers
pub use secrecy::{ExposeSecret, SecretString};

// Re-exports
pub use document::MongoTool;
pub use error::{DbToolError, ErrorKind, Result};
pub use factory::create_tool;
pub use relational::{RelationalTool, is_select_statement};
pub use settings::EnvSettings;
pub use tool::{ConnectionTool, DbTool, with_connection};
pub use types::{
    DatabaseType, ExecuteOutcome, FindOptions, Params, Row, SortDirection, SqlDialect,
};
