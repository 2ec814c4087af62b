//! Type definitions for connection tools

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A result row or document: column/field name to JSON value
pub type Row = Map<String, Value>;

/// Named statement parameters, keyed without the leading `:`
pub type Params = Map<String, Value>;

/// Type discriminator selecting which connection tool to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    Sqlite,
    MsSql,
    Postgres,
    MySql,
    MongoDb,
}

impl DatabaseType {
    /// Parse a `TYPE` setting value (case-insensitive, surrounding whitespace ignored)
    ///
    /// # Examples
    /// ```
    /// # use envdb_tools::types::DatabaseType;
    /// assert_eq!(DatabaseType::parse("PostgreSQL"), Some(DatabaseType::Postgres));
    /// assert_eq!(DatabaseType::parse(" mongo "), Some(DatabaseType::MongoDb));
    /// assert_eq!(DatabaseType::parse("oracle"), None);
    /// ```
    pub fn parse(kind: &str) -> Option<Self> {
        match kind.trim().to_lowercase().as_str() {
            "sqlite" => Some(Self::Sqlite),
            "mssql" => Some(Self::MsSql),
            "postgres" | "postgresql" => Some(Self::Postgres),
            "mysql" => Some(Self::MySql),
            "mongo" | "mongodb" => Some(Self::MongoDb),
            _ => None,
        }
    }

    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::MsSql => "mssql",
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::MongoDb => "mongodb",
        }
    }

    /// SQL dialect for relational types, `None` for document stores
    pub fn dialect(&self) -> Option<SqlDialect> {
        match self {
            Self::Sqlite => Some(SqlDialect::Sqlite),
            Self::MsSql => Some(SqlDialect::MsSql),
            Self::Postgres => Some(SqlDialect::Postgres),
            Self::MySql => Some(SqlDialect::MySql),
            Self::MongoDb => None,
        }
    }

    pub fn all() -> &'static [DatabaseType] {
        &[
            DatabaseType::Sqlite,
            DatabaseType::MsSql,
            DatabaseType::Postgres,
            DatabaseType::MySql,
            DatabaseType::MongoDb,
        ]
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite => write!(f, "SQLite"),
            Self::MsSql => write!(f, "SQL Server"),
            Self::Postgres => write!(f, "PostgreSQL"),
            Self::MySql => write!(f, "MySQL"),
            Self::MongoDb => write!(f, "MongoDB"),
        }
    }
}

/// SQL dialect of a relational connection tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlDialect {
    Sqlite,
    MsSql,
    Postgres,
    MySql,
}

impl SqlDialect {
    /// Detect dialect from a connection URL scheme
    ///
    /// SQLAlchemy driver suffixes (`postgresql+psycopg`) are ignored.
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.split(':').next()?.to_lowercase();
        let base = scheme.split('+').next().unwrap_or(&scheme);
        match base {
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            "mssql" | "sqlserver" => Some(Self::MsSql),
            "postgres" | "postgresql" => Some(Self::Postgres),
            "mysql" | "mariadb" => Some(Self::MySql),
            _ => None,
        }
    }

    /// Positional placeholder for the 1-based parameter `index`
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Self::Postgres => format!("${}", index),
            Self::MsSql => format!("@p{}", index),
            Self::Sqlite | Self::MySql => "?".to_string(),
        }
    }

    pub fn database_type(&self) -> DatabaseType {
        match self {
            Self::Sqlite => DatabaseType::Sqlite,
            Self::MsSql => DatabaseType::MsSql,
            Self::Postgres => DatabaseType::Postgres,
            Self::MySql => DatabaseType::MySql,
        }
    }
}

impl std::fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.database_type().fmt(f)
    }
}

/// Result of [`RelationalTool::execute`](crate::relational::RelationalTool::execute)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecuteOutcome {
    /// Rows returned by a `SELECT` statement
    Rows(Vec<Row>),
    /// Rows affected by any other statement
    Affected(u64),
}

impl ExecuteOutcome {
    /// Rows of a `SELECT`; empty for other statements
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Self::Rows(rows) => rows,
            Self::Affected(_) => Vec::new(),
        }
    }

    /// Affected-row count; number of returned rows for a `SELECT`
    pub fn rows_affected(&self) -> u64 {
        match self {
            Self::Rows(rows) => rows.len() as u64,
            Self::Affected(n) => *n,
        }
    }
}

/// Sort direction for document queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }
}

/// Options for document `find`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindOptions {
    /// Match filter (None = all documents)
    pub filter: Option<Row>,

    /// Field projection, e.g. `{"name": 1, "_id": 0}`
    pub projection: Option<Row>,

    /// Sort keys in priority order
    pub sort: Vec<(String, SortDirection)>,

    /// Maximum number of documents to return (None = unlimited)
    pub limit: Option<i64>,
}
