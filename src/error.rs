//! Error types for connection tool operations

use thiserror::Error;

/// Connection tool errors
#[derive(Error, Debug)]
pub enum DbToolError {
    /// Required setting is absent or blank
    #[error("Missing env var: {key}")]
    MissingSetting { key: String },

    /// No type discriminator configured for a connection name
    #[error("Missing {key}")]
    MissingType { key: String },

    /// Type discriminator outside the supported set
    #[error("Unknown DB type for {name}: {kind}")]
    UnknownType { name: String, kind: String },

    /// Optional setting present but not parsable
    #[error("Invalid value for {key}: {reason}")]
    InvalidSetting { key: String, reason: String },

    /// Connection URL cannot be used by any compiled driver
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Operation attempted before connect or after close
    #[error("Not connected: {0}. Call connect() or use with_connection()")]
    NotConnected(String),

    /// Caller-supplied arguments rejected before reaching the driver
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Database type recognized but no driver compiled in
    #[error("Unsupported database: {0}")]
    UnsupportedDatabase(String),

    /// sqlx database error
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// MongoDB driver error
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// Document could not be converted to or from BSON
    #[error("BSON conversion error: {0}")]
    Bson(String),
}

/// Coarse classification of [`DbToolError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    NotConnected,
    InvalidArgument,
    Driver,
}

impl DbToolError {
    /// Classify the error into configuration, lifecycle, argument or driver failures
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingSetting { .. }
            | Self::MissingType { .. }
            | Self::UnknownType { .. }
            | Self::InvalidSetting { .. }
            | Self::InvalidUrl(_) => ErrorKind::Configuration,
            Self::NotConnected(_) => ErrorKind::NotConnected,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::UnsupportedDatabase(_) | Self::Sqlx(_) | Self::Mongo(_) | Self::Bson(_) => {
                ErrorKind::Driver
            }
        }
    }
}

impl From<mongodb::bson::ser::Error> for DbToolError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        Self::Bson(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DbToolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_setting_names_key() {
        let err = DbToolError::MissingSetting {
            key: "DB__CACHE__URL".to_string(),
        };
        assert_eq!(err.to_string(), "Missing env var: DB__CACHE__URL");
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_unknown_type_message() {
        let err = DbToolError::UnknownType {
            name: "primary".to_string(),
            kind: "oracle".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown DB type for primary: oracle");
    }

    #[test]
    fn test_driver_errors_classified() {
        let err = DbToolError::from(sqlx::Error::PoolClosed);
        assert_eq!(err.kind(), ErrorKind::Driver);
        assert_eq!(
            DbToolError::NotConnected("x".into()).kind(),
            ErrorKind::NotConnected
        );
    }

    #[test]
    fn test_bson_serialization_error_is_driver_kind() {
        let err = mongodb::bson::to_document(&5_i32).err().map(DbToolError::from);
        assert!(matches!(&err, Some(DbToolError::Bson(_))), "{:?}", err);
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::Driver));
    }
}
