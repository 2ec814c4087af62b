//! Connection tool lifecycle
//!
//! Every tool owns at most one driver handle. It is absent until `connect`
//! succeeds and is cleared again by `close`; a closed tool may reconnect.

use crate::document::MongoTool;
use crate::error::{DbToolError, Result};
use crate::relational::RelationalTool;
use crate::types::DatabaseType;
use async_trait::async_trait;

/// Open/close lifecycle shared by all connection tools
#[async_trait]
pub trait ConnectionTool: Send {
    /// Logical connection name the tool was created for
    fn name(&self) -> &str;

    /// Whether a driver handle is currently held
    fn is_connected(&self) -> bool;

    /// Establish the driver handle
    ///
    /// A no-op when already connected.
    async fn connect(&mut self) -> Result<()>;

    /// Release the driver handle; repeated calls are no-ops
    async fn close(&mut self);
}

/// Run `body` with `tool` connected, closing it on the way out
///
/// `connect` is called first; if it fails, `body` does not run and `close`
/// is not called. Otherwise `close` runs exactly once after `body` finishes,
/// and `body`'s result (success or error) is returned afterwards.
///
/// # Example
/// ```no_run
/// # use envdb_tools::{EnvSettings, DbToolError, create_tool, with_connection};
/// # async fn demo() -> Result<(), DbToolError> {
/// let mut tool = create_tool("primary", EnvSettings::from_env())?;
/// let rows = with_connection(&mut tool, async |db| {
///     db.relational()?.select("users", None).await
/// })
/// .await?;
/// # let _ = rows;
/// # Ok(())
/// # }
/// ```
pub async fn with_connection<T, F, R, E>(tool: &mut T, body: F) -> std::result::Result<R, E>
where
    T: ConnectionTool + ?Sized,
    F: AsyncFnOnce(&mut T) -> std::result::Result<R, E>,
    E: From<DbToolError>,
{
    tool.connect().await?;
    let outcome = body(&mut *tool).await;
    tool.close().await;
    outcome
}

/// A connection tool of any supported type
pub enum DbTool {
    /// SQLite, SQL Server, PostgreSQL or MySQL
    Relational(RelationalTool),
    /// MongoDB
    Document(MongoTool),
}

impl DbTool {
    pub fn database_type(&self) -> DatabaseType {
        match self {
            Self::Relational(tool) => tool.dialect().database_type(),
            Self::Document(_) => DatabaseType::MongoDb,
        }
    }

    /// The relational tool, or `InvalidArgument` for a document store
    pub fn relational(&self) -> Result<&RelationalTool> {
        match self {
            Self::Relational(tool) => Ok(tool),
            Self::Document(tool) => Err(DbToolError::InvalidArgument(format!(
                "'{}' is a MongoDB connection, not a relational one",
                tool.name()
            ))),
        }
    }

    /// The document tool, or `InvalidArgument` for a relational database
    pub fn document(&self) -> Result<&MongoTool> {
        match self {
            Self::Document(tool) => Ok(tool),
            Self::Relational(tool) => Err(DbToolError::InvalidArgument(format!(
                "'{}' is a {} connection, not a document store",
                tool.name(),
                tool.dialect()
            ))),
        }
    }

    /// Round-trip to the server to verify the connection is alive
    pub async fn ping(&self) -> Result<()> {
        match self {
            Self::Relational(tool) => tool.ping().await,
            Self::Document(tool) => tool.ping().await,
        }
    }
}

impl std::fmt::Debug for DbTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbTool")
            .field("name", &self.name())
            .field("type", &self.database_type())
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[async_trait]
impl ConnectionTool for DbTool {
    fn name(&self) -> &str {
        match self {
            Self::Relational(tool) => tool.name(),
            Self::Document(tool) => tool.name(),
        }
    }

    fn is_connected(&self) -> bool {
        match self {
            Self::Relational(tool) => tool.is_connected(),
            Self::Document(tool) => tool.is_connected(),
        }
    }

    async fn connect(&mut self) -> Result<()> {
        match self {
            Self::Relational(tool) => tool.connect().await,
            Self::Document(tool) => tool.connect().await,
        }
    }

    async fn close(&mut self) {
        match self {
            Self::Relational(tool) => tool.close().await,
            Self::Document(tool) => tool.close().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingTool {
        fail_connect: bool,
        connected: bool,
        connects: usize,
        closes: usize,
    }

    #[async_trait]
    impl ConnectionTool for CountingTool {
        fn name(&self) -> &str {
            "counting"
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        async fn connect(&mut self) -> Result<()> {
            self.connects += 1;
            if self.fail_connect {
                return Err(DbToolError::MissingSetting {
                    key: "DB__COUNTING__URL".to_string(),
                });
            }
            self.connected = true;
            Ok(())
        }

        async fn close(&mut self) {
            self.closes += 1;
            self.connected = false;
        }
    }

    #[tokio::test]
    async fn test_closes_after_success() {
        let mut tool = CountingTool::default();
        let result = with_connection(&mut tool, async |t: &mut CountingTool| {
            assert!(t.is_connected());
            Ok::<_, DbToolError>(42)
        })
        .await;

        assert_eq!(result.ok(), Some(42));
        assert_eq!(tool.connects, 1);
        assert_eq!(tool.closes, 1);
        assert!(!tool.is_connected());
    }

    #[tokio::test]
    async fn test_closes_after_body_error() {
        let mut tool = CountingTool::default();
        let result = with_connection(&mut tool, async |_t: &mut CountingTool| {
            Err::<(), _>(DbToolError::InvalidArgument("boom".to_string()))
        })
        .await;

        assert!(matches!(result, Err(DbToolError::InvalidArgument(msg)) if msg == "boom"));
        assert_eq!(tool.closes, 1);
        assert!(!tool.is_connected());
    }

    #[tokio::test]
    async fn test_connect_failure_skips_body_and_close() {
        let mut tool = CountingTool {
            fail_connect: true,
            ..Default::default()
        };
        let mut ran = false;
        let result = with_connection(&mut tool, async |_t: &mut CountingTool| {
            ran = true;
            Ok::<_, DbToolError>(())
        })
        .await;

        assert!(matches!(result, Err(DbToolError::MissingSetting { .. })));
        assert!(!ran);
        assert_eq!(tool.connects, 1);
        assert_eq!(tool.closes, 0);
    }

    #[tokio::test]
    async fn test_anyhow_bodies_supported() {
        let mut tool = CountingTool::default();
        let result: anyhow::Result<&str> =
            with_connection(&mut tool, async |_t: &mut CountingTool| Ok("done")).await;
        assert_eq!(result.ok(), Some("done"));
        assert_eq!(tool.closes, 1);
    }

    #[tokio::test]
    async fn test_reentry_after_close() {
        let mut tool = CountingTool::default();
        for _ in 0..2 {
            let result =
                with_connection(&mut tool, async |_t: &mut CountingTool| Ok::<_, DbToolError>(()))
                    .await;
            assert!(result.is_ok());
        }
        assert_eq!(tool.connects, 2);
        assert_eq!(tool.closes, 2);
    }
}
