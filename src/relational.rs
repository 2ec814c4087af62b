//! Relational connection tool
//!
//! One tool type serves every SQL dialect; the dialect only decides how the
//! connection URL is checked and how `:name` parameters are rewritten. The
//! pool is built with sqlx's `Any` driver and health-checks connections
//! before handing them out.

use crate::dsn::{is_sqlite_memory, normalize_url, redact};
use crate::error::{DbToolError, Result};
use crate::params::{build_query, compile};
use crate::row_converter::row_to_map;
use crate::settings::EnvSettings;
use crate::tool::ConnectionTool;
use crate::types::{ExecuteOutcome, Params, Row, SqlDialect};
use crate::validate::{validate_column, validate_identifier};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::pool::PoolOptions;
use sqlx::{Any, AnyPool};
use std::time::Duration;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 0;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;
const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800;

/// Whether `sql` is a `SELECT` (case-insensitive, leading whitespace ignored)
///
/// # Examples
/// ```
/// # use envdb_tools::relational::is_select_statement;
/// assert!(is_select_statement("  select * from t"));
/// assert!(!is_select_statement("INSERT INTO t VALUES (1)"));
/// ```
pub fn is_select_statement(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("select"))
}

fn preview(sql: &str) -> String {
    sql.chars().take(80).collect()
}

/// Connection tool for SQLite, SQL Server, PostgreSQL and MySQL
///
/// Reads `DB__<NAME>__URL` on connect. Optional pool tuning:
/// `MAX_CONNECTIONS`, `MIN_CONNECTIONS`, `ACQUIRE_TIMEOUT_SECS`,
/// `IDLE_TIMEOUT_SECS`, `MAX_LIFETIME_SECS`.
pub struct RelationalTool {
    name: String,
    dialect: SqlDialect,
    settings: EnvSettings,
    pool: Option<AnyPool>,
}

impl RelationalTool {
    pub fn new(name: impl Into<String>, dialect: SqlDialect, settings: EnvSettings) -> Self {
        Self {
            name: name.into(),
            dialect,
            settings,
            pool: None,
        }
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    /// The underlying pool, for queries the helpers below do not cover
    pub fn pool(&self) -> Result<&AnyPool> {
        self.pool
            .as_ref()
            .ok_or_else(|| DbToolError::NotConnected(self.name.clone()))
    }

    fn connection_url(&self) -> Result<SecretString> {
        let raw = self.settings.require(&self.name, "URL")?;

        match SqlDialect::from_url(&raw) {
            Some(found) if found != self.dialect => log::warn!(
                "{} is configured as {} but its URL looks like {}",
                self.name,
                self.dialect,
                found
            ),
            None => log::warn!(
                "{}: unrecognized URL scheme in {}",
                self.name,
                redact(&raw)
            ),
            _ => {}
        }

        normalize_url(&raw)
    }

    fn pool_options(&self, in_memory: bool) -> Result<PoolOptions<Any>> {
        // Each connection to an in-memory SQLite database sees its own empty
        // database, so the pool is pinned to one connection that never expires
        if in_memory {
            return Ok(PoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .test_before_acquire(true));
        }

        let s = &self.settings;
        let name = &self.name;

        let max_connections = s
            .get_parsed::<u32>(name, "MAX_CONNECTIONS")?
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);
        let min_connections = s
            .get_parsed::<u32>(name, "MIN_CONNECTIONS")?
            .unwrap_or(DEFAULT_MIN_CONNECTIONS);
        let acquire_timeout = s
            .get_parsed::<u64>(name, "ACQUIRE_TIMEOUT_SECS")?
            .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_SECS);
        let idle_timeout = s
            .get_parsed::<u64>(name, "IDLE_TIMEOUT_SECS")?
            .unwrap_or(DEFAULT_IDLE_TIMEOUT_SECS);
        let max_lifetime = s
            .get_parsed::<u64>(name, "MAX_LIFETIME_SECS")?
            .unwrap_or(DEFAULT_MAX_LIFETIME_SECS);

        Ok(PoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections.min(max_connections))
            .acquire_timeout(Duration::from_secs(acquire_timeout))
            .idle_timeout(Some(Duration::from_secs(idle_timeout)))
            .max_lifetime(Some(Duration::from_secs(max_lifetime)))
            .test_before_acquire(true))
    }

    /// Run one statement inside its own transaction
    ///
    /// `:name` placeholders are bound from `params`. A `SELECT` returns its
    /// rows; any other statement returns the affected-row count. The
    /// transaction commits on success and rolls back on any error.
    pub async fn execute(&self, sql: &str, params: Option<&Params>) -> Result<ExecuteOutcome> {
        let pool = self.pool()?;

        let empty = Params::new();
        let stmt = compile(sql, params.unwrap_or(&empty), self.dialect)?;
        log::debug!("[{}] {}", self.name, preview(&stmt.sql));

        let mut tx = pool.begin().await?;

        let outcome = if is_select_statement(sql) {
            let rows = build_query(&stmt)?.fetch_all(&mut *tx).await?;
            let rows = rows.iter().map(row_to_map).collect::<Result<Vec<Row>>>()?;
            ExecuteOutcome::Rows(rows)
        } else {
            let result = build_query(&stmt)?.execute(&mut *tx).await?;
            ExecuteOutcome::Affected(result.rows_affected())
        };

        tx.commit().await?;

        Ok(outcome)
    }

    /// `INSERT INTO table (cols) VALUES (...)`; returns rows inserted
    pub async fn insert(&self, table: &str, data: &Params) -> Result<u64> {
        self.pool()?;
        validate_identifier(table)?;
        if data.is_empty() {
            return Err(DbToolError::InvalidArgument(format!(
                "insert into {} needs at least one column",
                table
            )));
        }

        let mut cols = Vec::with_capacity(data.len());
        let mut vals = Vec::with_capacity(data.len());
        for key in data.keys() {
            validate_column(key)?;
            cols.push(key.as_str());
            vals.push(format!(":{}", key));
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            cols.join(", "),
            vals.join(", ")
        );
        Ok(self.execute(&sql, Some(data)).await?.rows_affected())
    }

    /// `UPDATE table SET ... WHERE ...` with equality matches; returns rows updated
    ///
    /// An empty `where_` is rejected rather than updating every row.
    pub async fn update(&self, table: &str, data: &Params, where_: &Params) -> Result<u64> {
        self.pool()?;
        validate_identifier(table)?;
        if data.is_empty() {
            return Err(DbToolError::InvalidArgument(format!(
                "update of {} needs at least one column to set",
                table
            )));
        }
        if where_.is_empty() {
            return Err(DbToolError::InvalidArgument(format!(
                "update of {} needs a where condition",
                table
            )));
        }

        let mut params = Params::new();
        let mut set_clause = Vec::with_capacity(data.len());
        for (key, value) in data {
            validate_column(key)?;
            set_clause.push(format!("{} = :u_{}", key, key));
            params.insert(format!("u_{}", key), value.clone());
        }

        let mut where_clause = Vec::with_capacity(where_.len());
        for (key, value) in where_ {
            validate_column(key)?;
            where_clause.push(format!("{} = :w_{}", key, key));
            params.insert(format!("w_{}", key), value.clone());
        }

        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            table,
            set_clause.join(", "),
            where_clause.join(" AND ")
        );
        Ok(self.execute(&sql, Some(&params)).await?.rows_affected())
    }

    /// `DELETE FROM table WHERE ...` with equality matches; returns rows deleted
    ///
    /// An empty `where_` is rejected rather than deleting every row.
    pub async fn delete(&self, table: &str, where_: &Params) -> Result<u64> {
        self.pool()?;
        validate_identifier(table)?;
        if where_.is_empty() {
            return Err(DbToolError::InvalidArgument(format!(
                "delete from {} needs a where condition",
                table
            )));
        }

        let sql = format!("DELETE FROM {} WHERE {}", table, equality_clause(where_)?);
        Ok(self.execute(&sql, Some(where_)).await?.rows_affected())
    }

    /// `SELECT * FROM table [WHERE ...]` with equality matches
    pub async fn select(&self, table: &str, where_: Option<&Params>) -> Result<Vec<Row>> {
        self.pool()?;
        validate_identifier(table)?;

        let (sql, params) = match where_ {
            Some(w) if !w.is_empty() => (
                format!("SELECT * FROM {} WHERE {}", table, equality_clause(w)?),
                Some(w),
            ),
            _ => (format!("SELECT * FROM {}", table), None),
        };

        Ok(self.execute(&sql, params).await?.into_rows())
    }

    /// Round-trip `SELECT 1` through the pool
    pub async fn ping(&self) -> Result<()> {
        let pool = self.pool()?;
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}

fn equality_clause(where_: &Params) -> Result<String> {
    let mut parts = Vec::with_capacity(where_.len());
    for key in where_.keys() {
        validate_column(key)?;
        parts.push(format!("{} = :{}", key, key));
    }
    Ok(parts.join(" AND "))
}

#[async_trait]
impl ConnectionTool for RelationalTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_connected(&self) -> bool {
        self.pool.is_some()
    }

    async fn connect(&mut self) -> Result<()> {
        if self.pool.is_some() {
            log::debug!("{} already connected", self.name);
            return Ok(());
        }

        let url = self.connection_url()?;

        if self.dialect == SqlDialect::MsSql {
            return Err(DbToolError::UnsupportedDatabase(format!(
                "{} ({}): SQL Server driver not available in this build",
                self.name,
                redact(url.expose_secret())
            )));
        }

        // Registers the compiled-in drivers; safe to call repeatedly
        sqlx::any::install_default_drivers();

        let options = self.pool_options(is_sqlite_memory(url.expose_secret()))?;
        let pool = options.connect(url.expose_secret()).await?;

        log::info!(
            "✓ {} connected ({}: {})",
            self.name,
            self.dialect,
            redact(url.expose_secret())
        );

        self.pool = Some(pool);
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
            log::info!("{} closed", self.name);
        }
    }
}
