//! Namespaced settings lookup
//!
//! Settings live in flat environment variables grouped by a double-underscore
//! convention:
//!
//! ```text
//! DB__<NAME>__TYPE   sqlite | mssql | postgres | postgresql | mysql | mongo | mongodb
//! DB__<NAME>__URL    relational connection URL
//! DB__<NAME>__URI    MongoDB connection URI
//! DB__<NAME>__DB     MongoDB database name
//! ```
//!
//! Values are read on every call; nothing is cached.

use crate::error::{DbToolError, Result};
use std::collections::HashMap;
use std::str::FromStr;

/// Default namespace prefix
pub const DEFAULT_PREFIX: &str = "DB";

#[derive(Debug, Clone)]
enum Source {
    Process,
    Fixed(HashMap<String, String>),
}

/// Settings provider resolving `<PREFIX>__<NAME>__<KEY>` variables
#[derive(Debug, Clone)]
pub struct EnvSettings {
    prefix: String,
    source: Source,
}

impl Default for EnvSettings {
    fn default() -> Self {
        Self::from_env()
    }
}

impl EnvSettings {
    /// Read from the process environment with the `DB` prefix
    pub fn from_env() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            source: Source::Process,
        }
    }

    /// Read from a fixed set of variables instead of the process environment
    ///
    /// Keys are full variable names, e.g. `DB__PRIMARY__URL`.
    pub fn from_map<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            source: Source::Fixed(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Replace the namespace prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Compose the variable name for `name`/`key`
    ///
    /// # Examples
    /// ```
    /// # use envdb_tools::settings::EnvSettings;
    /// let settings = EnvSettings::from_env();
    /// assert_eq!(settings.env_key("primary", "url"), "DB__PRIMARY__URL");
    /// ```
    pub fn env_key(&self, name: &str, key: &str) -> String {
        format!(
            "{}__{}__{}",
            self.prefix,
            name.to_uppercase(),
            key.to_uppercase()
        )
    }

    fn lookup(&self, var: &str) -> Option<String> {
        match &self.source {
            Source::Process => std::env::var(var).ok(),
            Source::Fixed(vars) => vars.get(var).cloned(),
        }
    }

    /// Value for `name`/`key`, or `None` when unset or empty
    pub fn get(&self, name: &str, key: &str) -> Option<String> {
        self.lookup(&self.env_key(name, key))
            .filter(|v| !v.is_empty())
    }

    /// Value for `name`/`key`, or `default` when unset or empty
    pub fn get_or(&self, name: &str, key: &str, default: &str) -> String {
        self.get(name, key).unwrap_or_else(|| default.to_string())
    }

    /// Value for `name`/`key`; unset, empty or whitespace-only is an error
    /// naming the exact variable
    pub fn require(&self, name: &str, key: &str) -> Result<String> {
        match self.get(name, key) {
            Some(v) if !v.trim().is_empty() => Ok(v),
            Some(_) => {
                let var = self.env_key(name, key);
                log::warn!("{} is set but blank", var);
                Err(DbToolError::MissingSetting { key: var })
            }
            None => Err(DbToolError::MissingSetting {
                key: self.env_key(name, key),
            }),
        }
    }

    /// Optional typed value; present-but-unparsable is an error
    pub fn get_parsed<T>(&self, name: &str, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(name, key) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
                DbToolError::InvalidSetting {
                    key: self.env_key(name, key),
                    reason: e.to_string(),
                }
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn settings() -> EnvSettings {
        EnvSettings::from_map([
            ("DB__PRIMARY__TYPE", "sqlite"),
            ("DB__PRIMARY__URL", "sqlite:///test.db"),
            ("DB__PRIMARY__MAX_CONNECTIONS", "4"),
            ("DB__PRIMARY__MIN_CONNECTIONS", "many"),
            ("DB__BLANK__URL", "   "),
            ("DB__EMPTY__URL", ""),
            ("APP__PRIMARY__URL", "postgres://h/app"),
        ])
    }

    #[test]
    fn test_key_composition_uppercases() {
        let s = settings();
        assert_eq!(s.env_key("Primary", "Url"), "DB__PRIMARY__URL");
        assert_eq!(s.env_key("my_db", "uri"), "DB__MY_DB__URI");
    }

    #[test]
    fn test_get_and_default() {
        let s = settings();
        assert_eq!(s.get("primary", "type").as_deref(), Some("sqlite"));
        assert_eq!(s.get("primary", "uri"), None);
        assert_eq!(s.get("empty", "url"), None);
        assert_eq!(s.get_or("empty", "url", "fallback"), "fallback");
        assert_eq!(s.get_or("primary", "type", "fallback"), "sqlite");
    }

    #[test]
    fn test_require_present() {
        let s = settings();
        assert_eq!(s.require("primary", "url").ok().as_deref(), Some("sqlite:///test.db"));
    }

    #[test]
    fn test_require_names_missing_key() {
        let s = settings();
        for (name, key, var) in [
            ("cache", "type", "DB__CACHE__TYPE"),
            ("empty", "url", "DB__EMPTY__URL"),
            ("blank", "url", "DB__BLANK__URL"),
        ] {
            let err = s.require(name, key).err();
            assert!(
                matches!(&err, Some(DbToolError::MissingSetting { key }) if key == var),
                "unexpected result for {}: {:?}",
                var,
                err
            );
            if let Some(err) = err {
                assert!(err.to_string().contains(var));
                assert_eq!(err.kind(), ErrorKind::Configuration);
            }
        }
    }

    #[test]
    fn test_custom_prefix() {
        let s = settings().with_prefix("APP");
        assert_eq!(s.prefix(), "APP");
        assert_eq!(s.get("primary", "url").as_deref(), Some("postgres://h/app"));
        assert_eq!(s.get("primary", "type"), None);
    }

    #[test]
    fn test_get_parsed() {
        let s = settings();
        assert_eq!(s.get_parsed::<u32>("primary", "max_connections").ok(), Some(Some(4)));
        assert_eq!(s.get_parsed::<u32>("primary", "idle_timeout_secs").ok(), Some(None));
        let err = s.get_parsed::<u32>("primary", "min_connections").err();
        assert!(matches!(err, Some(DbToolError::InvalidSetting { .. })));
    }

    #[test]
    fn test_process_environment_source() {
        let s = EnvSettings::default();
        assert_eq!(s.prefix(), DEFAULT_PREFIX);
        assert_eq!(s.get("no_such_name_for_tests", "url"), None);
        assert!(s.require("no_such_name_for_tests", "url").is_err());
    }
}
