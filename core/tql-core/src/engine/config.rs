//! Database configuration.
//!
//! Defaults applied by the query facade when the caller does not pass a lock
//! or a limit. Loadable from JSON; `TQL_DEFAULT_LIMIT` overrides the limit.

use crate::error::{TqlError, TqlResult};
use crate::storage::LockKind;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Environment variable overriding [`DatabaseConfig::default_limit`].
pub const DEFAULT_LIMIT_ENV: &str = "TQL_DEFAULT_LIMIT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Lock for read, first, all, match and select
    pub default_read_lock: LockKind,
    /// Lock for write and delete; must be exclusive
    pub default_write_lock: LockKind,
    /// Row cap for all, match and select; `None` is unbounded
    pub default_limit: Option<usize>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            default_read_lock: LockKind::Read,
            default_write_lock: LockKind::Write,
            default_limit: None,
        }
    }
}

impl DatabaseConfig {
    pub fn from_json_str(json: &str) -> TqlResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> TqlResult<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Defaults, or the JSON file at `path`, then environment overrides.
    pub fn load(path: Option<&Path>) -> TqlResult<Self> {
        let config = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        config.with_env_overrides()
    }

    /// Apply environment overrides and re-validate.
    pub fn with_env_overrides(self) -> TqlResult<Self> {
        let raw = env::var(DEFAULT_LIMIT_ENV).ok();
        self.with_limit_override(raw.as_deref())
    }

    fn with_limit_override(mut self, raw: Option<&str>) -> TqlResult<Self> {
        if let Some(raw) = raw {
            let limit = raw.trim().parse::<usize>().map_err(|e| {
                TqlError::Config(format!("{DEFAULT_LIMIT_ENV}='{raw}': {e}"))
            })?;
            self.default_limit = Some(limit);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> TqlResult<()> {
        if !self.default_write_lock.is_exclusive() {
            return Err(TqlError::Config(format!(
                "default_write_lock must be exclusive, got '{}'",
                self.default_write_lock
            )));
        }
        if self.default_limit == Some(0) {
            return Err(TqlError::Config("default_limit must be positive".to_string()));
        }
        Ok(())
    }
}
