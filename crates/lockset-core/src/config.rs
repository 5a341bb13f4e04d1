//! Configuration loading for lock groups
//!
//! # Hierarchy
//!
//! Configuration is loaded in this order (later overrides earlier):
//! 1. Built-in defaults (shared, non-blocking, no files)
//! 2. Config file: `--config <path>` or `lockset.toml` in the working directory
//! 3. Environment variables: `LOCKSET_MODE`, `LOCKSET_WAIT`
//! 4. CLI flags (applied by the binary)
//!
//! # Example Config
//!
//! ```toml
//! mode = "exclusive"
//! wait = "blocking"
//! files = ["/var/lock/app.lock", "/var/lock/db.lock"]
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{LockError, Result},
    group::FileLockGroup,
    options::{LockOptions, SharingMode, WaitMode},
};

/// File name looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "lockset.toml";

/// Environment variable overriding the sharing mode.
pub const ENV_MODE: &str = "LOCKSET_MODE";

/// Environment variable overriding the wait mode.
pub const ENV_WAIT: &str = "LOCKSET_WAIT";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LockConfig {
    pub mode: SharingMode,
    pub wait: WaitMode,
    pub files: Vec<PathBuf>,
}

impl LockConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| LockError::config("inline", e.message()))
    }

    /// Load a TOML config file.
    ///
    /// # Errors
    ///
    /// `Config` if the file cannot be read or does not parse.
    pub fn load(path: &Path) -> Result<Self> {
        let origin = path.display().to_string();
        let content =
            fs::read_to_string(path).map_err(|e| LockError::config(&origin, e.to_string()))?;
        toml::from_str(&content).map_err(|e| LockError::config(origin, e.message()))
    }

    /// Load `lockset.toml` from `dir` if it exists, otherwise the defaults.
    pub fn discover(dir: &Path) -> Result<Self> {
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `LOCKSET_MODE` / `LOCKSET_WAIT` from the process environment.
    pub fn apply_env_overrides(self) -> Result<Self> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Empty values are ignored.
    ///
    /// # Errors
    ///
    /// `Config` if a variable holds an unknown mode.
    pub fn apply_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = non_empty(lookup(ENV_MODE)) {
            self.mode = parse_env(ENV_MODE, &mode, "shared, exclusive")?;
        }
        if let Some(wait) = non_empty(lookup(ENV_WAIT)) {
            self.wait = parse_env(ENV_WAIT, &wait, "blocking, non-blocking")?;
        }
        Ok(self)
    }

    #[must_use]
    pub const fn options(&self) -> LockOptions {
        LockOptions::new(self.mode, self.wait)
    }

    /// Build a lock group over the configured files.
    #[must_use]
    pub fn into_group(self) -> FileLockGroup {
        let options = self.options();
        FileLockGroup::new(self.files, options)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_env<T: FromStr>(key: &str, value: &str, expected: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        LockError::config(
            format!("env {key}"),
            format!("invalid value '{value}'. Must be one of: {expected}"),
        )
    })
}
