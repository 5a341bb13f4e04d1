//! Resolve lock settings from config file, environment and flags.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ArgMatches;
use lockset_core::{FileLockGroup, LockConfig, LockOptions, SharingMode, WaitMode};

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockSettings {
    pub options: LockOptions,
    pub files: Vec<PathBuf>,
}

impl LockSettings {
    /// Layer config file, `LOCKSET_*` variables and command-line flags.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - An environment override holds an unknown value
    /// - No files are given on the command line or in the config
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let config = match matches.get_one::<PathBuf>("config") {
            Some(path) => LockConfig::load(path)?,
            None => {
                let cwd = std::env::current_dir().context("Failed to read working directory")?;
                LockConfig::discover(&cwd)?
            }
        };
        let config = config.apply_env_overrides()?;

        let flags = Flags {
            exclusive: matches.get_flag("exclusive"),
            shared: matches.get_flag("shared"),
            blocking: matches.get_flag("blocking"),
            non_blocking: matches.get_flag("non-blocking"),
        };
        let files: Vec<PathBuf> = matches
            .get_many::<PathBuf>("files")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();

        Self::resolve(config, flags, files)
    }

    fn resolve(config: LockConfig, flags: Flags, files: Vec<PathBuf>) -> Result<Self> {
        let mut options = config.options();
        if flags.exclusive {
            options = options.with_sharing(SharingMode::Exclusive);
        } else if flags.shared {
            options = options.with_sharing(SharingMode::Shared);
        }
        if flags.blocking {
            options = options.with_wait(WaitMode::Blocking);
        } else if flags.non_blocking {
            options = options.with_wait(WaitMode::NonBlocking);
        }

        let files = if files.is_empty() { config.files } else { files };
        if files.is_empty() {
            anyhow::bail!("No files to lock: pass FILE arguments or set `files` in lockset.toml");
        }

        Ok(Self { options, files })
    }

    pub fn group(&self) -> FileLockGroup {
        FileLockGroup::new(self.files.iter().cloned(), self.options)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Flags {
    exclusive: bool,
    shared: bool,
    blocking: bool,
    non_blocking: bool,
}
