//! Exec command implementation
//!
//! Acquires the whole group, runs the child command, releases the group and
//! reports the child's exit status.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::process::Command;

use anyhow::{Context, Result};

use super::settings::LockSettings;

/// Exit code reported when the child was terminated by a signal.
const SIGNALLED_EXIT_CODE: i32 = 128;

/// Run the exec command
///
/// # Errors
///
/// Returns an error if:
/// - `command` is empty
/// - Any lock in the group cannot be acquired
/// - The command cannot be spawned
/// - The group cannot be released afterwards
pub fn run(settings: &LockSettings, command: &[String]) -> Result<i32> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("Command required after '--'"))?;

    let mut group = settings.group();
    group
        .acquire()
        .with_context(|| format!("Failed to acquire {} locks", settings.options))?;
    tracing::info!(files = group.len(), program = %program, "Holding locks");

    let status = Command::new(program).args(args).status();
    let released = group.release();

    let status = status.with_context(|| format!("Failed to run '{program}'"))?;
    released.context("Failed to release locks")?;

    Ok(status.code().unwrap_or(SIGNALLED_EXIT_CODE))
}
