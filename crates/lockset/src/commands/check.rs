//! Check command implementation
//!
//! Tries to take the whole group and gives it straight back.

use anyhow::{Context, Result};
use lockset_core::{LockError, LockErrorKind};

use super::settings::LockSettings;

/// Exit code when any file in the group could not be opened or locked.
pub const UNAVAILABLE_EXIT_CODE: i32 = 1;

/// Run the check command
///
/// # Errors
///
/// Returns an error for failures other than acquiring the group, e.g. when
/// a group that was acquired cannot be released.
pub fn run(settings: &LockSettings) -> Result<i32> {
    let mut group = settings.group();

    match group.acquire() {
        Ok(group) => {
            group.release().context("Failed to release locks after check")?;
            println!(
                "✓ {} files can be locked ({})",
                settings.files.len(),
                settings.options
            );
            Ok(0)
        }
        Err(err) if err.kind() == LockErrorKind::Acquire => {
            println!("✗ {}", describe(&err));
            Ok(UNAVAILABLE_EXIT_CODE)
        }
        Err(err) => Err(err.into()),
    }
}

fn describe(err: &LockError) -> String {
    err.member_error()
        .and_then(LockError::path)
        .map_or_else(
            || err.to_string(),
            |path| format!("{} (first blocked: {})", err, path.display()),
        )
}
