//! Lock options: one sharing mode plus one wait mode.
//!
//! Options are a tagged pair rather than a raw bitmask, so an invalid
//! combination cannot be represented once a [`LockOptions`] value exists.
//! The bitmask surface (`SHARED=1`, `EXCLUSIVE=2`, `NON_BLOCKING=4`,
//! `BLOCKING=8`) is still accepted through [`LockOptions::from_bits`], which
//! rejects conflicting flags instead of correcting them.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{LockError, Result};

/// Whether other holders may share the lock.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum SharingMode {
    #[default]
    Shared,
    Exclusive,
}

/// Whether acquisition waits for a conflicting holder to go away.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum WaitMode {
    #[default]
    NonBlocking,
    Blocking,
}

/// Validated lock options.
///
/// Defaults to shared, non-blocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LockOptions {
    pub sharing: SharingMode,
    pub wait: WaitMode,
}

impl LockOptions {
    pub const SHARED: u8 = 1;
    pub const EXCLUSIVE: u8 = 2;
    pub const NON_BLOCKING: u8 = 4;
    pub const BLOCKING: u8 = 8;

    const KNOWN_BITS: u8 = Self::SHARED | Self::EXCLUSIVE | Self::NON_BLOCKING | Self::BLOCKING;

    #[must_use]
    pub const fn new(sharing: SharingMode, wait: WaitMode) -> Self {
        Self { sharing, wait }
    }

    #[must_use]
    pub const fn shared() -> Self {
        Self::new(SharingMode::Shared, WaitMode::NonBlocking)
    }

    #[must_use]
    pub const fn exclusive() -> Self {
        Self::new(SharingMode::Exclusive, WaitMode::NonBlocking)
    }

    #[must_use]
    pub const fn shared_blocking() -> Self {
        Self::new(SharingMode::Shared, WaitMode::Blocking)
    }

    #[must_use]
    pub const fn exclusive_blocking() -> Self {
        Self::new(SharingMode::Exclusive, WaitMode::Blocking)
    }

    /// Parse a flag bitmask.
    ///
    /// A dimension with no flag set falls back to its default (shared,
    /// non-blocking), so `0` yields the default options.
    ///
    /// # Errors
    ///
    /// - `InvalidOption` if both `SHARED` and `EXCLUSIVE` are set
    /// - `InvalidOption` if both `BLOCKING` and `NON_BLOCKING` are set
    /// - `InvalidOption` if any bit outside the four known flags is set
    pub fn from_bits(bits: u8) -> Result<Self> {
        let has = |flag: u8| bits & flag == flag;

        if has(Self::SHARED) && has(Self::EXCLUSIVE) {
            return Err(LockError::invalid_option(
                bits,
                "SHARED and EXCLUSIVE are mutually exclusive",
            ));
        }
        if has(Self::BLOCKING) && has(Self::NON_BLOCKING) {
            return Err(LockError::invalid_option(
                bits,
                "BLOCKING and NON_BLOCKING are mutually exclusive",
            ));
        }
        if bits & !Self::KNOWN_BITS != 0 {
            return Err(LockError::invalid_option(bits, "unknown option flags"));
        }

        let sharing = if has(Self::EXCLUSIVE) {
            SharingMode::Exclusive
        } else {
            SharingMode::Shared
        };
        let wait = if has(Self::BLOCKING) {
            WaitMode::Blocking
        } else {
            WaitMode::NonBlocking
        };

        Ok(Self::new(sharing, wait))
    }

    /// Render back to the flag bitmask. Always sets exactly one flag per dimension.
    #[must_use]
    pub const fn bits(self) -> u8 {
        let sharing = match self.sharing {
            SharingMode::Shared => Self::SHARED,
            SharingMode::Exclusive => Self::EXCLUSIVE,
        };
        let wait = match self.wait {
            WaitMode::NonBlocking => Self::NON_BLOCKING,
            WaitMode::Blocking => Self::BLOCKING,
        };
        sharing | wait
    }

    #[must_use]
    pub const fn with_sharing(mut self, sharing: SharingMode) -> Self {
        self.sharing = sharing;
        self
    }

    #[must_use]
    pub const fn with_wait(mut self, wait: WaitMode) -> Self {
        self.wait = wait;
        self
    }

    #[must_use]
    pub const fn is_shared(self) -> bool {
        matches!(self.sharing, SharingMode::Shared)
    }

    #[must_use]
    pub const fn is_exclusive(self) -> bool {
        matches!(self.sharing, SharingMode::Exclusive)
    }

    #[must_use]
    pub const fn is_blocking(self) -> bool {
        matches!(self.wait, WaitMode::Blocking)
    }

    #[must_use]
    pub const fn is_non_blocking(self) -> bool {
        matches!(self.wait, WaitMode::NonBlocking)
    }

    /// Human-readable description used in log events and error messages,
    /// e.g. `exclusive (blocking)`.
    #[must_use]
    pub fn description(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LockOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.sharing, self.wait)
    }
}

impl TryFrom<u8> for LockOptions {
    type Error = LockError;

    fn try_from(bits: u8) -> Result<Self> {
        Self::from_bits(bits)
    }
}
