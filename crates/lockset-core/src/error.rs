//! Error types for lockset-core
//!
//! Every failure mode is a distinct variant carrying structured fields
//! (description, path, member count, rollback count, cause). The
//! human-readable message is only rendered through `Display`.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Core error type for lock operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LockError {
    /// Options combine mutually exclusive flags
    #[error("invalid lock options {bits:#06b}: {reason}")]
    InvalidOption { bits: u8, reason: String },

    /// A single file could not be opened or locked
    #[error("unable to acquire {description} lock on {}: {source}", .path.display())]
    Acquire {
        description: String,
        path: PathBuf,
        #[source]
        source: LockFailure,
    },

    /// A single file lock could not be released
    #[error("unable to release {description} lock on {}: {source}", .path.display())]
    Release {
        description: String,
        path: PathBuf,
        #[source]
        source: LockFailure,
    },

    /// A group member failed to acquire; earlier members were rolled back
    #[error(
        "unable to acquire {description} lock on group of {member_count} files \
         ({rolled_back} rolled back): {source}"
    )]
    GroupAcquire {
        description: String,
        member_count: usize,
        rolled_back: usize,
        #[source]
        source: Box<LockError>,
    },

    /// A group member failed to release; later members were not attempted
    #[error("unable to release {description} lock on group of {member_count} files: {source}")]
    GroupRelease {
        description: String,
        member_count: usize,
        #[source]
        source: Box<LockError>,
    },

    /// Best-effort group release finished with one or more member failures
    #[error(
        "unable to release {} of {member_count} locks in group",
        .failures.len()
    )]
    GroupReleaseAll {
        member_count: usize,
        failures: Vec<LockError>,
    },

    /// Configuration could not be read or parsed
    #[error("invalid lock configuration ({origin}): {reason}")]
    Config { origin: String, reason: String },
}

/// Coarse classification for callers that branch on the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockErrorKind {
    InvalidOption,
    Acquire,
    Release,
    Config,
}

impl LockError {
    pub(crate) fn invalid_option(bits: u8, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            bits,
            reason: reason.into(),
        }
    }

    pub(crate) fn config(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            origin: origin.into(),
            reason: reason.into(),
        }
    }

    /// Category of this error; group errors report the category of the operation.
    #[must_use]
    pub const fn kind(&self) -> LockErrorKind {
        match self {
            Self::InvalidOption { .. } => LockErrorKind::InvalidOption,
            Self::Acquire { .. } | Self::GroupAcquire { .. } => LockErrorKind::Acquire,
            Self::Release { .. } | Self::GroupRelease { .. } | Self::GroupReleaseAll { .. } => {
                LockErrorKind::Release
            }
            Self::Config { .. } => LockErrorKind::Config,
        }
    }

    /// Path of the file involved, for per-file errors.
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Acquire { path, .. } | Self::Release { path, .. } => Some(path),
            _ => None,
        }
    }

    /// The per-file error wrapped by a group error.
    #[must_use]
    pub fn member_error(&self) -> Option<&Self> {
        match self {
            Self::GroupAcquire { source, .. } | Self::GroupRelease { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// The step of an acquire or release that failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LockFailure {
    /// Release was requested but no file handle is held
    #[error("no file handle is held")]
    MissingHandle,

    /// The lock file could not be opened or created
    #[error("failed to open file: {0}")]
    Open(#[source] IoErrorKind),

    /// The OS refused or could not grant the lock
    #[error("lock request denied: {0}")]
    Lock(#[source] IoErrorKind),

    /// The OS unlock call failed
    #[error("unlock failed: {0}")]
    Unlock(#[source] IoErrorKind),
}

impl LockFailure {
    /// True when a non-blocking request found the lock held elsewhere.
    #[must_use]
    pub const fn is_contended(&self) -> bool {
        matches!(self, Self::Lock(IoErrorKind::WouldBlock))
    }
}

/// IO error kinds (cloneable, no source chain issues)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoErrorKind {
    NotFound,
    PermissionDenied,
    WouldBlock,
    Interrupted,
    Unsupported,
    Other(String),
}

impl std::fmt::Display for IoErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::WouldBlock => write!(f, "lock is held elsewhere"),
            Self::Interrupted => write!(f, "interrupted"),
            Self::Unsupported => write!(f, "locking unsupported on this platform"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for IoErrorKind {}

impl From<io::Error> for IoErrorKind {
    fn from(err: io::Error) -> Self {
        // fs2 reports contention as its own lock_contended_error, which on
        // Windows is a raw OS error rather than WouldBlock.
        if err.raw_os_error() == fs2::lock_contended_error().raw_os_error() {
            return Self::WouldBlock;
        }
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            io::ErrorKind::WouldBlock => Self::WouldBlock,
            io::ErrorKind::Interrupted => Self::Interrupted,
            io::ErrorKind::Unsupported => Self::Unsupported,
            _ => Self::Other(err.to_string()),
        }
    }
}

/// Result type alias for lockset-core operations
pub type Result<T> = std::result::Result<T, LockError>;
