//! # Lockset Core
//!
//! Advisory file locking for single files and ordered groups of files.
//!
//! This crate provides:
//! - Validated lock options (sharing mode + wait mode)
//! - [`SingleFileLock`]: one file, one OS advisory lock
//! - [`FileLockGroup`]: all-or-nothing acquisition with rollback
//! - An injectable [`LockLogger`] backed by `tracing` by default
//! - TOML + environment configuration via [`LockConfig`]
//!
//! ## Laws (Compiler Enforced)
//!
//! - No `unwrap()` - returns `Result` instead
//! - No `expect()` - returns `Result` instead
//! - No `panic!()` - returns `Result` instead
//! - No `unsafe` - safe Rust only
//!
//! ## Example
//!
//! ```no_run
//! use lockset_core::{FileLockGroup, LockOptions, SingleFileLock};
//!
//! let mut lock = SingleFileLock::new("/tmp/app.lock", LockOptions::exclusive_blocking());
//! lock.acquire()?;
//! // critical section
//! lock.release()?;
//!
//! let mut group = FileLockGroup::new(["/tmp/a.lock", "/tmp/b.lock"], LockOptions::default());
//! group.acquire()?.release()?;
//! # Ok::<(), lockset_core::LockError>(())
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod group;
pub mod logging;
pub mod options;
mod platform;
pub mod single;

pub use config::LockConfig;
pub use error::{IoErrorKind, LockError, LockErrorKind, LockFailure, Result};
pub use group::FileLockGroup;
pub use logging::{LockLogger, LogContext, NullLogger, TracingLogger};
pub use options::{LockOptions, SharingMode, WaitMode};
pub use single::SingleFileLock;
