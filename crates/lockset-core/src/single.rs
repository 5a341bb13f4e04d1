//! Advisory lock on a single file.
//!
//! # State machine
//!
//! ```text
//! UNACQUIRED --acquire ok--> ACQUIRED --release ok--> UNACQUIRED
//! ```
//!
//! Failed attempts leave the state unchanged. The file handle is opened on
//! the first acquire attempt and kept until a successful release closes it,
//! so a failed non-blocking attempt can be retried on the same handle.

use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    error::{LockError, LockFailure, Result},
    logging::{default_logger, LockLogger, LogContext, SharedLogger},
    options::LockOptions,
    platform,
};

const ACQUIRED: &str = "Acquired {desc} lock on {file}";
const ACQUIRE_FAILED: &str = "Unable to acquire {desc} lock on {file}";
const RELEASED: &str = "Released {desc} lock on {file}";
const RELEASE_FAILED: &str = "Unable to release {desc} lock on {file}";

/// One file, one advisory lock.
///
/// The instance exclusively owns its handle. Dropping it closes the handle,
/// which also drops any OS lock still held.
#[derive(Debug)]
pub struct SingleFileLock {
    path: PathBuf,
    options: LockOptions,
    handle: Option<File>,
    acquired: bool,
    logger: SharedLogger,
}

impl SingleFileLock {
    /// Create a lock for `path`. Does not touch the filesystem.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, options: LockOptions) -> Self {
        Self {
            path: path.into(),
            options,
            handle: None,
            acquired: false,
            logger: default_logger(),
        }
    }

    /// Create a lock from a raw option bitmask.
    ///
    /// # Errors
    ///
    /// `InvalidOption` if the bitmask combines mutually exclusive flags.
    pub fn with_bits(path: impl Into<PathBuf>, bits: u8) -> Result<Self> {
        LockOptions::from_bits(bits).map(|options| Self::new(path, options))
    }

    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn LockLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn set_logger(&mut self, logger: Arc<dyn LockLogger>) -> &mut Self {
        self.logger = logger;
        self
    }

    /// Change the options used by the next acquire.
    pub fn set_options(&mut self, options: LockOptions) -> &mut Self {
        self.options = options;
        self
    }

    /// Open the file if needed and request the OS lock.
    ///
    /// An already-acquired lock is not short-circuited: the OS request is
    /// repeated, which is a no-op for an advisory lock this handle holds.
    ///
    /// # Errors
    ///
    /// `Acquire` if the file cannot be opened or the lock is denied. An
    /// opened handle is kept for a later retry.
    pub fn acquire(&mut self) -> Result<&mut Self> {
        let file = match self.handle.take() {
            Some(file) => file,
            None => platform::open_lock_file(&self.path)
                .map_err(|e| self.acquire_failed(LockFailure::Open(e.into())))?,
        };

        let outcome = platform::request_lock(&file, self.is_exclusive(), self.is_blocking());
        self.handle = Some(file);

        match outcome {
            Ok(()) => {
                self.acquired = true;
                self.logger.debug(ACQUIRED, &self.context());
                Ok(self)
            }
            Err(e) => Err(self.acquire_failed(LockFailure::Lock(e.into()))),
        }
    }

    /// Unlock and close the handle.
    ///
    /// # Errors
    ///
    /// `Release` if no handle is held or the OS unlock fails. Both cases
    /// leave the lock state untouched.
    pub fn release(&mut self) -> Result<&mut Self> {
        let Some(file) = self.handle.as_ref() else {
            return Err(self.release_failed(LockFailure::MissingHandle));
        };

        platform::release_lock(file)
            .map_err(|e| self.release_failed(LockFailure::Unlock(e.into())))?;

        self.handle = None;
        self.acquired = false;
        self.logger.debug(RELEASED, &self.context());
        Ok(self)
    }

    #[must_use]
    pub const fn is_acquired(&self) -> bool {
        self.acquired
    }

    #[must_use]
    pub const fn is_shared(&self) -> bool {
        self.options.is_shared()
    }

    #[must_use]
    pub const fn is_exclusive(&self) -> bool {
        self.options.is_exclusive()
    }

    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        self.options.is_blocking()
    }

    #[must_use]
    pub const fn is_non_blocking(&self) -> bool {
        self.options.is_non_blocking()
    }

    /// True while an open file handle is held.
    #[must_use]
    pub const fn has_resource(&self) -> bool {
        self.handle.is_some()
    }

    /// The raw file handle, if one is open.
    #[must_use]
    pub const fn resource(&self) -> Option<&File> {
        self.handle.as_ref()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn options(&self) -> LockOptions {
        self.options
    }

    #[must_use]
    pub fn description(&self) -> String {
        self.options.description()
    }

    fn context(&self) -> LogContext {
        LogContext::from([
            ("desc", self.description()),
            ("file", self.path.display().to_string()),
        ])
    }

    fn acquire_failed(&self, source: LockFailure) -> LockError {
        self.logger.debug(ACQUIRE_FAILED, &self.context());
        LockError::Acquire {
            description: self.description(),
            path: self.path.clone(),
            source,
        }
    }

    fn release_failed(&self, source: LockFailure) -> LockError {
        self.logger.debug(RELEASE_FAILED, &self.context());
        LockError::Release {
            description: self.description(),
            path: self.path.clone(),
            source,
        }
    }
}

impl Drop for SingleFileLock {
    fn drop(&mut self) {
        if self.acquired {
            tracing::trace!(
                file = %self.path.display(),
                "Closing handle of a lock that was never released"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicBool, Ordering},
            Mutex,
        },
        thread,
        time::{Duration, Instant},
    };

    use tempfile::TempDir;

    use super::*;
    use crate::error::{IoErrorKind, LockErrorKind};

    #[derive(Debug, Default)]
    struct RecordingLogger {
        events: Mutex<Vec<(String, LogContext)>>,
    }

    impl RecordingLogger {
        fn messages(&self) -> Vec<String> {
            self.events
                .lock()
                .map(|events| events.iter().map(|(m, _)| m.clone()).collect())
                .unwrap_or_default()
        }

        fn contexts(&self) -> Vec<LogContext> {
            self.events
                .lock()
                .map(|events| events.iter().map(|(_, c)| c.clone()).collect())
                .unwrap_or_default()
        }
    }

    impl LockLogger for RecordingLogger {
        fn debug(&self, message: &str, context: &LogContext) {
            if let Ok(mut events) = self.events.lock() {
                events.push((message.to_string(), context.clone()));
            }
        }
    }

    #[test]
    fn test_new_does_not_touch_filesystem() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("untouched.lock");

        let lock = SingleFileLock::new(&path, LockOptions::default());

        assert!(!path.exists());
        assert!(!lock.is_acquired());
        assert!(!lock.has_resource());
        assert!(lock.resource().is_none());
    }

    #[test]
    fn test_with_bits_rejects_conflicting_flags() {
        let result = SingleFileLock::with_bits(
            "a.lock",
            LockOptions::SHARED | LockOptions::EXCLUSIVE | LockOptions::BLOCKING,
        );
        assert!(matches!(result, Err(LockError::InvalidOption { .. })));
    }

    #[test]
    fn test_acquire_release_cycle() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cycle.lock");
        let mut lock = SingleFileLock::new(&path, LockOptions::exclusive());

        lock.acquire().unwrap();
        assert!(lock.is_acquired());
        assert!(lock.has_resource());
        assert!(path.exists());

        lock.release().unwrap();
        assert!(!lock.is_acquired());
        assert!(!lock.has_resource());
    }

    #[test]
    fn test_acquire_is_chainable() {
        let dir = TempDir::new().unwrap();
        let mut lock = SingleFileLock::new(dir.path().join("c.lock"), LockOptions::shared());

        let acquired = lock.acquire().unwrap().release().unwrap().is_acquired();
        assert!(!acquired);
    }

    #[test]
    fn test_reacquire_on_held_lock_succeeds() {
        let dir = TempDir::new().unwrap();
        let mut lock = SingleFileLock::new(dir.path().join("r.lock"), LockOptions::exclusive());

        lock.acquire().unwrap();
        lock.acquire().unwrap();
        assert!(lock.is_acquired());
    }

    #[test]
    fn test_release_without_acquire_fails() {
        let dir = TempDir::new().unwrap();
        let mut lock = SingleFileLock::new(dir.path().join("never.lock"), LockOptions::default());

        let err = lock.release().unwrap_err();
        assert_eq!(err.kind(), LockErrorKind::Release);
        assert!(matches!(
            err,
            LockError::Release {
                source: LockFailure::MissingHandle,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_parent_directory_fails_to_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("child.lock");
        let mut lock = SingleFileLock::new(&path, LockOptions::default());

        let err = lock.acquire().unwrap_err();
        assert!(matches!(
            err,
            LockError::Acquire {
                source: LockFailure::Open(IoErrorKind::NotFound),
                ..
            }
        ));
        assert_eq!(err.path(), Some(path.as_path()));
        assert!(!lock.is_acquired());
        assert!(!lock.has_resource());
    }

    #[test]
    fn test_exclusive_contention_keeps_handle_for_retry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("contended.lock");
        let mut first = SingleFileLock::new(&path, LockOptions::exclusive());
        let mut second = SingleFileLock::new(&path, LockOptions::exclusive());

        first.acquire().unwrap();
        let err = second.acquire().unwrap_err();

        assert!(matches!(
            &err,
            LockError::Acquire { source, .. } if source.is_contended()
        ));
        assert!(first.is_acquired());
        assert!(!second.is_acquired());
        assert!(second.has_resource());

        first.release().unwrap();
        second.acquire().unwrap();
        assert!(second.is_acquired());
    }

    #[test]
    fn test_blocking_acquire_waits_for_holder() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("waited.lock");
        let hold_for = Duration::from_millis(200);

        let mut holder = SingleFileLock::new(&path, LockOptions::exclusive());
        holder.acquire().unwrap();

        let released = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&released);
        let handle = thread::spawn(move || {
            thread::sleep(hold_for);
            flag.store(true, Ordering::SeqCst);
            holder.release().unwrap();
        });

        let started = Instant::now();
        let mut waiter = SingleFileLock::new(&path, LockOptions::exclusive_blocking());
        waiter.acquire().unwrap();

        assert!(released.load(Ordering::SeqCst));
        assert!(started.elapsed() >= hold_for / 2);
        assert!(waiter.is_acquired());
        handle.join().unwrap();
    }

    #[test]
    fn test_non_blocking_acquire_does_not_wait() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("busy.lock");
        let mut holder = SingleFileLock::new(&path, LockOptions::exclusive());
        holder.acquire().unwrap();

        let started = Instant::now();
        let mut other = SingleFileLock::new(&path, LockOptions::shared());
        assert!(other.acquire().is_err());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_drop_releases_os_lock() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dropped.lock");

        {
            let mut held = SingleFileLock::new(&path, LockOptions::exclusive());
            held.acquire().unwrap();
        }

        let mut next = SingleFileLock::new(&path, LockOptions::exclusive());
        assert!(next.acquire().is_ok());
    }

    #[test]
    fn test_events_are_logged_with_desc_and_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logged.lock");
        let logger = Arc::new(RecordingLogger::default());
        let mut lock = SingleFileLock::new(&path, LockOptions::exclusive_blocking())
            .with_logger(logger.clone());

        lock.acquire().unwrap();
        lock.release().unwrap();
        let _ = lock.release();

        assert_eq!(logger.messages(), vec![ACQUIRED, RELEASED, RELEASE_FAILED]);
        for context in logger.contexts() {
            assert_eq!(context.keys().copied().collect::<Vec<_>>(), vec!["desc", "file"]);
            assert_eq!(context["desc"], "exclusive (blocking)");
            assert_eq!(context["file"], path.display().to_string());
        }
    }

    #[test]
    fn test_acquire_failure_is_logged_before_error() {
        let dir = TempDir::new().unwrap();
        let logger = Arc::new(RecordingLogger::default());
        let mut lock = SingleFileLock::new(
            dir.path().join("nope").join("x.lock"),
            LockOptions::default(),
        )
        .with_logger(logger.clone());

        assert!(lock.acquire().is_err());
        assert_eq!(logger.messages(), vec![ACQUIRE_FAILED]);
    }
}
