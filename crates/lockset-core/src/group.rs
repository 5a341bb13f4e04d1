//! All-or-nothing locking over an ordered set of files.
//!
//! # Guarantees
//!
//! - **Ordered**: members are acquired and released in stored order
//! - **Rollback**: when member `k` fails to acquire, every acquired member
//!   before it is released before the error is returned
//! - **Fail-stop release**: [`FileLockGroup::release`] stops at the first
//!   failing member; [`FileLockGroup::release_all`] is the best-effort variant

use std::{path::PathBuf, sync::Arc};

use crate::{
    error::{LockError, Result},
    logging::{default_logger, LockLogger, LogContext, SharedLogger},
    options::LockOptions,
    single::SingleFileLock,
};

/// An ordered group of [`SingleFileLock`]s sharing one set of options.
#[derive(Debug)]
pub struct FileLockGroup {
    locks: Vec<SingleFileLock>,
    options: LockOptions,
    logger: SharedLogger,
}

impl FileLockGroup {
    /// Build one lock per file, in input order.
    #[must_use]
    pub fn new<I, P>(files: I, options: LockOptions) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut group = Self {
            locks: Vec::new(),
            options,
            logger: default_logger(),
        };
        group.set_locks(files);
        group
    }

    /// Build a group from a raw option bitmask.
    ///
    /// # Errors
    ///
    /// `InvalidOption` if the bitmask combines mutually exclusive flags.
    pub fn with_bits<I, P>(files: I, bits: u8) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        LockOptions::from_bits(bits).map(|options| Self::new(files, options))
    }

    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn LockLogger>) -> Self {
        self.set_logger(logger);
        self
    }

    /// Replace the logger on the group and every member.
    pub fn set_logger(&mut self, logger: Arc<dyn LockLogger>) -> &mut Self {
        self.locks.iter_mut().for_each(|lock| {
            lock.set_logger(Arc::clone(&logger));
        });
        self.logger = logger;
        self
    }

    /// Change the options pushed to members on the next acquire.
    pub fn set_options(&mut self, options: LockOptions) -> &mut Self {
        self.options = options;
        self
    }

    #[must_use]
    pub const fn options(&self) -> LockOptions {
        self.options
    }

    /// Replace the member set with fresh, unacquired locks.
    ///
    /// Previous members are dropped, not released through [`Self::release`];
    /// dropping closes their handles, which drops any OS lock they held.
    /// Discarding held members is reported through the group logger.
    pub fn set_locks<I, P>(&mut self, files: I) -> &mut Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let held = self.locks.iter().filter(|lock| lock.is_acquired()).count();
        if held > 0 {
            self.logger.debug(
                &format!("Discarding {held} held members of {{desc}} lock group"),
                &self.context(),
            );
        }

        self.locks = files
            .into_iter()
            .map(|path| {
                SingleFileLock::new(path, self.options).with_logger(Arc::clone(&self.logger))
            })
            .collect();
        self
    }

    #[must_use]
    pub fn locks(&self) -> &[SingleFileLock] {
        &self.locks
    }

    pub fn locks_mut(&mut self) -> &mut [SingleFileLock] {
        &mut self.locks
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// True when every member is acquired. Vacuously true for an empty group.
    #[must_use]
    pub fn is_acquired(&self) -> bool {
        self.locks.iter().all(SingleFileLock::is_acquired)
    }

    /// Acquire every member in order, rolling back on the first failure.
    ///
    /// # Errors
    ///
    /// `GroupAcquire` wrapping the first member's `Acquire` error. Members
    /// before it that were acquired have been released; members after it
    /// were never attempted.
    pub fn acquire(&mut self) -> Result<&mut Self> {
        let member_count = self.locks.len();
        let options = self.options;
        let logger = Arc::clone(&self.logger);

        let mut failure = None;
        for (index, lock) in self.locks.iter_mut().enumerate() {
            lock.set_options(options).set_logger(Arc::clone(&logger));
            if let Err(err) = lock.acquire() {
                failure = Some((index, err));
                break;
            }
        }

        let Some((failed_at, source)) = failure else {
            self.logger.debug(
                &format!("Acquired {{desc}} lock on group of {member_count} files"),
                &self.context(),
            );
            return Ok(self);
        };

        let rolled_back = self.rollback(failed_at);
        self.logger.debug(
            &format!(
                "Unable to acquire {{desc}} lock on group of {member_count} files, \
                 rolled back {rolled_back}"
            ),
            &self.context(),
        );

        Err(LockError::GroupAcquire {
            description: self.options.description(),
            member_count,
            rolled_back,
            source: Box::new(source),
        })
    }

    /// Release every member in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// `GroupRelease` wrapping the first member's `Release` error. Members
    /// after it are left untouched.
    pub fn release(&mut self) -> Result<&mut Self> {
        let member_count = self.locks.len();

        let failure = self.locks.iter_mut().find_map(|lock| lock.release().err());

        match failure {
            None => {
                self.logger.debug(
                    &format!("Released {{desc}} lock on group of {member_count} files"),
                    &self.context(),
                );
                Ok(self)
            }
            Some(source) => {
                self.logger.debug(
                    &format!("Unable to release {{desc}} lock on group of {member_count} files"),
                    &self.context(),
                );
                Err(LockError::GroupRelease {
                    description: self.options.description(),
                    member_count,
                    source: Box::new(source),
                })
            }
        }
    }

    /// Best-effort release: attempt every member and collect failures
    /// instead of stopping at the first.
    ///
    /// # Errors
    ///
    /// `GroupReleaseAll` listing each member failure, in member order.
    pub fn release_all(&mut self) -> Result<&mut Self> {
        let member_count = self.locks.len();

        let failures: Vec<LockError> = self
            .locks
            .iter_mut()
            .filter_map(|lock| lock.release().err())
            .collect();

        if failures.is_empty() {
            self.logger.debug(
                &format!("Released {{desc}} lock on group of {member_count} files"),
                &self.context(),
            );
            return Ok(self);
        }

        self.logger.debug(
            &format!(
                "Unable to release {{desc}} lock on {} of {member_count} files",
                failures.len()
            ),
            &self.context(),
        );
        Err(LockError::GroupReleaseAll {
            member_count,
            failures,
        })
    }

    /// Release the acquired members before `failed_at`. Returns how many
    /// were actually released; a member that fails logs its own
    /// release-failure event through the shared logger.
    fn rollback(&mut self, failed_at: usize) -> usize {
        let mut rolled_back = 0;
        for lock in self.locks[..failed_at]
            .iter_mut()
            .filter(|lock| lock.is_acquired())
        {
            if lock.release().is_ok() {
                rolled_back += 1;
            }
        }
        rolled_back
    }

    fn context(&self) -> LogContext {
        LogContext::from([("desc", self.options.description())])
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_empty_group_is_vacuously_acquired() {
        let mut group = FileLockGroup::new(Vec::<PathBuf>::new(), LockOptions::default());

        assert!(group.is_empty());
        assert!(group.is_acquired());
        assert!(group.acquire().is_ok());
        assert!(group.release().is_ok());
    }

    #[test]
    fn test_members_share_group_options() {
        let group = FileLockGroup::new(["a.lock", "b.lock"], LockOptions::exclusive_blocking());

        assert_eq!(group.len(), 2);
        assert!(group
            .locks()
            .iter()
            .all(|lock| lock.is_exclusive() && lock.is_blocking()));
    }

    #[test]
    fn test_with_bits_rejects_conflicting_flags() {
        let result = FileLockGroup::with_bits(
            ["a.lock"],
            LockOptions::BLOCKING | LockOptions::NON_BLOCKING,
        );
        assert!(matches!(result, Err(LockError::InvalidOption { .. })));
    }

    #[test]
    fn test_options_are_pushed_on_acquire() {
        let dir = TempDir::new().unwrap();
        let mut group = FileLockGroup::new(
            [dir.path().join("a.lock"), dir.path().join("b.lock")],
            LockOptions::shared(),
        );

        group.set_options(LockOptions::exclusive());
        group.acquire().unwrap();

        assert!(group.locks().iter().all(SingleFileLock::is_exclusive));
        group.release().unwrap();
    }

    #[test]
    fn test_set_locks_drops_held_members() {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("old.lock");
        let mut group = FileLockGroup::new([old.clone()], LockOptions::exclusive());
        group.acquire().unwrap();

        group.set_locks([dir.path().join("new.lock")]);

        let mut other = SingleFileLock::new(&old, LockOptions::exclusive());
        assert!(other.acquire().is_ok());
        assert!(!group.locks()[0].is_acquired());
    }

    #[test]
    fn test_release_all_after_acquire_succeeds() {
        let dir = TempDir::new().unwrap();
        let mut group = FileLockGroup::new(
            [dir.path().join("a.lock"), dir.path().join("b.lock")],
            LockOptions::exclusive(),
        );
        group.acquire().unwrap();

        group.release_all().unwrap();
        assert!(group.locks().iter().all(|lock| !lock.is_acquired()));
        assert!(group.locks().iter().all(|lock| !lock.has_resource()));
    }

    #[test]
    fn test_release_all_on_unacquired_group_fails_like_release() {
        let dir = TempDir::new().unwrap();
        let mut group = FileLockGroup::new(
            [dir.path().join("a.lock"), dir.path().join("b.lock")],
            LockOptions::exclusive(),
        );

        assert!(group.release().is_err());
        let err = group.release_all().unwrap_err();
        assert!(matches!(
            err,
            LockError::GroupReleaseAll { member_count: 2, ref failures } if failures.len() == 2
        ));
    }
}
