//! The single OS call site for advisory locking.
//!
//! Uses fs2 (cross-platform): `flock()` on Unix, `LockFileEx()` on Windows.
//! The lock state machine only goes through these three functions, so a
//! different backend can be swapped in here without touching it.

use std::{
    fs::{File, OpenOptions},
    io,
    path::Path,
};

use fs2::FileExt;

/// Open the target for read/write, creating it if missing.
///
/// Existing content is preserved.
pub(crate) fn open_lock_file(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
}

/// Request an advisory lock on an open file.
///
/// Calls go through `FileExt` explicitly: std's inherent `File` lock
/// methods shadow some of these names with different signatures.
///
/// With `blocking` the call waits indefinitely; otherwise contention is
/// reported immediately as an error.
pub(crate) fn request_lock(file: &File, exclusive: bool, blocking: bool) -> io::Result<()> {
    match (exclusive, blocking) {
        (true, true) => FileExt::lock_exclusive(file),
        (true, false) => FileExt::try_lock_exclusive(file),
        (false, true) => FileExt::lock_shared(file),
        (false, false) => FileExt::try_lock_shared(file),
    }
}

/// Drop the advisory lock held on an open file.
pub(crate) fn release_lock(file: &File) -> io::Result<()> {
    FileExt::unlock(file)
}
