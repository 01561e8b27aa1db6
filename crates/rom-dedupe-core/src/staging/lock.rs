use crate::error::Error;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const LOCK_FILE: &str = ".rom-dedupe.lock";

/// Exclusive advisory lock on a ROMs root for the length of an apply or restore,
/// so two processes never read-modify-write the same manifest. The lock file is
/// left on disk after release.
pub struct StagingLock {
    file: File,
    path: PathBuf,
}

impl StagingLock {
    /// Take the lock without waiting. Returns [`Error::Locked`] if another process holds it.
    pub fn acquire(root: &Path) -> Result<Self, Error> {
        let path = root.join(LOCK_FILE);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => break,
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == std::io::ErrorKind::WouldBlock
                        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error() =>
                {
                    return Err(Error::Locked(path));
                }
                Err(err) => return Err(err.into()),
            }
        }
        debug!("Acquired lock {}", path.display());
        Ok(Self { file, path })
    }
}

impl Drop for StagingLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to release lock {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_second_acquire_is_refused() {
        let tmp = tempdir().unwrap();
        let _held = StagingLock::acquire(tmp.path()).unwrap();
        assert!(matches!(
            StagingLock::acquire(tmp.path()),
            Err(Error::Locked(_))
        ));
    }

    #[test]
    fn test_lock_file_survives_release() {
        let tmp = tempdir().unwrap();
        let lock = StagingLock::acquire(tmp.path()).unwrap();
        drop(lock);

        // A handle opened before the relock contends with it.
        assert!(tmp.path().join(LOCK_FILE).is_file());
        let opened_earlier = OpenOptions::new()
            .read(true)
            .write(true)
            .open(tmp.path().join(LOCK_FILE))
            .unwrap();
        let _relocked = StagingLock::acquire(tmp.path()).unwrap();
        assert!(FileExt::try_lock_exclusive(&opened_earlier).is_err());
    }
}
