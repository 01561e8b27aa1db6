//! Reversible removal: duplicates are moved under a staging directory inside
//! the ROMs root and recorded in a manifest so they can be moved back.

mod apply;
mod lock;
mod manifest;
mod restore;

pub use apply::{apply_removal, expand_removals, SystemTrash, TrashBin};
pub use lock::{StagingLock, LOCK_FILE};
pub use manifest::{Manifest, MANIFEST_FILE};
pub use restore::restore;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Reserved directory under the ROMs root that holds staged files. The scanner
/// skips it because of its `_` prefix.
pub const STAGING_DIR: &str = "_duplicates_removed";

pub fn staging_root(root: &Path) -> PathBuf {
    root.join(STAGING_DIR)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Send files to the OS trash instead of staging them. Not restorable.
    pub hard: bool,
    /// Leave groups whose keeper was a tie untouched.
    pub skip_uncertain: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub files: usize,
    pub bytes: u64,
    pub skipped_groups: usize,
    /// Original paths of everything moved or trashed, in processing order.
    pub removed: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreOutcome {
    pub restored: usize,
    /// Staged copies deleted because the original path was taken (`OnConflict::Remove`).
    pub discarded: usize,
    /// Records left in the manifest because the original path was taken (`OnConflict::Skip`).
    pub conflicts: usize,
    /// Records whose staged file no longer exists.
    pub missing: usize,
    /// Records with paths that escape the ROMs root.
    pub rejected: usize,
}

impl RestoreOutcome {
    pub fn unresolved(&self) -> usize {
        self.conflicts + self.missing + self.rejected
    }
}

/// What restore does when the original path is occupied again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnConflict {
    /// Leave both files and keep the manifest record for a later run.
    #[default]
    Skip,
    /// Replace the file at the original path with the staged one.
    Overwrite,
    /// Delete the staged copy and drop its record.
    Remove,
}

impl fmt::Display for OnConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OnConflict::Skip => "skip",
            OnConflict::Overwrite => "overwrite",
            OnConflict::Remove => "remove",
        };
        f.write_str(name)
    }
}

impl FromStr for OnConflict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(OnConflict::Skip),
            "overwrite" => Ok(OnConflict::Overwrite),
            "remove" => Ok(OnConflict::Remove),
            other => Err(format!("unknown conflict policy '{}'", other)),
        }
    }
}
