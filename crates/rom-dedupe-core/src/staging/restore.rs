use super::lock::StagingLock;
use super::manifest::{resolve_manifest_path, Manifest};
use super::{staging_root, OnConflict, RestoreOutcome};
use crate::error::Error;
use crate::progress::ProgressReporter;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Move staged files back to where they came from.
///
/// Records that can't be resolved (missing staged file, `Skip` conflict, path
/// outside the root) stay in the manifest for a later run; the manifest file is
/// deleted once no records remain. Empty staging directories are pruned.
pub fn restore(
    root: &Path,
    on_conflict: OnConflict,
    reporter: &dyn ProgressReporter,
) -> Result<RestoreOutcome, Error> {
    let mut outcome = RestoreOutcome::default();
    if !Manifest::exists(root) {
        debug!("No manifest under {}, nothing to restore", root.display());
        return Ok(outcome);
    }

    let _lock = StagingLock::acquire(root)?;
    let mut manifest = Manifest::load(root)?;
    let records: Vec<(String, String)> = manifest
        .records()
        .map(|(staged, original)| (staged.to_string(), original.to_string()))
        .collect();
    reporter.on_restore_start(records.len());

    for (staged, original) in &records {
        match restore_record(root, staged, original, on_conflict, &mut manifest, &mut outcome) {
            Ok(Some(restored)) => reporter.on_file_restored(&restored),
            Ok(None) => {}
            Err(e) => {
                // Records already handled must not be replayed.
                manifest.save(root)?;
                return Err(e);
            }
        }
    }

    if manifest.is_empty() {
        Manifest::delete(root)?;
    } else {
        manifest.save(root)?;
    }
    prune_staging(root)?;

    reporter.on_restore_complete(outcome.restored, outcome.unresolved());
    info!(
        "Restored {} files, discarded {}, {} conflicts, {} missing",
        outcome.restored, outcome.discarded, outcome.conflicts, outcome.missing
    );
    Ok(outcome)
}

fn restore_record(
    root: &Path,
    staged: &str,
    original: &str,
    on_conflict: OnConflict,
    manifest: &mut Manifest,
    outcome: &mut RestoreOutcome,
) -> Result<Option<PathBuf>, Error> {
    let (Some(staged_path), Some(original_path)) = (
        resolve_manifest_path(root, staged),
        resolve_manifest_path(root, original),
    ) else {
        warn!("Rejecting manifest record {} -> {}", staged, original);
        outcome.rejected += 1;
        return Ok(None);
    };

    if fs::symlink_metadata(&staged_path).is_err() {
        warn!("Staged file {} is missing, leaving record", staged_path.display());
        outcome.missing += 1;
        return Ok(None);
    }

    if fs::symlink_metadata(&original_path).is_ok() {
        match on_conflict {
            OnConflict::Skip => {
                warn!("{} already exists, skipping", original_path.display());
                outcome.conflicts += 1;
                return Ok(None);
            }
            OnConflict::Overwrite => {
                debug!("Overwriting {}", original_path.display());
                remove_path(&original_path)?;
            }
            OnConflict::Remove => {
                debug!("{} already exists, deleting staged copy", original_path.display());
                remove_path(&staged_path)?;
                manifest.remove(staged);
                outcome.discarded += 1;
                return Ok(None);
            }
        }
    }

    if let Some(parent) = original_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::rename(&staged_path, &original_path)?;
    manifest.remove(staged);
    outcome.restored += 1;
    debug!(from = %staged_path.display(), to = %original_path.display(), "Restored");
    Ok(Some(original_path))
}

fn remove_path(path: &Path) -> Result<(), Error> {
    if fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Remove empty directories under the staging root, deepest first, then the
/// staging root itself if it ended up empty.
fn prune_staging(root: &Path) -> Result<(), Error> {
    let staging = staging_root(root);
    if !staging.is_dir() {
        return Ok(());
    }
    for entry in WalkDir::new(&staging)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_dir())
    {
        if is_empty_dir(entry.path())? {
            fs::remove_dir(entry.path())?;
        }
    }
    if is_empty_dir(&staging)? {
        fs::remove_dir(&staging)?;
        debug!("Removed empty {}", staging.display());
    }
    Ok(())
}

fn is_empty_dir(path: &Path) -> Result<bool, Error> {
    Ok(fs::read_dir(path)?.next().is_none())
}
