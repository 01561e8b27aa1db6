use super::lock::StagingLock;
use super::manifest::{to_manifest_path, Manifest};
use super::{staging_root, ApplyOptions, ApplyOutcome};
use crate::engine::ReportGroup;
use crate::error::Error;
use crate::parser::FilenameParser;
use crate::progress::ProgressReporter;
use crate::scanner::RomEntry;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Irreversible removal used by hard mode.
pub trait TrashBin {
    fn trash(&self, path: &Path) -> Result<(), Error>;
}

/// Sends files to the platform Recycle Bin / Trash.
pub struct SystemTrash;

impl TrashBin for SystemTrash {
    fn trash(&self, path: &Path) -> Result<(), Error> {
        trash::delete(path).map_err(|e| Error::Trash {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Remove every group's planned duplicates (see [`expand_removals`]).
///
/// Soft mode moves each file to the same console-relative path under the staging
/// directory and records it in the manifest, merged into any manifest left by an
/// earlier run. Hard mode trashes files and records nothing. Files that are
/// already gone are skipped.
pub fn apply_removal(
    root: &Path,
    groups: &[ReportGroup],
    options: ApplyOptions,
    trash: &dyn TrashBin,
    reporter: &dyn ProgressReporter,
) -> Result<ApplyOutcome, Error> {
    let mut outcome = ApplyOutcome::default();
    let mut targets: Vec<RomEntry> = Vec::new();
    for group in groups {
        if options.skip_uncertain && group.uncertain {
            debug!(console = %group.console, title = %group.title, "Skipping uncertain group");
            outcome.skipped_groups += 1;
            continue;
        }
        targets.extend(group.planned.iter().cloned());
    }
    if targets.is_empty() {
        return Ok(outcome);
    }

    let _lock = StagingLock::acquire(root)?;
    reporter.on_apply_start(targets.len());

    if options.hard {
        for entry in &targets {
            if fs::symlink_metadata(&entry.path).is_err() {
                debug!("{} already gone, skipping", entry.path.display());
                continue;
            }
            let size = entry.size();
            trash.trash(&entry.path)?;
            debug!(path = %entry.path.display(), "Trashed");
            reporter.on_file_removed(&entry.path, None);
            outcome.files += 1;
            outcome.bytes += size;
            outcome.removed.push(entry.path.clone());
        }
    } else {
        let mut manifest = Manifest::load(root)?;
        let mut batch = Manifest::default();
        for entry in &targets {
            let size = entry.size();
            match stage_file(root, &entry.path) {
                Ok(Some((staged, original))) => {
                    reporter.on_file_removed(&entry.path, Some(&root.join(&staged)));
                    batch.insert(staged, original);
                    outcome.files += 1;
                    outcome.bytes += size;
                    outcome.removed.push(entry.path.clone());
                }
                Ok(None) => {}
                Err(e) => {
                    // Keep what already moved restorable before failing.
                    error!("Staging {} failed: {}", entry.path.display(), e);
                    manifest.merge(batch);
                    if let Err(save_err) = manifest.save(root) {
                        error!("Could not save manifest after failure: {}", save_err);
                    }
                    return Err(e);
                }
            }
        }
        if !batch.is_empty() {
            manifest.merge(batch);
            manifest.save(root)?;
        }
    }

    reporter.on_apply_complete(outcome.files, outcome.bytes);
    info!(
        "Removed {} files ({} bytes), skipped {} uncertain groups",
        outcome.files, outcome.bytes, outcome.skipped_groups
    );
    Ok(outcome)
}

/// Move one file under the staging root. Returns the manifest record, or
/// `None` when the file vanished, lies outside `root`, or has a path the
/// manifest can't record exactly (not valid UTF-8).
fn stage_file(root: &Path, path: &Path) -> Result<Option<(String, String)>, Error> {
    if fs::symlink_metadata(path).is_err() {
        debug!("{} already gone, skipping", path.display());
        return Ok(None);
    }
    let Ok(relative) = path.strip_prefix(root) else {
        warn!("{} is outside {}, skipping", path.display(), root.display());
        return Ok(None);
    };
    if relative.to_str().is_none() {
        warn!(
            "{} is not valid UTF-8 and can't be recorded in the manifest, leaving it in place",
            path.display()
        );
        return Ok(None);
    }

    let destination = unique_destination(staging_root(root).join(relative));
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }
    match fs::rename(path, &destination) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("{} vanished before move, skipping", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    }
    debug!(from = %path.display(), to = %destination.display(), "Staged");

    let staged = destination
        .strip_prefix(root)
        .map(to_manifest_path)
        .map_err(|e| Error::Other(e.to_string()))?;
    Ok(Some((staged, to_manifest_path(relative))))
}

/// `dest`, or `dest` with ` (n)` before the extension if something is already staged there.
fn unique_destination(dest: PathBuf) -> PathBuf {
    if fs::symlink_metadata(&dest).is_err() {
        return dest;
    }
    let stem = dest
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = dest
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let mut n = 1;
    loop {
        let candidate = dest.with_file_name(format!("{stem} ({n}){extension}"));
        if fs::symlink_metadata(&candidate).is_err() {
            return candidate;
        }
        n += 1;
    }
}

/// Everything that leaves the disk for one group.
///
/// Starts from the ranked `to_remove` list, then:
/// - the keeper's other discs and any `.bin`/`.cue` pair sharing the keeper's
///   directory and stem are never removed;
/// - a removed `.bin`/`.cue` takes the rest of its pair with it;
/// - a `.m3u` playlist goes too once every file it lists is going.
pub fn expand_removals(group: &ReportGroup, parser: &FilenameParser) -> Vec<RomEntry> {
    let mut protected: HashSet<&Path> = HashSet::new();
    if let Some(keeper) = &group.keeper {
        let mut kept = companion_discs(group, keeper, parser);
        kept.push(keeper);
        for entry in kept {
            protected.extend(image_set(group, entry).into_iter().map(|e| e.path.as_path()));
        }
    }

    let mut removal: Vec<RomEntry> = Vec::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();
    for entry in &group.to_remove {
        for member in image_set(group, entry) {
            if protected.contains(member.path.as_path()) {
                debug!("{} pairs with the keeper, keeping", member.path.display());
                continue;
            }
            if seen.insert(member.path.clone()) {
                removal.push(member.clone());
            }
        }
    }

    for playlist in group.entries.iter().filter(|e| e.is_playlist()) {
        if seen.contains(&playlist.path) {
            continue;
        }
        let members = playlist_members(&playlist.path);
        if !members.is_empty() && members.iter().all(|m| seen.contains(m)) {
            seen.insert(playlist.path.clone());
            removal.push(playlist.clone());
        }
    }

    removal
}

/// Other discs of the keeper's release: same directory and format, same tags
/// apart from the disc number.
fn companion_discs<'a>(
    group: &'a ReportGroup,
    keeper: &RomEntry,
    parser: &FilenameParser,
) -> Vec<&'a RomEntry> {
    let kept = keeper.parse(parser);
    if kept.disc_number.is_none() {
        return Vec::new();
    }
    group
        .entries
        .iter()
        .filter(|e| e.path != keeper.path)
        .filter(|e| e.path.parent() == keeper.path.parent() && e.extension == keeper.extension)
        .filter(|e| {
            let meta = e.parse(parser);
            meta.disc_number.is_some()
                && meta.disc_number != kept.disc_number
                && meta.base_title_normalized == kept.base_title_normalized
                && meta.region == kept.region
                && meta.languages == kept.languages
                && meta.version == kept.version
                && meta.quality == kept.quality
        })
        .collect()
}

fn is_image_part(entry: &RomEntry) -> bool {
    entry.has_extension("bin") || entry.has_extension("cue")
}

/// The `.bin`/`.cue` files in `group` that share `entry`'s directory and stem;
/// just `entry` for anything else.
fn image_set<'a>(group: &'a ReportGroup, entry: &'a RomEntry) -> Vec<&'a RomEntry> {
    if !is_image_part(entry) {
        return vec![entry];
    }
    let stem = entry.stem();
    let dir = entry.path.parent();
    let mut set: Vec<&RomEntry> = group
        .entries
        .iter()
        .filter(|e| is_image_part(e) && e.path.parent() == dir && e.stem() == stem)
        .collect();
    if !set.iter().any(|e| e.path == entry.path) {
        set.push(entry);
    }
    set
}

/// Paths listed in an `.m3u`, resolved against the playlist's directory.
/// Unreadable playlists list nothing, so they are never removed.
fn playlist_members(playlist: &Path) -> Vec<PathBuf> {
    let Ok(text) = fs::read_to_string(playlist) else {
        warn!("Could not read playlist {}", playlist.display());
        return Vec::new();
    };
    let dir = playlist.parent().unwrap_or_else(|| Path::new(""));
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| lexical_join(dir, &line.replace('\\', "/")))
        .collect()
}

fn lexical_join(dir: &Path, relative: &str) -> PathBuf {
    let mut path = dir.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                path.pop();
            }
            other => path.push(other.as_os_str()),
        }
    }
    path
}
