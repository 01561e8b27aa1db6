use super::RomEntry;
use crate::config::AppConfig;
use crate::error::Error;
use glob::Pattern;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use walkdir::WalkDir;

/// Extensions (lowercase, no dot) that count as ROM data or ROM playlists.
pub const ROM_EXTENSIONS: &[&str] = &[
    "chd", "bin", "cue", "m3u", "zip", "md", "sfc", "nes", "gb", "gba",
];

/// Console directories starting with these are skipped (`.git`, `_duplicates_removed`, ...).
pub const EXCLUDED_PREFIXES: &[char] = &['.', '_'];

/// Scan every console directory under `roms_root` for ROM files.
///
/// Consoles are visited in name order and files in path order, so repeated scans
/// of an unchanged tree return the same list. A missing root yields no entries.
pub fn scan(roms_root: &Path, config: &AppConfig) -> Result<Vec<RomEntry>, Error> {
    let mut entries = Vec::new();
    if !roms_root.is_dir() {
        debug!("{} is not a directory, nothing to scan", roms_root.display());
        return Ok(entries);
    }

    let ignore_patterns: Vec<Pattern> = config
        .ignore_patterns
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect();

    for console_dir in console_dirs(roms_root)? {
        let console = console_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if console.starts_with(EXCLUDED_PREFIXES) || config.is_console_excluded(&console) {
            debug!("Skipping console directory {}", console);
            continue;
        }
        visit_console(&console_dir, &console, &ignore_patterns, &mut entries)?;
    }

    info!("Found {} ROM files", entries.len());
    Ok(entries)
}

fn console_dirs(roms_root: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(roms_root)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn visit_console(
    dir: &Path,
    console: &str,
    ignore_patterns: &[Pattern],
    entries: &mut Vec<RomEntry>,
) -> Result<(), Error> {
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !ignore_patterns.iter().any(|p| p.matches_path(e.path())));

    for entry_result in walker {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                let denied = err
                    .io_error()
                    .is_some_and(|e| e.kind() == io::ErrorKind::PermissionDenied);
                if denied {
                    error!("Access denied while scanning {}: {}", dir.display(), err);
                    continue;
                }
                return Err(Error::Io(io::Error::other(format!(
                    "Error scanning {}: {}",
                    dir.display(),
                    err
                ))));
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let rom = RomEntry::file(entry.path(), console);
        if rom
            .extension
            .as_deref()
            .is_some_and(|ext| ROM_EXTENSIONS.contains(&ext))
        {
            entries.push(rom);
        }
    }
    Ok(())
}
