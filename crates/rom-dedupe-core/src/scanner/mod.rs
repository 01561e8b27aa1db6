mod walk;

pub use walk::{scan, EXCLUDED_PREFIXES, ROM_EXTENSIONS};

use crate::parser::{FileMetadata, FilenameParser};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A ROM file or game folder found under a console directory. Identity is the path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RomEntry {
    pub path: PathBuf,
    /// Name of the console directory directly under the ROMs root.
    pub console: String,
    /// Lowercased extension without the dot; `None` for game folders.
    pub extension: Option<String>,
}

impl RomEntry {
    pub fn file(path: impl Into<PathBuf>, console: impl Into<String>) -> Self {
        let path = path.into();
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase());
        Self {
            path,
            console: console.into(),
            extension,
        }
    }

    pub fn directory(path: impl Into<PathBuf>, console: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            console: console.into(),
            extension: None,
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn has_extension(&self, ext: &str) -> bool {
        self.extension.as_deref() == Some(ext)
    }

    pub fn is_playlist(&self) -> bool {
        self.has_extension("m3u")
    }

    /// File name without extension, used to pair `.bin`/`.cue` siblings.
    pub fn stem(&self) -> String {
        match self.extension {
            Some(_) => self
                .path
                .file_stem()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default(),
            None => self.file_name(),
        }
    }

    pub fn parse(&self, parser: &FilenameParser) -> FileMetadata {
        let name = self.file_name();
        match self.extension {
            Some(_) => parser.parse(&name),
            None => parser.parse_stem(&name),
        }
    }

    /// Size on disk, read on demand. Folders sum their files; unreadable paths count as 0.
    pub fn size(&self) -> u64 {
        path_size(&self.path)
    }
}

fn path_size(path: &Path) -> u64 {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => WalkDir::new(path)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| e.metadata().ok())
            .map(|m| m.len())
            .sum(),
        Ok(meta) => meta.len(),
        Err(_) => 0,
    }
}
