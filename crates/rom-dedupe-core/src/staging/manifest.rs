use super::staging_root;
use crate::error::Error;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

pub const MANIFEST_FILE: &str = ".manifest.json";

/// Staged location → original location, both relative to the ROMs root with
/// forward slashes. Stored as a JSON object inside the staging directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    records: BTreeMap<String, String>,
}

impl Manifest {
    pub fn path(root: &Path) -> PathBuf {
        staging_root(root).join(MANIFEST_FILE)
    }

    pub fn exists(root: &Path) -> bool {
        Self::path(root).is_file()
    }

    /// Load the manifest for `root`. A missing file is an empty manifest; an
    /// unreadable or malformed one is an error, never guessed at.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = Self::path(root);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        let records = serde_json::from_str(&text).map_err(|source| Error::Manifest {
            path: path.clone(),
            source,
        })?;
        Ok(Self { records })
    }

    /// Write the manifest atomically (temp file + rename).
    pub fn save(&self, root: &Path) -> Result<(), Error> {
        let path = Self::path(root);
        let json = serde_json::to_string_pretty(&self.records).map_err(|source| {
            Error::Manifest {
                path: path.clone(),
                source,
            }
        })?;
        fs::create_dir_all(staging_root(root))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        debug!("Saved manifest with {} records", self.records.len());
        Ok(())
    }

    /// Remove the manifest file if present.
    pub fn delete(root: &Path) -> Result<(), Error> {
        match fs::remove_file(Self::path(root)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn insert(&mut self, staged: String, original: String) -> Option<String> {
        self.records.insert(staged, original)
    }

    pub fn remove(&mut self, staged: &str) -> Option<String> {
        self.records.remove(staged)
    }

    pub fn get(&self, staged: &str) -> Option<&str> {
        self.records.get(staged).map(String::as_str)
    }

    /// Add `other`'s records. Keys already present are replaced by `other`'s value.
    pub fn merge(&mut self, other: Manifest) {
        self.records.extend(other.records);
    }

    pub fn records(&self) -> impl Iterator<Item = (&str, &str)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Root-relative path → manifest string with `/` separators.
pub fn to_manifest_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Manifest string → absolute path under `root`. Absolute paths and `..`
/// components are rejected so a tampered manifest can't reach outside the root.
pub fn resolve_manifest_path(root: &Path, record: &str) -> Option<PathBuf> {
    let relative = Path::new(record);
    let mut resolved = root.to_path_buf();
    let mut any = false;
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                any = true;
            }
            Component::CurDir => {}
            _ => return None,
        }
    }
    any.then_some(resolved)
}
