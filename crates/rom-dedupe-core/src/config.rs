use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Consoles whose directories hold laserdisc-style games that must never be deduplicated.
pub const DEFAULT_EXCLUDED_CONSOLES: &[&str] = &["daphne", "singe", "hypseus"];

/// Config file looked up inside the ROMs root when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Lowercased console directory names to leave alone.
    pub exclude_consoles: BTreeSet<String>,
    /// Extra regexes that mark a filename as a fan translation.
    pub translation_patterns: Vec<String>,
    /// Region codes, highest priority first. Overrides the built-in region scores.
    pub region_priority: Option<Vec<String>>,
    /// Glob patterns for paths the scanner skips.
    pub ignore_patterns: Vec<String>,
    pub roms_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    exclude_consoles: Option<Vec<String>>,
    #[serde(default)]
    translation_patterns: Option<Vec<String>>,
    #[serde(default)]
    region_priority: Option<Vec<String>>,
    #[serde(default)]
    ignore_patterns: Option<Vec<String>>,
    #[serde(default)]
    roms_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            exclude_consoles: DEFAULT_EXCLUDED_CONSOLES
                .iter()
                .map(|c| c.to_string())
                .collect(),
            translation_patterns: Vec::new(),
            region_priority: None,
            ignore_patterns: Vec::new(),
            roms_path: None,
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            exclude_consoles: raw
                .exclude_consoles
                .map(|list| list.iter().map(|c| c.to_lowercase()).collect())
                .unwrap_or(defaults.exclude_consoles),
            translation_patterns: raw.translation_patterns.unwrap_or_default(),
            region_priority: raw.region_priority,
            ignore_patterns: raw.ignore_patterns.unwrap_or_default(),
            roms_path: raw.roms_path,
        }
    }
}

impl AppConfig {
    pub fn is_console_excluded(&self, console: &str) -> bool {
        self.exclude_consoles.contains(&console.to_lowercase())
    }
}

/// Load configuration for a ROMs root.
///
/// An explicit `config_path` wins when it exists; a missing explicit path falls
/// back to defaults rather than to the root's `config.json`. Without an explicit
/// path, `<roms_root>/config.json` is used if present. `ROM_DEDUPE_*` environment
/// variables are layered on top.
pub fn load_configuration(
    roms_root: &Path,
    config_path: Option<&Path>,
) -> Result<AppConfig, ConfigError> {
    let source = match config_path {
        Some(path) if path.is_file() => Some(path.to_path_buf()),
        Some(path) => {
            warn!("Config file {} not found, using defaults", path.display());
            None
        }
        None => {
            let candidate = roms_root.join(DEFAULT_CONFIG_FILE);
            candidate.is_file().then_some(candidate)
        }
    };

    let mut builder = Config::builder();
    if let Some(path) = &source {
        debug!("Loading configuration from {}", path.display());
        builder = builder.add_source(ConfigFile::from(path.as_path()));
    }
    let raw = builder
        .add_source(Environment::with_prefix("ROM_DEDUPE"))
        .build()?
        .try_deserialize::<RawConfig>()?;

    Ok(raw.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_when_no_config_file() {
        let tmp = tempdir().unwrap();
        let config = load_configuration(tmp.path(), None).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.is_console_excluded("daphne"));
        assert!(config.is_console_excluded("Singe"));
        assert!(config.region_priority.is_none());
    }

    #[test]
    fn test_root_config_json_is_picked_up() {
        let tmp = tempdir().unwrap();
        fs::write(
            tmp.path().join("config.json"),
            r#"{"exclude_consoles": ["PSX"], "region_priority": ["Japan", "USA"]}"#,
        )
        .unwrap();

        let config = load_configuration(tmp.path(), None).unwrap();
        assert!(config.is_console_excluded("psx"));
        assert!(!config.is_console_excluded("daphne"));
        assert_eq!(
            config.region_priority,
            Some(vec!["Japan".to_string(), "USA".to_string()])
        );
        assert!(config.translation_patterns.is_empty());
    }

    #[test]
    fn test_explicit_path_overrides_root_config() {
        let tmp = tempdir().unwrap();
        fs::write(
            tmp.path().join("config.json"),
            r#"{"exclude_consoles": ["psx"]}"#,
        )
        .unwrap();
        let explicit = tmp.path().join("other.json");
        fs::write(
            &explicit,
            r#"{"translation_patterns": ["\\(Hack\\)"]}"#,
        )
        .unwrap();

        let config = load_configuration(tmp.path(), Some(&explicit)).unwrap();
        assert!(!config.is_console_excluded("psx"));
        assert!(config.is_console_excluded("hypseus"));
        assert_eq!(config.translation_patterns, vec![r"\(Hack\)".to_string()]);
    }

    #[test]
    fn test_missing_explicit_path_uses_defaults() {
        let tmp = tempdir().unwrap();
        fs::write(
            tmp.path().join("config.json"),
            r#"{"exclude_consoles": ["psx"]}"#,
        )
        .unwrap();
        let missing = tmp.path().join("nope.json");

        let config = load_configuration(tmp.path(), Some(&missing)).unwrap();
        assert_eq!(config.exclude_consoles, AppConfig::default().exclude_consoles);
    }
}
