use rom_dedupe_core::config::load_configuration;
use rom_dedupe_core::scanner::scan;
use rom_dedupe_core::staging::STAGING_DIR;
use rom_dedupe_core::{AppConfig, ApplyOptions, DedupeEngine, OnConflict, SilentReporter};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(root: &Path, relative: &str, contents: &[u8]) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn library(root: &Path) {
    write(root, "psx/Game (USA).chd", b"usa");
    write(root, "psx/Game (Japan).chd", b"japan");
    write(root, "psx/Unique (Europe).chd", b"eu");
    write(root, "snes/ActRaiser (U) [!].zip", b"u");
    write(root, "snes/ActRaiser (E).zip", b"e");
    write(root, "snes/readme.txt", b"not a rom");
    write(root, "daphne/Dragon's Lair (USA).zip", b"1");
    write(root, "daphne/Dragon's Lair (Japan).zip", b"2");
    write(root, ".hidden/Game (Japan).chd", b"hidden");
}

fn relative_names(root: &Path, entries: &[rom_dedupe_core::RomEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|e| {
            e.path
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

#[test]
fn test_scan_skips_excluded_and_non_rom_files() {
    let tmp = tempdir().unwrap();
    library(tmp.path());
    let entries = scan(tmp.path(), &AppConfig::default()).unwrap();
    assert_eq!(
        relative_names(tmp.path(), &entries),
        vec![
            "psx/Game (Japan).chd",
            "psx/Game (USA).chd",
            "psx/Unique (Europe).chd",
            "snes/ActRaiser (E).zip",
            "snes/ActRaiser (U) [!].zip",
        ]
    );
}

#[test]
fn test_scan_missing_root_is_empty() {
    let tmp = tempdir().unwrap();
    let entries = scan(&tmp.path().join("nope"), &AppConfig::default()).unwrap();
    assert!(entries.is_empty());
}

#[test]
fn test_scan_honours_ignore_patterns() {
    let tmp = tempdir().unwrap();
    library(tmp.path());
    let config = AppConfig {
        ignore_patterns: vec!["*/snes".to_string()],
        ..Default::default()
    };
    let entries = scan(tmp.path(), &config).unwrap();
    assert!(entries.iter().all(|e| e.console == "psx"));
    assert_eq!(entries.len(), 3);
}

#[test]
fn test_dry_run_reports_without_touching_disk() {
    let tmp = tempdir().unwrap();
    library(tmp.path());
    let engine = DedupeEngine::new(tmp.path(), AppConfig::default());
    let report = engine.dry_run().unwrap();

    assert_eq!(report.total_files, 5);
    assert_eq!(report.duplicate_groups, 2);
    assert_eq!(report.total_to_remove, 2);
    assert_eq!(report.reclaimable_bytes, 6);

    let consoles: Vec<&str> = report.groups.iter().map(|g| g.console.as_str()).collect();
    assert_eq!(consoles, vec!["psx", "snes"]);
    assert_eq!(
        report.groups[1].keeper.as_ref().unwrap().file_name(),
        "ActRaiser (U) [!].zip"
    );

    assert!(tmp.path().join("psx/Game (Japan).chd").exists());
    assert!(!tmp.path().join(STAGING_DIR).exists());
}

#[test]
fn test_full_pipeline_apply_and_restore() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    library(root);
    let engine = DedupeEngine::new(root, AppConfig::default());

    let report = engine.dry_run().unwrap();
    let outcome = engine
        .apply(&report, ApplyOptions::default(), &SilentReporter)
        .unwrap();
    assert_eq!(outcome.files, 2);
    assert!(!root.join("psx/Game (Japan).chd").exists());
    assert!(!root.join("snes/ActRaiser (E).zip").exists());
    assert!(root.join("daphne/Dragon's Lair (Japan).zip").exists());

    let rescan = engine.dry_run().unwrap();
    assert_eq!(rescan.total_files, 3);
    assert!(rescan.groups.is_empty());

    let restored = engine.restore(OnConflict::Skip, &SilentReporter).unwrap();
    assert_eq!(restored.restored, 2);
    assert_eq!(fs::read(root.join("psx/Game (Japan).chd")).unwrap(), b"japan");
    assert_eq!(fs::read(root.join("snes/ActRaiser (E).zip")).unwrap(), b"e");
    assert!(!root.join(STAGING_DIR).exists());
    assert_eq!(engine.dry_run().unwrap().duplicate_groups, 2);
}

#[test]
fn test_config_file_drives_pipeline() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    library(root);
    write(
        root,
        "config.json",
        br#"{
            "exclude_consoles": ["SNES"],
            "region_priority": ["Japan", "USA"]
        }"#,
    );

    let config = load_configuration(root, None).unwrap();
    assert!(config.is_console_excluded("snes"));
    assert!(!config.is_console_excluded("daphne"));

    let engine = DedupeEngine::new(root, config);
    let report = engine.dry_run().unwrap();
    let consoles: Vec<&str> = report.groups.iter().map(|g| g.console.as_str()).collect();
    assert_eq!(consoles, vec!["daphne", "psx"]);

    let psx = &report.groups[1];
    assert_eq!(psx.keeper.as_ref().unwrap().file_name(), "Game (Japan).chd");
    assert_eq!(psx.planned[0].file_name(), "Game (USA).chd");
}

#[test]
fn test_explicit_config_path_overrides_root_config() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    library(root);
    write(root, "config.json", br#"{ "exclude_consoles": ["psx"] }"#);
    let other = tmp.path().join("elsewhere.json");
    fs::write(&other, br#"{ "region_priority": ["Europe"] }"#).unwrap();

    let config = load_configuration(root, Some(&other)).unwrap();
    assert!(!config.is_console_excluded("psx"));
    assert_eq!(config.region_priority, Some(vec!["Europe".to_string()]));
}
