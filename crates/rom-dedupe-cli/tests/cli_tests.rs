use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::{tempdir, TempDir};

fn run(workdir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rom-dedupe"))
        .args(args)
        .current_dir(workdir.path())
        .env("NO_COLOR", "1")
        .env("LOG_FILE_PATH", workdir.path().join("logs/test.log"))
        .env_remove("TRACING_LEVEL")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn library(root: &Path) {
    let psx = root.join("psx");
    fs::create_dir_all(&psx).unwrap();
    fs::write(psx.join("Game (USA).chd"), b"usa").unwrap();
    fs::write(psx.join("Game (Japan).chd"), b"japan").unwrap();
}

#[test]
fn test_scan_prints_report() {
    let tmp = tempdir().unwrap();
    let roms = tmp.path().join("roms");
    library(&roms);

    let output = run(&tmp, &["scan", roms.to_str().unwrap()]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Duplicate groups: 1"));
    assert!(text.contains("KEEP: Game (USA).chd"));
    assert!(text.contains("REMOVE: Game (Japan).chd"));
    assert!(roms.join("psx/Game (Japan).chd").exists());
}

#[test]
fn test_scan_quiet_and_csv() {
    let tmp = tempdir().unwrap();
    let roms = tmp.path().join("roms");
    library(&roms);
    let csv = tmp.path().join("out.csv");

    let output = run(
        &tmp,
        &["scan", roms.to_str().unwrap(), "-q", "--csv", csv.to_str().unwrap()],
    );
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Files to remove: 1"));
    assert!(!text.contains("KEEP:"));
    assert!(fs::read_to_string(&csv).unwrap().contains("remove"));
}

#[test]
fn test_apply_then_restore() {
    let tmp = tempdir().unwrap();
    let roms = tmp.path().join("roms");
    library(&roms);

    let output = run(&tmp, &["apply", roms.to_str().unwrap(), "-v"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Removed 1 duplicate(s), 5 B saved"));
    assert!(text.contains("Game (Japan).chd"));
    assert!(!roms.join("psx/Game (Japan).chd").exists());
    assert!(roms.join("_duplicates_removed/psx/Game (Japan).chd").exists());

    let output = run(&tmp, &["restore", roms.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Restored 1 file(s)"));
    assert!(roms.join("psx/Game (Japan).chd").exists());
    assert!(!roms.join("_duplicates_removed").exists());
}

#[test]
fn test_missing_directory_fails() {
    let tmp = tempdir().unwrap();
    let missing = tmp.path().join("nope");
    let output = run(&tmp, &["scan", missing.to_str().unwrap()]);
    assert!(!output.status.success());
}

#[test]
fn test_print_config_shows_overrides() {
    let tmp = tempdir().unwrap();
    let roms = tmp.path().join("roms");
    library(&roms);
    fs::write(
        roms.join("config.json"),
        r#"{ "region_priority": ["Japan", "USA"] }"#,
    )
    .unwrap();

    let output = run(&tmp, &["print-config", roms.to_str().unwrap()]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("region_priority"));
    assert!(text.contains("\"Japan\""));
}
