//! End-to-end CLI tests for the relpack binary.
//!
//! Runs the real binary against temp project trees and checks progress
//! output, exit codes and the filesystem left behind.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Get a Command for the relpack binary.
fn relpack() -> Command {
    let mut cmd = Command::cargo_bin("relpack").expect("relpack binary should exist");
    cmd.env_remove("RELPACK_CONFIG")
        .env_remove("RELPACK_BASE_DIR")
        .env_remove("RELPACK_LOG")
        .env_remove("RELPACK_LOG_FORMAT")
        .env_remove("RUST_LOG");
    cmd
}

fn mod_project() -> TempDir {
    let dir = TempDir::new().expect("create temp project");
    let files: &[(&str, &[u8])] = &[
        ("readme.md", b"# demo\n"),
        ("LICENSE", b"MIT\n"),
        ("mod.conf", b"name = demo\n"),
        ("init.lua", b"return {}\n"),
        ("screenshot.png", b"\x89PNG\r\n\x1a\n"),
    ];
    for (name, data) in files {
        fs::write(dir.path().join(name), data).expect("write project file");
    }
    dir
}

fn dir_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

// ============================================================================
// Build
// ============================================================================

mod build {
    use super::*;

    #[test]
    fn default_manifest_builds_archive() {
        let project = mod_project();
        let archive = project
            .path()
            .join("_release")
            .join(format!("{}.zip", dir_name(project.path())));

        relpack()
            .arg("--base-dir")
            .arg(project.path())
            .arg("build")
            .assert()
            .success()
            .stdout(predicate::str::starts_with("[build start]\n. importing\n. building\n"))
            .stdout(predicate::str::contains(". add item 'readme.md'"))
            .stdout(predicate::str::contains(". add item 'screenshot.png'"))
            .stdout(predicate::str::contains("[build finished: output in"));

        assert!(archive.is_file());
    }

    #[test]
    fn no_subcommand_runs_build() {
        let project = mod_project();

        relpack()
            .current_dir(project.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("[build finished"));

        assert!(project.path().join("_release").is_dir());
    }

    #[test]
    fn missing_item_aborts_and_cleans_up() {
        let project = mod_project();
        fs::remove_file(project.path().join("mod.conf")).unwrap();

        relpack()
            .arg("-C")
            .arg(project.path())
            .arg("build")
            .assert()
            .code(12)
            .stdout(predicate::str::contains("mod.conf' not found, release aborted."))
            .stdout(predicate::str::contains(". add item 'init.lua'").not());

        assert!(!project.path().join("_release").exists());
    }

    #[test]
    fn item_overrides_replace_manifest() {
        let project = mod_project();

        relpack()
            .arg("-C")
            .arg(project.path())
            .args([
                "build",
                "--item",
                "readme.md",
                "--item",
                "LICENSE",
                "--out-dir",
                "dist",
                "--archive-name",
                "demo.zip",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(". add item 'init.lua'").not());

        assert!(project.path().join("dist").join("demo.zip").is_file());
    }

    #[test]
    fn release_json_is_used() {
        let project = mod_project();
        fs::write(
            project.path().join("release.json"),
            r#"{"name": "api_be2een", "items": ["readme.md", "LICENSE"], "out_dir": "out"}"#,
        )
        .unwrap();

        relpack()
            .arg("-C")
            .arg(project.path())
            .arg("build")
            .assert()
            .success();

        assert!(project.path().join("out").join("api_be2een.zip").is_file());
    }

    #[test]
    fn json_format_prints_report() {
        let project = mod_project();

        let output = relpack()
            .arg("-C")
            .arg(project.path())
            .args(["--format", "json", "build", "--item", "readme.md"])
            .output()
            .expect("run relpack");

        assert!(output.status.success());
        let report: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("stdout is a JSON report");
        let entries = report["entries"].as_array().expect("entries array");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["name"], "readme.md");

        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains(r#""event":"item_added""#));
    }

    #[test]
    fn json_format_reports_missing_item() {
        let project = mod_project();

        let output = relpack()
            .arg("-C")
            .arg(project.path())
            .args(["-f", "json", "build", "--item", "ghost.txt"])
            .output()
            .expect("run relpack");

        assert_eq!(output.status.code(), Some(12));
        let payload: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(payload["error"], "ERR_MISSING_ITEM");
        assert_eq!(payload["missing_item"], "ghost.txt");
    }

    #[test]
    fn unwritable_out_dir_is_reported() {
        let project = mod_project();
        fs::write(project.path().join("blocker"), b"file").unwrap();

        relpack()
            .arg("-C")
            .arg(project.path())
            .args(["build", "--out-dir", "blocker/out"])
            .assert()
            .code(14)
            .stdout(predicate::str::contains("cannot create output directory"));
    }

    #[test]
    fn out_dir_dot_is_refused_and_sources_survive() {
        let project = mod_project();

        relpack()
            .arg("-C")
            .arg(project.path())
            .args(["build", "--out-dir", ".", "--item", "readme.md", "--item", "ghost.lua"])
            .assert()
            .code(11)
            .stdout(predicate::str::contains("refusing to package"));

        for name in ["readme.md", "LICENSE", "mod.conf", "init.lua", "screenshot.png"] {
            assert!(project.path().join(name).is_file(), "{name} was removed");
        }
    }

    #[test]
    fn json_config_error_carries_validation_code() {
        let project = mod_project();
        fs::write(project.path().join("release.json"), r#"{"items": []}"#).unwrap();

        let output = relpack()
            .arg("-C")
            .arg(project.path())
            .args(["--format", "json", "build"])
            .output()
            .expect("run relpack");

        assert_eq!(output.status.code(), Some(11));
        let payload: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(payload["error"], "ERR_CONFIG");
        assert_eq!(payload["config_code"], 63);
    }

    #[test]
    fn invalid_config_is_config_error() {
        let project = mod_project();
        fs::write(project.path().join("release.json"), r#"{"items": []}"#).unwrap();

        relpack()
            .arg("-C")
            .arg(project.path())
            .arg("build")
            .assert()
            .code(11)
            .stderr(predicate::str::contains("invalid release config"));
    }
}

// ============================================================================
// Verify / Manifest
// ============================================================================

mod inspect {
    use super::*;

    #[test]
    fn verify_after_build() {
        let project = mod_project();

        relpack().arg("-C").arg(project.path()).arg("build").assert().success();

        relpack()
            .arg("-C")
            .arg(project.path())
            .arg("verify")
            .assert()
            .success()
            .stdout(predicate::str::contains("[verified: 5 entries"));
    }

    #[test]
    fn verify_detects_changed_source() {
        let project = mod_project();

        relpack().arg("-C").arg(project.path()).arg("build").assert().success();
        fs::write(project.path().join("init.lua"), b"return { changed = true }\n").unwrap();

        relpack()
            .arg("-C")
            .arg(project.path())
            .arg("verify")
            .assert()
            .code(13)
            .stderr(predicate::str::contains("checksum mismatch for 'init.lua'"));
    }

    #[test]
    fn manifest_lists_default_items() {
        let project = mod_project();

        relpack()
            .arg("-C")
            .arg(project.path())
            .arg("manifest")
            .assert()
            .success()
            .stdout(predicate::str::contains("builtin default"))
            .stdout(predicate::str::contains("  screenshot.png"));
    }

    #[test]
    fn version_prints_name() {
        relpack()
            .arg("version")
            .assert()
            .success()
            .stdout(predicate::str::starts_with("relpack "));
    }

    #[test]
    fn unknown_command_fails() {
        relpack()
            .arg("nonexistent-command")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }
}
