//! CLI integration tests for slipway.
//!
//! These tests cover the declaration-file diagnostics, the workspace
//! guard, the fetch-free bootstrap path, and the editing commands.
//! Nothing here touches the network or requires `stanza`.

use std::fs;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the slipway binary command.
fn slipway() -> Command {
    Command::cargo_bin("slipway").unwrap()
}

/// Create a temporary directory for test projects.
fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

/// Write a `slipway.toml` into `dir`.
fn write_declarations(dir: &TempDir, body: &str) {
    fs::write(dir.path().join("slipway.toml"), body).unwrap();
}

// ============================================================================
// slipway bootstrap
// ============================================================================

#[test]
fn test_bootstrap_without_declarations_fails() {
    let tmp = temp_dir();

    slipway()
        .args(["bootstrap"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn test_bootstrap_rejects_malformed_dependency() {
    let tmp = temp_dir();
    write_declarations(
        &tmp,
        "[project]\nname = \"demo\"\n\n\
         [dependencies]\n\
         dep = { repository = \"org/dep\", pkg = \"dep\", version = \"1.0\" }\n",
    );

    slipway()
        .args(["bootstrap"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("pick one"));
}

#[test]
fn test_bootstrap_refuses_existing_workspace() {
    let tmp = temp_dir();
    write_declarations(&tmp, "[project]\nname = \"demo\"\n");
    fs::create_dir(tmp.path().join(".slipway")).unwrap();

    slipway()
        .args(["bootstrap", "--no-build"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("already exists"));

    // Fail-fast: no layout was created inside the directory.
    assert!(!tmp.path().join(".slipway/deps").exists());
}

#[test]
fn test_bootstrap_no_build_writes_manifest() {
    let tmp = temp_dir();
    write_declarations(&tmp, "[project]\nname = \"demo\"\n");
    fs::write(tmp.path().join("stanza.proj"), "packages demo\n").unwrap();

    slipway()
        .args(["bootstrap", "--no-build"])
        .current_dir(tmp.path())
        .env_remove("SLIPWAY_REGISTRY")
        .assert()
        .success()
        .stdout(predicate::str::contains("manifest written"));

    let manifest = fs::read_to_string(tmp.path().join(".slipway/stanza.proj")).unwrap();
    assert_eq!(manifest, "include \"../stanza.proj\"\n");
    assert!(tmp.path().join(".slipway/deps").is_dir());
    assert!(tmp.path().join(".slipway/pkgs").is_dir());
    assert!(tmp.path().join(".slipway/cache").is_dir());
}

#[test]
fn test_bootstrap_manifest_omits_missing_root_fragment() {
    let tmp = temp_dir();
    write_declarations(&tmp, "[project]\nname = \"demo\"\n");

    slipway()
        .args(["bootstrap", "--no-build", "--path"])
        .arg(tmp.path())
        .env_remove("SLIPWAY_REGISTRY")
        .assert()
        .success();

    let manifest = fs::read_to_string(tmp.path().join(".slipway/stanza.proj")).unwrap();
    assert_eq!(manifest, "");
}

// ============================================================================
// slipway bootstrap with fake tools on PATH
// ============================================================================

#[cfg(unix)]
mod with_fake_tools {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    /// Install a fake executable into a private PATH directory.
    fn fake_bin(dir: &Path, name: &str, body: &str) {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
    }

    /// PATH with `dir` in front, so the fakes win the lookup.
    fn path_with(dir: &Path) -> String {
        match std::env::var("PATH") {
            Ok(path) => format!("{}:{}", dir.display(), path),
            Err(_) => dir.display().to_string(),
        }
    }

    fn bin_dir(tmp: &TempDir) -> std::path::PathBuf {
        let bin = tmp.path().join("bin");
        fs::create_dir(&bin).unwrap();
        bin
    }

    #[test]
    fn test_bootstrap_runs_build_and_reports_next_stage() {
        let tmp = temp_dir();
        write_declarations(&tmp, "[project]\nname = \"demo\"\n");
        let bin = bin_dir(&tmp);
        fake_bin(&bin, "stanza", "exit 0\n");

        slipway()
            .args(["bootstrap"])
            .current_dir(tmp.path())
            .env("PATH", path_with(&bin))
            .env_remove("SLIPWAY_REGISTRY")
            .assert()
            .success()
            .stdout(predicate::str::contains("demo bootstrapped: run"));
    }

    #[test]
    fn test_bootstrap_mirrors_build_tool_exit_code() {
        let tmp = temp_dir();
        write_declarations(&tmp, "[project]\nname = \"demo\"\n");
        let bin = bin_dir(&tmp);
        fake_bin(&bin, "stanza", "exit 7\n");

        slipway()
            .args(["bootstrap"])
            .current_dir(tmp.path())
            .env("PATH", path_with(&bin))
            .env_remove("SLIPWAY_REGISTRY")
            .assert()
            .failure()
            .code(7)
            .stderr(predicate::str::contains("exited with code 7"));
    }

    #[test]
    fn test_bootstrap_reports_missing_build_tool() {
        let tmp = temp_dir();
        write_declarations(&tmp, "[project]\nname = \"demo\"\n");
        let bin = bin_dir(&tmp);

        // The private PATH has no `stanza` at all.
        slipway()
            .args(["bootstrap"])
            .current_dir(tmp.path())
            .env("PATH", bin.display().to_string())
            .env_remove("SLIPWAY_REGISTRY")
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("not found on PATH"));
    }

    #[test]
    fn test_bootstrap_relative_path_keeps_manifest_resolvable() {
        let tmp = temp_dir();
        let project = tmp.path().join("proj");
        fs::create_dir(&project).unwrap();
        fs::write(
            project.join("slipway.toml"),
            "[project]\nname = \"demo\"\n\n\
             [dependencies]\n\
             dep = { repository = \"org/dep\", version = \"latest\" }\n",
        )
        .unwrap();
        fs::write(project.join("stanza.proj"), "packages demo\n").unwrap();

        let bin = bin_dir(&tmp);
        fake_bin(
            &bin,
            "git",
            "if [ \"$1\" = clone ]; then\n\
             for last in \"$@\"; do :; done\n\
             mkdir -p \"$last\"\n\
             fi\n\
             exit 0\n",
        );

        slipway()
            .args(["bootstrap", "--no-build", "--path", "proj"])
            .current_dir(tmp.path())
            .env("PATH", path_with(&bin))
            .env_remove("SLIPWAY_REGISTRY")
            .assert()
            .success();

        // Dependency includes are absolute even though --path was
        // relative, so every line resolves from the workspace.
        let manifest = fs::read_to_string(project.join(".slipway/stanza.proj")).unwrap();
        let lines: Vec<&str> = manifest.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("include? \"/"));
        assert!(lines[0].ends_with("/.slipway/deps/dep/stanza.proj\""));
        assert_eq!(lines[1], "include \"../stanza.proj\"");
    }
}

// ============================================================================
// slipway resolve
// ============================================================================

#[test]
fn test_resolve_rejects_malformed_reference() {
    slipway()
        .args(["resolve", "pcre"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid reference"));
}

#[test]
fn test_resolve_rejects_malformed_option() {
    slipway()
        .args(["resolve", "pcre/8.45", "--option", "os"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("expected key=value"));
}

// ============================================================================
// slipway add
// ============================================================================

#[test]
fn test_add_repository_dependency() {
    let tmp = temp_dir();
    write_declarations(&tmp, "[project]\nname = \"demo\"\n");

    slipway()
        .args([
            "add",
            "stanza-toml",
            "--repository",
            "tylanphear/stanza-toml",
            "--version",
            "latest",
        ])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("added stanza-toml latest"));

    let edited = fs::read_to_string(tmp.path().join("slipway.toml")).unwrap();
    assert!(edited.contains("repository = \"tylanphear/stanza-toml\""));
    assert!(edited.contains("version = \"latest\""));
}

#[test]
fn test_add_registry_dependency_with_options() {
    let tmp = temp_dir();
    write_declarations(&tmp, "[project]\nname = \"demo\"\n");

    slipway()
        .args([
            "add", "pcre", "--pkg", "pcre", "--version", "8.45", "--option", "os=Linux",
            "--option", "arch=x86_64",
        ])
        .current_dir(tmp.path())
        .assert()
        .success();

    let edited = fs::read_to_string(tmp.path().join("slipway.toml")).unwrap();
    assert!(edited.contains("pkg = \"pcre\""));
    assert!(edited.contains("os = \"Linux\""));
    assert!(edited.contains("arch = \"x86_64\""));

    // The edited file is still a valid declaration set.
    slipway()
        .args(["add", "zlib", "--pkg", "zlib", "--version", "1.2.13"])
        .current_dir(tmp.path())
        .assert()
        .success();
}

#[test]
fn test_add_rejects_both_sources() {
    let tmp = temp_dir();
    write_declarations(&tmp, "[project]\nname = \"demo\"\n");

    slipway()
        .args([
            "add",
            "dep",
            "--repository",
            "org/dep",
            "--pkg",
            "dep",
            "--version",
            "1.0",
        ])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

// ============================================================================
// slipway completions
// ============================================================================

#[test]
fn test_completions_bash() {
    slipway()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("slipway"));
}
