//! CLI Argument Parsing Compatibility Tests
//!
//! These tests verify that command-line arguments are parsed correctly and maintain
//! backward compatibility. The focus is on ensuring that flag names, value formats,
//! and defaults continue to work as expected across versions.
//!
//! Tests in this file should NOT be modified to match new behavior unless it's
//! intentional and documented in the changelog. Breaking changes here indicate
//! potential issues for existing users.

use assert_cmd::Command;

/// Test that --help output is generated without errors
#[test]
fn test_help_runs() {
    Command::cargo_bin("cpy")
        .unwrap()
        .arg("--help")
        .assert()
        .success();
}

/// Test --version flag works
#[test]
fn test_version_runs() {
    Command::cargo_bin("cpy")
        .unwrap()
        .arg("--version")
        .assert()
        .success();
}

/// Test that every documented flag shows up in --help
#[test]
fn test_help_lists_all_flags() {
    let output = Command::cargo_bin("cpy")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();
    let help = String::from_utf8_lossy(&output.stdout);
    for flag in [
        "--no-overwrite",
        "--ignore-existing",
        "--update",
        "--cwd",
        "--base",
        "--rename",
        "--dot",
        "--flat",
        "--dry-run",
        "--concurrency",
        "--summary",
        "--quiet",
        "--verbose",
        "--max-workers",
    ] {
        assert!(help.contains(flag), "missing {flag} in help:\n{help}");
    }
}

// ============================================================================
// --base Argument Parsing Tests
// ============================================================================

/// Test that "cwd" is accepted
#[test]
fn test_base_cwd() {
    Command::cargo_bin("cpy")
        .unwrap()
        .args(["--base", "cwd", "--help"])
        .assert()
        .success();
}

/// Test that "pattern" is accepted with the = syntax
#[test]
fn test_base_pattern_equals_syntax() {
    Command::cargo_bin("cpy")
        .unwrap()
        .args(["--base=pattern", "--help"])
        .assert()
        .success();
}

/// Test that unknown base modes are rejected
#[test]
fn test_base_unknown_rejected() {
    Command::cargo_bin("cpy")
        .unwrap()
        .args(["--base", "tree", "a", "b"])
        .assert()
        .failure();
}

// ============================================================================
// Numeric Argument Parsing Tests
// ============================================================================

/// Test that --concurrency accepts a positive integer
#[test]
fn test_concurrency_numeric() {
    Command::cargo_bin("cpy")
        .unwrap()
        .args(["--concurrency", "8", "--help"])
        .assert()
        .success();
}

/// Test that --concurrency rejects non-numeric values
#[test]
fn test_concurrency_non_numeric_rejected() {
    Command::cargo_bin("cpy")
        .unwrap()
        .args(["--concurrency", "many", "a", "b"])
        .assert()
        .failure();
}

/// Test that --concurrency rejects negative values
#[test]
fn test_concurrency_negative_rejected() {
    Command::cargo_bin("cpy")
        .unwrap()
        .args(["--concurrency=-1", "a", "b"])
        .assert()
        .failure();
}

/// Test that verbosity can be stacked
#[test]
fn test_verbose_count() {
    Command::cargo_bin("cpy")
        .unwrap()
        .args(["-vvv", "--help"])
        .assert()
        .success();
}

/// Test that --rename accepts the template placeholder verbatim
#[test]
fn test_rename_template_accepted() {
    Command::cargo_bin("cpy")
        .unwrap()
        .args(["--rename=hi-{{basename}}", "--help"])
        .assert()
        .success();
}
