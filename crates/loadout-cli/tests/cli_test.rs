//! CLI integration tests using assert_cmd

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn loadout_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("loadout").expect("Failed to find loadout binary");
    cmd.env("LOADOUT_HOME", home.path());
    cmd.current_dir(home.path());
    cmd
}

/// A sandbox home with a Claude layout: two MCP servers, one disabled
fn claude_home() -> TempDir {
    let home = tempfile::tempdir().unwrap();
    fs::create_dir_all(home.path().join(".claude")).unwrap();
    fs::write(
        home.path().join(".claude.json"),
        r#"{"mcpServers": {"docs": {"type": "stdio", "command": "npx"}, "api": {"type": "http", "url": "https://x"}}}"#,
    )
    .unwrap();
    fs::write(
        home.path().join(".claude/settings.json"),
        r#"{"disabledMcpjsonServers": ["api"]}"#,
    )
    .unwrap();
    home
}

#[test]
fn test_help_command() {
    let home = tempfile::tempdir().unwrap();
    loadout_cmd(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Loadout - agent tool and profile manager",
        ));
}

#[test]
fn test_version_command() {
    let home = tempfile::tempdir().unwrap();
    loadout_cmd(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("loadout"));
}

#[test]
fn test_profile_help() {
    let home = tempfile::tempdir().unwrap();
    loadout_cmd(&home)
        .args(["profile", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Manage profiles"));
}

#[test]
fn test_no_platform_detected() {
    let home = tempfile::tempdir().unwrap();
    loadout_cmd(&home)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No supported platform"));
}

#[test]
fn test_list_tools() {
    let home = claude_home();
    loadout_cmd(&home)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("docs"))
        .stdout(predicate::str::contains("api"))
        .stdout(predicate::str::contains("disabled"));
}

#[test]
fn test_list_json() {
    let home = claude_home();
    loadout_cmd(&home)
        .args(["list", "--kind", "mcp", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""kind": "mcp_server""#));
}

#[test]
fn test_disable_and_enable_round_trip() {
    let home = claude_home();
    loadout_cmd(&home)
        .args(["disable", "mcp", "docs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Disabled"));

    let settings = fs::read_to_string(home.path().join(".claude/settings.json")).unwrap();
    assert!(settings.contains("docs"));

    loadout_cmd(&home)
        .args(["enable", "mcp", "docs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Enabled"));
}

#[test]
fn test_unknown_tool_fails() {
    let home = claude_home();
    loadout_cmd(&home)
        .args(["enable", "mcp", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no MCP server named 'ghost'"));
}

#[test]
fn test_profile_create_switch_list() {
    let home = claude_home();
    loadout_cmd(&home)
        .args(["profile", "create", "dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created profile 'dev'"));

    loadout_cmd(&home)
        .args(["profile", "switch", "dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 failed"));

    loadout_cmd(&home)
        .args(["profile", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dev"))
        .stdout(predicate::str::contains("(active)"));
}

#[test]
fn test_profile_export_and_import_analysis() {
    let home = claude_home();
    loadout_cmd(&home)
        .args(["profile", "create", "dev"])
        .assert()
        .success();

    let bundle_path = home.path().join("dev.json");
    loadout_cmd(&home)
        .args(["profile", "export", "dev", "--output"])
        .arg(&bundle_path)
        .assert()
        .success();
    assert!(bundle_path.is_file());

    loadout_cmd(&home)
        .args(["profile", "import"])
        .arg(&bundle_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 matching, 0 conflicting"));
}

#[test]
fn test_profile_delete_requires_force_or_confirm() {
    let home = claude_home();
    loadout_cmd(&home)
        .args(["profile", "create", "dev"])
        .assert()
        .success();

    loadout_cmd(&home)
        .args(["profile", "delete", "dev", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted profile 'dev'"));

    loadout_cmd(&home)
        .args(["profile", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No profiles."));
}
