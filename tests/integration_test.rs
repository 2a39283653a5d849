// tests/integration_test.rs
use std::process::Command;
use tempfile::TempDir;

fn site_publish() -> Command {
    Command::new(env!("CARGO_BIN_EXE_site-publish"))
}

#[test]
fn test_site_publish_help() {
    let output = site_publish()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("site-publish"));
    assert!(stdout.contains("--deploy <HOST> <PATH>"));
    assert!(stdout.contains("--no-dependency-checking"));
    assert!(stdout.contains("--release-dev-server"));
}

#[test]
fn test_site_publish_version() {
    let output = site_publish()
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        stdout.trim(),
        format!("site-publish {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn test_deploy_conflicts_with_dev_server() {
    let output = site_publish()
        .args(["--release-dev-server", "--deploy", "example.com", "/srv/site"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_deploy_needs_host_and_path() {
    let output = site_publish()
        .args(["--deploy", "example.com"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_invalid_config_exits_with_one() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("sitepublish.toml"), "[build\n").unwrap();

    let output = site_publish()
        .arg("-C")
        .arg(root.path())
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_failed_preflight_exits_with_one() {
    let root = TempDir::new().unwrap();
    std::fs::write(
        root.path().join("sitepublish.toml"),
        "[toolchain.package_manager]\ncommand = \"site-publish-missing-npm\"\nminimum = \"5.6.0\"\n",
    )
    .unwrap();

    let output = site_publish()
        .arg("-C")
        .arg(root.path())
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    assert!(!root.path().join("build").exists());
}
