// tests/config_test.rs
use site_publish::config::{load_config, Config, CONFIG_FILE_NAME};
use site_publish::domain::Version;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::{NamedTempFile, TempDir};

#[test]
fn test_load_default_config() {
    let config = Config::default();
    assert_eq!(config.build.build_dir, PathBuf::from("build"));
    assert_eq!(config.build.staging_dir, PathBuf::from("build-staging"));
    assert_eq!(config.toolchain.package_manager.command, "npm");
    assert_eq!(
        config.toolchain.runtime.minimum,
        Version::new(8, 11, 0)
    );
    assert_eq!(config.toolchain.runtime.prefix, "v");
    assert_eq!(config.server.command, vec!["python3", "app.py"]);
}

#[test]
fn test_default_required_packages() {
    let config = Config::default();
    let names: Vec<&str> = config
        .toolchain
        .packages
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["cssnano", "cssnano-preset-advanced", "postcss-cli", "purgecss"]
    );
}

#[test]
fn test_load_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    let toml_content = r#"
[build]
build_dir = "out"

[deploy]
service = "blog.example.org"
port = 2222

[[toolchain.packages]]
name = "purgecss"
minimum = "2.0.0"
"#;
    temp_file.write_all(toml_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let root = TempDir::new().unwrap();
    let config = load_config(Some(temp_file.path().to_str().unwrap()), root.path()).unwrap();

    assert_eq!(config.build.build_dir, PathBuf::from("out"));
    // Untouched keys in a present section keep their defaults
    assert_eq!(config.build.staging_dir, PathBuf::from("build-staging"));
    assert_eq!(config.deploy.service.as_deref(), Some("blog.example.org"));
    assert_eq!(config.deploy.port, 2222);
    assert_eq!(config.toolchain.packages.len(), 1);
    assert_eq!(config.toolchain.packages[0].minimum, Version::new(2, 0, 0));
}

#[test]
fn test_project_file_is_found_in_root() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join(CONFIG_FILE_NAME),
        "[server]\ncommand = [\"python3\", \"-m\", \"flask\", \"run\"]\n",
    )
    .unwrap();

    let config = load_config(None, root.path()).unwrap();
    assert_eq!(config.server.command, vec!["python3", "-m", "flask", "run"]);
}

#[test]
fn test_invalid_version_rejected() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file
        .write_all(b"[[toolchain.packages]]\nname = \"cssnano\"\nminimum = \"4.0\"\n")
        .unwrap();
    temp_file.flush().unwrap();

    let root = TempDir::new().unwrap();
    assert!(load_config(Some(temp_file.path().to_str().unwrap()), root.path()).is_err());
}

#[test]
fn test_same_build_and_staging_dir_rejected() {
    let result = Config::from_toml("[build]\nbuild_dir = \"out\"\nstaging_dir = \"out\"\n");
    assert!(result.is_err());
}

#[test]
fn test_missing_explicit_file_is_error() {
    let root = TempDir::new().unwrap();
    let missing = root.path().join("nope.toml");
    assert!(load_config(Some(missing.to_str().unwrap()), root.path()).is_err());
}
