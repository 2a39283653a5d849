use crate::domain::Version;
use crate::error::{Result, SitePublishError};
use crate::tools::ToolRequirement;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the project root
pub const CONFIG_FILE_NAME: &str = "sitepublish.toml";

/// Represents the complete configuration for site-publish.
///
/// Every section falls back to defaults matching the site's layout, so an
/// empty file (or none at all) is a valid configuration.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub css: CssConfig,

    #[serde(default)]
    pub toolchain: ToolchainConfig,

    #[serde(default)]
    pub deploy: DeployConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// A set of glob patterns copied into the build tree as one step.
///
/// Patterns are relative to the project root. A match equal to or beneath an
/// `exclude` entry is skipped.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct CopyGroup {
    #[serde(default)]
    pub patterns: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<PathBuf>,
}

impl CopyGroup {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CopyGroup {
            patterns: patterns.into_iter().map(Into::into).collect(),
            exclude: Vec::new(),
        }
    }

    pub fn excluding(mut self, path: impl Into<PathBuf>) -> Self {
        self.exclude.push(path.into());
        self
    }
}

/// Build tree layout and the file groups copied into it.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct BuildConfig {
    pub build_dir: PathBuf,
    pub staging_dir: PathBuf,
    /// Leftovers of previous local runs, removed before every build
    pub clean: Vec<PathBuf>,
    pub static_files: CopyGroup,
    pub sources: CopyGroup,
    pub templates: CopyGroup,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            build_dir: PathBuf::from("build"),
            staging_dir: PathBuf::from("build-staging"),
            clean: vec![PathBuf::from("static/video_thumbnails/thumb")],
            static_files: CopyGroup::new(["static/*"]).excluding("static/css"),
            sources: CopyGroup::new(["*.py", "util/*.py", "requirements.txt"])
                .excluding("build.py"),
            templates: CopyGroup::new(["templates"]),
        }
    }
}

/// Stylesheet concatenation, dead-code elimination and minification.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct CssConfig {
    pub stylesheets: Vec<String>,
    /// Final stylesheet location inside the build tree
    pub output: PathBuf,
    pub purge_command: String,
    pub minify_command: String,
    pub minify_config: PathBuf,
    /// Minifier plugins that must be resolvable before building
    pub plugins: Vec<String>,
    pub keep_staging: bool,
}

impl Default for CssConfig {
    fn default() -> Self {
        CssConfig {
            stylesheets: vec!["static/css/*".to_string()],
            output: PathBuf::from("static/css/sum.css"),
            purge_command: "purgecss".to_string(),
            minify_command: "postcss".to_string(),
            minify_config: PathBuf::from("postcss.config.js"),
            plugins: vec!["cssnano".to_string()],
            keep_staging: false,
        }
    }
}

/// A globally installed package and its minimum version
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PackageRequirement {
    pub name: String,
    pub minimum: Version,
}

impl PackageRequirement {
    pub fn new(name: impl Into<String>, minimum: Version) -> Self {
        PackageRequirement {
            name: name.into(),
            minimum,
        }
    }
}

/// Preflight requirements for the local toolchain.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ToolchainConfig {
    pub package_manager: ToolRequirement,
    pub runtime: ToolRequirement,
    pub packages: Vec<PackageRequirement>,
    pub tools: Vec<ToolRequirement>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        ToolchainConfig {
            package_manager: ToolRequirement::new("npm", "-v", Version::new(5, 6, 0)),
            runtime: ToolRequirement::new("node", "-v", Version::new(8, 11, 0)).with_prefix("v"),
            packages: vec![
                PackageRequirement::new("cssnano", Version::new(4, 0, 0)),
                PackageRequirement::new("cssnano-preset-advanced", Version::new(4, 0, 0)),
                PackageRequirement::new("postcss-cli", Version::new(5, 0, 1)),
                PackageRequirement::new("purgecss", Version::new(1, 0, 1)),
            ],
            tools: vec![
                ToolRequirement::new("purgecss", "-v", Version::new(1, 0, 1)),
                ToolRequirement::new("postcss", "--version", Version::new(5, 0, 1)),
            ],
        }
    }
}

/// Remote side of a deploy.
///
/// `service_control` accepts `{action}` (`stop`/`start`) and `{service}`;
/// `dependency_update` accepts `{path}`, the remote deploy path.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct DeployConfig {
    pub service: Option<String>,
    pub service_control: String,
    pub dependency_update: String,
    pub known_hosts: PathBuf,
    pub port: u16,
}

impl Default for DeployConfig {
    fn default() -> Self {
        DeployConfig {
            service: Some("connorwfitzgerald.com".to_string()),
            service_control: "supervisorctl {action} {service}".to_string(),
            dependency_update: "bash -c 'source {path}/venv/bin/activate && \
                                pip install -r {path}/requirements.txt && deactivate'"
                .to_string(),
            known_hosts: PathBuf::from("known_hosts"),
            port: 22,
        }
    }
}

/// Local dev server started from inside the build tree.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub command: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            command: vec!["python3".to_string(), "app.py".to_string()],
        }
    }
}

impl Config {
    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Config> {
        let config: Config = toml::from_str(text)
            .map_err(|e| SitePublishError::config(format!("Invalid {}: {}", CONFIG_FILE_NAME, e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot act on.
    pub fn validate(&self) -> Result<()> {
        if self.build.build_dir.as_os_str().is_empty() {
            return Err(SitePublishError::config("build.build_dir must not be empty"));
        }
        if self.build.staging_dir.as_os_str().is_empty() {
            return Err(SitePublishError::config("build.staging_dir must not be empty"));
        }
        if self.build.build_dir == self.build.staging_dir {
            return Err(SitePublishError::config(
                "build.build_dir and build.staging_dir must differ",
            ));
        }
        if self.server.command.is_empty() {
            return Err(SitePublishError::config("server.command must not be empty"));
        }
        if self.toolchain.package_manager.command.is_empty() {
            return Err(SitePublishError::config(
                "toolchain.package_manager.command must not be empty",
            ));
        }
        Ok(())
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `sitepublish.toml` in the project root
/// 3. `.sitepublish.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read, parsed or validated
pub fn load_config(config_path: Option<&str>, root: &Path) -> Result<Config> {
    let project_config = root.join(CONFIG_FILE_NAME);

    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if project_config.exists() {
        fs::read_to_string(project_config)?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(format!(".{}", CONFIG_FILE_NAME));
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    Config::from_toml(&config_str)
}
