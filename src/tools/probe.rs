use crate::domain::Version;
use crate::error::{Result, SitePublishError};
use crate::tools::command::Cmd;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Message the minifier prints when a plugin module cannot be resolved
const MISSING_MODULE_MARKER: &str = "Cannot find module";

/// An external binary that must exist at a minimum version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequirement {
    pub command: String,

    #[serde(default = "default_version_arg")]
    pub version_arg: String,

    /// Literal text expected right before the version, e.g. `v` for node
    #[serde(default)]
    pub prefix: String,

    pub minimum: Version,
}

fn default_version_arg() -> String {
    "-v".to_string()
}

impl ToolRequirement {
    pub fn new(command: impl Into<String>, version_arg: impl Into<String>, minimum: Version) -> Self {
        ToolRequirement {
            command: command.into(),
            version_arg: version_arg.into(),
            prefix: String::new(),
            minimum,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Label shown by the stage reporter
    pub fn label(&self) -> String {
        format!("Checking for {} version >= {}", self.command, self.minimum)
    }
}

/// Run `<command> <version_arg>` and pull the version out of stdout.
pub fn probe_version(req: &ToolRequirement) -> Result<Version> {
    let output = Cmd::new(&req.command)
        .arg(&req.version_arg)
        .run_checked()?;

    Version::extract(&output.stdout, &req.prefix)
        .ok_or_else(|| SitePublishError::unparseable_version(&req.command, output.stdout))
}

/// Probe the tool and compare against its minimum.
pub fn check_tool(req: &ToolRequirement) -> Result<Version> {
    let found = probe_version(req)?;
    if found < req.minimum {
        return Err(SitePublishError::BelowMinimum {
            name: req.command.clone(),
            found,
            required: req.minimum,
        });
    }
    Ok(found)
}

/// Ask the minifier to load `plugin` against an empty stylesheet.
pub fn probe_plugin(minifier: &str, plugin: &str, node_path: &Path) -> Result<()> {
    let cmd = Cmd::new(minifier)
        .args(["-u", plugin])
        .env("NODE_PATH", node_path)
        .stdin(" ");
    let output = cmd.run()?;

    if output.stderr.contains(MISSING_MODULE_MARKER) {
        return Err(SitePublishError::dependency_missing(plugin));
    }
    if !output.success() {
        return Err(SitePublishError::ToolFailed {
            command: cmd.display(),
            code: output.code,
            output: output.combined(),
        });
    }
    Ok(())
}
