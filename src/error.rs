use thiserror::Error;

use crate::domain::Version;

/// Unified error type for site-publish operations
#[derive(Error, Debug)]
pub enum SitePublishError {
    #[error("{tool} Not Found")]
    ToolNotFound { tool: String },

    #[error("error while running '{command}' (exit code {code}):\n{output}")]
    ToolFailed {
        command: String,
        code: i32,
        output: String,
    },

    #[error("Unparseable version output from {tool}: {output:?}")]
    UnparseableVersion { tool: String, output: String },

    #[error("Dependency '{name}' Not Found")]
    DependencyMissing { name: String },

    #[error("{name} {found} is older than required {required}")]
    BelowMinimum {
        name: String,
        found: Version,
        required: Version,
    },

    #[error("Remote command '{command}' failed (exit code {code}):\n{output}")]
    Remote {
        command: String,
        code: i32,
        output: String,
    },

    #[error("SSH connection failed: {0}")]
    Connection(String),

    #[error("Deploy never started: {0}")]
    DeployNotStarted(#[source] Box<SitePublishError>),

    #[error("Deploy partially applied, failed at '{step}' (service restarted: {service_restarted}): {source}")]
    DeployPartiallyApplied {
        step: String,
        service_restarted: bool,
        #[source]
        source: Box<SitePublishError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    #[error("SSH error: {0}")]
    Ssh(#[from] ssh2::Error),
}

/// Convenience type alias for Results in site-publish
pub type Result<T> = std::result::Result<T, SitePublishError>;

impl SitePublishError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        SitePublishError::Config(msg.into())
    }

    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        SitePublishError::ToolNotFound { tool: tool.into() }
    }

    pub fn dependency_missing(name: impl Into<String>) -> Self {
        SitePublishError::DependencyMissing { name: name.into() }
    }

    pub fn unparseable_version(tool: impl Into<String>, output: impl Into<String>) -> Self {
        SitePublishError::UnparseableVersion {
            tool: tool.into(),
            output: output.into(),
        }
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        SitePublishError::Connection(msg.into())
    }

    /// True when the remote side may have been left in a changed state
    pub fn is_partial_deploy(&self) -> bool {
        matches!(self, SitePublishError::DeployPartiallyApplied { .. })
    }
}
