use std::fmt;
use std::path::PathBuf;

/// Non-fatal conditions noticed while building or deploying.
/// These are reported to the user and the pipeline carries on.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineWarning {
    /// A configured glob matched no files
    EmptyGlob { group: String, pattern: String },
    /// Configured known-hosts file missing, host key checked against the
    /// user's own known-hosts file instead
    NoKnownHosts { path: PathBuf, fallback: PathBuf },
    /// Deploying without a configured service, so nothing is stopped or started
    DeployWithoutService,
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineWarning::EmptyGlob { group, pattern } => {
                write!(f, "{} pattern '{}' matched no files", group, pattern)
            }
            PipelineWarning::NoKnownHosts { path, fallback } => {
                write!(
                    f,
                    "known hosts file '{}' not found, verifying host key against '{}'",
                    path.display(),
                    fallback.display()
                )
            }
            PipelineWarning::DeployWithoutService => {
                write!(f, "no remote service configured, skipping stop/start")
            }
        }
    }
}
