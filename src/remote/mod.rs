//! Remote shell and file transfer abstraction
//!
//! The deploy sequence talks to the server through the [RemoteSession]
//! trait so it can run against a real SSH connection or an in-memory mock.
//!
//! - [ssh::SshSession]: libssh2 session with SFTP, released on drop
//! - [mock::MockSession]: records every call, used by tests
//! - [deploy]: stop service, upload, update dependencies, restart

pub mod deploy;
pub mod mock;
pub mod ssh;

pub use deploy::{deploy_and_close, DeployPlan, DeployReport, ServiceAction};
pub use mock::{MockSession, RemoteCall};
pub use ssh::{SshSession, SshTarget};

use crate::error::{Result, SitePublishError};
use std::path::Path;

/// Captured result of a remote command
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RemoteOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Shell + file transfer session to the deploy host.
///
/// ## Error Handling
///
/// `exec` only fails when the command could not be run at all; a non-zero
/// exit is reported in [RemoteOutput::code]. Use
/// [RemoteSession::exec_checked] to turn that into
/// [SitePublishError::Remote].
pub trait RemoteSession {
    /// Run `command` through the remote shell, writing `stdin` to it first.
    fn exec(&mut self, command: &str, stdin: Option<&str>) -> Result<RemoteOutput>;

    /// Create `path` unless it already exists as a directory.
    fn mkdir(&mut self, path: &str) -> Result<()>;

    /// Write the local file at `local` to `remote`, replacing it.
    fn upload_file(&mut self, local: &Path, remote: &str) -> Result<()>;

    /// Tear the session down. Calling it twice is harmless.
    fn close(&mut self) -> Result<()>;

    /// Like [RemoteSession::exec] but a non-zero exit is an error.
    fn exec_checked(&mut self, command: &str, stdin: Option<&str>) -> Result<RemoteOutput> {
        let output = self.exec(command, stdin)?;
        if output.code != 0 {
            return Err(SitePublishError::Remote {
                command: command.to_string(),
                code: output.code,
                output: format!("stdout: {}\nstderr: {}", output.stdout, output.stderr),
            });
        }
        Ok(output)
    }
}

/// Join remote path segments with `/` regardless of the local platform.
pub fn remote_join(base: &str, name: &str) -> String {
    if base.is_empty() {
        return name.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), name)
}
