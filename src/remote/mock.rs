use crate::error::{Result, SitePublishError};
use crate::remote::{RemoteOutput, RemoteSession};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One interaction with a [MockSession], in call order
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    Exec {
        command: String,
        stdin: Option<String>,
    },
    Mkdir(String),
    Upload {
        local: PathBuf,
        remote: String,
    },
    Close,
}

/// Mock session for testing deploys without a server
#[derive(Debug, Default)]
pub struct MockSession {
    calls: Vec<RemoteCall>,
    dirs: BTreeSet<String>,
    files: BTreeMap<String, Vec<u8>>,
    failing_commands: Vec<String>,
    fail_uploads: bool,
    closed: bool,
}

impl MockSession {
    /// Create a new session where every command succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands containing `fragment` exit with status 1
    pub fn fail_command(mut self, fragment: impl Into<String>) -> Self {
        self.failing_commands.push(fragment.into());
        self
    }

    /// Every upload fails with an I/O error
    pub fn fail_uploads(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    pub fn calls(&self) -> &[RemoteCall] {
        &self.calls
    }

    /// Executed commands, in order
    pub fn commands(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                RemoteCall::Exec { command, .. } => Some(command.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn file(&self, remote: &str) -> Option<&[u8]> {
        self.files.get(remote).map(Vec::as_slice)
    }

    pub fn has_dir(&self, remote: &str) -> bool {
        self.dirs.contains(remote)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl RemoteSession for MockSession {
    fn exec(&mut self, command: &str, stdin: Option<&str>) -> Result<RemoteOutput> {
        self.calls.push(RemoteCall::Exec {
            command: command.to_string(),
            stdin: stdin.map(str::to_string),
        });

        if self.failing_commands.iter().any(|f| command.contains(f.as_str())) {
            return Ok(RemoteOutput {
                code: 1,
                stdout: String::new(),
                stderr: format!("simulated failure: {}", command),
            });
        }
        Ok(RemoteOutput::default())
    }

    fn mkdir(&mut self, path: &str) -> Result<()> {
        self.calls.push(RemoteCall::Mkdir(path.to_string()));
        self.dirs.insert(path.to_string());
        Ok(())
    }

    fn upload_file(&mut self, local: &Path, remote: &str) -> Result<()> {
        self.calls.push(RemoteCall::Upload {
            local: local.to_path_buf(),
            remote: remote.to_string(),
        });

        if self.fail_uploads {
            return Err(SitePublishError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "simulated upload failure",
            )));
        }
        self.files.insert(remote.to_string(), fs::read(local)?);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.calls.push(RemoteCall::Close);
            self.closed = true;
        }
        Ok(())
    }
}
