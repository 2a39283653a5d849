use crate::error::{Result, SitePublishError};
use std::ffi::{OsStr, OsString};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Exit code shells use for "command not found"
const NOT_FOUND_EXIT_CODE: i32 = 127;

/// Captured result of a finished subprocess
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Stdout followed by stderr, for error reports
    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
        }
    }
}

/// Blocking subprocess builder for the external toolchain.
///
/// ```ignore
/// let out = Cmd::new("npm").args(["config", "get", "prefix"]).run_checked()?;
/// ```
#[derive(Debug, Default, Clone)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(OsString, OsString)>,
    stdin_data: Option<Vec<u8>>,
}

impl Cmd {
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Cmd {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_owned()));
        self
    }

    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    pub fn env<K: AsRef<OsStr>, V: AsRef<OsStr>>(mut self, key: K, value: V) -> Self {
        self.envs
            .push((key.as_ref().to_owned(), value.as_ref().to_owned()));
        self
    }

    /// Bytes written to the child's stdin before waiting on it
    pub fn stdin<D: AsRef<[u8]>>(mut self, data: D) -> Self {
        self.stdin_data = Some(data.as_ref().to_vec());
        self
    }

    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// The command line as the user would type it, for error messages
    pub fn display(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|s| s.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Resolve the program on `PATH` (honouring `PATHEXT` on Windows).
    fn resolve(&self) -> Result<PathBuf> {
        let resolved = match &self.cwd {
            Some(dir) => which::which_in(&self.program, std::env::var_os("PATH"), dir),
            None => which::which(&self.program),
        };
        resolved.map_err(|_| SitePublishError::tool_not_found(self.program_name()))
    }

    /// Build the std command for a child that inherits the terminal
    pub(crate) fn to_command(&self) -> Result<Command> {
        let program = self.resolve()?;
        let mut cmd = Command::new(program);
        cmd.args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k, v)));
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        Ok(cmd)
    }

    /// Run to completion and capture output without judging the exit code.
    ///
    /// Only a missing program is an error here (exit 127 included).
    pub fn run(&self) -> Result<CommandOutput> {
        let mut cmd = self.to_command()?;
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        cmd.stdin(if self.stdin_data.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            ErrorKind::NotFound => SitePublishError::tool_not_found(self.program_name()),
            _ => SitePublishError::Io(e),
        })?;

        // A child may exit without reading its input; its status and
        // stderr still decide the outcome.
        if let (Some(data), Some(mut stdin)) = (&self.stdin_data, child.stdin.take()) {
            match stdin.write_all(data) {
                Err(e) if e.kind() != ErrorKind::BrokenPipe => return Err(e.into()),
                _ => {}
            }
        }

        let output = child.wait_with_output()?;
        let code = output.status.code().unwrap_or(-1);

        if code == NOT_FOUND_EXIT_CODE {
            return Err(SitePublishError::tool_not_found(self.program_name()));
        }

        Ok(CommandOutput {
            code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run and require a zero exit code.
    pub fn run_checked(&self) -> Result<CommandOutput> {
        let output = self.run()?;
        if !output.success() {
            return Err(SitePublishError::ToolFailed {
                command: self.display(),
                code: output.code,
                output: output.combined(),
            });
        }
        Ok(output)
    }
}
