//! Runs the freshly built site locally until it exits or Ctrl-C is pressed.

use crate::config::ServerConfig;
use crate::error::{Result, SitePublishError};
use crate::tools::command::Cmd;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// How the dev server stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerExit {
    Exited,
    Interrupted,
}

/// Set once per process by the Ctrl-C handler
fn interrupt_flag() -> Result<Arc<AtomicBool>> {
    static FLAG: OnceLock<Arc<AtomicBool>> = OnceLock::new();

    if let Some(flag) = FLAG.get() {
        return Ok(Arc::clone(flag));
    }

    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&flag);
    // The child shares our process group and receives the same SIGINT;
    // we only record that it happened.
    ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst))
        .map_err(|e| SitePublishError::config(format!("cannot install Ctrl-C handler: {}", e)))?;

    Ok(Arc::clone(FLAG.get_or_init(|| flag)))
}

/// Run the configured server command with the build dir as working dir.
///
/// Blocks until the server exits. An exit caused by Ctrl-C counts as a
/// normal stop; any other non-zero exit is a failure.
pub fn launch(config: &ServerConfig, build_dir: &Path) -> Result<ServerExit> {
    let (program, args) = config
        .command
        .split_first()
        .ok_or_else(|| SitePublishError::config("server.command must not be empty"))?;

    let interrupted = interrupt_flag()?;
    interrupted.store(false, Ordering::SeqCst);

    let cmd = Cmd::new(program).args(args).cwd(build_dir);
    let status = cmd.to_command()?.status()?;

    if interrupted.load(Ordering::SeqCst) {
        return Ok(ServerExit::Interrupted);
    }
    if !status.success() {
        return Err(SitePublishError::ToolFailed {
            command: cmd.display(),
            code: status.code().unwrap_or(-1),
            output: String::new(),
        });
    }
    Ok(ServerExit::Exited)
}
