//! External toolchain access
//!
//! Everything here shells out and blocks until the child exits:
//! - command: subprocess builder with not-found detection
//! - probe: minimum version checks for binaries and minifier plugins
//! - npm: global package listing and module search path

pub mod command;
pub mod npm;
pub mod probe;

pub use command::{Cmd, CommandOutput};
pub use probe::ToolRequirement;
