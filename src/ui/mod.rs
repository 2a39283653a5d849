//! User interface module - interaction (prompts) and formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - `stage` - Timed stage reporting
//! - This module - Interactive prompts and user input handling

use anyhow::Result;
use console::Term;

pub mod formatter;
pub mod stage;

// Re-export formatter functions for convenience
pub use formatter::{
    display_error, display_status, display_success, display_warning, section_title,
};
pub use stage::Stage;

/// Prompts for the remote sudo password without echoing it.
///
/// # Returns
/// * `Ok(String)` - The entered password (may be empty)
/// * `Err` - If the terminal cannot be read
pub fn prompt_password(prompt: &str) -> Result<String> {
    let term = Term::stderr();
    term.write_str(&format!("\t{}: ", prompt))?;
    let password = term.read_secure_line()?;
    Ok(password)
}
