//! Pure formatting functions for UI output.
//!
//! This module contains all display/formatting logic separated from user interaction.

use console::style;
use std::time::Duration;

use crate::warning::PipelineWarning;

/// Format and print a section heading in bold white.
pub fn section_title(title: &str) {
    println!("{}", style(title).white().bold());
}

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a non-fatal pipeline warning.
pub fn display_warning(warning: &PipelineWarning) {
    eprintln!("\t{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// Elapsed time as shown after each stage, e.g. `  (1.25s)`
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("  ({:.2}s)", elapsed.as_secs_f64())
}

/// Stage completion message, bold green on success and bold red on failure.
pub fn format_outcome(message: &str, success: bool) -> String {
    if success {
        style(message).green().bold().to_string()
    } else {
        style(message).red().bold().to_string()
    }
}
