//! Labeled, timed units of work printed to the console.
//!
//! A [`Stage`] prints `"\t<label>... "` when it begins and the colored outcome
//! plus elapsed time when it ends. Stages never terminate the process:
//! failures travel back as `Result` and the binary decides the exit code.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::ui::formatter::{format_elapsed, format_outcome};

/// An in-flight stage. Consumed by [`Stage::succeed`] or [`Stage::fail`].
///
/// Dropping a stage that was never finished (early `?` return, panic)
/// reports it as aborted, so every stage that starts also ends on screen.
#[must_use = "a stage reports its outcome when finished"]
pub struct Stage {
    label: String,
    started: Instant,
    finished: bool,
}

impl Stage {
    /// Print `"\t<label>... "` and start the timer.
    pub fn begin(label: impl Into<String>) -> Self {
        let label = label.into();
        print!("\t{}... ", label);
        let _ = io::stdout().flush();
        Self::started(label)
    }

    /// Like [`Stage::begin`] for stages that wrap other stages: the label
    /// gets its own line and the outcome is printed on a later one.
    pub fn begin_block(label: impl Into<String>) -> Self {
        let label = label.into();
        println!("{}...", label);
        Self::started(label)
    }

    fn started(label: String) -> Self {
        Stage {
            label,
            started: Instant::now(),
            finished: false,
        }
    }

    /// Run `work` as a stage, succeeding with `describe(&value)`.
    pub fn run<T>(
        label: impl Into<String>,
        work: impl FnOnce() -> Result<T>,
        describe: impl FnOnce(&T) -> String,
    ) -> Result<T> {
        let stage = Stage::begin(label);
        stage.track(work(), describe)
    }

    /// Report `result` and hand it back unchanged.
    pub fn track<T>(self, result: Result<T>, describe: impl FnOnce(&T) -> String) -> Result<T> {
        match &result {
            Ok(value) => self.succeed(describe(value)),
            Err(e) => self.fail(e.to_string()),
        }
        result
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn succeed(self, message: impl AsRef<str>) {
        self.finish(message.as_ref(), true);
    }

    pub fn fail(self, message: impl AsRef<str>) {
        self.finish(message.as_ref(), false);
    }

    fn finish(mut self, message: &str, success: bool) {
        self.report(message, success);
    }

    fn report(&mut self, message: &str, success: bool) {
        self.finished = true;
        let mut stdout = io::stdout();
        let _ = writeln!(
            stdout,
            "{}{}",
            format_outcome(message, success),
            format_elapsed(self.elapsed())
        );
        let _ = stdout.flush();
    }
}

impl Drop for Stage {
    fn drop(&mut self) {
        if !self.finished {
            self.report("Aborted", false);
        }
    }
}
