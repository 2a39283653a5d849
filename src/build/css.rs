//! Stylesheet pipeline: concatenate, drop unused rules, minify, install.
//!
//! Dead-code elimination scans the real template markup so only selectors
//! the site renders survive into the shipped stylesheet.

use crate::build::tree::{expand_globs, BuildLayout};
use crate::config::{CopyGroup, CssConfig};
use crate::error::{Result, SitePublishError};
use crate::tools::command::Cmd;
use std::fs;
use std::path::{Path, PathBuf};

/// Concatenation of every source stylesheet
pub const SUM_FILE: &str = "sum.css";
/// Copy of the sum that dead-code elimination rewrites in place
pub const DCE_FILE: &str = "sum-dce.css";
/// Minifier output
pub const MIN_FILE: &str = "sum-min.css";

/// Removes rules whose selectors never appear in the content files.
///
/// Implementations rewrite `stylesheet` in place, writing the result into
/// `out_dir` under the same file name.
pub trait DeadCodeEliminator {
    fn eliminate(&self, stylesheet: &Path, content: &[PathBuf], out_dir: &Path) -> Result<()>;
}

/// Produces a minified copy of `input` at `output`.
pub trait Minifier {
    fn minify(&self, input: &Path, output: &Path) -> Result<()>;
}

/// The `purgecss` CLI
#[derive(Debug, Clone)]
pub struct PurgeCss {
    pub command: String,
}

impl DeadCodeEliminator for PurgeCss {
    fn eliminate(&self, stylesheet: &Path, content: &[PathBuf], out_dir: &Path) -> Result<()> {
        let cmd = Cmd::new(&self.command)
            .arg("--css")
            .arg(stylesheet)
            .arg("--content")
            .args(content)
            .arg("-o")
            .arg(out_dir);

        let output = cmd.run_checked()?;

        // purgecss reports unreadable content files on stderr but still exits 0
        if !output.stderr.trim().is_empty() {
            return Err(SitePublishError::ToolFailed {
                command: cmd.display(),
                code: output.code,
                output: output.stderr,
            });
        }
        Ok(())
    }
}

/// The `postcss` CLI driven by a plugin config file.
///
/// Plugins are resolved from the global module dir handed over in `NODE_PATH`.
#[derive(Debug, Clone)]
pub struct PostCss {
    pub command: String,
    pub config: PathBuf,
    pub node_path: PathBuf,
}

impl Minifier for PostCss {
    fn minify(&self, input: &Path, output: &Path) -> Result<()> {
        Cmd::new(&self.command)
            .arg(input)
            .arg("--config")
            .arg(&self.config)
            .arg("--no-map")
            .arg("-o")
            .arg(output)
            .env("NODE_PATH", &self.node_path)
            .run_checked()?;
        Ok(())
    }
}

/// Concatenate every file matched by `patterns`, in glob order, byte for byte.
pub fn concatenate(root: &Path, patterns: &[String]) -> Result<Vec<u8>> {
    let mut sum = Vec::new();
    for (_, matches) in expand_globs(root, patterns)? {
        for rel in matches {
            let path = root.join(rel);
            if path.is_file() {
                sum.extend(fs::read(path)?);
            }
        }
    }
    Ok(sum)
}

/// One run of the stylesheet pipeline.
///
/// Steps are exposed individually so the orchestrator can report each one;
/// [`CssPipeline::run`] performs them all in order.
pub struct CssPipeline<'a> {
    layout: &'a BuildLayout,
    config: &'a CssConfig,
    templates: &'a CopyGroup,
    eliminator: &'a dyn DeadCodeEliminator,
    minifier: &'a dyn Minifier,
}

impl<'a> CssPipeline<'a> {
    pub fn new(
        layout: &'a BuildLayout,
        config: &'a CssConfig,
        templates: &'a CopyGroup,
        eliminator: &'a dyn DeadCodeEliminator,
        minifier: &'a dyn Minifier,
    ) -> Self {
        CssPipeline {
            layout,
            config,
            templates,
            eliminator,
            minifier,
        }
    }

    fn staged(&self, name: &str) -> PathBuf {
        self.layout.staging_dir().join(name)
    }

    /// Final stylesheet location inside the build tree
    pub fn output_path(&self) -> PathBuf {
        self.layout.build_dir().join(&self.config.output)
    }

    /// Write the concatenated sum and its dead-code-elimination copy.
    pub fn stage_sum(&self) -> Result<usize> {
        let sum = concatenate(self.layout.root(), &self.config.stylesheets)?;
        fs::create_dir_all(self.layout.staging_dir())?;
        fs::write(self.staged(SUM_FILE), &sum)?;
        fs::copy(self.staged(SUM_FILE), self.staged(DCE_FILE))?;
        Ok(sum.len())
    }

    /// Strip rules unused by any template file.
    pub fn eliminate_dead_code(&self) -> Result<usize> {
        let content = self.layout.collect_files(self.templates)?;
        self.eliminator.eliminate(
            &self.staged(DCE_FILE),
            &content,
            self.layout.staging_dir(),
        )?;
        Ok(content.len())
    }

    pub fn minify(&self) -> Result<()> {
        self.minifier
            .minify(&self.staged(DCE_FILE), &self.staged(MIN_FILE))
    }

    /// Copy the minified stylesheet into the build tree and drop the
    /// staging dir unless asked to keep it.
    pub fn install(&self) -> Result<PathBuf> {
        let output = self.output_path();
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(self.staged(MIN_FILE), &output)?;

        if !self.config.keep_staging {
            fs::remove_dir_all(self.layout.staging_dir())?;
        }
        Ok(output)
    }

    pub fn run(&self) -> Result<PathBuf> {
        self.stage_sum()?;
        self.eliminate_dead_code()?;
        self.minify()?;
        self.install()
    }
}
