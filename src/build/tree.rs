use crate::config::{BuildConfig, CopyGroup};
use crate::error::Result;
use crate::warning::PipelineWarning;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Where the build happens, all paths resolved against the project root.
///
/// The build tree is recreated from scratch on every run; nothing inside it
/// survives between runs.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildLayout {
    root: PathBuf,
    build_dir: PathBuf,
    staging_dir: PathBuf,
}

/// Outcome of copying one [`CopyGroup`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CopyReport {
    pub files: usize,
    pub warnings: Vec<PipelineWarning>,
}

impl BuildLayout {
    pub fn new(root: impl Into<PathBuf>, config: &BuildConfig) -> Self {
        let root = root.into();
        BuildLayout {
            build_dir: root.join(&config.build_dir),
            staging_dir: root.join(&config.staging_dir),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Remove the build and staging dirs plus `extra` leftovers.
    ///
    /// Paths that do not exist are fine.
    pub fn clean(&self, extra: &[PathBuf]) -> Result<()> {
        let extra = extra.iter().map(|p| self.root.join(p));
        for path in [self.build_dir.clone(), self.staging_dir.clone()]
            .into_iter()
            .chain(extra)
        {
            remove_path(&path)?;
        }
        Ok(())
    }

    /// Create the (empty) build dir.
    pub fn create(&self) -> Result<()> {
        fs::create_dir_all(&self.build_dir)?;
        Ok(())
    }

    /// Copy every match of `group` into the build tree, keeping paths
    /// relative to the root. Directories are copied recursively.
    pub fn copy_group(&self, name: &str, group: &CopyGroup) -> Result<CopyReport> {
        let mut report = CopyReport::default();

        for (pattern, matches) in expand_globs(&self.root, &group.patterns)? {
            let kept: Vec<PathBuf> = matches
                .into_iter()
                .filter(|rel| !self.is_excluded(rel, &group.exclude))
                .collect();

            if kept.is_empty() {
                report.warnings.push(PipelineWarning::EmptyGlob {
                    group: name.to_string(),
                    pattern,
                });
                continue;
            }

            for rel in kept {
                report.files += copy_entry(&self.root.join(&rel), &self.build_dir.join(&rel))?;
            }
        }

        Ok(report)
    }

    /// Every file (not directory) reachable from the group's matches.
    pub fn collect_files(&self, group: &CopyGroup) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for (_, matches) in expand_globs(&self.root, &group.patterns)? {
            for rel in matches {
                if self.is_excluded(&rel, &group.exclude) {
                    continue;
                }
                for entry in WalkDir::new(self.root.join(&rel)).sort_by_file_name() {
                    let entry = entry.map_err(std::io::Error::from)?;
                    if entry.file_type().is_file() {
                        files.push(entry.into_path());
                    }
                }
            }
        }

        Ok(files)
    }

    fn is_excluded(&self, rel: &Path, exclude: &[PathBuf]) -> bool {
        let abs = self.root.join(rel);
        abs.starts_with(&self.build_dir)
            || abs.starts_with(&self.staging_dir)
            || exclude.iter().any(|e| rel.starts_with(e))
    }
}

/// Expand patterns relative to `root`, in glob order, as root-relative paths.
///
/// Each pattern is returned with its matches, which may be empty.
pub fn expand_globs(root: &Path, patterns: &[String]) -> Result<Vec<(String, Vec<PathBuf>)>> {
    let escaped_root = glob::Pattern::escape(&root.to_string_lossy());
    let mut expanded = Vec::with_capacity(patterns.len());

    for pattern in patterns {
        let full = format!("{}/{}", escaped_root, pattern);
        let mut matches = Vec::new();
        for entry in glob::glob(&full)? {
            let path = entry.map_err(glob::GlobError::into_error)?;
            let rel = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            matches.push(rel);
        }
        expanded.push((pattern.clone(), matches));
    }

    Ok(expanded)
}

fn remove_path(path: &Path) -> Result<()> {
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) => Err(e),
    };
    match result {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

/// Copy a file or a whole directory, returning the number of files written.
fn copy_entry(src: &Path, dst: &Path) -> Result<usize> {
    if src.is_file() {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src, dst)?;
        return Ok(1);
    }

    let mut copied = 0;
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}
