//! Main pipeline orchestration logic
//!
//! Preflight checks, local build, then optionally deploy or dev server,
//! strictly in that order. The first failing stage ends the run; nothing in
//! here exits the process, errors are returned to the caller.

use std::path::{Path, PathBuf};

use crate::build::{BuildLayout, CssPipeline, PostCss, PurgeCss};
use crate::config::Config;
use crate::domain::DependencyMap;
use crate::error::{Result, SitePublishError};
use crate::remote::ssh::user_known_hosts;
use crate::remote::{deploy_and_close, DeployPlan, SshSession, SshTarget};
use crate::server::{self, ServerExit};
use crate::tools::{npm, probe, ToolRequirement};
use crate::ui::{self, Stage};
use crate::warning::PipelineWarning;

/// What happens after a successful build
#[derive(Debug, Clone, PartialEq)]
pub enum RunMode {
    Build,
    DevServer,
    Deploy { host: String, path: String },
}

/// Arguments for the pipeline
///
/// Mirrors the CLI Args but in a format suitable for orchestration logic,
/// so the pipeline can be driven without clap.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineArgs {
    /// Project root every configured path is relative to
    pub root: PathBuf,

    /// Skip toolchain and dependency version checks
    pub skip_checks: bool,

    pub mode: RunMode,

    /// Remote sudo password; prompted for when deploying without one
    pub sudo_password: Option<String>,
}

impl PipelineArgs {
    pub fn build(root: impl Into<PathBuf>) -> Self {
        PipelineArgs {
            root: root.into(),
            skip_checks: false,
            mode: RunMode::Build,
            sudo_password: None,
        }
    }
}

/// Result of a successful pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    /// Files copied into the build tree, compiled stylesheet excluded
    pub files_copied: usize,

    /// Compiled stylesheet inside the build tree
    pub stylesheet: PathBuf,

    /// Files uploaded, when deploying
    pub deployed: Option<usize>,

    pub warnings: Vec<PipelineWarning>,
}

fn check_tool(req: &ToolRequirement) -> Result<()> {
    Stage::run(req.label(), || probe::check_tool(req), |v| v.to_string()).map(|_| ())
}

fn global_module_path(config: &Config) -> Result<PathBuf> {
    let prefix = Stage::run(
        "Finding npm prefix",
        || npm::global_prefix(&config.toolchain.package_manager.command),
        |p| p.display().to_string(),
    )?;
    Ok(npm::module_path(&prefix))
}

/// Version and dependency checks. Touches nothing on disk.
///
/// Returns the global module dir the minifier resolves plugins from.
pub fn preflight(config: &Config) -> Result<PathBuf> {
    let toolchain = &config.toolchain;
    let package_manager = toolchain.package_manager.command.as_str();

    check_tool(&toolchain.package_manager)?;
    check_tool(&toolchain.runtime)?;

    let deps: DependencyMap = Stage::run(
        "Retrieving installed npm modules",
        || npm::list_global(package_manager),
        |_| "Done".to_string(),
    )?;

    for package in &toolchain.packages {
        Stage::run(
            format!("npm package '{}' >= {}", package.name, package.minimum),
            || deps.check(&package.name, package.minimum),
            |v| v.to_string(),
        )?;
    }

    for tool in &toolchain.tools {
        check_tool(tool)?;
    }

    let node_path = global_module_path(config)?;
    for plugin in &config.css.plugins {
        Stage::run(
            format!("{} plugin '{}'", config.css.minify_command, plugin),
            || probe::probe_plugin(&config.css.minify_command, plugin, &node_path),
            |_| "Found".to_string(),
        )?;
    }

    Ok(node_path)
}

/// Clean, create and fill the build tree, then compile the stylesheet.
pub fn build_site(config: &Config, layout: &BuildLayout, node_path: &Path) -> Result<PipelineReport> {
    let build = &config.build;
    let mut warnings = Vec::new();
    let mut files_copied = 0;

    Stage::run(
        format!(
            "rm -r {} {}",
            build.build_dir.display(),
            build.staging_dir.display()
        ),
        || layout.clean(&build.clean),
        |_| "Done".to_string(),
    )?;
    Stage::run(
        format!("mkdir {}", build.build_dir.display()),
        || layout.create(),
        |_| "Done".to_string(),
    )?;

    for (name, group) in [
        ("Copy static files", &build.static_files),
        ("Copying Python Files", &build.sources),
        ("Copying Template Files", &build.templates),
    ] {
        let report = Stage::run(name, || layout.copy_group(name, group), |r| {
            format!("{} files", r.files)
        })?;
        files_copied += report.files;
        warnings.extend(report.warnings);
    }

    let eliminator = PurgeCss {
        command: config.css.purge_command.clone(),
    };
    let minifier = PostCss {
        command: config.css.minify_command.clone(),
        config: layout.root().join(&config.css.minify_config),
        node_path: node_path.to_path_buf(),
    };
    let css = CssPipeline::new(layout, &config.css, &build.templates, &eliminator, &minifier);

    Stage::run("Creating sum.css", || css.stage_sum(), |n| format!("{} bytes", n))?;
    Stage::run(
        "CSS Dead Code Elimination",
        || css.eliminate_dead_code(),
        |_| "Done".to_string(),
    )?;
    Stage::run("CSS Minification", || css.minify(), |_| "Done".to_string())?;
    let stylesheet = Stage::run("Copy CSS", || css.install(), |_| "Done".to_string())?;

    for warning in &warnings {
        ui::display_warning(warning);
    }

    Ok(PipelineReport {
        files_copied,
        stylesheet,
        deployed: None,
        warnings,
    })
}

/// Known-hosts file the server key is checked against: the configured one,
/// else the user's own. Having neither is an error.
fn resolve_known_hosts(config: &Config, root: &Path) -> Result<PathBuf> {
    let configured = root.join(&config.deploy.known_hosts);
    if configured.is_file() {
        return Ok(configured);
    }

    match user_known_hosts() {
        Some(fallback) if fallback.is_file() => {
            ui::display_warning(&PipelineWarning::NoKnownHosts {
                path: configured,
                fallback: fallback.clone(),
            });
            Ok(fallback)
        }
        _ => Err(SitePublishError::connection(format!(
            "no known hosts file at {} or in ~/.ssh, refusing to trust the server",
            configured.display()
        ))),
    }
}

/// Parse the target and open a verified session. Every failure here means
/// the remote side was never touched.
pub fn open_session(config: &Config, root: &Path, host: &str) -> Result<SshSession> {
    let connect = || -> Result<SshSession> {
        let target = SshTarget::parse(host, config.deploy.port)?;
        let known_hosts = resolve_known_hosts(config, root)?;

        ui::display_status(&format!(
            "Connecting to {}@{}:{}",
            target.user, target.host, target.port
        ));
        Stage::run(
            "Creating SSH Client",
            || SshSession::connect(&target, &known_hosts),
            |_| "Done".to_string(),
        )
    };
    connect().map_err(|e| SitePublishError::DeployNotStarted(Box::new(e)))
}

fn deploy_site(config: &Config, layout: &BuildLayout, host: &str, path: &str, password: &str) -> Result<usize> {
    if config.deploy.service.is_none() {
        ui::display_warning(&PipelineWarning::DeployWithoutService);
    }

    let mut session = open_session(config, layout.root(), host)?;
    let plan = DeployPlan::new(&config.deploy, layout.build_dir(), path);
    let report = deploy_and_close(&mut session, &plan, password)?;
    Ok(report.files_uploaded)
}

/// Main pipeline
///
/// Orchestrates the entire run:
/// 1. Preflight checks (unless skipped); these never touch the filesystem
/// 2. Build tree and stylesheet
/// 3. Deploy or dev server, depending on the mode
pub fn run_pipeline(args: PipelineArgs, config: &Config) -> Result<PipelineReport> {
    let layout = BuildLayout::new(&args.root, &config.build);

    let build_stage = Stage::begin_block("Starting Build");

    // The prefix is needed by the minifier even when checks are skipped
    let node_path = if args.skip_checks {
        global_module_path(config)?
    } else {
        ui::section_title("General Dependencies");
        preflight(config)?
    };

    ui::section_title("Building site");
    let mut report = build_site(config, &layout, &node_path)?;
    build_stage.succeed("Build Completed");

    match args.mode {
        RunMode::Build => {}
        RunMode::Deploy { host, path } => {
            let password = match args.sudo_password {
                Some(password) => password,
                None => ui::prompt_password("[sudo] password for remote server")
                    .map_err(|e| SitePublishError::config(format!("cannot read password: {}", e)))?,
            };

            let deploy_stage = Stage::begin_block("Starting Deploy");
            report.deployed = Some(deploy_site(config, &layout, &host, &path, &password)?);
            deploy_stage.succeed("Deploy Finished");
        }
        RunMode::DevServer => {
            ui::section_title("Dev Server");
            let stage = Stage::begin("Launching Dev Server");
            match server::launch(&config.server, layout.build_dir()) {
                Ok(ServerExit::Exited) | Ok(ServerExit::Interrupted) => stage.succeed("Closed"),
                Err(e) => {
                    stage.fail(e.to_string());
                    return Err(e);
                }
            }
        }
    }

    Ok(report)
}
