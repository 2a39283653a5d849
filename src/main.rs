use clap::Parser;
use std::path::PathBuf;

use site_publish::cli::{run_pipeline, PipelineArgs, RunMode};
use site_publish::config;
use site_publish::ui;

#[derive(clap::Parser)]
#[command(
    name = "site-publish",
    about = "Build the site, then optionally serve it locally or deploy it over SSH"
)]
struct Args {
    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(
        short = 'C',
        long,
        default_value = ".",
        help = "Project root containing the site sources"
    )]
    root: PathBuf,

    #[arg(long, help = "Skip toolchain and npm package version checks")]
    no_dependency_checking: bool,

    #[arg(
        long,
        conflicts_with = "deploy",
        help = "Run the built site locally after building"
    )]
    release_dev_server: bool,

    #[arg(
        long,
        num_args = 2,
        value_names = ["HOST", "PATH"],
        help = "Deploy the build to [user@]HOST[:port] at remote PATH"
    )]
    deploy: Option<Vec<String>>,

    #[arg(short, long, help = "Print version information")]
    version: bool,
}

impl Args {
    fn mode(&self) -> RunMode {
        match self.deploy.as_deref() {
            Some([host, path]) => RunMode::Deploy {
                host: host.clone(),
                path: path.clone(),
            },
            _ if self.release_dev_server => RunMode::DevServer,
            _ => RunMode::Build,
        }
    }
}

fn main() {
    let args = Args::parse();

    if args.version {
        println!("site-publish {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    // Load configuration
    let config = match config::load_config(args.config.as_deref(), &args.root) {
        Ok(cfg) => cfg,
        Err(e) => {
            ui::display_error(&format!("Error loading config: {}", e));
            std::process::exit(1);
        }
    };

    let pipeline_args = PipelineArgs {
        mode: args.mode(),
        root: args.root,
        skip_checks: args.no_dependency_checking,
        sudo_password: None,
    };

    match run_pipeline(pipeline_args, &config) {
        Ok(report) => {
            let mut summary = format!(
                "Copied {} files, stylesheet at {}",
                report.files_copied,
                report.stylesheet.display()
            );
            if let Some(uploaded) = report.deployed {
                summary.push_str(&format!(", uploaded {} files", uploaded));
            }
            ui::display_success(&summary);
        }
        Err(e) => {
            ui::display_error(&e.to_string());
            std::process::exit(1);
        }
    }
}
