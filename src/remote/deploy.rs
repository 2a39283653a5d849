//! Remote deploy sequence.
//!
//! stop service -> upload build tree -> update dependencies -> start service
//!
//! Once the service has been stopped, a restart is attempted no matter which
//! later step fails, and the error says whether the restart worked.

use crate::config::DeployConfig;
use crate::error::{Result, SitePublishError};
use crate::remote::{remote_join, RemoteSession};
use crate::ui::Stage;
use std::fs;
use std::path::{Path, PathBuf};

/// Service control verb substituted for `{action}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Stop,
    Start,
}

impl ServiceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceAction::Stop => "stop",
            ServiceAction::Start => "start",
        }
    }

    fn label(&self, service: &str) -> String {
        match self {
            ServiceAction::Stop => format!("Disabling {}", service),
            ServiceAction::Start => format!("Enabling {}", service),
        }
    }
}

/// What to upload where, and how to drive the remote service
#[derive(Debug, Clone, PartialEq)]
pub struct DeployPlan {
    pub local_dir: PathBuf,
    pub remote_path: String,
    pub service: Option<String>,
    pub service_control: String,
    pub dependency_update: String,
}

/// Result of a complete deploy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployReport {
    pub files_uploaded: usize,
}

const UPLOAD_STEP: &str = "Copying Build";
const UPDATE_STEP: &str = "Updating venv";

impl DeployPlan {
    pub fn new(config: &DeployConfig, local_dir: impl Into<PathBuf>, remote_path: impl Into<String>) -> Self {
        DeployPlan {
            local_dir: local_dir.into(),
            remote_path: remote_path.into(),
            service: config.service.clone(),
            service_control: config.service_control.clone(),
            dependency_update: config.dependency_update.clone(),
        }
    }

    /// Privileged service control command; the password arrives on stdin.
    pub fn service_command(&self, action: ServiceAction) -> Option<String> {
        let service = self.service.as_deref()?;
        let control = self
            .service_control
            .replace("{action}", action.as_str())
            .replace("{service}", service);
        Some(format!("sudo -S -p '' {}", control))
    }

    pub fn dependency_command(&self) -> String {
        self.dependency_update
            .replace("{path}", self.remote_path.trim_end_matches('/'))
    }
}

/// Recursively upload `local` into `remote`, creating directories as needed.
///
/// Entries are visited in name order. Returns the number of files uploaded.
pub fn upload_tree<S: RemoteSession + ?Sized>(
    session: &mut S,
    local: &Path,
    remote: &str,
) -> Result<usize> {
    session.mkdir(remote)?;

    let mut entries = fs::read_dir(local)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    let mut uploaded = 0;
    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        let target = remote_join(remote, &name);

        if entry.file_type()?.is_dir() {
            uploaded += upload_tree(session, &entry.path(), &target)?;
        } else {
            session.upload_file(&entry.path(), &target)?;
            uploaded += 1;
        }
    }
    Ok(uploaded)
}

fn control_service<S: RemoteSession + ?Sized>(
    session: &mut S,
    plan: &DeployPlan,
    action: ServiceAction,
    password: &str,
) -> Option<Result<()>> {
    let service = plan.service.as_deref()?;
    let command = plan.service_command(action)?;
    let input = format!("{}\n", password);

    Some(Stage::run(
        action.label(service),
        || session.exec_checked(&command, Some(&input)).map(|_| ()),
        |_| "Done".to_string(),
    ))
}

/// Upload and update, reporting which step failed.
fn apply<S: RemoteSession + ?Sized>(
    session: &mut S,
    plan: &DeployPlan,
) -> std::result::Result<usize, (&'static str, SitePublishError)> {
    let uploaded = Stage::run(
        UPLOAD_STEP,
        || upload_tree(session, &plan.local_dir, &plan.remote_path),
        |n| format!("{} files", n),
    )
    .map_err(|e| (UPLOAD_STEP, e))?;

    let command = plan.dependency_command();
    Stage::run(
        UPDATE_STEP,
        || session.exec_checked(&command, None).map(|_| ()),
        |_| "Done".to_string(),
    )
    .map_err(|e| (UPDATE_STEP, e))?;

    Ok(uploaded)
}

/// Run the deploy sequence on an open session.
///
/// A failure to stop the service is [SitePublishError::DeployNotStarted];
/// any later failure is [SitePublishError::DeployPartiallyApplied], raised
/// after a restart has been attempted.
pub fn deploy<S: RemoteSession + ?Sized>(
    session: &mut S,
    plan: &DeployPlan,
    password: &str,
) -> Result<DeployReport> {
    if let Some(Err(e)) = control_service(session, plan, ServiceAction::Stop, password) {
        return Err(SitePublishError::DeployNotStarted(Box::new(e)));
    }

    let applied = apply(session, plan);
    let restarted = control_service(session, plan, ServiceAction::Start, password);

    match (applied, restarted) {
        (Ok(files_uploaded), None | Some(Ok(()))) => Ok(DeployReport { files_uploaded }),
        (Ok(_), Some(Err(e))) => Err(SitePublishError::DeployPartiallyApplied {
            step: ServiceAction::Start.label(plan.service.as_deref().unwrap_or_default()),
            service_restarted: false,
            source: Box::new(e),
        }),
        (Err((step, e)), restarted) => Err(SitePublishError::DeployPartiallyApplied {
            step: step.to_string(),
            service_restarted: matches!(restarted, Some(Ok(()))),
            source: Box::new(e),
        }),
    }
}

/// [deploy], then close the session whatever the outcome.
///
/// A deploy error takes precedence over an error while closing.
pub fn deploy_and_close<S: RemoteSession + ?Sized>(
    session: &mut S,
    plan: &DeployPlan,
    password: &str,
) -> Result<DeployReport> {
    let result = deploy(session, plan, password);
    let closed = session.close();
    let report = result?;
    closed?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> DeployPlan {
        DeployPlan::new(&DeployConfig::default(), "build", "/srv/site/")
    }

    #[test]
    fn test_service_command() {
        assert_eq!(
            plan().service_command(ServiceAction::Stop).unwrap(),
            "sudo -S -p '' supervisorctl stop connorwfitzgerald.com"
        );
        assert_eq!(
            plan().service_command(ServiceAction::Start).unwrap(),
            "sudo -S -p '' supervisorctl start connorwfitzgerald.com"
        );
    }

    #[test]
    fn test_no_service_no_command() {
        let mut plan = plan();
        plan.service = None;
        assert!(plan.service_command(ServiceAction::Stop).is_none());
    }

    #[test]
    fn test_dependency_command_substitutes_path() {
        let command = plan().dependency_command();
        assert!(command.contains("source /srv/site/venv/bin/activate"));
        assert!(command.contains("pip install -r /srv/site/requirements.txt"));
        assert!(!command.contains("{path}"));
    }
}
