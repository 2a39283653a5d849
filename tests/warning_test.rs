use site_publish::ui;
use site_publish::warning::PipelineWarning;
use std::path::PathBuf;

#[test]
fn test_empty_glob_names_group_and_pattern() {
    let warning = PipelineWarning::EmptyGlob {
        group: "Copying Python Files".to_string(),
        pattern: "util/*.py".to_string(),
    };

    let display_msg = warning.to_string();
    assert!(
        display_msg.contains("Copying Python Files"),
        "Message should name the group, got: {}",
        display_msg
    );
    assert!(
        display_msg.contains("util/*.py"),
        "Message should name the pattern, got: {}",
        display_msg
    );
}

#[test]
fn test_no_known_hosts_names_file() {
    let warning = PipelineWarning::NoKnownHosts {
        path: PathBuf::from("/srv/site/known_hosts"),
        fallback: PathBuf::from("/home/deploy/.ssh/known_hosts"),
    };
    assert!(warning.to_string().contains("/srv/site/known_hosts"));
    assert!(warning.to_string().contains("/home/deploy/.ssh/known_hosts"));
}

#[test]
fn test_warning_equality() {
    assert_eq!(
        PipelineWarning::DeployWithoutService,
        PipelineWarning::DeployWithoutService
    );
    assert_ne!(
        PipelineWarning::DeployWithoutService,
        PipelineWarning::NoKnownHosts {
            path: PathBuf::from("known_hosts"),
            fallback: PathBuf::from(".ssh/known_hosts"),
        }
    );
}

#[test]
fn test_display_warning_does_not_panic() {
    ui::display_warning(&PipelineWarning::DeployWithoutService);
    ui::display_warning(&PipelineWarning::EmptyGlob {
        group: "Copy static files".to_string(),
        pattern: "static/*".to_string(),
    });
}
