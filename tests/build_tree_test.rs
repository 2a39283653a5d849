use site_publish::build::BuildLayout;
use site_publish::config::{BuildConfig, CopyGroup};
use site_publish::warning::PipelineWarning;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Every file under `dir`, relative to it, in name order
fn tree(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(dir).unwrap().to_path_buf())
        .collect()
}

fn site() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "app.py", "print('app')");
    write(root, "build.py", "print('build')");
    write(root, "util/helpers.py", "x = 1");
    write(root, "requirements.txt", "flask\n");
    write(root, "static/img/logo.png", "png");
    write(root, "static/css/main.css", ".a{}");
    write(root, "templates/index.html", "<div class=\"a\"></div>");
    write(root, "templates/partials/nav.html", "<nav></nav>");
    dir
}

fn build_all(layout: &BuildLayout, config: &BuildConfig) -> Vec<PipelineWarning> {
    layout.clean(&config.clean).unwrap();
    layout.create().unwrap();
    let mut warnings = Vec::new();
    for group in [&config.static_files, &config.sources, &config.templates] {
        warnings.extend(layout.copy_group("group", group).unwrap().warnings);
    }
    warnings
}

#[test]
fn test_default_groups_produce_site_tree() {
    let dir = site();
    let config = BuildConfig::default();
    let layout = BuildLayout::new(dir.path(), &config);

    let warnings = build_all(&layout, &config);
    assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);

    assert_eq!(
        tree(layout.build_dir()),
        vec![
            PathBuf::from("app.py"),
            PathBuf::from("requirements.txt"),
            PathBuf::from("static/img/logo.png"),
            PathBuf::from("templates/index.html"),
            PathBuf::from("templates/partials/nav.html"),
            PathBuf::from("util/helpers.py"),
        ]
    );
}

#[test]
fn test_excluded_paths_are_not_copied() {
    let dir = site();
    let config = BuildConfig::default();
    let layout = BuildLayout::new(dir.path(), &config);
    build_all(&layout, &config);

    assert!(!layout.build_dir().join("build.py").exists());
    assert!(!layout.build_dir().join("static/css").exists());
}

#[test]
fn test_rebuild_is_idempotent() {
    let dir = site();
    let config = BuildConfig::default();
    let layout = BuildLayout::new(dir.path(), &config);

    build_all(&layout, &config);
    let first = tree(layout.build_dir());

    // Stray output from an earlier run must not survive
    write(layout.build_dir(), "stale.txt", "old");
    write(layout.staging_dir(), "sum.css", "old");
    build_all(&layout, &config);

    assert_eq!(tree(layout.build_dir()), first);
    assert!(!layout.staging_dir().exists());
}

#[test]
fn test_clean_removes_extra_leftovers() {
    let dir = site();
    write(dir.path(), "static/video_thumbnails/thumb/a.jpg", "jpg");
    let config = BuildConfig::default();
    let layout = BuildLayout::new(dir.path(), &config);

    layout.clean(&config.clean).unwrap();
    assert!(!dir.path().join("static/video_thumbnails/thumb").exists());
    assert!(dir.path().join("static/img/logo.png").exists());
}

#[test]
fn test_empty_glob_is_warning() {
    let dir = site();
    let config = BuildConfig::default();
    let layout = BuildLayout::new(dir.path(), &config);
    layout.create().unwrap();

    let group = CopyGroup::new(["*.py", "fonts/*"]);
    let report = layout.copy_group("Copying Python Files", &group).unwrap();

    assert_eq!(report.files, 1);
    assert_eq!(
        report.warnings,
        vec![PipelineWarning::EmptyGlob {
            group: "Copying Python Files".to_string(),
            pattern: "fonts/*".to_string(),
        }]
    );
}

#[test]
fn test_build_dir_is_never_copied_into_itself() {
    let dir = site();
    let config = BuildConfig::default();
    let layout = BuildLayout::new(dir.path(), &config);
    build_all(&layout, &config);

    let report = layout.copy_group("everything", &CopyGroup::new(["*"])).unwrap();
    assert!(report.files > 0);
    assert!(!layout.build_dir().join("build").exists());
}
