//! Package manager queries: global listing and module resolution path.

use crate::domain::DependencyMap;
use crate::error::Result;
use crate::tools::command::Cmd;
use std::path::{Path, PathBuf};

/// `<pm> -g ls --depth 0 --json`, parsed into name -> version
pub fn list_global(package_manager: &str) -> Result<DependencyMap> {
    let output = Cmd::new(package_manager)
        .args(["-g", "ls", "--depth", "0", "--json"])
        .run_checked()?;

    DependencyMap::from_npm_json(&output.stdout)
}

/// `<pm> config get prefix`
pub fn global_prefix(package_manager: &str) -> Result<PathBuf> {
    let output = Cmd::new(package_manager)
        .args(["config", "get", "prefix"])
        .run_checked()?;

    Ok(PathBuf::from(output.stdout.trim()))
}

/// Directory holding globally installed modules, suitable for `NODE_PATH`
pub fn module_path(prefix: &Path) -> PathBuf {
    if cfg!(windows) {
        prefix.join("node_modules")
    } else {
        prefix.join("lib").join("node_modules")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SitePublishError;

    #[cfg(not(windows))]
    #[test]
    fn test_module_path_unix() {
        assert_eq!(
            module_path(Path::new("/usr")),
            PathBuf::from("/usr/lib/node_modules")
        );
    }

    #[cfg(windows)]
    #[test]
    fn test_module_path_windows() {
        assert_eq!(
            module_path(Path::new(r"C:\npm")),
            PathBuf::from(r"C:\npm\node_modules")
        );
    }

    #[test]
    fn test_list_global_missing_package_manager() {
        assert!(matches!(
            list_global("site-publish-missing-npm"),
            Err(SitePublishError::ToolNotFound { .. })
        ));
    }
}
