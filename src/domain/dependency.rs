use crate::domain::Version;
use crate::error::{Result, SitePublishError};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Installed global packages, name -> version.
///
/// Built once per run from the package manager listing and only read after that.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyMap {
    packages: BTreeMap<String, Version>,
}

#[derive(Debug, Deserialize)]
struct NpmListing {
    #[serde(default)]
    dependencies: BTreeMap<String, NpmPackage>,
}

#[derive(Debug, Deserialize)]
struct NpmPackage {
    #[serde(default)]
    version: Option<String>,
}

impl DependencyMap {
    /// Parse the output of `npm -g ls --depth 0 --json`.
    ///
    /// A listing without a `dependencies` object is an empty map. A package
    /// whose version string holds no `X.Y.Z` is an error.
    pub fn from_npm_json(json: &str) -> Result<Self> {
        let listing: NpmListing = serde_json::from_str(json)?;

        let mut packages = BTreeMap::new();
        for (name, package) in listing.dependencies {
            let raw = package.version.unwrap_or_default();
            let version = Version::extract(&raw, "")
                .ok_or_else(|| SitePublishError::unparseable_version(name.as_str(), raw))?;
            packages.insert(name, version);
        }

        Ok(DependencyMap { packages })
    }

    pub fn get(&self, name: &str) -> Option<Version> {
        self.packages.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Check that `name` is installed at `minimum` or newer.
    ///
    /// The boundary is inclusive: an exact match passes.
    pub fn check(&self, name: &str, minimum: Version) -> Result<Version> {
        let found = self
            .get(name)
            .ok_or_else(|| SitePublishError::dependency_missing(name))?;

        if found < minimum {
            return Err(SitePublishError::BelowMinimum {
                name: name.to_string(),
                found,
                required: minimum,
            });
        }

        Ok(found)
    }
}

impl FromIterator<(String, Version)> for DependencyMap {
    fn from_iter<I: IntoIterator<Item = (String, Version)>>(iter: I) -> Self {
        DependencyMap {
            packages: iter.into_iter().collect(),
        }
    }
}
