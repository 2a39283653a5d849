use crate::error::{Result, SitePublishError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semantic version triple used to gate minimum tool and package versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    /// Create a new version
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }

    /// Find the first `<prefix>X.Y.Z` in free-form tool output.
    ///
    /// Anything around the match is ignored, so `"npm v6.4.1 (linux)"` with
    /// prefix `"v"` yields `6.4.1`. Candidates whose components overflow are
    /// skipped in favour of the next match.
    ///
    /// ```ignore
    /// assert_eq!(Version::extract("v8.11.3\n", "v"), Some(Version::new(8, 11, 3)));
    /// assert_eq!(Version::extract("no digits here", ""), None);
    /// ```
    pub fn extract(text: &str, prefix: &str) -> Option<Self> {
        let pattern = format!(r"{}(\d+)\.(\d+)\.(\d+)", regex::escape(prefix));
        let re = Regex::new(&pattern).ok()?;

        let found = re.captures_iter(text).find_map(|caps| {
            let major = caps[1].parse().ok()?;
            let minor = caps[2].parse().ok()?;
            let patch = caps[3].parse().ok()?;
            Some(Version::new(major, minor, patch))
        });
        found
    }
}

impl FromStr for Version {
    type Err = SitePublishError;

    /// Strict `X.Y.Z`, optionally prefixed by `v` or `V`.
    fn from_str(s: &str) -> Result<Self> {
        let clean = s.trim().trim_start_matches('v').trim_start_matches('V');

        let parts: Vec<&str> = clean.split('.').collect();
        if parts.len() != 3 {
            return Err(SitePublishError::config(format!(
                "Invalid version format: '{}' - expected X.Y.Z",
                s
            )));
        }

        let component = |part: &str, name: &str| {
            part.parse::<u32>().map_err(|_| {
                SitePublishError::config(format!("Invalid {} version in '{}': {}", name, s, part))
            })
        };

        Ok(Version {
            major: component(parts[0], "major")?,
            minor: component(parts[1], "minor")?,
            patch: component(parts[2], "patch")?,
        })
    }
}

impl TryFrom<String> for Version {
    type Error = SitePublishError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_plain() {
        assert_eq!(Version::extract("6.4.1\n", ""), Some(Version::new(6, 4, 1)));
    }

    #[test]
    fn test_extract_with_prefix() {
        assert_eq!(
            Version::extract("v8.11.3\n", "v"),
            Some(Version::new(8, 11, 3))
        );
    }

    #[test]
    fn test_extract_ignores_surrounding_text() {
        let output = "purgecss version 1.4.0 (built 2019-02-01)";
        assert_eq!(Version::extract(output, ""), Some(Version::new(1, 4, 0)));
    }

    #[test]
    fn test_extract_prefix_is_literal() {
        // '.' in the prefix must not behave as a wildcard
        assert_eq!(
            Version::extract("ax1.2.3 a.1.2.4", "a."),
            Some(Version::new(1, 2, 4))
        );
        assert_eq!(Version::extract("release-2.0.0", "v"), None);
    }

    #[test]
    fn test_extract_first_match_wins() {
        assert_eq!(
            Version::extract("node 10.1.0 npm 6.4.1", ""),
            Some(Version::new(10, 1, 0))
        );
    }

    #[test]
    fn test_extract_skips_overflowing_candidate() {
        let output = "build 99999999999.0.0 version 2.3.4";
        assert_eq!(Version::extract(output, ""), Some(Version::new(2, 3, 4)));
    }

    #[test]
    fn test_extract_none() {
        assert_eq!(Version::extract("command not understood", ""), None);
        assert_eq!(Version::extract("1.2", ""), None);
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let a = Version::new(1, 2, 3);
        let b = Version::new(1, 3, 0);
        let c = Version::new(2, 0, 0);
        assert!(a < b);
        assert!(b < c);
        assert!(a < c);
        assert!(Version::new(1, 10, 0) > Version::new(1, 9, 99));
        assert_eq!(Version::new(4, 0, 0).cmp(&Version::new(4, 0, 0)), std::cmp::Ordering::Equal);
    }

    #[test]
    fn test_parse_strict() {
        assert_eq!("5.6.0".parse::<Version>().unwrap(), Version::new(5, 6, 0));
        assert_eq!("v8.11.0".parse::<Version>().unwrap(), Version::new(8, 11, 0));
        assert!("1.2".parse::<Version>().is_err());
        assert!("1.2.3.4".parse::<Version>().is_err());
        assert!("1.x.3".parse::<Version>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Version::new(1, 0, 1).to_string(), "1.0.1");
    }
}
