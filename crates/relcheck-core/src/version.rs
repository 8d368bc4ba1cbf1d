use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Expected [v]MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD], got: {input}")]
pub struct VersionParseError {
    pub input: String,
}

/// A release version in `MAJOR.MINOR.PATCH[-PRERELEASE]` form.
///
/// Build metadata is dropped while parsing. The prerelease tag is kept as an
/// opaque string; [`Version::compare_to`] only looks at whether it is present.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<String>,
}

impl Version {
    #[must_use]
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: None,
        }
    }

    #[must_use]
    pub fn with_prerelease(major: u64, minor: u64, patch: u64, prerelease: &str) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: Some(prerelease.to_string()),
        }
    }

    /// Parse a version string, accepting an optional `v`/`V` prefix.
    ///
    /// # Errors
    /// Returns an error when the text does not follow the semantic-version
    /// grammar.
    pub fn parse(text: &str) -> Result<Self, VersionParseError> {
        let core = text.strip_prefix(['v', 'V']).unwrap_or(text);

        let parsed = semver::Version::parse(core).map_err(|_| VersionParseError {
            input: text.to_string(),
        })?;

        let prerelease = if parsed.pre.is_empty() {
            None
        } else {
            Some(parsed.pre.as_str().to_string())
        };

        Ok(Self {
            major: parsed.major,
            minor: parsed.minor,
            patch: parsed.patch,
            prerelease,
        })
    }

    #[must_use]
    pub fn is_well_formed(text: &str) -> bool {
        Self::parse(text).is_ok()
    }

    /// Release ordering used for update decisions.
    ///
    /// Compares major, minor and patch numerically. On a tie, a version without
    /// a prerelease tag ranks above one that has a tag; two tagged versions
    /// compare equal here regardless of the tag text.
    #[must_use]
    pub fn compare_to(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| match (&self.prerelease, &other.prerelease) {
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                _ => Ordering::Equal,
            })
    }

    #[must_use]
    pub fn is_newer_than(&self, other: &Self) -> bool {
        self.compare_to(other) == Ordering::Greater
    }
}

// Falls back to the tag text so `Ord` stays consistent with `Eq`.
impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare_to(other).then_with(|| self.prerelease.cmp(&other.prerelease))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(prerelease) = &self.prerelease {
            write!(f, "-{prerelease}")?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::Version;

    #[test]
    fn parses_plain_and_prefixed_versions() {
        for text in ["1.2.3", "v1.2.3", "V1.2.3"] {
            let version = Version::parse(text).expect("version should parse");
            assert_eq!((version.major, version.minor, version.patch), (1, 2, 3));
            assert_eq!(version.prerelease, None);
        }
    }

    #[test]
    fn keeps_prerelease_and_drops_build_metadata() {
        let version = Version::parse("v2.0.1-rc.1+build5").expect("version should parse");

        assert_eq!((version.major, version.minor, version.patch), (2, 0, 1));
        assert_eq!(version.prerelease.as_deref(), Some("rc.1"));
        assert_eq!(version.to_string(), "2.0.1-rc.1");

        let build_only = Version::parse("3.4.5+20240101").expect("version should parse");
        assert_eq!(build_only, Version::new(3, 4, 5));
    }

    #[test]
    fn rejects_malformed_versions() {
        for text in ["1.2", "abc", "1.2.x", "", "v", "1.2.3.4", "1.2.3-", " 1.2.3", "vv1.2.3"] {
            assert!(Version::parse(text).is_err(), "{text:?} should not parse");
            assert!(!Version::is_well_formed(text), "{text:?} should be malformed");
        }
    }

    #[test]
    fn parse_error_mentions_input() {
        let error = Version::parse("not-a-version").expect_err("parse should fail");
        assert!(error.to_string().contains("not-a-version"));
    }

    #[test]
    fn numeric_components_order_releases() {
        let ascending = [
            Version::new(1, 2, 3),
            Version::new(1, 2, 4),
            Version::new(1, 3, 0),
            Version::new(2, 0, 0),
        ];

        for pair in ascending.windows(2) {
            assert_eq!(pair[0].compare_to(&pair[1]), Ordering::Less);
            assert_eq!(pair[1].compare_to(&pair[0]), Ordering::Greater);
            assert!(pair[1].is_newer_than(&pair[0]));
        }
    }

    #[test]
    fn untagged_release_ranks_above_prerelease() {
        let rc = Version::with_prerelease(1, 0, 0, "rc1");
        let release = Version::new(1, 0, 0);

        assert_eq!(rc.compare_to(&release), Ordering::Less);
        assert!(release.is_newer_than(&rc));
        assert_eq!(release.compare_to(&Version::new(1, 0, 0)), Ordering::Equal);
        assert!(!release.is_newer_than(&Version::new(1, 0, 0)));
    }

    #[test]
    fn prerelease_text_is_not_part_of_update_ordering() {
        let rc1 = Version::with_prerelease(1, 0, 0, "rc1");
        let rc2 = Version::with_prerelease(1, 0, 0, "rc2");

        assert_eq!(rc1.compare_to(&rc2), Ordering::Equal);
        assert!(!rc2.is_newer_than(&rc1));
        assert_ne!(rc1, rc2);
        assert!(rc1 < rc2);
    }

    #[test]
    fn from_str_matches_parse() {
        let version: Version = "v0.9.12".parse().expect("version should parse");
        assert_eq!(version, Version::new(0, 9, 12));
    }
}
