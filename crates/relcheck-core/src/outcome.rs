use std::fmt;

/// Settled outcome of an update check or an artifact download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateResult {
    NoUpdate,
    UpdateAvailable,
    DownloadSucceeded,
    DownloadFailed,
    CheckFailed,
    RepositoryNotFound,
    RepositoryHasNoReleases,
    LatestReleaseNotSemver,
    RateLimited,
    RemoteServerError,
}

impl UpdateResult {
    #[must_use]
    pub fn is_update_available(self) -> bool {
        matches!(self, Self::UpdateAvailable)
    }

    /// Whether the outcome reports a problem rather than a usable answer.
    #[must_use]
    pub fn is_failure(self) -> bool {
        !matches!(self, Self::NoUpdate | Self::UpdateAvailable | Self::DownloadSucceeded)
    }
}

impl fmt::Display for UpdateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoUpdate => "already running the latest release",
            Self::UpdateAvailable => "a newer release is available",
            Self::DownloadSucceeded => "release artifact downloaded",
            Self::DownloadFailed => "release artifact download failed",
            Self::CheckFailed => "update check failed",
            Self::RepositoryNotFound => "repository not found",
            Self::RepositoryHasNoReleases => "repository has no releases",
            Self::LatestReleaseNotSemver => "latest release tag is not a semantic version",
            Self::RateLimited => "release host denied the request (rate limited)",
            Self::RemoteServerError => "release host reported a server error",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::UpdateResult;

    #[test]
    fn successful_outcomes_are_not_failures() {
        assert!(!UpdateResult::NoUpdate.is_failure());
        assert!(!UpdateResult::UpdateAvailable.is_failure());
        assert!(!UpdateResult::DownloadSucceeded.is_failure());
        assert!(UpdateResult::RateLimited.is_failure());
        assert!(UpdateResult::DownloadFailed.is_failure());
    }

    #[test]
    fn display_describes_outcome() {
        assert_eq!(
            UpdateResult::RepositoryHasNoReleases.to_string(),
            "repository has no releases"
        );
    }
}
