use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::error::QueryError;
use crate::outcome::UpdateResult;
use crate::reporter::Reporter;
use crate::version::Version;

const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubAsset {
    pub browser_download_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRelease {
    pub tag_name: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub assets: Vec<GitHubAsset>,
}

/// The parts of the newest feed entry that matter for an update decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub tag: String,
    pub body: String,
    pub asset_url: Option<String>,
}

impl Release {
    #[must_use]
    pub fn from_feed(release: GitHubRelease, artifact_extension: &str) -> Self {
        let asset_url = release
            .assets
            .into_iter()
            .map(|asset| asset.browser_download_url)
            .find(|url| !url.is_empty() && url.ends_with(artifact_extension));

        Self {
            tag: release.tag_name,
            body: release.body.unwrap_or_default(),
            asset_url,
        }
    }
}

/// Classified result of one release check plus the fields derived from the
/// feed when it could be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub result: UpdateResult,
    pub latest: Option<Version>,
    pub changelog: Option<String>,
    pub asset_url: Option<String>,
}

impl CheckOutcome {
    #[must_use]
    pub fn settled(result: UpdateResult) -> Self {
        Self {
            result,
            latest: None,
            changelog: None,
            asset_url: None,
        }
    }
}

/// One request against a repository's releases feed.
#[derive(Debug, Clone)]
pub struct ReleaseQuery {
    client: reqwest::Client,
    url: reqwest::Url,
    current: Version,
    artifact_extension: String,
    reporter: Reporter,
}

impl ReleaseQuery {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        url: reqwest::Url,
        current: Version,
        artifact_extension: impl Into<String>,
        reporter: Reporter,
    ) -> Self {
        Self {
            client,
            url,
            current,
            artifact_extension: artifact_extension.into(),
            reporter,
        }
    }

    /// Fetch the feed and classify it. Every failure is folded into the
    /// returned outcome.
    pub async fn run(&self) -> CheckOutcome {
        match self.fetch().await {
            Ok(releases) => classify_releases(
                releases,
                &self.current,
                &self.artifact_extension,
                self.reporter,
            ),
            Err(error) => {
                let result = classify_failure(&error);
                report_failure(self.reporter, result, &error);
                CheckOutcome::settled(result)
            }
        }
    }

    async fn fetch(&self) -> Result<Vec<Value>, QueryError> {
        self.reporter.info("Opening connection to API");

        let response = self
            .client
            .get(self.url.clone())
            .header(reqwest::header::ACCEPT, ACCEPT_HEADER)
            .send()
            .await
            .map_err(QueryError::Request)?;

        if !response.status().is_success() {
            let status = response.status();
            let body_snippet = response
                .text()
                .await
                .ok()
                .map(|body| response_snippet(&body, 160))
                .unwrap_or_default();
            return Err(QueryError::HttpStatus {
                status,
                body_snippet,
            });
        }

        let body = response.text().await.map_err(QueryError::Body)?;
        self.reporter.info("Parsing the returned JSON");
        serde_json::from_str(&body).map_err(QueryError::Parse)
    }
}

/// Map a transport failure to an outcome using its HTTP status, if any.
pub(crate) fn classify_failure(error: &QueryError) -> UpdateResult {
    match error.status() {
        Some(StatusCode::FORBIDDEN) => UpdateResult::RateLimited,
        Some(StatusCode::NOT_FOUND) => UpdateResult::RepositoryNotFound,
        Some(status) if status.is_server_error() => UpdateResult::RemoteServerError,
        _ => UpdateResult::CheckFailed,
    }
}

fn report_failure(reporter: Reporter, result: UpdateResult, error: &QueryError) {
    match result {
        UpdateResult::RateLimited => reporter.warn("GitHub denied our HTTP request"),
        UpdateResult::RepositoryNotFound => {
            reporter.warn("The specified repository could not be found");
        }
        UpdateResult::RemoteServerError => reporter.warn("Release host reported a server error"),
        _ => reporter.log_with_cause(log::Level::Error, "Failed to check for updates", error),
    }
}

pub(crate) fn classify_releases(
    releases: Vec<Value>,
    current: &Version,
    artifact_extension: &str,
    reporter: Reporter,
) -> CheckOutcome {
    let Some(first) = releases.into_iter().next() else {
        reporter.warn("Appears there were no releases");
        return CheckOutcome::settled(UpdateResult::RepositoryHasNoReleases);
    };

    let release = match serde_json::from_value::<GitHubRelease>(first) {
        Ok(release) => Release::from_feed(release, artifact_extension),
        Err(error) => {
            reporter.log_with_cause(
                log::Level::Error,
                "Latest release entry is malformed",
                &error,
            );
            return CheckOutcome::settled(UpdateResult::CheckFailed);
        }
    };

    let Ok(latest) = Version::parse(&release.tag) else {
        reporter.warn(format!("Release tag {} is not semver compliant", release.tag));
        return CheckOutcome::settled(UpdateResult::LatestReleaseNotSemver);
    };

    let result = if latest.is_newer_than(current) {
        reporter.info(format!("Found a semver compliant update: {latest}"));
        UpdateResult::UpdateAvailable
    } else {
        reporter.info("The current version is the latest version available");
        UpdateResult::NoUpdate
    };

    CheckOutcome {
        result,
        latest: Some(latest),
        changelog: Some(release.body),
        asset_url: release.asset_url,
    }
}

fn response_snippet(body: &str, max_chars: usize) -> String {
    let snippet: String = body.chars().take(max_chars).collect();
    if snippet.is_empty() {
        String::new()
    } else {
        format!(": {snippet}")
    }
}
