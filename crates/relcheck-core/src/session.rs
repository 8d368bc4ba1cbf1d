use std::path::Path;
use std::sync::{Mutex, OnceLock};

use crossbeam_channel::Receiver;
use log::Level;

use crate::config::UpdaterConfig;
use crate::download::ArtifactDownloader;
use crate::error::ConfigurationError;
use crate::outcome::UpdateResult;
use crate::release::{CheckOutcome, ReleaseQuery};
use crate::reporter::Reporter;
use crate::runtime;
use crate::version::Version;

/// Returned by [`UpdateSession::latest_version`] when the feed yielded no
/// usable version.
pub const LATEST_VERSION_UNAVAILABLE: &str = "Please check result()";

/// One update check against a repository's releases, run in the background.
///
/// Construction returns immediately. Accessors that depend on the check block
/// until the background worker has settled its outcome, with no timeout.
#[derive(Debug)]
pub struct UpdateSession {
    repository: String,
    current: Version,
    config: UpdaterConfig,
    reporter: Reporter,
    pending: Option<Receiver<CheckOutcome>>,
    check: OnceLock<CheckOutcome>,
    download: Mutex<Option<UpdateResult>>,
}

impl UpdateSession {
    /// Start a check with the default configuration.
    ///
    /// # Errors
    /// Returns an error if the repository identifier is malformed or the HTTP
    /// client cannot be built.
    pub fn start(
        current: Version,
        repository: &str,
        verbose: bool,
    ) -> Result<Self, ConfigurationError> {
        Self::start_with_config(current, repository, verbose, UpdaterConfig::default())
    }

    /// Start a check for a version given as text.
    ///
    /// # Errors
    /// Returns an error if `current` is not semver compliant, or for any of
    /// the reasons listed on [`UpdateSession::start`].
    pub fn start_str(
        current: &str,
        repository: &str,
        verbose: bool,
    ) -> Result<Self, ConfigurationError> {
        let current = Version::parse(current).map_err(|error| {
            Reporter::new(verbose).error("Unable to parse semver string");
            ConfigurationError::InvalidVersion { input: error.input }
        })?;
        Self::start(current, repository, verbose)
    }

    /// # Errors
    /// See [`UpdateSession::start`].
    pub fn from_parts(
        major: u64,
        minor: u64,
        patch: u64,
        repository: &str,
        verbose: bool,
    ) -> Result<Self, ConfigurationError> {
        Self::start(Version::new(major, minor, patch), repository, verbose)
    }

    /// Start a check using explicit settings.
    ///
    /// When the endpoint URL cannot be built the session settles
    /// [`UpdateResult::CheckFailed`] right away and no worker is started.
    ///
    /// # Errors
    /// Returns an error if the repository identifier is malformed, the
    /// settings are inconsistent, or the HTTP client cannot be built.
    pub fn start_with_config(
        current: Version,
        repository: &str,
        verbose: bool,
        config: UpdaterConfig,
    ) -> Result<Self, ConfigurationError> {
        let reporter = Reporter::new(verbose);
        validate_repository(repository)?;
        config.validate()?;

        let mut session = Self {
            repository: repository.to_string(),
            current,
            config,
            reporter,
            pending: None,
            check: OnceLock::new(),
            download: Mutex::new(None),
        };

        let endpoint = session.config.releases_url(repository);
        let url = match reqwest::Url::parse(&endpoint) {
            Ok(url) => url,
            Err(error) => {
                let error = ConfigurationError::InvalidEndpoint {
                    url: endpoint,
                    details: error.to_string(),
                };
                reporter.log_with_cause(
                    Level::Error,
                    "Invalid URL, settling failed check",
                    &error,
                );
                session.settle_now(UpdateResult::CheckFailed);
                return Ok(session);
            }
        };
        reporter.info(format!("Set the URL to get: {url}"));

        let client = session.config.http_client()?;
        let query = ReleaseQuery::new(
            client,
            url,
            session.current.clone(),
            session.config.artifact_extension.clone(),
            reporter,
        );
        let (sender, receiver) = crossbeam_channel::bounded(1);

        let spawned = std::thread::Builder::new()
            .name("relcheck-check".to_string())
            .spawn(move || {
                let outcome = match runtime::current_thread_runtime() {
                    Ok(runtime) => runtime.block_on(query.run()),
                    Err(error) => {
                        reporter.log_with_cause(
                            Level::Error,
                            "Failed to start the background runtime",
                            &error,
                        );
                        CheckOutcome::settled(UpdateResult::CheckFailed)
                    }
                };
                let _ = sender.send(outcome);
            });

        match spawned {
            Ok(_) => session.pending = Some(receiver),
            Err(error) => {
                reporter.log_with_cause(
                    Level::Error,
                    "Failed to spawn the update check",
                    &error,
                );
                session.settle_now(UpdateResult::CheckFailed);
            }
        }

        Ok(session)
    }

    fn settle_now(&mut self, result: UpdateResult) {
        let _ = self.check.set(CheckOutcome::settled(result));
    }

    /// Block until the check has settled.
    fn wait(&self) -> &CheckOutcome {
        self.check.get_or_init(|| {
            self.reporter.info("Waiting for the update check to finish");
            self.pending
                .as_ref()
                .and_then(|receiver| receiver.recv().ok())
                .unwrap_or_else(|| CheckOutcome::settled(UpdateResult::CheckFailed))
        })
    }

    /// The settled outcome, reflecting the last download if one was run.
    pub fn result(&self) -> UpdateResult {
        self.reporter.info("Somebody queried the update result");
        let checked = self.wait().result;
        let downloaded = *self
            .download
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        downloaded.unwrap_or(checked)
    }

    /// The latest release version as text, or [`LATEST_VERSION_UNAVAILABLE`].
    pub fn latest_version(&self) -> String {
        match &self.wait().latest {
            Some(latest) => {
                self.reporter.info("Somebody queried the latest version");
                latest.to_string()
            }
            None => {
                self.reporter.info("Latest version is undefined");
                LATEST_VERSION_UNAVAILABLE.to_string()
            }
        }
    }

    pub fn latest(&self) -> Option<Version> {
        self.wait().latest.clone()
    }

    pub fn changelog(&self) -> Option<String> {
        self.wait().changelog.clone()
    }

    pub fn asset_url(&self) -> Option<String> {
        self.wait().asset_url.clone()
    }

    #[must_use]
    pub fn repository(&self) -> &str {
        self.reporter.info("Somebody queried the repository");
        &self.repository
    }

    #[must_use]
    pub fn current(&self) -> &Version {
        &self.current
    }

    /// Download the resolved release artifact into `destination`, blocking
    /// until the transfer finishes. The outcome replaces the session result.
    pub fn download(&self, destination: &Path) -> UpdateResult {
        let asset_url = self.wait().asset_url.clone();
        self.reporter.info(format!(
            "About to download a new update: {}",
            self.latest_version()
        ));

        let result = match self.config.http_client() {
            Ok(client) => {
                let downloader = ArtifactDownloader::new(client, &self.config, self.reporter);
                let transfer = downloader.download(asset_url.as_deref(), destination);
                runtime::block_on_dedicated(transfer).unwrap_or(UpdateResult::DownloadFailed)
            }
            Err(error) => {
                self.reporter
                    .log_with_cause(Level::Error, "Failed to build download client", &error);
                UpdateResult::DownloadFailed
            }
        };

        *self
            .download
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(result);
        self.reporter.info("Finished updating");
        result
    }
}

fn validate_repository(repository: &str) -> Result<(), ConfigurationError> {
    let valid = repository.split_once('/').is_some_and(|(owner, name)| {
        !owner.is_empty()
            && !name.is_empty()
            && !name.contains('/')
            && !repository.chars().any(char::is_whitespace)
    });

    if valid {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidRepository {
            input: repository.to_string(),
        })
    }
}
