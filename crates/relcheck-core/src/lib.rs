//! Release update checks for applications published on GitHub.
//!
//! This crate provides the pieces a host application needs to find out whether
//! a newer release exists and to fetch it:
//! - Semantic-version parsing with a simplified release ordering.
//! - A releases-feed query that folds every failure into an [`UpdateResult`].
//! - A background [`UpdateSession`] with blocking, settle-once accessors.
//! - An [`ArtifactDownloader`] that stages release assets with progress logs.

mod config;
mod download;
mod error;
mod outcome;
mod release;
mod reporter;
mod runtime;
mod session;
mod version;

/// Settings for the release endpoint, HTTP client and download staging.
pub use config::UpdaterConfig;
/// Release artifact download with progress reporting.
pub use download::{ArtifactDownloader, DownloadProgress};
/// Errors surfaced while constructing a session.
pub use error::ConfigurationError;
/// Outcome of a check or download.
pub use outcome::UpdateResult;
/// Feed model, query and classified outcome.
pub use release::{CheckOutcome, GitHubAsset, GitHubRelease, Release, ReleaseQuery};
/// Verbose-gated log sink and its log target.
pub use reporter::{LOG_TARGET, Reporter};
/// Background update check session.
pub use session::{LATEST_VERSION_UNAVAILABLE, UpdateSession};
/// Semantic version model.
pub use version::{Version, VersionParseError};
