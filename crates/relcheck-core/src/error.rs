use std::path::PathBuf;

use thiserror::Error;

/// Problems detected while setting up a session, before any network work.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("current version is not semver compliant: {input}")]
    InvalidVersion { input: String },

    #[error("repository must be in owner/name form, got: {input}")]
    InvalidRepository { input: String },

    #[error("release endpoint {url} is not a valid URL: {details}")]
    InvalidEndpoint { url: String, details: String },

    #[error("partial download suffix {suffix} must differ from the artifact extension")]
    ConflictingSuffix { suffix: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure of the releases feed request, kept structured so it can be
/// classified by status code.
#[derive(Debug, Error)]
pub(crate) enum QueryError {
    #[error("release feed request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("release feed returned HTTP {status}{body_snippet}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body_snippet: String,
    },

    #[error("failed to read release feed body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("failed to parse release feed: {0}")]
    Parse(#[source] serde_json::Error),
}

impl QueryError {
    pub(crate) fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Request(error) | Self::Body(error) => error.status(),
            Self::Parse(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum DownloadError {
    #[error("no release asset URL is available to download")]
    MissingAsset,

    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("download failed with HTTP {0}")]
    Status(reqwest::StatusCode),
}

impl DownloadError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn http(context: &'static str, source: reqwest::Error) -> Self {
        Self::Http { context, source }
    }

    pub(crate) fn io_with_path(
        context: &'static str,
        path: &std::path::Path,
        source: &std::io::Error,
    ) -> Self {
        Self::io(
            context,
            std::io::Error::new(source.kind(), format!("{}: {source}", path.display())),
        )
    }
}
