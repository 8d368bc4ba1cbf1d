use std::ffi::OsString;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use log::Level;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use crate::config::UpdaterConfig;
use crate::error::DownloadError;
use crate::outcome::UpdateResult;
use crate::reporter::Reporter;

const FALLBACK_FILE_NAME: &str = "update-download";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub downloaded: u64,
    pub total: u64,
    pub percent: u8,
}

/// Streams a release artifact into a staging directory.
#[derive(Debug, Clone)]
pub struct ArtifactDownloader {
    client: reqwest::Client,
    partial_suffix: String,
    chunk_size: usize,
    reporter: Reporter,
    progress: Option<mpsc::Sender<DownloadProgress>>,
}

impl ArtifactDownloader {
    #[must_use]
    pub fn new(client: reqwest::Client, config: &UpdaterConfig, reporter: Reporter) -> Self {
        Self {
            client,
            partial_suffix: config.partial_suffix.clone(),
            chunk_size: config.chunk_size.max(1),
            reporter,
            progress: None,
        }
    }

    /// Also report each progress step on `sender`. Sending waits for channel
    /// capacity, so the receiver has to keep draining it.
    #[must_use]
    pub fn with_progress(mut self, sender: mpsc::Sender<DownloadProgress>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// Download `asset_url` into `destination` and settle the outcome.
    ///
    /// A missing URL fails immediately without touching the filesystem. A
    /// failed transfer may leave a partial file behind.
    pub async fn download(&self, asset_url: Option<&str>, destination: &Path) -> UpdateResult {
        let transfer = self.try_download(asset_url, destination).await;
        self.settle(transfer)
    }

    fn settle(&self, transfer: Result<u64, DownloadError>) -> UpdateResult {
        match transfer {
            Ok(bytes) => {
                self.reporter.info(format!("Download complete: {bytes} bytes"));
                UpdateResult::DownloadSucceeded
            }
            Err(error) => {
                self.reporter.log_with_cause(
                    Level::Warn,
                    "Tried to download a new update, but was unsuccessful",
                    &error,
                );
                UpdateResult::DownloadFailed
            }
        }
    }

    async fn try_download(
        &self,
        asset_url: Option<&str>,
        destination: &Path,
    ) -> Result<u64, DownloadError> {
        let asset_url = asset_url.ok_or(DownloadError::MissingAsset)?;

        remove_stale_downloads(destination, &self.partial_suffix, self.reporter);

        self.reporter.info(format!("Downloading update from {asset_url}"));
        let response = self
            .client
            .get(asset_url)
            .send()
            .await
            .map_err(|error| DownloadError::http("download request failed", error))?;

        if !response.status().is_success() {
            return Err(DownloadError::Status(response.status()));
        }

        let total = response.content_length();
        let target = destination.join(file_name_from_url(asset_url));
        let stream = response.bytes_stream().map(|chunk| {
            chunk.map_err(|error| DownloadError::http("download stream error", error))
        });

        self.write_stream(stream, total, &target).await
    }

    /// Copy `stream` into a staging file next to `target`, reporting progress
    /// against `total` when it is known, and move it to `target` once the
    /// whole stream was written. On failure the staging file keeps the
    /// partial suffix so the next cleanup pass removes it. The file handle is
    /// flushed and dropped before returning.
    pub(crate) async fn write_stream<S>(
        &self,
        stream: S,
        total: Option<u64>,
        target: &Path,
    ) -> Result<u64, DownloadError>
    where
        S: Stream<Item = Result<Bytes, DownloadError>>,
    {
        let staging = self.staging_path(target);
        let mut file = tokio::fs::File::create(&staging).await.map_err(|error| {
            DownloadError::io_with_path("failed to create download file", &staging, &error)
        })?;

        let copied = self.copy_chunks(&mut file, stream, total, &staging).await;
        let flushed = file.flush().await.map_err(|error| {
            DownloadError::io_with_path("failed to flush download file", &staging, &error)
        });
        drop(file);

        let downloaded = copied?;
        flushed?;

        tokio::fs::rename(&staging, target).await.map_err(|error| {
            DownloadError::io_with_path("failed to move download into place", target, &error)
        })?;
        Ok(downloaded)
    }

    fn staging_path(&self, target: &Path) -> PathBuf {
        let mut name = target
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from(FALLBACK_FILE_NAME));
        name.push(&self.partial_suffix);
        target.with_file_name(name)
    }

    async fn copy_chunks<S>(
        &self,
        file: &mut tokio::fs::File,
        stream: S,
        total: Option<u64>,
        target: &Path,
    ) -> Result<u64, DownloadError>
    where
        S: Stream<Item = Result<Bytes, DownloadError>>,
    {
        let mut tracker = DecileTracker::new(total);
        let mut downloaded: u64 = 0;
        let mut stream = std::pin::pin!(stream);

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for slice in chunk.chunks(self.chunk_size) {
                file.write_all(slice).await.map_err(|error| {
                    DownloadError::io_with_path("failed to write download data", target, &error)
                })?;
                downloaded += slice.len() as u64;

                for percent in tracker.advance(downloaded) {
                    self.report_progress(downloaded, tracker.total(), percent).await;
                }
            }
        }

        Ok(downloaded)
    }

    async fn report_progress(&self, downloaded: u64, total: u64, percent: u8) {
        self.reporter.info(format!("Downloading update: {percent}% of {total} bytes."));
        if let Some(progress) = &self.progress {
            let _ = progress
                .send(DownloadProgress {
                    downloaded,
                    total,
                    percent,
                })
                .await;
        }
    }
}

/// Tracks which 10% boundaries of a transfer have been crossed.
#[derive(Debug, Clone, Copy)]
struct DecileTracker {
    total: u64,
    reached: u8,
}

impl DecileTracker {
    fn new(total: Option<u64>) -> Self {
        Self {
            total: total.unwrap_or(0),
            reached: 0,
        }
    }

    fn total(self) -> u64 {
        self.total
    }

    /// Percentages of the boundaries newly crossed by `downloaded`, in order.
    fn advance(&mut self, downloaded: u64) -> impl Iterator<Item = u8> + use<> {
        let previous = self.reached;
        if self.total > 0 {
            let decile = (downloaded.saturating_mul(10) / self.total).min(10);
            self.reached = self.reached.max(u8::try_from(decile).unwrap_or(10));
        }
        (previous + 1..=self.reached).map(|decile| decile * 10)
    }
}

/// Remove stale partial downloads from `folder`, creating it when absent.
/// Failures are logged and otherwise ignored.
pub(crate) fn remove_stale_downloads(folder: &Path, partial_suffix: &str, reporter: Reporter) {
    if let Err(error) = std::fs::create_dir_all(folder) {
        reporter.log_with_cause(
            Level::Error,
            format!("The updater could not create folder at {}", folder.display()),
            &error,
        );
        return;
    }

    let entries = match std::fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(error) => {
            reporter.log_with_cause(
                Level::Error,
                format!("The updater could not access files at {}", folder.display()),
                &error,
            );
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let is_partial = entry.file_name().to_string_lossy().ends_with(partial_suffix);
        if !is_partial || !path.is_file() {
            continue;
        }

        match std::fs::remove_file(&path) {
            Ok(()) => reporter.info(format!("Removed stale download {}", path.display())),
            Err(error) => reporter.log_with_cause(
                Level::Error,
                format!("The updater could not delete file at {}", path.display()),
                &error,
            ),
        }
    }
}

pub(crate) fn file_name_from_url(url: &str) -> PathBuf {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let raw_name = without_query.rsplit('/').next().unwrap_or(FALLBACK_FILE_NAME);
    let name = Path::new(raw_name)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty() && !name.contains(".."))
        .unwrap_or(FALLBACK_FILE_NAME);
    PathBuf::from(name)
}
