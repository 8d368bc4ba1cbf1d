use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Tunables for the release check and the artifact download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdaterConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Extension a release asset must end with to be picked for download.
    #[serde(default = "default_artifact_extension")]
    pub artifact_extension: String,

    /// Suffix of stale partial downloads removed before a new download.
    #[serde(default = "default_partial_suffix")]
    pub partial_suffix: String,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_user_agent() -> String {
    format!("relcheck/{}", env!("CARGO_PKG_VERSION"))
}

fn default_connect_timeout() -> u64 {
    6
}

fn default_artifact_extension() -> String {
    ".jar".to_string()
}

fn default_partial_suffix() -> String {
    ".zip".to_string()
}

fn default_chunk_size() -> usize {
    1024
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            user_agent: default_user_agent(),
            connect_timeout_secs: default_connect_timeout(),
            artifact_extension: default_artifact_extension(),
            partial_suffix: default_partial_suffix(),
            chunk_size: default_chunk_size(),
        }
    }
}

impl UpdaterConfig {
    /// Load settings from a JSON file, falling back to defaults when the file
    /// does not exist.
    ///
    /// # Errors
    /// Returns an error when the file exists but cannot be read or parsed, or
    /// when the loaded settings are inconsistent.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&content).map_err(|source| ConfigurationError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns an error when the partial-download suffix would also match
    /// finished artifacts.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.partial_suffix.is_empty()
            || self
                .partial_suffix
                .eq_ignore_ascii_case(&self.artifact_extension)
        {
            return Err(ConfigurationError::ConflictingSuffix {
                suffix: self.partial_suffix.clone(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub fn releases_url(&self, repository: &str) -> String {
        format!(
            "{}/repos/{repository}/releases",
            self.api_base.trim_end_matches('/')
        )
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Build the HTTP client shared by the release query and the downloader.
    ///
    /// # Errors
    /// Returns an error if the TLS backend or client cannot be initialized.
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigurationError> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout())
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(ConfigurationError::Client)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::UpdaterConfig;
    use crate::error::ConfigurationError;

    #[test]
    fn defaults_target_github_with_short_connect_timeout() {
        let config = UpdaterConfig::default();

        assert_eq!(config.api_base, "https://api.github.com");
        assert_eq!(config.connect_timeout().as_secs(), 6);
        assert_eq!(config.artifact_extension, ".jar");
        assert_eq!(config.partial_suffix, ".zip");
        assert_eq!(config.chunk_size, 1024);
        assert!(config.user_agent.starts_with("relcheck/"));
    }

    #[test]
    fn releases_url_substitutes_repository() {
        let config = UpdaterConfig::default().with_api_base("http://127.0.0.1:8080/");

        assert_eq!(
            config.releases_url("owner/plugin"),
            "http://127.0.0.1:8080/repos/owner/plugin/releases"
        );
    }

    #[test]
    fn partial_json_fills_missing_fields_with_defaults() {
        let config: UpdaterConfig = serde_json::from_value(json!({
            "artifact_extension": ".zip",
            "partial_suffix": ".part"
        }))
        .expect("config JSON should deserialize");

        assert_eq!(config.artifact_extension, ".zip");
        assert_eq!(config.partial_suffix, ".part");
        assert_eq!(config.connect_timeout_secs, 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_suffix_matching_artifact_extension() {
        let config = UpdaterConfig {
            partial_suffix: ".JAR".to_string(),
            ..UpdaterConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::ConflictingSuffix { ref suffix }) if suffix == ".JAR"
        ));
    }

    #[test]
    fn load_missing_file_returns_defaults() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let config = UpdaterConfig::load(&temp.path().join("settings.json"))
            .expect("missing file should yield defaults");

        assert_eq!(config, UpdaterConfig::default());
    }

    #[test]
    fn load_reports_malformed_json() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let path = temp.path().join("settings.json");
        std::fs::write(&path, "{ not json").expect("settings file should be written");

        assert!(matches!(
            UpdaterConfig::load(&path),
            Err(ConfigurationError::Parse { .. })
        ));
    }
}
