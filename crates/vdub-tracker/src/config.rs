/*
[INPUT]:  YAML configuration file, CLI overrides, VDUB_API_URL
[OUTPUT]: Validated tracker configuration and derived client settings
[POS]:    Configuration layer - backend endpoint, refresh cadence, submit defaults
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use vdub_adapter::presentation::is_supported_language;
use vdub_adapter::{ClientConfig, DEFAULT_BASE_URL, ListTasksQuery, SubtitleMode, VdubClient};

/// Environment variable overriding the configured base URL
pub const API_URL_ENV: &str = "VDUB_API_URL";

/// Top-level configuration for the tracker
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Backend endpoint and timeouts
    pub api: ApiConfig,
    /// Task list view
    pub list: ListConfig,
    /// Task detail view
    pub detail: DetailConfig,
    /// Values used by `submit` when not given on the command line
    pub defaults: SubmitDefaults,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Storage uploads carry the whole video, so they get their own budget
    pub upload_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            upload_timeout_secs: 600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ListConfig {
    pub page_size: u32,
    pub refresh_secs: u64,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            refresh_secs: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DetailConfig {
    pub refresh_secs: u64,
}

impl Default for DetailConfig {
    fn default() -> Self {
        Self { refresh_secs: 2 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SubmitDefaults {
    pub source_language: String,
    pub target_language: String,
    pub subtitle_mode: SubtitleMode,
}

impl Default for SubmitDefaults {
    fn default() -> Self {
        Self {
            source_language: "en".to_string(),
            target_language: "zh".to_string(),
            subtitle_mode: SubtitleMode::External,
        }
    }
}

impl TrackerConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("parse config {}", path.display()))?;
        Ok(config)
    }

    /// `<user config dir>/vdub/tracker.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("vdub").join("tracker.yaml"))
    }

    /// Load from `explicit` if given, else from the default location when it
    /// exists, else fall back to built-in defaults.
    ///
    /// Returns the file actually read, if any.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::from_file(path)?, Some(path.to_path_buf())));
        }
        match Self::default_path().filter(|path| path.is_file()) {
            Some(path) => Ok((Self::from_file(&path)?, Some(path))),
            None => Ok((Self::default(), None)),
        }
    }

    /// Apply base URL overrides: the flag wins over the environment, which
    /// wins over the file.
    pub fn apply_base_url_override(&mut self, flag: Option<&str>, env: Option<&str>) {
        let chosen = [flag, env]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|value| !value.is_empty());
        if let Some(base_url) = chosen {
            self.api.base_url = base_url.to_string();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.list.page_size == 0 {
            bail!("list.page_size must be at least 1");
        }
        if self.list.refresh_secs == 0 || self.detail.refresh_secs == 0 {
            bail!("refresh intervals must be at least 1 second");
        }
        if self.api.timeout_secs == 0 || self.api.upload_timeout_secs == 0 {
            bail!("api timeouts must be at least 1 second");
        }
        for (field, code) in [
            ("defaults.source_language", &self.defaults.source_language),
            ("defaults.target_language", &self.defaults.target_language),
        ] {
            if !is_supported_language(code) {
                bail!("{field}: unsupported language code {code:?}");
            }
        }
        VdubClient::with_config(self.client_config())
            .with_context(|| format!("api.base_url {:?}", self.api.base_url))?;
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api.base_url.clone(),
            timeout: Duration::from_secs(self.api.timeout_secs),
            connect_timeout: Duration::from_secs(self.api.connect_timeout_secs),
            upload_timeout: Duration::from_secs(self.api.upload_timeout_secs),
        }
    }

    pub fn list_refresh(&self) -> Duration {
        Duration::from_secs(self.list.refresh_secs)
    }

    pub fn detail_refresh(&self) -> Duration {
        Duration::from_secs(self.detail.refresh_secs)
    }

    /// First page of the list view, optionally filtered.
    pub fn list_query(&self, status_filter: Option<&str>) -> ListTasksQuery {
        let query = ListTasksQuery::new().page_size(self.list.page_size);
        match status_filter {
            Some(filter) => query.status_filter(filter),
            None => query,
        }
    }
}
