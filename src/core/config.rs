//! Configuration management for Defense Hub.
//!
//! Handles loading and saving configuration from TOML files, plus the
//! environment overrides used by scripts and tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backend::{Backend, LocalBackend};
use crate::drafts::{DraftManager, DraftStore, FileStorage, DEFAULT_DRAFTS_KEY};
use crate::export::HtmlExporter;

/// Environment variable overriding `storage.data_dir`.
pub const ENV_DATA_DIR: &str = "DEFENSEHUB_DATA_DIR";

/// Environment variable overriding `backend.base_url`. Setting it selects the HTTP backend.
pub const ENV_BACKEND_URL: &str = "DEFENSEHUB_BACKEND_URL";

const APP_DIR: &str = "defensehub";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Draft storage settings
    pub storage: StorageConfig,

    /// Backend selection
    pub backend: BackendConfig,

    /// Document export settings
    pub export: ExportConfig,
}

/// Draft storage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the draft blob (supports `~`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,

    /// Storage key of the draft blob
    pub key: String,

    /// Maximum blob size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota_bytes: Option<usize>,
}

/// Which backend serves the wizard's remote operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process computation and templated defenses
    #[default]
    Local,
    /// JSON over HTTP
    Http,
}

/// Backend settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend kind
    pub kind: BackendKind,

    /// Base URL for the HTTP backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Request timeout in seconds; requests never time out when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Document export settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory exported documents are written to (supports `~`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: None, key: DEFAULT_DRAFTS_KEY.to_string(), quota_bytes: None }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Looks for config in:
    /// 1. `.defensehub.toml` in current directory
    /// 2. `~/.config/defensehub/config.toml`
    /// 3. Falls back to defaults
    ///
    /// Environment overrides are applied last.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn load_file() -> anyhow::Result<Self> {
        let local_config = PathBuf::from(".defensehub.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(global_config) = Self::config_path() {
            if global_config.exists() {
                return Self::load_from_file(&global_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Apply `DEFENSEHUB_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Some(dir) = std::env::var(ENV_DATA_DIR).ok().filter(|v| !v.is_empty()) {
            self.storage.data_dir = Some(dir);
        }

        if let Some(url) = std::env::var(ENV_BACKEND_URL).ok().filter(|v| !v.is_empty()) {
            self.backend.kind = BackendKind::Http;
            self.backend.base_url = Some(url);
        }
    }

    /// Save configuration to the global config file.
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path =
            Self::config_path().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        Ok(())
    }

    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR))
    }

    /// Path of the global config file.
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    /// Get the default data directory path.
    pub fn data_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join(APP_DIR))
    }

    /// Directory the draft blob lives in.
    pub fn storage_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .as_deref()
            .map(expand_path)
            .or_else(Self::data_dir)
            .unwrap_or_else(|| PathBuf::from(".defensehub"))
    }

    /// Directory exported documents are written to.
    pub fn export_dir(&self) -> PathBuf {
        self.export
            .output_dir
            .as_deref()
            .map(expand_path)
            .unwrap_or_else(|| self.storage_dir().join("exports"))
    }

    /// Build the draft manager over file storage.
    pub fn build_drafts(&self) -> DraftManager {
        let mut storage = FileStorage::new(self.storage_dir());
        if let Some(quota) = self.storage.quota_bytes {
            storage = storage.with_quota(quota);
        }

        DraftManager::new(DraftStore::new(Arc::new(storage)).with_key(self.storage.key.clone()))
    }

    /// Build the configured backend.
    pub fn build_backend(&self) -> anyhow::Result<Arc<dyn Backend>> {
        match self.backend.kind {
            BackendKind::Local => Ok(Arc::new(LocalBackend::new())),
            BackendKind::Http => self.build_http_backend(),
        }
    }

    #[cfg(feature = "remote")]
    fn build_http_backend(&self) -> anyhow::Result<Arc<dyn Backend>> {
        use std::time::Duration;

        use crate::backend::HttpBackend;

        let base_url = self
            .backend
            .base_url
            .clone()
            .ok_or_else(|| anyhow::anyhow!("backend.base_url is required for the http backend"))?;

        let backend = match self.backend.timeout_secs {
            Some(secs) => HttpBackend::with_timeout(base_url, Duration::from_secs(secs))?,
            None => HttpBackend::new(base_url),
        };

        Ok(Arc::new(backend))
    }

    #[cfg(not(feature = "remote"))]
    fn build_http_backend(&self) -> anyhow::Result<Arc<dyn Backend>> {
        anyhow::bail!("the http backend requires the `remote` feature")
    }

    /// Build the HTML exporter.
    pub fn build_exporter(&self) -> HtmlExporter {
        HtmlExporter::new(self.export_dir())
    }
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.storage.key, DEFAULT_DRAFTS_KEY);
        assert_eq!(config.backend.kind, BackendKind::Local);
        assert!(config.backend.timeout_secs.is_none());
        assert!(config.export.output_dir.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("[storage]"));
        assert!(toml_str.contains("[backend]"));
        assert!(toml_str.contains("kind = \"local\""));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [storage]
            data_dir = "/var/lib/defensehub"
            quota_bytes = 5242880

            [backend]
            kind = "http"
            base_url = "https://api.example.com/"
            timeout_secs = 30
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.storage.key, DEFAULT_DRAFTS_KEY);
        assert_eq!(config.storage.quota_bytes, Some(5_242_880));
        assert_eq!(config.storage_dir(), PathBuf::from("/var/lib/defensehub"));
        assert_eq!(config.export_dir(), PathBuf::from("/var/lib/defensehub/exports"));
        assert_eq!(config.backend.kind, BackendKind::Http);
        assert_eq!(config.backend.timeout_secs, Some(30));
    }

    #[test]
    fn test_tilde_expansion() {
        let config: Config = toml::from_str("[export]\noutput_dir = \"~/defesas\"").unwrap();
        assert!(!config.export_dir().to_string_lossy().starts_with('~'));
        assert!(config.export_dir().ends_with("defesas"));
    }

    #[test]
    fn test_http_backend_requires_url() {
        let mut config = Config::default();
        config.backend.kind = BackendKind::Http;
        assert!(config.build_backend().is_err());
    }

    #[test]
    fn test_local_backend_built_by_default() {
        let backend = Config::default().build_backend().unwrap();
        assert_eq!(backend.name(), "local");
    }

    #[test]
    fn test_build_drafts_uses_storage_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.data_dir = Some(dir.path().to_string_lossy().into_owned());
        config.storage.key = "casos".to_string();

        let drafts = config.build_drafts();
        assert_eq!(drafts.store().key(), "casos");
        assert!(drafts.list().is_empty());
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var(ENV_DATA_DIR, "/tmp/defensehub-env");
        std::env::set_var(ENV_BACKEND_URL, "http://localhost:8080");

        let mut config = Config::default();
        config.apply_env_overrides();

        std::env::remove_var(ENV_DATA_DIR);
        std::env::remove_var(ENV_BACKEND_URL);

        assert_eq!(config.storage_dir(), PathBuf::from("/tmp/defensehub-env"));
        assert_eq!(config.backend.kind, BackendKind::Http);
        assert_eq!(config.backend.base_url.as_deref(), Some("http://localhost:8080"));
    }

    #[test]
    #[serial]
    fn test_empty_env_values_are_ignored() {
        std::env::set_var(ENV_DATA_DIR, "");
        std::env::remove_var(ENV_BACKEND_URL);

        let mut config = Config::default();
        config.apply_env_overrides();
        std::env::remove_var(ENV_DATA_DIR);

        assert_eq!(config, Config::default());
    }
}
