use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use topicscope::{
    FileIdentityStore, GatewayConfig, DEFAULT_BASE_URL, DEFAULT_HISTORY_LIMIT, DEFAULT_PAGE_SIZE,
    DEFAULT_WINDOW_DAYS,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub history: HistoryConfig,
    pub analytics: AnalyticsConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_secs: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// How many entries to fetch from the backend
    pub limit: usize,
    pub page_size: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_HISTORY_LIMIT,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub days: u32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            days: DEFAULT_WINDOW_DAYS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Identity file; the per-user data directory when unset
    pub identity_path: Option<PathBuf>,
    pub download_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            identity_path: None,
            download_dir: PathBuf::from("downloads"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. TOPICSCOPE_* environment variables, `__` between levels
    ///    (e.g. `TOPICSCOPE_BACKEND__BASE_URL`)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("TOPICSCOPE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Load config from a specific path, still honouring environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("TOPICSCOPE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    pub fn gateway(&self) -> GatewayConfig {
        let config = GatewayConfig::new(self.backend.base_url.clone());
        match self.backend.timeout_secs {
            Some(secs) => config.with_timeout(Duration::from_secs(secs)),
            None => config,
        }
    }

    pub fn identity_store(&self) -> FileIdentityStore {
        match &self.storage.identity_path {
            Some(path) => FileIdentityStore::new(path),
            None => FileIdentityStore::default_location(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_structure() {
        let toml = r#"
            [backend]
            base_url = "http://classifier:5000"
            timeout_secs = 30

            [history]
            limit = 20
            page_size = 5

            [analytics]
            days = 14

            [storage]
            identity_path = "/tmp/topicscope-id"
            download_dir = "saved"

            [logging]
            level = "debug"
            format = "json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.history.page_size, 5);
        assert_eq!(config.analytics.days, 14);
        assert_eq!(config.logging.format, "json");
        assert_eq!(
            config.identity_store().path(),
            Path::new("/tmp/topicscope-id")
        );

        let gateway = config.gateway();
        assert_eq!(gateway.base_url, "http://classifier:5000");
        assert_eq!(gateway.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = toml::from_str("[history]\npage_size = 25\n").unwrap();
        assert_eq!(config.history.page_size, 25);
        assert_eq!(config.history.limit, DEFAULT_HISTORY_LIMIT);
        assert_eq!(config.backend.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.analytics.days, DEFAULT_WINDOW_DAYS);
        assert!(config.gateway().timeout.is_none());
        assert_eq!(config.storage.download_dir, PathBuf::from("downloads"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[analytics]\ndays = 30").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.analytics.days, 30);
        assert_eq!(config.logging.level, "info");
    }
}
