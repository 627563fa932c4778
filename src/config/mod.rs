use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Backend used when the client runs against a loopback origin
pub const LOCAL_DEV_URL: &str = "http://localhost:8000";

/// Origin assumed when neither the CLI nor the config names one
pub const DEFAULT_ORIGIN: &str = "http://localhost";

const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Optional color overrides, hex strings like "#ffc107"
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ThemeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dogs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cats: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Explicit backend base URL, skips origin-based resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Origin the client is deployed under (scheme + host)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,

    /// How often results are polled
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Desktop notification after a one-shot `--vote`
    #[serde(default)]
    pub notifications: bool,

    #[serde(default)]
    pub theme: ThemeConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            origin: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            notifications: false,
            theme: ThemeConfig::default(),
        }
    }
}

impl AppConfig {
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("pawpoll");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from file, or write out and return the defaults
    pub fn load() -> Result<Self> {
        let path = match Self::config_path() {
            Ok(p) => p,
            Err(_) => return Ok(AppConfig::default()),
        };

        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        // Don't overwrite a file the user is still editing
                        tracing::warn!("Failed to parse config {}: {}", path.display(), e);
                        return Ok(AppConfig::default());
                    }
                },
                Err(e) => tracing::warn!("Failed to read config: {}", e),
            }
        }

        let config = AppConfig::default();
        if let Err(e) = config.save() {
            tracing::debug!("Could not write default config: {}", e);
        }
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        // A zero interval would make tokio's ticker panic
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Pick the backend base URL once, at startup.
    ///
    /// An explicit URL (CLI first, then config) wins; otherwise the origin is
    /// run through [`ApiBaseUrl::resolve`].
    pub fn api_base_url(&self, cli_api_url: Option<&str>, cli_origin: Option<&str>) -> Result<ApiBaseUrl> {
        if let Some(explicit) = cli_api_url.or(self.api_url.as_deref()) {
            return Ok(ApiBaseUrl::new(explicit));
        }

        let origin = cli_origin
            .or(self.origin.as_deref())
            .unwrap_or(DEFAULT_ORIGIN);
        let origin = Url::parse(origin).with_context(|| format!("Invalid origin URL: {}", origin))?;
        Ok(ApiBaseUrl::resolve(&origin))
    }
}

/// Base URL of the voting backend, without a trailing slash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiBaseUrl(String);

impl ApiBaseUrl {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        Self(url.trim_end_matches('/').to_string())
    }

    /// Loopback origins talk to the dev server directly; anything else goes
    /// through the reverse proxy at `/api` on the same scheme and host.
    pub fn resolve(origin: &Url) -> Self {
        let host = origin.host_str().unwrap_or_default();

        if is_loopback(host) {
            return Self::new(LOCAL_DEV_URL);
        }

        Self::new(format!("{}://{}/api", origin.scheme(), host))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn join(&self, path: &str) -> String {
        format!("{}/{}", self.0, path.trim_start_matches('/'))
    }
}

impl fmt::Display for ApiBaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_loopback(host: &str) -> bool {
    matches!(host, "localhost" | "127.0.0.1" | "[::1]" | "::1")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(origin: &str) -> String {
        ApiBaseUrl::resolve(&Url::parse(origin).unwrap()).to_string()
    }

    #[test]
    fn test_loopback_hosts_use_dev_port() {
        assert_eq!(resolve("http://localhost"), "http://localhost:8000");
        assert_eq!(resolve("http://127.0.0.1:3000"), "http://localhost:8000");
        assert_eq!(resolve("http://[::1]/"), "http://localhost:8000");
    }

    #[test]
    fn test_remote_hosts_use_same_origin_api_path() {
        assert_eq!(resolve("https://vote.example.com"), "https://vote.example.com/api");
        assert_eq!(resolve("http://10.0.0.7/index.html"), "http://10.0.0.7/api");
        // Port is dropped, the proxy listens on the default one
        assert_eq!(resolve("https://vote.example.com:8443"), "https://vote.example.com/api");
    }

    #[test]
    fn test_cli_url_beats_config() {
        let config = AppConfig {
            api_url: Some("http://from-config:9000/".to_string()),
            ..AppConfig::default()
        };

        let base = config.api_base_url(Some("http://from-cli:1234/"), None).unwrap();
        assert_eq!(base.as_str(), "http://from-cli:1234");

        let base = config.api_base_url(None, Some("https://ignored.example.com")).unwrap();
        assert_eq!(base.as_str(), "http://from-config:9000");
    }

    #[test]
    fn test_origin_resolution_order() {
        let config = AppConfig {
            origin: Some("https://config.example.com".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(
            config.api_base_url(None, Some("https://cli.example.com")).unwrap().as_str(),
            "https://cli.example.com/api"
        );
        assert_eq!(config.api_base_url(None, None).unwrap().as_str(), "https://config.example.com/api");
        assert_eq!(AppConfig::default().api_base_url(None, None).unwrap().as_str(), LOCAL_DEV_URL);
    }

    #[test]
    fn test_bad_origin_is_an_error() {
        assert!(AppConfig::default().api_base_url(None, Some("not a url")).is_err());
    }

    #[test]
    fn test_join() {
        let base = ApiBaseUrl::new("https://vote.example.com/api/");
        assert_eq!(base.join("/results"), "https://vote.example.com/api/results");
        assert_eq!(base.join("vote"), "https://vote.example.com/api/vote");
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig {
            api_url: None,
            origin: Some("https://vote.example.com".to_string()),
            poll_interval_ms: 2000,
            request_timeout_secs: 3,
            notifications: true,
            theme: ThemeConfig {
                dogs: Some("#ffc107".to_string()),
                ..ThemeConfig::default()
            },
        };

        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: AppConfig = toml::from_str("origin = \"https://vote.example.com\"").unwrap();
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert!(!config.notifications);
    }
}
