//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::utils::url::post_identifier;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Post URLs to harvest, in processing order
    #[serde(default)]
    pub urls: Vec<String>,

    /// Locations of the cache, dataset, media and log files
    #[serde(default)]
    pub paths: PathsConfig,

    /// Delays between requests
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Optional session credentials
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Full URL list: inline `urls` followed by the lines of `paths.urls_file`.
    pub fn url_list(&self) -> Result<Vec<String>> {
        let mut urls: Vec<String> = self
            .urls
            .iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();

        if let Some(file) = &self.paths.urls_file {
            let content = fs::read_to_string(file).map_err(|e| {
                AppError::config(format!("Cannot read URL list {}: {}", file.display(), e))
            })?;
            urls.extend(parse_url_list(&content));
        }

        Ok(urls)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.rate_limit.min_delay_ms > self.rate_limit.max_delay_ms {
            return Err(AppError::validation(
                "rate_limit.min_delay_ms must not exceed rate_limit.max_delay_ms",
            ));
        }
        if self.paths.cache_file.as_os_str().is_empty() {
            return Err(AppError::validation("paths.cache_file is empty"));
        }
        if self.paths.dataset_file.as_os_str().is_empty() {
            return Err(AppError::validation("paths.dataset_file is empty"));
        }

        let urls = self.url_list()?;
        if urls.is_empty() {
            return Err(AppError::validation("No URLs defined"));
        }
        if let Some(bad) = urls.iter().find(|u| post_identifier(u).is_none()) {
            return Err(AppError::validation(format!(
                "Cannot derive a post identifier from URL '{bad}'"
            )));
        }
        Ok(())
    }
}

/// Parse a URL list file: one URL per line, blank lines and `#` comments ignored.
pub fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// File system locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Newline-separated list of processed identifiers
    #[serde(default = "defaults::cache_file")]
    pub cache_file: PathBuf,

    /// CSV dataset, one row per processed URL
    #[serde(default = "defaults::dataset_file")]
    pub dataset_file: PathBuf,

    /// Root directory for downloaded media
    #[serde(default = "defaults::media_dir")]
    pub media_dir: PathBuf,

    /// Log file appended to alongside console output
    #[serde(default = "defaults::log_file")]
    pub log_file: PathBuf,

    /// Optional file with additional URLs, one per line
    #[serde(default)]
    pub urls_file: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            cache_file: defaults::cache_file(),
            dataset_file: defaults::dataset_file(),
            media_dir: defaults::media_dir(),
            log_file: defaults::log_file(),
            urls_file: None,
        }
    }
}

/// Request pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Lower bound of the randomized delay between items, in milliseconds
    #[serde(default = "defaults::min_delay")]
    pub min_delay_ms: u64,

    /// Upper bound of the randomized delay between items, in milliseconds
    #[serde(default = "defaults::max_delay")]
    pub max_delay_ms: u64,

    /// Fixed pause after an unexpected failure, in milliseconds
    #[serde(default = "defaults::error_penalty")]
    pub error_penalty_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: defaults::min_delay(),
            max_delay_ms: defaults::max_delay(),
            error_penalty_ms: defaults::error_penalty(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header, also used as the client identity for media fetches
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Web application id sent with media API requests
    #[serde(default = "defaults::app_id")]
    pub app_id: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            app_id: defaults::app_id(),
        }
    }
}

/// Session credentials.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Value of an existing `sessionid` cookie
    #[serde(default)]
    pub session_id: Option<String>,
}

mod defaults {
    use std::path::PathBuf;

    // Path defaults
    pub fn cache_file() -> PathBuf {
        "cache.txt".into()
    }
    pub fn dataset_file() -> PathBuf {
        "data.csv".into()
    }
    pub fn media_dir() -> PathBuf {
        "media".into()
    }
    pub fn log_file() -> PathBuf {
        "debug.log".into()
    }

    // Rate limit defaults
    pub fn min_delay() -> u64 {
        500
    }
    pub fn max_delay() -> u64 {
        1000
    }
    pub fn error_penalty() -> u64 {
        5000
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; harvester/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn app_id() -> String {
        "936619743392459".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_with_urls() -> Config {
        Config {
            urls: vec!["https://www.instagram.com/p/Cl9QQZyA1xa/".to_string()],
            ..Config::default()
        }
    }

    #[test]
    fn validate_config_with_urls_ok() {
        assert!(config_with_urls().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_url_list() {
        assert!(Config::default().validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = config_with_urls();
        config.http.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_delay_bounds() {
        let mut config = config_with_urls();
        config.rate_limit.min_delay_ms = 2000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_url_without_identifier() {
        let mut config = config_with_urls();
        config.urls.push("https://www.instagram.com/".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_dot_segment_identifier() {
        let mut config = config_with_urls();
        config.urls.push("www.instagram.com/p/..".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn parse_toml_uses_defaults_for_missing_sections() {
        let config: Config = toml::from_str(
            r#"
            urls = ["https://example.test/p/A/"]

            [rate_limit]
            error_penalty_ms = 100
            "#,
        )
        .unwrap();

        assert_eq!(config.rate_limit.error_penalty_ms, 100);
        assert_eq!(config.rate_limit.min_delay_ms, 500);
        assert_eq!(config.paths.dataset_file, PathBuf::from("data.csv"));
        assert!(config.auth.session_id.is_none());
    }

    #[test]
    fn url_list_merges_file_entries() {
        let tmp = TempDir::new().unwrap();
        let list = tmp.path().join("urls.txt");
        fs::write(
            &list,
            "# batch one\nhttps://example.test/p/B/\n\n  https://example.test/p/C/  \n",
        )
        .unwrap();

        let mut config = config_with_urls();
        config.paths.urls_file = Some(list);

        let urls = config.url_list().unwrap();
        assert_eq!(
            urls,
            vec![
                "https://www.instagram.com/p/Cl9QQZyA1xa/",
                "https://example.test/p/B/",
                "https://example.test/p/C/",
            ]
        );
    }

    #[test]
    fn url_list_missing_file_is_config_error() {
        let mut config = config_with_urls();
        config.paths.urls_file = Some(PathBuf::from("/nonexistent/urls.txt"));
        assert!(matches!(config.url_list(), Err(AppError::Config(_))));
    }
}
