use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// How to reach (or start) the Chrome instance that renders pages
#[derive(Debug, Deserialize, Clone)]
pub struct BrowserConfig {
    /// Host of the DevTools endpoint
    #[serde(default = "default_host")]
    pub host: String,

    /// Remote debugging port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Chrome executable used when the endpoint has to be launched.
    /// Auto-detected when unset.
    #[serde(default)]
    pub chrome_path: Option<PathBuf>,

    /// Profile directory for a launched Chrome
    #[serde(default = "default_user_data_dir")]
    pub user_data_dir: PathBuf,

    /// Launch Chrome without a window
    #[serde(default = "default_false")]
    pub headless: bool,

    /// Navigation timeout in seconds
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_secs: u64,

    /// Top-level attach attempts before giving up on the browser
    #[serde(default = "default_attach_attempts")]
    pub attach_attempts: usize,

    /// Readiness probes after each launch
    #[serde(default = "default_readiness_polls")]
    pub readiness_polls: usize,

    /// Delay between readiness probes in milliseconds
    #[serde(default = "default_readiness_interval")]
    pub readiness_interval_ms: u64,

    /// Extra wait after the endpoint answers, before attaching again
    #[serde(default = "default_launch_grace")]
    pub launch_grace_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// SQLite file holding scraped recipes
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    /// JSON file with the recipe catalog
    #[serde(default = "default_input_path")]
    pub input_path: PathBuf,

    /// Skip URLs that don't belong to a registered publisher
    #[serde(default = "default_false")]
    pub registered_sites_only: bool,

    /// Wait after DOMContentLoaded before reading dynamic content, in milliseconds
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,
}

fn default_false() -> bool { false }
fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 9222 }
fn default_user_data_dir() -> PathBuf { std::env::temp_dir().join("chrome-testing") }
fn default_navigation_timeout() -> u64 { 30 }
fn default_attach_attempts() -> usize { 3 }
fn default_readiness_polls() -> usize { 10 }
fn default_readiness_interval() -> u64 { 1000 }
fn default_launch_grace() -> u64 { 3000 }
fn default_settle_delay() -> u64 { 2000 }
fn default_input_path() -> PathBuf { PathBuf::from("recipes.json") }

fn default_database_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("recipes.db")
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            chrome_path: None,
            user_data_dir: default_user_data_dir(),
            headless: false,
            navigation_timeout_secs: default_navigation_timeout(),
            attach_attempts: default_attach_attempts(),
            readiness_polls: default_readiness_polls(),
            readiness_interval_ms: default_readiness_interval(),
            launch_grace_ms: default_launch_grace(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: default_input_path(),
            registered_sites_only: false,
            settle_delay_ms: default_settle_delay(),
        }
    }
}

impl Config {
    /// Load `config.toml` from the working directory, then apply environment
    /// overrides. Missing or unparsable files fall back to defaults.
    pub fn load() -> Self {
        let mut cfg = Self::load_from(Path::new("config.toml"));
        if let Some(db) = std::env::var_os("RECIPE_SCRAPER_DB") {
            cfg.cache.database_path = PathBuf::from(db);
        }
        if let Some(input) = std::env::var_os("RECIPE_SCRAPER_INPUT") {
            cfg.pipeline.input_path = PathBuf::from(input);
        }
        cfg
    }

    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<Config>(&content) {
                    Ok(cfg) => return cfg,
                    Err(e) => log::warn!("Ignoring invalid {}: {}", path.display(), e),
                },
                Err(e) => log::warn!("Could not read {}: {}", path.display(), e),
            }
        }
        Self::default()
    }
}

impl BrowserConfig {
    /// Base HTTP address of the DevTools endpoint
    pub fn endpoint_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn readiness_interval(&self) -> Duration {
        Duration::from_millis(self.readiness_interval_ms)
    }

    pub fn launch_grace(&self) -> Duration {
        Duration::from_millis(self.launch_grace_ms)
    }
}

impl PipelineConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_attach_protocol() {
        let cfg = Config::default();
        assert_eq!(cfg.browser.attach_attempts, 3);
        assert_eq!(cfg.browser.readiness_polls, 10);
        assert_eq!(cfg.browser.readiness_interval(), Duration::from_secs(1));
        assert_eq!(cfg.browser.endpoint_url(), "http://127.0.0.1:9222");
        assert!(cfg.cache.database_path.ends_with("recipes.db"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [browser]
            port = 9333

            [pipeline]
            registered_sites_only = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.browser.port, 9333);
        assert_eq!(cfg.browser.host, "127.0.0.1");
        assert!(cfg.pipeline.registered_sites_only);
        assert_eq!(cfg.pipeline.settle_delay_ms, 2000);
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[browser\nport = ").unwrap();
        let cfg = Config::load_from(&path);
        assert_eq!(cfg.browser.port, 9222);
    }
}
