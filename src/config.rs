use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{LabError, Result};
use crate::listing::TriggerKind;

const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub token_env: Option<String>,
    pub token_command: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            token_env: Some("LABDESK_TOKEN".to_string()),
            token_command: None,
            timeout_secs: 15,
        }
    }
}

impl ApiConfig {
    pub fn validate(&self) -> Result<()> {
        let scheme_ok = self.base_url.starts_with("http://") || self.base_url.starts_with("https://");
        if !scheme_ok {
            return Err(LabError::Config(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(LabError::Config("timeout_secs must be positive".to_string()));
        }
        Ok(())
    }
}

/// Paging and continuation settings for one incremental list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ListConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    pub trigger: TriggerKind,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl ListConfig {
    fn tests() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            trigger: TriggerKind::Viewport { margin: 2 },
        }
    }

    fn branches() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            trigger: TriggerKind::scroll(),
        }
    }

    fn sanitize(&mut self, name: &str) {
        if self.page_size == 0 {
            tracing::warn!(list = name, "page_size must be positive, using default");
            self.page_size = DEFAULT_PAGE_SIZE;
        }
        // A zero threshold can never fire
        if self.trigger == (TriggerKind::Scroll { threshold: 0 }) {
            tracing::warn!(list = name, "scroll threshold must be positive, using default");
            self.trigger = TriggerKind::scroll();
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default = "ListConfig::tests")]
    pub tests: ListConfig,
    #[serde(default = "ListConfig::branches")]
    pub branches: ListConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            tests: ListConfig::tests(),
            branches: ListConfig::branches(),
        }
    }
}

pub fn config_dir() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("labdesk"))
}

fn config_path() -> Option<PathBuf> {
    Some(config_dir()?.join("config.toml"))
}

impl Config {
    /// Load from `path`, or the default location. Missing or invalid files
    /// fall back to defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path.map(Path::to_path_buf).or_else(config_path) else {
            return Config::default();
        };

        let Ok(content) = std::fs::read_to_string(&path) else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Config::default();
        };

        match Self::parse(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "invalid config, using defaults");
                Config::default()
            }
        }
    }

    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        let mut config: Config = toml::from_str(content)?;
        config.tests.sanitize("tests");
        config.branches.sanitize("branches");
        Ok(config)
    }
}
