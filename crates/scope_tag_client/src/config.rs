use std::path::{Path, PathBuf};

use log::warn;
use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com";
pub const DEFAULT_API_VERSION: &str = "beta";
pub const DEFAULT_MAX_RETRIES: u32 = 3;

const CONFIG_FILE_PATH: &str = "scope-tag.toml";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub graph_base_url: String,
    pub api_version: String,
    pub http_proxy: String,
    pub https_proxy: String,
    pub max_retries: u32,
    pub token_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            graph_base_url: DEFAULT_GRAPH_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            http_proxy: String::new(),
            https_proxy: String::new(),
            max_retries: DEFAULT_MAX_RETRIES,
            token_file: None,
        }
    }
}

impl Config {
    /// Reads `scope-tag.toml` from the working directory when present, then
    /// applies environment overrides. A broken file is logged and ignored.
    pub fn new() -> Self {
        let mut config = if Path::new(CONFIG_FILE_PATH).exists() {
            match Self::from_file(Path::new(CONFIG_FILE_PATH)) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Ignoring config file: {e}");
                    Config::default()
                }
            }
        } else {
            Config::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Like [`Config::new`] but for an explicitly requested file, whose
    /// errors are reported instead of ignored.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str::<Config>(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub(crate) fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup("GRAPH_BASE_URL") {
            self.graph_base_url = base_url;
        }
        if let Some(version) = lookup("GRAPH_API_VERSION") {
            self.api_version = version;
        }
        if let Some(http_proxy) = lookup("HTTP_PROXY") {
            self.http_proxy = http_proxy;
        }
        if let Some(https_proxy) = lookup("HTTPS_PROXY") {
            self.https_proxy = https_proxy;
        }
        if let Some(retries) = lookup("GRAPH_MAX_RETRIES") {
            match retries.trim().parse::<u32>() {
                Ok(value) => self.max_retries = value,
                Err(_) => warn!("Ignoring GRAPH_MAX_RETRIES={retries:?}: not a number"),
            }
        }
        if let Some(token_file) = lookup("GRAPH_TOKEN_FILE") {
            self.token_file = Some(PathBuf::from(token_file));
        }
    }

    /// Token cache location: explicit setting first, then the per-user
    /// config directory.
    pub fn token_file_path(&self) -> Option<PathBuf> {
        self.token_file
            .clone()
            .or_else(|| dirs::config_dir().map(|dir| dir.join("scope-tag").join("token.json")))
    }
}
