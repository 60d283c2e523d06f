use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `api_base_url`
pub const API_URL_ENV: &str = "LWAI_API_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the data agent backend
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// Where downloads are written; empty means ~/Downloads or the working directory
    pub export_dir: String,
    /// Command used to print, the file path is appended
    pub print_command: String,
    pub persist_history: bool,
    /// Maximum number of saved conversations
    pub history_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            request_timeout_secs: 180,
            export_dir: String::new(),
            print_command: "lp".to_string(),
            persist_history: true,
            history_limit: 100,
        }
    }
}

impl Config {
    pub fn config_dir() -> Option<PathBuf> {
        let home = env::var("HOME").ok()?;
        Some(PathBuf::from(home).join(".lwai-tui"))
    }

    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.json"))
    }

    pub fn history_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("history.json"))
    }

    pub fn logs_dir() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("logs"))
    }

    /// Read a config file; `Ok(None)` when there is none yet
    pub fn load_from(path: &Path) -> Result<Option<Config>> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        };
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(Some(config))
    }

    /// Load the config, writing defaults on first run, then apply env overrides
    ///
    /// An unreadable file is left untouched and defaults are used for the session.
    pub fn load_or_init() -> Config {
        let mut config = match Self::config_path() {
            Some(path) => Self::load_or_init_at(&path),
            None => Config::default(),
        };
        config.apply_api_url_override(env::var(API_URL_ENV).ok());
        config
    }

    fn load_or_init_at(path: &Path) -> Config {
        match Self::load_from(path) {
            Ok(Some(config)) => config,
            Ok(None) => {
                let config = Config::default();
                if let Err(e) = config.save_to(path) {
                    tracing::warn!(error = %e, "could not write default config");
                }
                config
            }
            Err(e) => {
                tracing::warn!(error = ?e, "config file ignored, using defaults");
                Config::default()
            }
        }
    }

    /// Save the config to disk
    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("Failed to create config directory")?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    fn apply_api_url_override(&mut self, value: Option<String>) {
        if let Some(url) = value.filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Directory downloads are written to
    pub fn export_dir(&self) -> PathBuf {
        if !self.export_dir.trim().is_empty() {
            return PathBuf::from(self.export_dir.trim());
        }
        let downloads = env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join("Downloads"))
            .filter(|dir| dir.is_dir());
        downloads
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
