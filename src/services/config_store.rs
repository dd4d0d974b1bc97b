// Configuration Storage Service
// Handles config file read/write and version backup

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::providers::{DEFAULT_MODEL, GEMINI_DEFAULT_URL};
use super::request_spec::DEFAULT_MIN_TEXT_CHARS;

const MAX_BACKUPS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_min_text_chars")]
    pub min_text_chars: usize,
    /// `None` follows the system proxy settings; a disabled entry forces a
    /// direct connection.
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            model: default_model(),
            api_base_url: default_api_base_url(),
            timeout_secs: default_timeout_secs(),
            min_text_chars: default_min_text_chars(),
            proxy: None,
            api_key: None,
        }
    }
}

impl AppConfig {
    /// Environment overrides for the endpoint and model
    pub fn apply_env_overrides(&mut self) {
        if let Some(url) = non_empty_env("VERITEXT_API_URL") {
            self.api_base_url = url;
        }
        if let Some(model) = non_empty_env("VERITEXT_MODEL") {
            self.model = model;
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    pub enabled: bool,
    pub url: Option<String>,
}

fn default_version() -> String { env!("CARGO_PKG_VERSION").to_string() }
fn default_model() -> String { DEFAULT_MODEL.to_string() }
fn default_api_base_url() -> String { GEMINI_DEFAULT_URL.to_string() }
fn default_timeout_secs() -> u64 { 80 }
fn default_min_text_chars() -> usize { DEFAULT_MIN_TEXT_CHARS }

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self { config_dir, config_file }
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("veritext"))
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Ensure config directory exists
    pub fn ensure_dir(&self) -> Result<(), String> {
        fs::create_dir_all(&self.config_dir)
            .map_err(|e| format!("Failed to create config dir: {}", e))
    }

    /// Load configuration from file, falling back to defaults when absent
    pub fn load(&self) -> Result<AppConfig, String> {
        if !self.config_file.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_file)
            .map_err(|e| format!("Failed to read config: {}", e))?;

        serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))
    }

    /// Save configuration to file
    pub fn save(&self, config: &AppConfig) -> Result<(), String> {
        self.ensure_dir()?;

        if self.config_file.exists() {
            self.create_backup()?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(&self.config_file, content)
            .map_err(|e| format!("Failed to write config: {}", e))
    }

    fn create_backup(&self) -> Result<(), String> {
        let backup_dir = self.config_dir.join("backups");
        fs::create_dir_all(&backup_dir)
            .map_err(|e| format!("Failed to create backup dir: {}", e))?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S%.3f");
        let backup_file = backup_dir.join(format!("config_{}.json", timestamp));

        fs::copy(&self.config_file, &backup_file)
            .map_err(|e| format!("Failed to create backup: {}", e))?;

        self.cleanup_old_backups(&backup_dir, MAX_BACKUPS)
    }

    /// Remove old backups, keeping only the most recent N
    fn cleanup_old_backups(&self, backup_dir: &Path, keep: usize) -> Result<(), String> {
        let mut entries: Vec<_> = fs::read_dir(backup_dir)
            .map_err(|e| format!("Failed to read backup dir: {}", e))?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
            .collect();

        if entries.len() <= keep {
            return Ok(());
        }

        // Timestamped names sort chronologically
        entries.sort_by_key(|e| e.file_name());

        let remove_count = entries.len() - keep;
        for entry in entries.iter().take(remove_count) {
            let _ = fs::remove_file(entry.path());
        }

        Ok(())
    }

    pub fn get_api_key(&self) -> Result<Option<String>, String> {
        let config = self.load()?;
        Ok(config.api_key.filter(|k| !k.trim().is_empty()))
    }

    pub fn set_api_key(&self, key: &str) -> Result<(), String> {
        let mut config = self.load()?;
        config.api_key = Some(key.trim().to_string());
        self.save(&config)
    }

    pub fn delete_api_key(&self) -> Result<(), String> {
        let mut config = self.load()?;
        config.api_key = None;
        self.save(&config)
    }
}
