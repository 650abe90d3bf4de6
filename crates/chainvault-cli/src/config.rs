//! CLI configuration management.
//!
//! Backend endpoint, data directory and logging. Wallet preferences such as
//! fee speed or currency live in the wallet store, not here.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Base URL of the backend functions host
    pub backend_url: String,
    /// Project key sent as bearer token
    pub api_key: String,
    /// Directory holding the wallet store
    pub data_dir: PathBuf,
    /// Backend request timeout
    pub request_timeout_secs: u64,
    /// Refresh period of `balance --watch`
    pub poll_interval_secs: u64,
    pub log_level: String,
    pub log_json: bool,
    /// Write logs to this file instead of stderr
    pub log_file: Option<PathBuf>,
}

/// Keys accepted by [`CliConfig::set`].
pub const FIELDS: &[&str] = &[
    "backend_url",
    "api_key",
    "data_dir",
    "request_timeout_secs",
    "poll_interval_secs",
    "log_level",
    "log_json",
    "log_file",
];

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:54321".to_string(),
            api_key: String::new(),
            data_dir: default_home(),
            request_timeout_secs: 30,
            poll_interval_secs: 15,
            log_level: "warn".to_string(),
            log_json: false,
            log_file: None,
        }
    }
}

fn default_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".chainvault")
}

impl CliConfig {
    /// Load configuration from the default location, writing defaults on first run.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: CliConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get configuration file path.
    pub fn config_path() -> anyhow::Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        Ok(home.join(".chainvault").join("config.toml"))
    }

    /// Wallet store file.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("wallet.json")
    }

    /// Whether `key` names a CLI setting.
    pub fn has_field(key: &str) -> bool {
        FIELDS.contains(&key)
    }

    /// Update one field from its string form.
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "backend_url" => {
                let url = value.trim().trim_end_matches('/');
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    anyhow::bail!("backend_url must start with http:// or https://");
                }
                self.backend_url = url.to_string();
            }
            "api_key" => self.api_key = value.trim().to_string(),
            "data_dir" => self.data_dir = PathBuf::from(value),
            "request_timeout_secs" => self.request_timeout_secs = value.parse()?,
            "poll_interval_secs" => {
                let secs: u64 = value.parse()?;
                if secs == 0 {
                    anyhow::bail!("poll_interval_secs must be positive");
                }
                self.poll_interval_secs = secs;
            }
            "log_level" => self.log_level = value.to_string(),
            "log_json" => self.log_json = value.parse()?,
            "log_file" => {
                self.log_file = match value {
                    "" | "none" => None,
                    path => Some(PathBuf::from(path)),
                }
            }
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }

    /// Display form of one field. The API key is masked.
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        Ok(match key {
            "backend_url" => self.backend_url.clone(),
            "api_key" => mask(&self.api_key),
            "data_dir" => self.data_dir.display().to_string(),
            "request_timeout_secs" => self.request_timeout_secs.to_string(),
            "poll_interval_secs" => self.poll_interval_secs.to_string(),
            "log_level" => self.log_level.clone(),
            "log_json" => self.log_json.to_string(),
            "log_file" => self
                .log_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "none".to_string()),
            _ => anyhow::bail!("Unknown config key: {}", key),
        })
    }
}

fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    match chars.len() {
        0 => "(unset)".to_string(),
        n if n <= 8 => "*".repeat(n),
        n => format!(
            "{}...{}",
            chars[..4].iter().collect::<String>(),
            chars[n - 4..].iter().collect::<String>()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.store_path().ends_with("wallet.json"));
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask(""), "(unset)");
        assert_eq!(mask("abc"), "***");
        assert_eq!(mask("eyJhbGciOiJIUzI1NiJ9"), "eyJh...NiJ9");
        assert_eq!(mask("ключ-проекта-1"), "ключ...та-1");
        assert_eq!(mask("ünï"), "***");
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = CliConfig::default();
        assert!(config.set("backend_url", "ftp://x").is_err());
        assert!(config.set("poll_interval_secs", "0").is_err());
        assert!(config.set("log_json", "maybe").is_err());
        assert!(config.set("nope", "1").is_err());
        assert_eq!(config, CliConfig::default());
    }
}
