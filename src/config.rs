//! Configuration file parser for ~/.config/newsdeck/config.toml.
//!
//! The config file is optional — a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde, though we log a warning
//! when the file contains potential typos.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds the maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be
/// specified. Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the CORS proxy that fetches origin feeds. The target
    /// feed URL is appended as a percent-encoded `url` query parameter.
    pub proxy_base: String,

    /// Hard per-fetch deadline in milliseconds.
    pub fetch_timeout_ms: u64,

    /// Auto-refresh interval in minutes for watch mode.
    pub refresh_interval_minutes: u64,

    /// Maximum number of items the CLI prints per refresh.
    pub max_display_items: usize,

    /// Path of the saved source-toggles file. Defaults to
    /// `sources.json` next to the config file.
    pub sources_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proxy_base: "https://rss-proxy.example.workers.dev/".to_string(),
            fetch_timeout_ms: 12_000,
            refresh_interval_minutes: 10,
            max_display_items: 120,
            sources_file: None,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Parse as a raw table first to flag probable typos
        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = [
                "proxy_base",
                "fetch_timeout_ms",
                "refresh_interval_minutes",
                "max_display_items",
                "sources_file",
            ];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), proxy = %config.proxy_base, "Loaded configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.fetch_timeout_ms, 12_000);
        assert_eq!(config.refresh_interval_minutes, 10);
        assert_eq!(config.max_display_items, 120);
        assert!(config.sources_file.is_none());
        assert!(config.proxy_base.starts_with("https://"));
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/newsdeck_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.fetch_timeout_ms, 12_000);
    }

    #[test]
    fn test_empty_file_returns_default() {
        let dir = std::env::temp_dir().join("newsdeck_config_test_empty");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.max_display_items, 120);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let dir = std::env::temp_dir().join("newsdeck_config_test_partial");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "fetch_timeout_ms = 5000\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.fetch_timeout_ms, 5000);
        assert_eq!(config.refresh_interval_minutes, 10); // default

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let dir = std::env::temp_dir().join("newsdeck_config_test_full");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let content = r#"
proxy_base = "https://my-proxy.example.dev/"
fetch_timeout_ms = 8000
refresh_interval_minutes = 5
max_display_items = 50
sources_file = "/tmp/my-sources.json"
"#;
        std::fs::write(&path, content).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.proxy_base, "https://my-proxy.example.dev/");
        assert_eq!(config.fetch_timeout_ms, 8000);
        assert_eq!(config.refresh_interval_minutes, 5);
        assert_eq!(config.max_display_items, 50);
        assert_eq!(config.sources_file.as_deref(), Some("/tmp/my-sources.json"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let dir = std::env::temp_dir().join("newsdeck_config_test_invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "this is not [valid toml").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let dir = std::env::temp_dir().join("newsdeck_config_test_unknown");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "totally_fake_key = \"ok\"\nmax_display_items = 10\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.max_display_items, 10);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let dir = std::env::temp_dir().join("newsdeck_config_test_wrongtype");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "fetch_timeout_ms = \"soon\"\n").unwrap();

        assert!(Config::load(&path).is_err());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_too_large_file_rejected() {
        let dir = std::env::temp_dir().join("newsdeck_config_test_too_large");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "a".repeat(1_048_577)).unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::TooLarge(_))));

        std::fs::remove_dir_all(&dir).ok();
    }
}
