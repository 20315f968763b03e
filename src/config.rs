use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::list_ref::ListMode;
use crate::models::DEFAULT_LIST_TITLE;

/// Link base used for share links when none is configured.
pub const DEFAULT_SHARE_BASE_URL: &str = "http://localhost/shoplist";

/// Where items are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Local,
    Remote,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Local => write!(f, "local"),
            BackendKind::Remote => write!(f, "remote"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(BackendKind::Local),
            "remote" => Ok(BackendKind::Remote),
            _ => Err(format!(
                "Invalid backend '{}'. Valid options: local, remote",
                s
            )),
        }
    }
}

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Settings for the remote backend
#[derive(Debug, Clone, Serialize)]
pub struct RemoteConfig {
    /// Document store URL (e.g., "http://localhost:8080")
    pub server_url: ConfigValue<Option<String>>,
    /// How the list id is chosen
    pub list_mode: ConfigValue<ListMode>,
    /// Title for lists created by this client
    pub list_title: ConfigValue<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            server_url: ConfigValue::new(None, ConfigSource::Default),
            list_mode: ConfigValue::new(ListMode::default(), ConfigSource::Default),
            list_title: ConfigValue::new(DEFAULT_LIST_TITLE.to_string(), ConfigSource::Default),
        }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Local slot or document store
    pub backend: ConfigValue<BackendKind>,
    /// Directory holding the local slot and the remembered list id
    pub data_dir: ConfigValue<PathBuf>,
    /// Base of share links
    pub share_base_url: ConfigValue<String>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    /// Remote backend settings
    pub remote: RemoteConfig,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    backend: Option<BackendKind>,
    data_dir: Option<PathBuf>,
    share_base_url: Option<String>,
    remote: Option<RemoteConfigFile>,
}

/// The `remote:` section of the config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RemoteConfigFile {
    server_url: Option<String>,
    list_mode: Option<ListMode>,
    list_title: Option<String>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        // Start with defaults
        let mut backend = ConfigValue::new(BackendKind::default(), ConfigSource::Default);
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut share_base_url =
            ConfigValue::new(DEFAULT_SHARE_BASE_URL.to_string(), ConfigSource::Default);
        let mut config_file = None;
        let mut remote = RemoteConfig::default();

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(kind) = file_config.backend {
                backend = ConfigValue::new(kind, ConfigSource::File);
            }
            if let Some(dir) = file_config.data_dir {
                // Resolve relative paths against config file's directory
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(url) = file_config.share_base_url {
                share_base_url = ConfigValue::new(url, ConfigSource::File);
            }
            if let Some(file_remote) = file_config.remote {
                if let Some(url) = file_remote.server_url {
                    remote.server_url = ConfigValue::new(Some(url), ConfigSource::File);
                }
                if let Some(mode) = file_remote.list_mode {
                    remote.list_mode = ConfigValue::new(mode, ConfigSource::File);
                }
                if let Some(title) = file_remote.list_title {
                    remote.list_title = ConfigValue::new(title, ConfigSource::File);
                }
            }
        }

        let mut config = Self {
            backend,
            data_dir,
            share_base_url,
            config_file,
            remote,
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Applies the `SHOPLIST_*` overrides, reading each variable through `var`.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(value) = var("SHOPLIST_BACKEND") {
            let kind = value
                .parse()
                .map_err(|e| ConfigError::InvalidValue("SHOPLIST_BACKEND", e))?;
            self.backend = ConfigValue::new(kind, ConfigSource::Environment);
        }
        if let Some(dir) = var("SHOPLIST_DATA_DIR") {
            self.data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Some(url) = var("SHOPLIST_SHARE_BASE_URL") {
            self.share_base_url = ConfigValue::new(url, ConfigSource::Environment);
        }
        if let Some(url) = var("SHOPLIST_SERVER_URL") {
            self.remote.server_url = ConfigValue::new(Some(url), ConfigSource::Environment);
        }
        if let Some(value) = var("SHOPLIST_LIST_MODE") {
            let mode = value
                .parse()
                .map_err(|e| ConfigError::InvalidValue("SHOPLIST_LIST_MODE", e))?;
            self.remote.list_mode = ConfigValue::new(mode, ConfigSource::Environment);
        }
        Ok(())
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/shoplist/
    /// - macOS: ~/Library/Application Support/shoplist/
    /// - Windows: %APPDATA%/shoplist/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shoplist")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/shoplist/
    /// - macOS: ~/Library/Application Support/shoplist/
    /// - Windows: %APPDATA%/shoplist/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shoplist")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(&'static str, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(var, e) => {
                write!(f, "Invalid value for {}: {}", var, e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.backend.value, BackendKind::Local);
        assert_eq!(config.backend.source, ConfigSource::Default);
        assert!(config.data_dir.value.ends_with("shoplist"));
        assert_eq!(config.share_base_url.value, DEFAULT_SHARE_BASE_URL);
        assert!(config.remote.server_url.value.is_none());
        assert_eq!(config.remote.list_mode.value, ListMode::Auto);
        assert_eq!(config.remote.list_mode.source, ConfigSource::Default);
        assert_eq!(config.remote.list_title.value, DEFAULT_LIST_TITLE);
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "backend: remote").unwrap();
        writeln!(file, "data_dir: /custom/shoplist").unwrap();
        writeln!(file, "share_base_url: https://lists.example.com/app").unwrap();
        writeln!(file, "remote:").unwrap();
        writeln!(file, "  server_url: http://lists.example.com:8080").unwrap();
        writeln!(file, "  list_mode: fixed").unwrap();

        let config = Config::load(Some(config_path.clone())).unwrap();
        assert_eq!(config.backend.value, BackendKind::Remote);
        assert_eq!(config.backend.source, ConfigSource::File);
        assert_eq!(config.data_dir.value, PathBuf::from("/custom/shoplist"));
        assert_eq!(config.share_base_url.value, "https://lists.example.com/app");
        assert_eq!(
            config.remote.server_url.value.as_deref(),
            Some("http://lists.example.com:8080")
        );
        assert_eq!(config.remote.server_url.source, ConfigSource::File);
        assert_eq!(config.remote.list_mode.value, ListMode::Fixed);
        assert_eq!(config.remote.list_mode.source, ConfigSource::File);
        // list_title falls back to its default
        assert_eq!(config.remote.list_title.value, DEFAULT_LIST_TITLE);
        assert_eq!(config.remote.list_title.source, ConfigSource::Default);
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_relative_data_dir_resolves_against_config_dir() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "data_dir: data\n").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.data_dir.value, temp_dir.path().join("data"));
    }

    #[test]
    #[ignore] // Run with --ignored; env vars can pollute parallel tests
    fn test_env_var_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "backend: local\n").unwrap();

        std::env::set_var("SHOPLIST_BACKEND", "remote");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.backend.value, BackendKind::Remote);
        assert_eq!(config.backend.source, ConfigSource::Environment);

        std::env::remove_var("SHOPLIST_BACKEND");
    }

    #[test]
    fn test_env_overrides_remote_settings() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(
            &config_path,
            "remote:\n  server_url: http://file:8080\n  list_title: Groceries\n",
        )
        .unwrap();
        let mut config = Config::load(Some(config_path)).unwrap();

        let vars = HashMap::from([
            ("SHOPLIST_SERVER_URL", "http://env:9090"),
            ("SHOPLIST_LIST_MODE", "url"),
        ]);
        config
            .apply_env(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(
            config.remote.server_url.value.as_deref(),
            Some("http://env:9090")
        );
        assert_eq!(config.remote.server_url.source, ConfigSource::Environment);
        assert_eq!(config.remote.list_mode.value, ListMode::Url);
        assert_eq!(config.remote.list_mode.source, ConfigSource::Environment);
        assert_eq!(config.remote.list_title.value, "Groceries");
        assert_eq!(config.remote.list_title.source, ConfigSource::File);
    }

    #[test]
    fn test_invalid_list_mode_env_is_error() {
        let temp_dir = tempdir().unwrap();
        let mut config = Config::load(Some(temp_dir.path().join("none.yaml"))).unwrap();

        let result = config.apply_env(|name| {
            (name == "SHOPLIST_LIST_MODE").then(|| "sometimes".to_string())
        });
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue("SHOPLIST_LIST_MODE", _))
        ));
        assert_eq!(config.remote.list_mode.source, ConfigSource::Default);
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(Some(config_path));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_unknown_backend_in_file_is_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "backend: cloud\n").unwrap();

        assert!(matches!(
            Config::load(Some(config_path)),
            Err(ConfigError::ParseError(_, _))
        ));
    }

    #[test]
    fn test_backend_kind_from_str() {
        assert_eq!(BackendKind::from_str("LOCAL").unwrap(), BackendKind::Local);
        assert_eq!(BackendKind::from_str("remote").unwrap(), BackendKind::Remote);
        assert!(BackendKind::from_str("cloud").is_err());
    }
}
