use std::{fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::{Result, command::Platform};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// undo/redo history
    pub history: HistoryConfig,
    /// periodic autosave
    pub autosave: AutosaveConfig,
    /// workflow backend
    pub backend: BackendConfig,
    /// automatic arrangement
    pub layout: LayoutConfig,
    /// decides the primary shortcut modifier, defaults to `other` (Ctrl)
    pub platform: Platform,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// maximum number of retained snapshots, defaults to 50
    pub limit: usize,
    /// quiescence before a snapshot is taken, in milliseconds, defaults to 300
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AutosaveConfig {
    pub enabled: bool,
    /// interval between autosave attempts, in seconds, defaults to 30
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// api base url, eg. http://localhost:8080/api/v1
    pub base_url: String,
    /// request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub node_width: f64,
    pub node_height: f64,
    /// spacing between nodes sharing a rank
    pub node_sep: f64,
    /// spacing between ranks
    pub rank_sep: f64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: 50,
            debounce_ms: 300,
        }
    }
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/v1".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 200.0,
            node_height: 100.0,
            node_sep: 80.0,
            rank_sep: 150.0,
        }
    }
}

impl HistoryConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl AutosaveConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

impl Config {
    pub fn create<T: AsRef<Path>>(path: T) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref())?;

        Self::load_from_str(data.as_str())
    }

    pub fn load_from_str(toml_str: &str) -> Result<Self> {
        let config = toml::from_str::<Config>(toml_str)?;
        Ok(config)
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use crate::{Config, command::Platform};

    #[test]
    fn test_config_deserialize() {
        let toml_str = r#"
        platform = "mac"
        [history]
        limit = 20

        [autosave]
        interval_secs = 10

        [backend]
        base_url = "https://flows.example.com/api/v1"
        "#;
        let config = Config::load_from_str(toml_str).unwrap();
        assert_eq!(config.platform, Platform::Mac);
        assert_eq!(config.history.limit, 20);
        assert_eq!(config.history.debounce_ms, 300);
        assert_eq!(config.autosave.interval(), Duration::from_secs(10));
        assert!(config.autosave.enabled);
        assert_eq!(config.backend.base_url, "https://flows.example.com/api/v1");
        assert_eq!(config.layout.rank_sep, 150.0);
    }

    #[test]
    fn test_config_empty_uses_defaults() {
        let config = Config::load_from_str("").unwrap();
        assert_eq!(config.history.limit, 50);
        assert_eq!(config.history.debounce(), Duration::from_millis(300));
        assert_eq!(config.autosave.interval(), Duration::from_secs(30));
        assert_eq!(config.platform, Platform::Other);
    }

    #[test]
    fn test_config_rejects_bad_types() {
        assert!(Config::load_from_str("[history]\nlimit = \"many\"").is_err());
    }
}
