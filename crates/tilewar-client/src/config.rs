//! Client configuration loading.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tilewar_protocol::MapSize;

/// Session configuration, loaded from .tilewar/client.yaml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Endpoint handed to the remote program adapter
    pub rpc_url: Option<String>,

    /// Board shown before the first snapshot arrives
    pub map_size: MapSize,

    #[serde(default)]
    pub refresh: RefreshConfig,

    #[serde(default)]
    pub clock: ClockConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Poll period while waiting for a game to start
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockConfig {
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,

    /// How often the remote clock offset is re-estimated
    #[serde(default = "default_resample_interval")]
    pub resample_interval_secs: u64,

    #[serde(default = "default_max_turn_duration")]
    pub max_turn_duration_secs: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval(),
            resample_interval_secs: default_resample_interval(),
            max_turn_duration_secs: default_max_turn_duration(),
        }
    }
}

fn default_poll_interval() -> u64 {
    5
}
fn default_tick_interval() -> u64 {
    1
}
fn default_resample_interval() -> u64 {
    60
}
fn default_max_turn_duration() -> u32 {
    tilewar_core::clock::DEFAULT_MAX_TURN_SECS
}

impl RefreshConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

impl ClockConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs.max(1))
    }

    pub fn resample_interval(&self) -> Duration {
        Duration::from_secs(self.resample_interval_secs.max(1))
    }
}

impl ClientConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        Ok(config)
    }

    /// Load from project root (looks for .tilewar/client.yaml)
    pub fn load_from_project(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join(".tilewar/client.yaml");
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load_from_project(dir.path()).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.refresh.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.clock.max_turn_duration_secs, 60);
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".tilewar")).unwrap();
        std::fs::write(
            dir.path().join(".tilewar/client.yaml"),
            "rpc_url: http://127.0.0.1:8899\nmap_size: Large\nclock:\n  resample_interval_secs: 30\n",
        )
        .unwrap();

        let config = ClientConfig::load_from_project(dir.path()).unwrap();
        assert_eq!(config.rpc_url.as_deref(), Some("http://127.0.0.1:8899"));
        assert_eq!(config.map_size, MapSize::Large);
        assert_eq!(config.clock.resample_interval_secs, 30);
        assert_eq!(config.clock.tick_interval_secs, 1);
        assert_eq!(config.refresh.poll_interval_secs, 5);
    }

    #[test]
    fn malformed_yaml_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.yaml");
        std::fs::write(&path, "clock: nope\n").unwrap();

        let err = ClientConfig::load(&path).unwrap_err();
        assert!(format!("{err}").contains("Failed to parse config"));
    }
}
