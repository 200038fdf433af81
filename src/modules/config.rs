use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest accepted grid side length.
pub const MAX_GRID_SIZE: usize = 4096;

/// Host attribute names understood by [`EngineConfig::apply_attribute`].
pub const ATTRIBUTES: [&str; 4] = ["matrix", "apples", "interval-speed", "show-renders"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("grid size must be a positive integer")]
    ZeroGridSize,
    #[error("grid size {size} exceeds the maximum of {max}")]
    GridTooLarge { size: usize, max: usize },
    #[error("tick interval must be greater than 0 ms")]
    ZeroTickInterval,
    #[error("attribute `{name}` must be a non-negative integer, got `{value}`")]
    InvalidAttribute { name: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub grid_size: usize,
    pub item_count: usize,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default)]
    pub show_debug_overlay: bool,
}

fn default_tick_interval_ms() -> u64 {
    100
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid_size: 11,
            item_count: 10,
            tick_interval_ms: default_tick_interval_ms(),
            show_debug_overlay: false,
        }
    }
}

impl EngineConfig {
    pub fn new(grid_size: usize, item_count: usize) -> Self {
        Self {
            grid_size,
            item_count,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size == 0 {
            return Err(ConfigError::ZeroGridSize);
        }
        if self.grid_size > MAX_GRID_SIZE {
            return Err(ConfigError::GridTooLarge {
                size: self.grid_size,
                max: MAX_GRID_SIZE,
            });
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        Ok(())
    }

    pub fn cell_count(&self) -> usize {
        self.grid_size.saturating_mul(self.grid_size)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Whether switching to `other` must rebuild the grid.
    pub fn requires_rebuild(&self, other: &EngineConfig) -> bool {
        self.grid_size != other.grid_size || self.item_count != other.item_count
    }

    /// Applies a host attribute update (`matrix`, `apples`, `interval-speed`,
    /// `show-renders`). Unknown names are ignored. Returns whether the
    /// configuration changed.
    pub fn apply_attribute(&mut self, name: &str, value: &str) -> Result<bool, ConfigError> {
        if !ATTRIBUTES.contains(&name) {
            return Ok(false);
        }

        let parsed: u64 = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidAttribute {
                name: name.to_string(),
                value: value.to_string(),
            })?;
        let as_usize = || {
            usize::try_from(parsed).map_err(|_| ConfigError::InvalidAttribute {
                name: name.to_string(),
                value: value.to_string(),
            })
        };

        let before = *self;
        match name {
            "matrix" => self.grid_size = as_usize()?,
            "apples" => self.item_count = as_usize()?,
            "interval-speed" => self.tick_interval_ms = parsed,
            "show-renders" => self.show_debug_overlay = parsed != 0,
            _ => {}
        }
        Ok(*self != before)
    }
}

fn config_dir() -> PathBuf {
    PathBuf::from(".snakegrid")
}

pub fn default_config_path() -> PathBuf {
    config_dir().join("config.json")
}

pub fn load(path: &Path) -> io::Result<Option<EngineConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let bytes = fs::read(path)?;
    if bytes.is_empty() {
        return Ok(None);
    }

    let config: EngineConfig = serde_json::from_slice(&bytes).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "failed to parse config file {}; delete it or run `snakegrid config init --force` to reset: {}",
                path.display(),
                e
            ),
        )
    })?;
    Ok(Some(config))
}

pub fn save(path: &Path, config: &EngineConfig) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_vec_pretty(config)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("snakegrid-config-{}-{}", std::process::id(), name))
            .join("config.json")
    }

    #[test]
    fn defaults_match_widget() {
        let config = EngineConfig::default();
        assert_eq!(config.grid_size, 11);
        assert_eq!(config.item_count, 10);
        assert_eq!(config.tick_interval_ms, 100);
        assert!(!config.show_debug_overlay);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_and_oversized_grids() {
        assert_eq!(
            EngineConfig::new(0, 1).validate(),
            Err(ConfigError::ZeroGridSize)
        );
        assert!(matches!(
            EngineConfig::new(MAX_GRID_SIZE + 1, 1).validate(),
            Err(ConfigError::GridTooLarge { .. })
        ));
        let config = EngineConfig {
            tick_interval_ms: 0,
            ..EngineConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroTickInterval));
    }

    #[test]
    fn attributes_update_matching_fields() {
        let mut config = EngineConfig::default();
        assert_eq!(config.apply_attribute("matrix", "20"), Ok(true));
        assert_eq!(config.apply_attribute("matrix", "20"), Ok(false));
        assert_eq!(config.apply_attribute("apples", " 3 "), Ok(true));
        assert_eq!(config.apply_attribute("interval-speed", "250"), Ok(true));
        assert_eq!(config.apply_attribute("show-renders", "1"), Ok(true));
        assert_eq!(config.apply_attribute("colour", "red"), Ok(false));

        assert_eq!(config.grid_size, 20);
        assert_eq!(config.item_count, 3);
        assert_eq!(config.tick_interval_ms, 250);
        assert!(config.show_debug_overlay);
    }

    #[test]
    fn negative_or_garbage_attributes_are_errors() {
        let mut config = EngineConfig::default();
        assert!(matches!(
            config.apply_attribute("apples", "-3"),
            Err(ConfigError::InvalidAttribute { .. })
        ));
        assert!(config.apply_attribute("matrix", "ten").is_err());
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn rebuild_only_for_grid_or_items() {
        let base = EngineConfig::default();
        let slower = EngineConfig {
            tick_interval_ms: 500,
            show_debug_overlay: true,
            ..base
        };
        assert!(!base.requires_rebuild(&slower));
        assert!(base.requires_rebuild(&EngineConfig::new(12, 10)));
        assert!(base.requires_rebuild(&EngineConfig::new(11, 2)));
    }

    #[test]
    fn json_uses_camel_case_and_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "gridSize": 5, "itemCount": 2 }"#).unwrap();
        assert_eq!(config, EngineConfig::new(5, 2));

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"tickIntervalMs\":100"));
        assert!(json.contains("\"showDebugOverlay\":false"));
    }

    #[test]
    fn save_then_load_from_disk() {
        let path = scratch_path("roundtrip");
        let config = EngineConfig {
            grid_size: 7,
            item_count: 4,
            tick_interval_ms: 40,
            show_debug_overlay: true,
        };
        save(&path, &config).unwrap();
        assert_eq!(load(&path).unwrap(), Some(config));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn missing_file_loads_as_none_and_garbage_is_invalid_data() {
        let path = scratch_path("garbage");
        assert_eq!(load(&path).unwrap(), None);

        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"{ not json").unwrap();
        let err = load(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
