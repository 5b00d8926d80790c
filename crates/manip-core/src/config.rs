//! Gizmo configuration
//!
//! Tunables for manipulation speed, picking and history depth. Stored as RON;
//! missing fields fall back to their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{history, manipulation, pick};

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

/// Mouse-to-transform conversion settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ManipulationConfig {
    /// Camera distance divided by this gives the gizmo placement scale
    pub scale_divisor: f32,
    /// World units per pixel at placement scale 1
    pub translate_speed: f32,
    /// Pixels per degree of rotation
    pub rotate_divisor: f32,
    /// Scale delta per pixel
    pub scale_speed: f32,
    /// Lower bound of the per-axis scale factor
    pub min_scale_factor: f32,
}

impl Default for ManipulationConfig {
    fn default() -> Self {
        Self {
            scale_divisor: manipulation::SCALE_DIVISOR,
            translate_speed: manipulation::TRANSLATE_SPEED,
            rotate_divisor: manipulation::ROTATE_DIVISOR,
            scale_speed: manipulation::SCALE_SPEED,
            min_scale_factor: manipulation::MIN_SCALE_FACTOR,
        }
    }
}

/// Pick pass settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PickConfig {
    /// Side of the hover readback region in pixels
    pub region_size: u32,
    /// Maximum number of pickable scene objects
    pub capacity: usize,
}

impl Default for PickConfig {
    fn default() -> Self {
        Self {
            region_size: pick::REGION_SIZE,
            capacity: pick::COLOR_CAPACITY,
        }
    }
}

/// Complete gizmo configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GizmoConfig {
    pub manipulation: ManipulationConfig,
    pub pick: PickConfig,
    /// Maximum number of undo steps
    pub history_limit: usize,
}

impl Default for GizmoConfig {
    fn default() -> Self {
        Self {
            manipulation: ManipulationConfig::default(),
            pick: PickConfig::default(),
            history_limit: history::DEFAULT_LIMIT,
        }
    }
}

impl GizmoConfig {
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        ron::from_str(content).map_err(|e| ConfigError::Deserialize(e.to_string()))
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Load configuration from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config = Self::from_ron_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded gizmo config");
        Ok(config)
    }

    /// Save configuration to a RON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = self.to_ron_string()?;
        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GizmoConfig::default();
        assert_eq!(config.manipulation.scale_divisor, 14.0);
        assert_eq!(config.pick.region_size, 20);
        assert_eq!(config.history_limit, history::DEFAULT_LIMIT);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = GizmoConfig::from_ron_str("(pick: (region_size: 8))").unwrap();
        assert_eq!(config.pick.region_size, 8);
        assert_eq!(config.pick.capacity, pick::COLOR_CAPACITY);
        assert_eq!(config.manipulation, ManipulationConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gizmo.ron");

        let mut config = GizmoConfig::default();
        config.manipulation.translate_speed = 0.5;
        config.history_limit = 3;
        config.save(&path).unwrap();

        let loaded = GizmoConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = GizmoConfig::load(dir.path().join("missing.ron"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_invalid_ron() {
        let result = GizmoConfig::from_ron_str("(pick: [1, 2])");
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }
}
