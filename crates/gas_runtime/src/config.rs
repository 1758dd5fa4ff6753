//! Runtime configuration
//!
//! Sources, later ones win:
//! 1. built-in defaults
//! 2. `gas.json` in the working directory, or the file named by `GAS_CONFIG`
//! 3. `GAS_FRAME_RATE` / `GAS_MAX_DEPTH` environment variables

use crate::error::GasResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Ability system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasConfig {
    /// Frames per second used to convert timeline frames to seconds
    pub frame_rate: f32,
    /// Charge time in seconds when a charge cooldown's formula is empty or invalid
    pub default_charge_time: f32,
    /// Animation the driver returns to when an ability stops its own
    pub idle_animation: String,
    /// Maximum nested port traversals before a branch is abandoned
    pub max_depth: u32,
    /// Where the configuration was loaded from
    #[serde(skip)]
    pub config_path: Option<String>,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            frame_rate: 30.0,
            default_charge_time: 10.0,
            idle_animation: "Stand".to_string(),
            max_depth: 64,
            config_path: None,
        }
    }
}

impl GasConfig {
    /// Load configuration from all sources
    pub fn load() -> Self {
        let path = std::env::var("GAS_CONFIG").unwrap_or_else(|_| "gas.json".to_string());
        let mut config = match Self::load_from_file(&path) {
            Ok(loaded) => {
                log::info!("Loaded GAS config from {}", path);
                loaded
            }
            Err(e) => {
                log::debug!("No GAS config at {} ({}), using defaults", path, e);
                Self::default()
            }
        };

        if let Some(rate) = std::env::var("GAS_FRAME_RATE")
            .ok()
            .and_then(|v| v.parse::<f32>().ok())
            .filter(|v| *v > 0.0)
        {
            config.frame_rate = rate;
            log::info!("Frame rate from env: {}", rate);
        }

        if let Some(depth) = std::env::var("GAS_MAX_DEPTH")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
        {
            config.max_depth = depth;
            log::info!("Max traversal depth from env: {}", depth);
        }

        config
    }

    /// Load configuration from a JSON file
    pub fn load_from_file(path: impl AsRef<Path>) -> GasResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config: GasConfig = serde_json::from_str(&content)?;
        config.config_path = Some(path.as_ref().display().to_string());
        Ok(config)
    }

    /// Convert timeline frames to seconds
    pub fn frames_to_seconds(&self, frames: f32) -> f32 {
        if self.frame_rate <= 0.0 {
            return 0.0;
        }
        frames / self.frame_rate
    }

    pub fn with_frame_rate(mut self, frame_rate: f32) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }
}
