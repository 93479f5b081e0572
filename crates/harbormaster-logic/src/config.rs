//! Simulation configuration.
//!
//! Every field has a documented default so a partial JSON file (or none at
//! all) still yields a runnable harbor. Out-of-range values are not fatal:
//! [`SimConfig::sanitized`] swaps them for the default and logs a warning.
//!
//! ```
//! use harbormaster_logic::config::SimConfig;
//!
//! let config = SimConfig::from_json_str(r#"{ "width": 12, "seed": 7 }"#).unwrap();
//! assert_eq!(config.width, 12);
//! assert_eq!(config.height, 25);
//! assert_eq!(config.seed, Some(7));
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::harbor::MAX_SIDE;
use crate::tower::TowerSettings;

pub const DEFAULT_WIDTH: u32 = 25;
pub const DEFAULT_HEIGHT: u32 = 25;
pub const DEFAULT_CYCLE_DELAY_MS: u64 = 150;
pub const DEFAULT_ARRIVAL_PERCENT: u8 = 80;
pub const DEFAULT_MAX_CYCLES: u64 = 10_000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Grid width, 2 to [`MAX_SIDE`].
    pub width: u32,
    /// Grid height, 1 to [`MAX_SIDE`]. The harbor has `2 × height` docks.
    pub height: u32,
    /// Pause between cycles, for watching the display. 0 runs flat out.
    pub cycle_delay_ms: u64,
    /// Mix dock ids across both edges instead of numbering them in order.
    pub shuffle_docks: bool,
    /// Fixed seed for a reproducible run; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Minimum log level: off, error, warn, info, debug or trace.
    pub log_level: String,
    /// Chance (0–100) that a new vessel shows up in a cycle.
    pub arrival_percent: u8,
    /// Upper bound on cycles per loop.
    pub max_cycles: u64,
    /// Where to write the fleet export (JSON lines), if anywhere.
    pub export_path: Option<PathBuf>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            cycle_delay_ms: DEFAULT_CYCLE_DELAY_MS,
            shuffle_docks: true,
            seed: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            arrival_percent: DEFAULT_ARRIVAL_PERCENT,
            max_cycles: DEFAULT_MAX_CYCLES,
            export_path: None,
        }
    }
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Copy of this config with every malformed value replaced by its
    /// default.
    pub fn sanitized(&self) -> Self {
        let mut config = self.clone();
        if !(2..=MAX_SIDE).contains(&config.width) {
            log::warn!("width {} is out of range, using {}", config.width, DEFAULT_WIDTH);
            config.width = DEFAULT_WIDTH;
        }
        if !(1..=MAX_SIDE).contains(&config.height) {
            log::warn!("height {} is out of range, using {}", config.height, DEFAULT_HEIGHT);
            config.height = DEFAULT_HEIGHT;
        }
        if config.arrival_percent > 100 {
            log::warn!(
                "arrival_percent {} is above 100, using {}",
                config.arrival_percent,
                DEFAULT_ARRIVAL_PERCENT
            );
            config.arrival_percent = DEFAULT_ARRIVAL_PERCENT;
        }
        if config.max_cycles == 0 {
            log::warn!("max_cycles must be positive, using {}", DEFAULT_MAX_CYCLES);
            config.max_cycles = DEFAULT_MAX_CYCLES;
        }
        if config.log_level.parse::<LevelFilter>().is_err() {
            log::warn!(
                "unknown log level {:?}, using {:?}",
                config.log_level,
                DEFAULT_LOG_LEVEL
            );
            config.log_level = DEFAULT_LOG_LEVEL.to_string();
        }
        config
    }

    /// Parsed log level, `Info` when unparseable.
    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }

    pub fn cycle_delay(&self) -> Duration {
        Duration::from_millis(self.cycle_delay_ms)
    }

    pub fn tower_settings(&self) -> TowerSettings {
        TowerSettings {
            arrival_percent: self.arrival_percent.min(100),
            cycle_delay: self.cycle_delay(),
            max_cycles: self.max_cycles.max(1),
        }
    }
}
