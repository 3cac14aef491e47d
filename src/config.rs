//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority
//! (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`DICEBOX_SECTION__KEY`)

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use dicebox_core::{PlayAreaConfig, RollConfig, ShapeConfig, SpawnConfig};
use dicebox_physics::SimConfig;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Rigid-body world tuning
    #[serde(default)]
    pub simulation: SimConfig,
    /// Die collider geometry and mass
    #[serde(default)]
    pub shapes: ShapeConfig,
    /// Settle detection and failsafe ladder tuning
    #[serde(default)]
    pub roll: RollConfig,
    /// Spawn placement and throw strength
    #[serde(default)]
    pub spawn: SpawnConfig,
    /// Play-area zoom tiers
    #[serde(default)]
    pub play_area: PlayAreaConfig,
    /// Loop cadence for the headless runner
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            simulation: SimConfig::default(),
            shapes: ShapeConfig::default(),
            roll: RollConfig::default(),
            spawn: SpawnConfig::default(),
            play_area: PlayAreaConfig::default(),
            runner: RunnerConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`DICEBOX_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // Environment variables override everything
        // DICEBOX_SIMULATION__GRAVITY=-9.0 -> simulation.gravity = -9.0
        figment = figment.merge(Env::prefixed("DICEBOX_").split("__"));

        figment.extract().map_err(ConfigError::from)
    }
}

/// Cadence of the headless roll runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Fixed physics step rate in Hz
    pub fixed_timestep_hz: f32,
    /// Upper bound of simulated time to spend on one roll
    pub max_simulated_seconds: f32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            fixed_timestep_hz: 60.0,
            max_simulated_seconds: 120.0,
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError {
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.simulation.gravity, -18.0);
        assert_eq!(config.roll.max_reroll_attempts, 3);
        assert_eq!(config.runner.fixed_timestep_hz, 60.0);
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("gravity"));
        assert!(toml.contains("fallback_value"));
        assert!(toml.contains("throw_speed_range"));
    }

    #[test]
    fn test_load_from_missing_directory_uses_defaults() {
        let config = AppConfig::load_from("/nonexistent/config/dir").unwrap();
        assert_eq!(config.simulation.gravity, -18.0);
    }
}
