//! Run configuration.
//!
//! Settings come from an optional TOML file; missing sections fall back to
//! the weekly defaults (20 sessions split 10/10, no noise guard, SPDR
//! universe against SPY).

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::universe::{Sector, SectorUniverse, UniverseError};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Invalid universe: {0}")]
    Universe(#[from] UniverseError),
}

/// Evaluation window settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sessions in the evaluation window (N).
    pub days: usize,
    /// Sessions in the earlier half-window (H).
    pub half: usize,
    /// Noise guard for half-to-half comparisons.
    pub epsilon: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            days: 20,
            half: 10,
            epsilon: 0.0,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.days < 2 {
            return Err(ConfigError::Invalid(format!(
                "window must span at least 2 sessions, got {}",
                self.days
            )));
        }
        if self.half == 0 || self.half >= self.days {
            return Err(ConfigError::Invalid(format!(
                "half-window must be in 1..{}, got {}",
                self.days, self.half
            )));
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "epsilon must be a finite non-negative number, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

/// Universe membership as written in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseConfig {
    pub sectors: Vec<Sector>,
    pub defensive: Vec<Sector>,
    pub cyclical: Vec<Sector>,
    /// Benchmark column in closes tables.
    pub benchmark: String,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        let universe = SectorUniverse::default();
        Self {
            sectors: universe.sectors().to_vec(),
            defensive: universe.defensive().iter().copied().collect(),
            cyclical: universe.cyclical().iter().copied().collect(),
            benchmark: "SPY".to_string(),
        }
    }
}

impl UniverseConfig {
    /// Freeze into an immutable universe.
    pub fn build(&self) -> Result<SectorUniverse, ConfigError> {
        if self.benchmark.trim().is_empty() {
            return Err(ConfigError::Invalid("benchmark ticker is empty".to_string()));
        }
        Ok(SectorUniverse::new(
            self.sectors.clone(),
            self.defensive.iter().copied(),
            self.cyclical.iter().copied(),
        )?)
    }
}

/// Top-level settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub window: EngineConfig,
    pub universe: UniverseConfig,
}

impl Settings {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(content)?;
        settings.window.validate()?;
        settings.universe.build()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load from a file when given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.days, 20);
        assert_eq!(config.half, 10);
        assert_eq!(config.epsilon, 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_half_window_bounds() {
        let config = EngineConfig {
            days: 20,
            half: 20,
            epsilon: 0.0,
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            days: 20,
            half: 0,
            epsilon: 0.0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_epsilon_rejected() {
        let config = EngineConfig {
            epsilon: -1e-4,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings = Settings::from_toml_str(
            r#"
            [window]
            epsilon = 0.0001
            "#,
        )
        .unwrap();
        assert_eq!(settings.window.days, 20);
        assert_eq!(settings.window.epsilon, 0.0001);
        assert_eq!(settings.universe.benchmark, "SPY");
        assert_eq!(settings.universe.sectors.len(), 11);
    }

    #[test]
    fn test_custom_universe() {
        let settings = Settings::from_toml_str(
            r#"
            [universe]
            sectors = ["XLK", "XLU", "XLE"]
            defensive = ["XLU"]
            cyclical = ["XLK"]
            benchmark = "RSP"
            "#,
        )
        .unwrap();
        let universe = settings.universe.build().unwrap();
        assert_eq!(universe.sectors(), &[Sector::XLK, Sector::XLU, Sector::XLE]);
        assert_eq!(settings.universe.benchmark, "RSP");
    }

    #[test]
    fn test_overlapping_universe_rejected() {
        let result = Settings::from_toml_str(
            r#"
            [universe]
            defensive = ["XLU", "XLK"]
            cyclical = ["XLK"]
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Universe(_))));
    }
}
