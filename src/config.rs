//! Simulation configuration
//!
//! Loaded from TOML at startup. Every field has a default so a partial
//! file (or none at all) yields a runnable world.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Tunable parameters for a running world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed tick rate of the simulation
    pub ticks_per_second: u32,
    /// Radius in chunks around each player that receives component ticks
    pub simulation_distance: u32,
    /// Radius in chunks around each player that receives entity sync
    pub view_distance: u32,
    /// Lowest placeable block Y
    pub min_build_height: i32,
    /// Highest placeable block Y (exclusive)
    pub max_build_height: i32,
    /// World spawn point
    pub spawn_position: [i32; 3],
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: 20,
            simulation_distance: 8,
            view_distance: 10,
            min_build_height: -64,
            max_build_height: 320,
            spawn_position: [0, 64, 0],
        }
    }
}

impl SimulationConfig {
    /// Parse and validate a config from TOML text
    pub fn from_toml_str(text: &str) -> SimResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| SimError::InvalidConfig {
            field: "simulation".to_string(),
            value: String::new(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the tick loop cannot honor
    pub fn validate(&self) -> SimResult<()> {
        if self.ticks_per_second == 0 || self.ticks_per_second > 100 {
            return Err(SimError::InvalidConfig {
                field: "ticks_per_second".to_string(),
                value: self.ticks_per_second.to_string(),
                reason: "must be between 1 and 100".to_string(),
            });
        }
        if self.simulation_distance == 0 {
            return Err(SimError::InvalidConfig {
                field: "simulation_distance".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1 chunk".to_string(),
            });
        }
        if self.view_distance < self.simulation_distance {
            return Err(SimError::InvalidConfig {
                field: "view_distance".to_string(),
                value: self.view_distance.to_string(),
                reason: format!(
                    "must not be below simulation_distance ({})",
                    self.simulation_distance
                ),
            });
        }
        if self.max_build_height <= self.min_build_height {
            return Err(SimError::InvalidConfig {
                field: "max_build_height".to_string(),
                value: self.max_build_height.to_string(),
                reason: format!("must be above min_build_height ({})", self.min_build_height),
            });
        }
        Ok(())
    }

    /// Simulation radius in blocks
    pub fn simulation_distance_blocks(&self) -> i32 {
        (self.simulation_distance << 4) as i32
    }

    /// View radius in blocks
    pub fn view_distance_blocks(&self) -> i32 {
        (self.view_distance << 4) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = SimulationConfig::from_toml_str("ticks_per_second = 10\n")
            .expect("partial config should parse");
        assert_eq!(config.ticks_per_second, 10);
        assert_eq!(config.simulation_distance, 8);
    }

    #[test]
    fn test_zero_tick_rate_rejected() {
        let result = SimulationConfig::from_toml_str("ticks_per_second = 0\n");
        assert!(matches!(result, Err(SimError::InvalidConfig { .. })));
    }

    #[test]
    fn test_view_distance_below_simulation_rejected() {
        let toml = "simulation_distance = 8\nview_distance = 4\n";
        assert!(SimulationConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn test_distance_conversion() {
        let config = SimulationConfig::default();
        assert_eq!(config.simulation_distance_blocks(), 128);
    }
}
