//! TOML game configuration with defaults for every field.

use std::{fs, path::Path, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use necrowarp_core::Extent;
use necrowarp_system_bootstrap::Config as BootstrapConfig;
use necrowarp_system_spawning::Config as SpawningConfig;
use necrowarp_world::{
    GenerationParams, Rules, DEFAULT_FILL_PERCENT, DEFAULT_ITERATIONS, DEFAULT_THRESHOLD,
};
use serde::Deserialize;

/// Complete game configuration as read from disk.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameConfig {
    pub(crate) seed: Option<u64>,
    pub(crate) turns: Option<u64>,
    pub(crate) region: Option<PathBuf>,
    pub(crate) map: MapSection,
    pub(crate) generation: GenerationSection,
    pub(crate) population: PopulationSection,
    pub(crate) rules: RulesSection,
    pub(crate) session: SessionSection,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct MapSection {
    pub(crate) width: i32,
    pub(crate) height: i32,
    pub(crate) border_width: i32,
    pub(crate) border_height: i32,
}

impl Default for MapSection {
    fn default() -> Self {
        Self {
            width: 64,
            height: 32,
            border_width: 4,
            border_height: 4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GenerationSection {
    pub(crate) fill_percent: f64,
    pub(crate) iterations: u32,
    pub(crate) threshold: u32,
}

impl Default for GenerationSection {
    fn default() -> Self {
        Self {
            fill_percent: DEFAULT_FILL_PERCENT,
            iterations: DEFAULT_ITERATIONS,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PopulationSection {
    pub(crate) ladders: usize,
    pub(crate) ladder_distance: u32,
    pub(crate) skulls: usize,
    pub(crate) skull_distance: u32,
    pub(crate) starting_adventurers: u32,
    pub(crate) kills_per_population: u32,
}

impl Default for PopulationSection {
    fn default() -> Self {
        Self {
            ladders: 8,
            ladder_distance: 16,
            skulls: 16,
            skull_distance: 16,
            starting_adventurers: 8,
            kills_per_population: 4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RulesSection {
    pub(crate) kills_per_energy_slot: u32,
    pub(crate) kills_per_armor_slot: u32,
    pub(crate) base_energy: u8,
    pub(crate) base_armor: u8,
    pub(crate) target_warp_cost: u8,
    pub(crate) summon_wraith_cost: u8,
}

impl Default for RulesSection {
    fn default() -> Self {
        let rules = Rules::default();
        Self {
            kills_per_energy_slot: rules.kills_per_energy_slot,
            kills_per_armor_slot: rules.kills_per_armor_slot,
            base_energy: rules.base_energy,
            base_armor: rules.base_armor,
            target_warp_cost: rules.target_warp_cost,
            summon_wraith_cost: rules.summon_wraith_cost,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SessionSection {
    /// Minimum delay between two turns.
    pub(crate) epoch_interval_ms: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            epoch_interval_ms: 125,
        }
    }
}

impl GameConfig {
    /// Reads the configuration at `path`, or the defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("could not read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("could not parse config file {}", path.display()))
    }

    pub(crate) fn bootstrap(&self) -> BootstrapConfig {
        BootstrapConfig {
            extent: Extent::new(self.map.width, self.map.height),
            border: Extent::new(self.map.border_width, self.map.border_height),
            generation: GenerationParams {
                fill_percent: self.generation.fill_percent,
                iterations: self.generation.iterations,
                threshold: self.generation.threshold,
            },
            ladders: self.population.ladders,
            ladder_distance: self.population.ladder_distance,
            skulls: self.population.skulls,
            skull_distance: self.population.skull_distance,
            rules: Rules {
                kills_per_energy_slot: self.rules.kills_per_energy_slot,
                kills_per_armor_slot: self.rules.kills_per_armor_slot,
                base_energy: self.rules.base_energy,
                base_armor: self.rules.base_armor,
                target_warp_cost: self.rules.target_warp_cost,
                summon_wraith_cost: self.rules.summon_wraith_cost,
            },
        }
    }

    pub(crate) fn spawning(&self) -> SpawningConfig {
        SpawningConfig::new(
            self.population.starting_adventurers,
            self.population.kills_per_population,
        )
    }

    pub(crate) fn epoch_interval(&self) -> Duration {
        Duration::from_millis(self.session.epoch_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_bootstrap_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.bootstrap(), BootstrapConfig::default());
        assert_eq!(config.spawning(), SpawningConfig::default());
        assert_eq!(config.epoch_interval(), Duration::from_millis(125));
    }

    #[test]
    fn partial_files_keep_remaining_defaults() {
        let config: GameConfig = toml::from_str(
            r#"
            seed = 99

            [map]
            width = 80

            [population]
            skulls = 4
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.seed, Some(99));
        assert_eq!(config.map.width, 80);
        assert_eq!(config.map.height, 32);
        assert_eq!(config.population.skulls, 4);
        assert_eq!(config.population.ladders, 8);
        assert_eq!(config.bootstrap().extent, Extent::new(80, 32));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(toml::from_str::<GameConfig>("[map]\ndepth = 3\n").is_err());
    }

    #[test]
    fn missing_config_file_is_reported() {
        let error = GameConfig::load(Some(Path::new("/nonexistent/necrowarp.toml")))
            .expect_err("file does not exist");
        assert!(error.to_string().contains("could not read config file"));
    }
}
