#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that prepares a playable Necrowarp world.
//!
//! Startup carves a cave, keeps its largest open area, places the player and
//! scatters ladders and skulls before the goal maps are computed for the
//! first time.

use necrowarp_core::{
    Bounds, CellApplicator, CellTrait, Command, EntityKind, Event, Extent, ZoneRegion,
    CLOSED_STATE, OPEN_STATE,
};
use necrowarp_world::{
    self as world, prune_to_largest, query, GenerationError, GenerationParams, Region, Rules,
    World,
};
use rand::Rng;
use thiserror::Error;

/// Probability of the smooth surface finish.
const SMOOTH_PROBABILITY: f64 = 0.25;
/// Probability of protruding rock faces.
const PROTRUDE_PROBABILITY: f64 = 2.0 / 3.0;

/// Everything startup needs to know to build a world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Full map extent including the border.
    pub extent: Extent,
    /// Border thickness along each axis.
    pub border: Extent,
    /// Cellular automaton parameters.
    pub generation: GenerationParams,
    /// Ladders scattered over the map.
    pub ladders: usize,
    /// Minimum Chebyshev distance between two ladders.
    pub ladder_distance: u32,
    /// Skulls scattered over the map.
    pub skulls: usize,
    /// Minimum Chebyshev distance between two skulls.
    pub skull_distance: u32,
    /// Balance constants handed to the world.
    pub rules: Rules,
}

impl Config {
    /// Extent and border combined.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        Bounds::new(self.extent, self.border)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extent: Extent::new(64, 32),
            border: Extent::new(4, 4),
            generation: GenerationParams::default(),
            ladders: 8,
            ladder_distance: 16,
            skulls: 16,
            skull_distance: 16,
            rules: Rules::default(),
        }
    }
}

/// Unrecoverable startup failures.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Terrain generation or pruning failed.
    #[error("terrain generation failed: {0}")]
    Generation(#[from] GenerationError),
    /// No open cell remained for the player.
    #[error("could not find open position for player")]
    NoPlayerPosition,
}

/// Produces the initial world and the data required to greet the player.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Derives the title that should be shown when the session starts.
    #[must_use]
    pub fn title<'world>(&self, world: &'world World) -> &'world str {
        query::title(world)
    }

    /// Generates a fresh cave and populates it.
    pub fn generate<R>(&self, config: &Config, rng: &mut R) -> Result<World, BootstrapError>
    where
        R: Rng + ?Sized,
    {
        let mut region = Region::new(config.bounds());
        region.set(ZoneRegion::Border, CLOSED_STATE);
        region.generate(
            ZoneRegion::Interior,
            rng,
            &config.generation,
            &CellApplicator::new(CLOSED_STATE, OPEN_STATE),
        )?;
        region.collapse(ZoneRegion::Interior, CellTrait::Solid, 0x00, CellTrait::Open);
        region.randomize(
            ZoneRegion::All,
            rng,
            SMOOTH_PROBABILITY,
            CellTrait::Smooth,
            CellTrait::Rough,
        );
        region.randomize(
            ZoneRegion::All,
            rng,
            PROTRUDE_PROBABILITY,
            CellTrait::Protrudes,
            CellTrait::Recedes,
        );
        region.randomize_rock(ZoneRegion::All, rng);
        region.randomize_mineral(ZoneRegion::All, rng);

        self.populate(region, config, rng)
    }

    /// Populates a previously generated region, for example one loaded from
    /// disk.
    pub fn from_region<R>(
        &self,
        region: Region,
        config: &Config,
        rng: &mut R,
    ) -> Result<World, BootstrapError>
    where
        R: Rng + ?Sized,
    {
        self.populate(region, config, rng)
    }

    fn populate<R>(
        &self,
        region: Region,
        config: &Config,
        rng: &mut R,
    ) -> Result<World, BootstrapError>
    where
        R: Rng + ?Sized,
    {
        let mut map = region.compile();
        let kept = prune_to_largest(&mut map)?;
        tracing::debug!(open_cells = kept.len(), "terrain compiled");

        let player = map
            .find_random(ZoneRegion::Interior, rng, CellTrait::Open)
            .ok_or(BootstrapError::NoPlayerPosition)?;

        let mut world = World::new(map, config.rules);
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::Spawn {
                kind: EntityKind::Player,
                position: player,
                announce: false,
            },
            &mut events,
        );
        if !events.contains(&Event::EntitySpawned {
            kind: EntityKind::Player,
            position: player,
        }) {
            return Err(BootstrapError::NoPlayerPosition);
        }

        let ladders = world.spawn(
            EntityKind::Ladder,
            config.ladders,
            config.ladder_distance,
            rng,
        );
        let skulls = world.spawn(EntityKind::Skull, config.skulls, config.skull_distance, rng);
        world.recalculate_goal_maps();

        tracing::info!(%player, ladders, skulls, "world ready");
        Ok(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn sealed_region_is_fatal() {
        let config = Config::default();
        let mut region = Region::new(config.bounds());
        region.set(ZoneRegion::All, CLOSED_STATE);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let error = Bootstrap
            .from_region(region, &config, &mut rng)
            .expect_err("no open cell");
        assert!(matches!(
            error,
            BootstrapError::Generation(GenerationError::NoOpenArea)
        ));
    }

    #[test]
    fn invalid_generation_parameters_surface_as_errors() {
        let config = Config {
            generation: GenerationParams {
                fill_percent: -0.5,
                ..GenerationParams::default()
            },
            ..Config::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(matches!(
            Bootstrap.generate(&config, &mut rng),
            Err(BootstrapError::Generation(
                GenerationError::InvalidFillPercent(_)
            ))
        ));
    }
}
