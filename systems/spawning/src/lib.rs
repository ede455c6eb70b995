#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Reinforcement system that sends fresh invaders down the ladders.

use std::collections::HashSet;

use necrowarp_core::{Command, EntityKind, Event, Position, ZoneRegion};
use necrowarp_world::{query, World};
use rand::Rng;

/// Kinds that arrive by ladder and keep it busy while standing next to it.
const INVADERS: [EntityKind; 3] = [EntityKind::Adventurer, EntityKind::Paladin, EntityKind::Priest];

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    starting_adventurers: u32,
    kills_per_population: u32,
}

impl Config {
    /// Creates a configuration from the base wave size and its growth rate.
    #[must_use]
    pub const fn new(starting_adventurers: u32, kills_per_population: u32) -> Self {
        Self {
            starting_adventurers,
            kills_per_population,
        }
    }

    /// Size of a wave before any kill.
    #[must_use]
    pub const fn starting_adventurers(&self) -> u32 {
        self.starting_adventurers
    }

    /// Kills required to grow every following wave by one invader.
    #[must_use]
    pub const fn kills_per_population(&self) -> u32 {
        self.kills_per_population
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(8, 4)
    }
}

/// Pure system that emits spawn commands whenever a turn closes.
#[derive(Debug)]
pub struct Spawning {
    config: Config,
    pending: u32,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config, pending: 0 }
    }

    /// Invaders still waiting for a free ladder.
    #[must_use]
    pub const fn pending(&self) -> u32 {
        self.pending
    }

    /// Consumes world events and the world snapshot to emit spawn commands.
    ///
    /// Nothing happens unless `events` closed a turn. A new wave is queued
    /// once every adventurer is gone and the previous wave fully arrived.
    /// Each ladder then releases at most one queued invader onto its first
    /// free neighbouring cell. A ladder with an invader still standing next
    /// to it stays busy.
    pub fn handle<R>(
        &mut self,
        events: &[Event],
        world: &World,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) where
        R: Rng + ?Sized,
    {
        if !events
            .iter()
            .any(|event| matches!(event, Event::TurnAdvanced { .. }))
        {
            return;
        }

        let registry = query::registry(world);
        if registry.count(EntityKind::Adventurer) == 0 && self.pending == 0 {
            let growth = query::kills(world)
                .checked_div(self.config.kills_per_population)
                .unwrap_or(0);
            self.pending = self.config.starting_adventurers.saturating_add(growth);
            if self.pending > 0 {
                tracing::info!(size = self.pending, "a new wave of invaders approaches");
            }
        }

        let map = query::map(world);
        let mut reserved: HashSet<Position> = HashSet::new();
        for ladder in registry.positions_of(EntityKind::Ladder) {
            if self.pending == 0 {
                break;
            }
            if ladder
                .neighbours()
                .any(|neighbour| registry.contains_any(neighbour, &INVADERS))
            {
                continue;
            }
            let Some(position) = ladder.neighbours().find(|neighbour| {
                map.is_open(ZoneRegion::Interior, *neighbour)
                    && !registry.contains(*neighbour)
                    && !reserved.contains(neighbour)
            }) else {
                continue;
            };

            let _ = reserved.insert(position);
            self.pending -= 1;
            out.push(Command::Spawn {
                kind: invader(rng),
                position,
                announce: true,
            });
        }
    }
}

fn invader<R>(rng: &mut R) -> EntityKind
where
    R: Rng + ?Sized,
{
    match rng.gen_range(0..10) {
        0..=5 => EntityKind::Adventurer,
        6..=8 => EntityKind::Paladin,
        _ => EntityKind::Priest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn invader_mix_favours_adventurers() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let mut counts = [0usize; 3];
        for _ in 0..10_000 {
            match invader(&mut rng) {
                EntityKind::Adventurer => counts[0] += 1,
                EntityKind::Paladin => counts[1] += 1,
                EntityKind::Priest => counts[2] += 1,
                other => panic!("unexpected invader {other:?}"),
            }
        }
        assert!(counts[0] > counts[1]);
        assert!(counts[1] > counts[2]);
        assert!(counts[2] > 0);
    }
}
