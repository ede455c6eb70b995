#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Necrowarp.
//!
//! The world owns the terrain [`Map`], the [`EntityRegistry`] and the two
//! [`GoalMap`] integration fields. Mutation happens exclusively through
//! [`apply`], [`update`] and [`end_turn`]; everything else reads the state via
//! the [`query`] module.

mod generation;
mod goal_map;
mod map;
mod partition;
mod registry;
mod resolve;

pub use generation::{
    GenerationError, GenerationParams, Region, DEFAULT_FILL_PERCENT, DEFAULT_ITERATIONS,
    DEFAULT_THRESHOLD,
};
pub use goal_map::GoalMap;
pub use map::Map;
pub use partition::{partition, prune_to_largest, Area};
pub use registry::{Entity, EntityRegistry};

use necrowarp_core::{Alignment, CellTrait, Command, EntityKind, Event, ZoneRegion, GAME_TITLE};
use rand::Rng;

/// Balance constants governing player resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rules {
    /// Kills required to grow the energy capacity by one.
    pub kills_per_energy_slot: u32,
    /// Kills required to grow the armor capacity by one.
    pub kills_per_armor_slot: u32,
    /// Energy capacity before any kill.
    pub base_energy: u8,
    /// Armor capacity before any kill.
    pub base_armor: u8,
    /// Energy spent by a targeted or consuming warp.
    pub target_warp_cost: u8,
    /// Energy spent summoning a wraith.
    pub summon_wraith_cost: u8,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            kills_per_energy_slot: 16,
            kills_per_armor_slot: 8,
            base_energy: 4,
            base_armor: 2,
            target_warp_cost: 2,
            summon_wraith_cost: 4,
        }
    }
}

/// Represents the authoritative Necrowarp world state.
#[derive(Clone, Debug)]
pub struct World {
    title: &'static str,
    map: Map,
    registry: EntityRegistry,
    good_goals: GoalMap,
    evil_goals: GoalMap,
    rules: Rules,
    kills: u32,
    turn: u64,
}

impl World {
    /// Creates a world around a compiled map with an empty registry.
    #[must_use]
    pub fn new(map: Map, rules: Rules) -> Self {
        let bounds = map.bounds();
        Self {
            title: GAME_TITLE,
            map,
            registry: EntityRegistry::new(),
            good_goals: GoalMap::new(bounds),
            evil_goals: GoalMap::new(bounds),
            rules,
            kills: 0,
            turn: 0,
        }
    }

    /// Scatters up to `count` entities of `kind` over free open cells.
    ///
    /// Returns the number actually placed.
    pub fn spawn<R>(
        &mut self,
        kind: EntityKind,
        count: usize,
        min_distance: u32,
        rng: &mut R,
    ) -> usize
    where
        R: Rng + ?Sized,
    {
        self.registry
            .spawn(kind, count, &self.map, rng, min_distance)
    }

    /// Refreshes both goal sets from the registry and rebuilds the fields.
    ///
    /// Good entities descend toward the player while the undead descend
    /// toward the good entities.
    pub fn recalculate_goal_maps(&mut self) {
        self.good_goals.clear_goals();
        if let Some(player) = self.registry.player_position() {
            self.good_goals += player;
        }

        self.evil_goals.clear_goals();
        for entity in self.registry.iter() {
            if entity.kind().alignment() == Alignment::Good {
                self.evil_goals += entity.position();
            }
        }

        self.good_goals
            .recalculate(ZoneRegion::Interior, &self.map, CellTrait::Open, &self.registry);
        self.evil_goals
            .recalculate(ZoneRegion::Interior, &self.map, CellTrait::Open, &self.registry);
    }

    /// Energy capacity granted by the current kill count.
    #[must_use]
    pub fn max_energy(&self) -> u8 {
        capacity(self.rules.base_energy, self.kills, self.rules.kills_per_energy_slot)
    }

    /// Armor capacity granted by the current kill count.
    #[must_use]
    pub fn max_armor(&self) -> u8 {
        capacity(self.rules.base_armor, self.kills, self.rules.kills_per_armor_slot)
    }
}

fn capacity(base: u8, kills: u32, per_slot: u32) -> u8 {
    let bonus = kills.checked_div(per_slot).unwrap_or(0);
    u8::try_from(bonus)
        .unwrap_or(u8::MAX)
        .saturating_add(base)
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Rejected commands leave the world untouched and are reported through
/// [`Event::CommandRejected`].
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    if let Err(reason) = resolve::resolve(world, command, out_events) {
        tracing::debug!(?command, ?reason, "command rejected");
        out_events.push(Event::CommandRejected {
            kind: command.kind(),
            reason,
        });
    }
}

/// Runs one think-then-apply batch over every non-player entity.
///
/// The goal maps are rebuilt first. `think` then sees the same frozen world
/// for every entity; the resulting commands are applied in registry update
/// order, so later commands observe the effects of earlier ones. Commands
/// whose issuer died or moved meanwhile, and rejected commands, are dropped
/// silently.
pub fn update<F>(world: &mut World, mut think: F, out_events: &mut Vec<Event>)
where
    F: FnMut(&World, &Entity) -> Command,
{
    world.recalculate_goal_maps();

    let snapshot: &World = world;
    let decisions: Vec<(EntityKind, Command)> = snapshot
        .registry
        .ordered()
        .iter()
        .map(|entity| (entity.kind(), think(snapshot, entity)))
        .collect();

    for (kind, command) in decisions {
        let Some(source) = command.source() else {
            continue;
        };
        if world.registry.at(source) != Some(kind) {
            continue;
        }
        let _ = resolve::resolve(world, command, out_events);
    }
}

/// Closes the current turn and prepares the goal maps for the next one.
pub fn end_turn(world: &mut World, out_events: &mut Vec<Event>) {
    world.recalculate_goal_maps();
    world.turn = world.turn.saturating_add(1);
    out_events.push(Event::TurnAdvanced { turn: world.turn });
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use necrowarp_core::{
        CellTrait, Command, CommandRejection, EntityKind, PlayerAction, Position, ZoneRegion,
    };
    use rand::{seq::IteratorRandom, Rng};

    use super::{Entity, EntityRegistry, GoalMap, Map, Rules, World};

    /// Retrieves the title adapters display when the session starts.
    #[must_use]
    pub fn title(world: &World) -> &'static str {
        world.title
    }

    /// Provides read-only access to the terrain.
    #[must_use]
    pub fn map(world: &World) -> &Map {
        &world.map
    }

    /// Provides read-only access to the entity registry.
    #[must_use]
    pub fn registry(world: &World) -> &EntityRegistry {
        &world.registry
    }

    /// Field good entities descend to reach the player.
    #[must_use]
    pub fn good_goal_map(world: &World) -> &GoalMap {
        &world.good_goals
    }

    /// Field the undead descend to reach good entities.
    #[must_use]
    pub fn evil_goal_map(world: &World) -> &GoalMap {
        &world.evil_goals
    }

    /// Balance constants the world was created with.
    #[must_use]
    pub fn rules(world: &World) -> &Rules {
        &world.rules
    }

    /// Good entities slain by the player's side.
    #[must_use]
    pub fn kills(world: &World) -> u32 {
        world.kills
    }

    /// Number of completed turns.
    #[must_use]
    pub fn turn(world: &World) -> u64 {
        world.turn
    }

    /// The player entity, if alive.
    #[must_use]
    pub fn player(world: &World) -> Option<&Entity> {
        world.registry.player()
    }

    /// Current energy capacity.
    #[must_use]
    pub fn max_energy(world: &World) -> u8 {
        world.max_energy()
    }

    /// Current armor capacity.
    #[must_use]
    pub fn max_armor(world: &World) -> u8 {
        world.max_armor()
    }

    /// Decodes a player action into the command the world should apply.
    ///
    /// Targets outside the interior or inside rock are refused before any
    /// command exists. Random warps draw their destination from `rng`.
    pub fn player_command<R>(
        world: &World,
        action: PlayerAction,
        rng: &mut R,
    ) -> Result<Command, CommandRejection>
    where
        R: Rng + ?Sized,
    {
        let source = world
            .registry
            .player_position()
            .ok_or(CommandRejection::MissingSource)?;

        match action {
            PlayerAction::Wait => Ok(Command::None { source }),
            PlayerAction::RevealMap => Ok(Command::RevealMap),
            PlayerAction::SummonWraith => Ok(Command::SummonWraith { source }),
            PlayerAction::GrandSummoning => Ok(Command::GrandSummoning { source }),
            PlayerAction::Step(direction) => {
                let target = source.step(direction);
                require_open(world, target)?;
                match world.registry.at(target) {
                    None => Ok(Command::Move { source, target }),
                    Some(kind) => clash_or_consume(source, target, kind),
                }
            }
            PlayerAction::Warp(target) => {
                require_open(world, target)?;
                match world.registry.at(target) {
                    None => Ok(Command::TargetWarp { source, target }),
                    Some(kind) if kind.is_consumable() => {
                        Ok(Command::ConsumeWarp { source, target })
                    }
                    Some(_) => Err(CommandRejection::Occupied),
                }
            }
            PlayerAction::RandomWarp => world
                .map
                .positions_with(ZoneRegion::Interior, CellTrait::Open)
                .filter(|position| !world.registry.contains(*position))
                .choose(rng)
                .map(|target| Command::RandomWarp { source, target })
                .ok_or(CommandRejection::NoFreePosition),
        }
    }

    fn require_open(world: &World, target: Position) -> Result<(), CommandRejection> {
        if !world.map.within(ZoneRegion::Interior, target) {
            return Err(CommandRejection::OutOfBounds);
        }
        if world.map.has(target, CellTrait::Solid) {
            return Err(CommandRejection::Solid);
        }
        Ok(())
    }

    fn clash_or_consume(
        source: Position,
        target: Position,
        kind: EntityKind,
    ) -> Result<Command, CommandRejection> {
        if kind.is_consumable() {
            Ok(Command::Consume { source, target })
        } else if EntityKind::Player.alignment().opposes(kind.alignment()) {
            Ok(Command::Clash { source, target })
        } else {
            Err(CommandRejection::NotPermitted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use necrowarp_core::{
        Bounds, CommandRejection, Direction, Extent, PlayerAction, Position, OPEN_STATE,
    };
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn open_world() -> World {
        let bounds = Bounds::new(Extent::new(16, 12), Extent::new(1, 1));
        World::new(Map::filled(bounds, OPEN_STATE), Rules::default())
    }

    fn place(world: &mut World, kind: EntityKind, x: i32, y: i32) -> Position {
        let position = Position::new(x, y);
        let mut events = Vec::new();
        apply(
            world,
            Command::Spawn {
                kind,
                position,
                announce: false,
            },
            &mut events,
        );
        assert_eq!(events, vec![Event::EntitySpawned { kind, position }]);
        position
    }

    #[test]
    fn capacities_grow_with_kills() {
        let mut world = open_world();
        assert_eq!(world.max_energy(), 4);
        assert_eq!(world.max_armor(), 2);
        world.kills = 17;
        assert_eq!(world.max_energy(), 5);
        assert_eq!(world.max_armor(), 4);
    }

    #[test]
    fn rejected_commands_are_reported() {
        let mut world = open_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Move {
                source: Position::new(3, 3),
                target: Position::new(4, 3),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::CommandRejected {
                kind: necrowarp_core::CommandKind::Move,
                reason: CommandRejection::MissingSource,
            }]
        );
    }

    #[test]
    fn player_steps_decode_by_occupant() {
        let mut world = open_world();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let player = place(&mut world, EntityKind::Player, 5, 5);
        let _ = place(&mut world, EntityKind::Skull, 6, 5);
        let _ = place(&mut world, EntityKind::Adventurer, 5, 4);
        let _ = place(&mut world, EntityKind::Wraith, 4, 5);
        let _ = place(&mut world, EntityKind::Ladder, 5, 6);

        let decode = |world: &World, direction, rng: &mut ChaCha8Rng| {
            query::player_command(world, PlayerAction::Step(direction), rng)
        };
        assert_eq!(
            decode(&world, Direction::East, &mut rng),
            Ok(Command::Consume {
                source: player,
                target: Position::new(6, 5)
            })
        );
        assert_eq!(
            decode(&world, Direction::North, &mut rng),
            Ok(Command::Clash {
                source: player,
                target: Position::new(5, 4)
            })
        );
        assert_eq!(
            decode(&world, Direction::West, &mut rng),
            Err(CommandRejection::NotPermitted)
        );
        assert_eq!(
            decode(&world, Direction::South, &mut rng),
            Err(CommandRejection::NotPermitted)
        );
        assert_eq!(
            decode(&world, Direction::Northeast, &mut rng),
            Ok(Command::Move {
                source: player,
                target: Position::new(6, 4)
            })
        );
    }

    #[test]
    fn warps_outside_the_interior_are_refused() {
        let mut world = open_world();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let _ = place(&mut world, EntityKind::Player, 2, 2);
        assert_eq!(
            query::player_command(&world, PlayerAction::Warp(Position::new(0, 0)), &mut rng),
            Err(CommandRejection::OutOfBounds)
        );
        let command =
            query::player_command(&world, PlayerAction::RandomWarp, &mut rng).expect("free cells");
        let target = command.target().expect("random warp has a target");
        assert!(world.map.is_open(ZoneRegion::Interior, target));
        assert!(!world.registry.contains(target));
    }

    #[test]
    fn update_applies_in_update_order_against_a_frozen_snapshot() {
        let mut world = open_world();
        let skeleton = place(&mut world, EntityKind::Skeleton, 3, 3);
        let adventurer = place(&mut world, EntityKind::Adventurer, 5, 3);
        let target = Position::new(4, 3);

        let mut events = Vec::new();
        update(
            &mut world,
            |_, entity| Command::Move {
                source: entity.position(),
                target,
            },
            &mut events,
        );

        assert_eq!(world.registry.at(target), Some(EntityKind::Skeleton));
        assert_eq!(world.registry.at(adventurer), Some(EntityKind::Adventurer));
        assert_eq!(
            events,
            vec![Event::EntityMoved {
                kind: EntityKind::Skeleton,
                from: skeleton,
                to: target
            }]
        );
    }

    #[test]
    fn end_turn_advances_the_counter() {
        let mut world = open_world();
        let mut events = Vec::new();
        end_turn(&mut world, &mut events);
        end_turn(&mut world, &mut events);
        assert_eq!(query::turn(&world), 2);
        assert_eq!(events.last(), Some(&Event::TurnAdvanced { turn: 2 }));
    }
}
