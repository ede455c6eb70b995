#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-variant decision making for every non-player entity.
//!
//! Each entity is asked once per turn what it wants to do. Decisions are
//! read-only over the world snapshot; the world applies them afterwards.

use necrowarp_core::{Alignment, Command, EntityKind, Position, ZoneRegion};
use necrowarp_world::{query, Entity, GoalMap, World};

/// Pure system that turns world snapshots into entity commands.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ai;

impl Ai {
    /// Decides the command `entity` issues this turn.
    ///
    /// Fighters clash with an adjacent enemy when one is present and
    /// otherwise descend their side's goal map. Entities with nothing to do
    /// wait.
    #[must_use]
    pub fn think(&self, world: &World, entity: &Entity) -> Command {
        let source = entity.position();
        match entity.kind() {
            EntityKind::Priest => self
                .adjacent_target(world, source, |kind| kind == EntityKind::Player)
                .map(|target| Command::Clash { source, target })
                .unwrap_or_else(|| descend(query::good_goal_map(world), world, source)),
            EntityKind::Adventurer | EntityKind::Paladin => self
                .adjacent_target(world, source, |kind| kind.alignment() == Alignment::Evil)
                .map(|target| Command::Clash { source, target })
                .unwrap_or_else(|| descend(query::good_goal_map(world), world, source)),
            EntityKind::Skeleton | EntityKind::Wraith => self
                .adjacent_target(world, source, |kind| kind.alignment() == Alignment::Good)
                .map(|target| Command::Clash { source, target })
                .unwrap_or_else(|| descend(query::evil_goal_map(world), world, source)),
            EntityKind::Player | EntityKind::Ladder | EntityKind::Skull => {
                Command::None { source }
            }
        }
    }

    fn adjacent_target<P>(&self, world: &World, source: Position, hostile: P) -> Option<Position>
    where
        P: Fn(EntityKind) -> bool,
    {
        let registry = query::registry(world);
        source
            .neighbours()
            .find(|neighbour| registry.at(*neighbour).is_some_and(&hostile))
    }
}

fn descend(goal_map: &GoalMap, world: &World, source: Position) -> Command {
    match goal_map.descend(ZoneRegion::Interior, source, query::registry(world)) {
        Some(target) => Command::Move { source, target },
        None => Command::None { source },
    }
}
