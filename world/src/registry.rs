//! Spatial index holding every live entity.

use std::collections::HashMap;

use necrowarp_core::{CellTrait, EntityKind, Position, ZoneRegion};
use rand::{seq::SliceRandom, Rng};

use crate::Map;

/// Live entity together with its variant-specific state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entity {
    /// The necromancer controlled by the player.
    Player {
        /// Cell occupied by the player.
        position: Position,
        /// Energy spent on warps and summons.
        energy: u8,
        /// Armor absorbing incoming damage.
        armor: u8,
    },
    /// Raised skeleton; dies to any hit.
    Skeleton {
        /// Cell occupied by the skeleton.
        position: Position,
    },
    /// Summoned wraith. A hit at least as strong as its health destroys it;
    /// any weaker hit costs exactly one health.
    Wraith {
        /// Cell occupied by the wraith.
        position: Position,
        /// Remaining health.
        health: i8,
    },
    /// Invading adventurer.
    Adventurer {
        /// Cell occupied by the adventurer.
        position: Position,
        /// Remaining health.
        health: i8,
    },
    /// Invading paladin.
    Paladin {
        /// Cell occupied by the paladin.
        position: Position,
        /// Remaining health.
        health: i8,
    },
    /// Invading priest with a flat armor bonus.
    Priest {
        /// Cell occupied by the priest.
        position: Position,
        /// Remaining health.
        health: i8,
    },
    /// Ladder through which reinforcements arrive.
    Ladder {
        /// Cell occupied by the ladder.
        position: Position,
    },
    /// Remains of a fallen entity.
    Skull {
        /// Cell occupied by the skull.
        position: Position,
    },
}

impl Entity {
    /// Creates an entity of `kind` at full health with empty counters.
    #[must_use]
    pub const fn fresh(kind: EntityKind, position: Position) -> Self {
        let health = kind.maximum_health();
        match kind {
            EntityKind::Player => Self::Player {
                position,
                energy: 0,
                armor: 0,
            },
            EntityKind::Skeleton => Self::Skeleton { position },
            EntityKind::Wraith => Self::Wraith { position, health },
            EntityKind::Adventurer => Self::Adventurer { position, health },
            EntityKind::Paladin => Self::Paladin { position, health },
            EntityKind::Priest => Self::Priest { position, health },
            EntityKind::Ladder => Self::Ladder { position },
            EntityKind::Skull => Self::Skull { position },
        }
    }

    /// Variant of the entity.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Player { .. } => EntityKind::Player,
            Self::Skeleton { .. } => EntityKind::Skeleton,
            Self::Wraith { .. } => EntityKind::Wraith,
            Self::Adventurer { .. } => EntityKind::Adventurer,
            Self::Paladin { .. } => EntityKind::Paladin,
            Self::Priest { .. } => EntityKind::Priest,
            Self::Ladder { .. } => EntityKind::Ladder,
            Self::Skull { .. } => EntityKind::Skull,
        }
    }

    /// Cell occupied by the entity.
    #[must_use]
    pub const fn position(&self) -> Position {
        match self {
            Self::Player { position, .. }
            | Self::Skeleton { position }
            | Self::Wraith { position, .. }
            | Self::Adventurer { position, .. }
            | Self::Paladin { position, .. }
            | Self::Priest { position, .. }
            | Self::Ladder { position }
            | Self::Skull { position } => *position,
        }
    }

    /// Remaining health of entities that track it.
    #[must_use]
    pub const fn health(&self) -> Option<i8> {
        match self {
            Self::Wraith { health, .. }
            | Self::Adventurer { health, .. }
            | Self::Paladin { health, .. }
            | Self::Priest { health, .. } => Some(*health),
            Self::Player { .. } | Self::Skeleton { .. } => Some(1),
            Self::Ladder { .. } | Self::Skull { .. } => None,
        }
    }

    /// Armor standing between a hit and the entity's health.
    ///
    /// Paladins and priests subtract it from every hit. The player's armor
    /// is worn down by the hits it absorbs. Skeletons and wraiths resolve
    /// hits through their own rules and carry none.
    #[must_use]
    pub const fn armor_boon(&self) -> i8 {
        match self {
            Self::Player { armor, .. } => *armor as i8,
            Self::Paladin { .. } | Self::Priest { .. } => 1,
            Self::Skeleton { .. }
            | Self::Wraith { .. }
            | Self::Adventurer { .. }
            | Self::Ladder { .. }
            | Self::Skull { .. } => 0,
        }
    }

    pub(crate) fn set_position(&mut self, target: Position) {
        match self {
            Self::Player { position, .. }
            | Self::Skeleton { position }
            | Self::Wraith { position, .. }
            | Self::Adventurer { position, .. }
            | Self::Paladin { position, .. }
            | Self::Priest { position, .. }
            | Self::Ladder { position }
            | Self::Skull { position } => *position = target,
        }
    }
}

/// Spatial map from packed positions to the entity occupying them.
///
/// At most one entity occupies any cell and every stored entity's position
/// equals the key it is stored under. At most one player exists.
#[derive(Clone, Debug, Default)]
pub struct EntityRegistry {
    entities: HashMap<u64, Entity>,
    player: Option<Position>,
}

impl EntityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Reports whether the registry holds no entity.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of live entities of `kind`.
    #[must_use]
    pub fn count(&self, kind: EntityKind) -> usize {
        self.entities
            .values()
            .filter(|entity| entity.kind() == kind)
            .count()
    }

    /// Variant of the entity at `position`.
    #[must_use]
    pub fn at(&self, position: Position) -> Option<EntityKind> {
        self.get(position).map(Entity::kind)
    }

    /// Entity stored at `position`.
    #[must_use]
    pub fn get(&self, position: Position) -> Option<&Entity> {
        self.entities.get(&position.key())
    }

    pub(crate) fn get_mut(&mut self, position: Position) -> Option<&mut Entity> {
        self.entities.get_mut(&position.key())
    }

    /// Reports whether any entity occupies `position`.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        self.entities.contains_key(&position.key())
    }

    /// Reports whether an entity of one of `kinds` occupies `position`.
    #[must_use]
    pub fn contains_any(&self, position: Position, kinds: &[EntityKind]) -> bool {
        self.at(position).is_some_and(|kind| kinds.contains(&kind))
    }

    /// Inserts `entity` at its own position.
    ///
    /// Fails without mutation when the cell is occupied or when a second
    /// player would be added.
    pub fn add(&mut self, entity: Entity) -> bool {
        let position = entity.position();
        if self.contains(position) {
            return false;
        }
        if entity.kind() == EntityKind::Player {
            if self.player.is_some() {
                return false;
            }
            self.player = Some(position);
        }
        let _ = self.entities.insert(position.key(), entity);
        true
    }

    /// Re-keys the entity at `from` onto `to`.
    ///
    /// Fails without mutation when `from` is empty or `to` is occupied.
    pub fn move_entity(&mut self, from: Position, to: Position) -> bool {
        if from == to || self.contains(to) {
            return false;
        }
        let Some(mut entity) = self.entities.remove(&from.key()) else {
            return false;
        };
        entity.set_position(to);
        if entity.kind() == EntityKind::Player {
            self.player = Some(to);
        }
        let _ = self.entities.insert(to.key(), entity);
        true
    }

    /// Deletes the entity at `position`.
    pub fn remove(&mut self, position: Position) -> bool {
        self.extract(position).is_some()
    }

    /// Removes the entity at `position` and hands it to the caller.
    pub fn extract(&mut self, position: Position) -> Option<Entity> {
        let entity = self.entities.remove(&position.key())?;
        if entity.kind() == EntityKind::Player {
            self.player = None;
        }
        Some(entity)
    }

    /// Places up to `count` entities of `kind` on random free open cells.
    ///
    /// Every placed entity keeps a Chebyshev distance of at least
    /// `min_distance` from other entities of the same kind. Returns the
    /// number of entities actually placed.
    pub fn spawn<R>(
        &mut self,
        kind: EntityKind,
        count: usize,
        map: &Map,
        rng: &mut R,
        min_distance: u32,
    ) -> usize
    where
        R: Rng + ?Sized,
    {
        let mut candidates: Vec<Position> = map
            .positions_with(ZoneRegion::Interior, CellTrait::Open)
            .filter(|position| !self.contains(*position))
            .collect();
        candidates.shuffle(rng);

        let mut placed_positions = self.positions_of(kind);
        let mut placed = 0;
        for candidate in candidates {
            if placed == count {
                break;
            }
            let spaced = placed_positions
                .iter()
                .all(|other| other.chebyshev_distance(candidate) >= min_distance);
            if spaced && self.add(Entity::fresh(kind, candidate)) {
                placed_positions.push(candidate);
                placed += 1;
            }
        }

        if placed < count {
            tracing::warn!(
                kind = kind.name(),
                requested = count,
                placed,
                "could not place every requested entity"
            );
        }
        placed
    }

    /// Positions of every entity of `kind` in ascending order.
    #[must_use]
    pub fn positions_of(&self, kind: EntityKind) -> Vec<Position> {
        let mut positions: Vec<Position> = self
            .entities
            .values()
            .filter(|entity| entity.kind() == kind)
            .map(Entity::position)
            .collect();
        positions.sort_unstable();
        positions
    }

    /// Non-player entities in update order, then by position.
    #[must_use]
    pub fn ordered(&self) -> Vec<Entity> {
        let mut entities: Vec<Entity> = self
            .entities
            .values()
            .filter(|entity| EntityKind::UPDATE_ORDER.contains(&entity.kind()))
            .copied()
            .collect();
        entities.sort_by_key(|entity| {
            let rank = EntityKind::UPDATE_ORDER
                .iter()
                .position(|kind| *kind == entity.kind());
            (rank, entity.position())
        });
        entities
    }

    /// Position of the player, if alive.
    #[must_use]
    pub const fn player_position(&self) -> Option<Position> {
        self.player
    }

    /// The player entity, if alive.
    #[must_use]
    pub fn player(&self) -> Option<&Entity> {
        self.player.and_then(|position| self.get(position))
    }

    /// Iterates every live entity in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }
}
