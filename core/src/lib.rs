#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Necrowarp engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters decode player input into
//! [`PlayerAction`] values, systems answer immutable world snapshots with
//! [`Command`] values, the world executes commands via its `apply` entry point
//! and broadcasts [`Event`] values describing what actually happened.

mod cell;

pub use cell::{
    Categorical, CellApplicator, CellState, CellTrait, MineralType, RockType, CLOSED_STATE,
    OPEN_STATE,
};

use serde::{Deserialize, Serialize};

/// Canonical title emitted when the experience boots.
pub const GAME_TITLE: &str = "Necrowarp v0.0.1";

/// Location of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    x: i32,
    y: i32,
}

impl Position {
    /// Creates a new grid position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the position.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the position.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Packs both coordinates into a single integer key.
    ///
    /// The packing is a bijection, so two positions share a key iff they are
    /// equal.
    #[must_use]
    pub const fn key(&self) -> u64 {
        ((self.x as u32 as u64) << 32) | (self.y as u32 as u64)
    }

    /// Restores a position from a key produced by [`Position::key`].
    #[must_use]
    pub const fn from_key(key: u64) -> Self {
        Self {
            x: (key >> 32) as u32 as i32,
            y: key as u32 as i32,
        }
    }

    /// Returns the neighbouring position in the provided direction.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Computes the Chebyshev distance between two positions.
    #[must_use]
    pub fn chebyshev_distance(self, other: Position) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// Iterates the eight surrounding positions in [`Direction::ALL`] order.
    pub fn neighbours(self) -> impl Iterator<Item = Position> {
        Direction::ALL.into_iter().map(move |direction| self.step(direction))
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Chebyshev movement directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Toward decreasing rows.
    North,
    /// Toward increasing columns.
    East,
    /// Toward increasing rows.
    South,
    /// Toward decreasing columns.
    West,
    /// Toward decreasing rows and increasing columns.
    Northeast,
    /// Toward increasing rows and increasing columns.
    Southeast,
    /// Toward increasing rows and decreasing columns.
    Southwest,
    /// Toward decreasing rows and decreasing columns.
    Northwest,
}

impl Direction {
    /// Fixed neighbourhood enumeration order: cardinals first, then diagonals.
    pub const ALL: [Direction; 8] = [
        Self::North,
        Self::East,
        Self::South,
        Self::West,
        Self::Northeast,
        Self::Southeast,
        Self::Southwest,
        Self::Northwest,
    ];

    /// Column and row delta for a single step.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
            Self::Northeast => (1, -1),
            Self::Southeast => (1, 1),
            Self::Southwest => (-1, 1),
            Self::Northwest => (-1, -1),
        }
    }

    /// Reports whether the direction moves along a single axis.
    #[must_use]
    pub const fn is_cardinal(self) -> bool {
        matches!(self, Self::North | Self::East | Self::South | Self::West)
    }
}

/// Dimensions of a rectangular grid measured in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    width: i32,
    height: i32,
}

impl Extent {
    /// Creates a new extent. Negative dimensions collapse to zero.
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self {
            width: if width < 0 { 0 } else { width },
            height: if height < 0 { 0 } else { height },
        }
    }

    /// Width in cells.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Height in cells.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Number of cells covered by the extent.
    #[must_use]
    pub const fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Part of a bordered grid addressed by an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ZoneRegion {
    /// Cells inside the border margin.
    Interior,
    /// Cells belonging to the border margin.
    Border,
    /// Every cell of the grid.
    All,
}

/// Grid extent paired with the width of its sealed border margin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    extent: Extent,
    border: Extent,
}

impl Bounds {
    /// Creates new bounds from a full extent and its border margin.
    #[must_use]
    pub const fn new(extent: Extent, border: Extent) -> Self {
        Self { extent, border }
    }

    /// Full extent including the border margin.
    #[must_use]
    pub const fn extent(&self) -> Extent {
        self.extent
    }

    /// Thickness of the border margin along each axis.
    #[must_use]
    pub const fn border(&self) -> Extent {
        self.border
    }

    /// Reports whether `position` lies inside the requested region.
    #[must_use]
    pub const fn within(&self, region: ZoneRegion, position: Position) -> bool {
        let inside = position.x >= 0
            && position.y >= 0
            && position.x < self.extent.width
            && position.y < self.extent.height;
        if !inside {
            return false;
        }

        let interior = position.x >= self.border.width
            && position.y >= self.border.height
            && position.x < self.extent.width - self.border.width
            && position.y < self.extent.height - self.border.height;

        match region {
            ZoneRegion::All => true,
            ZoneRegion::Interior => interior,
            ZoneRegion::Border => !interior,
        }
    }

    /// Row-major index of `position`, if it lies inside the full extent.
    #[must_use]
    pub fn index(&self, position: Position) -> Option<usize> {
        if !self.within(ZoneRegion::All, position) {
            return None;
        }
        let row = usize::try_from(position.y).ok()?;
        let column = usize::try_from(position.x).ok()?;
        let width = usize::try_from(self.extent.width).ok()?;
        Some(row * width + column)
    }

    /// Iterates every position of the requested region in row-major order.
    pub fn positions(self, region: ZoneRegion) -> impl Iterator<Item = Position> {
        let width = self.extent.width;
        (0..self.extent.height)
            .flat_map(move |y| (0..width).map(move |x| Position::new(x, y)))
            .filter(move |position| self.within(region, *position))
    }
}

/// Side an entity fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Alignment {
    /// The necromancer and the undead.
    Evil,
    /// Adventurers invading the crypt.
    Good,
    /// Terrain features and remains.
    Neutral,
}

impl Alignment {
    /// Reports whether two alignments fight each other.
    #[must_use]
    pub const fn opposes(self, other: Alignment) -> bool {
        matches!(
            (self, other),
            (Self::Evil, Self::Good) | (Self::Good, Self::Evil)
        )
    }
}

/// Every entity variant the registry can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// The necromancer controlled by the player.
    Player,
    /// Raised skeleton.
    Skeleton,
    /// Summoned wraith.
    Wraith,
    /// Invading adventurer.
    Adventurer,
    /// Invading paladin.
    Paladin,
    /// Invading priest.
    Priest,
    /// Ladder through which reinforcements arrive.
    Ladder,
    /// Remains left behind by the fallen.
    Skull,
}

impl EntityKind {
    /// Order in which non-player entities think and act every turn.
    pub const UPDATE_ORDER: [EntityKind; 5] = [
        Self::Skeleton,
        Self::Wraith,
        Self::Adventurer,
        Self::Paladin,
        Self::Priest,
    ];

    /// Side the entity fights for.
    #[must_use]
    pub const fn alignment(self) -> Alignment {
        match self {
            Self::Player | Self::Skeleton | Self::Wraith => Alignment::Evil,
            Self::Adventurer | Self::Paladin | Self::Priest => Alignment::Good,
            Self::Ladder | Self::Skull => Alignment::Neutral,
        }
    }

    /// Reports whether the entity never moves on its own.
    #[must_use]
    pub const fn is_static(self) -> bool {
        matches!(self, Self::Ladder | Self::Skull)
    }

    /// Reports whether the player can consume the entity.
    #[must_use]
    pub const fn is_consumable(self) -> bool {
        matches!(self, Self::Skull | Self::Skeleton)
    }

    /// Maximum health of a freshly created entity.
    #[must_use]
    pub const fn maximum_health(self) -> i8 {
        match self {
            Self::Player => 1,
            Self::Skeleton => 1,
            Self::Wraith => 8,
            Self::Adventurer => 1,
            Self::Paladin => 2,
            Self::Priest => 4,
            Self::Ladder | Self::Skull => 0,
        }
    }

    /// Damage the entity deals when it clashes.
    #[must_use]
    pub const fn maximum_damage(self) -> i8 {
        match self {
            Self::Player => 2,
            Self::Skeleton => 1,
            Self::Wraith => 2,
            Self::Adventurer => 1,
            Self::Paladin => 2,
            Self::Priest => 2,
            Self::Ladder | Self::Skull => 0,
        }
    }

    /// Lower-case name used in announcements.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Skeleton => "skeleton",
            Self::Wraith => "wraith",
            Self::Adventurer => "adventurer",
            Self::Paladin => "paladin",
            Self::Priest => "priest",
            Self::Ladder => "ladder",
            Self::Skull => "skull",
        }
    }
}

/// Discrete input decoded by adapters before it reaches the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerAction {
    /// Let the turn pass.
    Wait,
    /// Step, clash or consume toward the provided direction.
    Step(Direction),
    /// Warp to the cell under the cursor.
    Warp(Position),
    /// Warp to a random open cell.
    RandomWarp,
    /// Spend energy to summon a wraith next to the player.
    SummonWraith,
    /// Spend all energy to raise every skull as a skeleton.
    GrandSummoning,
    /// Mark every cell of the map as explored.
    RevealMap,
}

/// Kind of a [`Command`], used when reporting outcomes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    /// No effect.
    None,
    /// Relocation to an adjacent cell.
    Move,
    /// Melee combat between neighbours.
    Clash,
    /// Consumption of an adjacent entity.
    Consume,
    /// Warp onto an entity that is consumed on arrival.
    ConsumeWarp,
    /// Warp onto a selected empty cell.
    TargetWarp,
    /// Warp onto a random empty cell.
    RandomWarp,
    /// Summoning of a single wraith.
    SummonWraith,
    /// Raising of every skull.
    GrandSummoning,
    /// Arrival of a new entity.
    Spawn,
    /// Revelation of the entire map.
    RevealMap,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// The entity at `source` does nothing this turn.
    None {
        /// Position of the idle entity.
        source: Position,
    },
    /// Relocates the entity at `source` onto the empty `target`.
    Move {
        /// Position of the moving entity.
        source: Position,
        /// Adjacent empty destination.
        target: Position,
    },
    /// Entity at `source` attacks the entity at `target`.
    Clash {
        /// Position of the attacker.
        source: Position,
        /// Position of the defender.
        target: Position,
    },
    /// Entity at `source` consumes the adjacent entity at `target`.
    Consume {
        /// Position of the consumer.
        source: Position,
        /// Position of the consumed entity.
        target: Position,
    },
    /// Entity at `source` warps onto `target` and consumes what it finds there.
    ConsumeWarp {
        /// Position of the warping entity.
        source: Position,
        /// Position of the consumed entity.
        target: Position,
    },
    /// Entity at `source` warps onto the empty `target`.
    TargetWarp {
        /// Position of the warping entity.
        source: Position,
        /// Empty destination.
        target: Position,
    },
    /// Entity at `source` warps onto a destination drawn at random.
    RandomWarp {
        /// Position of the warping entity.
        source: Position,
        /// Destination drawn by the adapter's random source.
        target: Position,
    },
    /// Entity at `source` summons a wraith beside itself.
    SummonWraith {
        /// Position of the summoner.
        source: Position,
    },
    /// Entity at `source` raises every skull on the map.
    GrandSummoning {
        /// Position of the summoner.
        source: Position,
    },
    /// Places a new entity on the map.
    Spawn {
        /// Variant of the new entity.
        kind: EntityKind,
        /// Empty destination of the new entity.
        position: Position,
        /// Whether the arrival is announced in the message log.
        announce: bool,
    },
    /// Marks every map cell as explored.
    RevealMap,
}

impl Command {
    /// Kind of the command.
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        match self {
            Self::None { .. } => CommandKind::None,
            Self::Move { .. } => CommandKind::Move,
            Self::Clash { .. } => CommandKind::Clash,
            Self::Consume { .. } => CommandKind::Consume,
            Self::ConsumeWarp { .. } => CommandKind::ConsumeWarp,
            Self::TargetWarp { .. } => CommandKind::TargetWarp,
            Self::RandomWarp { .. } => CommandKind::RandomWarp,
            Self::SummonWraith { .. } => CommandKind::SummonWraith,
            Self::GrandSummoning { .. } => CommandKind::GrandSummoning,
            Self::Spawn { .. } => CommandKind::Spawn,
            Self::RevealMap => CommandKind::RevealMap,
        }
    }

    /// Position of the entity issuing the command, if any.
    #[must_use]
    pub const fn source(&self) -> Option<Position> {
        match self {
            Self::None { source }
            | Self::Move { source, .. }
            | Self::Clash { source, .. }
            | Self::Consume { source, .. }
            | Self::ConsumeWarp { source, .. }
            | Self::TargetWarp { source, .. }
            | Self::RandomWarp { source, .. }
            | Self::SummonWraith { source }
            | Self::GrandSummoning { source } => Some(*source),
            Self::Spawn { .. } | Self::RevealMap => None,
        }
    }

    /// Position the command acts upon, if any.
    #[must_use]
    pub const fn target(&self) -> Option<Position> {
        match self {
            Self::Move { target, .. }
            | Self::Clash { target, .. }
            | Self::Consume { target, .. }
            | Self::ConsumeWarp { target, .. }
            | Self::TargetWarp { target, .. }
            | Self::RandomWarp { target, .. } => Some(*target),
            Self::Spawn { position, .. } => Some(*position),
            Self::None { .. }
            | Self::SummonWraith { .. }
            | Self::GrandSummoning { .. }
            | Self::RevealMap => None,
        }
    }
}

/// Reasons a command may be rejected by the world before any mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandRejection {
    /// No entity occupies the command's source.
    MissingSource,
    /// No entity occupies the command's target.
    MissingTarget,
    /// The target lies outside the map interior.
    OutOfBounds,
    /// The target cell is solid rock.
    Solid,
    /// The target cell is already occupied.
    Occupied,
    /// Source and target are not neighbours.
    NotAdjacent,
    /// The source entity cannot perform the command.
    NotPermitted,
    /// The entities involved are not enemies.
    NotHostile,
    /// The target cannot be consumed.
    NotConsumable,
    /// The source lacks the energy the command costs.
    InsufficientEnergy,
    /// No free cell is available for the summoned entity.
    NoFreePosition,
    /// There are no skulls to raise.
    NothingToRaise,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A turn finished resolving.
    TurnAdvanced {
        /// Index of the completed turn, starting at one.
        turn: u64,
    },
    /// An entity moved to an adjacent cell.
    EntityMoved {
        /// Variant of the entity.
        kind: EntityKind,
        /// Cell before the move.
        from: Position,
        /// Cell after the move.
        to: Position,
    },
    /// An entity warped across the map.
    EntityWarped {
        /// Variant of the entity.
        kind: EntityKind,
        /// Cell before the warp.
        from: Position,
        /// Cell after the warp.
        to: Position,
    },
    /// Two entities clashed.
    Clashed {
        /// Variant of the attacker.
        attacker: EntityKind,
        /// Variant of the defender.
        defender: EntityKind,
        /// Cell of the defender.
        target: Position,
        /// Health removed from the defender.
        damage: i8,
    },
    /// An entity died and left the registry.
    EntityDied {
        /// Variant of the dead entity.
        kind: EntityKind,
        /// Cell the entity occupied.
        position: Position,
    },
    /// An entity was consumed.
    EntityConsumed {
        /// Variant of the consumed entity.
        kind: EntityKind,
        /// Cell the entity occupied.
        position: Position,
    },
    /// A new entity appeared.
    EntitySpawned {
        /// Variant of the new entity.
        kind: EntityKind,
        /// Cell the entity occupies.
        position: Position,
    },
    /// Every cell of the map became explored.
    MapRevealed,
    /// The player died; the session is over.
    PlayerDied {
        /// Cell the player occupied.
        position: Position,
    },
    /// A command was rejected before any mutation.
    CommandRejected {
        /// Kind of the rejected command.
        kind: CommandKind,
        /// Specific reason for the rejection.
        reason: CommandRejection,
    },
}
