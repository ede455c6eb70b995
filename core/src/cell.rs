//! Terrain cell model shared by generation, pathfinding and presentation.

use serde::{Deserialize, Serialize};

/// Individual trait a [`CellState`] may exhibit.
///
/// Traits come in complementary pairs. Every pair occupies a single bit of the
/// underlying state, so exactly one trait of each pair holds for any cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellTrait {
    /// The cell can be entered.
    Open,
    /// The cell is rock and blocks movement.
    Solid,
    /// Light passes through the cell.
    Transparent,
    /// The cell blocks line of sight.
    Opaque,
    /// The cell has not been seen yet.
    Unseen,
    /// The cell has been seen at least once.
    Seen,
    /// The cell has not been explored yet.
    Unexplored,
    /// The cell has been explored.
    Explored,
    /// The cell surface is smooth.
    Smooth,
    /// The cell surface is rough.
    Rough,
    /// The cell surface protrudes.
    Protrudes,
    /// The cell surface recedes.
    Recedes,
}

impl CellTrait {
    /// Returns the complementary trait of the pair containing `self`.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Open => Self::Solid,
            Self::Solid => Self::Open,
            Self::Transparent => Self::Opaque,
            Self::Opaque => Self::Transparent,
            Self::Unseen => Self::Seen,
            Self::Seen => Self::Unseen,
            Self::Unexplored => Self::Explored,
            Self::Explored => Self::Unexplored,
            Self::Smooth => Self::Rough,
            Self::Rough => Self::Smooth,
            Self::Protrudes => Self::Recedes,
            Self::Recedes => Self::Protrudes,
        }
    }

    const fn bit(self) -> (u8, bool) {
        match self {
            Self::Open => (SOLID_BIT, false),
            Self::Solid => (SOLID_BIT, true),
            Self::Transparent => (OPAQUE_BIT, false),
            Self::Opaque => (OPAQUE_BIT, true),
            Self::Unseen => (SEEN_BIT, false),
            Self::Seen => (SEEN_BIT, true),
            Self::Unexplored => (EXPLORED_BIT, false),
            Self::Explored => (EXPLORED_BIT, true),
            Self::Smooth => (ROUGH_BIT, false),
            Self::Rough => (ROUGH_BIT, true),
            Self::Protrudes => (RECEDES_BIT, false),
            Self::Recedes => (RECEDES_BIT, true),
        }
    }
}

const SOLID_BIT: u8 = 1 << 0;
const OPAQUE_BIT: u8 = 1 << 1;
const SEEN_BIT: u8 = 1 << 2;
const EXPLORED_BIT: u8 = 1 << 3;
const ROUGH_BIT: u8 = 1 << 4;
const RECEDES_BIT: u8 = 1 << 5;

/// Kind of rock a cell is carved from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RockType {
    /// Coarse igneous rock.
    #[default]
    Granite,
    /// Dark volcanic rock.
    Basalt,
    /// Pale sedimentary rock.
    Limestone,
    /// Layered sedimentary rock.
    Sandstone,
    /// Fine-grained metamorphic rock.
    Slate,
    /// Veined metamorphic rock.
    Marble,
}

/// Mineral deposit embedded in a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MineralType {
    /// No notable deposit.
    #[default]
    None,
    /// Coal seam.
    Coal,
    /// Iron ore.
    Iron,
    /// Copper ore.
    Copper,
    /// Silver vein.
    Silver,
    /// Gold vein.
    Gold,
    /// Quartz crystals.
    Quartz,
}

/// Closed set of values that can be drawn uniformly during generation.
pub trait Categorical: Copy + 'static {
    /// Every value of the category in declaration order.
    const VARIANTS: &'static [Self];
}

impl Categorical for RockType {
    const VARIANTS: &'static [Self] = &[
        Self::Granite,
        Self::Basalt,
        Self::Limestone,
        Self::Sandstone,
        Self::Slate,
        Self::Marble,
    ];
}

impl Categorical for MineralType {
    const VARIANTS: &'static [Self] = &[
        Self::None,
        Self::Coal,
        Self::Iron,
        Self::Copper,
        Self::Silver,
        Self::Gold,
        Self::Quartz,
    ];
}

/// Bit set describing the state of a single terrain cell.
///
/// The default state is open, transparent, unseen, unexplored, smooth and
/// protruding granite without minerals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellState {
    bits: u8,
    rock: RockType,
    mineral: MineralType,
}

impl CellState {
    /// Builds a state holding every provided trait on top of the default state.
    #[must_use]
    pub const fn from_traits(traits: &[CellTrait]) -> Self {
        let mut state = Self {
            bits: 0,
            rock: RockType::Granite,
            mineral: MineralType::None,
        };
        let mut index = 0;
        while index < traits.len() {
            state = state.with(traits[index]);
            index += 1;
        }
        state
    }

    /// Returns a copy of the state with `cell_trait` set.
    #[must_use]
    pub const fn with(self, cell_trait: CellTrait) -> Self {
        let (bit, value) = cell_trait.bit();
        let bits = if value {
            self.bits | bit
        } else {
            self.bits & !bit
        };
        Self { bits, ..self }
    }

    /// Reports whether the state exhibits the provided trait.
    #[must_use]
    pub const fn has(&self, cell_trait: CellTrait) -> bool {
        let (bit, value) = cell_trait.bit();
        (self.bits & bit != 0) == value
    }

    /// Sets the provided trait, clearing its complement.
    pub fn set(&mut self, cell_trait: CellTrait) {
        *self = self.with(cell_trait);
    }

    /// Reports whether the cell blocks movement.
    #[must_use]
    pub const fn is_solid(&self) -> bool {
        self.has(CellTrait::Solid)
    }

    /// Reports whether the cell can be entered.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.has(CellTrait::Open)
    }

    /// Rock the cell is carved from.
    #[must_use]
    pub const fn rock(&self) -> RockType {
        self.rock
    }

    /// Mineral deposit embedded in the cell.
    #[must_use]
    pub const fn mineral(&self) -> MineralType {
        self.mineral
    }

    /// Replaces the rock type of the cell.
    pub fn set_rock(&mut self, rock: RockType) {
        self.rock = rock;
    }

    /// Replaces the mineral deposit of the cell.
    pub fn set_mineral(&mut self, mineral: MineralType) {
        self.mineral = mineral;
    }

    /// Copies the traits of `other` while keeping this cell's rock and mineral.
    pub fn assume_traits(&mut self, other: CellState) {
        self.bits = other.bits;
    }
}

/// Maps a boolean generator output onto one of two cell states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellApplicator {
    solid: CellState,
    open: CellState,
}

impl CellApplicator {
    /// Creates an applicator producing `solid` for `true` and `open` for `false`.
    #[must_use]
    pub const fn new(solid: CellState, open: CellState) -> Self {
        Self { solid, open }
    }

    /// Resolves the state applied for the provided generator output.
    #[must_use]
    pub const fn apply(&self, solid: bool) -> CellState {
        if solid {
            self.solid
        } else {
            self.open
        }
    }
}

/// Open, transparent cell that the player already knows about.
pub const OPEN_STATE: CellState = CellState::from_traits(&[
    CellTrait::Open,
    CellTrait::Transparent,
    CellTrait::Seen,
    CellTrait::Explored,
]);

/// Solid, opaque cell that the player already knows about.
pub const CLOSED_STATE: CellState = CellState::from_traits(&[
    CellTrait::Solid,
    CellTrait::Opaque,
    CellTrait::Seen,
    CellTrait::Explored,
]);
