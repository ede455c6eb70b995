//! Authoritative terrain grid.

use necrowarp_core::{Bounds, CellState, CellTrait, Extent, Position, ZoneRegion};
use rand::{seq::IteratorRandom, Rng};

/// Fixed-size grid of cells surrounded by a sealed border margin.
///
/// Maps are produced by compiling a generated [`crate::Region`]; afterwards
/// only trait-level updates (revealing, partition pruning) touch the cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Map {
    bounds: Bounds,
    cells: Vec<CellState>,
}

impl Map {
    /// Creates a map where every cell holds `state`.
    #[must_use]
    pub fn filled(bounds: Bounds, state: CellState) -> Self {
        Self {
            bounds,
            cells: vec![state; bounds.extent().area()],
        }
    }

    pub(crate) fn from_parts(bounds: Bounds, cells: Vec<CellState>) -> Self {
        debug_assert_eq!(cells.len(), bounds.extent().area());
        Self { bounds, cells }
    }

    /// Extent and border margin of the map.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Full extent of the map including the border.
    #[must_use]
    pub const fn extent(&self) -> Extent {
        self.bounds.extent()
    }

    /// Reports whether `position` lies inside the requested region.
    #[must_use]
    pub const fn within(&self, region: ZoneRegion, position: Position) -> bool {
        self.bounds.within(region, position)
    }

    /// State of the cell at `position`, if it lies on the map.
    #[must_use]
    pub fn get(&self, position: Position) -> Option<CellState> {
        self.bounds
            .index(position)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Mutable state of the cell at `position`, if it lies on the map.
    pub fn get_mut(&mut self, position: Position) -> Option<&mut CellState> {
        let index = self.bounds.index(position)?;
        self.cells.get_mut(index)
    }

    /// Reports whether the cell at `position` exhibits `cell_trait`.
    ///
    /// Positions outside the map never exhibit any trait.
    #[must_use]
    pub fn has(&self, position: Position, cell_trait: CellTrait) -> bool {
        self.get(position)
            .is_some_and(|state| state.has(cell_trait))
    }

    /// Reports whether the cell at `position` lies in `region` and is open.
    #[must_use]
    pub fn is_open(&self, region: ZoneRegion, position: Position) -> bool {
        self.within(region, position) && self.has(position, CellTrait::Open)
    }

    /// Sets `cell_trait` on every cell of `region`.
    pub fn apply(&mut self, region: ZoneRegion, cell_trait: CellTrait) {
        for position in self.bounds.positions(region) {
            if let Some(cell) = self.get_mut(position) {
                cell.set(cell_trait);
            }
        }
    }

    /// Iterates the positions of `region` whose cells exhibit `cell_trait`.
    pub fn positions_with(
        &self,
        region: ZoneRegion,
        cell_trait: CellTrait,
    ) -> impl Iterator<Item = Position> + '_ {
        self.bounds
            .positions(region)
            .filter(move |position| self.has(*position, cell_trait))
    }

    /// Counts the cells of `region` exhibiting `cell_trait`.
    #[must_use]
    pub fn count(&self, region: ZoneRegion, cell_trait: CellTrait) -> usize {
        self.positions_with(region, cell_trait).count()
    }

    /// Draws a uniformly random position of `region` exhibiting `cell_trait`.
    ///
    /// Returns `None` when no cell qualifies.
    pub fn find_random<R>(
        &self,
        region: ZoneRegion,
        rng: &mut R,
        cell_trait: CellTrait,
    ) -> Option<Position>
    where
        R: Rng + ?Sized,
    {
        self.positions_with(region, cell_trait).choose(rng)
    }

    /// Dense cell states stored in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }
}
