//! Cellular-automaton cave generation.

use std::cmp::Ordering;

use necrowarp_core::{
    Bounds, Categorical, CellApplicator, CellState, CellTrait, Direction, Position, ZoneRegion,
    CLOSED_STATE,
};
use rand::{seq::SliceRandom, Rng};
use thiserror::Error;

use crate::Map;

/// Fraction of interior cells seeded solid before the automaton runs.
pub const DEFAULT_FILL_PERCENT: f64 = 0.425;
/// Number of automaton iterations.
pub const DEFAULT_ITERATIONS: u32 = 128;
/// Solid-neighbour count separating rock from open ground.
pub const DEFAULT_THRESHOLD: u32 = 4;

/// Parameters steering the cellular automaton.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationParams {
    /// Probability that a cell is seeded solid.
    pub fill_percent: f64,
    /// Upper bound on the number of automaton iterations.
    pub iterations: u32,
    /// Moore-neighbourhood solid count above which a cell becomes solid and
    /// below which it opens.
    pub threshold: u32,
}

impl GenerationParams {
    /// Verifies that the parameters describe a meaningful automaton.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if !(0.0..=1.0).contains(&self.fill_percent) {
            return Err(GenerationError::InvalidFillPercent(self.fill_percent));
        }
        if self.threshold > 8 {
            return Err(GenerationError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            fill_percent: DEFAULT_FILL_PERCENT,
            iterations: DEFAULT_ITERATIONS,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Failures raised while generating or compiling terrain.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum GenerationError {
    /// Fill probability outside `0.0..=1.0`.
    #[error("fill percent {0} is outside 0.0..=1.0")]
    InvalidFillPercent(f64),
    /// Threshold larger than the eight-cell neighbourhood.
    #[error("threshold {0} exceeds the eight-cell neighbourhood")]
    InvalidThreshold(u32),
    /// Supplied cells do not cover the requested bounds.
    #[error("expected {expected} cells but received {actual}")]
    CellCountMismatch {
        /// Number of cells the bounds require.
        expected: usize,
        /// Number of cells supplied.
        actual: usize,
    },
    /// The terrain contains no open cell at all.
    #[error("terrain contains no open area")]
    NoOpenArea,
}

/// Raw cell grid produced by generation passes and compiled into a [`Map`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    bounds: Bounds,
    cells: Vec<CellState>,
}

impl Region {
    /// Creates a region of default cells.
    #[must_use]
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            cells: vec![CellState::default(); bounds.extent().area()],
        }
    }

    /// Wraps previously generated cells, for example from a region file.
    pub fn from_cells(bounds: Bounds, cells: Vec<CellState>) -> Result<Self, GenerationError> {
        let expected = bounds.extent().area();
        if cells.len() != expected {
            return Err(GenerationError::CellCountMismatch {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self { bounds, cells })
    }

    /// Extent and border margin of the region.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Dense cell states stored in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    /// Overwrites the traits of every cell in `region` with those of `state`.
    pub fn set(&mut self, region: ZoneRegion, state: CellState) {
        for position in self.bounds.positions(region) {
            if let Some(cell) = self.cell_mut(position) {
                cell.assume_traits(state);
            }
        }
    }

    /// Runs the cellular automaton over `region`.
    ///
    /// Each cell is seeded solid with probability `fill_percent`, then the
    /// Moore-neighbourhood rule turns a cell solid when more than `threshold`
    /// neighbours are solid, open when fewer are, and leaves it unchanged on
    /// an exact tie. Cells outside `region` are
    /// read but never written; positions beyond the grid count as solid.
    /// Iteration stops early once a pass changes nothing.
    pub fn generate<R>(
        &mut self,
        region: ZoneRegion,
        rng: &mut R,
        params: &GenerationParams,
        applicator: &CellApplicator,
    ) -> Result<(), GenerationError>
    where
        R: Rng + ?Sized,
    {
        params.validate()?;

        let positions: Vec<Position> = self.bounds.positions(region).collect();
        for position in &positions {
            let solid = rng.gen_bool(params.fill_percent);
            if let Some(cell) = self.cell_mut(*position) {
                cell.assume_traits(applicator.apply(solid));
            }
        }

        let mut next = Vec::with_capacity(positions.len());
        for iteration in 0..params.iterations {
            next.clear();
            next.extend(positions.iter().filter_map(|position| {
                let solid = match self.solid_neighbours(*position).cmp(&params.threshold) {
                    Ordering::Greater => true,
                    Ordering::Less => false,
                    Ordering::Equal => return None,
                };
                Some((*position, solid))
            }));

            let mut changed = false;
            for (position, solid) in next.iter().copied() {
                if let Some(cell) = self.cell_mut(position) {
                    if cell.is_solid() != solid {
                        changed = true;
                        cell.assume_traits(applicator.apply(solid));
                    }
                }
            }

            if !changed {
                tracing::debug!(iteration, "cellular automaton converged");
                break;
            }
        }

        Ok(())
    }

    /// Replaces isolated pockets of `cell_trait`.
    ///
    /// Every cell of `region` exhibiting `cell_trait` whose neighbour mask
    /// equals `mask` receives `replacement`. Bit `i` of the mask is set when
    /// the neighbour in direction [`Direction::ALL`]`[i]` also exhibits
    /// `cell_trait`; a mask of zero therefore selects single-cell pockets.
    pub fn collapse(
        &mut self,
        region: ZoneRegion,
        cell_trait: CellTrait,
        mask: u8,
        replacement: CellTrait,
    ) {
        let collapsing: Vec<Position> = self
            .bounds
            .positions(region)
            .filter(|position| self.has(*position, cell_trait))
            .filter(|position| self.neighbour_mask(*position, cell_trait) == mask)
            .collect();

        for position in collapsing {
            if let Some(cell) = self.cell_mut(position) {
                cell.set(replacement);
            }
        }
    }

    /// Assigns `first` with probability `probability` and `second` otherwise.
    pub fn randomize<R>(
        &mut self,
        region: ZoneRegion,
        rng: &mut R,
        probability: f64,
        first: CellTrait,
        second: CellTrait,
    ) where
        R: Rng + ?Sized,
    {
        let probability = probability.clamp(0.0, 1.0);
        for position in self.bounds.positions(region) {
            let chosen = if rng.gen_bool(probability) {
                first
            } else {
                second
            };
            if let Some(cell) = self.cell_mut(position) {
                cell.set(chosen);
            }
        }
    }

    /// Draws a rock type uniformly for every cell of `region`.
    pub fn randomize_rock<R>(&mut self, region: ZoneRegion, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        self.randomize_category(region, rng, CellState::set_rock);
    }

    /// Draws a mineral deposit uniformly for every cell of `region`.
    pub fn randomize_mineral<R>(&mut self, region: ZoneRegion, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        self.randomize_category(region, rng, CellState::set_mineral);
    }

    /// Seals the border and produces the authoritative map.
    #[must_use]
    pub fn compile(mut self) -> Map {
        self.set(ZoneRegion::Border, CLOSED_STATE);
        Map::from_parts(self.bounds, self.cells)
    }

    fn randomize_category<C, R>(
        &mut self,
        region: ZoneRegion,
        rng: &mut R,
        assign: fn(&mut CellState, C),
    ) where
        C: Categorical,
        R: Rng + ?Sized,
    {
        for position in self.bounds.positions(region) {
            let Some(value) = C::VARIANTS.choose(rng).copied() else {
                return;
            };
            if let Some(cell) = self.cell_mut(position) {
                assign(cell, value);
            }
        }
    }

    fn cell_mut(&mut self, position: Position) -> Option<&mut CellState> {
        let index = self.bounds.index(position)?;
        self.cells.get_mut(index)
    }

    fn has(&self, position: Position, cell_trait: CellTrait) -> bool {
        self.bounds
            .index(position)
            .and_then(|index| self.cells.get(index))
            .is_some_and(|cell| cell.has(cell_trait))
    }

    fn solid_neighbours(&self, position: Position) -> u32 {
        position
            .neighbours()
            .filter(|neighbour| match self.bounds.index(*neighbour) {
                Some(index) => self.cells.get(index).map_or(true, CellState::is_solid),
                None => true,
            })
            .count() as u32
    }

    fn neighbour_mask(&self, position: Position, cell_trait: CellTrait) -> u8 {
        Direction::ALL
            .iter()
            .enumerate()
            .filter(|(_, direction)| self.has(position.step(**direction), cell_trait))
            .fold(0u8, |mask, (bit, _)| mask | (1 << bit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use necrowarp_core::{Extent, OPEN_STATE};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn bounds() -> Bounds {
        Bounds::new(Extent::new(24, 16), Extent::new(2, 2))
    }

    fn applicator() -> CellApplicator {
        CellApplicator::new(CLOSED_STATE, OPEN_STATE)
    }

    fn generated(seed: u64) -> Region {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut region = Region::new(bounds());
        region.set(ZoneRegion::Border, CLOSED_STATE);
        region
            .generate(
                ZoneRegion::Interior,
                &mut rng,
                &GenerationParams::default(),
                &applicator(),
            )
            .expect("default parameters are valid");
        region
    }

    #[test]
    fn same_seed_produces_same_region() {
        assert_eq!(generated(11), generated(11));
    }

    #[test]
    fn automaton_leaves_border_untouched() {
        let region = generated(3);
        for position in region.bounds().positions(ZoneRegion::Border) {
            assert!(region.has(position, CellTrait::Solid), "{position}");
        }
    }

    #[test]
    fn zero_fill_with_unreachable_threshold_opens_everything() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut region = Region::new(bounds());
        region.set(ZoneRegion::All, CLOSED_STATE);
        let params = GenerationParams {
            fill_percent: 0.0,
            iterations: 4,
            threshold: 8,
        };
        region
            .generate(ZoneRegion::Interior, &mut rng, &params, &applicator())
            .expect("valid parameters");
        // No cell can exceed eight solid neighbours, so threshold 8 never closes one.
        let map = region.compile();
        assert_eq!(
            map.count(ZoneRegion::Interior, CellTrait::Open),
            20 * 12
        );
    }

    #[test]
    fn cells_on_the_threshold_keep_their_state() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut region = Region::new(bounds());
        region.set(ZoneRegion::All, CLOSED_STATE);
        let params = GenerationParams {
            fill_percent: 0.0,
            iterations: 1,
            threshold: 3,
        };
        region
            .generate(ZoneRegion::Interior, &mut rng, &params, &applicator())
            .expect("valid parameters");

        // Corner: five solid neighbours. Edge: exactly three. Centre: none.
        assert!(region.has(Position::new(2, 2), CellTrait::Solid));
        assert!(region.has(Position::new(8, 2), CellTrait::Open));
        assert!(region.has(Position::new(8, 8), CellTrait::Open));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut region = Region::new(bounds());
        let params = GenerationParams {
            fill_percent: 1.5,
            ..GenerationParams::default()
        };
        assert_eq!(
            region.generate(ZoneRegion::Interior, &mut rng, &params, &applicator()),
            Err(GenerationError::InvalidFillPercent(1.5))
        );
        let params = GenerationParams {
            threshold: 9,
            ..GenerationParams::default()
        };
        assert_eq!(
            region.generate(ZoneRegion::Interior, &mut rng, &params, &applicator()),
            Err(GenerationError::InvalidThreshold(9))
        );
    }

    #[test]
    fn collapse_removes_isolated_pockets_only() {
        let mut region = Region::new(bounds());
        region.set(ZoneRegion::All, OPEN_STATE);
        region.set(ZoneRegion::Border, CLOSED_STATE);
        let lonely = Position::new(6, 6);
        let pair = [Position::new(10, 8), Position::new(11, 8)];
        for position in std::iter::once(lonely).chain(pair) {
            if let Some(cell) = region.cell_mut(position) {
                cell.set(CellTrait::Solid);
            }
        }

        region.collapse(ZoneRegion::Interior, CellTrait::Solid, 0x00, CellTrait::Open);

        assert!(region.has(lonely, CellTrait::Open));
        assert!(pair
            .iter()
            .all(|position| region.has(*position, CellTrait::Solid)));
    }

    #[test]
    fn randomize_respects_extreme_probabilities() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut region = Region::new(bounds());
        region.randomize(
            ZoneRegion::All,
            &mut rng,
            1.0,
            CellTrait::Rough,
            CellTrait::Smooth,
        );
        assert!(region.cells().iter().all(|cell| cell.has(CellTrait::Rough)));
        region.randomize(
            ZoneRegion::Interior,
            &mut rng,
            0.0,
            CellTrait::Rough,
            CellTrait::Smooth,
        );
        assert!(region.has(Position::new(0, 0), CellTrait::Rough));
        assert!(region.has(Position::new(5, 5), CellTrait::Smooth));
    }

    #[test]
    fn decorative_passes_do_not_change_passability() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let mut region = generated(21);
        let before: Vec<bool> = region.cells().iter().map(CellState::is_solid).collect();
        region.randomize(
            ZoneRegion::All,
            &mut rng,
            0.25,
            CellTrait::Smooth,
            CellTrait::Rough,
        );
        region.randomize(
            ZoneRegion::All,
            &mut rng,
            2.0 / 3.0,
            CellTrait::Protrudes,
            CellTrait::Recedes,
        );
        region.randomize_rock(ZoneRegion::All, &mut rng);
        region.randomize_mineral(ZoneRegion::All, &mut rng);
        let after: Vec<bool> = region.cells().iter().map(CellState::is_solid).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn compile_seals_the_border() {
        let mut region = Region::new(bounds());
        region.set(ZoneRegion::All, OPEN_STATE);
        let map = region.compile();
        for position in map.bounds().positions(ZoneRegion::Border) {
            let cell = map.get(position).expect("border cell exists");
            assert!(cell.has(CellTrait::Solid));
            assert!(cell.has(CellTrait::Opaque));
            assert!(cell.has(CellTrait::Seen));
            assert!(cell.has(CellTrait::Explored));
        }
        assert!(map.is_open(ZoneRegion::Interior, Position::new(2, 2)));
    }

    #[test]
    fn from_cells_checks_the_cell_count() {
        let error = Region::from_cells(bounds(), vec![CellState::default(); 3])
            .expect_err("cell count mismatch");
        assert_eq!(
            error,
            GenerationError::CellCountMismatch {
                expected: 24 * 16,
                actual: 3
            }
        );
    }
}
