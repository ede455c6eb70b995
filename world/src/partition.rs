//! Connected-area analysis used to keep the map traversable.

use std::collections::{HashSet, VecDeque};

use necrowarp_core::{CellTrait, Direction, Position, ZoneRegion};

use crate::{GenerationError, Map};

/// Maximal 4-connected set of interior cells sharing a trait.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Area {
    positions: Vec<Position>,
}

impl Area {
    /// Number of cells in the area.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Reports whether the area holds no cell.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Reports whether `position` belongs to the area.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        self.positions.binary_search(&position).is_ok()
    }

    /// Cells of the area in ascending order.
    #[must_use]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Sets `cell_trait` on every cell of the area.
    pub fn apply(&self, map: &mut Map, cell_trait: CellTrait) {
        for position in &self.positions {
            if let Some(cell) = map.get_mut(*position) {
                cell.set(cell_trait);
            }
        }
    }
}

/// Splits the interior cells exhibiting `cell_trait` into 4-connected areas.
///
/// Areas are returned in the order their first cell is met during a
/// row-major scan.
#[must_use]
pub fn partition(map: &Map, cell_trait: CellTrait) -> Vec<Area> {
    let mut visited: HashSet<Position> = HashSet::new();
    let mut areas = Vec::new();

    for start in map.positions_with(ZoneRegion::Interior, cell_trait) {
        if !visited.insert(start) {
            continue;
        }

        let mut positions = vec![start];
        let mut frontier = VecDeque::from([start]);
        while let Some(current) = frontier.pop_front() {
            for direction in Direction::ALL.into_iter().filter(|d| d.is_cardinal()) {
                let next = current.step(direction);
                if map.within(ZoneRegion::Interior, next)
                    && map.has(next, cell_trait)
                    && visited.insert(next)
                {
                    positions.push(next);
                    frontier.push_back(next);
                }
            }
        }

        positions.sort_unstable();
        areas.push(Area { positions });
    }

    areas
}

/// Keeps only the largest open area, filling every other one with rock.
///
/// Ties go to the area found first. Fails when the map has no open cell.
pub fn prune_to_largest(map: &mut Map) -> Result<Area, GenerationError> {
    let areas = partition(map, CellTrait::Open);
    let mut largest: Option<usize> = None;
    for (index, area) in areas.iter().enumerate() {
        if largest.map_or(true, |best| area.len() > areas[best].len()) {
            largest = Some(index);
        }
    }
    let Some(largest) = largest else {
        return Err(GenerationError::NoOpenArea);
    };

    let mut kept = None;
    for (index, area) in areas.into_iter().enumerate() {
        if index == largest {
            kept = Some(area);
        } else {
            area.apply(map, CellTrait::Solid);
            area.apply(map, CellTrait::Opaque);
        }
    }

    let kept = kept.ok_or(GenerationError::NoOpenArea)?;
    tracing::debug!(cells = kept.len(), "pruned map to its largest open area");
    Ok(kept)
}
