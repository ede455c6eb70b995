//! Integration fields steering AI descent.

use std::{
    collections::{BTreeSet, VecDeque},
    ops::{AddAssign, SubAssign},
};

use necrowarp_core::{Bounds, CellTrait, Position, ZoneRegion};

use crate::{EntityRegistry, Map};

/// Multi-source breadth-first distance field over open cells.
///
/// Goals hold the value `0`, every other reachable cell holds its graph
/// distance to the nearest goal under 8-connected movement and unreachable
/// cells hold [`GoalMap::UNREACHABLE`]. The field only changes on an explicit
/// [`GoalMap::recalculate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoalMap {
    bounds: Bounds,
    goals: BTreeSet<Position>,
    values: Vec<u32>,
    stale: bool,
}

impl GoalMap {
    /// Sentinel stored for cells no goal can reach.
    pub const UNREACHABLE: u32 = u32::MAX;

    /// Creates an empty field covering `bounds`.
    #[must_use]
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            goals: BTreeSet::new(),
            values: vec![Self::UNREACHABLE; bounds.extent().area()],
            stale: true,
        }
    }

    /// Adds a goal cell and marks the field stale.
    pub fn add_goal(&mut self, position: Position) {
        if self.goals.insert(position) {
            self.stale = true;
        }
    }

    /// Removes a goal cell and marks the field stale.
    pub fn remove_goal(&mut self, position: Position) {
        if self.goals.remove(&position) {
            self.stale = true;
        }
    }

    /// Removes every goal.
    pub fn clear_goals(&mut self) {
        if !self.goals.is_empty() {
            self.goals.clear();
            self.stale = true;
        }
    }

    /// Reports whether goals changed since the last recalculation.
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        self.stale
    }

    /// Rebuilds the field from the current goals.
    ///
    /// Only cells of `region` exhibiting `open_trait` are visited. Cells
    /// holding static entities block the wavefront unless they are goals.
    pub fn recalculate(
        &mut self,
        region: ZoneRegion,
        map: &Map,
        open_trait: CellTrait,
        registry: &EntityRegistry,
    ) {
        self.values.fill(Self::UNREACHABLE);

        let passable = |position: Position| {
            map.within(region, position)
                && map.has(position, open_trait)
                && !registry.at(position).is_some_and(|kind| kind.is_static())
        };

        let mut frontier = VecDeque::new();
        for goal in &self.goals {
            if !(map.within(region, *goal) && map.has(*goal, open_trait)) {
                continue;
            }
            if let Some(index) = self.bounds.index(*goal) {
                self.values[index] = 0;
                frontier.push_back((*goal, 0u32));
            }
        }

        while let Some((current, distance)) = frontier.pop_front() {
            for next in current.neighbours() {
                if !passable(next) {
                    continue;
                }
                let Some(index) = self.bounds.index(next) else {
                    continue;
                };
                if self.values[index] != Self::UNREACHABLE {
                    continue;
                }
                self.values[index] = distance + 1;
                frontier.push_back((next, distance + 1));
            }
        }

        self.stale = false;
    }

    /// Field value at `position`, if it lies on the map.
    #[must_use]
    pub fn value(&self, position: Position) -> Option<u32> {
        self.bounds
            .index(position)
            .and_then(|index| self.values.get(index).copied())
    }

    /// Neighbour of `position` with the strictly lowest value.
    ///
    /// Only unoccupied neighbours inside `region` qualify. Ties go to the
    /// neighbour met first in [`necrowarp_core::Direction::ALL`] order.
    /// Returns `None` at local minima.
    #[must_use]
    pub fn descend(
        &self,
        region: ZoneRegion,
        position: Position,
        registry: &EntityRegistry,
    ) -> Option<Position> {
        let current = self.value(position)?;
        let mut best: Option<(Position, u32)> = None;
        for next in position.neighbours() {
            if !self.bounds.within(region, next) || registry.contains(next) {
                continue;
            }
            let Some(value) = self.value(next) else {
                continue;
            };
            if value >= current {
                continue;
            }
            if best.map_or(true, |(_, lowest)| value < lowest) {
                best = Some((next, value));
            }
        }
        best.map(|(next, _)| next)
    }
}

impl AddAssign<Position> for GoalMap {
    fn add_assign(&mut self, goal: Position) {
        self.add_goal(goal);
    }
}

impl SubAssign<Position> for GoalMap {
    fn sub_assign(&mut self, goal: Position) {
        self.remove_goal(goal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Entity;
    use necrowarp_core::{EntityKind, Extent, CLOSED_STATE, OPEN_STATE};

    fn open_map() -> Map {
        Map::filled(Bounds::new(Extent::new(12, 8), Extent::new(1, 1)), OPEN_STATE)
    }

    fn recalculated(map: &Map, registry: &EntityRegistry, goal: Position) -> GoalMap {
        let mut goal_map = GoalMap::new(map.bounds());
        goal_map += goal;
        goal_map.recalculate(ZoneRegion::Interior, map, CellTrait::Open, registry);
        goal_map
    }

    #[test]
    fn values_are_chebyshev_distance_on_open_ground() {
        let map = open_map();
        let goal = Position::new(5, 4);
        let goal_map = recalculated(&map, &EntityRegistry::new(), goal);
        for position in map.bounds().positions(ZoneRegion::Interior) {
            assert_eq!(
                goal_map.value(position),
                Some(goal.chebyshev_distance(position)),
                "{position}"
            );
        }
        assert_eq!(goal_map.value(Position::new(0, 0)), Some(GoalMap::UNREACHABLE));
    }

    #[test]
    fn walls_lengthen_paths_and_isolate_pockets() {
        let mut map = open_map();
        for y in 1..7 {
            if let Some(cell) = map.get_mut(Position::new(6, y)) {
                cell.assume_traits(CLOSED_STATE);
            }
        }
        let goal_map = recalculated(&map, &EntityRegistry::new(), Position::new(2, 3));
        assert_eq!(goal_map.value(Position::new(8, 3)), Some(GoalMap::UNREACHABLE));

        if let Some(cell) = map.get_mut(Position::new(6, 6)) {
            cell.assume_traits(OPEN_STATE);
        }
        let goal_map = recalculated(&map, &EntityRegistry::new(), Position::new(2, 3));
        assert_eq!(goal_map.value(Position::new(6, 6)), Some(4));
        assert_eq!(goal_map.value(Position::new(8, 3)), Some(7));
    }

    #[test]
    fn static_entities_block_the_wavefront() {
        let mut map = open_map();
        for y in 1..7 {
            if y != 3 {
                if let Some(cell) = map.get_mut(Position::new(6, y)) {
                    cell.assume_traits(CLOSED_STATE);
                }
            }
        }
        let mut registry = EntityRegistry::new();
        assert!(registry.add(Entity::fresh(EntityKind::Skull, Position::new(6, 3))));
        let goal_map = recalculated(&map, &registry, Position::new(2, 3));
        assert_eq!(goal_map.value(Position::new(8, 3)), Some(GoalMap::UNREACHABLE));

        assert!(registry.remove(Position::new(6, 3)));
        assert!(registry.add(Entity::fresh(EntityKind::Adventurer, Position::new(6, 3))));
        let goal_map = recalculated(&map, &registry, Position::new(2, 3));
        assert_eq!(goal_map.value(Position::new(8, 3)), Some(6));
    }

    #[test]
    fn descend_moves_strictly_downhill() {
        let map = open_map();
        let registry = EntityRegistry::new();
        let goal = Position::new(2, 2);
        let goal_map = recalculated(&map, &registry, goal);

        let start = Position::new(9, 5);
        let mut current = start;
        let mut steps = 0;
        while let Some(next) = goal_map.descend(ZoneRegion::Interior, current, &registry) {
            assert!(goal_map.value(next) < goal_map.value(current));
            current = next;
            steps += 1;
        }
        assert_eq!(current, goal);
        assert_eq!(steps, start.chebyshev_distance(goal));
    }

    #[test]
    fn descend_skips_occupied_cells_and_stops_at_minima() {
        let map = open_map();
        let mut registry = EntityRegistry::new();
        let goal = Position::new(2, 4);
        let goal_map = recalculated(&map, &registry, goal);

        assert_eq!(goal_map.descend(ZoneRegion::Interior, goal, &registry), None);

        let start = Position::new(4, 4);
        assert_eq!(
            goal_map.descend(ZoneRegion::Interior, start, &registry),
            Some(Position::new(3, 4))
        );
        for blocker in [Position::new(3, 3), Position::new(3, 4), Position::new(3, 5)] {
            assert!(registry.add(Entity::fresh(EntityKind::Skeleton, blocker)));
        }
        assert_eq!(goal_map.descend(ZoneRegion::Interior, start, &registry), None);
    }

    #[test]
    fn goal_edits_mark_the_field_stale() {
        let map = open_map();
        let mut goal_map = recalculated(&map, &EntityRegistry::new(), Position::new(3, 3));
        assert!(!goal_map.is_stale());
        goal_map -= Position::new(3, 3);
        assert!(goal_map.is_stale());
        assert_eq!(goal_map.value(Position::new(3, 3)), Some(0));
        goal_map.recalculate(
            ZoneRegion::Interior,
            &map,
            CellTrait::Open,
            &EntityRegistry::new(),
        );
        assert_eq!(goal_map.value(Position::new(3, 3)), Some(GoalMap::UNREACHABLE));
    }
}
