use necrowarp_core::{
    Bounds, CellApplicator, CellTrait, EntityKind, Extent, ZoneRegion, CLOSED_STATE, OPEN_STATE,
};
use necrowarp_world::{
    partition, prune_to_largest, Area, EntityRegistry, GenerationParams, GoalMap, Map, Region,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn generate(seed: u64) -> Map {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let bounds = Bounds::new(Extent::new(64, 32), Extent::new(4, 4));
    let mut region = Region::new(bounds);
    region.set(ZoneRegion::Border, CLOSED_STATE);
    region
        .generate(
            ZoneRegion::Interior,
            &mut rng,
            &GenerationParams::default(),
            &CellApplicator::new(CLOSED_STATE, OPEN_STATE),
        )
        .expect("default parameters are valid");
    region.collapse(ZoneRegion::Interior, CellTrait::Solid, 0x00, CellTrait::Open);
    region.compile()
}

fn pruned(seed: u64) -> (Map, Area) {
    let mut map = generate(seed);
    let kept = prune_to_largest(&mut map).expect("default parameters carve open ground");
    (map, kept)
}

#[test]
fn pruned_maps_form_a_single_component() {
    for seed in 0..8 {
        let (map, kept) = pruned(seed);
        assert!(kept.len() >= 64, "seed {seed} kept only {} cells", kept.len());
        let areas = partition(&map, CellTrait::Open);
        assert_eq!(areas.len(), 1, "seed {seed}");
        assert_eq!(areas[0], kept, "seed {seed}");
        assert_eq!(map.count(ZoneRegion::Interior, CellTrait::Open), kept.len());
    }
}

#[test]
fn passability_is_exclusive_and_exhaustive() {
    let map = generate(42);
    for cell in map.cells() {
        assert!(cell.has(CellTrait::Open) ^ cell.has(CellTrait::Solid));
    }
    for position in map.bounds().positions(ZoneRegion::Border) {
        assert!(map.has(position, CellTrait::Solid));
        assert!(map.has(position, CellTrait::Opaque));
    }
}

#[test]
fn registry_keys_match_stored_positions() {
    let (map, _) = pruned(7);
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut registry = EntityRegistry::new();
    let _ = registry.spawn(EntityKind::Ladder, 8, &map, &mut rng, 16);
    let _ = registry.spawn(EntityKind::Skull, 16, &map, &mut rng, 4);

    for entity in registry.iter() {
        let position = entity.position();
        assert_eq!(registry.at(position), Some(entity.kind()));
        assert_eq!(registry.get(position), Some(entity));
        assert!(map.is_open(ZoneRegion::Interior, position));
    }
}

#[test]
fn goal_values_grow_by_at_most_one_per_step_away_from_goals() {
    let (map, kept) = pruned(3);
    let registry = EntityRegistry::new();
    let mut goal_map = GoalMap::new(map.bounds());
    goal_map += kept.positions()[0];
    goal_map.recalculate(ZoneRegion::Interior, &map, CellTrait::Open, &registry);

    assert_eq!(goal_map.value(kept.positions()[0]), Some(0));
    for position in kept.positions() {
        let value = goal_map.value(*position).expect("position on map");
        assert_ne!(value, GoalMap::UNREACHABLE, "{position}");
        for neighbour in position.neighbours() {
            if let Some(other) = goal_map.value(neighbour) {
                if other != GoalMap::UNREACHABLE {
                    assert!(other.abs_diff(value) <= 1, "{position} -> {neighbour}");
                }
            }
        }
        if let Some(next) = goal_map.descend(ZoneRegion::Interior, *position, &registry) {
            assert!(goal_map.value(next) < Some(value));
        } else {
            assert_eq!(value, 0, "{position} is a false local minimum");
        }
    }
}
