//! Turn resolution: legality checks followed by all-or-nothing mutation.

use necrowarp_core::{
    Alignment, CellTrait, Command, CommandRejection, EntityKind, Event, Position, ZoneRegion,
};

use crate::{Entity, World};

type Resolution = Result<(), CommandRejection>;

/// Executes `command` against `world`.
///
/// Every legality check runs before the first mutation, so a rejected
/// command leaves the world untouched.
pub(crate) fn resolve(
    world: &mut World,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Resolution {
    match command {
        Command::None { .. } => Ok(()),
        Command::Move { source, target } => step(world, source, target, out_events),
        Command::Clash { source, target } => clash(world, source, target, out_events),
        Command::Consume { source, target } => consume(world, source, target, out_events),
        Command::ConsumeWarp { source, target } => {
            consume_warp(world, source, target, out_events)
        }
        Command::TargetWarp { source, target } => {
            let cost = world.rules.target_warp_cost;
            warp(world, source, target, cost, out_events)
        }
        Command::RandomWarp { source, target } => warp(world, source, target, 0, out_events),
        Command::SummonWraith { source } => summon_wraith(world, source, out_events),
        Command::GrandSummoning { source } => grand_summoning(world, source, out_events),
        Command::Spawn {
            kind,
            position,
            announce,
        } => spawn(world, kind, position, announce, out_events),
        Command::RevealMap => {
            world.map.apply(ZoneRegion::All, CellTrait::Explored);
            out_events.push(Event::MapRevealed);
            Ok(())
        }
    }
}

fn source_kind(world: &World, source: Position) -> Result<EntityKind, CommandRejection> {
    world
        .registry
        .at(source)
        .ok_or(CommandRejection::MissingSource)
}

fn require_player(world: &World, source: Position) -> Result<(u8, u8), CommandRejection> {
    match world.registry.get(source) {
        Some(Entity::Player { energy, armor, .. }) => Ok((*energy, *armor)),
        Some(_) => Err(CommandRejection::NotPermitted),
        None => Err(CommandRejection::MissingSource),
    }
}

fn require_adjacent(source: Position, target: Position) -> Resolution {
    if source.chebyshev_distance(target) == 1 {
        Ok(())
    } else {
        Err(CommandRejection::NotAdjacent)
    }
}

fn require_vacant(world: &World, target: Position) -> Resolution {
    if !world.map.within(ZoneRegion::Interior, target) {
        return Err(CommandRejection::OutOfBounds);
    }
    if !world.map.has(target, CellTrait::Open) {
        return Err(CommandRejection::Solid);
    }
    if world.registry.contains(target) {
        return Err(CommandRejection::Occupied);
    }
    Ok(())
}

fn require_energy(energy: u8, cost: u8) -> Resolution {
    if energy < cost {
        Err(CommandRejection::InsufficientEnergy)
    } else {
        Ok(())
    }
}

fn set_player_counters(world: &mut World, position: Position, new_energy: u8, new_armor: u8) {
    match world.registry.get_mut(position) {
        Some(Entity::Player { energy, armor, .. }) => {
            *energy = new_energy;
            *armor = new_armor;
        }
        _ => tracing::error!(%position, "player vanished while resolving a command"),
    }
}

fn relocate(
    world: &mut World,
    kind: EntityKind,
    source: Position,
    target: Position,
    warped: bool,
    out_events: &mut Vec<Event>,
) {
    if !world.registry.move_entity(source, target) {
        tracing::error!(%source, %target, "validated relocation failed");
        return;
    }
    out_events.push(if warped {
        Event::EntityWarped {
            kind,
            from: source,
            to: target,
        }
    } else {
        Event::EntityMoved {
            kind,
            from: source,
            to: target,
        }
    });
}

fn step(
    world: &mut World,
    source: Position,
    target: Position,
    out_events: &mut Vec<Event>,
) -> Resolution {
    let kind = source_kind(world, source)?;
    if kind.is_static() {
        return Err(CommandRejection::NotPermitted);
    }
    require_adjacent(source, target)?;
    require_vacant(world, target)?;

    relocate(world, kind, source, target, false, out_events);
    Ok(())
}

fn warp(
    world: &mut World,
    source: Position,
    target: Position,
    cost: u8,
    out_events: &mut Vec<Event>,
) -> Resolution {
    let (energy, armor) = require_player(world, source)?;
    require_vacant(world, target)?;
    require_energy(energy, cost)?;

    set_player_counters(world, source, energy - cost, armor);
    relocate(world, EntityKind::Player, source, target, true, out_events);
    Ok(())
}

/// Outcome of a single hit on a defender.
enum Blow {
    /// The defender survives with updated state.
    Wounded(Entity),
    /// The defender dies.
    Lethal,
}

fn strike(defender: Entity, damage: i8) -> (Blow, i8) {
    match defender {
        Entity::Skeleton { .. } => (Blow::Lethal, damage),
        Entity::Wraith { position, health } => {
            if damage >= health {
                (Blow::Lethal, damage)
            } else {
                let health = health - 1;
                let blow = if health <= 0 {
                    Blow::Lethal
                } else {
                    Blow::Wounded(Entity::Wraith { position, health })
                };
                (blow, 1)
            }
        }
        Entity::Player {
            position,
            energy,
            armor,
        } => {
            let absorbed = u8::try_from(damage.max(0)).unwrap_or(0);
            if absorbed <= armor {
                let wounded = Entity::Player {
                    position,
                    energy,
                    armor: armor - absorbed,
                };
                (Blow::Wounded(wounded), 0)
            } else {
                (Blow::Lethal, damage)
            }
        }
        Entity::Adventurer { position, health }
        | Entity::Paladin { position, health }
        | Entity::Priest { position, health } => {
            let dealt = damage.saturating_sub(defender.armor_boon()).max(0);
            let remaining = health.saturating_sub(dealt);
            if remaining <= 0 {
                return (Blow::Lethal, dealt);
            }
            let wounded = match defender {
                Entity::Adventurer { .. } => Entity::Adventurer {
                    position,
                    health: remaining,
                },
                Entity::Paladin { .. } => Entity::Paladin {
                    position,
                    health: remaining,
                },
                _ => Entity::Priest {
                    position,
                    health: remaining,
                },
            };
            (Blow::Wounded(wounded), dealt)
        }
        Entity::Ladder { .. } | Entity::Skull { .. } => (Blow::Wounded(defender), 0),
    }
}

fn clash(
    world: &mut World,
    source: Position,
    target: Position,
    out_events: &mut Vec<Event>,
) -> Resolution {
    let attacker = source_kind(world, source)?;
    require_adjacent(source, target)?;
    let Some(defender) = world.registry.get(target).copied() else {
        return Err(CommandRejection::MissingTarget);
    };
    if !attacker.alignment().opposes(defender.kind().alignment()) {
        return Err(CommandRejection::NotHostile);
    }

    let (blow, damage) = strike(defender, attacker.maximum_damage());
    out_events.push(Event::Clashed {
        attacker,
        defender: defender.kind(),
        target,
        damage,
    });

    match blow {
        Blow::Wounded(wounded) => {
            if let Some(slot) = world.registry.get_mut(target) {
                *slot = wounded;
            }
        }
        Blow::Lethal => kill(world, attacker, target, out_events),
    }
    Ok(())
}

fn kill(world: &mut World, attacker: EntityKind, target: Position, out_events: &mut Vec<Event>) {
    let Some(dead) = world.registry.extract(target) else {
        tracing::error!(%target, "clash defender missing from registry");
        return;
    };
    let kind = dead.kind();
    out_events.push(Event::EntityDied {
        kind,
        position: target,
    });

    if kind == EntityKind::Player {
        tracing::info!(%target, "the necromancer has fallen");
        out_events.push(Event::PlayerDied { position: target });
        return;
    }

    let good = kind.alignment() == Alignment::Good;
    if good && attacker.alignment() == Alignment::Evil {
        world.kills = world.kills.saturating_add(1);
        tracing::debug!(kills = world.kills, victim = kind.name(), "kill recorded");
    }
    if good || kind == EntityKind::Skeleton {
        let _ = world.registry.add(Entity::fresh(EntityKind::Skull, target));
    }
}

fn consume(
    world: &mut World,
    source: Position,
    target: Position,
    out_events: &mut Vec<Event>,
) -> Resolution {
    let (energy, armor) = require_player(world, source)?;
    require_adjacent(source, target)?;
    let consumed = consumable_at(world, target)?;

    devour(world, source, target, consumed, energy, armor, out_events);
    Ok(())
}

fn consume_warp(
    world: &mut World,
    source: Position,
    target: Position,
    out_events: &mut Vec<Event>,
) -> Resolution {
    let (energy, armor) = require_player(world, source)?;
    if !world.map.within(ZoneRegion::Interior, target) {
        return Err(CommandRejection::OutOfBounds);
    }
    let consumed = consumable_at(world, target)?;
    let cost = world.rules.target_warp_cost;
    require_energy(energy, cost)?;

    devour(world, source, target, consumed, energy - cost, armor, out_events);
    relocate(world, EntityKind::Player, source, target, true, out_events);
    Ok(())
}

fn consumable_at(world: &World, target: Position) -> Result<EntityKind, CommandRejection> {
    let kind = world
        .registry
        .at(target)
        .ok_or(CommandRejection::MissingTarget)?;
    if kind.is_consumable() {
        Ok(kind)
    } else {
        Err(CommandRejection::NotConsumable)
    }
}

fn devour(
    world: &mut World,
    source: Position,
    target: Position,
    consumed: EntityKind,
    energy: u8,
    armor: u8,
    out_events: &mut Vec<Event>,
) {
    let (energy, armor) = match consumed {
        EntityKind::Skull => (energy.saturating_add(1).min(world.max_energy()), armor),
        _ => (energy, armor.saturating_add(1).min(world.max_armor())),
    };
    if !world.registry.remove(target) {
        tracing::error!(%target, "validated consumption target missing");
        return;
    }
    set_player_counters(world, source, energy, armor);
    out_events.push(Event::EntityConsumed {
        kind: consumed,
        position: target,
    });
}

fn summon_wraith(world: &mut World, source: Position, out_events: &mut Vec<Event>) -> Resolution {
    let (energy, armor) = require_player(world, source)?;
    let cost = world.rules.summon_wraith_cost;
    require_energy(energy, cost)?;
    let Some(position) = source
        .neighbours()
        .find(|neighbour| require_vacant(world, *neighbour).is_ok())
    else {
        return Err(CommandRejection::NoFreePosition);
    };

    set_player_counters(world, source, energy - cost, armor);
    if world
        .registry
        .add(Entity::fresh(EntityKind::Wraith, position))
    {
        out_events.push(Event::EntitySpawned {
            kind: EntityKind::Wraith,
            position,
        });
    }
    Ok(())
}

fn grand_summoning(world: &mut World, source: Position, out_events: &mut Vec<Event>) -> Resolution {
    let (energy, armor) = require_player(world, source)?;
    let maximum = world.max_energy();
    if maximum == 0 || energy < maximum {
        return Err(CommandRejection::InsufficientEnergy);
    }
    let skulls = world.registry.positions_of(EntityKind::Skull);
    if skulls.is_empty() {
        return Err(CommandRejection::NothingToRaise);
    }

    set_player_counters(world, source, 0, armor);
    for position in skulls {
        if world.registry.remove(position)
            && world
                .registry
                .add(Entity::fresh(EntityKind::Skeleton, position))
        {
            out_events.push(Event::EntitySpawned {
                kind: EntityKind::Skeleton,
                position,
            });
        }
    }
    Ok(())
}

fn spawn(
    world: &mut World,
    kind: EntityKind,
    position: Position,
    announce: bool,
    out_events: &mut Vec<Event>,
) -> Resolution {
    require_vacant(world, position)?;
    if kind == EntityKind::Player && world.registry.player_position().is_some() {
        return Err(CommandRejection::NotPermitted);
    }
    if !world.registry.add(Entity::fresh(kind, position)) {
        return Err(CommandRejection::Occupied);
    }
    if announce {
        tracing::info!(%position, "{} arrives", kind.name());
    }
    out_events.push(Event::EntitySpawned { kind, position });
    Ok(())
}
