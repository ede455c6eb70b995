//! Turn loop tying the world to its systems.

use std::{
    thread,
    time::{Duration, Instant},
};

use necrowarp_core::{Command, CommandRejection, Event, PlayerAction};
use necrowarp_system_ai::Ai;
use necrowarp_system_spawning::{Config as SpawningConfig, Spawning};
use necrowarp_world::{self as world, query, World};
use rand_chacha::ChaCha8Rng;

/// Rate limiter keeping turns at least one interval apart.
#[derive(Clone, Copy, Debug)]
pub(crate) struct EpochTimer {
    interval: Duration,
    last: Option<Instant>,
}

impl EpochTimer {
    pub(crate) const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Time left before the next turn may start.
    pub(crate) fn remaining(&self, now: Instant) -> Duration {
        match self.last {
            Some(last) => self
                .interval
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    pub(crate) fn ready(&self, now: Instant) -> bool {
        self.remaining(now).is_zero()
    }

    pub(crate) fn record(&mut self, now: Instant) {
        self.last = Some(now);
    }
}

/// Owns the world together with every system that acts on it.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    ai: Ai,
    spawning: Spawning,
    rng: ChaCha8Rng,
    timer: EpochTimer,
    over: bool,
}

impl Session {
    pub(crate) fn new(
        world: World,
        spawning: SpawningConfig,
        rng: ChaCha8Rng,
        interval: Duration,
    ) -> Self {
        Self {
            world,
            ai: Ai,
            spawning: Spawning::new(spawning),
            rng,
            timer: EpochTimer::new(interval),
            over: false,
        }
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    /// Whether the player has died.
    pub(crate) fn is_over(&self) -> bool {
        self.over
    }

    /// Waits for the epoch timer, then plays `action`.
    pub(crate) fn step(&mut self, action: PlayerAction) -> Result<Vec<Event>, CommandRejection> {
        let now = Instant::now();
        if !self.timer.ready(now) {
            thread::sleep(self.timer.remaining(now));
        }
        let events = self.advance(action)?;
        self.timer.record(Instant::now());
        Ok(events)
    }

    /// Plays one player action.
    ///
    /// Revealing the map is free. Every other accepted action lets the
    /// entities act, closes the turn and gives the ladders a chance to
    /// release reinforcements. Actions refused while decoding consume no
    /// turn.
    pub(crate) fn advance(
        &mut self,
        action: PlayerAction,
    ) -> Result<Vec<Event>, CommandRejection> {
        let mut events = Vec::new();
        if action == PlayerAction::RevealMap {
            world::apply(&mut self.world, Command::RevealMap, &mut events);
            return Ok(events);
        }

        let command = query::player_command(&self.world, action, &mut self.rng)?;
        world::apply(&mut self.world, command, &mut events);

        let ai = self.ai;
        world::update(&mut self.world, |world, entity| ai.think(world, entity), &mut events);
        world::end_turn(&mut self.world, &mut events);

        let mut commands = Vec::new();
        self.spawning
            .handle(&events, &self.world, &mut self.rng, &mut commands);
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }

        if events
            .iter()
            .any(|event| matches!(event, Event::PlayerDied { .. }))
        {
            tracing::info!(
                turn = query::turn(&self.world),
                kills = query::kills(&self.world),
                "session over"
            );
            self.over = true;
        }
        tracing::debug!(
            turn = query::turn(&self.world),
            events = events.len(),
            "turn resolved"
        );
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use necrowarp_core::{Bounds, CellTrait, Direction, EntityKind, Extent, Position, OPEN_STATE};
    use necrowarp_world::{Map, Rules};
    use rand::SeedableRng;

    fn session_with(entities: &[(EntityKind, i32, i32)]) -> Session {
        let bounds = Bounds::new(Extent::new(16, 10), Extent::new(1, 1));
        let mut world = World::new(Map::filled(bounds, OPEN_STATE), Rules::default());
        let mut events = Vec::new();
        for (kind, x, y) in entities {
            world::apply(
                &mut world,
                Command::Spawn {
                    kind: *kind,
                    position: Position::new(*x, *y),
                    announce: false,
                },
                &mut events,
            );
        }
        world.recalculate_goal_maps();
        Session::new(
            world,
            SpawningConfig::new(0, 4),
            ChaCha8Rng::seed_from_u64(11),
            Duration::ZERO,
        )
    }

    #[test]
    fn epoch_timer_waits_one_interval_after_recording() {
        let start = Instant::now();
        let mut timer = EpochTimer::new(Duration::from_millis(125));
        assert!(timer.ready(start));

        timer.record(start);
        assert!(!timer.ready(start + Duration::from_millis(100)));
        assert_eq!(
            timer.remaining(start + Duration::from_millis(100)),
            Duration::from_millis(25)
        );
        assert!(timer.ready(start + Duration::from_millis(125)));
    }

    #[test]
    fn accepted_actions_close_a_turn() {
        let mut session = session_with(&[(EntityKind::Player, 4, 4)]);
        let events = session
            .step(PlayerAction::Step(Direction::East))
            .expect("open ground");

        assert!(events.contains(&Event::TurnAdvanced { turn: 1 }));
        assert_eq!(
            query::player(session.world()).map(|player| player.position()),
            Some(Position::new(5, 4))
        );
    }

    #[test]
    fn revealing_the_map_is_free() {
        let mut session = session_with(&[(EntityKind::Player, 4, 4)]);
        let events = session.advance(PlayerAction::RevealMap).expect("always accepted");

        assert_eq!(events, vec![Event::MapRevealed]);
        assert_eq!(query::turn(session.world()), 0);
        assert!(query::map(session.world()).has(Position::new(1, 1), CellTrait::Explored));
    }

    #[test]
    fn refused_actions_consume_no_turn() {
        let mut session = session_with(&[(EntityKind::Player, 1, 1)]);
        assert_eq!(
            session.advance(PlayerAction::Step(Direction::North)),
            Err(CommandRejection::OutOfBounds)
        );
        assert_eq!(query::turn(session.world()), 0);
    }

    #[test]
    fn player_death_ends_the_session() {
        let mut session = session_with(&[
            (EntityKind::Player, 4, 4),
            (EntityKind::Paladin, 5, 4),
        ]);
        let mut turns = 0;
        while !session.is_over() {
            let _ = session.advance(PlayerAction::Wait).expect("player alive");
            turns += 1;
            assert!(turns < 8, "paladin never finished the player");
        }
        assert!(query::player(session.world()).is_none());
        assert_eq!(
            session.advance(PlayerAction::Wait),
            Err(CommandRejection::MissingSource)
        );
    }
}
