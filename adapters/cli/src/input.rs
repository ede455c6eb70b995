//! Decodes scripted key presses into player actions.
//!
//! Scripts are whitespace-separated tokens. Every character of a plain token
//! is one key press using the vi-style movement keys; a token of the form
//! `@x,y` warps to the given cell.

use necrowarp_core::{Direction, PlayerAction, Position};
use thiserror::Error;

/// Failures raised while decoding a script.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum InputError {
    #[error("key '{0}' is not bound to any action")]
    UnboundKey(char),
    #[error("warp target '{0}' is not of the form @x,y")]
    InvalidWarp(String),
}

pub(crate) fn decode_script(script: &str) -> Result<Vec<PlayerAction>, InputError> {
    let mut actions = Vec::new();
    for token in script.split_whitespace() {
        if let Some(target) = token.strip_prefix('@') {
            actions.push(PlayerAction::Warp(parse_target(target)?));
            continue;
        }
        for key in token.chars() {
            actions.push(decode_key(key)?);
        }
    }
    Ok(actions)
}

fn decode_key(key: char) -> Result<PlayerAction, InputError> {
    let action = match key {
        'k' => PlayerAction::Step(Direction::North),
        'l' => PlayerAction::Step(Direction::East),
        'j' => PlayerAction::Step(Direction::South),
        'h' => PlayerAction::Step(Direction::West),
        'u' => PlayerAction::Step(Direction::Northeast),
        'n' => PlayerAction::Step(Direction::Southeast),
        'b' => PlayerAction::Step(Direction::Southwest),
        'y' => PlayerAction::Step(Direction::Northwest),
        '.' => PlayerAction::Wait,
        'r' => PlayerAction::RandomWarp,
        's' => PlayerAction::SummonWraith,
        'g' => PlayerAction::GrandSummoning,
        'm' => PlayerAction::RevealMap,
        other => return Err(InputError::UnboundKey(other)),
    };
    Ok(action)
}

fn parse_target(target: &str) -> Result<Position, InputError> {
    let invalid = || InputError::InvalidWarp(target.to_owned());
    let (x, y) = target.split_once(',').ok_or_else(invalid)?;
    let x = x.trim().parse().map_err(|_| invalid())?;
    let y = y.trim().parse().map_err(|_| invalid())?;
    Ok(Position::new(x, y))
}
