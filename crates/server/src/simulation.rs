//! Simulation tick engine.
//!
//! One tick runs a fixed stage order: ejected-mass drift, player movement,
//! donations, consumption, leveling, food replenishment, counter advance.
//! Player experience depends on this order, so it never changes.
//!
//! Every tick runs against a scratch copy of the world; the caller swaps
//! the copy in only when all stages succeeded. A faulted tick therefore
//! never leaves a half-integrated world behind.

use crate::config::Config;
use crate::entity::{MAX_PLAYER_CELLS, Massed, Player};
use crate::input::{PlayerInput, TickCommand};
use crate::world::World;
use glam::Vec2;
use protocol::ConnectionId;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// An unexpected failure inside a tick stage. The tick is abandoned,
/// logged, and the loop proceeds to the next scheduled tick.
#[derive(Debug, Error)]
pub enum TickError {
    #[error("non-finite state on {0}")]
    NonFinite(String),

    #[error("player {id} owns {count} cells, outside the allowed range")]
    CellCountViolation { id: ConnectionId, count: usize },
}

/// Run one full tick against `world`, returning the next world state.
/// The input world is untouched; on error nothing of the tick survives.
pub fn run_tick(
    world: &World,
    commands: &HashMap<ConnectionId, TickCommand>,
    config: &Config,
) -> Result<World, TickError> {
    let mut next = world.clone();

    integrate_ejected(&mut next, config);
    integrate_players(&mut next, commands, config);
    apply_donations(&mut next, commands, config);
    let gains = resolve_consumption(&mut next);
    apply_leveling(&mut next, &gains);
    next.replenish_food(config.food.target_amount, config.food.mass);
    next.tick += 1;

    validate(&next)?;
    Ok(next)
}

/// Stage 1: drift every ejected chunk along its decaying velocity,
/// clamping into bounds and despawning chunks that have settled.
fn integrate_ejected(world: &mut World, config: &Config) {
    let bounds = world.bounds;
    for chunk in &mut world.ejected {
        chunk.integrate(config.eject.decay);
        let radius = chunk.body().radius();
        let clamped = bounds.clamp(chunk.body().position, radius);
        chunk.body_mut().position = clamped;
    }
    world
        .ejected
        .retain(|chunk| !chunk.is_settled(config.eject.min_speed));
}

/// Stage 2: move every player's cells along its last known intent.
fn integrate_players(
    world: &mut World,
    commands: &HashMap<ConnectionId, TickCommand>,
    config: &Config,
) {
    let bounds = world.bounds;
    for (id, player) in world.players.iter_mut() {
        let input = commands.get(id).map(|c| c.input).unwrap_or(PlayerInput::IDLE);
        if input.magnitude <= 0.0 {
            continue;
        }

        let direction = Vec2::new(input.angle.cos(), input.angle.sin());
        let level = player.level;
        for cell in &mut player.cells {
            let radius = cell.body().radius();
            let speed = Player::speed_for(level, radius, &config.player);
            let next_pos = cell.body().position + direction * (speed * input.magnitude);
            cell.body_mut().position = bounds.clamp(next_pos, radius);
        }
    }
}

/// Apply one-shot donation requests, in player order. A rejected donation
/// (too light, never joined) is a benign no-op.
fn apply_donations(
    world: &mut World,
    commands: &HashMap<ConnectionId, TickCommand>,
    config: &Config,
) {
    let donors: Vec<(ConnectionId, f32)> = world
        .players
        .keys()
        .filter_map(|id| {
            commands
                .get(id)
                .filter(|c| c.donate)
                .map(|c| (*id, c.input.angle))
        })
        .collect();

    for (id, angle) in donors {
        if let Err(err) = world.donate(id, angle, &config.eject) {
            debug!(connection = id, %err, "donation rejected");
        }
    }
}

/// Stage 3: resolve consumption. Players are visited in insertion order;
/// for each cell, food and then ejected chunks are scanned in reverse
/// index order so `swap_remove` only ever moves an already-tested item
/// into the hole. An item is consumed by at most one cell per tick.
///
/// Returns the total mass gained per player, for the leveling stage.
fn resolve_consumption(world: &mut World) -> HashMap<ConnectionId, f64> {
    let mut gains: HashMap<ConnectionId, f64> = HashMap::new();
    let World {
        players,
        food,
        ejected,
        ..
    } = world;

    for (id, player) in players.iter_mut() {
        let mut gained = 0.0f64;
        for cell in &mut player.cells {
            for i in (0..food.len()).rev() {
                let pellet = &food[i];
                let distance = cell.body().position.distance(pellet.body().position);
                if distance < cell.body().radius() {
                    let mass = pellet.body().mass();
                    cell.body_mut().apply_mass_delta(mass);
                    gained += mass as f64;
                    food.swap_remove(i);
                }
            }
            for i in (0..ejected.len()).rev() {
                let chunk = &ejected[i];
                let distance = cell.body().position.distance(chunk.body().position);
                if distance < cell.body().radius() {
                    let mass = chunk.body().mass();
                    cell.body_mut().apply_mass_delta(mass);
                    gained += mass as f64;
                    ejected.swap_remove(i);
                }
            }
        }
        if gained > 0.0 {
            gains.insert(*id, gained);
        }
    }
    gains
}

/// Stage 4: convert mass gained into XP, 1:1, and apply level-ups.
fn apply_leveling(world: &mut World, gains: &HashMap<ConnectionId, f64>) {
    for (id, gained) in gains {
        if let Some(player) = world.players.get_mut(id) {
            player.gain_xp(*gained);
        }
    }
}

/// Post-tick sweep: a non-finite coordinate or mass, or a cell count out
/// of range, means some stage misbehaved and the tick must not commit.
fn validate(world: &World) -> Result<(), TickError> {
    for (id, player) in &world.players {
        let count = player.cells.len();
        if count == 0 || count > MAX_PLAYER_CELLS {
            return Err(TickError::CellCountViolation { id: *id, count });
        }
        for cell in &player.cells {
            if !cell.body().position.is_finite() || !cell.body().mass().is_finite() {
                return Err(TickError::NonFinite(format!("player {id} cell")));
            }
        }
    }
    for chunk in &world.ejected {
        if !chunk.body().position.is_finite() || !chunk.velocity.is_finite() {
            return Err(TickError::NonFinite("ejected mass".to_string()));
        }
    }
    Ok(())
}
