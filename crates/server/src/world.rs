//! World state management.
//!
//! The `World` is the single source of truth for all entities. Network
//! code never mutates it directly: connection handlers trigger join/leave
//! and record input intents; everything else happens inside the tick.

use crate::config::EjectConfig;
use crate::entity::{EjectedMass, Food, Massed, Player, radius_of};
use glam::Vec2;
use protocol::{Color, ConnectionId};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use thiserror::Error;

/// Display name used when a client joins with a blank name.
pub const DEFAULT_NAME: &str = "Anonymous";

/// Errors from world mutations triggered by the network side.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("connection {0} already owns a player")]
    DuplicateConnection(ConnectionId),

    #[error("connection {0} has no player")]
    UnknownConnection(ConnectionId),

    #[error("cell mass {mass:.0} is below the donation minimum {minimum:.0}")]
    InsufficientMass { mass: f32, minimum: f32 },
}

/// The fixed rectangular arena `[0, width] x [0, height]`.
#[derive(Debug, Clone, Copy)]
pub struct WorldBounds {
    pub width: f32,
    pub height: f32,
}

impl WorldBounds {
    /// Clamp a center position so the circle stays fully inside the arena.
    #[inline]
    pub fn clamp(&self, position: Vec2, radius: f32) -> Vec2 {
        Vec2::new(
            position.x.clamp(radius, self.width - radius),
            position.y.clamp(radius, self.height - radius),
        )
    }

    /// Uniformly random position keeping `margin` from every edge.
    pub fn random_position(&self, rng: &mut SmallRng, margin: f32) -> Vec2 {
        Vec2::new(
            rng.random_range(margin..self.width - margin),
            rng.random_range(margin..self.height - margin),
        )
    }
}

/// The authoritative game world.
///
/// Players are keyed by connection identity; ids are allocated
/// monotonically, so `BTreeMap` iteration is insertion order — the stable
/// order the consumption stage depends on.
#[derive(Debug, Clone)]
pub struct World {
    pub bounds: WorldBounds,
    pub players: BTreeMap<ConnectionId, Player>,
    pub food: Vec<Food>,
    pub ejected: Vec<EjectedMass>,
    /// Monotonic tick counter, advanced once per completed tick.
    pub tick: u64,
    pub(crate) rng: SmallRng,
}

impl World {
    /// Create a world seeded from the OS.
    pub fn new(bounds: WorldBounds) -> Self {
        Self::with_seed(bounds, SmallRng::from_os_rng().random())
    }

    /// Create a world with a fixed seed. Two worlds built from the same
    /// seed replay identical spawn positions.
    pub fn with_seed(bounds: WorldBounds, seed: u64) -> Self {
        Self {
            bounds,
            players: BTreeMap::new(),
            food: Vec::new(),
            ejected: Vec::new(),
            tick: 0,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn random_hue(&mut self) -> f32 {
        self.rng.random_range(0.0..360.0)
    }

    /// Create a player for a connection. Rejects a connection that already
    /// owns one; it never silently replaces live state.
    pub fn add_player(
        &mut self,
        id: ConnectionId,
        name: &str,
        start_mass: f32,
    ) -> Result<(), WorldError> {
        if self.players.contains_key(&id) {
            return Err(WorldError::DuplicateConnection(id));
        }

        let name = name.trim();
        let name = if name.is_empty() {
            DEFAULT_NAME.to_string()
        } else {
            name.to_string()
        };

        let radius = radius_of(start_mass);
        let position = self.bounds.random_position(&mut self.rng, radius);
        let color = Color::from_hsl(self.random_hue(), 1.0, 0.5);
        self.players
            .insert(id, Player::new(id, name, position, start_mass, color));
        Ok(())
    }

    /// Remove a connection's player. A no-op for connections that never
    /// joined or already left — disconnect races are expected.
    pub fn remove_player(&mut self, id: ConnectionId) -> bool {
        self.players.remove(&id).is_some()
    }

    /// Top the food population back up to `target`, spawning at most
    /// `target - current` pellets.
    pub fn replenish_food(&mut self, target: usize, pellet_mass: f32) {
        let radius = radius_of(pellet_mass);
        while self.food.len() < target {
            let position = self.bounds.random_position(&mut self.rng, radius);
            let color = Color::from_hsl(self.random_hue(), 0.9, 0.7);
            self.food.push(Food::new(position, pellet_mass, color));
        }
    }

    /// Donate a fixed chunk of mass from a player's primary cell, spawning
    /// an ejected chunk that drifts along `angle`.
    pub fn donate(
        &mut self,
        id: ConnectionId,
        angle: f32,
        cfg: &EjectConfig,
    ) -> Result<(), WorldError> {
        let chunk = {
            let player = self
                .players
                .get_mut(&id)
                .ok_or(WorldError::UnknownConnection(id))?;
            let cell = player.primary_cell_mut();
            let mass = cell.body().mass();
            if mass < cfg.min_donor_mass {
                return Err(WorldError::InsufficientMass {
                    mass,
                    minimum: cfg.min_donor_mass,
                });
            }

            cell.body_mut().apply_mass_delta(-cfg.mass);

            let direction = Vec2::new(angle.cos(), angle.sin());
            let chunk_radius = radius_of(cfg.mass);
            // Spawn fully clear of the donor so it cannot swallow the
            // chunk back on the same tick.
            let position = self.bounds.clamp(
                cell.body().position + direction * (cell.body().radius() + chunk_radius),
                chunk_radius,
            );
            EjectedMass::new(position, direction * cfg.speed, cfg.mass, cell.body().color)
        };
        self.ejected.push(chunk);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::level_threshold;

    fn test_world() -> World {
        World::with_seed(
            WorldBounds {
                width: 4000.0,
                height: 4000.0,
            },
            7,
        )
    }

    #[test]
    fn join_spawns_inside_bounds_with_margin() {
        let mut world = test_world();
        world.add_player(1, "blob", 200.0).unwrap();

        let player = &world.players[&1];
        let cell = player.primary_cell();
        let radius = cell.body().radius();
        assert!((radius - 200.0f32.sqrt()).abs() < 1e-4);
        assert!(cell.body().position.x >= radius);
        assert!(cell.body().position.x <= 4000.0 - radius);
        assert!(cell.body().position.y >= radius);
        assert!(cell.body().position.y <= 4000.0 - radius);
        assert_eq!(player.level, 1);
        assert_eq!(player.xp_to_next, level_threshold(1));
    }

    #[test]
    fn duplicate_join_is_rejected_and_preserves_state() {
        let mut world = test_world();
        world.add_player(1, "first", 200.0).unwrap();
        let position = world.players[&1].primary_cell().body().position;

        let err = world.add_player(1, "second", 200.0).unwrap_err();
        assert!(matches!(err, WorldError::DuplicateConnection(1)));
        assert_eq!(world.players[&1].name, "first");
        assert_eq!(world.players[&1].primary_cell().body().position, position);
    }

    #[test]
    fn blank_name_defaults_to_anonymous() {
        let mut world = test_world();
        world.add_player(1, "   ", 200.0).unwrap();
        assert_eq!(world.players[&1].name, DEFAULT_NAME);
    }

    #[test]
    fn remove_player_is_idempotent() {
        let mut world = test_world();
        world.add_player(1, "blob", 200.0).unwrap();

        assert!(world.remove_player(1));
        assert!(!world.remove_player(1));
        // Never-joined connection: benign no-op.
        assert!(!world.remove_player(99));
        assert!(world.players.is_empty());
    }

    #[test]
    fn replenish_spawns_exactly_the_shortfall() {
        let mut world = test_world();
        world.replenish_food(400, 25.0);
        assert_eq!(world.food.len(), 400);

        world.food.truncate(390);
        world.replenish_food(400, 25.0);
        assert_eq!(world.food.len(), 400);

        // Already at target: nothing spawns.
        world.replenish_food(400, 25.0);
        assert_eq!(world.food.len(), 400);
    }

    #[test]
    fn donation_conserves_mass() {
        let cfg = EjectConfig::default();
        let mut world = test_world();
        world.add_player(1, "blob", 200.0).unwrap();

        world.donate(1, 0.0, &cfg).unwrap();
        let player_mass = world.players[&1].primary_cell().body().mass();
        assert_eq!(player_mass, 160.0);
        assert_eq!(world.ejected.len(), 1);
        assert_eq!(world.ejected[0].body().mass(), 40.0);
    }

    #[test]
    fn donation_requires_minimum_mass() {
        let cfg = EjectConfig::default();
        let mut world = test_world();
        world.add_player(1, "blob", 60.0).unwrap();

        let err = world.donate(1, 0.0, &cfg).unwrap_err();
        assert!(matches!(err, WorldError::InsufficientMass { .. }));
        assert_eq!(world.players[&1].primary_cell().body().mass(), 60.0);
        assert!(world.ejected.is_empty());
    }

    #[test]
    fn donation_from_unknown_connection_errors() {
        let cfg = EjectConfig::default();
        let mut world = test_world();
        assert!(matches!(
            world.donate(5, 0.0, &cfg),
            Err(WorldError::UnknownConnection(5))
        ));
    }
}
